//! UTF-8 well-formedness checking for names and text strings.

/// The byte range is not well-formed UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidUtf8 {
    /// Length of the valid prefix, in bytes.
    pub valid_up_to: usize,
}

/// Validates that `bytes` is well-formed UTF-8.
///
/// # Errors
///
/// Returns [`InvalidUtf8`] with the length of the longest valid prefix.
pub fn validate(bytes: &[u8]) -> Result<(), InvalidUtf8> {
    match core::str::from_utf8(bytes) {
        Ok(_) => Ok(()),
        Err(e) => Err(InvalidUtf8 {
            valid_up_to: e.valid_up_to(),
        }),
    }
}
