//! Diagnostics and the error-reporter contract.
//!
//! Both parsers report every deviation from their grammar through an
//! [`ErrorReporter`]. Recoverable diagnostics go through
//! [`ErrorReporter::error`], which may either let the parser apply its
//! documented repair and continue (`Ok`) or promote the diagnostic to a stop
//! (`Err`). [`ErrorReporter::fatal_error`] unconditionally stops parsing.

use alloc::vec::Vec;

use thiserror::Error;

/// The closed set of diagnostic codes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DiagnosticCode {
    /// Input ended before the document was complete.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A byte that cannot start or continue any production.
    #[error("invalid JSON text")]
    InvalidJsonText,
    /// A literal (`true`, `false`, `null`) was misspelled.
    #[error("invalid value")]
    InvalidValue,
    /// A number lexeme could not be converted.
    #[error("invalid number")]
    InvalidNumber,
    /// A leading zero was followed by another digit.
    #[error("leading zero")]
    LeadingZero,
    /// Expected `,` or `}` after an object member.
    #[error("expected comma or right brace")]
    ExpectedCommaOrRightBrace,
    /// Expected `,` or `]` after an array element.
    #[error("expected comma or right bracket")]
    ExpectedCommaOrRightBracket,
    /// A `}` with no object to close.
    #[error("unexpected right brace")]
    UnexpectedRightBrace,
    /// A `]` with no array to close.
    #[error("unexpected right bracket")]
    UnexpectedRightBracket,
    /// Expected an object member name.
    #[error("expected name")]
    ExpectedName,
    /// Expected a value.
    #[error("expected value")]
    ExpectedValue,
    /// Expected `:` between a member name and its value.
    #[error("expected colon")]
    ExpectedColon,
    /// A single-quoted string where the grammar requires double quotes.
    #[error("single quote")]
    SingleQuote,
    /// A control byte outside a string.
    #[error("illegal control character")]
    IllegalControlCharacter,
    /// An unescaped control byte inside a string.
    #[error("illegal character in string")]
    IllegalCharacterInString,
    /// A backslash escape with an unknown escape character.
    #[error("illegal escaped character")]
    IllegalEscapedCharacter,
    /// A `\u` escape with a non-hex digit or an invalid code point.
    #[error("invalid hex escape sequence")]
    InvalidHexEscapeSequence,
    /// A high surrogate not followed by a valid low surrogate.
    #[error("expected codepoint surrogate pair")]
    ExpectedCodepointSurrogatePair,
    /// A non-whitespace byte after the document ended.
    #[error("extra character")]
    ExtraCharacter,
    /// A comma with no value between it and the previous separator.
    #[error("extra comma")]
    ExtraComma,
    /// Nesting exceeded the configured maximum depth.
    #[error("maximum nesting depth exceeded")]
    MaxDepthExceeded,
    /// The underlying byte source is in an error state.
    #[error("source error")]
    SourceError,
    /// A name or text string is not well-formed UTF-8.
    #[error("invalid UTF-8 text string")]
    InvalidUtf8TextString,
    /// An unrecognized binary type tag. Unknown values carry no length
    /// prefix, so there is no safe way to skip them.
    #[error("unknown type tag")]
    UnknownTag,
}

/// Where a diagnostic was raised.
///
/// Lines and columns are 1-based for the text parser; the binary parser
/// reports line 0 and its source position as the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    /// Current line.
    pub line: usize,
    /// Current column.
    pub column: usize,
    /// Offset from the start of the stream, in bytes.
    pub position: usize,
    /// The byte under the cursor, if any.
    pub current: Option<u8>,
}

/// A diagnostic promoted to a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{code} at {line}:{column}")]
pub struct ParseError {
    /// What went wrong.
    pub code: DiagnosticCode,
    /// Line of the offending byte.
    pub line: usize,
    /// Column of the offending byte.
    pub column: usize,
}

impl ParseError {
    /// Builds an error from a report site.
    #[must_use]
    pub fn at(code: DiagnosticCode, context: &ParseContext) -> Self {
        Self {
            code,
            line: context.line,
            column: context.column,
        }
    }
}

/// Receiver of parser diagnostics.
///
/// Reporters are passed explicitly to every parse call; there is no
/// process-wide default.
pub trait ErrorReporter {
    /// A recoverable diagnostic. Returning `Ok(())` lets the parser apply
    /// its repair for the site (skip the byte, keep the byte, substitute
    /// `null`) and continue; returning `Err` stops parsing.
    fn error(&mut self, code: DiagnosticCode, context: &ParseContext) -> Result<(), ParseError>;

    /// A diagnostic the parser cannot recover from. The returned error is
    /// propagated to the caller unconditionally.
    fn fatal_error(&mut self, code: DiagnosticCode, context: &ParseContext) -> ParseError {
        ParseError::at(code, context)
    }
}

/// Strict reporter: every diagnostic, recoverable or not, stops parsing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorReporter;

impl ErrorReporter for DefaultErrorReporter {
    fn error(&mut self, code: DiagnosticCode, context: &ParseContext) -> Result<(), ParseError> {
        Err(ParseError::at(code, context))
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    /// The diagnostic code.
    pub code: DiagnosticCode,
    /// Line of the offending byte.
    pub line: usize,
    /// Column of the offending byte.
    pub column: usize,
    /// Stream offset of the offending byte.
    pub position: usize,
}

/// Lenient reporter: records recoverable diagnostics and lets the parser
/// repair and continue. Fatal diagnostics still stop.
#[derive(Debug, Default)]
pub struct RecordingErrorReporter {
    /// Every recoverable diagnostic seen so far, in order.
    pub diagnostics: Vec<Diagnostic>,
}

impl RecordingErrorReporter {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded codes, without locations.
    #[must_use]
    pub fn codes(&self) -> Vec<DiagnosticCode> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }
}

impl ErrorReporter for RecordingErrorReporter {
    fn error(&mut self, code: DiagnosticCode, context: &ParseContext) -> Result<(), ParseError> {
        self.diagnostics.push(Diagnostic {
            code,
            line: context.line,
            column: context.column,
            position: context.position,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        use alloc::string::ToString;

        let err = ParseError {
            code: DiagnosticCode::ExpectedColon,
            line: 3,
            column: 14,
        };
        assert_eq!(err.to_string(), "expected colon at 3:14");
    }

    #[test]
    fn default_reporter_stops_on_recoverable() {
        let ctx = ParseContext {
            line: 1,
            column: 2,
            position: 1,
            current: Some(b'0'),
        };
        let mut reporter = DefaultErrorReporter;
        assert!(reporter.error(DiagnosticCode::LeadingZero, &ctx).is_err());
    }

    #[test]
    fn recording_reporter_continues() {
        let ctx = ParseContext {
            line: 1,
            column: 2,
            position: 1,
            current: None,
        };
        let mut reporter = RecordingErrorReporter::new();
        assert!(reporter.error(DiagnosticCode::ExtraComma, &ctx).is_ok());
        assert_eq!(reporter.codes(), [DiagnosticCode::ExtraComma]);
    }
}
