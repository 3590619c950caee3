//! The BSON binary parser.
//!
//! A recursive-descent decoder over a pull-mode [`ByteSource`]:
//!
//! ```text
//! document := int32-length  e-list  0x00
//! e-list   := ( type-tag  cstring-name  value )*
//! ```
//!
//! Every fixed-width integer and the double are little-endian. The declared
//! document length is advisory and is recorded but not enforced. Array
//! elements travel as documents whose names are the decimal indices; those
//! names are consumed and dropped; only object member names become `name`
//! events.
//!
//! An unrecognized type tag is fatal ([`DiagnosticCode::UnknownTag`]): values
//! carry no universal length prefix, so an unknown value cannot be skipped
//! safely.

mod source;

pub use source::{ByteSource, SliceSource};

use alloc::vec::Vec;

use crate::error::{DiagnosticCode, ErrorReporter, ParseContext, ParseError};
use crate::event::{EventSink, SemanticTag};
use crate::utf8;

/// Type tags of the wire format.
mod tag {
    pub(super) const DOUBLE: u8 = 0x01;
    pub(super) const STRING: u8 = 0x02;
    pub(super) const DOCUMENT: u8 = 0x03;
    pub(super) const ARRAY: u8 = 0x04;
    pub(super) const BINARY: u8 = 0x05;
    pub(super) const BOOL: u8 = 0x08;
    pub(super) const DATETIME: u8 = 0x09;
    pub(super) const NULL: u8 = 0x0A;
    pub(super) const INT32: u8 = 0x10;
    pub(super) const TIMESTAMP: u8 = 0x11;
    pub(super) const INT64: u8 = 0x12;
}

/// What a stack frame is decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Below the outermost document.
    Root,
    /// An embedded or top-level document (names are emitted).
    Document,
    /// An array document (names are consumed and dropped).
    Array,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    mode: ParseMode,
    /// Declared byte length from the wire, advisory only.
    #[allow(dead_code)]
    length: u32,
}

/// The BSON binary parser.
///
/// Unlike the text parser it does not suspend mid-value: the byte source is
/// pulled synchronously, and cancellation (a sink returning `false`) takes
/// effect between values.
#[derive(Debug)]
pub struct BsonParser<Src: ByteSource> {
    source: Src,
    nesting_depth: usize,
    stopped: bool,
    done: bool,
    text_buffer: Vec<u8>,
    state_stack: Vec<Frame>,
}

impl<Src: ByteSource> BsonParser<Src> {
    /// Wraps a byte source.
    pub fn new(source: Src) -> Self {
        let mut state_stack = Vec::with_capacity(8);
        state_stack.push(Frame {
            mode: ParseMode::Root,
            length: 0,
        });
        Self {
            source,
            nesting_depth: 0,
            stopped: false,
            done: false,
            text_buffer: Vec::new(),
            state_stack,
        }
    }

    /// Whether the document was fully decoded.
    #[must_use]
    pub fn done(&self) -> bool {
        self.done
    }

    /// Whether the sink stopped the parser by returning `false`.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// Clears the stopped flag so a subsequent [`Self::parse`] call can
    /// continue where the sink cancelled.
    pub fn restart(&mut self) {
        self.stopped = false;
    }

    /// Returns the parser to its initial state (the source keeps its
    /// position).
    pub fn reset(&mut self) {
        self.state_stack.clear();
        self.state_stack.push(Frame {
            mode: ParseMode::Root,
            length: 0,
        });
        self.nesting_depth = 0;
        self.stopped = false;
        self.done = false;
    }

    /// Bytes consumed from the source.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// Decodes one document, driving the sink.
    ///
    /// # Errors
    ///
    /// [`DiagnosticCode::SourceError`] when the source is broken,
    /// [`DiagnosticCode::UnexpectedEof`] on any short read,
    /// [`DiagnosticCode::InvalidUtf8TextString`] for malformed names or
    /// strings, and [`DiagnosticCode::UnknownTag`] for an unrecognized type
    /// tag. All are raised via the reporter's `fatal_error`.
    pub fn parse<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
    ) -> Result<(), ParseError> {
        if self.source.is_error() {
            return Err(self.fatal(reporter, DiagnosticCode::SourceError));
        }
        self.read_document(sink, reporter)?;
        self.done = true;
        Ok(())
    }

    fn context(&self) -> ParseContext {
        let position = usize::try_from(self.source.position()).unwrap_or(usize::MAX);
        ParseContext {
            line: 0,
            column: position,
            position,
            current: None,
        }
    }

    fn fatal<R: ErrorReporter>(&self, reporter: &mut R, code: DiagnosticCode) -> ParseError {
        reporter.fatal_error(code, &self.context())
    }

    #[inline]
    fn emit(&mut self, more: bool) {
        if !more {
            self.stopped = true;
        }
    }

    fn read_exact<R: ErrorReporter, const N: usize>(
        &mut self,
        reporter: &mut R,
    ) -> Result<[u8; N], ParseError> {
        let mut buf = [0u8; N];
        if self.source.read(&mut buf) != N {
            return Err(self.fatal(reporter, DiagnosticCode::UnexpectedEof));
        }
        Ok(buf)
    }

    fn read_i32<R: ErrorReporter>(&mut self, reporter: &mut R) -> Result<i32, ParseError> {
        Ok(i32::from_le_bytes(self.read_exact(reporter)?))
    }

    /// `document := int32-length e-list 0x00`, emitted as an object.
    fn read_document<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
    ) -> Result<(), ParseError> {
        let length = self.read_i32(reporter)?;
        self.emit(sink.begin_object());
        self.nesting_depth += 1;
        self.state_stack.push(Frame {
            mode: ParseMode::Document,
            length: length.max(0) as u32,
        });

        self.read_e_list(sink, reporter, ParseMode::Document)?;

        self.emit(sink.end_object());
        self.state_stack.pop();
        self.nesting_depth -= 1;
        Ok(())
    }

    /// The array body shares the e-list shape; only the frame mode differs.
    fn read_array<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
    ) -> Result<(), ParseError> {
        let length = self.read_i32(reporter)?;
        self.emit(sink.begin_array());
        self.nesting_depth += 1;
        self.state_stack.push(Frame {
            mode: ParseMode::Array,
            length: length.max(0) as u32,
        });

        self.read_e_list(sink, reporter, ParseMode::Array)?;

        self.emit(sink.end_array());
        self.state_stack.pop();
        self.nesting_depth -= 1;
        Ok(())
    }

    fn read_e_list<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
        mode: ParseMode,
    ) -> Result<(), ParseError> {
        loop {
            if self.stopped {
                return Ok(());
            }
            let Some(tag) = self.source.get() else {
                // A document must end with its 0x00 terminator.
                return Err(self.fatal(reporter, DiagnosticCode::UnexpectedEof));
            };
            if tag == 0x00 {
                return Ok(());
            }
            self.read_name(sink, reporter, mode)?;
            self.read_value(sink, reporter, tag)?;
        }
    }

    /// Reads a NUL-terminated name. Emitted for document frames; array
    /// element names (`"0"`, `"1"`, …) are wire filler and are dropped.
    fn read_name<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
        mode: ParseMode,
    ) -> Result<(), ParseError> {
        self.text_buffer.clear();
        loop {
            match self.source.get() {
                Some(0x00) => break,
                Some(byte) => self.text_buffer.push(byte),
                None => return Err(self.fatal(reporter, DiagnosticCode::UnexpectedEof)),
            }
        }
        if mode == ParseMode::Document {
            if utf8::validate(&self.text_buffer).is_err() {
                return Err(self.fatal(reporter, DiagnosticCode::InvalidUtf8TextString));
            }
            let name = core::mem::take(&mut self.text_buffer);
            self.emit(sink.name(&name));
            self.text_buffer = name;
        }
        Ok(())
    }

    fn read_value<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
        type_tag: u8,
    ) -> Result<(), ParseError> {
        match type_tag {
            tag::DOUBLE => {
                let value = f64::from_le_bytes(self.read_exact(reporter)?);
                self.emit(sink.double_value(value, 0));
            }
            tag::STRING => {
                self.read_string(reporter)?;
                let text = core::mem::take(&mut self.text_buffer);
                self.emit(sink.string_value(&text));
                self.text_buffer = text;
            }
            tag::DOCUMENT => self.read_document(sink, reporter)?,
            tag::ARRAY => self.read_array(sink, reporter)?,
            tag::BINARY => {
                let length = self.read_i32(reporter)?;
                let length = usize::try_from(length)
                    .map_err(|_| self.fatal(reporter, DiagnosticCode::UnexpectedEof))?;
                let mut bytes = Vec::new();
                if self.source.read_into(&mut bytes, length) != length {
                    return Err(self.fatal(reporter, DiagnosticCode::UnexpectedEof));
                }
                self.emit(sink.byte_string_value(&bytes, SemanticTag::None));
            }
            tag::BOOL => {
                let Some(value) = self.source.get() else {
                    return Err(self.fatal(reporter, DiagnosticCode::UnexpectedEof));
                };
                self.emit(sink.bool_value(value != 0));
            }
            tag::DATETIME => {
                let value = i64::from_le_bytes(self.read_exact(reporter)?);
                self.emit(sink.int64_value(value, SemanticTag::Timestamp));
            }
            tag::NULL => self.emit(sink.null_value()),
            tag::INT32 => {
                let value = i32::from_le_bytes(self.read_exact(reporter)?);
                self.emit(sink.int64_value(i64::from(value), SemanticTag::None));
            }
            tag::TIMESTAMP => {
                let value = u64::from_le_bytes(self.read_exact(reporter)?);
                self.emit(sink.uint64_value(value, SemanticTag::Timestamp));
            }
            tag::INT64 => {
                let value = i64::from_le_bytes(self.read_exact(reporter)?);
                self.emit(sink.int64_value(value, SemanticTag::None));
            }
            _ => return Err(self.fatal(reporter, DiagnosticCode::UnknownTag)),
        }
        Ok(())
    }

    /// `string := int32-length text 0x00`; the length counts the text bytes
    /// plus the terminator. The result lands in `text_buffer`.
    fn read_string<R: ErrorReporter>(&mut self, reporter: &mut R) -> Result<(), ParseError> {
        let length = self.read_i32(reporter)?;
        if length < 1 {
            return Err(self.fatal(reporter, DiagnosticCode::UnexpectedEof));
        }
        let text_len = (length - 1) as usize;
        self.text_buffer.clear();
        self.text_buffer.reserve(text_len);
        if self.source.read_into(&mut self.text_buffer, text_len) != text_len {
            return Err(self.fatal(reporter, DiagnosticCode::UnexpectedEof));
        }
        if self.source.get().is_none() {
            return Err(self.fatal(reporter, DiagnosticCode::UnexpectedEof));
        }
        if utf8::validate(&self.text_buffer).is_err() {
            return Err(self.fatal(reporter, DiagnosticCode::InvalidUtf8TextString));
        }
        Ok(())
    }
}

impl<'a> BsonParser<SliceSource<'a>> {
    /// Convenience constructor over a byte slice.
    #[must_use]
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::new(SliceSource::new(data))
    }
}
