//! The incremental JSON text parser.
//!
//! A byte-driven state machine built around an explicit state stack: the
//! stack top is the active lexical state, and pushing/popping composes
//! sub-lexemes (a string inside a member name inside an object). Because
//! every piece of progress lives in the stack and a handful of scratch
//! buffers, [`JsonParser::parse`] can stop at any byte boundary and resume
//! on the next chunk with no loss: feeding input one byte at a time yields
//! the same event stream as feeding it whole.
//!
//! The grammar is JSON plus `/* … */` and `// …` comments.

mod escape;
mod literal;
mod numbers;

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{DiagnosticCode, ErrorReporter, ParseContext, ParseError};
use crate::event::{EventSink, SemanticTag};
use literal::LiteralMatcher;

/// Lexical states of the text parser. The active state is the stack top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum State {
    /// Sentinel below the outermost value.
    Root,
    /// Before the first byte of the document.
    Start,
    /// `/` seen, comment kind undecided.
    Slash,
    /// Inside a `// …` comment.
    SlashSlash,
    /// Inside a `/* … */` comment.
    SlashStar,
    /// `*` seen inside a `/* … */` comment.
    SlashStarStar,
    /// After a member or element, before `,`, `}` or `]`.
    ExpectCommaOrEnd,
    /// An object is open (sits below its member states).
    Object,
    /// After `{`.
    ExpectMemberNameOrEnd,
    /// After `,` inside an object.
    ExpectMemberName,
    /// After a member name.
    ExpectColon,
    /// After `:`.
    ExpectValue,
    /// After `[` or an array is open (sits below its element states).
    Array,
    /// Inside a double-quoted string.
    String,
    /// The string being lexed is a member name (sits below `String`).
    MemberName,
    /// After a backslash inside a string.
    Escape,
    /// First hex digit of `\uXXXX`.
    U1,
    /// Second hex digit of `\uXXXX`.
    U2,
    /// Third hex digit of `\uXXXX`.
    U3,
    /// Fourth hex digit of `\uXXXX`.
    U4,
    /// A lead surrogate was decoded; expecting `\`.
    ExpectSurrogatePair1,
    /// Expecting `u` of the trail surrogate escape.
    ExpectSurrogatePair2,
    /// First hex digit of the trail surrogate.
    U6,
    /// Second hex digit of the trail surrogate.
    U7,
    /// Third hex digit of the trail surrogate.
    U8,
    /// Fourth hex digit of the trail surrogate.
    U9,
    /// `-` seen.
    Minus,
    /// Leading `0` seen.
    Zero,
    /// Inside the integer digits.
    Integer,
    /// Inside the fraction digits.
    Fraction,
    /// `e`/`E` seen.
    Exp1,
    /// Exponent sign seen.
    Exp2,
    /// Inside the exponent digits.
    Exp3,
    /// Matching `null`.
    N,
    /// Matching `true`.
    T,
    /// Matching `false`.
    F,
    /// `\r` consumed; line bookkeeping pending.
    Cr,
    /// `\n` consumed; line bookkeeping pending.
    Lf,
    /// The top-level value is complete.
    Done,
}

#[inline]
fn is_control(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F)
}

#[inline]
fn is_value_start(b: u8) -> bool {
    matches!(b, b'{' | b'[' | b'"' | b'-' | b'0'..=b'9' | b't' | b'f' | b'n')
}

#[inline]
fn significand_digits(len: usize) -> u8 {
    len.min(usize::from(u8::MAX)) as u8
}

/// The incremental JSON text parser.
///
/// Drives an [`EventSink`] and an [`ErrorReporter`]; holds no user data
/// beyond its scratch buffers. See the module docs for the chunking
/// contract.
#[derive(Debug)]
pub struct JsonParser {
    stack: Vec<State>,
    line: usize,
    column: usize,
    position: usize,
    nesting_depth: usize,
    max_depth: usize,
    cp: u32,
    cp2: u32,
    string_buffer: Vec<u8>,
    number_buffer: String,
    is_negative: bool,
    precision: u8,
    literal: LiteralMatcher,
    stopped: bool,
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonParser {
    /// A parser ready to consume a document.
    #[must_use]
    pub fn new() -> Self {
        let mut parser = Self {
            stack: Vec::with_capacity(16),
            line: 1,
            column: 1,
            position: 0,
            nesting_depth: 0,
            max_depth: usize::MAX,
            cp: 0,
            cp2: 0,
            string_buffer: Vec::new(),
            number_buffer: String::new(),
            is_negative: false,
            precision: 0,
            literal: LiteralMatcher::none(),
            stopped: false,
        };
        parser.begin_parse();
        parser
    }

    /// Resets the parser for a fresh document. Scratch buffers keep their
    /// capacity.
    pub fn begin_parse(&mut self) {
        self.stack.clear();
        self.stack.push(State::Root);
        self.stack.push(State::Start);
        self.line = 1;
        self.column = 1;
        self.position = 0;
        self.nesting_depth = 0;
        self.cp = 0;
        self.cp2 = 0;
        self.string_buffer.clear();
        self.number_buffer.clear();
        self.is_negative = false;
        self.precision = 0;
        self.literal = LiteralMatcher::none();
        self.stopped = false;
    }

    /// Whether the top-level value is complete.
    #[must_use]
    pub fn done(&self) -> bool {
        self.top() == State::Done
    }

    /// Whether the sink stopped the parser by returning `false`.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// The active lexical state.
    #[must_use]
    pub fn state(&self) -> State {
        self.top()
    }

    /// Current line, 1-based.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Current column, 1-based.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Bytes consumed since `begin_parse`.
    #[must_use]
    pub fn index(&self) -> usize {
        self.position
    }

    /// The configured nesting cap.
    #[must_use]
    pub fn max_nesting_depth(&self) -> usize {
        self.max_depth
    }

    /// Caps the nesting depth. Opening a container beyond the cap reports
    /// [`DiagnosticCode::MaxDepthExceeded`]; nesting exactly at the cap is
    /// accepted.
    pub fn set_max_nesting_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Consumes a chunk of input.
    ///
    /// Returns when the slice is exhausted, the document completes, or the
    /// sink stops the parser. Partial lexemes are carried over to the next
    /// call.
    ///
    /// # Errors
    ///
    /// Propagates any diagnostic the reporter promoted to a stop.
    pub fn parse<S: EventSink, R: ErrorReporter>(
        &mut self,
        input: &[u8],
        sink: &mut S,
        reporter: &mut R,
    ) -> Result<(), ParseError> {
        let mut p = 0usize;
        while p < input.len() && !self.done() && !self.stopped {
            let b = input[p];
            match self.top() {
                State::Cr => {
                    self.line += 1;
                    self.column = 1;
                    self.pop();
                    if b == b'\n' {
                        p += 1;
                        self.position += 1;
                    }
                }
                State::Lf => {
                    self.line += 1;
                    self.column = 1;
                    self.pop();
                }

                State::String => self.scan_string(input, &mut p, sink, reporter)?,

                // Stray control bytes never participate in any other
                // production; recovery skips them.
                _ if is_control(b) => {
                    self.report(reporter, DiagnosticCode::IllegalControlCharacter, Some(b))?;
                    self.advance(&mut p);
                }

                State::Start => {
                    if !self.whitespace_or_comment(input, &mut p, b) {
                        match b {
                            b'}' => {
                                return Err(self.fatal(
                                    reporter,
                                    DiagnosticCode::UnexpectedRightBrace,
                                    Some(b),
                                ));
                            }
                            b']' => {
                                return Err(self.fatal(
                                    reporter,
                                    DiagnosticCode::UnexpectedRightBracket,
                                    Some(b),
                                ));
                            }
                            _ if is_value_start(b) => {
                                self.emit(sink.begin_document());
                                self.start_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            _ => {
                                return Err(self.fatal(
                                    reporter,
                                    DiagnosticCode::InvalidJsonText,
                                    Some(b),
                                ));
                            }
                        }
                    }
                }

                State::ExpectValue => {
                    if !self.whitespace_or_comment(input, &mut p, b) {
                        match b {
                            _ if is_value_start(b) => {
                                self.start_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            b']' => {
                                if self.parent() == State::Array {
                                    // `[1,]`: report the dangling comma and
                                    // close the array anyway.
                                    self.report(reporter, DiagnosticCode::ExtraComma, Some(b))?;
                                    self.end_array_value(sink, reporter, Some(b))?;
                                } else {
                                    self.report(reporter, DiagnosticCode::ExpectedValue, Some(b))?;
                                }
                                self.advance(&mut p);
                            }
                            b',' => {
                                self.report(reporter, DiagnosticCode::ExtraComma, Some(b))?;
                                self.advance(&mut p);
                            }
                            b'\'' => {
                                self.report(reporter, DiagnosticCode::SingleQuote, Some(b))?;
                                self.advance(&mut p);
                            }
                            _ => {
                                self.report(reporter, DiagnosticCode::ExpectedValue, Some(b))?;
                                self.advance(&mut p);
                            }
                        }
                    }
                }

                State::Array => {
                    if !self.whitespace_or_comment(input, &mut p, b) {
                        match b {
                            _ if is_value_start(b) => {
                                self.start_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            b']' => {
                                self.end_array_value(sink, reporter, Some(b))?;
                                self.advance(&mut p);
                            }
                            b'\'' => {
                                self.report(reporter, DiagnosticCode::SingleQuote, Some(b))?;
                                self.advance(&mut p);
                            }
                            _ => {
                                self.report(reporter, DiagnosticCode::ExpectedValue, Some(b))?;
                                self.advance(&mut p);
                            }
                        }
                    }
                }

                State::ExpectCommaOrEnd => {
                    if !self.whitespace_or_comment(input, &mut p, b) {
                        match b {
                            b'}' => {
                                self.nesting_depth = self.nesting_depth.saturating_sub(1);
                                self.pop();
                                match self.top() {
                                    State::Object => {
                                        self.emit(sink.end_object());
                                        self.finish_value(sink, reporter, Some(b))?;
                                    }
                                    State::Array => {
                                        return Err(self.fatal(
                                            reporter,
                                            DiagnosticCode::ExpectedCommaOrRightBracket,
                                            Some(b),
                                        ));
                                    }
                                    _ => {
                                        return Err(self.fatal(
                                            reporter,
                                            DiagnosticCode::UnexpectedRightBrace,
                                            Some(b),
                                        ));
                                    }
                                }
                                self.advance(&mut p);
                            }
                            b']' => {
                                self.nesting_depth = self.nesting_depth.saturating_sub(1);
                                self.pop();
                                match self.top() {
                                    State::Array => {
                                        self.emit(sink.end_array());
                                        self.finish_value(sink, reporter, Some(b))?;
                                    }
                                    State::Object => {
                                        return Err(self.fatal(
                                            reporter,
                                            DiagnosticCode::ExpectedCommaOrRightBrace,
                                            Some(b),
                                        ));
                                    }
                                    _ => {
                                        return Err(self.fatal(
                                            reporter,
                                            DiagnosticCode::UnexpectedRightBracket,
                                            Some(b),
                                        ));
                                    }
                                }
                                self.advance(&mut p);
                            }
                            b',' => {
                                self.begin_member_or_element(reporter, Some(b))?;
                                self.advance(&mut p);
                            }
                            _ => {
                                match self.parent() {
                                    State::Array => self.report(
                                        reporter,
                                        DiagnosticCode::ExpectedCommaOrRightBracket,
                                        Some(b),
                                    )?,
                                    State::Object => self.report(
                                        reporter,
                                        DiagnosticCode::ExpectedCommaOrRightBrace,
                                        Some(b),
                                    )?,
                                    _ => {}
                                }
                                self.advance(&mut p);
                            }
                        }
                    }
                }

                State::ExpectMemberNameOrEnd => {
                    if !self.whitespace_or_comment(input, &mut p, b) {
                        match b {
                            b'}' => {
                                self.end_object_value(sink, reporter, Some(b))?;
                                self.advance(&mut p);
                            }
                            b'"' => {
                                *self.top_mut() = State::MemberName;
                                self.stack.push(State::String);
                                self.advance(&mut p);
                            }
                            b'\'' => {
                                self.report(reporter, DiagnosticCode::SingleQuote, Some(b))?;
                                self.advance(&mut p);
                            }
                            _ => {
                                self.report(reporter, DiagnosticCode::ExpectedName, Some(b))?;
                                self.advance(&mut p);
                            }
                        }
                    }
                }

                State::ExpectMemberName => {
                    if !self.whitespace_or_comment(input, &mut p, b) {
                        match b {
                            b'"' => {
                                *self.top_mut() = State::MemberName;
                                self.stack.push(State::String);
                                self.advance(&mut p);
                            }
                            b'}' => {
                                // `{"a":1,}`: report the dangling comma and
                                // close the object anyway.
                                self.report(reporter, DiagnosticCode::ExtraComma, Some(b))?;
                                self.end_object_value(sink, reporter, Some(b))?;
                                self.advance(&mut p);
                            }
                            b'\'' => {
                                self.report(reporter, DiagnosticCode::SingleQuote, Some(b))?;
                                self.advance(&mut p);
                            }
                            _ => {
                                self.report(reporter, DiagnosticCode::ExpectedName, Some(b))?;
                                self.advance(&mut p);
                            }
                        }
                    }
                }

                State::ExpectColon => {
                    if !self.whitespace_or_comment(input, &mut p, b) {
                        match b {
                            b':' => {
                                *self.top_mut() = State::ExpectValue;
                                self.advance(&mut p);
                            }
                            _ => {
                                self.report(reporter, DiagnosticCode::ExpectedColon, Some(b))?;
                                self.advance(&mut p);
                            }
                        }
                    }
                }

                State::Escape => {
                    match b {
                        b'"' | b'\\' | b'/' => {
                            self.string_buffer.push(b);
                            *self.top_mut() = State::String;
                        }
                        b'b' => {
                            self.string_buffer.push(0x08);
                            *self.top_mut() = State::String;
                        }
                        b'f' => {
                            self.string_buffer.push(0x0C);
                            *self.top_mut() = State::String;
                        }
                        b'n' => {
                            self.string_buffer.push(b'\n');
                            *self.top_mut() = State::String;
                        }
                        b'r' => {
                            self.string_buffer.push(b'\r');
                            *self.top_mut() = State::String;
                        }
                        b't' => {
                            self.string_buffer.push(b'\t');
                            *self.top_mut() = State::String;
                        }
                        b'u' => {
                            self.cp = 0;
                            *self.top_mut() = State::U1;
                        }
                        _ => {
                            self.report(reporter, DiagnosticCode::IllegalEscapedCharacter, Some(b))?;
                            // recovery - drop the escape
                            *self.top_mut() = State::String;
                        }
                    }
                    self.advance(&mut p);
                }

                State::U1 => {
                    self.append_codepoint_digit(b, reporter, false)?;
                    *self.top_mut() = State::U2;
                    self.advance(&mut p);
                }
                State::U2 => {
                    self.append_codepoint_digit(b, reporter, false)?;
                    *self.top_mut() = State::U3;
                    self.advance(&mut p);
                }
                State::U3 => {
                    self.append_codepoint_digit(b, reporter, false)?;
                    *self.top_mut() = State::U4;
                    self.advance(&mut p);
                }
                State::U4 => {
                    self.append_codepoint_digit(b, reporter, false)?;
                    if escape::is_lead_surrogate(self.cp) {
                        *self.top_mut() = State::ExpectSurrogatePair1;
                    } else {
                        if !escape::push_codepoint(&mut self.string_buffer, self.cp) {
                            self.report(
                                reporter,
                                DiagnosticCode::ExpectedCodepointSurrogatePair,
                                Some(b),
                            )?;
                        }
                        *self.top_mut() = State::String;
                    }
                    self.advance(&mut p);
                }

                State::ExpectSurrogatePair1 => match b {
                    b'\\' => {
                        self.cp2 = 0;
                        *self.top_mut() = State::ExpectSurrogatePair2;
                        self.advance(&mut p);
                    }
                    _ => {
                        self.report(
                            reporter,
                            DiagnosticCode::ExpectedCodepointSurrogatePair,
                            Some(b),
                        )?;
                        // recovery - substitute the unpaired lead surrogate
                        // and re-examine the byte as string content
                        escape::push_codepoint(&mut self.string_buffer, 0xFFFD);
                        *self.top_mut() = State::String;
                    }
                },
                State::ExpectSurrogatePair2 => match b {
                    b'u' => {
                        *self.top_mut() = State::U6;
                        self.advance(&mut p);
                    }
                    _ => {
                        self.report(
                            reporter,
                            DiagnosticCode::ExpectedCodepointSurrogatePair,
                            Some(b),
                        )?;
                        escape::push_codepoint(&mut self.string_buffer, 0xFFFD);
                        *self.top_mut() = State::String;
                    }
                },
                State::U6 => {
                    self.append_codepoint_digit(b, reporter, true)?;
                    *self.top_mut() = State::U7;
                    self.advance(&mut p);
                }
                State::U7 => {
                    self.append_codepoint_digit(b, reporter, true)?;
                    *self.top_mut() = State::U8;
                    self.advance(&mut p);
                }
                State::U8 => {
                    self.append_codepoint_digit(b, reporter, true)?;
                    *self.top_mut() = State::U9;
                    self.advance(&mut p);
                }
                State::U9 => {
                    self.append_codepoint_digit(b, reporter, true)?;
                    if escape::is_trail_surrogate(self.cp2) {
                        let cp = escape::combine_surrogates(self.cp, self.cp2);
                        escape::push_codepoint(&mut self.string_buffer, cp);
                    } else {
                        self.report(
                            reporter,
                            DiagnosticCode::ExpectedCodepointSurrogatePair,
                            Some(b),
                        )?;
                        escape::push_codepoint(&mut self.string_buffer, 0xFFFD);
                    }
                    *self.top_mut() = State::String;
                    self.advance(&mut p);
                }

                State::Minus => {
                    match b {
                        b'0' => {
                            self.number_buffer.push('0');
                            *self.top_mut() = State::Zero;
                        }
                        b'1'..=b'9' => {
                            self.number_buffer.push(char::from(b));
                            *self.top_mut() = State::Integer;
                        }
                        _ => {
                            self.report(reporter, DiagnosticCode::ExpectedValue, Some(b))?;
                        }
                    }
                    self.advance(&mut p);
                }

                State::Zero => {
                    if matches!(b, b'\r' | b'\n' | b' ' | b'\t' | b'/') {
                        self.end_integer_value(sink, reporter, Some(b))?;
                        self.whitespace_or_comment(input, &mut p, b);
                    } else {
                        match b {
                            b'}' => {
                                self.end_integer_value(sink, reporter, Some(b))?;
                                self.close_object_after_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            b']' => {
                                self.end_integer_value(sink, reporter, Some(b))?;
                                self.close_array_after_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            b'.' => {
                                self.precision = significand_digits(self.number_buffer.len());
                                self.number_buffer.push('.');
                                *self.top_mut() = State::Fraction;
                                self.advance(&mut p);
                            }
                            b',' => {
                                self.end_integer_value(sink, reporter, Some(b))?;
                                self.begin_member_or_element(reporter, Some(b))?;
                                self.advance(&mut p);
                            }
                            b'e' | b'E' => {
                                self.precision = significand_digits(self.number_buffer.len());
                                self.number_buffer.push(char::from(b));
                                *self.top_mut() = State::Exp1;
                                self.advance(&mut p);
                            }
                            b'0'..=b'9' => {
                                self.report(reporter, DiagnosticCode::LeadingZero, Some(b))?;
                                self.advance(&mut p);
                            }
                            _ => {
                                self.report(reporter, DiagnosticCode::InvalidNumber, Some(b))?;
                                self.advance(&mut p);
                            }
                        }
                    }
                }

                State::Integer => {
                    if matches!(b, b'\r' | b'\n' | b' ' | b'\t' | b'/') {
                        self.end_integer_value(sink, reporter, Some(b))?;
                        self.whitespace_or_comment(input, &mut p, b);
                    } else {
                        match b {
                            b'}' => {
                                self.end_integer_value(sink, reporter, Some(b))?;
                                self.close_object_after_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            b']' => {
                                self.end_integer_value(sink, reporter, Some(b))?;
                                self.close_array_after_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            b'0'..=b'9' => {
                                self.number_buffer.push(char::from(b));
                                self.advance(&mut p);
                                // Hot loop: swallow the rest of the digit run
                                // in this chunk.
                                while p < input.len() && input[p].is_ascii_digit() {
                                    self.number_buffer.push(char::from(input[p]));
                                    self.advance(&mut p);
                                }
                            }
                            b'.' => {
                                self.precision = significand_digits(self.number_buffer.len());
                                self.number_buffer.push('.');
                                *self.top_mut() = State::Fraction;
                                self.advance(&mut p);
                            }
                            b',' => {
                                self.end_integer_value(sink, reporter, Some(b))?;
                                self.begin_member_or_element(reporter, Some(b))?;
                                self.advance(&mut p);
                            }
                            b'e' | b'E' => {
                                self.precision = significand_digits(self.number_buffer.len());
                                self.number_buffer.push(char::from(b));
                                *self.top_mut() = State::Exp1;
                                self.advance(&mut p);
                            }
                            _ => {
                                self.report(reporter, DiagnosticCode::InvalidNumber, Some(b))?;
                                self.advance(&mut p);
                            }
                        }
                    }
                }

                State::Fraction => {
                    if matches!(b, b'\r' | b'\n' | b' ' | b'\t' | b'/') {
                        self.end_fraction_value(sink, reporter, Some(b))?;
                        self.whitespace_or_comment(input, &mut p, b);
                    } else {
                        match b {
                            b'}' => {
                                self.end_fraction_value(sink, reporter, Some(b))?;
                                self.close_object_after_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            b']' => {
                                self.end_fraction_value(sink, reporter, Some(b))?;
                                self.close_array_after_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            b'0'..=b'9' => {
                                self.precision = self.precision.saturating_add(1);
                                self.number_buffer.push(char::from(b));
                                self.advance(&mut p);
                                while p < input.len() && input[p].is_ascii_digit() {
                                    self.precision = self.precision.saturating_add(1);
                                    self.number_buffer.push(char::from(input[p]));
                                    self.advance(&mut p);
                                }
                            }
                            b',' => {
                                self.end_fraction_value(sink, reporter, Some(b))?;
                                self.begin_member_or_element(reporter, Some(b))?;
                                self.advance(&mut p);
                            }
                            b'e' | b'E' => {
                                self.number_buffer.push(char::from(b));
                                *self.top_mut() = State::Exp1;
                                self.advance(&mut p);
                            }
                            _ => {
                                self.report(reporter, DiagnosticCode::InvalidNumber, Some(b))?;
                                self.advance(&mut p);
                            }
                        }
                    }
                }

                State::Exp1 => {
                    match b {
                        b'+' => *self.top_mut() = State::Exp2,
                        b'-' => {
                            self.number_buffer.push('-');
                            *self.top_mut() = State::Exp2;
                        }
                        b'0'..=b'9' => {
                            self.number_buffer.push(char::from(b));
                            *self.top_mut() = State::Exp3;
                        }
                        _ => {
                            self.report(reporter, DiagnosticCode::ExpectedValue, Some(b))?;
                        }
                    }
                    self.advance(&mut p);
                }
                State::Exp2 => {
                    match b {
                        b'0'..=b'9' => {
                            self.number_buffer.push(char::from(b));
                            *self.top_mut() = State::Exp3;
                        }
                        _ => {
                            self.report(reporter, DiagnosticCode::ExpectedValue, Some(b))?;
                        }
                    }
                    self.advance(&mut p);
                }
                State::Exp3 => {
                    if matches!(b, b'\r' | b'\n' | b' ' | b'\t' | b'/') {
                        self.end_fraction_value(sink, reporter, Some(b))?;
                        self.whitespace_or_comment(input, &mut p, b);
                    } else {
                        match b {
                            b'}' => {
                                self.end_fraction_value(sink, reporter, Some(b))?;
                                self.close_object_after_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            b']' => {
                                self.end_fraction_value(sink, reporter, Some(b))?;
                                self.close_array_after_value(b, sink, reporter)?;
                                self.advance(&mut p);
                            }
                            b',' => {
                                self.end_fraction_value(sink, reporter, Some(b))?;
                                self.begin_member_or_element(reporter, Some(b))?;
                                self.advance(&mut p);
                            }
                            b'0'..=b'9' => {
                                self.number_buffer.push(char::from(b));
                                self.advance(&mut p);
                                while p < input.len() && input[p].is_ascii_digit() {
                                    self.number_buffer.push(char::from(input[p]));
                                    self.advance(&mut p);
                                }
                            }
                            _ => {
                                self.report(reporter, DiagnosticCode::InvalidNumber, Some(b))?;
                                self.advance(&mut p);
                            }
                        }
                    }
                }

                State::T | State::F | State::N => {
                    while p < input.len() && !self.literal.complete() {
                        if !self.literal.step(input[p]) {
                            self.report(reporter, DiagnosticCode::InvalidValue, Some(input[p]))?;
                        }
                        self.advance(&mut p);
                    }
                    if self.literal.complete() {
                        let more = match self.top() {
                            State::T => sink.bool_value(true),
                            State::F => sink.bool_value(false),
                            _ => sink.null_value(),
                        };
                        self.emit(more);
                        self.finish_value(sink, reporter, None)?;
                    }
                }

                State::Slash => {
                    match b {
                        b'*' => *self.top_mut() = State::SlashStar,
                        b'/' => *self.top_mut() = State::SlashSlash,
                        _ => {
                            self.report(reporter, DiagnosticCode::InvalidJsonText, Some(b))?;
                        }
                    }
                    self.advance(&mut p);
                }
                State::SlashStar => {
                    match b {
                        b'\r' => self.stack.push(State::Cr),
                        b'\n' => self.stack.push(State::Lf),
                        b'*' => *self.top_mut() = State::SlashStarStar,
                        _ => {}
                    }
                    self.advance(&mut p);
                }
                State::SlashSlash => {
                    match b {
                        b'\r' => *self.top_mut() = State::Cr,
                        b'\n' => *self.top_mut() = State::Lf,
                        _ => {}
                    }
                    self.advance(&mut p);
                }
                State::SlashStarStar => {
                    match b {
                        b'/' => {
                            self.pop();
                        }
                        _ => *self.top_mut() = State::SlashStar,
                    }
                    self.advance(&mut p);
                }

                State::Root | State::Object | State::MemberName | State::Done => {
                    // Never the stack top between begin_parse and Done.
                    unreachable!("bad parser state");
                }
            }
        }
        Ok(())
    }

    /// Declares the end of input.
    ///
    /// A trailing number lexeme left in a terminal state is finalized first;
    /// then, if the document is not complete,
    /// [`DiagnosticCode::UnexpectedEof`] is reported.
    ///
    /// # Errors
    ///
    /// Propagates any diagnostic the reporter promoted to a stop.
    pub fn end_parse<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
    ) -> Result<(), ParseError> {
        match self.top() {
            State::Zero | State::Integer => self.end_integer_value(sink, reporter, None)?,
            State::Fraction | State::Exp3 => self.end_fraction_value(sink, reporter, None)?,
            _ => {}
        }
        if !self.done() {
            self.report(reporter, DiagnosticCode::UnexpectedEof, None)?;
        }
        Ok(())
    }

    /// Verifies that the bytes after a completed document are whitespace,
    /// reporting [`DiagnosticCode::ExtraCharacter`] for each that is not.
    ///
    /// # Errors
    ///
    /// Propagates any diagnostic the reporter promoted to a stop.
    pub fn check_done<R: ErrorReporter>(
        &mut self,
        trailing: &[u8],
        reporter: &mut R,
    ) -> Result<(), ParseError> {
        for &b in trailing {
            match b {
                b'\n' | b'\r' | b'\t' | b' ' => {}
                _ => self.report(reporter, DiagnosticCode::ExtraCharacter, Some(b))?,
            }
            self.position += 1;
            self.column += 1;
        }
        Ok(())
    }

    // --- state-stack plumbing ---------------------------------------------

    #[inline]
    fn top(&self) -> State {
        self.stack.last().copied().unwrap_or(State::Root)
    }

    #[inline]
    fn top_mut(&mut self) -> &mut State {
        // The stack holds at least [Root, Start] between begin_parse and
        // Done; an empty stack is a parser bug, not an input condition.
        match self.stack.last_mut() {
            Some(top) => top,
            None => unreachable!("bad parser state"),
        }
    }

    /// The state under the top: the container (or lexeme) the active state
    /// belongs to.
    #[inline]
    fn parent(&self) -> State {
        if self.stack.len() >= 2 {
            self.stack[self.stack.len() - 2]
        } else {
            State::Root
        }
    }

    #[inline]
    fn pop(&mut self) {
        self.stack.pop();
    }

    #[inline]
    fn advance(&mut self, p: &mut usize) {
        *p += 1;
        self.column += 1;
        self.position += 1;
    }

    #[inline]
    fn emit(&mut self, more: bool) {
        if !more {
            self.stopped = true;
        }
    }

    fn context(&self, current: Option<u8>) -> ParseContext {
        ParseContext {
            line: self.line,
            column: self.column,
            position: self.position,
            current,
        }
    }

    fn report<R: ErrorReporter>(
        &self,
        reporter: &mut R,
        code: DiagnosticCode,
        current: Option<u8>,
    ) -> Result<(), ParseError> {
        reporter.error(code, &self.context(current))
    }

    fn fatal<R: ErrorReporter>(
        &self,
        reporter: &mut R,
        code: DiagnosticCode,
        current: Option<u8>,
    ) -> ParseError {
        reporter.fatal_error(code, &self.context(current))
    }

    // --- shared transition helpers ----------------------------------------

    /// Whitespace and comment entry shared by every state that allows blank
    /// space. Consumes the byte (and, for spaces and tabs, the rest of the
    /// run in this chunk) and returns `true`, or leaves it for the caller.
    fn whitespace_or_comment(&mut self, input: &[u8], p: &mut usize, b: u8) -> bool {
        match b {
            b'\r' => {
                self.stack.push(State::Cr);
                self.advance(p);
            }
            b'\n' => {
                self.stack.push(State::Lf);
                self.advance(p);
            }
            b' ' | b'\t' => {
                self.advance(p);
                while *p < input.len() && matches!(input[*p], b' ' | b'\t') {
                    self.advance(p);
                }
            }
            b'/' => {
                self.stack.push(State::Slash);
                self.advance(p);
            }
            _ => return false,
        }
        true
    }

    /// Dispatches the first byte of a value. The caller has checked
    /// [`is_value_start`] and consumes the byte afterwards.
    fn start_value<S: EventSink, R: ErrorReporter>(
        &mut self,
        b: u8,
        sink: &mut S,
        reporter: &mut R,
    ) -> Result<(), ParseError> {
        match b {
            b'{' => {
                self.nesting_depth += 1;
                if self.nesting_depth > self.max_depth {
                    self.report(reporter, DiagnosticCode::MaxDepthExceeded, Some(b))?;
                }
                *self.top_mut() = State::Object;
                self.stack.push(State::ExpectMemberNameOrEnd);
                self.emit(sink.begin_object());
            }
            b'[' => {
                self.nesting_depth += 1;
                if self.nesting_depth > self.max_depth {
                    self.report(reporter, DiagnosticCode::MaxDepthExceeded, Some(b))?;
                }
                *self.top_mut() = State::Array;
                self.stack.push(State::Array);
                self.emit(sink.begin_array());
            }
            b'"' => {
                *self.top_mut() = State::String;
            }
            b'-' => {
                self.is_negative = true;
                *self.top_mut() = State::Minus;
            }
            b'0' => {
                self.number_buffer.push('0');
                *self.top_mut() = State::Zero;
            }
            b'1'..=b'9' => {
                self.number_buffer.push(char::from(b));
                *self.top_mut() = State::Integer;
            }
            b't' | b'f' | b'n' => {
                self.literal = LiteralMatcher::start(b);
                *self.top_mut() = match b {
                    b't' => State::T,
                    b'f' => State::F,
                    _ => State::N,
                };
            }
            _ => unreachable!("bad parser state"),
        }
        Ok(())
    }

    /// `,` seen where a member or element ended: restores the per-container
    /// expectation state. A no-op at the document root.
    fn begin_member_or_element<R: ErrorReporter>(
        &mut self,
        reporter: &mut R,
        current: Option<u8>,
    ) -> Result<(), ParseError> {
        match self.parent() {
            State::Object => *self.top_mut() = State::ExpectMemberName,
            State::Array => *self.top_mut() = State::ExpectValue,
            State::Root => {}
            _ => self.report(reporter, DiagnosticCode::InvalidJsonText, current)?,
        }
        Ok(())
    }

    /// A value just completed; decide what the enclosing frame expects next.
    fn finish_value<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
        current: Option<u8>,
    ) -> Result<(), ParseError> {
        match self.parent() {
            State::Root => {
                *self.top_mut() = State::Done;
                self.emit(sink.end_document());
            }
            State::Object | State::Array => *self.top_mut() = State::ExpectCommaOrEnd,
            _ => self.report(reporter, DiagnosticCode::InvalidJsonText, current)?,
        }
        Ok(())
    }

    /// `}` at a value-completion site: pop, type-check, emit.
    fn end_object_value<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
        current: Option<u8>,
    ) -> Result<(), ParseError> {
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
        self.pop();
        if self.top() != State::Object {
            self.report(reporter, DiagnosticCode::InvalidJsonText, current)?;
        }
        self.emit(sink.end_object());
        self.finish_value(sink, reporter, current)
    }

    /// `]` at a value-completion site: pop, type-check, emit.
    fn end_array_value<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
        current: Option<u8>,
    ) -> Result<(), ParseError> {
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
        self.pop();
        if self.top() != State::Array {
            self.report(reporter, DiagnosticCode::InvalidJsonText, current)?;
        }
        self.emit(sink.end_array());
        self.finish_value(sink, reporter, current)
    }

    /// `}` immediately after a number lexeme. When the number itself closed
    /// the document (a root value), the brace is extra input rather than a
    /// container close.
    fn close_object_after_value<S: EventSink, R: ErrorReporter>(
        &mut self,
        b: u8,
        sink: &mut S,
        reporter: &mut R,
    ) -> Result<(), ParseError> {
        if self.top() == State::Done {
            self.report(reporter, DiagnosticCode::ExtraCharacter, Some(b))
        } else {
            self.end_object_value(sink, reporter, Some(b))
        }
    }

    /// `]` immediately after a number lexeme; see
    /// [`Self::close_object_after_value`].
    fn close_array_after_value<S: EventSink, R: ErrorReporter>(
        &mut self,
        b: u8,
        sink: &mut S,
        reporter: &mut R,
    ) -> Result<(), ParseError> {
        if self.top() == State::Done {
            self.report(reporter, DiagnosticCode::ExtraCharacter, Some(b))
        } else {
            self.end_array_value(sink, reporter, Some(b))
        }
    }

    // --- strings ----------------------------------------------------------

    /// Hot loop for string content: scans forward to the next `"`, `\` or
    /// control byte, accumulating raw bytes. A string that fits in one
    /// chunk with no escapes is emitted straight from the input slice
    /// without touching the scratch buffer.
    fn scan_string<S: EventSink, R: ErrorReporter>(
        &mut self,
        input: &[u8],
        p: &mut usize,
        sink: &mut S,
        reporter: &mut R,
    ) -> Result<(), ParseError> {
        let start = *p;
        while *p < input.len() {
            let b = input[*p];
            match b {
                _ if is_control(b) => {
                    self.flush_run(input, start, *p);
                    self.report(reporter, DiagnosticCode::IllegalControlCharacter, Some(b))?;
                    // recovery - skip
                    self.advance(p);
                    return Ok(());
                }
                b'\r' => {
                    self.flush_run(input, start, *p);
                    self.report(reporter, DiagnosticCode::IllegalCharacterInString, Some(b))?;
                    // recovery - keep
                    self.string_buffer.push(b'\r');
                    self.stack.push(State::Cr);
                    self.advance(p);
                    return Ok(());
                }
                b'\n' => {
                    self.flush_run(input, start, *p);
                    self.report(reporter, DiagnosticCode::IllegalCharacterInString, Some(b))?;
                    // recovery - keep
                    self.string_buffer.push(b'\n');
                    self.stack.push(State::Lf);
                    self.advance(p);
                    return Ok(());
                }
                b'\t' => {
                    self.flush_run(input, start, *p);
                    self.report(reporter, DiagnosticCode::IllegalCharacterInString, Some(b))?;
                    // recovery - keep
                    self.string_buffer.push(b'\t');
                    self.advance(p);
                    return Ok(());
                }
                b'\\' => {
                    self.flush_run(input, start, *p);
                    *self.top_mut() = State::Escape;
                    self.advance(p);
                    return Ok(());
                }
                b'"' => {
                    let run_end = *p;
                    self.column += run_end - start;
                    self.position += run_end - start;
                    if self.string_buffer.is_empty() {
                        self.end_string_value(&input[start..run_end], sink, reporter, Some(b))?;
                    } else {
                        self.string_buffer.extend_from_slice(&input[start..run_end]);
                        let buffer = core::mem::take(&mut self.string_buffer);
                        self.end_string_value(&buffer, sink, reporter, Some(b))?;
                        self.string_buffer = buffer;
                        self.string_buffer.clear();
                    }
                    self.advance(p);
                    return Ok(());
                }
                _ => *p += 1,
            }
        }
        // Chunk exhausted mid-string: buffer the run and resume later.
        self.flush_run(input, start, input.len());
        Ok(())
    }

    /// Moves the scanned run `input[start..end]` into the scratch buffer and
    /// accounts for it.
    fn flush_run(&mut self, input: &[u8], start: usize, end: usize) {
        self.string_buffer.extend_from_slice(&input[start..end]);
        self.column += end - start;
        self.position += end - start;
    }

    /// A closing quote was consumed; route the finished text to the right
    /// event for the enclosing frame.
    fn end_string_value<S: EventSink, R: ErrorReporter>(
        &mut self,
        s: &[u8],
        sink: &mut S,
        reporter: &mut R,
        current: Option<u8>,
    ) -> Result<(), ParseError> {
        match self.parent() {
            State::MemberName => {
                self.emit(sink.name(s));
                self.pop();
                *self.top_mut() = State::ExpectColon;
            }
            State::Object | State::Array => {
                self.emit(sink.string_value(s));
                *self.top_mut() = State::ExpectCommaOrEnd;
            }
            State::Root => {
                self.emit(sink.string_value(s));
                *self.top_mut() = State::Done;
                self.emit(sink.end_document());
            }
            _ => self.report(reporter, DiagnosticCode::InvalidJsonText, current)?,
        }
        Ok(())
    }

    // --- numbers ----------------------------------------------------------

    /// A number lexeme with no fraction or exponent ended: signed, then
    /// unsigned 64-bit conversion, falling back to a double and finally to a
    /// reported `invalid_number` with a substitute null.
    fn end_integer_value<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
        current: Option<u8>,
    ) -> Result<(), ParseError> {
        let buffer = core::mem::take(&mut self.number_buffer);
        let precision = significand_digits(buffer.len());
        if self.is_negative {
            if let Some(value) = numbers::decimal_to_negative_integer(&buffer) {
                self.emit(sink.int64_value(value, SemanticTag::None));
            } else if let Some(value) = numbers::decimal_to_double(&buffer, precision) {
                self.emit(sink.double_value(-value, precision));
            } else {
                self.report(reporter, DiagnosticCode::InvalidNumber, current)?;
                self.emit(sink.null_value());
            }
        } else if let Some(value) = numbers::decimal_to_uinteger(&buffer) {
            self.emit(sink.uint64_value(value, SemanticTag::None));
        } else if let Some(value) = numbers::decimal_to_double(&buffer, precision) {
            self.emit(sink.double_value(value, precision));
        } else {
            self.report(reporter, DiagnosticCode::InvalidNumber, current)?;
            self.emit(sink.null_value());
        }
        self.number_buffer = buffer;
        self.number_buffer.clear();
        self.is_negative = false;
        self.precision = 0;
        self.finish_value(sink, reporter, current)
    }

    /// A number lexeme with a fraction or exponent ended.
    fn end_fraction_value<S: EventSink, R: ErrorReporter>(
        &mut self,
        sink: &mut S,
        reporter: &mut R,
        current: Option<u8>,
    ) -> Result<(), ParseError> {
        let buffer = core::mem::take(&mut self.number_buffer);
        match numbers::decimal_to_double(&buffer, self.precision) {
            Some(value) => {
                let value = if self.is_negative { -value } else { value };
                self.emit(sink.double_value(value, self.precision));
            }
            None => {
                self.report(reporter, DiagnosticCode::InvalidNumber, current)?;
                self.emit(sink.null_value());
            }
        }
        self.number_buffer = buffer;
        self.number_buffer.clear();
        self.is_negative = false;
        self.precision = 0;
        self.finish_value(sink, reporter, current)
    }

    /// Appends one hex digit to the first or second code-point accumulator.
    /// A non-hex byte is reported and skipped; the escape keeps going.
    fn append_codepoint_digit<R: ErrorReporter>(
        &mut self,
        b: u8,
        reporter: &mut R,
        second: bool,
    ) -> Result<(), ParseError> {
        match escape::hex_value(b) {
            Some(digit) => {
                let acc = if second { &mut self.cp2 } else { &mut self.cp };
                *acc = (*acc << 4) | digit;
            }
            None => self.report(reporter, DiagnosticCode::InvalidHexEscapeSequence, Some(b))?,
        }
        Ok(())
    }
}
