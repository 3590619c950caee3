//! Incremental, event-driven parsers for two document formats: JSON text and
//! BSON binary.
//!
//! Neither parser builds a document tree. Both walk their input and push a
//! flat stream of structural events (`begin_object`, `name`, scalar values,
//! `end_array`, …) into a caller-supplied [`EventSink`]; anything beyond that
//! (trees, pretty-printing, transcoding) is the sink's business.
//!
//! The JSON parser ([`JsonParser`]) is a byte-driven state machine that
//! accepts its input as arbitrarily sized chunks and suspends mid-lexeme:
//! feeding a document one byte at a time produces exactly the same event
//! sequence as feeding it whole. The BSON parser ([`BsonParser`]) is a
//! recursive-descent reader over a pull-mode [`ByteSource`].
//!
//! Deviations from the grammar are routed through an [`ErrorReporter`],
//! which decides per diagnostic whether parsing continues (with a documented
//! repair) or stops.
//!
//! ```
//! use eventson::{DefaultErrorReporter, Event, EventCollector, JsonParser};
//!
//! let mut parser = JsonParser::new();
//! let mut events = EventCollector::new();
//! let mut reporter = DefaultErrorReporter;
//!
//! parser.parse(b"[1, 2]", &mut events, &mut reporter).unwrap();
//! parser.end_parse(&mut events, &mut reporter).unwrap();
//! assert!(parser.done());
//! assert_eq!(
//!     events.events[1..5],
//!     [
//!         Event::BeginArray,
//!         Event::UInt64(1, eventson::SemanticTag::None),
//!         Event::UInt64(2, eventson::SemanticTag::None),
//!         Event::EndArray,
//!     ]
//! );
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod error;
mod event;
mod utf8;

mod bson;
mod json;

pub use bson::{BsonParser, ByteSource, ParseMode, SliceSource};
pub use error::{
    DefaultErrorReporter, Diagnostic, DiagnosticCode, ErrorReporter, ParseContext, ParseError,
    RecordingErrorReporter,
};
pub use event::{Event, EventCollector, EventSink, NullSink, SemanticTag};
pub use json::{JsonParser, State};
pub use utf8::{validate as validate_utf8, InvalidUtf8};

#[cfg(test)]
mod tests;
