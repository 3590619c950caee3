//! The event vocabulary shared by both parsers.
//!
//! [`EventSink`] is the push interface a parser drives; [`Event`] is the
//! owned, flat representation of the same alphabet, convenient for
//! collecting, comparing and (with the `serde` feature) serializing event
//! streams.

use alloc::vec::Vec;

/// Semantic refinement attached to integer and byte-string events.
///
/// The binary format marks some wire fields as timestamps; the JSON parser
/// always passes [`SemanticTag::None`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SemanticTag {
    /// No semantic refinement.
    #[default]
    None,
    /// The value is a point in time (binary tags `0x09` and `0x11`).
    Timestamp,
}

/// Receiver of parser events.
///
/// One method per event, called in document order. Every method returns a
/// *continue* flag: returning `false` sets the parser's stopped flag and
/// makes the parse loop exit cleanly before the next event. The sink is
/// never called re-entrantly.
///
/// Byte-slice arguments (`name`, `string_value`, `byte_string_value`) may
/// borrow either the input chunk or a parser scratch buffer; copy them if
/// they must outlive the call.
pub trait EventSink {
    /// Start of a top-level value.
    fn begin_document(&mut self) -> bool;
    /// End of a top-level value.
    fn end_document(&mut self) -> bool;
    /// `{`
    fn begin_object(&mut self) -> bool;
    /// `}`
    fn end_object(&mut self) -> bool;
    /// `[`
    fn begin_array(&mut self) -> bool;
    /// `]`
    fn end_array(&mut self) -> bool;
    /// An object member name. Always followed by exactly one value event.
    fn name(&mut self, name: &[u8]) -> bool;
    /// `null`
    fn null_value(&mut self) -> bool;
    /// `true` / `false`
    fn bool_value(&mut self, value: bool) -> bool;
    /// A signed 64-bit integer.
    fn int64_value(&mut self, value: i64, tag: SemanticTag) -> bool;
    /// An unsigned 64-bit integer.
    fn uint64_value(&mut self, value: u64, tag: SemanticTag) -> bool;
    /// A floating-point value. `precision` is the advisory count of decimal
    /// significand digits in the source lexeme; 0 when no decimal rendering
    /// is implied (binary input).
    fn double_value(&mut self, value: f64, precision: u8) -> bool;
    /// UTF-8 text.
    fn string_value(&mut self, value: &[u8]) -> bool;
    /// Opaque bytes.
    fn byte_string_value(&mut self, value: &[u8], tag: SemanticTag) -> bool;
}

/// An owned parser event.
///
/// The flat data model both parsers emit: every `Begin*` is matched by one
/// `End*` at the same depth, and every `Name` is immediately followed by one
/// value event.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Start of a top-level value.
    BeginDocument,
    /// End of a top-level value.
    EndDocument,
    /// Start of an object.
    BeginObject,
    /// End of an object.
    EndObject,
    /// Start of an array.
    BeginArray,
    /// End of an array.
    EndArray,
    /// Object member name (UTF-8 bytes).
    Name(Vec<u8>),
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Int64(i64, SemanticTag),
    /// Unsigned 64-bit integer.
    UInt64(u64, SemanticTag),
    /// Floating-point value with its advisory decimal precision.
    Double(f64, u8),
    /// UTF-8 text.
    String(Vec<u8>),
    /// Opaque bytes.
    Binary(Vec<u8>, SemanticTag),
}

/// Sink that records every event into a `Vec<Event>` and never stops the
/// parser.
#[derive(Debug, Default)]
pub struct EventCollector {
    /// The recorded stream, in emission order.
    pub events: Vec<Event>,
}

impl EventCollector {
    /// An empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for EventCollector {
    fn begin_document(&mut self) -> bool {
        self.events.push(Event::BeginDocument);
        true
    }

    fn end_document(&mut self) -> bool {
        self.events.push(Event::EndDocument);
        true
    }

    fn begin_object(&mut self) -> bool {
        self.events.push(Event::BeginObject);
        true
    }

    fn end_object(&mut self) -> bool {
        self.events.push(Event::EndObject);
        true
    }

    fn begin_array(&mut self) -> bool {
        self.events.push(Event::BeginArray);
        true
    }

    fn end_array(&mut self) -> bool {
        self.events.push(Event::EndArray);
        true
    }

    fn name(&mut self, name: &[u8]) -> bool {
        self.events.push(Event::Name(name.to_vec()));
        true
    }

    fn null_value(&mut self) -> bool {
        self.events.push(Event::Null);
        true
    }

    fn bool_value(&mut self, value: bool) -> bool {
        self.events.push(Event::Bool(value));
        true
    }

    fn int64_value(&mut self, value: i64, tag: SemanticTag) -> bool {
        self.events.push(Event::Int64(value, tag));
        true
    }

    fn uint64_value(&mut self, value: u64, tag: SemanticTag) -> bool {
        self.events.push(Event::UInt64(value, tag));
        true
    }

    fn double_value(&mut self, value: f64, precision: u8) -> bool {
        self.events.push(Event::Double(value, precision));
        true
    }

    fn string_value(&mut self, value: &[u8]) -> bool {
        self.events.push(Event::String(value.to_vec()));
        true
    }

    fn byte_string_value(&mut self, value: &[u8], tag: SemanticTag) -> bool {
        self.events.push(Event::Binary(value.to_vec(), tag));
        true
    }
}

/// Sink that discards everything and always continues.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn begin_document(&mut self) -> bool {
        true
    }

    fn end_document(&mut self) -> bool {
        true
    }

    fn begin_object(&mut self) -> bool {
        true
    }

    fn end_object(&mut self) -> bool {
        true
    }

    fn begin_array(&mut self) -> bool {
        true
    }

    fn end_array(&mut self) -> bool {
        true
    }

    fn name(&mut self, _name: &[u8]) -> bool {
        true
    }

    fn null_value(&mut self) -> bool {
        true
    }

    fn bool_value(&mut self, _value: bool) -> bool {
        true
    }

    fn int64_value(&mut self, _value: i64, _tag: SemanticTag) -> bool {
        true
    }

    fn uint64_value(&mut self, _value: u64, _tag: SemanticTag) -> bool {
        true
    }

    fn double_value(&mut self, _value: f64, _precision: u8) -> bool {
        true
    }

    fn string_value(&mut self, _value: &[u8]) -> bool {
        true
    }

    fn byte_string_value(&mut self, _value: &[u8], _tag: SemanticTag) -> bool {
        true
    }
}
