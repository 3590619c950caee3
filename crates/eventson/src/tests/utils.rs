use alloc::vec::Vec;

use crate::{
    DefaultErrorReporter, DiagnosticCode, Event, EventCollector, EventSink, JsonParser,
    RecordingErrorReporter, SemanticTag,
};

/// Parses `input` as a single complete document with the strict reporter;
/// panics on any diagnostic.
pub fn parse_events(input: &str) -> Vec<Event> {
    let mut parser = JsonParser::new();
    let mut events = EventCollector::new();
    let mut reporter = DefaultErrorReporter;
    parser.parse(input.as_bytes(), &mut events, &mut reporter).unwrap();
    parser.end_parse(&mut events, &mut reporter).unwrap();
    assert!(parser.done(), "input did not parse to completion: {input:?}");
    events.events
}

/// Parses `input` with the recording reporter; returns the events and every
/// recoverable diagnostic.
pub fn parse_events_lenient(input: &str) -> (Vec<Event>, Vec<DiagnosticCode>) {
    let mut parser = JsonParser::new();
    let mut events = EventCollector::new();
    let mut reporter = RecordingErrorReporter::new();
    parser.parse(input.as_bytes(), &mut events, &mut reporter).unwrap();
    parser.end_parse(&mut events, &mut reporter).unwrap();
    (events.events, reporter.codes())
}

/// Feeds `input` split at the given byte offsets, then finishes.
pub fn parse_events_chunked(input: &str, boundaries: &[usize]) -> Vec<Event> {
    let mut parser = JsonParser::new();
    let mut events = EventCollector::new();
    let mut reporter = DefaultErrorReporter;
    let bytes = input.as_bytes();
    let mut start = 0;
    for &boundary in boundaries {
        let boundary = boundary.clamp(start, bytes.len());
        parser.parse(&bytes[start..boundary], &mut events, &mut reporter).unwrap();
        start = boundary;
    }
    parser.parse(&bytes[start..], &mut events, &mut reporter).unwrap();
    parser.end_parse(&mut events, &mut reporter).unwrap();
    events.events
}

/// The scalar tag both test suites spell out constantly.
pub const NONE: SemanticTag = SemanticTag::None;

/// Sink that accepts a fixed number of events and then answers `false`.
#[derive(Debug, Default)]
pub struct StoppingSink {
    pub budget: usize,
    pub events: Vec<Event>,
}

impl StoppingSink {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            events: Vec::new(),
        }
    }

    fn push(&mut self, event: Event) -> bool {
        if self.budget == 0 {
            return false;
        }
        self.budget -= 1;
        self.events.push(event);
        true
    }
}

impl EventSink for StoppingSink {
    fn begin_document(&mut self) -> bool {
        self.push(Event::BeginDocument)
    }

    fn end_document(&mut self) -> bool {
        self.push(Event::EndDocument)
    }

    fn begin_object(&mut self) -> bool {
        self.push(Event::BeginObject)
    }

    fn end_object(&mut self) -> bool {
        self.push(Event::EndObject)
    }

    fn begin_array(&mut self) -> bool {
        self.push(Event::BeginArray)
    }

    fn end_array(&mut self) -> bool {
        self.push(Event::EndArray)
    }

    fn name(&mut self, name: &[u8]) -> bool {
        self.push(Event::Name(name.to_vec()))
    }

    fn null_value(&mut self) -> bool {
        self.push(Event::Null)
    }

    fn bool_value(&mut self, value: bool) -> bool {
        self.push(Event::Bool(value))
    }

    fn int64_value(&mut self, value: i64, tag: SemanticTag) -> bool {
        self.push(Event::Int64(value, tag))
    }

    fn uint64_value(&mut self, value: u64, tag: SemanticTag) -> bool {
        self.push(Event::UInt64(value, tag))
    }

    fn double_value(&mut self, value: f64, precision: u8) -> bool {
        self.push(Event::Double(value, precision))
    }

    fn string_value(&mut self, value: &[u8]) -> bool {
        self.push(Event::String(value.to_vec()))
    }

    fn byte_string_value(&mut self, value: &[u8], tag: SemanticTag) -> bool {
        self.push(Event::Binary(value.to_vec(), tag))
    }
}
