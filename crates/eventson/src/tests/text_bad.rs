//! Malformed text inputs: fatal stops, recoverable repairs, cancellation.

use alloc::vec;

use super::utils::{parse_events_lenient, StoppingSink, NONE};
use crate::{
    DefaultErrorReporter, DiagnosticCode, Event, EventCollector, JsonParser,
    RecordingErrorReporter, State,
};

fn fatal_code(input: &str) -> DiagnosticCode {
    let mut parser = JsonParser::new();
    let mut events = EventCollector::new();
    let mut reporter = DefaultErrorReporter;
    let err = parser
        .parse(input.as_bytes(), &mut events, &mut reporter)
        .unwrap_err();
    assert!(!parser.done());
    err.code
}

#[test]
fn terminators_with_nothing_to_close() {
    assert_eq!(fatal_code("}"), DiagnosticCode::UnexpectedRightBrace);
    assert_eq!(fatal_code("]"), DiagnosticCode::UnexpectedRightBracket);
    assert_eq!(fatal_code("q"), DiagnosticCode::InvalidJsonText);
}

#[test]
fn mismatched_close_is_fatal() {
    assert_eq!(fatal_code("[1 }"), DiagnosticCode::ExpectedCommaOrRightBracket);
    assert_eq!(fatal_code(r#"{"a":1 ]"#), DiagnosticCode::ExpectedCommaOrRightBrace);
    // Straight after a number lexeme the mismatch surfaces one state
    // earlier, as invalid text.
    assert_eq!(fatal_code("[1}"), DiagnosticCode::InvalidJsonText);
}

#[test]
fn strict_reporter_promotes_recoverable_errors() {
    let mut parser = JsonParser::new();
    let mut events = EventCollector::new();
    let mut reporter = DefaultErrorReporter;
    let err = parser.parse(b"01", &mut events, &mut reporter).unwrap_err();
    assert_eq!(err.code, DiagnosticCode::LeadingZero);
    assert_eq!((err.line, err.column), (1, 2));
}

#[test]
fn leading_zero_repair_drops_the_digit() {
    let (events, codes) = parse_events_lenient("01");
    assert_eq!(codes, vec![DiagnosticCode::LeadingZero]);
    assert_eq!(events[1], Event::UInt64(0, NONE));
}

#[test]
fn single_quoted_name_is_reported() {
    let (_, codes) = parse_events_lenient("{'a': 1}");
    assert_eq!(codes.first(), Some(&DiagnosticCode::SingleQuote));
}

#[test]
fn control_byte_outside_string_is_skipped() {
    let (events, codes) = parse_events_lenient("\x01true");
    assert_eq!(codes, vec![DiagnosticCode::IllegalControlCharacter]);
    assert_eq!(events[1], Event::Bool(true));
}

#[test]
fn control_byte_inside_string_is_dropped() {
    let (events, codes) = parse_events_lenient("\"a\x01b\"");
    assert_eq!(codes, vec![DiagnosticCode::IllegalControlCharacter]);
    assert_eq!(events[1], Event::String(b"ab".to_vec()));
}

#[test]
fn tab_inside_string_is_kept() {
    let (events, codes) = parse_events_lenient("\"a\tb\"");
    assert_eq!(codes, vec![DiagnosticCode::IllegalCharacterInString]);
    assert_eq!(events[1], Event::String(b"a\tb".to_vec()));
}

#[test]
fn newline_inside_string_is_kept_and_counted() {
    let mut parser = JsonParser::new();
    let mut events = EventCollector::new();
    let mut reporter = RecordingErrorReporter::new();
    parser.parse(b"\"a\nb\"", &mut events, &mut reporter).unwrap();
    assert_eq!(reporter.codes(), vec![DiagnosticCode::IllegalCharacterInString]);
    assert_eq!(events.events[1], Event::String(b"a\nb".to_vec()));
    assert_eq!(parser.line(), 2);
}

#[test]
fn illegal_escape_is_dropped() {
    let (events, codes) = parse_events_lenient(r#""a\qb""#);
    assert_eq!(codes, vec![DiagnosticCode::IllegalEscapedCharacter]);
    assert_eq!(events[1], Event::String(b"ab".to_vec()));
}

#[test]
fn non_hex_digit_in_escape() {
    let (_, codes) = parse_events_lenient(r#""\u12G4""#);
    assert_eq!(codes, vec![DiagnosticCode::InvalidHexEscapeSequence]);
}

#[test]
fn lead_surrogate_without_trail() {
    let (events, codes) = parse_events_lenient(r#""\uD834A""#);
    assert_eq!(codes, vec![DiagnosticCode::ExpectedCodepointSurrogatePair]);
    // The unpaired lead surrogate is replaced; the byte after it is plain
    // string content.
    assert_eq!(events[1], Event::String("\u{FFFD}A".as_bytes().to_vec()));
}

#[test]
fn number_overflow_substitutes_null() {
    let (events, codes) = parse_events_lenient("[1e999]");
    assert_eq!(codes, vec![DiagnosticCode::InvalidNumber]);
    assert_eq!(
        events,
        vec![
            Event::BeginDocument,
            Event::BeginArray,
            Event::Null,
            Event::EndArray,
            Event::EndDocument,
        ]
    );
}

#[test]
fn eof_mid_document() {
    let mut parser = JsonParser::new();
    let mut events = EventCollector::new();
    let mut reporter = RecordingErrorReporter::new();
    parser.parse(br#"{"x":"#, &mut events, &mut reporter).unwrap();
    parser.end_parse(&mut events, &mut reporter).unwrap();
    assert!(!parser.done());
    assert_eq!(reporter.codes(), vec![DiagnosticCode::UnexpectedEof]);
    assert_eq!(parser.state(), State::ExpectValue);
}

#[test]
fn trailing_comma_in_object_closes_it() {
    let (events, codes) = parse_events_lenient(r#"{"a":1,}"#);
    assert_eq!(codes, vec![DiagnosticCode::ExtraComma]);
    assert_eq!(
        events,
        vec![
            Event::BeginDocument,
            Event::BeginObject,
            Event::Name(b"a".to_vec()),
            Event::UInt64(1, NONE),
            Event::EndObject,
            Event::EndDocument,
        ]
    );
}

#[test]
fn trailing_comma_in_array_closes_it() {
    let (events, codes) = parse_events_lenient("[1,]");
    assert_eq!(codes, vec![DiagnosticCode::ExtraComma]);
    assert_eq!(
        events,
        vec![
            Event::BeginDocument,
            Event::BeginArray,
            Event::UInt64(1, NONE),
            Event::EndArray,
            Event::EndDocument,
        ]
    );
}

#[test]
fn sink_false_stops_the_parser_cleanly() {
    let mut parser = JsonParser::new();
    let mut sink = StoppingSink::new(3);
    let mut reporter = DefaultErrorReporter;
    parser
        .parse(br#"{"a":1,"b":2}"#, &mut sink, &mut reporter)
        .unwrap();
    assert!(parser.stopped());
    assert!(!parser.done());
    assert_eq!(
        sink.events,
        vec![
            Event::BeginDocument,
            Event::BeginObject,
            Event::Name(b"a".to_vec()),
        ]
    );
}
