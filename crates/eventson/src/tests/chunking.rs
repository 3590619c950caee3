//! Chunk-invariance: splitting the input into arbitrary slices must not
//! change the emitted event stream.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use quickcheck::{Arbitrary, Gen, QuickCheck};

use super::utils::parse_events;
use crate::{DefaultErrorReporter, Event, EventCollector, JsonParser};

/// A generated document tree, rendered to JSON text for the property.
#[derive(Debug, Clone)]
enum Node {
    Null,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Str(String),
    Arr(Vec<Node>),
    Obj(Vec<(String, Node)>),
}

fn arbitrary_node(g: &mut Gen, depth: usize) -> Node {
    let scalar_only = depth == 0;
    let choice = if scalar_only {
        u8::arbitrary(g) % 5
    } else {
        u8::arbitrary(g) % 7
    };
    match choice {
        0 => Node::Null,
        1 => Node::Bool(bool::arbitrary(g)),
        2 => Node::UInt(u64::arbitrary(g)),
        3 => Node::Int(i64::arbitrary(g)),
        4 => Node::Str(String::arbitrary(g)),
        5 => {
            let len = usize::arbitrary(g) % 4;
            Node::Arr((0..len).map(|_| arbitrary_node(g, depth - 1)).collect())
        }
        _ => {
            let len = usize::arbitrary(g) % 4;
            Node::Obj(
                (0..len)
                    .map(|_| (String::arbitrary(g), arbitrary_node(g, depth - 1)))
                    .collect(),
            )
        }
    }
}

impl Arbitrary for Node {
    fn arbitrary(g: &mut Gen) -> Self {
        arbitrary_node(g, 3)
    }
}

fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

impl Node {
    fn render(&self, out: &mut String) {
        match self {
            Node::Null => out.push_str("null"),
            Node::Bool(true) => out.push_str("true"),
            Node::Bool(false) => out.push_str("false"),
            Node::UInt(v) => out.push_str(&format!("{v}")),
            Node::Int(v) => out.push_str(&format!("-{}", v.unsigned_abs())),
            Node::Str(s) => write_escaped(out, s),
            Node::Arr(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.render(out);
                }
                out.push(']');
            }
            Node::Obj(members) => {
                out.push('{');
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_escaped(out, key);
                    out.push(':');
                    value.render(out);
                }
                out.push('}');
            }
        }
    }
}

/// Feeds `text` in chunks whose sizes are derived from `splits`.
fn parse_partitioned(text: &str, splits: &[usize]) -> Vec<Event> {
    let bytes = text.as_bytes();
    let mut parser = JsonParser::new();
    let mut events = EventCollector::new();
    let mut reporter = DefaultErrorReporter;

    let mut start = 0;
    for &split in splits {
        if start >= bytes.len() {
            break;
        }
        let size = 1 + split % (bytes.len() - start);
        parser
            .parse(&bytes[start..start + size], &mut events, &mut reporter)
            .unwrap();
        start += size;
    }
    if start < bytes.len() {
        parser.parse(&bytes[start..], &mut events, &mut reporter).unwrap();
    }
    parser.end_parse(&mut events, &mut reporter).unwrap();
    events.events
}

#[test]
fn partitioned_input_yields_identical_events() {
    fn prop(node: Node, splits: Vec<usize>) -> bool {
        let mut text = String::new();
        node.render(&mut text);

        let whole = parse_events(&text);
        let chunked = parse_partitioned(&text, &splits);
        whole == chunked
    }

    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    QuickCheck::new()
        .tests(tests)
        .quickcheck(prop as fn(Node, Vec<usize>) -> bool);
}

#[test]
fn byte_at_a_time_matches_whole_parse() {
    let input = r#"{"π": [1, -2.5, "τé𝄞", {"deep": [[null]]}], "ok": true}"#;
    let whole = parse_events(input);

    let mut parser = JsonParser::new();
    let mut events = EventCollector::new();
    let mut reporter = DefaultErrorReporter;
    for byte in input.as_bytes() {
        parser
            .parse(core::slice::from_ref(byte), &mut events, &mut reporter)
            .unwrap();
    }
    parser.end_parse(&mut events, &mut reporter).unwrap();

    assert_eq!(events.events, whole);
}
