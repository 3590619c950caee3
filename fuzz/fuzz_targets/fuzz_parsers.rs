#![no_main]

use eventson::{BsonParser, EventCollector, JsonParser, RecordingErrorReporter};
use libfuzzer_sys::fuzz_target;

const HEADER: usize = 5; // 1 flag + 4-byte split seed

/// Split `data` into chunks using a deterministic seed, so the corpus also
/// exercises resumption at every kind of lexeme boundary.
fn split_into_chunks(data: &[u8], split_seed: u64) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < data.len() {
        let remaining = data.len() - start;
        let size = (split_seed as usize % remaining) + 1;
        chunks.push(&data[start..start + size]);
        start += size;
    }
    chunks
}

fuzz_target!(|data: &[u8]| {
    if data.len() < HEADER {
        return;
    }
    let flags = data[0];
    let split_seed = u64::from(u32::from_le_bytes(data[1..5].try_into().unwrap()));
    let data = &data[5..];

    if flags & 1 == 0 {
        let mut parser = JsonParser::new();
        if flags & 2 != 0 {
            parser.set_max_nesting_depth(usize::from(flags >> 2));
        }
        let mut sink = EventCollector::new();
        let mut reporter = RecordingErrorReporter::new();
        for chunk in split_into_chunks(data, split_seed) {
            if parser.parse(chunk, &mut sink, &mut reporter).is_err() {
                return;
            }
        }
        let _ = parser.end_parse(&mut sink, &mut reporter);
        let consumed = parser.index().min(data.len());
        let _ = parser.check_done(&data[consumed..], &mut reporter);
    } else {
        let mut parser = BsonParser::from_slice(data);
        let mut sink = EventCollector::new();
        let mut reporter = RecordingErrorReporter::new();
        let _ = parser.parse(&mut sink, &mut reporter);
    }
});
