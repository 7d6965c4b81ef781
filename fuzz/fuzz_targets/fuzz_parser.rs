#![no_main]

use libfuzzer_sys::fuzz_target;
use streamjson::{Handlers, Parser, ParserOptions};

/// Split arbitrary bytes into boundary-agnostic chunks; the parser must never
/// care where a chunk boundary falls, including mid multi-byte sequence.
fn split_into_chunks(data: &[u8], seed: u8) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let len = data.len();
    if len == 0 {
        return chunks;
    }
    while start < len {
        let remaining = len - start;
        let size = (usize::from(seed) % remaining) + 1;
        chunks.push(&data[start..start + size]);
        start += size;
    }
    chunks
}

fn options_from_flags(flags: u8) -> ParserOptions {
    ParserOptions {
        allow_comments: flags & 1 != 0,
        allow_trailing_commas: flags & 2 != 0,
        allow_special_numbers: flags & 4 != 0,
        allow_hex_numbers: flags & 8 != 0,
        allow_unescaped_control_characters: flags & 16 != 0,
        allow_unicode_whitespace: flags & 32 != 0,
        allow_multiple_json_values: flags & 64 != 0,
        replace_invalid_encoding_sequences: flags & 128 != 0,
        ..ParserOptions::default()
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let flags = data[0];
    let seed = data[1];
    let body = &data[2..];

    let handlers = Handlers::<()>::new();
    let mut parser = Parser::new(options_from_flags(flags), handlers, ());

    for chunk in split_into_chunks(body, seed) {
        if parser.parse(chunk, false).is_err() {
            return;
        }
    }
    let _ = parser.parse(&[], true);
});
