//! End-to-end coverage, driven through the public [`Parser`] facade rather
//! than any single component in isolation.

use alloc::{
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};

use quickcheck::QuickCheck;
use rstest::rstest;

use crate::{
    Encoding, ErrorKind, HandlerResult, Handlers, MemberResult, Parser, ParserOptions,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Null,
    Boolean(bool),
    String(String),
    Number(String),
    SpecialNumber,
    StartObject,
    EndObject,
    Member(String, bool),
    StartArray,
    EndArray,
    Item(bool),
    EncodingDetected(Encoding),
}

fn recording_handlers<'h>() -> Handlers<'h, Vec<Event>> {
    Handlers::new()
        .on_null(|log: &mut Vec<Event>, _ctx| {
            log.push(Event::Null);
            HandlerResult::Continue
        })
        .on_boolean(|log, _ctx, value| {
            log.push(Event::Boolean(value));
            HandlerResult::Continue
        })
        .on_string(|log, _ctx, s| {
            log.push(Event::String(String::from_utf8_lossy(s.bytes).into_owned()));
            HandlerResult::Continue
        })
        .on_raw_number(|log, _ctx, text| {
            log.push(Event::Number(String::from_utf8_lossy(text).into_owned()));
            HandlerResult::Continue
        })
        .on_special_number(|log, _ctx, _n| {
            log.push(Event::SpecialNumber);
            HandlerResult::Continue
        })
        .on_start_object(|log, _ctx| {
            log.push(Event::StartObject);
            HandlerResult::Continue
        })
        .on_end_object(|log, _ctx| {
            log.push(Event::EndObject);
            HandlerResult::Continue
        })
        .on_object_member(|log, _ctx, s, is_first| {
            log.push(Event::Member(String::from_utf8_lossy(s.bytes).into_owned(), is_first));
            MemberResult::Continue
        })
        .on_start_array(|log, _ctx| {
            log.push(Event::StartArray);
            HandlerResult::Continue
        })
        .on_end_array(|log, _ctx| {
            log.push(Event::EndArray);
            HandlerResult::Continue
        })
        .on_array_item(|log, _ctx, is_first| {
            log.push(Event::Item(is_first));
            HandlerResult::Continue
        })
        .on_encoding_detected(|log, encoding| {
            log.push(Event::EncodingDetected(encoding));
        })
}

fn run(options: ParserOptions, input: &[u8]) -> (Vec<Event>, Result<(), ErrorKind>) {
    let mut parser = Parser::new(options, recording_handlers(), Vec::new());
    let result = parser.parse(input, true).map_err(|e| e.kind);
    (parser.user_data().clone(), result)
}

/// Splits `input` into `n`-sized chunks (last chunk may be shorter) and
/// replays the same document through a fresh parser, feeding each chunk with
/// `is_final = false` and a trailing empty flush.
fn run_chunked(options: ParserOptions, input: &[u8], chunk_size: usize) -> (Vec<Event>, Result<(), ErrorKind>) {
    let mut parser = Parser::new(options, recording_handlers(), Vec::new());
    let mut err = None;
    if chunk_size == 0 {
        let _ = parser.parse(&[], true);
    } else {
        for chunk in input.chunks(chunk_size) {
            if let Err(e) = parser.parse(chunk, false) {
                err = Some(e.kind);
                break;
            }
        }
        if err.is_none() {
            if let Err(e) = parser.parse(&[], true) {
                err = Some(e.kind);
            }
        }
    }
    let result = err.map_or(Ok(()), Err);
    (parser.user_data().clone(), result)
}

#[test]
fn scenario_object_with_nested_array() {
    let (events, result) = run(ParserOptions::default(), br#"{"a":1,"b":[true,null]}"#);
    result.unwrap();
    assert_eq!(
        events,
        vec![
            Event::StartObject,
            Event::Member("a".to_string(), true),
            Event::Number("1".to_string()),
            Event::Member("b".to_string(), false),
            Event::StartArray,
            Event::Item(true),
            Event::Boolean(true),
            Event::Item(false),
            Event::Null,
            Event::EndArray,
            Event::EndObject,
        ]
    );
}

#[test]
fn scenario_empty_array() {
    let (events, result) = run(ParserOptions::default(), b"[]");
    result.unwrap();
    assert_eq!(events, vec![Event::StartArray, Event::EndArray]);
}

/// A document shorter than the 4-byte autodetect window must still resolve
/// an encoding and replay its buffered tail instead of dropping it.
#[test]
fn short_documents_still_resolve_the_default_encoding() {
    for input in [&b"1"[..], &b"[]"[..], &b"\"a\""[..]] {
        let (_, result) = run(ParserOptions::default(), input);
        result.unwrap();
    }
}

#[test]
fn short_document_still_fires_encoding_detected() {
    let (events, result) = run(ParserOptions::default(), b"[]");
    result.unwrap();
    assert_eq!(events[0], Event::EncodingDetected(Encoding::Utf8));
}

#[test]
fn scenario_duplicate_member_fails_at_second_occurrence() {
    let options = ParserOptions { track_object_members: true, ..ParserOptions::default() };
    let (events, result) = run(options, br#"{"x":1,"x":2}"#);
    assert_eq!(result, Err(ErrorKind::DuplicateObjectMember));
    assert_eq!(
        events,
        vec![Event::StartObject, Event::Member("x".to_string(), true), Event::Number("1".to_string())]
    );
}

#[test]
fn scenario_utf16le_bom_with_allow_bom() {
    let options = ParserOptions { allow_bom: true, ..ParserOptions::default() };
    let bytes = [0xFF, 0xFE, 0x22, 0x00, 0x41, 0x00, 0x22, 0x00];
    let (events, result) = run(options, &bytes);
    result.unwrap();
    assert_eq!(events[0], Event::EncodingDetected(Encoding::Utf16Le));
    assert_eq!(events[1], Event::String("A".to_string()));
}

#[test]
fn scenario_utf16le_bom_without_allow_bom_fails() {
    let bytes = [0xFF, 0xFE, 0x22, 0x00, 0x41, 0x00, 0x22, 0x00];
    let (_, result) = run(ParserOptions::default(), &bytes);
    assert_eq!(result, Err(ErrorKind::BomNotAllowed));
}

#[test]
fn scenario_surrogate_pair_escape() {
    let (events, result) = run(ParserOptions::default(), b"\"\xf0\x9d\x84\x9e\"");
    result.unwrap();
    assert_eq!(events, vec![Event::String("\u{1D11E}".to_string())]);
}

#[test]
fn scenario_unpaired_leading_surrogate_fails() {
    let (_, result) = run(ParserOptions::default(), br#""\uD834""#);
    assert_eq!(result, Err(ErrorKind::UnpairedSurrogateEscapeSequence));
}

#[test]
fn scenario_trailing_comma_rejected_by_default() {
    let (_, result) = run(ParserOptions::default(), b"[1,2,]");
    assert_eq!(result, Err(ErrorKind::UnexpectedToken));
}

#[test]
fn scenario_trailing_comma_allowed() {
    let options = ParserOptions { allow_trailing_commas: true, ..ParserOptions::default() };
    let (events, result) = run(options, b"[1,2,]");
    result.unwrap();
    assert_eq!(
        events,
        vec![
            Event::StartArray,
            Event::Item(true),
            Event::Number("1".to_string()),
            Event::Item(false),
            Event::Number("2".to_string()),
            Event::EndArray,
        ]
    );
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(7)]
fn chunk_independence(#[case] chunk_size: usize) {
    let input = b"{\"a\":1,\"b\":[true,null,\"hi\\n\xc3\xa9\",3.14e2],\"c\":{}}";
    let (whole, whole_result) = run(ParserOptions::default(), input);
    let (chunked, chunked_result) = run_chunked(ParserOptions::default(), input, chunk_size);
    assert_eq!(whole_result, chunked_result);
    assert_eq!(whole, chunked);
}

#[test]
fn no_handler_after_abort() {
    let handlers = Handlers::new()
        .on_start_array(|log: &mut Vec<Event>, _ctx| {
            log.push(Event::StartArray);
            HandlerResult::Continue
        })
        .on_boolean(|_log: &mut Vec<Event>, _ctx, _v| HandlerResult::Abort)
        .on_null(|log: &mut Vec<Event>, _ctx| {
            log.push(Event::Null);
            HandlerResult::Continue
        });
    let mut parser = Parser::new(ParserOptions::default(), handlers, Vec::new());
    let result = parser.parse(b"[true,null]", true);
    assert_eq!(result.unwrap_err().kind, ErrorKind::AbortedByHandler);
    assert_eq!(parser.user_data(), &vec![Event::StartArray]);
}

#[test]
fn depth_is_reported_relative_to_open_containers() {
    let depths = alloc::rc::Rc::new(core::cell::RefCell::new(Vec::new()));
    let depths_in = depths.clone();
    let depths_out = depths.clone();
    let handlers = Handlers::<()>::new()
        .on_start_array(move |_u, ctx| {
            depths_in.borrow_mut().push(("start", ctx.depth()));
            HandlerResult::Continue
        })
        .on_end_array(move |_u, ctx| {
            depths_out.borrow_mut().push(("end", ctx.depth()));
            HandlerResult::Continue
        });
    let mut parser = Parser::new(ParserOptions::default(), handlers, ());
    parser.parse(b"[[[]]]", true).unwrap();
    assert_eq!(
        *depths.borrow(),
        vec![("start", 0), ("start", 1), ("start", 2), ("end", 3), ("end", 2), ("end", 1)]
    );
}

#[test]
fn number_length_cap_reports_at_token_start() {
    let long_digits: String = "1".repeat(64);
    let (_, result) = run(ParserOptions::default(), long_digits.as_bytes());
    assert_eq!(result, Err(ErrorKind::TooLongNumber));
}

#[test]
fn overlong_utf8_sequence_is_rejected() {
    let bytes = [b'"', 0xC0, 0x80, b'"'];
    let options = ParserOptions { input_encoding: Some(Encoding::Utf8), ..ParserOptions::default() };
    let (_, result) = run(options, &bytes);
    assert_eq!(result, Err(ErrorKind::InvalidEncodingSequence));
}

#[test]
fn invalid_sequence_replaced_when_enabled() {
    let bytes = [b'"', 0xC0, 0x80, b'"'];
    let options = ParserOptions {
        input_encoding: Some(Encoding::Utf8),
        replace_invalid_encoding_sequences: true,
        ..ParserOptions::default()
    };
    let (events, result) = run(options, &bytes);
    result.unwrap();
    assert_eq!(events, vec![Event::String("\u{FFFD}".to_string())]);
}

#[test]
fn locale_independent_decimal_value_is_stable_across_chunk_splits() {
    let input = b"[123.456]";
    let options = ParserOptions::default();
    let (a, _) = run_chunked(options, input, 1);
    let (b, _) = run_chunked(options, input, 9);
    assert_eq!(a, b);
}

#[test]
fn options_are_locked_after_parsing_starts() {
    let mut parser = Parser::new(ParserOptions::default(), Handlers::<()>::new(), ());
    parser.parse(b"1", true).unwrap();
    let result = parser.set_options(ParserOptions::default());
    assert_eq!(result.unwrap_err().kind, ErrorKind::OptionsLocked);
}

#[test]
fn parse_after_finish_fails() {
    let mut parser = Parser::new(ParserOptions::default(), Handlers::<()>::new(), ());
    parser.parse(b"1", true).unwrap();
    let result = parser.parse(b"2", true);
    assert_eq!(result.unwrap_err().kind, ErrorKind::AlreadyFinished);
}

#[test]
fn reset_allows_reparsing() {
    let mut parser = Parser::new(ParserOptions::default(), recording_handlers(), Vec::new());
    parser.parse(b"1", true).unwrap();
    assert!(parser.finished_parsing());
    parser.reset();
    assert!(!parser.finished_parsing());
    parser.parse(b"2", true).unwrap();
    assert_eq!(parser.user_data(), &vec![Event::Number("2".to_string())]);
}

#[test]
fn special_numbers_require_option() {
    let options = ParserOptions { allow_special_numbers: true, ..ParserOptions::default() };
    let (events, result) = run(options, b"[NaN,Infinity,-Infinity]");
    result.unwrap();
    assert_eq!(
        events,
        vec![Event::StartArray, Event::Item(true), Event::SpecialNumber, Event::Item(false), Event::SpecialNumber, Event::Item(false), Event::SpecialNumber, Event::EndArray]
    );

    let (_, rejected) = run(ParserOptions::default(), b"NaN");
    assert!(rejected.is_err());
}

#[test]
fn comments_are_skipped_when_allowed() {
    let options = ParserOptions { allow_comments: true, ..ParserOptions::default() };
    let (events, result) = run(options, b"// leading\n[1, /* inline */ 2]\n");
    result.unwrap();
    assert_eq!(
        events,
        vec![
            Event::StartArray,
            Event::Item(true),
            Event::Number("1".to_string()),
            Event::Item(false),
            Event::Number("2".to_string()),
            Event::EndArray,
        ]
    );
}

#[test]
fn multiple_json_values_when_allowed() {
    let options = ParserOptions { allow_multiple_json_values: true, ..ParserOptions::default() };
    let (events, result) = run(options, b"1 2 3");
    result.unwrap();
    assert_eq!(
        events,
        vec![Event::Number("1".to_string()), Event::Number("2".to_string()), Event::Number("3".to_string())]
    );
}

#[test]
fn error_message_includes_location() {
    let (_, result) = run(ParserOptions::default(), b"{,}");
    let kind = result.unwrap_err();
    assert_eq!(kind, ErrorKind::UnexpectedToken);
}

#[test]
fn sanity_display_of_error() {
    let mut parser = Parser::new(ParserOptions::default(), Handlers::<()>::new(), ());
    let err = parser.parse(b"{,}", true).unwrap_err();
    let text = format!("{err}");
    assert!(text.contains("unexpected token"));
}

/// Property: splitting a fixed document at any sequence of byte offsets
/// (derived from arbitrary `splits`) and feeding it chunk by chunk yields the
/// same event log as a single whole-document call.
#[test]
fn partition_independence_quickcheck() {
    const DOCUMENT: &[u8] =
        b"{\"a\":1,\"b\":[true,null,\"hi\xc3\xa9\",3.14e2,{}],\"c\":\"x\"}";

    fn prop(splits: Vec<usize>) -> bool {
        let (whole, whole_result) = run(ParserOptions::default(), DOCUMENT);

        let mut parser = Parser::new(ParserOptions::default(), recording_handlers(), Vec::new());
        let mut idx = 0;
        let mut remaining = DOCUMENT.len();
        let mut failed = false;
        for s in splits {
            if remaining == 0 {
                break;
            }
            let size = 1 + (s % remaining);
            let end = idx + size;
            if parser.parse(&DOCUMENT[idx..end], false).is_err() {
                failed = true;
                break;
            }
            idx = end;
            remaining -= size;
        }
        if !failed && remaining > 0 {
            if parser.parse(&DOCUMENT[idx..], false).is_err() {
                failed = true;
            }
        }
        let chunked_result = if failed { parser.error().map_or(Ok(()), |e| Err(e.kind)) } else { parser.parse(&[], true).map_err(|e| e.kind) };

        whole_result == chunked_result && *parser.user_data() == whole
    }

    QuickCheck::new().tests(200).quickcheck(prop as fn(Vec<usize>) -> bool);
}

#[test]
fn string_within_the_output_length_cap_is_accepted() {
    let options = ParserOptions { max_output_string_length: Some(3), ..ParserOptions::default() };
    let (events, result) = run(options, br#""abc""#);
    result.unwrap();
    assert_eq!(events, vec![Event::String("abc".to_string())]);
}

#[test]
fn string_body_byte_over_the_output_length_cap_fails() {
    let options = ParserOptions { max_output_string_length: Some(3), ..ParserOptions::default() };
    let (_, result) = run(options, br#""abcd""#);
    assert_eq!(result, Err(ErrorKind::TooLongString));
}

#[test]
fn escaped_byte_over_the_output_length_cap_fails() {
    let options = ParserOptions { max_output_string_length: Some(3), ..ParserOptions::default() };
    let (_, result) = run(options, br#""abc\n""#);
    assert_eq!(result, Err(ErrorKind::TooLongString));
}

#[test]
fn hex_escaped_byte_over_the_output_length_cap_fails() {
    let options = ParserOptions { max_output_string_length: Some(3), ..ParserOptions::default() };
    let (_, result) = run(options, br#""abc\u0064""#);
    assert_eq!(result, Err(ErrorKind::TooLongString));
}

/// Simple escapes must land in the output buffer in the configured output
/// encoding, not hard-coded UTF-8, just like raw string-body characters and
/// `\uXXXX` escapes.
#[test]
fn simple_escapes_honor_the_configured_output_encoding() {
    let handlers = Handlers::new().on_string(|log: &mut Vec<u8>, _ctx, s| {
        log.extend_from_slice(s.bytes);
        HandlerResult::Continue
    });
    let options = ParserOptions { output_encoding: Encoding::Utf16Le, ..ParserOptions::default() };
    let mut parser = Parser::new(options, handlers, Vec::new());
    parser.parse(b"\"a\\nb\"", true).unwrap();
    let captured = parser.user_data().clone();

    let expected: Vec<u8> = ['a', '\n', 'b']
        .iter()
        .flat_map(|c| (*c as u16).to_le_bytes())
        .collect();
    assert_eq!(captured, expected);
}
