#![allow(missing_docs)]

use streamjson::{ErrorKind, HandlerResult, Handlers, Parser, ParserOptions};

#[test]
fn feeding_one_byte_at_a_time_matches_a_single_call() {
    let input = br#"{"greeting":"hello, world","count":3}"#;

    let mut whole_log = Vec::new();
    let handlers = Handlers::new().on_string(|log: &mut Vec<String>, _ctx, s| {
        log.push(String::from_utf8_lossy(s.bytes).into_owned());
        HandlerResult::Continue
    });
    let mut parser = Parser::new(ParserOptions::default(), handlers, Vec::new());
    parser.parse(input, true).unwrap();
    whole_log.extend(parser.user_data().iter().cloned());

    let handlers = Handlers::new().on_string(|log: &mut Vec<String>, _ctx, s| {
        log.push(String::from_utf8_lossy(s.bytes).into_owned());
        HandlerResult::Continue
    });
    let mut chunked = Parser::new(ParserOptions::default(), handlers, Vec::new());
    for &byte in input {
        chunked.parse(&[byte], false).unwrap();
    }
    chunked.parse(&[], true).unwrap();

    assert_eq!(whole_log, chunked.user_data().clone());
}

#[test]
fn malformed_input_reports_a_stable_sticky_error() {
    let mut parser = Parser::new(ParserOptions::default(), Handlers::<()>::new(), ());
    let first = parser.parse(b"{", true).unwrap_err();
    let second = parser.parse(b"ignored", true).unwrap_err();
    assert_eq!(first.kind, ErrorKind::MoreTokensExpected);
    assert_eq!(second.kind, ErrorKind::MoreTokensExpected);
    assert_eq!(parser.error().unwrap().kind, ErrorKind::MoreTokensExpected);
}

#[test]
fn parse_after_a_successful_finish_fails_with_already_finished() {
    let mut parser = Parser::new(ParserOptions::default(), Handlers::<()>::new(), ());
    parser.parse(b"1", true).unwrap();
    let result = parser.parse(b"2", true).unwrap_err();
    assert_eq!(result.kind, ErrorKind::AlreadyFinished);
}

#[test]
fn counts_values_across_a_concatenated_stream() {
    let handlers = Handlers::new().on_number(|count: &mut u32, _ctx, _n| {
        *count += 1;
        HandlerResult::Continue
    });
    let options = ParserOptions { allow_multiple_json_values: true, ..ParserOptions::default() };
    let mut parser = Parser::new(options, handlers, 0u32);
    parser.parse(b"1 2 3 4 5", true).unwrap();
    assert_eq!(*parser.user_data(), 5);
}

#[test]
fn a_string_longer_than_the_configured_cap_is_rejected() {
    let options = ParserOptions { max_output_string_length: Some(4), ..ParserOptions::default() };
    let mut parser = Parser::new(options, Handlers::<()>::new(), ());
    let result = parser.parse(br#""too long""#, true).unwrap_err();
    assert_eq!(result.kind, ErrorKind::TooLongString);
}

#[test]
fn a_document_shorter_than_the_autodetect_window_still_parses() {
    let mut parser = Parser::new(ParserOptions::default(), Handlers::<()>::new(), ());
    parser.parse(b"[]", true).unwrap();
}
