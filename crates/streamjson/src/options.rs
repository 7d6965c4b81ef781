#![allow(clippy::struct_excessive_bools)]

use crate::encoding::Encoding;

/// Configuration for a [`Parser`](crate::Parser).
///
/// Every option is write-once: once [`Parser::started_parsing`]
/// (crate::Parser::started_parsing) is `true`, every setter on `Parser`
/// fails with [`ErrorKind::OptionsLocked`](crate::ErrorKind::OptionsLocked).
///
/// # Default
///
/// `input_encoding` and `output_encoding` default to `None`/UTF-8
/// respectively; `max_output_string_length` defaults to unlimited; every
/// other field defaults to `false`.
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Forces the input encoding instead of autodetecting it from the first
    /// bytes of the stream.
    ///
    /// `None` (the default) autodetects per the byte-order-mark and
    /// zero-byte heuristic. Setting this write-once, like every other
    /// option.
    ///
    /// # Default
    ///
    /// `None`
    pub input_encoding: Option<Encoding>,

    /// The encoding used for string bytes delivered to handlers.
    ///
    /// Numbers, booleans, and structural events are unaffected; this only
    /// controls the byte form of [`Handlers::on_string`](crate::Handlers::on_string)
    /// and [`Handlers::on_object_member`](crate::Handlers::on_object_member)
    /// payloads.
    ///
    /// # Default
    ///
    /// [`Encoding::Utf8`]
    pub output_encoding: Encoding,

    /// Whether a leading U+FEFF byte-order mark is accepted at byte offset
    /// zero.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_bom: bool,

    /// Whether `//` and `/* */` comments are recognized between tokens.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_comments: bool,

    /// Whether a trailing comma before `}` or `]` is accepted instead of
    /// being an `UnexpectedToken` error.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_trailing_commas: bool,

    /// Whether the `NaN`, `Infinity`, and `-Infinity` literals are
    /// recognized as number tokens.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_special_numbers: bool,

    /// Whether unsigned `0x`/`0X`-prefixed hex integers are recognized as
    /// number tokens.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_hex_numbers: bool,

    /// Whether raw control characters (below U+0020) are accepted inside
    /// string literals without being escaped.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_unescaped_control_characters: bool,

    /// Whether any Unicode whitespace (per `char::is_whitespace`) separates
    /// tokens, instead of only space, tab, line feed, and carriage return.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_unicode_whitespace: bool,

    /// Whether the parser accepts more than one top-level JSON value in a
    /// single stream (JSON Lines / concatenated values), instead of
    /// requiring end-of-input after the first complete value.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_multiple_json_values: bool,

    /// Whether an invalid encoding sequence is replaced with U+FFFD and
    /// parsing continues, instead of failing with
    /// [`ErrorKind::InvalidEncodingSequence`](crate::ErrorKind::InvalidEncodingSequence).
    ///
    /// # Default
    ///
    /// `false`
    pub replace_invalid_encoding_sequences: bool,

    /// Whether object member names are tracked per open object so that
    /// duplicate keys fail with
    /// [`ErrorKind::DuplicateObjectMember`](crate::ErrorKind::DuplicateObjectMember).
    ///
    /// # Default
    ///
    /// `false`
    pub track_object_members: bool,

    /// The maximum output-encoded length, in bytes, of a single string
    /// value. `None` means unlimited.
    ///
    /// # Default
    ///
    /// `None`
    pub max_output_string_length: Option<usize>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            input_encoding: None,
            output_encoding: Encoding::Utf8,
            allow_bom: false,
            allow_comments: false,
            allow_trailing_commas: false,
            allow_special_numbers: false,
            allow_hex_numbers: false,
            allow_unescaped_control_characters: false,
            allow_unicode_whitespace: false,
            allow_multiple_json_values: false,
            replace_invalid_encoding_sequences: false,
            track_object_members: false,
            max_output_string_length: None,
        }
    }
}
