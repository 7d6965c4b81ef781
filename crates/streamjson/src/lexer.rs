//! The stateful lexer: turns one decoded scalar at a time, plus
//! a synthetic end-of-input marker, into terminals for the grammar engine.

use alloc::vec::Vec;

use crate::{
    encoding::Encoding,
    error::ErrorKind,
    literal::{looks_like_identifier_continuation, LiteralKind, LiteralMatcher, Step as LiteralStep},
    options::ParserOptions,
};

/// Bitmask set on the output-attributes field while lexing a string; for
/// numbers the same byte is repurposed to hold the decimal-point index
/// instead (see [`NumberPayload::decimal_point_index`]).
pub(crate) mod string_attrs {
    pub const NULL_CHARACTER: u8 = 1 << 0;
    pub const CONTROL_CHARACTER: u8 = 1 << 1;
    pub const NON_ASCII: u8 = 1 << 2;
    pub const NON_BMP: u8 = 1 << 3;
    pub const REPLACED_CHARACTER: u8 = 1 << 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Null,
    True,
    False,
    String,
    Number,
    NaN,
    Infinity,
    NegInfinity,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    Comment,
}

#[derive(Debug, Clone)]
pub(crate) struct StringPayload {
    pub(crate) bytes: Vec<u8>,
    pub(crate) attrs: u8,
}

#[derive(Debug, Clone)]
pub(crate) struct NumberPayload {
    pub(crate) text: Vec<u8>,
    pub(crate) is_hex: bool,
    pub(crate) decimal_point_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub(crate) enum TokenPayload {
    None,
    String(StringPayload),
    Number(NumberPayload),
}

/// What happened after feeding one more scalar into the lexer.
pub(crate) enum StepResult {
    /// The scalar was consumed; no token completed yet.
    Continue,
    /// A token completed. `consumed` is `false` when the scalar that
    /// triggered completion was *not* part of the token (e.g. the
    /// whitespace after a number) and must be reprocessed in idle state.
    Token {
        kind: TokenKind,
        payload: TokenPayload,
        consumed: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumState {
    AfterMinus,
    LeadingZero,
    HexPrefix,
    HexDigits,
    IntegerDigits,
    AfterDot,
    FractionDigits,
    AfterE,
    AfterExpSign,
    ExpDigits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Literal,
    Number(NumState),
    StringBody,
    StringEscape,
    /// `nibble` counts hex digits consumed so far for the in-flight escape
    /// (0..4); the in-flight escape is the low half of a surrogate pair
    /// exactly when `pending_high_surrogate` is set on the lexer.
    StringHexEscape { nibble: u8 },
    StringSurrogateBackslash,
    StringSurrogateU,
    CommentStart,
    CommentLine,
    CommentBlock,
    CommentBlockStar,
}

pub(crate) struct Lexer {
    state: State,
    literal: Option<LiteralMatcher>,
    negative: bool,
    hex_nibbles: u32,
    pending_high_surrogate: Option<u16>,
    output: Vec<u8>,
    attrs: u8,
    decimal_point_index: Option<usize>,
    is_hex_number: bool,
}

const MAX_NUMBER_LENGTH: usize = 63;

impl Lexer {
    pub(crate) fn new() -> Self {
        Self {
            state: State::Idle,
            literal: None,
            negative: false,
            hex_nibbles: 0,
            pending_high_surrogate: None,
            output: Vec::new(),
            attrs: 0,
            decimal_point_index: None,
            is_hex_number: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.state = State::Idle;
        self.literal = None;
        self.negative = false;
        self.hex_nibbles = 0;
        self.pending_high_surrogate = None;
        self.output.clear();
        self.attrs = 0;
        self.decimal_point_index = None;
        self.is_hex_number = false;
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Feeds one scalar. `c = None` is the synthetic end-of-input marker.
    /// `replaced` is true when the decoder substituted U+FFFD for an
    /// invalid sequence.
    pub(crate) fn step(
        &mut self,
        c: Option<char>,
        replaced: bool,
        options: &ParserOptions,
        byte_offset_zero: bool,
    ) -> Result<StepResult, ErrorKind> {
        let Some(c) = c else {
            return self.on_end_of_input();
        };

        match self.state {
            State::Idle => self.start_token(c, options, byte_offset_zero),
            State::Literal => self.step_literal(c),
            State::Number(sub) => self.step_number(sub, c, options),
            State::StringBody => self.step_string_body(c, replaced, options),
            State::StringEscape => self.step_string_escape(c, options),
            State::StringHexEscape { nibble } => self.step_string_hex_escape(nibble, c, options),
            State::StringSurrogateBackslash => self.step_surrogate_backslash(c),
            State::StringSurrogateU => self.step_surrogate_u(c),
            State::CommentStart => self.step_comment_start(c),
            State::CommentLine => self.step_comment_line(c),
            State::CommentBlock => self.step_comment_block(c),
            State::CommentBlockStar => self.step_comment_block_star(c),
        }
    }

    fn start_token(
        &mut self,
        c: char,
        options: &ParserOptions,
        byte_offset_zero: bool,
    ) -> Result<StepResult, ErrorKind> {
        if c == '\u{feff}' && byte_offset_zero {
            return if options.allow_bom {
                Ok(StepResult::Continue)
            } else {
                Err(ErrorKind::BomNotAllowed)
            };
        }
        if is_whitespace(c, options.allow_unicode_whitespace) {
            return Ok(StepResult::Continue);
        }
        match c {
            '{' => self.emit(TokenKind::LeftBrace, TokenPayload::None, true),
            '}' => self.emit(TokenKind::RightBrace, TokenPayload::None, true),
            '[' => self.emit(TokenKind::LeftBracket, TokenPayload::None, true),
            ']' => self.emit(TokenKind::RightBracket, TokenPayload::None, true),
            ':' => self.emit(TokenKind::Colon, TokenPayload::None, true),
            ',' => self.emit(TokenKind::Comma, TokenPayload::None, true),
            '"' => {
                self.output.clear();
                self.attrs = 0;
                self.state = State::StringBody;
                Ok(StepResult::Continue)
            }
            'n' => self.start_literal(LiteralKind::Null),
            't' => self.start_literal(LiteralKind::True),
            'f' => self.start_literal(LiteralKind::False),
            'N' if options.allow_special_numbers => self.start_literal(LiteralKind::NaN),
            'I' if options.allow_special_numbers => self.start_literal(LiteralKind::Infinity),
            '-' => {
                self.output.clear();
                self.output.push(b'-');
                self.negative = true;
                self.state = State::Number(NumState::AfterMinus);
                Ok(StepResult::Continue)
            }
            '0'..='9' => self.start_number(c, options),
            '/' if options.allow_comments => {
                self.state = State::CommentStart;
                Ok(StepResult::Continue)
            }
            _ => Err(ErrorKind::UnknownToken),
        }
    }

    fn start_literal(&mut self, kind: LiteralKind) -> Result<StepResult, ErrorKind> {
        self.literal = Some(LiteralMatcher::start(kind));
        self.state = State::Literal;
        Ok(StepResult::Continue)
    }

    fn step_literal(&mut self, c: char) -> Result<StepResult, ErrorKind> {
        let mut matcher = self.literal.take().expect("literal state implies matcher");
        match matcher.step(c) {
            LiteralStep::NeedMore => {
                self.literal = Some(matcher);
                Ok(StepResult::Continue)
            }
            LiteralStep::Done(kind) => {
                self.state = State::Idle;
                match kind {
                    LiteralKind::Null => self.emit(TokenKind::Null, TokenPayload::None, true),
                    LiteralKind::True => self.emit(TokenKind::True, TokenPayload::None, true),
                    LiteralKind::False => self.emit(TokenKind::False, TokenPayload::None, true),
                    LiteralKind::NaN => self.emit(TokenKind::NaN, TokenPayload::None, true),
                    LiteralKind::Infinity => {
                        let kind = if self.negative {
                            self.negative = false;
                            TokenKind::NegInfinity
                        } else {
                            TokenKind::Infinity
                        };
                        self.emit(kind, TokenPayload::None, true)
                    }
                }
            }
            LiteralStep::Reject => {
                if looks_like_identifier_continuation(c) {
                    Err(ErrorKind::UnknownToken)
                } else {
                    self.state = State::Idle;
                    self.literal = None;
                    Err(ErrorKind::UnknownToken)
                }
            }
        }
    }

    fn start_number(&mut self, c: char, options: &ParserOptions) -> Result<StepResult, ErrorKind> {
        if !self.negative {
            self.output.clear();
        }
        self.decimal_point_index = None;
        self.is_hex_number = false;
        self.output.push(c as u8);
        self.state = if c == '0' {
            State::Number(NumState::LeadingZero)
        } else {
            State::Number(NumState::IntegerDigits)
        };
        let _ = options;
        Ok(StepResult::Continue)
    }

    fn step_number(
        &mut self,
        sub: NumState,
        c: char,
        options: &ParserOptions,
    ) -> Result<StepResult, ErrorKind> {
        match sub {
            NumState::AfterMinus => {
                if c == 'I' && options.allow_special_numbers {
                    return self.start_literal(LiteralKind::Infinity);
                }
                if c.is_ascii_digit() {
                    return self.start_number(c, options);
                }
                Err(ErrorKind::InvalidNumber)
            }
            NumState::LeadingZero => match c {
                'x' | 'X' if options.allow_hex_numbers && !self.negative => {
                    self.is_hex_number = true;
                    self.output.push(c as u8);
                    self.state = State::Number(NumState::HexPrefix);
                    Ok(StepResult::Continue)
                }
                '.' => self.push_dot(),
                'e' | 'E' => self.push_exponent_marker(c),
                _ => self.finish_number(false),
            },
            NumState::HexPrefix => {
                if c.is_ascii_hexdigit() {
                    self.push_digit(c)?;
                    self.state = State::Number(NumState::HexDigits);
                    Ok(StepResult::Continue)
                } else {
                    Err(ErrorKind::InvalidNumber)
                }
            }
            NumState::HexDigits => {
                if c.is_ascii_hexdigit() {
                    self.push_digit(c)?;
                    Ok(StepResult::Continue)
                } else {
                    self.finish_number(false)
                }
            }
            NumState::IntegerDigits => {
                if c.is_ascii_digit() {
                    self.push_digit(c)?;
                    Ok(StepResult::Continue)
                } else if c == '.' {
                    self.push_dot()
                } else if c == 'e' || c == 'E' {
                    self.push_exponent_marker(c)
                } else {
                    self.finish_number(false)
                }
            }
            NumState::AfterDot => {
                if c.is_ascii_digit() {
                    self.push_digit(c)?;
                    self.state = State::Number(NumState::FractionDigits);
                    Ok(StepResult::Continue)
                } else {
                    Err(ErrorKind::InvalidNumber)
                }
            }
            NumState::FractionDigits => {
                if c.is_ascii_digit() {
                    self.push_digit(c)?;
                    Ok(StepResult::Continue)
                } else if c == 'e' || c == 'E' {
                    self.push_exponent_marker(c)
                } else {
                    self.finish_number(false)
                }
            }
            NumState::AfterE => {
                if c == '+' || c == '-' {
                    self.push_digit(c)?;
                    self.state = State::Number(NumState::AfterExpSign);
                    Ok(StepResult::Continue)
                } else if c.is_ascii_digit() {
                    self.push_digit(c)?;
                    self.state = State::Number(NumState::ExpDigits);
                    Ok(StepResult::Continue)
                } else {
                    Err(ErrorKind::InvalidNumber)
                }
            }
            NumState::AfterExpSign => {
                if c.is_ascii_digit() {
                    self.push_digit(c)?;
                    self.state = State::Number(NumState::ExpDigits);
                    Ok(StepResult::Continue)
                } else {
                    Err(ErrorKind::InvalidNumber)
                }
            }
            NumState::ExpDigits => {
                if c.is_ascii_digit() {
                    self.push_digit(c)?;
                    Ok(StepResult::Continue)
                } else {
                    self.finish_number(false)
                }
            }
        }
    }

    fn push_digit(&mut self, c: char) -> Result<(), ErrorKind> {
        if self.output.len() >= MAX_NUMBER_LENGTH {
            return Err(ErrorKind::TooLongNumber);
        }
        self.output.push(c as u8);
        Ok(())
    }

    fn push_dot(&mut self) -> Result<StepResult, ErrorKind> {
        self.decimal_point_index = Some(self.output.len());
        self.push_digit('.')?;
        self.state = State::Number(NumState::AfterDot);
        Ok(StepResult::Continue)
    }

    fn push_exponent_marker(&mut self, c: char) -> Result<StepResult, ErrorKind> {
        self.push_digit(c)?;
        self.state = State::Number(NumState::AfterE);
        Ok(StepResult::Continue)
    }

    fn finish_number(&mut self, is_eof: bool) -> Result<StepResult, ErrorKind> {
        if self.output.len() > MAX_NUMBER_LENGTH {
            return Err(ErrorKind::TooLongNumber);
        }
        let payload = NumberPayload {
            text: core::mem::take(&mut self.output),
            is_hex: self.is_hex_number,
            decimal_point_index: self.decimal_point_index.take(),
        };
        self.negative = false;
        self.is_hex_number = false;
        self.state = State::Idle;
        self.emit_unconsumed(TokenKind::Number, TokenPayload::Number(payload), is_eof)
    }

    fn step_string_body(
        &mut self,
        c: char,
        replaced: bool,
        options: &ParserOptions,
    ) -> Result<StepResult, ErrorKind> {
        match c {
            '"' => {
                let payload = StringPayload {
                    bytes: core::mem::take(&mut self.output),
                    attrs: self.attrs,
                };
                self.attrs = 0;
                self.state = State::Idle;
                self.emit(TokenKind::String, TokenPayload::String(payload), true)
            }
            '\\' => {
                self.state = State::StringEscape;
                Ok(StepResult::Continue)
            }
            c if (c as u32) < 0x20 && !options.allow_unescaped_control_characters => {
                Err(ErrorKind::UnescapedControlCharacter)
            }
            c => {
                self.record_output_scalar(c, replaced);
                self.write_scalar(c, options)?;
                Ok(StepResult::Continue)
            }
        }
    }

    fn step_string_escape(&mut self, c: char, options: &ParserOptions) -> Result<StepResult, ErrorKind> {
        let simple = match c {
            '"' => Some('\u{22}'),
            '\\' => Some('\u{5c}'),
            '/' => Some('\u{2f}'),
            'b' => Some('\u{8}'),
            't' => Some('\u{9}'),
            'n' => Some('\u{a}'),
            'f' => Some('\u{c}'),
            'r' => Some('\u{d}'),
            _ => None,
        };
        if let Some(resolved) = simple {
            self.record_output_scalar(resolved, false);
            self.write_scalar(resolved, options)?;
            self.state = State::StringBody;
            return Ok(StepResult::Continue);
        }
        if c == 'u' {
            self.hex_nibbles = 0;
            self.state = State::StringHexEscape { nibble: 0 };
            return Ok(StepResult::Continue);
        }
        Err(ErrorKind::InvalidEscapeSequence)
    }

    fn step_string_hex_escape(
        &mut self,
        nibble: u8,
        c: char,
        options: &ParserOptions,
    ) -> Result<StepResult, ErrorKind> {
        let digit = c
            .to_digit(16)
            .ok_or(ErrorKind::InvalidEscapeSequence)?;
        self.hex_nibbles = (self.hex_nibbles << 4) | digit;
        if nibble + 1 < 4 {
            self.state = State::StringHexEscape { nibble: nibble + 1 };
            return Ok(StepResult::Continue);
        }

        let unit = self.hex_nibbles as u16;
        self.hex_nibbles = 0;

        if let Some(high) = self.pending_high_surrogate.take() {
            if !(0xDC00..=0xDFFF).contains(&unit) {
                return Err(ErrorKind::UnpairedSurrogateEscapeSequence);
            }
            let combined =
                0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
            let ch = char::from_u32(combined).ok_or(ErrorKind::UnpairedSurrogateEscapeSequence)?;
            self.record_output_scalar(ch, false);
            self.write_scalar(ch, options)?;
            self.state = State::StringBody;
            return Ok(StepResult::Continue);
        }

        match unit {
            0xD800..=0xDBFF => {
                self.pending_high_surrogate = Some(unit);
                self.state = State::StringSurrogateBackslash;
                Ok(StepResult::Continue)
            }
            0xDC00..=0xDFFF => Err(ErrorKind::UnpairedSurrogateEscapeSequence),
            _ => {
                let ch = char::from_u32(u32::from(unit)).ok_or(ErrorKind::InvalidEscapeSequence)?;
                self.record_output_scalar(ch, false);
                self.write_scalar(ch, options)?;
                self.state = State::StringBody;
                Ok(StepResult::Continue)
            }
        }
    }

    fn step_surrogate_backslash(&mut self, c: char) -> Result<StepResult, ErrorKind> {
        if c == '\\' {
            self.state = State::StringSurrogateU;
            Ok(StepResult::Continue)
        } else {
            Err(ErrorKind::UnpairedSurrogateEscapeSequence)
        }
    }

    fn step_surrogate_u(&mut self, c: char) -> Result<StepResult, ErrorKind> {
        if c == 'u' {
            self.state = State::StringHexEscape { nibble: 0 };
            Ok(StepResult::Continue)
        } else {
            Err(ErrorKind::UnpairedSurrogateEscapeSequence)
        }
    }

    fn step_comment_start(&mut self, c: char) -> Result<StepResult, ErrorKind> {
        match c {
            '/' => {
                self.state = State::CommentLine;
                Ok(StepResult::Continue)
            }
            '*' => {
                self.state = State::CommentBlock;
                Ok(StepResult::Continue)
            }
            _ => Err(ErrorKind::UnknownToken),
        }
    }

    fn step_comment_line(&mut self, c: char) -> Result<StepResult, ErrorKind> {
        if c == '\n' || c == '\r' {
            self.state = State::Idle;
            self.emit_unconsumed(TokenKind::Comment, TokenPayload::None, false)
        } else {
            Ok(StepResult::Continue)
        }
    }

    fn step_comment_block(&mut self, c: char) -> Result<StepResult, ErrorKind> {
        if c == '*' {
            self.state = State::CommentBlockStar;
        }
        Ok(StepResult::Continue)
    }

    fn step_comment_block_star(&mut self, c: char) -> Result<StepResult, ErrorKind> {
        match c {
            '/' => {
                self.state = State::Idle;
                self.emit(TokenKind::Comment, TokenPayload::None, true)
            }
            '*' => Ok(StepResult::Continue),
            _ => {
                self.state = State::CommentBlock;
                Ok(StepResult::Continue)
            }
        }
    }

    fn on_end_of_input(&mut self) -> Result<StepResult, ErrorKind> {
        match self.state {
            State::Idle => Ok(StepResult::Continue),
            State::Number(_) => self.finish_number(true),
            State::CommentLine => {
                self.state = State::Idle;
                self.emit(TokenKind::Comment, TokenPayload::None, true)
            }
            _ => Err(ErrorKind::IncompleteToken),
        }
    }

    fn record_output_scalar(&mut self, c: char, replaced: bool) {
        let code = c as u32;
        if code == 0 {
            self.attrs |= string_attrs::NULL_CHARACTER | string_attrs::CONTROL_CHARACTER;
        } else if code < 0x20 {
            self.attrs |= string_attrs::CONTROL_CHARACTER;
        }
        if code >= 0x1_0000 {
            self.attrs |= string_attrs::NON_ASCII | string_attrs::NON_BMP;
        } else if code >= 0x80 {
            self.attrs |= string_attrs::NON_ASCII;
        }
        if replaced {
            self.attrs |= string_attrs::REPLACED_CHARACTER;
        }
    }

    fn write_scalar(&mut self, c: char, options: &ParserOptions) -> Result<(), ErrorKind> {
        self.output.try_reserve(4).map_err(|_| ErrorKind::OutOfMemory)?;
        encode_scalar(&mut self.output, options.output_encoding, c);
        if let Some(max) = options.max_output_string_length {
            if self.output.len() > max {
                return Err(ErrorKind::TooLongString);
            }
        }
        Ok(())
    }

    fn emit(
        &mut self,
        kind: TokenKind,
        payload: TokenPayload,
        consumed: bool,
    ) -> Result<StepResult, ErrorKind> {
        Ok(StepResult::Token { kind, payload, consumed })
    }

    fn emit_unconsumed(
        &mut self,
        kind: TokenKind,
        payload: TokenPayload,
        consumed: bool,
    ) -> Result<StepResult, ErrorKind> {
        Ok(StepResult::Token { kind, payload, consumed })
    }
}

fn is_whitespace(c: char, unicode: bool) -> bool {
    if unicode {
        c.is_whitespace()
    } else {
        matches!(c, ' ' | '\t' | '\n' | '\r')
    }
}

fn encode_scalar(out: &mut Vec<u8>, encoding: Encoding, c: char) {
    match encoding {
        Encoding::Utf8 | Encoding::Unknown => {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
        Encoding::Utf16Le | Encoding::Utf16Be => {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                if encoding == Encoding::Utf16Le {
                    out.extend_from_slice(&unit.to_le_bytes());
                } else {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
        }
        Encoding::Utf32Le => out.extend_from_slice(&(c as u32).to_le_bytes()),
        Encoding::Utf32Be => out.extend_from_slice(&(c as u32).to_be_bytes()),
    }
}
