//! The public facade: lifecycle, option locking, handler
//! registration, and the `parse` entry point, tying the decoder, lexer, and
//! grammar engine together one byte at a time.

use alloc::vec::Vec;

use crate::{
    encoding::{Autodetector, ByteDecoder, DecodeResult, Detected, Encoding},
    error::{ErrorKind, ParserError},
    grammar::Grammar,
    handlers::Handlers,
    lexer::{Lexer, StepResult, TokenKind},
    location::{Location, LocationTracker},
    member_names::MemberNameStack,
    options::ParserOptions,
};

/// An incremental, event-driven JSON parser.
///
/// `U` is caller-owned user data, threaded through every registered handler.
/// Feed it chunks with [`Parser::parse`]; the final call should set
/// `is_final`, a zero-length slice with `is_final: true` being the canonical
/// flush.
///
/// # Examples
///
/// ```rust
/// use streamjson::{HandlerResult, Handlers, Parser, ParserOptions};
///
/// let handlers = Handlers::new().on_number(|count: &mut u32, _ctx, _n| {
///     *count += 1;
///     HandlerResult::Continue
/// });
/// let mut parser = Parser::new(ParserOptions::default(), handlers, 0u32);
/// parser.parse(b"[1,2,3]", true).unwrap();
/// assert_eq!(*parser.user_data(), 3);
/// ```
pub struct Parser<'h, U> {
    options: ParserOptions,
    handlers: Handlers<'h, U>,
    user_data: U,

    decoder: ByteDecoder,
    autodetector: Autodetector,
    encoding_resolved: bool,
    input_encoding: Encoding,

    lexer: Lexer,
    grammar: Grammar,
    members: MemberNameStack,
    location: LocationTracker,
    depth: usize,

    started: bool,
    finished: bool,
    error: Option<ParserError>,
}

impl<'h, U> Parser<'h, U> {
    #[must_use]
    pub fn new(options: ParserOptions, handlers: Handlers<'h, U>, user_data: U) -> Self {
        Self {
            options,
            handlers,
            user_data,
            decoder: ByteDecoder::new(),
            autodetector: Autodetector::new(),
            encoding_resolved: false,
            input_encoding: Encoding::Unknown,
            lexer: Lexer::new(),
            grammar: Grammar::new(),
            members: MemberNameStack::new(),
            location: LocationTracker::new(),
            depth: 0,
            started: false,
            finished: false,
            error: None,
        }
    }

    /// Clears all parse state (decoder, lexer, grammar stack, location,
    /// sticky error) while preserving options, handlers, and user data, so
    /// the instance is ready to parse a fresh document.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.autodetector = Autodetector::new();
        self.encoding_resolved = false;
        self.input_encoding = Encoding::Unknown;
        self.lexer.reset();
        self.grammar.reset();
        self.members.clear();
        self.location = LocationTracker::new();
        self.depth = 0;
        self.started = false;
        self.finished = false;
        self.error = None;
    }

    /// Replaces the option set wholesale. Fails with
    /// [`ErrorKind::OptionsLocked`] once [`Parser::started_parsing`] is
    /// `true`.
    pub fn set_options(&mut self, options: ParserOptions) -> Result<(), ParserError> {
        if self.started {
            return Err(ParserError::new(ErrorKind::OptionsLocked, self.location.current));
        }
        self.options = options;
        Ok(())
    }

    #[must_use]
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    #[must_use]
    pub fn user_data(&self) -> &U {
        &self.user_data
    }

    pub fn user_data_mut(&mut self) -> &mut U {
        &mut self.user_data
    }

    #[must_use]
    pub fn error(&self) -> Option<ParserError> {
        self.error
    }

    #[must_use]
    pub fn error_location(&self) -> Option<Location> {
        self.error.map(|e| e.location)
    }

    /// The location of the start of the most recently completed or
    /// in-progress token.
    #[must_use]
    pub fn token_location(&self) -> Location {
        self.location.token_start
    }

    #[must_use]
    pub fn input_encoding(&self) -> Encoding {
        self.input_encoding
    }

    #[must_use]
    pub fn started_parsing(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn finished_parsing(&self) -> bool {
        self.finished
    }

    /// Feeds one chunk of bytes. `is_final` signals end-of-input; a
    /// zero-length slice with `is_final: true` is the canonical flush.
    ///
    /// # Errors
    ///
    /// Returns the sticky [`ParserError`] on the first syntax or encoding
    /// error, or immediately with [`ErrorKind::AlreadyFinished`] if the
    /// parser already finished (successfully or not) on a previous call.
    pub fn parse(&mut self, bytes: &[u8], is_final: bool) -> Result<(), ParserError> {
        if self.finished {
            return Err(self
                .error
                .unwrap_or_else(|| ParserError::new(ErrorKind::AlreadyFinished, self.location.current)));
        }
        if !self.started {
            self.started = true;
            if let Some(forced) = self.options.input_encoding {
                self.input_encoding = forced;
                self.encoding_resolved = true;
            }
        }

        let result = self.parse_inner(bytes, is_final);
        match result {
            Ok(()) => {
                if is_final {
                    self.finished = true;
                }
                Ok(())
            }
            Err(kind) => {
                let location = self.location_for_error(kind);
                let error = ParserError::new(kind, location);
                self.error = Some(error);
                self.finished = true;
                Err(error)
            }
        }
    }

    fn location_for_error(&self, kind: ErrorKind) -> Location {
        match kind {
            ErrorKind::InvalidEscapeSequence | ErrorKind::UnpairedSurrogateEscapeSequence => {
                self.location.back_off(1)
            }
            _ => self.location.token_start,
        }
    }

    fn parse_inner(&mut self, bytes: &[u8], is_final: bool) -> Result<(), ErrorKind> {
        for &byte in bytes {
            self.feed_byte(byte)?;
        }
        if is_final {
            if !self.encoding_resolved {
                let resolved = self.autodetector.finish();
                self.resolve_autodetect(resolved)?;
            }
            self.feed_scalar(None, 0, false)?;
            if !self.grammar.is_empty() {
                return Err(ErrorKind::MoreTokensExpected);
            }
        }
        Ok(())
    }

    fn feed_byte(&mut self, byte: u8) -> Result<(), ErrorKind> {
        if self.encoding_resolved {
            return self.decode_and_feed(byte);
        }
        if let Some(resolved) = self.autodetector.push(byte) {
            self.resolve_autodetect(resolved)?;
        }
        Ok(())
    }

    fn resolve_autodetect(&mut self, resolved: Result<Detected, ()>) -> Result<(), ErrorKind> {
        let detected = resolved.map_err(|()| ErrorKind::InvalidEncodingSequence)?;
        if detected.bom_len > 0 && !self.options.allow_bom {
            return Err(ErrorKind::BomNotAllowed);
        }
        self.input_encoding = detected.encoding;
        self.encoding_resolved = true;

        if let Some(handler) = &mut self.handlers.on_encoding_detected {
            handler(&mut self.user_data, self.input_encoding);
        }

        let buffered: Vec<u8> = self.autodetector.buffered().to_vec();
        let start = usize::from(detected.bom_len);
        for &byte in &buffered[start..] {
            self.decode_and_feed(byte)?;
        }
        Ok(())
    }

    fn decode_and_feed(&mut self, byte: u8) -> Result<(), ErrorKind> {
        let mut pending = Some(byte);
        while let Some(b) = pending.take() {
            match self.decoder.decode_byte(self.input_encoding, b) {
                DecodeResult::Pending => {}
                DecodeResult::Complete { scalar, sequence_length } => {
                    self.feed_scalar(Some(scalar), usize::from(sequence_length), false)?;
                }
                DecodeResult::InvalidInclusive { sequence_length } => {
                    if self.options.replace_invalid_encoding_sequences {
                        self.feed_scalar(Some('\u{FFFD}'), usize::from(sequence_length), true)?;
                    } else {
                        return Err(ErrorKind::InvalidEncodingSequence);
                    }
                }
                DecodeResult::InvalidExclusive { sequence_length } => {
                    if self.options.replace_invalid_encoding_sequences {
                        self.feed_scalar(Some('\u{FFFD}'), usize::from(sequence_length), true)?;
                    } else {
                        return Err(ErrorKind::InvalidEncodingSequence);
                    }
                    pending = self.decoder.take_replay().or(Some(b));
                }
            }
        }
        Ok(())
    }

    fn feed_scalar(&mut self, c: Option<char>, encoded_len: usize, replaced: bool) -> Result<(), ErrorKind> {
        loop {
            if self.lexer.is_idle() {
                self.location.mark_token_start();
            }
            let byte_offset_zero = self.location.current.byte == 0;
            match self.lexer.step(c, replaced, &self.options, byte_offset_zero)? {
                StepResult::Continue => break,
                StepResult::Token { kind, payload, consumed } => {
                    if kind != TokenKind::Comment {
                        let token_location = self.location.token_start;
                        self.grammar.feed(
                            kind,
                            payload,
                            &mut self.handlers,
                            &mut self.user_data,
                            &mut self.members,
                            &mut self.depth,
                            token_location,
                            self.input_encoding,
                            &self.options,
                        )?;
                        if self.grammar.is_empty() && self.options.allow_multiple_json_values {
                            self.grammar.restart_for_next_value();
                        }
                    }
                    if consumed {
                        break;
                    }
                }
            }
        }
        if let Some(c) = c {
            self.location.advance(c, encoded_len);
        }
        Ok(())
    }
}
