//! The symbol-stack LL(1) grammar engine.
//!
//! A JSON production is reduced the moment its leading terminal is known:
//! the top of the stack is replaced with its right-hand side, pushed in
//! reverse order so the leftmost symbol is always on top. An ε-production
//! (an empty container, or the trailing-comma-or-close decision) replaces
//! the top with nothing and re-examines the same token against whatever is
//! now on top, without asking the lexer for another one.
//!
//! `MEMBER`/`ITEM` carry their own `is_first` flag rather than being
//! distinguished only by which non-terminal pushed them — a small
//! enrichment over the bare grammar that lets the reducer stay a single
//! exhaustive match instead of threading an extra side channel.

use alloc::vec::Vec;

use crate::{
    encoding::Encoding,
    error::ErrorKind,
    handlers::{HandlerContext, HandlerResult, Handlers, MemberResult, NumberEvent, SpecialNumber, StringAttributes, StringEvent},
    lexer::{NumberPayload, StringPayload, TokenKind, TokenPayload},
    location::Location,
    member_names::MemberNameStack,
    numeric,
    options::ParserOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonTerminal {
    Value,
    Members,
    Member(bool),
    MoreMembers,
    MembersAfterComma,
    Items,
    Item(bool),
    MoreItems,
    ItemsAfterComma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackTerminal {
    Colon,
    RightBrace,
    RightBracket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    NonTerminal(NonTerminal),
    Terminal(StackTerminal),
}

enum Reduction {
    /// The symbol was fully resolved without consuming the token; retry
    /// the same token against the new stack top.
    Continue,
    /// The token was consumed by this reduction.
    Consumed,
}

pub(crate) struct Grammar {
    stack: Vec<Symbol>,
}

impl Grammar {
    pub(crate) fn new() -> Self {
        Self { stack: alloc::vec![Symbol::NonTerminal(NonTerminal::Value)] }
    }

    pub(crate) fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(Symbol::NonTerminal(NonTerminal::Value));
    }

    /// Re-initializes the stack to parse a second top-level value, used by
    /// [`ParserOptions::allow_multiple_json_values`].
    pub(crate) fn restart_for_next_value(&mut self) {
        self.reset();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn feed<U>(
        &mut self,
        token: TokenKind,
        payload: TokenPayload,
        handlers: &mut Handlers<'_, U>,
        user_data: &mut U,
        members: &mut MemberNameStack,
        depth: &mut usize,
        token_location: Location,
        input_encoding: Encoding,
        options: &ParserOptions,
    ) -> Result<(), ErrorKind> {
        let mut payload = Some(payload);
        loop {
            let Some(top) = self.stack.pop() else {
                return Err(ErrorKind::UnexpectedToken);
            };
            let outcome = match top {
                Symbol::Terminal(expected) => {
                    self.reduce_terminal(expected, token, handlers, user_data, members, depth, token_location, input_encoding)?
                }
                Symbol::NonTerminal(nt) => self.reduce(
                    nt,
                    token,
                    &mut payload,
                    handlers,
                    user_data,
                    members,
                    depth,
                    token_location,
                    input_encoding,
                    options,
                )?,
            };
            if let Reduction::Consumed = outcome {
                return Ok(());
            }
        }
    }

    fn ctx(&self, depth: &usize, token_location: Location, input_encoding: Encoding) -> HandlerContext {
        HandlerContext { depth: *depth, token_location, input_encoding }
    }

    fn reduce_terminal<U>(
        &mut self,
        expected: StackTerminal,
        token: TokenKind,
        handlers: &mut Handlers<'_, U>,
        user_data: &mut U,
        members: &mut MemberNameStack,
        depth: &mut usize,
        token_location: Location,
        input_encoding: Encoding,
    ) -> Result<Reduction, ErrorKind> {
        let matches = match expected {
            StackTerminal::Colon => token == TokenKind::Colon,
            StackTerminal::RightBrace => token == TokenKind::RightBrace,
            StackTerminal::RightBracket => token == TokenKind::RightBracket,
        };
        if !matches {
            return Err(ErrorKind::UnexpectedToken);
        }
        match expected {
            StackTerminal::Colon => {}
            StackTerminal::RightBrace => {
                let ctx = self.ctx(depth, token_location, input_encoding);
                if let Some(handler) = &mut handlers.on_end_object {
                    if handler(user_data, ctx) == HandlerResult::Abort {
                        return Err(ErrorKind::AbortedByHandler);
                    }
                }
                *depth -= 1;
                members.pop_object();
            }
            StackTerminal::RightBracket => {
                let ctx = self.ctx(depth, token_location, input_encoding);
                if let Some(handler) = &mut handlers.on_end_array {
                    if handler(user_data, ctx) == HandlerResult::Abort {
                        return Err(ErrorKind::AbortedByHandler);
                    }
                }
                *depth -= 1;
            }
        }
        Ok(Reduction::Consumed)
    }

    #[allow(clippy::too_many_arguments, clippy::too_many_lines)]
    fn reduce<U>(
        &mut self,
        nt: NonTerminal,
        token: TokenKind,
        payload: &mut Option<TokenPayload>,
        handlers: &mut Handlers<'_, U>,
        user_data: &mut U,
        members: &mut MemberNameStack,
        depth: &mut usize,
        token_location: Location,
        input_encoding: Encoding,
        options: &ParserOptions,
    ) -> Result<Reduction, ErrorKind> {
        match nt {
            NonTerminal::Value => self.reduce_value(
                token, payload, handlers, user_data, members, depth, token_location, input_encoding,
            ),
            NonTerminal::Members => {
                if token == TokenKind::RightBrace {
                    Ok(Reduction::Continue)
                } else {
                    self.stack.push(Symbol::NonTerminal(NonTerminal::MoreMembers));
                    self.stack.push(Symbol::NonTerminal(NonTerminal::Member(true)));
                    Ok(Reduction::Continue)
                }
            }
            NonTerminal::MoreMembers => {
                if token == TokenKind::Comma {
                    self.stack.push(Symbol::NonTerminal(NonTerminal::MembersAfterComma));
                    Ok(Reduction::Consumed)
                } else if token == TokenKind::RightBrace {
                    Ok(Reduction::Continue)
                } else {
                    Err(ErrorKind::UnexpectedToken)
                }
            }
            NonTerminal::MembersAfterComma => {
                if token == TokenKind::RightBrace {
                    if options.allow_trailing_commas {
                        Ok(Reduction::Continue)
                    } else {
                        Err(ErrorKind::UnexpectedToken)
                    }
                } else {
                    self.stack.push(Symbol::NonTerminal(NonTerminal::MoreMembers));
                    self.stack.push(Symbol::NonTerminal(NonTerminal::Member(false)));
                    Ok(Reduction::Continue)
                }
            }
            NonTerminal::Member(is_first) => {
                if token != TokenKind::String {
                    return Err(ErrorKind::UnexpectedToken);
                }
                let Some(TokenPayload::String(string)) = payload.take() else {
                    return Err(ErrorKind::UnexpectedToken);
                };
                if options.track_object_members {
                    let inserted = members.try_insert(&string.bytes).map_err(|()| ErrorKind::OutOfMemory)?;
                    if !inserted {
                        return Err(ErrorKind::DuplicateObjectMember);
                    }
                }
                let ctx = self.ctx(depth, token_location, input_encoding);
                let event = StringEvent { bytes: &string.bytes, attrs: StringAttributes(string.attrs) };
                if let Some(handler) = &mut handlers.on_object_member {
                    match handler(user_data, ctx, event, is_first) {
                        MemberResult::Continue => {}
                        MemberResult::Abort => return Err(ErrorKind::AbortedByHandler),
                        MemberResult::TreatAsDuplicate => return Err(ErrorKind::DuplicateObjectMember),
                    }
                }
                self.stack.push(Symbol::NonTerminal(NonTerminal::Value));
                self.stack.push(Symbol::Terminal(StackTerminal::Colon));
                Ok(Reduction::Consumed)
            }
            NonTerminal::Items => {
                if token == TokenKind::RightBracket {
                    Ok(Reduction::Continue)
                } else {
                    self.stack.push(Symbol::NonTerminal(NonTerminal::MoreItems));
                    self.stack.push(Symbol::NonTerminal(NonTerminal::Item(true)));
                    Ok(Reduction::Continue)
                }
            }
            NonTerminal::MoreItems => {
                if token == TokenKind::Comma {
                    self.stack.push(Symbol::NonTerminal(NonTerminal::ItemsAfterComma));
                    Ok(Reduction::Consumed)
                } else if token == TokenKind::RightBracket {
                    Ok(Reduction::Continue)
                } else {
                    Err(ErrorKind::UnexpectedToken)
                }
            }
            NonTerminal::ItemsAfterComma => {
                if token == TokenKind::RightBracket {
                    if options.allow_trailing_commas {
                        Ok(Reduction::Continue)
                    } else {
                        Err(ErrorKind::UnexpectedToken)
                    }
                } else {
                    self.stack.push(Symbol::NonTerminal(NonTerminal::MoreItems));
                    self.stack.push(Symbol::NonTerminal(NonTerminal::Item(false)));
                    Ok(Reduction::Continue)
                }
            }
            NonTerminal::Item(is_first) => {
                let ctx = self.ctx(depth, token_location, input_encoding);
                if let Some(handler) = &mut handlers.on_array_item {
                    if handler(user_data, ctx, is_first) == HandlerResult::Abort {
                        return Err(ErrorKind::AbortedByHandler);
                    }
                }
                self.stack.push(Symbol::NonTerminal(NonTerminal::Value));
                Ok(Reduction::Continue)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn reduce_value<U>(
        &mut self,
        token: TokenKind,
        payload: &mut Option<TokenPayload>,
        handlers: &mut Handlers<'_, U>,
        user_data: &mut U,
        members: &mut MemberNameStack,
        depth: &mut usize,
        token_location: Location,
        input_encoding: Encoding,
    ) -> Result<Reduction, ErrorKind> {
        let ctx = self.ctx(depth, token_location, input_encoding);
        match token {
            TokenKind::Null => {
                if let Some(handler) = &mut handlers.on_null {
                    if handler(user_data, ctx) == HandlerResult::Abort {
                        return Err(ErrorKind::AbortedByHandler);
                    }
                }
                Ok(Reduction::Consumed)
            }
            TokenKind::True | TokenKind::False => {
                let value = token == TokenKind::True;
                if let Some(handler) = &mut handlers.on_boolean {
                    if handler(user_data, ctx, value) == HandlerResult::Abort {
                        return Err(ErrorKind::AbortedByHandler);
                    }
                }
                Ok(Reduction::Consumed)
            }
            TokenKind::String => {
                let Some(TokenPayload::String(string)) = payload.take() else {
                    return Err(ErrorKind::UnexpectedToken);
                };
                let event = StringEvent { bytes: &string.bytes, attrs: StringAttributes(string.attrs) };
                if let Some(handler) = &mut handlers.on_string {
                    if handler(user_data, ctx, event) == HandlerResult::Abort {
                        return Err(ErrorKind::AbortedByHandler);
                    }
                }
                Ok(Reduction::Consumed)
            }
            TokenKind::Number => {
                let Some(TokenPayload::Number(number)) = payload.take() else {
                    return Err(ErrorKind::UnexpectedToken);
                };
                self.fire_number(&number, handlers, user_data, ctx)?;
                Ok(Reduction::Consumed)
            }
            TokenKind::NaN | TokenKind::Infinity | TokenKind::NegInfinity => {
                let special = match token {
                    TokenKind::NaN => SpecialNumber::NaN,
                    TokenKind::Infinity => SpecialNumber::Infinity,
                    _ => SpecialNumber::NegInfinity,
                };
                if let Some(handler) = &mut handlers.on_special_number {
                    if handler(user_data, ctx, special) == HandlerResult::Abort {
                        return Err(ErrorKind::AbortedByHandler);
                    }
                }
                Ok(Reduction::Consumed)
            }
            TokenKind::LeftBrace => {
                if let Some(handler) = &mut handlers.on_start_object {
                    if handler(user_data, ctx) == HandlerResult::Abort {
                        return Err(ErrorKind::AbortedByHandler);
                    }
                }
                *depth += 1;
                members.push_object();
                self.stack.push(Symbol::Terminal(StackTerminal::RightBrace));
                self.stack.push(Symbol::NonTerminal(NonTerminal::Members));
                Ok(Reduction::Consumed)
            }
            TokenKind::LeftBracket => {
                if let Some(handler) = &mut handlers.on_start_array {
                    if handler(user_data, ctx) == HandlerResult::Abort {
                        return Err(ErrorKind::AbortedByHandler);
                    }
                }
                *depth += 1;
                self.stack.push(Symbol::Terminal(StackTerminal::RightBracket));
                self.stack.push(Symbol::NonTerminal(NonTerminal::Items));
                Ok(Reduction::Consumed)
            }
            _ => Err(ErrorKind::UnexpectedToken),
        }
    }

    fn fire_number<U>(
        &mut self,
        number: &NumberPayload,
        handlers: &mut Handlers<'_, U>,
        user_data: &mut U,
        ctx: HandlerContext,
    ) -> Result<(), ErrorKind> {
        if let Some(handler) = &mut handlers.on_raw_number {
            if handler(user_data, ctx, &number.text) == HandlerResult::Abort {
                return Err(ErrorKind::AbortedByHandler);
            }
        }
        if handlers.on_number.is_some() {
            // The lexer only ever writes ASCII bytes into a number token's buffer.
            let text = core::str::from_utf8(&number.text).map_err(|_| ErrorKind::InvalidNumber)?;
            let value = if number.is_hex {
                let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
                numeric::parse_hex(digits)
            } else {
                numeric::parse_decimal(text)
            }
            .ok_or(ErrorKind::InvalidNumber)?;
            if let Some(handler) = &mut handlers.on_number {
                let event = NumberEvent { text: &number.text, value, is_hex: number.is_hex };
                if handler(user_data, ctx, event) == HandlerResult::Abort {
                    return Err(ErrorKind::AbortedByHandler);
                }
            }
        }
        Ok(())
    }
}
