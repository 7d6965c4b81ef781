//! The closed error-kind set plus the sticky [`ParserError`]
//! the parser reports once it fail-stops.

use thiserror::Error;

use crate::location::Location;

/// Every way a parse can fail.
///
/// This is a closed set deliberately: callers match exhaustively instead of
/// string-matching a message. [`OptionsLocked`](ErrorKind::OptionsLocked) and
/// [`AlreadyFinished`](ErrorKind::AlreadyFinished) are additions beyond the
/// core grammar/encoding/token errors, covering the "setter/`parse` rejected
/// once parsing is underway or finished" rules with their own dedicated kind
/// (see `DESIGN.md`).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("out of memory")]
    OutOfMemory,
    #[error("aborted by handler")]
    AbortedByHandler,
    #[error("byte-order mark is not allowed")]
    BomNotAllowed,
    #[error("invalid encoding sequence")]
    InvalidEncodingSequence,
    #[error("unknown token")]
    UnknownToken,
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("incomplete token")]
    IncompleteToken,
    #[error("more tokens expected")]
    MoreTokensExpected,
    #[error("unescaped control character")]
    UnescapedControlCharacter,
    #[error("invalid escape sequence")]
    InvalidEscapeSequence,
    #[error("unpaired surrogate in escape sequence")]
    UnpairedSurrogateEscapeSequence,
    #[error("string exceeds the maximum output length")]
    TooLongString,
    #[error("invalid number")]
    InvalidNumber,
    #[error("number exceeds the maximum length")]
    TooLongNumber,
    #[error("duplicate object member")]
    DuplicateObjectMember,
    #[error("option cannot be changed after parsing has started")]
    OptionsLocked,
    #[error("parse() called after the parser already finished")]
    AlreadyFinished,
}

/// The sticky error a [`Parser`](crate::Parser) reports after it fail-stops.
///
/// Once set, `Parser::error()` keeps returning this value and every
/// subsequent `parse()` call fails with [`ErrorKind::AlreadyFinished`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} at {location}")]
pub struct ParserError {
    pub kind: ErrorKind,
    pub location: Location,
}

impl ParserError {
    pub(crate) fn new(kind: ErrorKind, location: Location) -> Self {
        Self { kind, location }
    }
}
