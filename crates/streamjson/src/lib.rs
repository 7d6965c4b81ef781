//! A streaming, event-driven JSON parser.
//!
//! Feed it bytes in arbitrarily small chunks — the cut can fall anywhere,
//! including in the middle of a multi-byte encoding sequence or a surrogate
//! pair — and it invokes the handlers registered on [`Handlers`] as each
//! value, string, number, or container boundary completes. There is no
//! intermediate value tree: callers that want one build it themselves from
//! the event stream.
//!
//! ```rust
//! use streamjson::{HandlerResult, Handlers, Parser, ParserOptions};
//!
//! let handlers = Handlers::new().on_string(|seen: &mut Vec<String>, _ctx, s| {
//!     seen.push(String::from_utf8_lossy(s.bytes).into_owned());
//!     HandlerResult::Continue
//! });
//! let mut parser = Parser::new(ParserOptions::default(), handlers, Vec::new());
//! parser.parse(br#"["a","b"]"#, true).unwrap();
//! assert_eq!(parser.user_data(), &["a".to_string(), "b".to_string()]);
//! ```

#![no_std]
#![allow(missing_docs)]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod encoding;
mod error;
mod grammar;
mod handlers;
mod lexer;
mod literal;
mod location;
mod member_names;
mod numeric;
mod options;
mod parser;

#[cfg(test)]
mod tests;

pub use encoding::Encoding;
pub use error::{ErrorKind, ParserError};
pub use handlers::{
    HandlerContext, HandlerResult, Handlers, MemberResult, NumberEvent, SpecialNumber,
    StringAttributes, StringEvent,
};
pub use location::Location;
pub use options::ParserOptions;
pub use parser::Parser;
