//! Handler registration and event payloads.
//!
//! Every event the grammar engine can raise has a dedicated `on_<event>`
//! slot; callers register a closure per event they care about. Unlike the
//! source's `void*` user-data pointer, `U` is a real type parameter the
//! parser owns, so handlers reach it as `&mut U` instead of an erased
//! pointer — there is no FFI boundary here forcing type erasure.

use alloc::boxed::Box;

use crate::{encoding::Encoding, location::Location};

/// What a handler returns to continue or abort the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerResult {
    Continue,
    Abort,
}

/// What the object-member handler returns; it additionally may flag a key
/// as a duplicate even when automatic duplicate tracking
/// ([`ParserOptions::track_object_members`](crate::ParserOptions::track_object_members))
/// is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberResult {
    Continue,
    Abort,
    TreatAsDuplicate,
}

/// One of the three special numeric literals, gated behind
/// [`ParserOptions::allow_special_numbers`](crate::ParserOptions::allow_special_numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialNumber {
    NaN,
    Infinity,
    NegInfinity,
}

/// Bitmask describing a string token's content. Cleared at the
/// start of every string token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringAttributes(pub(crate) u8);

impl StringAttributes {
    pub const NULL_CHARACTER: Self = Self(1 << 0);
    pub const CONTROL_CHARACTER: Self = Self(1 << 1);
    pub const NON_ASCII: Self = Self(1 << 2);
    pub const NON_BMP: Self = Self(1 << 3);
    pub const REPLACED_CHARACTER: Self = Self(1 << 4);

    #[must_use]
    pub fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 != 0
    }
}

/// A string-valued token (a JSON string literal or an object member name),
/// delivered in [`ParserOptions::output_encoding`](crate::ParserOptions::output_encoding).
#[derive(Debug, Clone, Copy)]
pub struct StringEvent<'a> {
    pub bytes: &'a [u8],
    pub attrs: StringAttributes,
}

/// A decimal or hex number token, both as verbatim ASCII text and as the
/// converted `f64`.
#[derive(Debug, Clone, Copy)]
pub struct NumberEvent<'a> {
    pub text: &'a [u8],
    pub value: f64,
    pub is_hex: bool,
}

/// Read-only state visible to a handler while it runs: the current token's
/// location and nesting depth. Handlers receive this instead of a `&Parser`
/// so that, structurally, there is no way for a handler to call back into
/// the parser it is borrowed from (re-entrancy is ruled out at compile time by
/// the borrow checker instead of a runtime guard flag).
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext {
    pub(crate) depth: usize,
    pub(crate) token_location: Location,
    pub(crate) input_encoding: Encoding,
}

impl HandlerContext {
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn token_location(&self) -> Location {
        self.token_location
    }

    #[must_use]
    pub fn input_encoding(&self) -> Encoding {
        self.input_encoding
    }
}

type Slot<'h, F> = Option<Box<F>>;

/// The registered event-handler set for a [`Parser`](crate::Parser).
///
/// `U` is caller-owned user data, threaded through every handler as `&mut
/// U`. Every field is optional; an event with no registered handler simply
/// fires nothing and always continues.
pub struct Handlers<'h, U> {
    pub(crate) on_null: Slot<'h, dyn FnMut(&mut U, HandlerContext) -> HandlerResult + 'h>,
    pub(crate) on_boolean:
        Slot<'h, dyn FnMut(&mut U, HandlerContext, bool) -> HandlerResult + 'h>,
    pub(crate) on_string:
        Slot<'h, dyn FnMut(&mut U, HandlerContext, StringEvent<'_>) -> HandlerResult + 'h>,
    pub(crate) on_number:
        Slot<'h, dyn FnMut(&mut U, HandlerContext, NumberEvent<'_>) -> HandlerResult + 'h>,
    pub(crate) on_raw_number:
        Slot<'h, dyn FnMut(&mut U, HandlerContext, &[u8]) -> HandlerResult + 'h>,
    pub(crate) on_special_number:
        Slot<'h, dyn FnMut(&mut U, HandlerContext, SpecialNumber) -> HandlerResult + 'h>,
    pub(crate) on_start_object: Slot<'h, dyn FnMut(&mut U, HandlerContext) -> HandlerResult + 'h>,
    pub(crate) on_end_object: Slot<'h, dyn FnMut(&mut U, HandlerContext) -> HandlerResult + 'h>,
    pub(crate) on_object_member:
        Slot<'h, dyn FnMut(&mut U, HandlerContext, StringEvent<'_>, bool) -> MemberResult + 'h>,
    pub(crate) on_start_array: Slot<'h, dyn FnMut(&mut U, HandlerContext) -> HandlerResult + 'h>,
    pub(crate) on_end_array: Slot<'h, dyn FnMut(&mut U, HandlerContext) -> HandlerResult + 'h>,
    pub(crate) on_array_item:
        Slot<'h, dyn FnMut(&mut U, HandlerContext, bool) -> HandlerResult + 'h>,
    pub(crate) on_encoding_detected: Slot<'h, dyn FnMut(&mut U, Encoding) + 'h>,
}

impl<U> Default for Handlers<'_, U> {
    fn default() -> Self {
        Self {
            on_null: None,
            on_boolean: None,
            on_string: None,
            on_number: None,
            on_raw_number: None,
            on_special_number: None,
            on_start_object: None,
            on_end_object: None,
            on_object_member: None,
            on_start_array: None,
            on_end_array: None,
            on_array_item: None,
            on_encoding_detected: None,
        }
    }
}

macro_rules! builder {
    ($setter:ident, $field:ident, $($bound:tt)+) => {
        #[must_use]
        pub fn $setter(mut self, handler: impl $($bound)+) -> Self {
            self.$field = Some(Box::new(handler));
            self
        }
    };
}

impl<'h, U> Handlers<'h, U> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    builder!(on_null, on_null, FnMut(&mut U, HandlerContext) -> HandlerResult + 'h);
    builder!(on_boolean, on_boolean, FnMut(&mut U, HandlerContext, bool) -> HandlerResult + 'h);
    builder!(on_string, on_string, FnMut(&mut U, HandlerContext, StringEvent<'_>) -> HandlerResult + 'h);
    builder!(on_number, on_number, FnMut(&mut U, HandlerContext, NumberEvent<'_>) -> HandlerResult + 'h);
    builder!(on_raw_number, on_raw_number, FnMut(&mut U, HandlerContext, &[u8]) -> HandlerResult + 'h);
    builder!(on_special_number, on_special_number, FnMut(&mut U, HandlerContext, SpecialNumber) -> HandlerResult + 'h);
    builder!(on_start_object, on_start_object, FnMut(&mut U, HandlerContext) -> HandlerResult + 'h);
    builder!(on_end_object, on_end_object, FnMut(&mut U, HandlerContext) -> HandlerResult + 'h);
    builder!(on_object_member, on_object_member, FnMut(&mut U, HandlerContext, StringEvent<'_>, bool) -> MemberResult + 'h);
    builder!(on_start_array, on_start_array, FnMut(&mut U, HandlerContext) -> HandlerResult + 'h);
    builder!(on_end_array, on_end_array, FnMut(&mut U, HandlerContext) -> HandlerResult + 'h);
    builder!(on_array_item, on_array_item, FnMut(&mut U, HandlerContext, bool) -> HandlerResult + 'h);
    builder!(on_encoding_detected, on_encoding_detected, FnMut(&mut U, Encoding) + 'h);
}
