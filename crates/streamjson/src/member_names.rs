//! Per-object duplicate-member-name tracking.
//!
//! A `Vec<Vec<BString>>` stack holds one list of previously seen names per
//! open object: pushing/popping an entry on container open/close is exactly
//! pushing/popping the outer `Vec`. Duplicate detection never needs to scale
//! past what a handful of sibling members make reasonable, so a linear scan
//! per insert is fine and avoids pulling in a hashing dependency.

use alloc::vec::Vec;

use bstr::BString;

#[derive(Debug, Default)]
pub(crate) struct MemberNameStack {
    objects: Vec<Vec<BString>>,
}

impl MemberNameStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_object(&mut self) {
        self.objects.push(Vec::new());
    }

    pub(crate) fn pop_object(&mut self) {
        self.objects.pop();
    }

    /// Records `name` as seen in the innermost open object, returning
    /// `false` if it was already present (a duplicate key).
    pub(crate) fn try_insert(&mut self, name: &[u8]) -> Result<bool, ()> {
        let Some(names) = self.objects.last_mut() else {
            return Ok(true);
        };
        if names.iter().any(|seen| seen.as_slice() == name) {
            return Ok(false);
        }
        names.try_reserve(1).map_err(|_| ())?;
        names.push(BString::from(name));
        Ok(true)
    }

    pub(crate) fn clear(&mut self) {
        self.objects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_within_same_object() {
        let mut stack = MemberNameStack::new();
        stack.push_object();
        assert_eq!(stack.try_insert(b"a"), Ok(true));
        assert_eq!(stack.try_insert(b"a"), Ok(false));
    }

    #[test]
    fn nested_objects_have_independent_namespaces() {
        let mut stack = MemberNameStack::new();
        stack.push_object();
        assert_eq!(stack.try_insert(b"a"), Ok(true));
        stack.push_object();
        assert_eq!(stack.try_insert(b"a"), Ok(true));
        stack.pop_object();
        assert_eq!(stack.try_insert(b"a"), Ok(false));
    }
}
