//! Byte-range patching.
//!
//! A patch is a half-open `[start, end)` byte range paired with a
//! replacement string. Half-open ranges are the convention everywhere in
//! this crate (tokens, CST nodes, patches). Overlaps are rejected when the
//! set is built, not when it is applied; application happens in descending
//! start order so earlier ranges stay valid.

use std::ops::Range;

use derive_more::derive::{Display, Error};

/// Patch construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum Error {
    /// Two patches overlap.
    #[display("overlapping patches at {first:?} and {second:?}")]
    Overlap {
        /// The earlier range.
        first: Range<usize>,
        /// The conflicting range.
        second: Range<usize>,
    },

    /// A patch range ends before it starts or reaches past the source.
    #[display("patch range {range:?} is invalid for a source of {len} bytes")]
    OutOfBounds {
        /// The offending range.
        range: Range<usize>,
        /// Source length.
        len: usize,
    },
}

/// One byte-range replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Replaced byte range, half-open.
    pub range: Range<usize>,
    /// Replacement text.
    pub replacement: String,
}

impl Patch {
    /// Creates a patch replacing `range` with `replacement`.
    pub fn new(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }
}

/// A validated, ordered set of non-overlapping patches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a patch, rejecting inverted ranges and overlaps.
    pub fn push(&mut self, patch: Patch) -> Result<(), Error> {
        if patch.range.start > patch.range.end {
            return Err(Error::OutOfBounds {
                range: patch.range,
                len: usize::MAX,
            });
        }

        for existing in &self.patches {
            let disjoint = patch.range.end <= existing.range.start
                || existing.range.end <= patch.range.start;
            if !disjoint {
                return Err(Error::Overlap {
                    first: existing.range.clone(),
                    second: patch.range,
                });
            }
        }

        self.patches.push(patch);
        Ok(())
    }

    /// Number of patches in the set.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Returns `true` when no patches were added.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// The patches, in insertion order.
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Applies the set to `source`.
    ///
    /// Patches are applied in descending start order. Bytes outside every
    /// range appear verbatim; an empty set returns the input byte-exact.
    pub fn apply(&self, source: &str) -> Result<String, Error> {
        for patch in &self.patches {
            if patch.range.end > source.len() {
                return Err(Error::OutOfBounds {
                    range: patch.range.clone(),
                    len: source.len(),
                });
            }
        }

        let mut sorted: Vec<&Patch> = self.patches.iter().collect();
        sorted.sort_by(|a, b| b.range.start.cmp(&a.range.start));

        let mut result = source.to_owned();
        for patch in sorted {
            result.replace_range(patch.range.clone(), &patch.replacement);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_set_is_identity() {
        let source = "int a;\nint b;\n";
        assert_eq!(PatchSet::new().apply(source).unwrap(), source);
    }

    #[test]
    fn patches_apply_in_descending_order() {
        let source = "aaa bbb ccc";
        let mut set = PatchSet::new();
        set.push(Patch::new(0..3, "xxxx")).unwrap();
        set.push(Patch::new(8..11, "y")).unwrap();

        assert_eq!(set.apply(source).unwrap(), "xxxx bbb y");
    }

    #[test]
    fn bytes_outside_ranges_are_untouched() {
        let source = "prefix MIDDLE suffix";
        let mut set = PatchSet::new();
        set.push(Patch::new(7..13, "mid")).unwrap();

        let patched = set.apply(source).unwrap();
        assert!(patched.starts_with("prefix "));
        assert!(patched.ends_with(" suffix"));
    }

    #[test]
    fn overlap_is_rejected_at_construction() {
        let mut set = PatchSet::new();
        set.push(Patch::new(0..5, "")).unwrap();

        assert_matches!(
            set.push(Patch::new(4..8, "")),
            Err(Error::Overlap { .. })
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn touching_ranges_are_not_overlapping() {
        let mut set = PatchSet::new();
        set.push(Patch::new(0..5, "a")).unwrap();
        set.push(Patch::new(5..9, "b")).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empty_insertion_ranges_are_allowed() {
        let source = "ab";
        let mut set = PatchSet::new();
        set.push(Patch::new(1..1, "X")).unwrap();
        assert_eq!(set.apply(source).unwrap(), "aXb");
    }

    #[test]
    fn out_of_bounds_is_reported_at_apply() {
        let mut set = PatchSet::new();
        set.push(Patch::new(0..100, "")).unwrap();

        assert_matches!(set.apply("short"), Err(Error::OutOfBounds { len: 5, .. }));
    }
}
