//! Shallow structural merge of partial updates
//!
//! A patch names a subset of a value's fields. Merging produces a new value
//! equal to the original for every absent field and equal to the patch for
//! every present one. Present fields replace the old field wholesale; nested
//! structs are never merged recursively.
//!
//! `#[derive(Patch)]` generates a `<Name>Patch` struct (every field wrapped in
//! `Option`) together with the `Merge` impl:
//!
//! ```ignore
//! #[derive(Clone, Patch)]
//! struct Profile { name: String, email: Option<String> }
//!
//! let next = profile.merge(ProfilePatch {
//!     email: Some(None), // clear the email
//!     ..Default::default()
//! });
//! ```

/// Values that can be combined with a partial patch
pub trait Merge: Sized {
    /// Partial form of `Self`: each field optional.
    type Patch;

    /// Return a new value with the patch's present fields applied.
    ///
    /// `self` is left untouched.
    fn merge(&self, patch: Self::Patch) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Inner {
        a: u32,
        b: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Outer {
        name: String,
        inner: Inner,
        note: Option<String>,
    }

    #[derive(Default)]
    struct OuterPatch {
        name: Option<String>,
        inner: Option<Inner>,
        note: Option<Option<String>>,
    }

    impl Merge for Outer {
        type Patch = OuterPatch;

        fn merge(&self, patch: OuterPatch) -> Self {
            Self {
                name: patch.name.unwrap_or_else(|| self.name.clone()),
                inner: patch.inner.unwrap_or_else(|| self.inner.clone()),
                note: patch.note.unwrap_or_else(|| self.note.clone()),
            }
        }
    }

    fn sample() -> Outer {
        Outer {
            name: "before".into(),
            inner: Inner { a: 1, b: 2 },
            note: Some("kept".into()),
        }
    }

    #[test]
    fn test_absent_fields_are_kept() {
        let original = sample();
        let merged = original.merge(OuterPatch {
            name: Some("after".into()),
            ..Default::default()
        });

        assert_eq!(merged.name, "after");
        assert_eq!(merged.inner, original.inner);
        assert_eq!(merged.note, original.note);
        assert_eq!(original, sample());
    }

    #[test]
    fn test_nested_value_replaced_not_merged() {
        let merged = sample().merge(OuterPatch {
            inner: Some(Inner { a: 9, b: 0 }),
            ..Default::default()
        });
        assert_eq!(merged.inner, Inner { a: 9, b: 0 });
    }

    #[test]
    fn test_optional_field_can_be_cleared() {
        let merged = sample().merge(OuterPatch {
            note: Some(None),
            ..Default::default()
        });
        assert_eq!(merged.note, None);
    }
}
