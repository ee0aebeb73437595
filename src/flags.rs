//! Query flags controlling source selection (spec §6).
//!
//! The spec describes these as a bitmask, but the source-order field isn't
//! independent bits (the three values are mutually exclusive) and
//! `INCLUDE_COMMIT` carries a commit id. A small config struct expresses the
//! same contract without a packed integer pretending to hold a string.

/// Which storage backend(s) to consult for each directory's attribute file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceOrder {
    /// Working-tree file, then index blob. The default.
    #[default]
    FileThenIndex,
    /// Index blob, then working-tree file.
    IndexThenFile,
    /// Index blob only; the working-tree file is never consulted.
    IndexOnly,
}

/// Flags accepted by [`crate::get`], [`crate::get_many`], and [`crate::foreach`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Flags {
    source_order: SourceOrder,
    no_system: bool,
    include_head: bool,
    include_commit: Option<String>,
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source_order(mut self, order: SourceOrder) -> Self {
        self.source_order = order;
        self
    }

    #[must_use]
    pub fn with_no_system(mut self, no_system: bool) -> Self {
        self.no_system = no_system;
        self
    }

    #[must_use]
    pub fn with_include_head(mut self, include_head: bool) -> Self {
        self.include_head = include_head;
        self
    }

    #[must_use]
    pub fn with_include_commit(mut self, commit: impl Into<String>) -> Self {
        self.include_commit = Some(commit.into());
        self
    }

    pub fn source_order(&self) -> SourceOrder {
        self.source_order
    }

    pub fn no_system(&self) -> bool {
        self.no_system
    }

    pub fn include_head(&self) -> bool {
        self.include_head
    }

    pub fn include_commit(&self) -> Option<&str> {
        self.include_commit.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let flags = Flags::new();
        assert_eq!(flags.source_order(), SourceOrder::FileThenIndex);
        assert!(!flags.no_system());
        assert!(!flags.include_head());
        assert!(flags.include_commit().is_none());
    }

    #[test]
    fn builder_methods_compose() {
        let flags = Flags::new()
            .with_source_order(SourceOrder::IndexOnly)
            .with_no_system(true)
            .with_include_head(true);
        assert_eq!(flags.source_order(), SourceOrder::IndexOnly);
        assert!(flags.no_system());
        assert!(flags.include_head());
    }
}
