//! A single parsed line: a [`Pattern`] paired with the assignments it grants
//! when matched (spec §3/§4.2).

use crate::pattern::Pattern;
use crate::value::{find_assignment, sort_and_dedup_assignments, Assignment, AttributeValue};

/// One non-comment, non-macro line of an attribute file.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Pattern,
    assignments: Vec<Assignment>,
}

impl Rule {
    /// `assignments` need not be pre-sorted; duplicates on the same line
    /// resolve last-wins (spec §4.2).
    pub fn new(pattern: Pattern, assignments: Vec<Assignment>) -> Self {
        Self {
            pattern,
            assignments: sort_and_dedup_assignments(assignments),
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Value this rule grants for `name`, given it already matched. A
    /// negated pattern grants nothing for any name (spec §4.5); an
    /// unmentioned name is `Unspecified`.
    pub fn value_for(&self, name: &str) -> AttributeValue {
        if self.pattern.is_negated() {
            return AttributeValue::Unspecified;
        }
        find_assignment(&self.assignments, name)
            .map_or(AttributeValue::Unspecified, |a| a.value.clone())
    }
}
