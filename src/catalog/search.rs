//! Session-wide search term
//!
//! The header search box writes here; the catalog view reads it. It is passed
//! to the query engine explicitly rather than looked up from shared state.

use serde::{Deserialize, Serialize};

/// The global search term of one browsing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSearchTerm {
    term: String,
}

impl GlobalSearchTerm {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into() }
    }

    /// Returns the term exactly as it was last set.
    pub fn get(&self) -> &str {
        &self.term
    }

    pub fn set(&mut self, term: impl Into<String>) {
        self.term = term.into();
    }

    pub fn clear(&mut self) {
        self.term.clear();
    }

    /// Returns the trimmed term when it is non-empty.
    ///
    /// A whitespace-only term counts as unset and yields `None`.
    pub fn active(&self) -> Option<&str> {
        let trimmed = self.term.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
