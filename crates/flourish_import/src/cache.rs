//! In-memory section memo for one import run.
//!
//! Maps a resolution key to a section id so repeated names cost one database
//! round trip per run. No eviction: the map lives for one run and its size
//! is bounded by the input file.
//!
//! Key shapes:
//! - top-level section: the section name alone
//! - subsection: `section::subsection::scope` - the parent name and scope are
//!   part of the key so equal subsection names under different parents (or
//!   surveys) never collide.

use std::collections::HashMap;

const KEY_SEPARATOR: &str = "::";

#[derive(Debug, Default)]
pub struct SectionCache {
    entries: HashMap<String, i64>,
}

impl SectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: String, id: i64) {
        self.entries.insert(key, id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key for a top-level section.
    pub fn section_key(name: &str) -> String {
        name.to_string()
    }

    /// Key for a subsection under a named parent, within a scope.
    pub fn subsection_key(section: &str, subsection: &str, scope: Option<i64>) -> String {
        match scope {
            Some(id) => format!("{section}{KEY_SEPARATOR}{subsection}{KEY_SEPARATOR}{id}"),
            None => format!("{section}{KEY_SEPARATOR}{subsection}{KEY_SEPARATOR}"),
        }
    }
}
