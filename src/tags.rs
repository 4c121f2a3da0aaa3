//! Named points in time used as symbolic query bounds.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Map from tag name to the time it was set.
#[derive(Debug, Default, Clone)]
pub struct TagStore {
    tags: BTreeMap<String, DateTime<Utc>>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `time`, overwriting an earlier tag with the same name.
    pub fn set(&mut self, name: impl Into<String>, time: DateTime<Utc>) {
        self.tags.insert(name.into(), time);
    }

    pub fn get(&self, name: &str) -> Option<DateTime<Utc>> {
        self.tags.get(name).copied()
    }

    pub fn all(&self) -> BTreeMap<String, DateTime<Utc>> {
        self.tags.clone()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// One side of a query window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimeBound {
    #[default]
    Unbounded,
    At(DateTime<Utc>),
    Tag(String),
}
