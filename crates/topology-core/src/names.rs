//! Case-insensitive environment name canonicalization
//!
//! Environments, bindings and pipelines are three independent sources that
//! may disagree on casing. A [`NameIndex`] is built once per resolution and
//! every cross-source lookup goes through it.

use indexmap::IndexMap;

/// Case-folded lookup key for an environment name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameKey(String);

impl NameKey {
    /// Fold a raw name into its lookup key
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// The folded key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Maps folded keys to the first-seen spelling of each name
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    canonical: IndexMap<NameKey, String>,
}

impl NameIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name and return its key; an existing spelling is kept
    pub fn register(&mut self, raw: &str) -> NameKey {
        let key = NameKey::new(raw);
        self.canonical
            .entry(key.clone())
            .or_insert_with(|| raw.trim().to_string());
        key
    }

    /// Canonical spelling for a key
    pub fn canonical(&self, key: &NameKey) -> Option<&str> {
        self.canonical.get(key).map(String::as_str)
    }

    /// Canonical spelling for any casing of a registered name
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        self.canonical(&NameKey::new(raw))
    }

    /// Whether a name (in any casing) is registered
    pub fn contains(&self, raw: &str) -> bool {
        self.canonical.contains_key(&NameKey::new(raw))
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}
