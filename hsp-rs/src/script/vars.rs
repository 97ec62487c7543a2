//! Session variable store.
//!
//! Names are stored without the leading `#` sigil; every accessor strips it.
//! Iteration follows first-insertion order so the stats report can list the
//! oldest variables first.

use std::collections::HashMap;

use super::value::Value;

/// Insertion-ordered name → [`Value`] table.
#[derive(Debug, Default)]
pub struct VarStore {
    index: HashMap<String, usize>,
    entries: Vec<(String, Value)>,
}

fn bare(name: &str) -> &str {
    name.strip_prefix('#').unwrap_or(name)
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.  Overwriting keeps the first position.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let name = bare(name);
        let value = value.into();
        match self.index.get(name) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(name.to_owned(), self.entries.len());
                self.entries.push((name.to_owned(), value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(bare(name)).map(|&i| &self.entries[i].1)
    }

    /// Look up a variable, resolving unknown names to `0`.
    pub fn get_or_zero(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }

    /// Remove every variable.
    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }

    /// Iterate in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
