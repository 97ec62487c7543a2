//! Item pools.
//!
//! A pool statement (whitespace is insignificant) looks like
//! `(<prob>:/<item1>,<item2>,…)#<name>`.  The aggregate probability is split
//! evenly across the listed items.

// ── Pool ──────────────────────────────────────────────────────────────────────

/// A named set of items sharing one aggregate draw probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    pub name: String,
    /// Aggregate probability, as a percentage.
    pub probability: f64,
    /// Items in declaration order.  Never empty.
    pub items: Vec<String>,
    /// `probability / items.len()`.
    pub per_item: f64,
}

impl Pool {
    /// Build a pool, returning `None` when `items` is empty.
    pub fn new(name: impl Into<String>, probability: f64, items: Vec<String>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        let per_item = probability / items.len() as f64;
        Some(Self {
            name: name.into(),
            probability,
            items,
            per_item,
        })
    }
}

// ── PoolStore ─────────────────────────────────────────────────────────────────

/// Registry of defined pools, kept in definition order.
#[derive(Debug, Default)]
pub struct PoolStore {
    pools: Vec<Pool>,
}

impl PoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a pool by name.
    ///
    /// Returns `true` if a *new* pool was added, `false` if an existing one
    /// was replaced wholesale.
    pub fn upsert(&mut self, pool: Pool) -> bool {
        if let Some(slot) = self.pools.iter_mut().find(|p| p.name == pool.name) {
            *slot = pool;
            false
        } else {
            self.pools.push(pool);
            true
        }
    }

    pub fn find(&self, name: &str) -> Option<&Pool> {
        self.pools.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
