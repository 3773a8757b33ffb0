use indexmap::IndexMap;

/// Whether the bag has been loaded from the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialization {
    Unmaterialized,
    Materialized,
}

impl Materialization {
    /// an unsaved resource has nothing remote to load
    pub fn initial(is_new: bool) -> Self {
        if is_new {
            Materialization::Materialized
        } else {
            Materialization::Unmaterialized
        }
    }

    pub fn is_materialized(&self) -> bool {
        *self == Materialization::Materialized
    }

    /// one way, nothing ever goes back to Unmaterialized
    pub fn settle(&mut self) {
        *self = Materialization::Materialized;
    }
}

/// Per-key references queued for deletion, each with the key it addresses.
#[derive(Debug, Clone, Default)]
pub struct PendingDeletes {
    queued: IndexMap<String, String>,
}

impl PendingDeletes {
    pub fn queue(&mut self, reference: String, key: &str) {
        self.queued.insert(reference, key.to_string());
    }

    /// the key addressed by `reference`, if it was queued
    pub fn unqueue(&mut self, reference: &str) -> Option<String> {
        self.queued.shift_remove(reference)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.queued.contains_key(reference)
    }

    /// snapshot in queue order
    pub fn references(&self) -> Vec<String> {
        self.queued.keys().cloned().collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.queued.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn clear(&mut self) {
        self.queued.clear();
    }
}
