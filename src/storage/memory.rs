use dashmap::DashMap;

/// Concurrent keyed store backing both registries.
///
/// Every method is atomic on its own; nothing spans calls. Values are handed
/// out as clones so no shard lock outlives a call.
pub struct InMemoryStore<V> {
    entries: DashMap<String, V>,
}

impl<V: Clone> InMemoryStore<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<V> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Inserts or replaces, returning the previous value.
    pub fn put(&self, id: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(id.into(), value)
    }

    pub fn remove(&self, id: &str) -> Option<V> {
        self.entries.remove(id).map(|(_, value)| value)
    }

    /// Snapshot of all values, in no particular order.
    pub fn values(&self) -> Vec<V> {
        self.entries.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Snapshot of all `(id, value)` pairs, in no particular order.
    pub fn entries(&self) -> Vec<(String, V)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values matching `predicate`, cloned out of the map.
    pub fn filter<F>(&self, mut predicate: F) -> Vec<V>
    where
        F: FnMut(&V) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Mutates one entry in place. Returns `None` when the id is absent.
    ///
    /// `f` runs under the entry's shard lock and must not call back into
    /// this store.
    pub fn update<R, F>(&self, id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut V) -> R,
    {
        self.entries.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// Mutates one entry, creating it with `default` first if needed.
    pub fn upsert_with<R, D, F>(&self, id: &str, default: D, f: F) -> R
    where
        D: FnOnce() -> V,
        F: FnOnce(&mut V) -> R,
    {
        let mut entry = self.entries.entry(id.to_string()).or_insert_with(default);
        f(entry.value_mut())
    }

    /// Creates the entry if missing. Returns true when it was created.
    pub fn ensure_with<D>(&self, id: &str, default: D) -> bool
    where
        D: FnOnce() -> V,
    {
        if self.entries.contains_key(id) {
            return false;
        }
        let mut created = false;
        self.entries.entry(id.to_string()).or_insert_with(|| {
            created = true;
            default()
        });
        created
    }

    /// Drops every entry for which `keep` returns false and reports how many
    /// were removed.
    pub fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&str, &mut V) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|id, value| keep(id, value));
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Replaces the whole content, used when loading a snapshot.
    pub fn replace_all<I>(&self, items: I)
    where
        I: IntoIterator<Item = (String, V)>,
    {
        self.entries.clear();
        for (id, value) in items {
            self.entries.insert(id, value);
        }
    }
}

impl<V: Clone> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
