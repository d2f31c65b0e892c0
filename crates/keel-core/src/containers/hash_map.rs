//! Unordered key-value map over the chained hash table.
//!
//! Stores [`Pair`] entries; the [`PairHashPolicy`] hashes and compares
//! only the key half, so lookups take bare keys.

use super::hash_table::{HashTable, Iter};
use super::pair::Pair;
use crate::alloc::AllocRef;
use crate::hash::{DefaultHashPolicy, HashPolicy, PairHashPolicy};

/// Unordered map from `K` to `V`.
pub struct HashMap<K, V, P = DefaultHashPolicy>
where
    P: HashPolicy<K>,
{
    table: HashTable<Pair<K, V>, PairHashPolicy<P>>,
}

impl<K, V, P: HashPolicy<K>> HashMap<K, V, P> {
    /// An empty map using the global allocator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: HashTable::new(),
        }
    }

    /// An empty map using the given allocator.
    #[must_use]
    pub fn new_in(alloc: AllocRef) -> Self {
        Self {
            table: HashTable::new_in(alloc),
        }
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when the map holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Current bucket count (diagnostic).
    #[must_use]
    pub fn num_buckets(&self) -> usize {
        self.table.num_buckets()
    }

    /// Insert an entry, overwriting the value of an existing key.
    /// Returns the displaced value when there was one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.table
            .insert_unique(Pair::new(key, value))
            .map(|pair| pair.second)
    }

    /// Borrow the value for `key`.
    #[must_use]
    pub fn get(&self, key: &P::Key) -> Option<&V> {
        self.table.find(key).map(Pair::get_val)
    }

    /// Mutably borrow the value for `key`.
    #[must_use]
    pub fn get_mut(&mut self, key: &P::Key) -> Option<&mut V> {
        self.table.find_mut(key).map(Pair::get_val_mut)
    }

    /// Mutable value access, creating a default-valued entry on a miss.
    pub fn entry_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.table
            .find_or_insert(Pair::new(key, V::default()))
            .0
            .get_val_mut()
    }

    /// True if an entry matches `key`.
    #[must_use]
    pub fn contains_key(&self, key: &P::Key) -> bool {
        self.table.contains(key)
    }

    /// Remove the entry for `key`, moving its value out.
    pub fn remove_at(&mut self, key: &P::Key) -> Option<V> {
        self.table.remove(key).map(|pair| pair.second)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Iterate over the entries in chain order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, Pair<K, V>> {
        self.table.iter()
    }

    /// Iterate over the keys in chain order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(Pair::get_key)
    }

    /// Iterate over the values in chain order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(Pair::get_val)
    }

    /// Verify the underlying table invariants (test support).
    pub fn validate(&self) {
        self.table.validate();
    }
}

impl<K, V, P: HashPolicy<K>> Default for HashMap<K, V, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, P: HashPolicy<K>> Clone for HashMap<K, V, P> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<K, V, P> core::fmt::Debug for HashMap<K, V, P>
where
    K: core::fmt::Debug,
    V: core::fmt::Debug,
    P: HashPolicy<K>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|p| (&p.first, &p.second)))
            .finish()
    }
}

impl<K, V, P: HashPolicy<K>> Extend<(K, V)> for HashMap<K, V, P> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, P: HashPolicy<K>> IntoIterator for &'a HashMap<K, V, P> {
    type Item = &'a Pair<K, V>;
    type IntoIter = Iter<'a, Pair<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
