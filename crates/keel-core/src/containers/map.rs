//! Ordered key-value map.
//!
//! Stores [`Pair`] values in a [`Tree`] whose policy compares only the key
//! half, so lookups accept bare keys and iteration yields entries in key
//! order.

use super::pair::Pair;
use super::policy::PairKeyPolicy;
use super::tree::{Iter, Tree};
use crate::alloc::AllocRef;

/// Ordered map from `K` to `V`.
pub struct Map<K: Ord, V> {
    tree: Tree<Pair<K, V>, PairKeyPolicy>,
}

impl<K: Ord, V> Map<K, V> {
    /// An empty map using the global allocator.
    #[must_use]
    pub fn new() -> Self {
        Self { tree: Tree::new() }
    }

    /// An empty map using the given allocator.
    #[must_use]
    pub fn new_in(alloc: AllocRef) -> Self {
        Self {
            tree: Tree::new_in(alloc),
        }
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// True when the map holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Insert an entry, overwriting the value of an existing key.
    /// Returns the displaced value when there was one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.tree
            .insert_unique(Pair::new(key, value))
            .map(|pair| pair.second)
    }

    /// Borrow the value for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.find(key).map(Pair::get_val)
    }

    /// Mutably borrow the value for `key`.
    #[must_use]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.tree.find_mut(key).map(Pair::get_val_mut)
    }

    /// Borrow the full entry for `key`.
    #[must_use]
    pub fn get_entry(&self, key: &K) -> Option<&Pair<K, V>> {
        self.tree.find(key)
    }

    /// Mutable value access, creating a default-valued entry on a miss.
    pub fn entry_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.tree
            .find_or_emplace(Pair::new(key, V::default()))
            .get_val_mut()
    }

    /// True if an entry matches `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.contains(key)
    }

    /// Remove the entry for `key`, moving its value out.
    pub fn remove_at(&mut self, key: &K) -> Option<V> {
        self.tree.remove(key).map(|pair| pair.second)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Iterate over the entries in key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, Pair<K, V>> {
        self.tree.iter()
    }

    /// Iterate over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(Pair::get_key)
    }

    /// Iterate over the values in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(Pair::get_val)
    }

    /// Verify the underlying tree invariants (test support).
    pub fn validate(&self) {
        self.tree.validate();
    }
}

impl<K: Ord, V> Default for Map<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> Clone for Map<K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K: Ord + core::fmt::Debug, V: core::fmt::Debug> core::fmt::Debug for Map<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|p| (&p.first, &p.second)))
            .finish()
    }
}

impl<K: Ord, V: PartialEq> PartialEq for Map<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.first.cmp(&b.first).is_eq() && a.second == b.second)
    }
}

impl<K: Ord, V: Eq> Eq for Map<K, V> {}

impl<K: Ord, V> Extend<(K, V)> for Map<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a Map<K, V> {
    type Item = &'a Pair<K, V>;
    type IntoIter = Iter<'a, Pair<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::Str;

    #[test]
    fn insert_overwrites_value() {
        let mut m: Map<Str, i32> = Map::new();
        assert_eq!(m.insert(Str::from("sneppy"), 1), None);
        assert_eq!(m.insert(Str::from("sneppy"), 2), Some(1));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&Str::from("sneppy")), Some(&2));
    }

    #[test]
    fn entry_or_default_creates_on_miss() {
        let mut m: Map<i32, i32> = Map::new();
        *m.entry_or_default(5) += 10;
        *m.entry_or_default(5) += 10;
        assert_eq!(m.get(&5), Some(&20));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn remove_at_moves_value_out() {
        let mut m: Map<i32, String> = Map::new();
        m.insert(1, "one".to_string());
        assert_eq!(m.remove_at(&1), Some("one".to_string()));
        assert_eq!(m.remove_at(&1), None);
        assert!(m.is_empty());
    }

    #[test]
    fn iteration_in_key_order() {
        let mut m: Map<i32, char> = Map::new();
        m.extend([(3, 'c'), (1, 'a'), (2, 'b')]);
        let keys: Vec<i32> = m.keys().copied().collect();
        assert_eq!(keys, vec![1, 2, 3]);
        let values: Vec<char> = m.values().copied().collect();
        assert_eq!(values, vec!['a', 'b', 'c']);
        m.validate();
    }

    #[test]
    fn last_insert_wins_determinism() {
        let mut m: Map<u32, u32> = Map::new();
        for round in 0..4u32 {
            for key in 0..32u32 {
                m.insert(key, key * 100 + round);
            }
        }
        assert_eq!(m.len(), 32);
        for key in 0..32u32 {
            assert_eq!(m.get(&key), Some(&(key * 100 + 3)));
        }
    }
}
