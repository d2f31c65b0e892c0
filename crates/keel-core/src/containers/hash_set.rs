//! Unordered set over the chained hash table.
//!
//! Same algebraic surface as the ordered [`Set`](super::Set), but
//! element-wise: the backing table has no global order, so the algebra
//! walks one side and probes the other.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use super::hash_table::{HashTable, Iter};
use crate::alloc::AllocRef;
use crate::hash::{DefaultHashPolicy, HashPolicy};

/// Unordered set of unique values.
pub struct HashSet<T, P: HashPolicy<T> = DefaultHashPolicy> {
    table: HashTable<T, P>,
}

impl<T, P: HashPolicy<T>> HashSet<T, P> {
    /// An empty set using the global allocator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: HashTable::new(),
        }
    }

    /// An empty set using the given allocator.
    #[must_use]
    pub fn new_in(alloc: AllocRef) -> Self {
        Self {
            table: HashTable::new_in(alloc),
        }
    }

    /// Number of values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when the set holds no values.
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

    /// Insert `value`; returns false when a duplicate was already present
    /// (the existing value is kept).
    pub fn insert(&mut self, value: T) -> bool {
        self.table.find_or_insert(value).1
    }

    /// Borrow the value matching `key`.
    #[must_use]
    pub fn get(&self, key: &P::Key) -> Option<&T> {
        self.table.find(key)
    }

    /// True if a value matches `key`.
    #[must_use]
    pub fn contains(&self, key: &P::Key) -> bool {
        self.table.contains(key)
    }

    /// Remove the value matching `key`, returning it.
    pub fn remove(&mut self, key: &P::Key) -> Option<T> {
        self.table.remove(key)
    }

    /// Remove the value matching `key`, reporting whether it existed and
    /// moving it into `out`.
    pub fn remove_at(&mut self, key: &P::Key, out: &mut T) -> bool {
        match self.table.remove(key) {
            Some(value) => {
                *out = value;
                true
            }
            None => false,
        }
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Iterate in chain order (unspecified but stable between mutations).
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        self.table.iter()
    }

    /// Verify the underlying table invariants (test support).
    pub fn validate(&self) {
        self.table.validate();
    }

    /// Keep every value of `other` too (union).
    pub fn union_with(&mut self, other: &Self)
    where
        T: Clone,
    {
        for value in other.iter() {
            if !self.contains(P::key_of(value)) {
                self.insert(value.clone());
            }
        }
    }

    /// Keep only values whose keys also occur in `other` (intersection).
    pub fn intersect_with(&mut self, other: &Self)
    where
        T: Clone,
    {
        // The chain cannot be walked while removing from it; collect the
        // survivors instead and rebuild.
        let mut kept = Self::new_in(self.table.allocator());
        for value in self.iter() {
            if other.contains(P::key_of(value)) {
                kept.insert(value.clone());
            }
        }
        *self = kept;
    }

    /// Remove every value whose key occurs in `other` (difference).
    pub fn difference_with(&mut self, other: &Self) {
        for value in other.iter() {
            self.remove(P::key_of(value));
        }
    }

    /// Keep values occurring in exactly one of the two sets (symmetric
    /// difference).
    pub fn symmetric_difference_with(&mut self, other: &Self)
    where
        T: Clone,
    {
        for value in other.iter() {
            let key = P::key_of(value);
            if self.remove(key).is_none() {
                self.insert(value.clone());
            }
        }
    }

    /// True when every value of `self` occurs in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.iter().all(|v| other.contains(P::key_of(v)))
    }

    /// True when every value of `other` occurs in `self`.
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// True when the two sets share no value. Independent predicate, not
    /// derivable from the subset ordering.
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().all(|v| !large.contains(P::key_of(v)))
    }
}

impl<T, P: HashPolicy<T>> Default for HashSet<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, P: HashPolicy<T>> Clone for HashSet<T, P> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<T: core::fmt::Debug, P: HashPolicy<T>> core::fmt::Debug for HashSet<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, P: HashPolicy<T>> PartialEq for HashSet<T, P> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl<T, P: HashPolicy<T>> Eq for HashSet<T, P> {}

/// Subset ordering: `Less` means proper subset; incomparable sets return
/// `None`.
impl<T, P: HashPolicy<T>> PartialOrd for HashSet<T, P> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        use core::cmp::Ordering;
        match (self.is_subset(other), other.is_subset(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl<T, P: HashPolicy<T>> Extend<T> for HashSet<T, P> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, P: HashPolicy<T>> IntoIterator for &'a HashSet<T, P> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone, P: HashPolicy<T>> BitOrAssign<&HashSet<T, P>> for HashSet<T, P> {
    fn bitor_assign(&mut self, other: &HashSet<T, P>) {
        self.union_with(other);
    }
}

impl<T: Clone, P: HashPolicy<T>> BitAndAssign<&HashSet<T, P>> for HashSet<T, P> {
    fn bitand_assign(&mut self, other: &HashSet<T, P>) {
        self.intersect_with(other);
    }
}

impl<T, P: HashPolicy<T>> SubAssign<&HashSet<T, P>> for HashSet<T, P> {
    fn sub_assign(&mut self, other: &HashSet<T, P>) {
        self.difference_with(other);
    }
}

impl<T: Clone, P: HashPolicy<T>> BitXorAssign<&HashSet<T, P>> for HashSet<T, P> {
    fn bitxor_assign(&mut self, other: &HashSet<T, P>) {
        self.symmetric_difference_with(other);
    }
}

impl<T: Clone, P: HashPolicy<T>> BitOr for &HashSet<T, P> {
    type Output = HashSet<T, P>;

    fn bitor(self, other: Self) -> HashSet<T, P> {
        let mut out = self.clone();
        out.union_with(other);
        out
    }
}

impl<T: Clone, P: HashPolicy<T>> BitAnd for &HashSet<T, P> {
    type Output = HashSet<T, P>;

    fn bitand(self, other: Self) -> HashSet<T, P> {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }
}

impl<T: Clone, P: HashPolicy<T>> Sub for &HashSet<T, P> {
    type Output = HashSet<T, P>;

    fn sub(self, other: Self) -> HashSet<T, P> {
        let mut out = self.clone();
        out.difference_with(other);
        out
    }
}

impl<T: Clone, P: HashPolicy<T>> BitXor for &HashSet<T, P> {
    type Output = HashSet<T, P>;

    fn bitxor(self, other: Self) -> HashSet<T, P> {
        let mut out = self.clone();
        out.symmetric_difference_with(other);
        out
    }
}
