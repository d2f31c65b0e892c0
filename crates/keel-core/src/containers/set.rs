//! Ordered set with algebraic operations.
//!
//! Backed by [`Tree`] with unique keys. The mutating algebra
//! (union/intersection/difference/symmetric difference) has operator
//! forms that build fresh sets; containment predicates
//! (subset/superset/equality/disjointness) are single merge walks over
//! both in-order chains, never pair-wise lookups.

use core::cmp::Ordering;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use super::policy::{TreePolicy, ValuePolicy};
use super::tree::{Iter, Tree};
use crate::alloc::AllocRef;

/// Ordered set of unique values.
pub struct Set<T, P: TreePolicy<T> = ValuePolicy> {
    tree: Tree<T, P>,
}

impl<T, P: TreePolicy<T>> Set<T, P> {
    /// An empty set using the global allocator.
    #[must_use]
    pub fn new() -> Self {
        Self { tree: Tree::new() }
    }

    /// An empty set using the given allocator.
    #[must_use]
    pub fn new_in(alloc: AllocRef) -> Self {
        Self {
            tree: Tree::new_in(alloc),
        }
    }

    /// Number of values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// True when the set holds no values.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Insert `value`; returns false when its key was already present
    /// (the existing value is kept).
    pub fn insert(&mut self, value: T) -> bool {
        let before = self.tree.len();
        self.tree.find_or_emplace(value);
        self.tree.len() > before
    }

    /// Remove the value matching `key`, returning it.
    pub fn remove(&mut self, key: &P::Key) -> Option<T> {
        self.tree.remove(key)
    }

    /// Borrow the value matching `key`.
    #[must_use]
    pub fn get(&self, key: &P::Key) -> Option<&T> {
        self.tree.find(key)
    }

    /// True if a value matches `key`.
    #[must_use]
    pub fn contains(&self, key: &P::Key) -> bool {
        self.tree.contains(key)
    }

    /// Borrow the smallest value.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.tree.first()
    }

    /// Borrow the largest value.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.tree.last()
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Iterate in ascending order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        self.tree.iter()
    }

    /// Iterate starting at the first value not ordered before `key`.
    #[must_use]
    pub fn iter_from(&self, key: &P::Key) -> Iter<'_, T> {
        self.tree.iter_from(key)
    }

    /// Iterate starting past the last value not ordered after `key`.
    #[must_use]
    pub fn iter_after(&self, key: &P::Key) -> Iter<'_, T> {
        self.tree.iter_after(key)
    }

    /// Verify the underlying tree invariants (test support).
    pub fn validate(&self) {
        self.tree.validate();
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
    pub fn intersect_with(&mut self, other: &Self) {
        let mut other_it = other.iter().peekable();
        let mut cur = self.tree.cursor_front_mut();
        loop {
            let keep = {
                let Some(value) = cur.value() else { break };
                let key = P::key_of(value);
                // Advance the other chain to the first key not below ours.
                while let Some(o) = other_it.peek() {
                    if P::cmp_keys(P::key_of(o), key) == Ordering::Less {
                        other_it.next();
                    } else {
                        break;
                    }
                }
                matches!(
                    other_it.peek(),
                    Some(o) if P::cmp_keys(P::key_of(o), key) == Ordering::Equal
                )
            };
            if keep {
                cur.move_next();
            } else {
                cur.remove_current();
            }
        }
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

    /// Merge-walk comparison of the two key chains.
    ///
    /// Returns `(only_self, only_other)` counts.
    fn merge_counts(&self, other: &Self) -> (usize, usize) {
        let mut a = self.iter().peekable();
        let mut b = other.iter().peekable();
        let mut only_a = 0;
        let mut only_b = 0;
        loop {
            match (a.peek(), b.peek()) {
                (None, None) => return (only_a, only_b),
                (Some(_), None) => {
                    only_a += 1;
                    a.next();
                }
                (None, Some(_)) => {
                    only_b += 1;
                    b.next();
                }
                (Some(x), Some(y)) => match P::cmp_keys(P::key_of(x), P::key_of(y)) {
                    Ordering::Less => {
                        only_a += 1;
                        a.next();
                    }
                    Ordering::Greater => {
                        only_b += 1;
                        b.next();
                    }
                    Ordering::Equal => {
                        a.next();
                        b.next();
                    }
                },
            }
        }
    }

    /// True when every key of `self` occurs in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.merge_counts(other).0 == 0
    }

    /// True when every key of `other` occurs in `self`.
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        self.merge_counts(other).1 == 0
    }

    /// True when the two sets share no key. Independent predicate, not
    /// derivable from the subset ordering.
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (only_a, only_b) = self.merge_counts(other);
        only_a == self.len() && only_b == other.len()
    }
}

impl<T, P: TreePolicy<T>> Default for Set<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, P: TreePolicy<T>> Clone for Set<T, P> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<T: core::fmt::Debug, P: TreePolicy<T>> core::fmt::Debug for Set<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, P: TreePolicy<T>> PartialEq for Set<T, P> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.merge_counts(other) == (0, 0)
    }
}

impl<T, P: TreePolicy<T>> Eq for Set<T, P> {}

/// Subset ordering: `Less` means proper subset. Incomparable sets return
/// `None`, which is what makes this a partial order.
impl<T, P: TreePolicy<T>> PartialOrd for Set<T, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.merge_counts(other) {
            (0, 0) => Some(Ordering::Equal),
            (0, _) => Some(Ordering::Less),
            (_, 0) => Some(Ordering::Greater),
            _ => None,
        }
    }
}

impl<T, P: TreePolicy<T>> Extend<T> for Set<T, P> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, P: TreePolicy<T>> IntoIterator for &'a Set<T, P> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone, P: TreePolicy<T>> BitOrAssign<&Set<T, P>> for Set<T, P> {
    fn bitor_assign(&mut self, other: &Set<T, P>) {
        self.union_with(other);
    }
}

impl<T, P: TreePolicy<T>> BitAndAssign<&Set<T, P>> for Set<T, P> {
    fn bitand_assign(&mut self, other: &Set<T, P>) {
        self.intersect_with(other);
    }
}

impl<T, P: TreePolicy<T>> SubAssign<&Set<T, P>> for Set<T, P> {
    fn sub_assign(&mut self, other: &Set<T, P>) {
        self.difference_with(other);
    }
}

impl<T: Clone, P: TreePolicy<T>> BitXorAssign<&Set<T, P>> for Set<T, P> {
    fn bitxor_assign(&mut self, other: &Set<T, P>) {
        self.symmetric_difference_with(other);
    }
}

impl<T: Clone, P: TreePolicy<T>> BitOr for &Set<T, P> {
    type Output = Set<T, P>;

    fn bitor(self, other: Self) -> Set<T, P> {
        let mut out = self.clone();
        out.union_with(other);
        out
    }
}

impl<T: Clone, P: TreePolicy<T>> BitAnd for &Set<T, P> {
    type Output = Set<T, P>;

    fn bitand(self, other: Self) -> Set<T, P> {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }
}

impl<T: Clone, P: TreePolicy<T>> Sub for &Set<T, P> {
    type Output = Set<T, P>;

    fn sub(self, other: Self) -> Set<T, P> {
        let mut out = self.clone();
        out.difference_with(other);
        out
    }
}

impl<T: Clone, P: TreePolicy<T>> BitXor for &Set<T, P> {
    type Output = Set<T, P>;

    fn bitxor(self, other: Self) -> Set<T, P> {
        let mut out = self.clone();
        out.symmetric_difference_with(other);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(values: &[i32]) -> Set<i32> {
        let mut s = Set::new();
        for &v in values {
            s.insert(v);
        }
        s
    }

    #[test]
    fn insert_is_unique() {
        let mut s: Set<i32> = Set::new();
        assert!(s.insert(3));
        assert!(!s.insert(3));
        assert_eq!(s.len(), 1);
        assert!(s.contains(&3));
        assert!(!s.contains(&4));
    }

    #[test]
    fn iteration_is_sorted_deduplicated() {
        let s = set_of(&[5, 2, 9, 2, 5, 1]);
        let got: Vec<i32> = s.iter().copied().collect();
        assert_eq!(got, vec![1, 2, 5, 9]);
    }

    #[test]
    fn algebra_seed_case() {
        let a = set_of(&[1, 3, 10]);
        let b = set_of(&[0, 2, 3, 9]);

        let union: Vec<i32> = (&a | &b).iter().copied().collect();
        assert_eq!(union, vec![0, 1, 2, 3, 9, 10]);

        let inter: Vec<i32> = (&a & &b).iter().copied().collect();
        assert_eq!(inter, vec![3]);

        let sym: Vec<i32> = (&a ^ &b).iter().copied().collect();
        assert_eq!(sym, vec![0, 1, 2, 9, 10]);

        let diff: Vec<i32> = (&a - &b).iter().copied().collect();
        assert_eq!(diff, vec![1, 10]);
    }

    #[test]
    fn algebra_identities() {
        let a = set_of(&[1, 2, 3, 4, 8]);
        let b = set_of(&[3, 4, 5, 6]);

        let lhs = &(&a | &b) - &(&a & &b);
        let rhs = &a ^ &b;
        assert_eq!(lhs, rhs);

        let d = &(&a ^ &b) & &a;
        assert_eq!(d, &a - &b);

        assert_eq!(
            a.len() + b.len(),
            (&a | &b).len() + (&a & &b).len()
        );
    }

    #[test]
    fn in_place_forms_match_operators() {
        let a = set_of(&[1, 2, 3]);
        let b = set_of(&[2, 3, 4]);

        let mut u = a.clone();
        u |= &b;
        assert_eq!(u, &a | &b);

        let mut i = a.clone();
        i &= &b;
        assert_eq!(i, &a & &b);

        let mut d = a.clone();
        d -= &b;
        assert_eq!(d, &a - &b);

        let mut x = a.clone();
        x ^= &b;
        assert_eq!(x, &a ^ &b);
        x.validate();
    }

    #[test]
    fn subset_partial_order() {
        let small = set_of(&[1, 2]);
        let big = set_of(&[1, 2, 3]);
        let other = set_of(&[4]);

        assert!(small.is_subset(&big));
        assert!(big.is_superset(&small));
        assert!(small < big);
        assert!(big > small);
        assert_eq!(small.partial_cmp(&other), None);
        assert!(small.is_disjoint(&other));
        assert!(!small.is_disjoint(&big));
    }

    #[test]
    fn empty_set_edge_cases() {
        let empty: Set<i32> = Set::new();
        let s = set_of(&[1]);
        assert!(empty.is_subset(&s));
        assert!(empty.is_disjoint(&s));
        assert!(empty.is_disjoint(&empty));
        assert_eq!(&empty | &s, s);
        assert_eq!((&empty & &s).len(), 0);
    }
}
