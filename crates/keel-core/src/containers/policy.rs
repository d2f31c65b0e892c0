//! Ordering policies for the tree-backed containers.
//!
//! A policy names the key inside a stored value and orders keys. Lookups
//! may then hand in a bare key, a whole value, or (for maps) a pair — the
//! container routes all three through the same key comparison.

use core::cmp::Ordering;

use super::Pair;

/// Key extraction and ordering for values of type `T`.
pub trait TreePolicy<T> {
    /// The key the policy orders by.
    type Key: ?Sized;

    /// Borrow the key out of a stored value.
    fn key_of(value: &T) -> &Self::Key;

    /// Three-way key comparison.
    fn cmp_keys(a: &Self::Key, b: &Self::Key) -> Ordering;

    /// Three-way value comparison through the keys.
    #[inline]
    fn cmp_values(a: &T, b: &T) -> Ordering {
        Self::cmp_keys(Self::key_of(a), Self::key_of(b))
    }
}

/// Policy ordering values by themselves.
pub struct ValuePolicy;

impl<T: Ord> TreePolicy<T> for ValuePolicy {
    type Key = T;

    #[inline]
    fn key_of(value: &T) -> &T {
        value
    }

    #[inline]
    fn cmp_keys(a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Policy for `Pair<K, V>` values that orders by the key half only.
pub struct PairKeyPolicy;

impl<K: Ord, V> TreePolicy<Pair<K, V>> for PairKeyPolicy {
    type Key = K;

    #[inline]
    fn key_of(value: &Pair<K, V>) -> &K {
        &value.first
    }

    #[inline]
    fn cmp_keys(a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_policy_is_plain_ordering() {
        assert_eq!(
            <ValuePolicy as TreePolicy<i32>>::cmp_values(&1, &2),
            Ordering::Less
        );
    }

    #[test]
    fn pair_policy_ignores_values() {
        let a = Pair::new(1, "z");
        let b = Pair::new(1, "a");
        assert_eq!(
            <PairKeyPolicy as TreePolicy<Pair<i32, &str>>>::cmp_values(&a, &b),
            Ordering::Equal
        );
    }
}
