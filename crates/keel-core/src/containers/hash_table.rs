//! Chained hash table over one shared intrusive list.
//!
//! Every live entry is a forward-list node carrying the value and its
//! precomputed hash key, and all buckets share a single chain. For bucket
//! `i`, `buckets[i]` stores the *anchor*: the node whose `next` is the
//! bucket's first entry, or nil when the bucket is empty. A heap-allocated
//! placeholder node (value slot never initialized) acts as the fixed chain
//! head, so hooking a node at the front needs no special case.
//!
//! The shared chain makes iteration over all entries linear in the entry
//! count regardless of load factor, and lets a rehash rebuild the buckets
//! in place by walking the old chain and re-hooking every node.
//!
//! Invariants:
//! - the bucket count is a power of two (initially
//!   [`HASH_BUCKET_INITIAL_COUNT`]);
//! - every entry sits in the bucket selected by `hkey & (buckets - 1)`;
//! - walking from the placeholder visits every entry exactly once;
//! - the load factor stays under [`HASH_BUCKET_LOAD_FACTOR`] after every
//!   insertion.
//!
//! Iterators remain valid across insertions that do not trigger a rehash
//! and across removals of other entries.

use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

use super::array::Array;
use crate::alloc::AllocRef;
use crate::config::{HASH_BUCKET_INITIAL_COUNT, HASH_BUCKET_LOAD_FACTOR, MIN_ALIGNMENT};
use crate::hash::{finalize, DefaultHashPolicy, HashKey, HashPolicy};

/// Entry node: shared-chain link, cached hash key, value.
pub(crate) struct HashNode<T> {
    next: HLink<T>,
    hkey: HashKey,
    /// Initialized for every node except the placeholder.
    value: MaybeUninit<T>,
}

type HLink<T> = Option<NonNull<HashNode<T>>>;

/// Open hash table with constant-time chain iteration.
pub struct HashTable<T, P: HashPolicy<T> = DefaultHashPolicy> {
    /// Bucket anchors. `buckets[i]` points at the node preceding bucket
    /// `i`'s first entry.
    buckets: Array<HLink<T>>,
    num_items: usize,
    /// Fixed chain head; its value slot is never initialized.
    placeholder: NonNull<HashNode<T>>,
    alloc: AllocRef,
    _policy: PhantomData<P>,
}

impl<T, P: HashPolicy<T>> HashTable<T, P> {
    /// An empty table with the initial bucket count, using the global
    /// allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(AllocRef::global())
    }

    /// An empty table using the given allocator.
    #[must_use]
    pub fn new_in(alloc: AllocRef) -> Self {
        let placeholder = Self::alloc_raw_node(alloc);
        // SAFETY: freshly allocated; only the link and key fields are
        // initialized — the value slot intentionally stays uninit.
        unsafe {
            let p = placeholder.as_ptr();
            core::ptr::addr_of_mut!((*p).next).write(None);
            core::ptr::addr_of_mut!((*p).hkey).write(0);
        }
        Self {
            buckets: Self::make_buckets(alloc, HASH_BUCKET_INITIAL_COUNT),
            num_items: 0,
            placeholder,
            alloc,
            _policy: PhantomData,
        }
    }

    fn make_buckets(alloc: AllocRef, n: usize) -> Array<HLink<T>> {
        let mut buckets = Array::new_in(alloc);
        buckets.grow_to_fit(n);
        for _ in 0..n {
            buckets.append(None);
        }
        buckets
    }

    fn alloc_raw_node(alloc: AllocRef) -> NonNull<HashNode<T>> {
        alloc
            .alloc(
                core::mem::size_of::<HashNode<T>>(),
                core::mem::align_of::<HashNode<T>>().max(MIN_ALIGNMENT),
            )
            .expect("hash node allocation failed")
            .cast::<HashNode<T>>()
    }

    fn alloc_node(&self, value: T, hkey: HashKey) -> NonNull<HashNode<T>> {
        let node = Self::alloc_raw_node(self.alloc);
        // SAFETY: freshly allocated, properly sized and aligned.
        unsafe {
            node.as_ptr().write(HashNode {
                next: None,
                hkey,
                value: MaybeUninit::new(value),
            });
        }
        node
    }

    /// Free a detached entry node, returning its value.
    ///
    /// # Safety
    ///
    /// `node` must be an unlinked entry node of this table (not the
    /// placeholder), with an initialized value.
    unsafe fn free_node(&self, node: NonNull<HashNode<T>>) -> T {
        // SAFETY: fn contract; value is moved out before the block is
        // released.
        unsafe {
            let value = (*node.as_ptr()).value.assume_init_read();
            self.alloc.dealloc(node.cast());
            value
        }
    }

    /// Number of live entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.num_items
    }

    /// True when the table holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    /// Current bucket count.
    #[inline]
    #[must_use]
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// The allocator handle this table draws from.
    #[must_use]
    pub fn allocator(&self) -> AllocRef {
        self.alloc
    }

    /// Size in bytes of one entry-node allocation, for sizing pooled
    /// allocators that will back this container.
    #[must_use]
    pub const fn node_size() -> usize {
        core::mem::size_of::<HashNode<T>>()
    }

    /// Alignment of one entry-node allocation.
    #[must_use]
    pub const fn node_align() -> usize {
        core::mem::align_of::<HashNode<T>>()
    }

    /// Hash `key` through the policy and the final mixing step.
    #[must_use]
    pub fn compute_hash(key: &P::Key) -> HashKey {
        finalize(P::hash(key))
    }

    #[inline]
    fn bucket_idx(&self, hkey: HashKey) -> usize {
        hkey & (self.buckets.len() - 1)
    }

    /// First entry of a bucket, nil when the bucket is empty.
    fn bucket_first(&self, idx: usize) -> HLink<T> {
        // SAFETY: anchors always point at live chain nodes.
        self.buckets[idx].and_then(|anchor| unsafe { (*anchor.as_ptr()).next })
    }

    /// Find the entry matching `key` with hash `hkey`.
    fn locate(&self, key: &P::Key, hkey: HashKey) -> HLink<T> {
        let idx = self.bucket_idx(hkey);
        let mut it = self.bucket_first(idx);
        // SAFETY: chain nodes are live; every non-placeholder node has an
        // initialized value.
        unsafe {
            while let Some(n) = it {
                let np = n.as_ptr();
                if self.bucket_idx((*np).hkey) != idx {
                    break;
                }
                if (*np).hkey == hkey && P::eq(P::key_of((*np).value.assume_init_ref()), key) {
                    return Some(n);
                }
                it = (*np).next;
            }
        }
        None
    }

    /// Hook `node` at the front of bucket `idx`.
    ///
    /// # Safety
    ///
    /// `node` must be live and detached; `idx` must equal the node's
    /// bucket index under the current bucket count.
    unsafe fn push_to_bucket(&mut self, node: NonNull<HashNode<T>>, idx: usize) {
        // SAFETY: anchors and chain neighbours are live nodes.
        unsafe {
            match self.buckets[idx] {
                Some(anchor) => {
                    // Bucket occupied: insert right behind its anchor.
                    (*node.as_ptr()).next = (*anchor.as_ptr()).next;
                    (*anchor.as_ptr()).next = Some(node);
                }
                None => {
                    // Bucket empty: hook at the chain head through the
                    // placeholder, re-anchor the displaced bucket, and
                    // make the placeholder this bucket's anchor.
                    (*node.as_ptr()).next = (*self.placeholder.as_ptr()).next;
                    (*self.placeholder.as_ptr()).next = Some(node);
                    if let Some(displaced) = (*node.as_ptr()).next {
                        let didx = self.bucket_idx((*displaced.as_ptr()).hkey);
                        self.buckets[didx] = Some(node);
                    }
                    self.buckets[idx] = Some(self.placeholder);
                }
            }
        }
    }

    /// Re-bucket every entry under `new_count` buckets, walking the
    /// shared chain. Entry nodes are reused; only the anchors move.
    fn realloc_buckets(&mut self, new_count: usize) {
        debug_assert!(new_count.is_power_of_two());
        if new_count == self.buckets.len() {
            return;
        }
        self.buckets = Self::make_buckets(self.alloc, new_count);

        // SAFETY: the old chain nodes stay live; each is re-hooked once.
        unsafe {
            let mut head = (*self.placeholder.as_ptr()).next;
            (*self.placeholder.as_ptr()).next = None;
            while let Some(n) = head {
                head = (*n.as_ptr()).next;
                let idx = self.bucket_idx((*n.as_ptr()).hkey);
                self.push_to_bucket(n, idx);
            }
        }
    }

    /// Double the bucket count while `extra` more entries would breach
    /// the load factor.
    fn reserve(&mut self, extra: usize) {
        let mut new_count = self.buckets.len();
        while (self.num_items + extra) as f32 / new_count as f32 >= HASH_BUCKET_LOAD_FACTOR {
            new_count <<= 1;
        }
        self.realloc_buckets(new_count);
    }

    /// Borrow the entry matching `key`.
    #[must_use]
    pub fn find(&self, key: &P::Key) -> Option<&T> {
        let node = self.locate(key, Self::compute_hash(key))?;
        // SAFETY: located nodes carry initialized values, live for the
        // borrow of `self`.
        Some(unsafe { (*node.as_ptr()).value.assume_init_ref() })
    }

    /// Mutably borrow the entry matching `key`.
    ///
    /// The borrow must not be used to change the part of the value the
    /// policy keys on.
    #[must_use]
    pub fn find_mut(&mut self, key: &P::Key) -> Option<&mut T> {
        let node = self.locate(key, Self::compute_hash(key))?;
        // SAFETY: as `find`; exclusivity flows from `&mut self`.
        Some(unsafe { (*node.as_ptr()).value.assume_init_mut() })
    }

    /// True if an entry matches `key`.
    #[must_use]
    pub fn contains(&self, key: &P::Key) -> bool {
        self.locate(key, Self::compute_hash(key)).is_some()
    }

    /// Insert `value` unless a duplicate exists; borrow the stored value
    /// either way. The boolean reports whether an insertion happened.
    pub fn find_or_insert(&mut self, value: T) -> (&mut T, bool) {
        let hkey = Self::compute_hash(P::key_of(&value));
        if let Some(found) = self.locate(P::key_of(&value), hkey) {
            // SAFETY: located nodes carry initialized values.
            return (unsafe { (*found.as_ptr()).value.assume_init_mut() }, false);
        }

        self.reserve(1);
        let node = self.alloc_node(value, hkey);
        let idx = self.bucket_idx(hkey);
        // SAFETY: `node` is fresh and `idx` derived from its key.
        unsafe { self.push_to_bucket(node, idx) };
        self.num_items += 1;
        // SAFETY: just initialized.
        (unsafe { (*node.as_ptr()).value.assume_init_mut() }, true)
    }

    /// Insert `value`, overwriting an existing duplicate's value.
    /// Returns the displaced value when there was one.
    pub fn insert_unique(&mut self, value: T) -> Option<T> {
        let hkey = Self::compute_hash(P::key_of(&value));
        if let Some(found) = self.locate(P::key_of(&value), hkey) {
            // SAFETY: located nodes carry initialized values; the swap
            // moves the new payload in and the old one out.
            unsafe {
                let slot = (*found.as_ptr()).value.assume_init_mut();
                return Some(core::mem::replace(slot, value));
            }
        }
        let (_, inserted) = self.find_or_insert(value);
        debug_assert!(inserted);
        None
    }

    /// Remove the entry matching `key`, returning its value.
    pub fn remove(&mut self, key: &P::Key) -> Option<T> {
        let hkey = Self::compute_hash(key);
        let node = self.locate(key, hkey)?;
        // SAFETY: `node` is a live entry of this table.
        unsafe { Some(self.remove_node(node)) }
    }

    /// Unlink and free `node`.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry node of this table.
    unsafe fn remove_node(&mut self, node: NonNull<HashNode<T>>) -> T {
        // SAFETY: anchors and chain nodes are live; the scan stays inside
        // the node's bucket run, which must contain it.
        unsafe {
            let idx = self.bucket_idx((*node.as_ptr()).hkey);
            let anchor = self.buckets[idx].expect("occupied bucket has an anchor");

            // Walk to the node right before ours in the shared chain.
            let mut prev = anchor;
            while (*prev.as_ptr()).next != Some(node) {
                prev = (*prev.as_ptr()).next.expect("entry reachable from its anchor");
            }

            let next = (*node.as_ptr()).next;

            // If our node anchors the next bucket, promote `prev`.
            let mut leaves_bucket_empty = next.is_none();
            if let Some(nx) = next {
                let nidx = self.bucket_idx((*nx.as_ptr()).hkey);
                if nidx != idx {
                    self.buckets[nidx] = Some(prev);
                    leaves_bucket_empty = true;
                }
            }

            // A bucket whose only entry vanishes loses its anchor.
            if prev == anchor && leaves_bucket_empty {
                self.buckets[idx] = None;
            }

            (*prev.as_ptr()).next = next;
            self.num_items -= 1;
            self.free_node(node)
        }
    }

    /// Remove every entry, keeping the current bucket array.
    pub fn clear(&mut self) {
        // SAFETY: chain walk frees each entry exactly once; the
        // placeholder is not an entry.
        unsafe {
            let mut it = (*self.placeholder.as_ptr()).next;
            while let Some(n) = it {
                it = (*n.as_ptr()).next;
                drop(self.free_node(n));
            }
            (*self.placeholder.as_ptr()).next = None;
        }
        for anchor in self.buckets.iter_mut() {
            *anchor = None;
        }
        self.num_items = 0;
    }

    /// Iterate over all entries in chain order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        // SAFETY: the placeholder is live.
        Iter {
            next: unsafe { (*self.placeholder.as_ptr()).next },
            _marker: PhantomData,
        }
    }

    /// Verify chain/bucket consistency, panicking on any violation.
    /// Intended for tests and debugging.
    pub fn validate(&self) {
        assert!(self.buckets.len().is_power_of_two());
        // SAFETY: read-only walk of live chain nodes.
        unsafe {
            // Chain walk must see every entry exactly once.
            let mut seen = 0usize;
            let mut it = (*self.placeholder.as_ptr()).next;
            while let Some(n) = it {
                seen += 1;
                assert!(seen <= self.num_items, "chain longer than item count");
                it = (*n.as_ptr()).next;
            }
            assert_eq!(seen, self.num_items, "chain shorter than item count");

            // Every entry must be reachable from its own bucket's anchor.
            let mut it = (*self.placeholder.as_ptr()).next;
            while let Some(n) = it {
                let idx = self.bucket_idx((*n.as_ptr()).hkey);
                let mut walk = self.bucket_first(idx);
                let mut found = false;
                while let Some(w) = walk {
                    if self.bucket_idx((*w.as_ptr()).hkey) != idx {
                        break;
                    }
                    if w == n {
                        found = true;
                        break;
                    }
                    walk = (*w.as_ptr()).next;
                }
                assert!(found, "entry not reachable from its bucket anchor");
                it = (*n.as_ptr()).next;
            }
        }
        assert!(
            self.num_items == 0
                || (self.num_items as f32) < HASH_BUCKET_LOAD_FACTOR * self.buckets.len() as f32,
            "load factor breached"
        );
    }
}

impl<T, P: HashPolicy<T>> Default for HashTable<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P: HashPolicy<T>> Drop for HashTable<T, P> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the placeholder was allocated by this table and its
        // value slot was never initialized, so only the block is freed.
        unsafe { self.alloc.dealloc(self.placeholder.cast()) };
    }
}

impl<T: Clone, P: HashPolicy<T>> Clone for HashTable<T, P> {
    fn clone(&self) -> Self {
        let mut out = Self::new_in(self.alloc);
        out.realloc_buckets(self.buckets.len());
        // Reuse the cached hash keys; chain order is rebuilt, not copied.
        // SAFETY: source nodes are live with initialized values; each new
        // node is hooked exactly once.
        unsafe {
            let mut it = (*self.placeholder.as_ptr()).next;
            while let Some(n) = it {
                let hkey = (*n.as_ptr()).hkey;
                let value = (*n.as_ptr()).value.assume_init_ref().clone();
                let node = out.alloc_node(value, hkey);
                let idx = out.bucket_idx(hkey);
                out.push_to_bucket(node, idx);
                out.num_items += 1;
                it = (*n.as_ptr()).next;
            }
        }
        out
    }
}

impl<T: core::fmt::Debug, P: HashPolicy<T>> core::fmt::Debug for HashTable<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Chain-order iterator over table entries.
pub struct Iter<'a, T> {
    next: HLink<T>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.next?;
        // SAFETY: chain nodes are live with initialized values for the
        // borrow of the table.
        unsafe {
            self.next = (*node.as_ptr()).next;
            Some((*node.as_ptr()).value.assume_init_ref())
        }
    }
}

impl<'a, T, P: HashPolicy<T>> IntoIterator for &'a HashTable<T, P> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::Str;

    type Table = HashTable<u64>;

    #[test]
    fn insert_find_remove_round_trip() {
        let mut t = Table::new();
        for i in 0..100u64 {
            let (_, inserted) = t.find_or_insert(i);
            assert!(inserted);
            t.validate();
        }
        assert_eq!(t.len(), 100);

        for i in 0..100u64 {
            assert_eq!(t.find(&i), Some(&i));
        }
        assert_eq!(t.find(&1000), None);

        for i in (0..100u64).step_by(2) {
            assert_eq!(t.remove(&i), Some(i));
            t.validate();
        }
        assert_eq!(t.len(), 50);
        for i in 0..100u64 {
            assert_eq!(t.find(&i).is_some(), i % 2 == 1);
        }
    }

    #[test]
    fn duplicate_insert_is_found_not_added() {
        let mut t = Table::new();
        assert!(t.find_or_insert(7).1);
        assert!(!t.find_or_insert(7).1);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn rehash_preserves_entries() {
        let mut t = HashTable::<Str>::new();
        assert_eq!(t.num_buckets(), HASH_BUCKET_INITIAL_COUNT);
        for i in 0..100 {
            t.find_or_insert(Str::from(format!("key-{i}").as_str()));
        }
        assert_eq!(t.len(), 100);
        assert!(t.num_buckets() == 128 || t.num_buckets() == 256);
        assert!((t.len() as f32) / (t.num_buckets() as f32) <= 0.75);
        t.validate();

        for i in 0..100 {
            let key = Str::from(format!("key-{i}").as_str());
            assert_eq!(t.find(&key), Some(&key));
        }
    }

    #[test]
    fn load_factor_bound_after_every_insert() {
        let mut t = Table::new();
        for i in 0..500u64 {
            t.find_or_insert(i * 7);
            assert!(
                t.len() as f32 <= 0.75 * t.num_buckets() as f32,
                "load factor breached at {} items / {} buckets",
                t.len(),
                t.num_buckets()
            );
        }
    }

    #[test]
    fn insert_unique_overwrites() {
        let mut t = HashTable::<crate::containers::Pair<u32, u32>, crate::hash::PairHashPolicy>::new();
        assert_eq!(t.insert_unique(crate::containers::Pair::new(1, 10)), None);
        let old = t.insert_unique(crate::containers::Pair::new(1, 20));
        assert_eq!(old.map(|p| p.second), Some(10));
        assert_eq!(t.len(), 1);
        assert_eq!(t.find(&1).map(|p| p.second), Some(20));
    }

    #[test]
    fn middle_of_bucket_removal_keeps_others() {
        // Keys colliding into one bucket: identical low bits.
        let mut t = Table::new();
        let nb = t.num_buckets() as u64;
        let keys = [5u64, 5 + nb, 5 + 2 * nb, 5 + 3 * nb];
        for &k in &keys {
            t.find_or_insert(k);
        }
        t.validate();

        // Remove a middle entry of the collision run.
        assert_eq!(t.remove(&keys[1]), Some(keys[1]));
        t.validate();
        assert!(t.find(&keys[0]).is_some());
        assert!(t.find(&keys[2]).is_some());
        assert!(t.find(&keys[3]).is_some());

        for &k in &[keys[0], keys[2], keys[3]] {
            assert_eq!(t.remove(&k), Some(k));
            t.validate();
        }
        assert!(t.is_empty());
    }

    #[test]
    fn chain_iteration_sees_everything_once() {
        let mut t = Table::new();
        for i in 0..40u64 {
            t.find_or_insert(i);
        }
        let mut seen: Vec<u64> = t.iter().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn clear_then_reuse() {
        let mut t = Table::new();
        for i in 0..50u64 {
            t.find_or_insert(i);
        }
        t.clear();
        assert!(t.is_empty());
        t.validate();
        assert!(t.find(&1).is_none());

        t.find_or_insert(9);
        assert_eq!(t.find(&9), Some(&9));
        t.validate();
    }

    #[test]
    fn clone_is_deep() {
        let mut t = HashTable::<Str>::new();
        t.find_or_insert(Str::from("alpha"));
        t.find_or_insert(Str::from("beta"));
        let c = t.clone();
        assert_eq!(c.len(), 2);
        assert!(c.find(&Str::from("alpha")).is_some());
        t.clear();
        assert!(c.find(&Str::from("beta")).is_some());
        c.validate();
    }
}
