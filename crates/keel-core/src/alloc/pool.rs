//! Pooled slab allocator.
//!
//! Memory is handed out in fixed-size blocks sliced from pools. Each pool
//! is one contiguous buffer: `num_blocks` physically-aligned block slots
//! followed by the pool header. The header embeds the intrusive tree node
//! that indexes all pools by buffer address, so `dealloc` finds the owning
//! pool with a logarithmic descent and an address-range match.
//!
//! Free blocks of a pool form an intrusive singly-linked list threaded
//! through the trailing pointer slot of each block (the word right after
//! the block's logical `block_size` bytes). Pools that still have free
//! blocks additionally form a singly-linked free-pool list, most recently
//! freed first, so reuse stays cache-warm.
//!
//! A pool whose last block is returned is unlinked from both structures
//! and its buffer released to the backing allocator.

use core::cell::Cell;
use core::cmp::Ordering;
use core::ptr::{self, NonNull};

use super::{check_request, AllocMetrics, AllocRef, Allocator, MetricsSnapshot};
use crate::config::MIN_ALIGNMENT;
use crate::math::{align2_up, is_pow2};
use crate::tree::node::{self, TreeNode};

/// Fixed pool geometry, immutable for the allocator's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Number of blocks per pool.
    pub num_blocks: usize,
    /// Logical size of each block in bytes.
    pub block_size: usize,
    /// Alignment of each block. Rounded up to [`MIN_ALIGNMENT`].
    pub block_align: usize,
}

impl PoolConfig {
    /// Physical slot size: the logical block plus its trailing free-list
    /// pointer, rounded up to the block alignment.
    fn physical_block_size(&self) -> usize {
        align2_up(
            self.block_size + core::mem::size_of::<*mut u8>(),
            self.block_align,
        )
    }
}

/// Per-pool state, embedded as the payload of the pool-index tree node.
struct Pool {
    /// Buffer start. Uniquely identifies the pool within its allocator.
    buffer: NonNull<u8>,
    /// Whole buffer length, block slots plus header.
    buffer_size: usize,
    /// Head of the intrusive free-block list.
    free_blocks: Option<NonNull<u8>>,
    /// Blocks currently handed out.
    blocks_in_use: usize,
    /// Next pool on the free-pool list.
    next_free_pool: PoolLink,
}

type PoolNode = TreeNode<Pool>;
type PoolLink = Option<NonNull<PoolNode>>;

/// Allocator that serves fixed-size blocks out of one or more pools.
///
/// When every pool is exhausted a new one is created from the backing
/// allocator; when a pool empties it is destroyed. Dropping the allocator
/// releases all pools; dropping it while blocks are still in use is a
/// caller bug (debug-checked).
pub struct PoolAlloc {
    /// Root of the pool-index tree, keyed by buffer address.
    root: Cell<PoolLink>,
    /// Head of the free-pool list (pools with at least one free block).
    free_pools: Cell<PoolLink>,
    pool_count: Cell<usize>,
    config: PoolConfig,
    backing: AllocRef,
    metrics: AllocMetrics,
}

impl PoolAlloc {
    /// Create a pooled allocator drawing pool buffers from the global
    /// allocator.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        Self::with_backing(config, AllocRef::global())
    }

    /// Create a pooled allocator with an explicit backing allocator.
    #[must_use]
    pub fn with_backing(mut config: PoolConfig, backing: AllocRef) -> Self {
        assert!(config.num_blocks > 0, "pool must hold at least one block");
        assert!(config.block_size > 0, "pool block size must be non-zero");
        config.block_align = config.block_align.max(MIN_ALIGNMENT);
        assert!(
            is_pow2(config.block_align),
            "pool block alignment must be a power of two"
        );
        Self {
            root: Cell::new(None),
            free_pools: Cell::new(None),
            pool_count: Cell::new(0),
            config,
            backing,
            metrics: AllocMetrics::new(),
        }
    }

    /// The configured geometry.
    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// Number of pools currently alive.
    #[must_use]
    pub fn num_pools(&self) -> usize {
        self.pool_count.get()
    }

    /// Snapshot of this instance's counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Allocate one buffer, thread its free list, and register the pool in
    /// the index tree and at the head of the free-pool list.
    fn create_pool(&self) -> PoolLink {
        let phys = self.config.physical_block_size();
        let pool_size = phys * self.config.num_blocks;
        let buffer_size = pool_size + core::mem::size_of::<PoolNode>();

        let buffer = self.backing.alloc(buffer_size, self.config.block_align)?;
        let base = buffer.as_ptr();

        // SAFETY: the buffer is valid for `buffer_size` bytes; every write
        // below lands inside it. Trailing pointer slots may be unaligned
        // for arbitrary block sizes, hence `write_unaligned`.
        unsafe {
            // Thread each block's trailing slot to the next block.
            for i in 0..self.config.num_blocks - 1 {
                let slot = base.add(i * phys + self.config.block_size) as *mut *mut u8;
                ptr::write_unaligned(slot, base.add((i + 1) * phys));
            }
            let last = base.add((self.config.num_blocks - 1) * phys + self.config.block_size);
            ptr::write_unaligned(last as *mut *mut u8, ptr::null_mut());

            // The header lives at the buffer tail. `pool_size` is a
            // multiple of `block_align >= MIN_ALIGNMENT`, which covers the
            // header's alignment.
            let header = base.add(pool_size) as *mut PoolNode;
            header.write(TreeNode::new(Pool {
                buffer,
                buffer_size,
                free_blocks: Some(buffer),
                blocks_in_use: 0,
                next_free_pool: self.free_pools.get(),
            }));
            let header = NonNull::new_unchecked(header);

            // Index the pool by buffer start address.
            let key = base as usize;
            let root = node::insert(self.root.get(), header, |p: &Pool| {
                key.cmp(&(p.buffer.as_ptr() as usize))
            });
            self.root.set(Some(root));

            self.free_pools.set(Some(header));
            self.pool_count.set(self.pool_count.get() + 1);
            Some(header)
        }
    }

    /// Remove a pool from the index tree and release its buffer.
    ///
    /// # Safety
    ///
    /// `pool_node` must be a live pool of this allocator, already unlinked
    /// from the free-pool list.
    unsafe fn destroy_pool(&self, pool_node: NonNull<PoolNode>) {
        // SAFETY: the header stays readable until its buffer is released.
        unsafe {
            let out = node::remove(pool_node);
            self.root.set(out.root);
            let buffer = (*pool_node.as_ptr()).value.buffer;
            // The header lives inside the buffer; nothing may touch it
            // after this call.
            self.backing.dealloc(buffer);
        }
        self.pool_count.set(self.pool_count.get() - 1);
    }

    /// Unlink a pool from the free-pool list.
    ///
    /// # Safety
    ///
    /// `pool_node` must be a live pool of this allocator that is currently
    /// on the free-pool list.
    unsafe fn unlink_free_pool(&self, pool_node: NonNull<PoolNode>) {
        // SAFETY: the free-pool list only links live pool headers.
        unsafe {
            if self.free_pools.get() == Some(pool_node) {
                self.free_pools
                    .set((*pool_node.as_ptr()).value.next_free_pool);
                return;
            }
            let mut it = self.free_pools.get();
            while let Some(n) = it {
                let pv = ptr::addr_of_mut!((*n.as_ptr()).value);
                if (*pv).next_free_pool == Some(pool_node) {
                    (*pv).next_free_pool = (*pool_node.as_ptr()).value.next_free_pool;
                    return;
                }
                it = (*pv).next_free_pool;
            }
            debug_assert!(false, "pool missing from the free-pool list");
        }
    }
}

impl Allocator for PoolAlloc {
    fn alloc(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        check_request(size, align);
        debug_assert!(
            size <= self.config.block_size,
            "request of {size} bytes exceeds pool block size {}",
            self.config.block_size
        );
        debug_assert!(
            align <= self.config.block_align,
            "requested alignment {align} exceeds pool block alignment {}",
            self.config.block_align
        );
        if size == 0 {
            return None;
        }

        let pool_node = match self.free_pools.get() {
            Some(p) => p,
            None => self.create_pool()?,
        };

        // SAFETY: `pool_node` is a live pool on the free-pool list, so it
        // has a free block whose trailing slot holds the next link.
        unsafe {
            let pv = ptr::addr_of_mut!((*pool_node.as_ptr()).value);
            let out = (*pv).free_blocks.expect("free pool has a free block");
            let slot = out.as_ptr().add(self.config.block_size) as *const *mut u8;
            (*pv).free_blocks = NonNull::new(ptr::read_unaligned(slot));
            (*pv).blocks_in_use += 1;

            if (*pv).free_blocks.is_none() {
                // Pool exhausted; drop it from the free-pool list.
                self.free_pools.set((*pv).next_free_pool);
                (*pv).next_free_pool = None;
            }

            self.metrics.on_alloc(self.config.block_size);
            Some(out)
        }
    }

    unsafe fn dealloc(&self, ptr_in: NonNull<u8>) {
        let addr = ptr_in.as_ptr() as usize;

        // SAFETY: the index tree only links live pool headers.
        let found = unsafe {
            node::find(self.root.get(), |p: &Pool| {
                let start = p.buffer.as_ptr() as usize;
                if addr < start {
                    Ordering::Less
                } else if addr >= start + p.buffer_size {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
        };
        let Some(pool_node) = found else {
            debug_assert!(false, "pointer {addr:#x} was not allocated by this allocator");
            return;
        };

        // SAFETY: `pool_node` is the live owning pool and `ptr_in` one of
        // its blocks (fn contract).
        unsafe {
            let pv = ptr::addr_of_mut!((*pool_node.as_ptr()).value);

            if (*pv).free_blocks.is_none() {
                // Pool was exhausted; it rejoins the free-pool list head.
                (*pv).next_free_pool = self.free_pools.get();
                self.free_pools.set(Some(pool_node));
            }

            // LIFO push keeps the next allocation cache-warm.
            let slot = ptr_in.as_ptr().add(self.config.block_size) as *mut *mut u8;
            let head = (*pv).free_blocks.map_or(ptr::null_mut(), NonNull::as_ptr);
            ptr::write_unaligned(slot, head);
            (*pv).free_blocks = Some(ptr_in);
            (*pv).blocks_in_use -= 1;
            self.metrics.on_free(self.config.block_size);

            if (*pv).blocks_in_use == 0 {
                self.unlink_free_pool(pool_node);
                self.destroy_pool(pool_node);
            }
        }
    }

    fn used_memory(&self) -> usize {
        self.metrics.in_use()
    }
}

impl Drop for PoolAlloc {
    fn drop(&mut self) {
        while let Some(root) = self.root.get() {
            // SAFETY: `root` is a live pool header of this allocator; the
            // free-pool list is abandoned wholesale below.
            unsafe {
                debug_assert_eq!(
                    (*root.as_ptr()).value.blocks_in_use,
                    0,
                    "pool allocator dropped with blocks still in use"
                );
                self.destroy_pool(root);
            }
        }
        self.free_pools.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(num_blocks: usize, block_size: usize, block_align: usize) -> PoolConfig {
        PoolConfig {
            num_blocks,
            block_size,
            block_align,
        }
    }

    #[test]
    fn churn_creates_and_destroys_pools() {
        let alloc = PoolAlloc::new(config(8, 32, 16));
        let mut blocks = Vec::new();
        for _ in 0..64 {
            blocks.push(alloc.alloc(32, 16).expect("pool alloc"));
        }
        assert_eq!(alloc.num_pools(), 8);
        assert_eq!(alloc.used_memory(), 64 * 32);

        for ptr in blocks.into_iter().rev() {
            // SAFETY: every pointer came from `alloc`.
            unsafe { alloc.dealloc(ptr) };
        }
        assert_eq!(alloc.num_pools(), 0);
        assert_eq!(alloc.used_memory(), 0);
    }

    #[test]
    fn blocks_are_aligned_and_writable() {
        let alloc = PoolAlloc::new(config(4, 24, 32));
        let mut blocks = Vec::new();
        for i in 0..12u8 {
            let ptr = alloc.alloc(24, 32).expect("pool alloc");
            assert_eq!(ptr.as_ptr() as usize % 32, 0);
            // SAFETY: each block is valid for 24 bytes.
            unsafe { core::ptr::write_bytes(ptr.as_ptr(), i, 24) };
            blocks.push((ptr, i));
        }
        for (ptr, fill) in &blocks {
            // SAFETY: blocks are live and were filled above.
            let first = unsafe { ptr.as_ptr().read() };
            assert_eq!(first, *fill, "blocks must not overlap");
        }
        for (ptr, _) in blocks {
            // SAFETY: pointer came from `alloc`.
            unsafe { alloc.dealloc(ptr) };
        }
    }

    #[test]
    fn exhausted_pool_rejoins_free_list_on_free() {
        let alloc = PoolAlloc::new(config(2, 16, 8));
        let a = alloc.alloc(16, 8).expect("alloc");
        let b = alloc.alloc(16, 8).expect("alloc");
        assert_eq!(alloc.num_pools(), 1);

        // Pool is exhausted; freeing one block must make it allocatable
        // again without growing a second pool.
        // SAFETY: `a` came from `alloc`.
        unsafe { alloc.dealloc(a) };
        let c = alloc.alloc(16, 8).expect("alloc");
        assert_eq!(alloc.num_pools(), 1);

        // SAFETY: both remaining blocks came from `alloc`.
        unsafe {
            alloc.dealloc(b);
            alloc.dealloc(c);
        }
        assert_eq!(alloc.num_pools(), 0);
    }

    #[test]
    fn interleaved_free_order() {
        let alloc = PoolAlloc::new(config(4, 40, 16));
        let mut blocks: Vec<_> = (0..16).map(|_| alloc.alloc(40, 16).expect("alloc")).collect();
        assert_eq!(alloc.num_pools(), 4);

        // Free every other block, then the rest.
        for i in (0..16).step_by(2) {
            // SAFETY: pointer came from `alloc`.
            unsafe { alloc.dealloc(blocks[i]) };
        }
        for i in (1..16).step_by(2) {
            // SAFETY: pointer came from `alloc`.
            unsafe { alloc.dealloc(blocks[i]) };
        }
        blocks.clear();
        assert_eq!(alloc.num_pools(), 0);
        assert_eq!(alloc.used_memory(), 0);
    }

    #[test]
    fn accounting_matches_call_balance() {
        let alloc = PoolAlloc::new(config(8, 64, 16));
        let blocks: Vec<_> = (0..20).map(|_| alloc.alloc(64, 16).expect("alloc")).collect();
        let snap = alloc.metrics();
        assert_eq!(
            alloc.used_memory(),
            (snap.allocs - snap.frees) as usize * 64
        );
        for ptr in blocks {
            // SAFETY: pointer came from `alloc`.
            unsafe { alloc.dealloc(ptr) };
        }
        assert_eq!(alloc.used_memory(), 0);
    }
}
