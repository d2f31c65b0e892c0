//! Pooled allocator churn and accounting.

use keel_core::{AllocRef, Allocator, List, PoolAlloc, PoolConfig, Set};

#[test]
fn pooled_alloc_churn() {
    // 8 blocks of 32 bytes, aligned to 16: 64 allocations fill 8 pools.
    let alloc = PoolAlloc::new(PoolConfig {
        num_blocks: 8,
        block_size: 32,
        block_align: 16,
    });

    let mut blocks = Vec::new();
    for _ in 0..64 {
        let ptr = alloc.alloc(32, 16).expect("pool allocation");
        assert_eq!(ptr.as_ptr() as usize % 16, 0);
        blocks.push(ptr);
    }
    assert_eq!(alloc.num_pools(), 8);
    assert_eq!(alloc.used_memory(), 64 * 32);

    for ptr in blocks.into_iter().rev() {
        // SAFETY: every pointer came from `alloc` and is freed once.
        unsafe { alloc.dealloc(ptr) };
    }
    assert_eq!(alloc.num_pools(), 0);
    assert_eq!(alloc.used_memory(), 0);
}

#[test]
fn accounting_balances_malloc_and_free_calls() {
    let alloc = PoolAlloc::new(PoolConfig {
        num_blocks: 16,
        block_size: 48,
        block_align: 16,
    });

    let mut live = Vec::new();
    // Interleave allocations and frees in a deterministic pattern.
    for round in 0..10usize {
        for _ in 0..8 {
            live.push(alloc.alloc(48, 16).expect("pool allocation"));
        }
        for _ in 0..(round % 5) {
            if let Some(ptr) = live.pop() {
                // SAFETY: came from `alloc`.
                unsafe { alloc.dealloc(ptr) };
            }
        }
        let snap = alloc.metrics();
        assert_eq!(
            alloc.used_memory(),
            (snap.allocs - snap.frees) as usize * 48
        );
    }

    for ptr in live {
        // SAFETY: came from `alloc`.
        unsafe { alloc.dealloc(ptr) };
    }
    assert_eq!(alloc.used_memory(), 0);
    assert_eq!(alloc.num_pools(), 0);
}

#[test]
fn blocks_do_not_overlap_across_pools() {
    let alloc = PoolAlloc::new(PoolConfig {
        num_blocks: 4,
        block_size: 64,
        block_align: 16,
    });

    let blocks: Vec<_> = (0..16).map(|_| alloc.alloc(64, 16).expect("alloc")).collect();
    let mut addrs: Vec<usize> = blocks.iter().map(|p| p.as_ptr() as usize).collect();
    addrs.sort_unstable();
    for pair in addrs.windows(2) {
        assert!(pair[1] - pair[0] >= 64, "blocks overlap");
    }

    for ptr in blocks {
        // SAFETY: came from `alloc`.
        unsafe { alloc.dealloc(ptr) };
    }
}

#[test]
fn containers_draw_nodes_from_a_pool() {
    // A pooled allocator sized for the tree's node type backs a set; the
    // set's nodes land in pool blocks and the pools drain on clear.
    type Nodes = Set<u64>;
    let pool: &'static PoolAlloc = &*Box::leak(Box::new(PoolAlloc::new(PoolConfig {
        num_blocks: 32,
        block_size: keel_core::Tree::<u64>::node_size(),
        block_align: keel_core::Tree::<u64>::node_align(),
    })));
    let handle = AllocRef::new(pool);

    let mut set: Nodes = Set::new_in(handle);
    for i in 0..100u64 {
        set.insert(i);
    }
    assert_eq!(set.len(), 100);
    assert!(pool.num_pools() >= 4);
    assert_eq!(
        pool.used_memory(),
        100 * keel_core::Tree::<u64>::node_size()
    );

    set.clear();
    assert_eq!(pool.num_pools(), 0);
    assert_eq!(pool.used_memory(), 0);

    let mut list: List<u64> = List::new_in(AllocRef::new(Box::leak(Box::new(PoolAlloc::new(
        PoolConfig {
            num_blocks: 16,
            block_size: List::<u64>::node_size(),
            block_align: List::<u64>::node_align(),
        },
    )))));
    for i in 0..40u64 {
        list.push_back(i);
    }
    assert_eq!(list.len(), 40);
    assert_eq!(list.pop_front(), Some(0));
    list.reset();
    assert!(list.is_empty());
}

#[test]
fn oversized_alignment_request_is_honored_by_config() {
    let alloc = PoolAlloc::new(PoolConfig {
        num_blocks: 4,
        block_size: 100,
        block_align: 64,
    });
    let ptr = alloc.alloc(100, 64).expect("alloc");
    assert_eq!(ptr.as_ptr() as usize % 64, 0);
    // SAFETY: came from `alloc`.
    unsafe { alloc.dealloc(ptr) };
    assert_eq!(alloc.num_pools(), 0);
}
