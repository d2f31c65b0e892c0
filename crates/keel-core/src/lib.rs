//! # keel-core
//!
//! Runtime-core primitives: a pooled slab allocator over an aligned raw
//! allocator, an intrusive threaded red-black tree, a shared-chain hash
//! table, and the container layer built on top of all three (dynamic array,
//! doubly-linked list, ordered set/map, hash set/map, string).
//!
//! The three hard subsystems are designed as one whole: the pooled allocator
//! indexes its pools with the same intrusive tree the ordered containers
//! use, and every container draws node or buffer storage through the same
//! allocator handle.
//!
//! Algorithmic and value-level code is safe Rust. Memory-facing modules
//! (`alloc`, `tree::node`, the node-owning containers) use `unsafe` with
//! documented invariants.

pub mod alloc;
pub mod config;
pub mod containers;
pub mod fmt;
pub mod hash;
pub mod math;
pub mod tree;

pub use alloc::{global_alloc, set_global_alloc, AllocRef, Allocator, AnsiAlloc, PoolAlloc, PoolConfig};
pub use containers::{
    Array, HashMap, HashSet, List, Map, Optional, Pair, Set, Str, StringBase, Tree, WideStr,
};
pub use hash::{murmur64, HashKey, ToHashKey};
