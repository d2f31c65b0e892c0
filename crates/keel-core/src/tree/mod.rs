//! Intrusive red-black tree primitives.
//!
//! [`node`] holds the raw, allocator-free layer: nodes carry their own
//! `parent`/`left`/`right` structure links plus an in-order `next`/`prev`
//! thread, and every operation is a free function over [`core::ptr::NonNull`]
//! node pointers guided by a branching-policy closure.
//!
//! The owning container built on these primitives lives in
//! [`crate::containers::tree`]; the pooled allocator reuses the same
//! primitives to index pools by buffer address.

pub mod node;

pub use node::{Color, Link, TreeNode};
