//! Raw threaded red-black tree operations.
//!
//! Nodes embed five links and a color. Beyond the classic structure links,
//! `next`/`prev` thread every node into one in-order doubly-linked chain:
//! `next` is the in-order successor, `prev` the predecessor. The chain is
//! the only traversal mechanism — advancing an iterator is O(1) and never
//! walks the structure links.
//!
//! All functions here are policy-driven: a branching policy is a callable
//! `FnMut(&T) -> Ordering` reporting where the search key sits relative to
//! the inspected node value (`Less` = key belongs left of this node).
//!
//! No allocation happens at this layer. Callers own the nodes and are
//! responsible for their lifetime; every function documents the links it
//! rewires.
//!
//! Invariants restored after every mutating entry point:
//! 1. the root is black;
//! 2. a red node has only black children;
//! 3. every root-to-nil path crosses the same number of black nodes;
//! 4. the `next`/`prev` chain enumerates all nodes in policy order.

use core::cmp::Ordering;
use core::ptr::NonNull;

/// Node color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Nullable node pointer.
pub type Link<T> = Option<NonNull<TreeNode<T>>>;

/// A red-black tree node with in-order threading.
pub struct TreeNode<T> {
    pub(crate) parent: Link<T>,
    pub(crate) left: Link<T>,
    pub(crate) right: Link<T>,
    pub(crate) next: Link<T>,
    pub(crate) prev: Link<T>,
    pub(crate) color: Color,
    pub(crate) value: T,
}

impl<T> TreeNode<T> {
    /// A detached red node ready for [`insert`].
    pub fn new(value: T) -> Self {
        Self {
            parent: None,
            left: None,
            right: None,
            next: None,
            prev: None,
            color: Color::Red,
            value,
        }
    }

    /// The node value.
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// In-order successor.
    #[inline]
    pub fn next(&self) -> Link<T> {
        self.next
    }

    /// In-order predecessor.
    #[inline]
    pub fn prev(&self) -> Link<T> {
        self.prev
    }
}

/// Outcome of [`insert_unique`] / [`find_or_insert`].
pub struct InsertOutcome<T> {
    /// Root after the operation.
    pub root: NonNull<TreeNode<T>>,
    /// The node now holding the (possibly pre-existing) value for the key.
    pub node: NonNull<TreeNode<T>>,
    /// The caller-provided node, handed back when a matching node already
    /// existed. The caller must dispose of it; its value slot holds the
    /// displaced payload ([`insert_unique`]) or the unused new payload
    /// ([`find_or_insert`]).
    pub spare: Option<NonNull<TreeNode<T>>>,
}

/// Outcome of [`remove`].
pub struct RemoveOutcome<T> {
    /// Root after the removal, `None` when the tree became empty.
    pub root: Link<T>,
    /// In-order successor of the removed node.
    pub next: Link<T>,
}

/// True if `link` refers to a red node. Nil counts as black.
///
/// # Safety
///
/// `link`, when non-nil, must point to a live node.
#[inline]
pub unsafe fn is_red<T>(link: Link<T>) -> bool {
    match link {
        // SAFETY: caller guarantees the node is live.
        Some(n) => unsafe { (*n.as_ptr()).color == Color::Red },
        None => false,
    }
}

/// True if `link` is nil or refers to a black node.
///
/// # Safety
///
/// Same as [`is_red`].
#[inline]
pub unsafe fn is_black<T>(link: Link<T>) -> bool {
    // SAFETY: forwarded contract.
    unsafe { !is_red(link) }
}

/// Walks parent links up to the root of the tree containing `node`.
///
/// # Safety
///
/// `node` must point to a live node in a consistent tree.
pub unsafe fn get_root<T>(node: NonNull<TreeNode<T>>) -> NonNull<TreeNode<T>> {
    let mut it = node;
    // SAFETY: parent links of a consistent tree terminate at the root.
    unsafe {
        while let Some(p) = (*it.as_ptr()).parent {
            it = p;
        }
    }
    it
}

/// Leftmost node of the subtree rooted at `node`.
///
/// # Safety
///
/// `node` must point to a live node in a consistent tree.
pub unsafe fn subtree_min<T>(node: NonNull<TreeNode<T>>) -> NonNull<TreeNode<T>> {
    let mut it = node;
    // SAFETY: left links of a consistent tree are acyclic.
    unsafe {
        while let Some(l) = (*it.as_ptr()).left {
            it = l;
        }
    }
    it
}

/// Rightmost node of the subtree rooted at `node`.
///
/// # Safety
///
/// `node` must point to a live node in a consistent tree.
pub unsafe fn subtree_max<T>(node: NonNull<TreeNode<T>>) -> NonNull<TreeNode<T>> {
    let mut it = node;
    // SAFETY: right links of a consistent tree are acyclic.
    unsafe {
        while let Some(r) = (*it.as_ptr()).right {
            it = r;
        }
    }
    it
}

/// Rotates left around `pivot`. `pivot` must have a right child.
///
/// Only structure links move; the in-order chain is unaffected by
/// rotations.
///
/// # Safety
///
/// `pivot` must point to a live node with a live right child.
pub unsafe fn rotate_left<T>(pivot: NonNull<TreeNode<T>>) {
    let p = pivot.as_ptr();
    // SAFETY: caller guarantees pivot and its right child are live; all
    // other touched nodes are reached through consistent links.
    unsafe {
        let grand = (*p).parent;
        let node = (*p).right.expect("rotate_left needs a right child");
        let n = node.as_ptr();
        let child = (*n).left;

        (*p).parent = Some(node);
        (*n).parent = grand;
        if let Some(g) = grand {
            let g = g.as_ptr();
            if (*g).left == Some(pivot) {
                (*g).left = Some(node);
            } else {
                (*g).right = Some(node);
            }
        }

        (*n).left = Some(pivot);
        (*p).right = child;
        if let Some(c) = child {
            (*c.as_ptr()).parent = Some(pivot);
        }
    }
}

/// Rotates right around `pivot`. `pivot` must have a left child.
///
/// # Safety
///
/// `pivot` must point to a live node with a live left child.
pub unsafe fn rotate_right<T>(pivot: NonNull<TreeNode<T>>) {
    let p = pivot.as_ptr();
    // SAFETY: mirror of `rotate_left`.
    unsafe {
        let grand = (*p).parent;
        let node = (*p).left.expect("rotate_right needs a left child");
        let n = node.as_ptr();
        let child = (*n).right;

        (*p).parent = Some(node);
        (*n).parent = grand;
        if let Some(g) = grand {
            let g = g.as_ptr();
            if (*g).right == Some(pivot) {
                (*g).right = Some(node);
            } else {
                (*g).left = Some(node);
            }
        }

        (*n).right = Some(pivot);
        (*p).left = child;
        if let Some(c) = child {
            (*c.as_ptr()).parent = Some(pivot);
        }
    }
}

/// Links the detached node `child` as the left child of `parent`, splicing
/// it into the in-order chain just before `parent`.
///
/// # Safety
///
/// `parent` must be live with no left child; `child` must be live,
/// detached (all links nil) and ordered immediately before `parent`.
unsafe fn set_left_child<T>(parent: NonNull<TreeNode<T>>, child: NonNull<TreeNode<T>>) {
    let p = parent.as_ptr();
    let c = child.as_ptr();
    // SAFETY: both nodes are live; chain neighbours are reached through
    // consistent links.
    unsafe {
        debug_assert!((*p).left.is_none());
        (*p).left = Some(child);
        (*c).parent = Some(parent);
        (*c).next = Some(parent);
        let prev = (*p).prev;
        (*c).prev = prev;
        if let Some(pv) = prev {
            (*pv.as_ptr()).next = Some(child);
        }
        (*p).prev = Some(child);
    }
}

/// Links the detached node `child` as the right child of `parent`, splicing
/// it into the in-order chain just after `parent`.
///
/// # Safety
///
/// `parent` must be live with no right child; `child` must be live,
/// detached and ordered immediately after `parent`.
unsafe fn set_right_child<T>(parent: NonNull<TreeNode<T>>, child: NonNull<TreeNode<T>>) {
    let p = parent.as_ptr();
    let c = child.as_ptr();
    // SAFETY: mirror of `set_left_child`.
    unsafe {
        debug_assert!((*p).right.is_none());
        (*p).right = Some(child);
        (*c).parent = Some(parent);
        (*c).prev = Some(parent);
        let next = (*p).next;
        (*c).next = next;
        if let Some(nx) = next {
            (*nx.as_ptr()).prev = Some(child);
        }
        (*p).next = Some(child);
    }
}

/// Restores the red-black invariants after `node` was inserted red.
///
/// Recolors while the uncle is red, climbing to the grandparent; rotates
/// once or twice when the uncle is black.
///
/// # Safety
///
/// `node` must be a live red node freshly linked into an otherwise valid
/// tree.
pub unsafe fn repair_inserted<T>(node: NonNull<TreeNode<T>>) {
    let n = node.as_ptr();
    // SAFETY: all nodes touched are reached through consistent links of a
    // tree that is valid except for the freshly inserted red node.
    unsafe {
        let Some(parent) = (*n).parent else {
            (*n).color = Color::Black;
            return;
        };
        if is_black(Some(parent)) {
            return;
        }

        // A red parent cannot be the root, so a grandparent exists.
        let grand = (*parent.as_ptr())
            .parent
            .expect("red node cannot be the root");
        let g = grand.as_ptr();
        let parent_is_left = (*g).left == Some(parent);
        let uncle = if parent_is_left { (*g).right } else { (*g).left };

        if is_red(uncle) {
            let u = uncle.expect("red uncle is non-nil");
            (*u.as_ptr()).color = Color::Black;
            (*parent.as_ptr()).color = Color::Black;
            (*g).color = Color::Red;
            repair_inserted(grand);
        } else {
            let mut node = node;
            let mut parent = parent;
            if parent_is_left {
                if (*parent.as_ptr()).right == Some(node) {
                    rotate_left(parent);
                    core::mem::swap(&mut node, &mut parent);
                }
                rotate_right(grand);
            } else {
                if (*parent.as_ptr()).left == Some(node) {
                    rotate_right(parent);
                    core::mem::swap(&mut node, &mut parent);
                }
                rotate_left(grand);
            }
            (*parent.as_ptr()).color = Color::Black;
            (*g).color = Color::Red;
        }
    }
}

/// Restores the red-black invariants after a black node was spliced out,
/// leaving `node` (possibly nil) in its place under `parent`.
///
/// Implements the six deletion cases, climbing toward the root while the
/// double-black cannot be resolved locally.
///
/// # Safety
///
/// `node`/`parent` must describe a live splice point of an otherwise valid
/// tree: `node` is the replacement child (or nil) and `parent` its parent
/// (nil only when the replacement is the whole tree).
pub unsafe fn repair_removed<T>(node: Link<T>, parent: Link<T>) {
    // SAFETY: every dereference below follows consistent links of the tree
    // being repaired; sibling/nephew existence follows from the black-height
    // invariant that held before the removal.
    unsafe {
        let Some(parent) = parent else {
            // Replacement became the root (or the tree is empty).
            if let Some(n) = node {
                (*n.as_ptr()).color = Color::Black;
            }
            return;
        };
        if is_red(node) {
            // A red replacement absorbs the missing black.
            (*node.expect("red link is non-nil").as_ptr()).color = Color::Black;
            return;
        }

        let p = parent.as_ptr();
        if (*p).left == node {
            let mut sibling = (*p).right;
            if is_red(sibling) {
                let s = sibling.expect("red link is non-nil");
                (*s.as_ptr()).color = Color::Black;
                (*p).color = Color::Red;
                rotate_left(parent);
                sibling = (*p).right;
            }

            let s = sibling.expect("double-black node has a sibling");
            let sp = s.as_ptr();
            if is_black((*sp).left) && is_black((*sp).right) {
                (*sp).color = Color::Red;
                repair_removed(Some(parent), (*p).parent);
            } else {
                let mut s = s;
                if is_red((*s.as_ptr()).left) {
                    // Rotate the near nephew outward.
                    (*s.as_ptr()).color = Color::Red;
                    (*(*s.as_ptr()).left.expect("red link is non-nil").as_ptr()).color =
                        Color::Black;
                    rotate_right(s);
                    s = (*s.as_ptr()).parent.expect("rotation gave the sibling a parent");
                }
                (*s.as_ptr()).color = (*p).color;
                (*p).color = Color::Black;
                (*(*s.as_ptr()).right.expect("far nephew is red").as_ptr()).color = Color::Black;
                rotate_left(parent);
            }
        } else {
            let mut sibling = (*p).left;
            if is_red(sibling) {
                let s = sibling.expect("red link is non-nil");
                (*s.as_ptr()).color = Color::Black;
                (*p).color = Color::Red;
                rotate_right(parent);
                sibling = (*p).left;
            }

            let s = sibling.expect("double-black node has a sibling");
            let sp = s.as_ptr();
            if is_black((*sp).right) && is_black((*sp).left) {
                (*sp).color = Color::Red;
                repair_removed(Some(parent), (*p).parent);
            } else {
                let mut s = s;
                if is_red((*s.as_ptr()).right) {
                    (*s.as_ptr()).color = Color::Red;
                    (*(*s.as_ptr()).right.expect("red link is non-nil").as_ptr()).color =
                        Color::Black;
                    rotate_left(s);
                    s = (*s.as_ptr()).parent.expect("rotation gave the sibling a parent");
                }
                (*s.as_ptr()).color = (*p).color;
                (*p).color = Color::Black;
                (*(*s.as_ptr()).left.expect("far nephew is red").as_ptr()).color = Color::Black;
                rotate_right(parent);
            }
        }
    }
}

/// Standard BST descent. Returns the first node the policy reports equal,
/// or nil.
///
/// # Safety
///
/// `root`, when non-nil, must point to a live, consistent tree.
pub unsafe fn find<T, F>(root: Link<T>, mut policy: F) -> Link<T>
where
    F: FnMut(&T) -> Ordering,
{
    let mut it = root;
    // SAFETY: descent follows consistent links.
    unsafe {
        while let Some(n) = it {
            it = match policy(&(*n.as_ptr()).value) {
                Ordering::Less => (*n.as_ptr()).left,
                Ordering::Greater => (*n.as_ptr()).right,
                Ordering::Equal => return Some(n),
            };
        }
    }
    None
}

/// Last node visited on a policy-guided descent, ties breaking left.
/// Nil only when the tree is empty.
///
/// # Safety
///
/// `root`, when non-nil, must point to a live, consistent tree.
pub unsafe fn bisect_left<T, F>(root: Link<T>, mut policy: F) -> Link<T>
where
    F: FnMut(&T) -> Ordering,
{
    let mut it = root?;
    // SAFETY: descent follows consistent links.
    unsafe {
        loop {
            let step = match policy(&(*it.as_ptr()).value) {
                Ordering::Greater => (*it.as_ptr()).right,
                _ => (*it.as_ptr()).left,
            };
            match step {
                Some(n) => it = n,
                None => return Some(it),
            }
        }
    }
}

/// Last node visited on a policy-guided descent, ties breaking right.
/// Nil only when the tree is empty.
///
/// # Safety
///
/// `root`, when non-nil, must point to a live, consistent tree.
pub unsafe fn bisect_right<T, F>(root: Link<T>, mut policy: F) -> Link<T>
where
    F: FnMut(&T) -> Ordering,
{
    let mut it = root?;
    // SAFETY: descent follows consistent links.
    unsafe {
        loop {
            let step = match policy(&(*it.as_ptr()).value) {
                Ordering::Less => (*it.as_ptr()).left,
                _ => (*it.as_ptr()).right,
            };
            match step {
                Some(n) => it = n,
                None => return Some(it),
            }
        }
    }
}

/// First in-order node not ordered before the key, or nil when every node
/// is.
///
/// # Safety
///
/// `root`, when non-nil, must point to a live, consistent tree.
pub unsafe fn lower_bound<T, F>(root: Link<T>, mut policy: F) -> Link<T>
where
    F: FnMut(&T) -> Ordering,
{
    // SAFETY: forwarded contract; the bisect result is a live node.
    unsafe {
        let b = bisect_left(root, &mut policy)?;
        if policy(&(*b.as_ptr()).value) == Ordering::Greater {
            (*b.as_ptr()).next
        } else {
            Some(b)
        }
    }
}

/// Last in-order node not ordered after the key, or nil when every node
/// is.
///
/// # Safety
///
/// `root`, when non-nil, must point to a live, consistent tree.
pub unsafe fn upper_bound<T, F>(root: Link<T>, mut policy: F) -> Link<T>
where
    F: FnMut(&T) -> Ordering,
{
    // SAFETY: forwarded contract; the bisect result is a live node.
    unsafe {
        let b = bisect_right(root, &mut policy)?;
        if policy(&(*b.as_ptr()).value) == Ordering::Less {
            (*b.as_ptr()).prev
        } else {
            Some(b)
        }
    }
}

/// Inserts the detached node `node`, keeping duplicates, and returns the
/// new root.
///
/// The descent ties right, so equal keys preserve insertion order along
/// the chain. The node is linked, threaded, colored red and repaired.
///
/// # Safety
///
/// `node` must be live and detached (as produced by [`TreeNode::new`]);
/// `root`, when non-nil, must point to a live, consistent tree; the policy
/// must order the new node's key.
pub unsafe fn insert<T, F>(
    root: Link<T>,
    node: NonNull<TreeNode<T>>,
    mut policy: F,
) -> NonNull<TreeNode<T>>
where
    F: FnMut(&T) -> Ordering,
{
    // SAFETY: descent and link updates follow consistent links; the new
    // node is detached so linking it cannot form a cycle.
    unsafe {
        let Some(top) = root else {
            (*node.as_ptr()).color = Color::Black;
            return node;
        };

        let mut it = top;
        loop {
            if policy(&(*it.as_ptr()).value) == Ordering::Less {
                match (*it.as_ptr()).left {
                    Some(l) => it = l,
                    None => {
                        set_left_child(it, node);
                        break;
                    }
                }
            } else {
                match (*it.as_ptr()).right {
                    Some(r) => it = r,
                    None => {
                        set_right_child(it, node);
                        break;
                    }
                }
            }
        }
        repair_inserted(node);
        get_root(node)
    }
}

/// Find-or-insert that overwrites on a match.
///
/// On a key match the new payload is moved into the existing node and the
/// caller's node is handed back as `spare`, holding the displaced payload.
/// Otherwise inserts like [`insert`].
///
/// # Safety
///
/// Same contract as [`insert`].
pub unsafe fn insert_unique<T, F>(
    root: Link<T>,
    node: NonNull<TreeNode<T>>,
    mut policy: F,
) -> InsertOutcome<T>
where
    F: FnMut(&T) -> Ordering,
{
    // SAFETY: forwarded contract; `existing` and `node` are distinct live
    // nodes, so the value swap does not alias.
    unsafe {
        if let Some(existing) = find(root, &mut policy) {
            core::mem::swap(
                &mut (*existing.as_ptr()).value,
                &mut (*node.as_ptr()).value,
            );
            return InsertOutcome {
                root: root.expect("a match implies a non-empty tree"),
                node: existing,
                spare: Some(node),
            };
        }
        let root = insert(root, node, policy);
        InsertOutcome {
            root,
            node,
            spare: None,
        }
    }
}

/// Find-or-insert that keeps the existing payload on a match.
///
/// On a key match the caller's node is handed back untouched as `spare`.
///
/// # Safety
///
/// Same contract as [`insert`].
pub unsafe fn find_or_insert<T, F>(
    root: Link<T>,
    node: NonNull<TreeNode<T>>,
    mut policy: F,
) -> InsertOutcome<T>
where
    F: FnMut(&T) -> Ordering,
{
    // SAFETY: forwarded contract.
    unsafe {
        if let Some(existing) = find(root, &mut policy) {
            return InsertOutcome {
                root: root.expect("a match implies a non-empty tree"),
                node: existing,
                spare: Some(node),
            };
        }
        let root = insert(root, node, policy);
        InsertOutcome {
            root,
            node,
            spare: None,
        }
    }
}

/// Unlinks `node` from its tree and chain, repairing colors, and reports
/// the new root plus the removed node's in-order successor.
///
/// A node with two children first exchanges its structural record (links
/// and color, not the value) with its in-order successor, so the payload
/// of every other node stays at a stable address.
///
/// After the call the node is fully detached (all links nil, color red)
/// and still owns its value; disposal is the caller's business.
///
/// # Safety
///
/// `node` must be a live node of a valid tree.
pub unsafe fn remove<T>(node: NonNull<TreeNode<T>>) -> RemoveOutcome<T> {
    let n = node.as_ptr();
    // SAFETY: all link updates follow consistent links of the node's tree.
    unsafe {
        // The successor outlives the removal; capture it before any record
        // swap rearranges the chain.
        let next = (*n).next;
        if (*n).left.is_some() && (*n).right.is_some() {
            let succ = next.expect("a node with a right child has a successor");
            swap_with_successor(node, succ);
        }

        let parent = (*n).parent;
        let repl = (*n).left.or((*n).right);

        // Splice out of the chain.
        if let Some(pv) = (*n).prev {
            (*pv.as_ptr()).next = (*n).next;
        }
        if let Some(nx) = (*n).next {
            (*nx.as_ptr()).prev = (*n).prev;
        }

        // Splice out of the structure.
        if let Some(p) = parent {
            if (*p.as_ptr()).left == Some(node) {
                (*p.as_ptr()).left = repl;
            } else {
                (*p.as_ptr()).right = repl;
            }
        }
        if let Some(r) = repl {
            (*r.as_ptr()).parent = parent;
        }

        let was_black = (*n).color == Color::Black;
        if was_black {
            repair_removed(repl, parent);
        }

        // Detach fully so the node can be reused or disposed.
        (*n).parent = None;
        (*n).left = None;
        (*n).right = None;
        (*n).next = None;
        (*n).prev = None;
        (*n).color = Color::Red;

        let anchor = parent.or(repl);
        RemoveOutcome {
            root: anchor.map(|a| get_root(a)),
            next,
        }
    }
}

/// Exchanges the structural records of a two-child node and its in-order
/// successor: structure links, chain links and colors move; the values do
/// not.
///
/// # Safety
///
/// `succ` must be the in-order successor of `node`, and `node` must have
/// two children (hence `succ` has no left child and lies in `node`'s right
/// subtree).
unsafe fn swap_with_successor<T>(node: NonNull<TreeNode<T>>, succ: NonNull<TreeNode<T>>) {
    let n = node.as_ptr();
    let s = succ.as_ptr();
    // SAFETY: the two nodes are distinct and live; every neighbour is
    // reached through consistent links.
    unsafe {
        debug_assert!((*s).left.is_none());
        debug_assert_eq!((*n).next, Some(succ));

        let n_parent = (*n).parent;
        let n_left = (*n).left;
        let n_right = (*n).right;
        let s_parent = (*s).parent;
        let s_right = (*s).right;

        {
            let tmp = (*n).color;
            (*n).color = (*s).color;
            (*s).color = tmp;
        }

        // Chain: ...before, node, succ, after... -> ...before, succ, node, after...
        let before = (*n).prev;
        let after = (*s).next;
        (*s).prev = before;
        if let Some(b) = before {
            (*b.as_ptr()).next = Some(succ);
        }
        (*s).next = Some(node);
        (*n).prev = Some(succ);
        (*n).next = after;
        if let Some(a) = after {
            (*a.as_ptr()).prev = Some(node);
        }

        // Structure.
        (*s).parent = n_parent;
        (*s).left = n_left;
        if let Some(l) = n_left {
            (*l.as_ptr()).parent = Some(succ);
        }
        if s_parent == Some(node) {
            // The successor was node's right child.
            (*s).right = Some(node);
            (*n).parent = Some(succ);
        } else {
            (*s).right = n_right;
            if let Some(r) = n_right {
                (*r.as_ptr()).parent = Some(succ);
            }
            (*n).parent = s_parent;
            // A successor deeper than the right child is always a left child.
            (*s_parent.expect("deep successor has a parent").as_ptr()).left = Some(node);
        }
        (*n).left = None;
        (*n).right = s_right;
        if let Some(r) = s_right {
            (*r.as_ptr()).parent = Some(node);
        }
        if let Some(p) = n_parent {
            if (*p.as_ptr()).left == Some(node) {
                (*p.as_ptr()).left = Some(succ);
            } else {
                (*p.as_ptr()).right = Some(succ);
            }
        }
    }
}
