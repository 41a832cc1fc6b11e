use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, Side};

/// Outcome of descending the tree looking for a key.
pub(crate) enum SearchResult {
    /// The key lives in this node.
    Found(Handle),
    /// The key is absent; it belongs in the empty child slot `side` of the
    /// given parent, or at the root when the tree is empty.
    Vacant(Option<(Handle, Side)>),
}

/// Plain (unbalanced) binary search tree over an arena of nodes.
///
/// Knows how to find, walk, attach, detach and swap nodes. It never looks at
/// `balance` or `height`; keeping those honest is the AVL layer's job.
#[derive(Clone)]
pub(crate) struct RawSearchTree<K, V> {
    nodes: Arena<Node<K, V>>,
    root: Option<Handle>,
}

impl<K, V> RawSearchTree<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V> {
        self.nodes.get_mut(handle)
    }

    /// Leftmost node of the subtree rooted at `handle`.
    pub(crate) fn leftmost(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.node(handle).left() {
            handle = left;
        }
        handle
    }

    /// Rightmost node of the subtree rooted at `handle`.
    pub(crate) fn rightmost(&self, mut handle: Handle) -> Handle {
        while let Some(right) = self.node(handle).right() {
            handle = right;
        }
        handle
    }

    pub(crate) fn first(&self) -> Option<Handle> {
        self.root.map(|root| self.leftmost(root))
    }

    pub(crate) fn last(&self) -> Option<Handle> {
        self.root.map(|root| self.rightmost(root))
    }

    /// In-order predecessor: the rightmost node of the left subtree, or else
    /// the nearest ancestor whose right subtree contains `handle`.
    pub(crate) fn predecessor(&self, handle: Handle) -> Option<Handle> {
        if let Some(left) = self.node(handle).left() {
            return Some(self.rightmost(left));
        }
        let mut current = handle;
        while let Some(parent) = self.node(current).parent() {
            if self.node(parent).right() == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// In-order successor; mirror image of [`predecessor`](Self::predecessor).
    pub(crate) fn successor(&self, handle: Handle) -> Option<Handle> {
        if let Some(right) = self.node(handle).right() {
            return Some(self.leftmost(right));
        }
        let mut current = handle;
        while let Some(parent) = self.node(current).parent() {
            if self.node(parent).left() == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Creates a node in a vacant slot found by [`search`](Self::search).
    pub(crate) fn attach(&mut self, slot: Option<(Handle, Side)>, key: K, value: V) -> Handle {
        let parent = slot.map(|(parent, _)| parent);
        let handle = self.nodes.alloc(Node::new(key, value, parent));
        match slot {
            None => {
                debug_assert!(self.root.is_none(), "`RawSearchTree::attach()` - root slot is occupied!");
                self.root = Some(handle);
            }
            Some((parent, side)) => {
                debug_assert!(
                    self.node(parent).child(side).is_none(),
                    "`RawSearchTree::attach()` - child slot is occupied!"
                );
                self.node_mut(parent).set_child(side, Some(handle));
            }
        }
        handle
    }

    /// Points the slot that holds `old` under `parent` (or the root slot) at
    /// `new`, and points `new` back at `parent`.
    pub(crate) fn replace_child(&mut self, parent: Option<Handle>, old: Handle, new: Option<Handle>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let side = self
                    .node(parent)
                    .side_of(old)
                    .expect("`RawSearchTree::replace_child()` - `old` is not a child of `parent`!");
                self.node_mut(parent).set_child(side, new);
            }
        }
        if let Some(new) = new {
            self.node_mut(new).set_parent(parent);
        }
    }

    /// Unlinks a node with at most one child, lifting that child into its
    /// slot, and frees the node.
    pub(crate) fn splice_out(&mut self, handle: Handle) -> (K, V) {
        let node = self.node(handle);
        assert!(!node.has_two_children(), "`RawSearchTree::splice_out()` - node has two children!");
        let parent = node.parent();
        let child = node.left().or(node.right());
        self.replace_child(parent, handle, child);
        self.nodes.release(handle).into_entry()
    }

    /// Exchanges the tree positions of two nodes. Keys and values stay with
    /// their nodes; only the links (and the root, if involved) change. Works
    /// when one node is the other's parent.
    pub(crate) fn swap_positions(&mut self, a: Handle, b: Handle) {
        if a == b {
            return;
        }
        let remap = |link: Option<Handle>| match link {
            Some(h) if h == a => Some(b),
            Some(h) if h == b => Some(a),
            other => other,
        };

        let (a_parent, a_left, a_right) = self.links(a);
        let (b_parent, b_left, b_right) = self.links(b);

        // Outside parents; siblings share one, which must be visited once.
        let mut outside = [a_parent, b_parent];
        if a_parent == b_parent {
            outside[1] = None;
        }
        for parent in outside.into_iter().flatten() {
            if parent == a || parent == b {
                continue;
            }
            let node = self.node_mut(parent);
            let (left, right) = (node.left(), node.right());
            node.set_left(remap(left));
            node.set_right(remap(right));
        }

        self.set_links(a, (remap(b_parent), remap(b_left), remap(b_right)));
        self.set_links(b, (remap(a_parent), remap(a_left), remap(a_right)));

        for handle in [a, b] {
            let node = self.node(handle);
            for child in [node.left(), node.right()].into_iter().flatten() {
                if child != a && child != b {
                    self.node_mut(child).set_parent(Some(handle));
                }
            }
        }

        self.root = remap(self.root);
    }

    fn links(&self, handle: Handle) -> (Option<Handle>, Option<Handle>, Option<Handle>) {
        let node = self.node(handle);
        (node.parent(), node.left(), node.right())
    }

    fn set_links(&mut self, handle: Handle, (parent, left, right): (Option<Handle>, Option<Handle>, Option<Handle>)) {
        let node = self.node_mut(handle);
        node.set_parent(parent);
        node.set_left(left);
        node.set_right(right);
    }

    /// True if no node's subtrees differ in height by more than one, measured
    /// by walking the whole tree.
    pub(crate) fn is_balanced(&self) -> bool {
        self.balanced_height(self.root).is_some()
    }

    fn balanced_height(&self, link: Option<Handle>) -> Option<usize> {
        let Some(handle) = link else {
            return Some(0);
        };
        let node = self.node(handle);
        let left = self.balanced_height(node.left())?;
        let right = self.balanced_height(node.right())?;
        (left.abs_diff(right) <= 1).then_some(1 + left.max(right))
    }

    /// Moves every entry out in key order, leaving the tree empty.
    pub(crate) fn drain_to_vec(&mut self) -> Vec<(K, V)> {
        let mut order = Vec::with_capacity(self.len());
        let mut current = self.first();
        while let Some(handle) = current {
            order.push(handle);
            current = self.successor(handle);
        }

        let entries: Vec<(K, V)> = order.into_iter().map(|handle| self.nodes.release(handle).into_entry()).collect();
        self.clear();
        entries
    }
}

impl<K: Ord, V> RawSearchTree<K, V> {
    /// Descends from the root comparing `key` against each visited node.
    pub(crate) fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(mut current) = self.root else {
            return SearchResult::Vacant(None);
        };

        loop {
            let node = self.node(current);
            let side = match key.cmp(node.key().borrow()) {
                Ordering::Equal => return SearchResult::Found(current),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            match node.child(side) {
                Some(child) => current = child,
                None => return SearchResult::Vacant(Some((current, side))),
            }
        }
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.search(key) {
            SearchResult::Found(handle) => Some(handle),
            SearchResult::Vacant(_) => None,
        }
    }
}
