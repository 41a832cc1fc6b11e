//! Checks whether every leaf of a binary tree sits at the same depth.
//!
//! This works on a plain owned binary tree and is unrelated to
//! [`AvlTreeMap`](crate::AvlTreeMap)'s balancing.
//!
//! # Example
//!
//! ```
//! use avl_tree::equal_paths::{TreeNode, equal_paths};
//!
//! // 1 -> 2 -> 3, a single path.
//! let chain = TreeNode::new(1).with_left(TreeNode::new(2).with_left(TreeNode::new(3)));
//! assert!(equal_paths(Some(&chain)));
//!
//! // Leaves at depths 1 and 2.
//! let lopsided = TreeNode::new(1)
//!     .with_left(TreeNode::new(2).with_left(TreeNode::new(3)))
//!     .with_right(TreeNode::new(4));
//! assert!(!equal_paths(Some(&lopsided)));
//! ```

use alloc::boxed::Box;

/// A node of a plain binary tree that owns its children.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TreeNode<T> {
    pub value: T,
    pub left: Option<Box<TreeNode<T>>>,
    pub right: Option<Box<TreeNode<T>>>,
}

impl<T> TreeNode<T> {
    /// Creates a leaf.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            value,
            left: None,
            right: None,
        }
    }

    /// Sets the left child, replacing any existing one.
    #[must_use]
    pub fn with_left(mut self, left: TreeNode<T>) -> Self {
        self.left = Some(Box::new(left));
        self
    }

    /// Sets the right child, replacing any existing one.
    #[must_use]
    pub fn with_right(mut self, right: TreeNode<T>) -> Self {
        self.right = Some(Box::new(right));
        self
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Returns `true` if every root-to-leaf path in the tree has the same length.
///
/// A node with a single child places no constraint on that node; only nodes
/// with two children compare their subtrees. An empty tree trivially passes.
///
/// # Complexity
///
/// O(n) time, O(height) stack. Stops at the first mismatch.
#[must_use]
pub fn equal_paths<T>(root: Option<&TreeNode<T>>) -> bool {
    root.is_none_or(|root| leaf_depth(root).is_some())
}

/// Height of the subtree if all of its leaves are equally deep, otherwise `None`.
fn leaf_depth<T>(node: &TreeNode<T>) -> Option<usize> {
    // `None` here is a missing child; a mismatch below returns early.
    let left = match node.left.as_deref() {
        Some(child) => Some(leaf_depth(child)?),
        None => None,
    };
    let right = match node.right.as_deref() {
        Some(child) => Some(leaf_depth(child)?),
        None => None,
    };

    let below = match (left, right) {
        (Some(left), Some(right)) if left != right => return None,
        (Some(depth), _) | (None, Some(depth)) => depth,
        (None, None) => 0,
    };
    Some(below + 1)
}
