use core::borrow::Borrow;

use log::{debug, trace};

use super::handle::Handle;
use super::node::Side;
use super::search_tree::{RawSearchTree, SearchResult};

/// The AVL engine backing `AvlTreeMap`.
///
/// Structural work (descending, attaching, splicing, swapping) is delegated to
/// the underlying [`RawSearchTree`]; this layer owns the balance bookkeeping
/// and the rotations that keep every node's balance in `-1..=1`.
#[derive(Clone)]
pub(crate) struct RawAvlTree<K, V> {
    tree: RawSearchTree<K, V>,
}

#[inline]
fn is_balanced(balance: i8) -> bool {
    (-1..=1).contains(&balance)
}

impl<K, V> RawAvlTree<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            tree: RawSearchTree::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: RawSearchTree::with_capacity(capacity),
        }
    }

    /// Read access to the underlying search tree for lookups and iteration.
    #[inline]
    pub(crate) const fn tree(&self) -> &RawSearchTree<K, V> {
        &self.tree
    }

    #[inline]
    pub(crate) fn tree_mut(&mut self) -> &mut RawSearchTree<K, V> {
        &mut self.tree
    }

    /// Height of the whole tree; zero when empty.
    pub(crate) fn height(&self) -> usize {
        self.tree.root().map_or(0, |root| usize::from(self.tree.node(root).height()))
    }

    fn height_of(&self, link: Option<Handle>) -> u8 {
        link.map_or(0, |handle| self.tree.node(handle).height())
    }

    /// Recomputes `height` and `balance` of `handle` from its children.
    fn update_balance(&mut self, handle: Handle) {
        let node = self.tree.node(handle);
        let left = self.height_of(node.left());
        let right = self.height_of(node.right());
        let balance = i16::from(right) - i16::from(left);
        debug_assert!((-2..=2).contains(&balance), "`RawAvlTree::update_balance()` - balance {balance} out of range!");

        let node = self.tree.node_mut(handle);
        node.set_height(1 + left.max(right));
        #[allow(clippy::cast_possible_truncation)]
        node.set_balance(balance as i8);
    }

    /// Rotates the subtree at `x` so that `x` moves down to side `down` and
    /// its child on the opposite side takes its place.
    ///
    /// A no-op when that child is missing.
    fn rotate(&mut self, x: Handle, down: Side) {
        let up = down.opposite();
        let Some(y) = self.tree.node(x).child(up) else {
            return;
        };
        let parent = self.tree.node(x).parent();
        let inner = self.tree.node(y).child(down);

        self.tree.replace_child(parent, x, Some(y));

        self.tree.node_mut(y).set_child(down, Some(x));
        self.tree.node_mut(x).set_parent(Some(y));

        self.tree.node_mut(x).set_child(up, inner);
        if let Some(inner) = inner {
            self.tree.node_mut(inner).set_parent(Some(x));
        }

        // `y`'s height depends on `x`'s.
        self.update_balance(x);
        self.update_balance(y);
    }

    /// Promotes the right child of `x` into its place.
    fn rotate_left(&mut self, x: Handle) {
        trace!("rotate_left at {x:?}");
        self.rotate(x, Side::Left);
    }

    /// Promotes the left child of `x` into its place.
    fn rotate_right(&mut self, x: Handle) {
        trace!("rotate_right at {x:?}");
        self.rotate(x, Side::Right);
    }

    /// Restores the AVL invariant at a node whose balance reached -2 or +2.
    fn rebalance(&mut self, handle: Handle) {
        self.update_balance(handle);
        match self.tree.node(handle).balance() {
            -2 => {
                let left = self.tree.node(handle).left().expect("`RawAvlTree::rebalance()` - left-heavy node has no left child!");
                self.update_balance(left);
                if self.tree.node(left).balance() <= 0 {
                    trace!("left-left imbalance at {handle:?}");
                    self.rotate_right(handle);
                } else {
                    trace!("left-right imbalance at {handle:?}");
                    self.rotate_left(left);
                    self.rotate_right(handle);
                }
            }
            2 => {
                let right =
                    self.tree.node(handle).right().expect("`RawAvlTree::rebalance()` - right-heavy node has no right child!");
                self.update_balance(right);
                if self.tree.node(right).balance() >= 0 {
                    trace!("right-right imbalance at {handle:?}");
                    self.rotate_left(handle);
                } else {
                    trace!("right-left imbalance at {handle:?}");
                    self.rotate_right(right);
                    self.rotate_left(handle);
                }
            }
            _ => {}
        }
    }

    /// Swaps the tree positions of two nodes together with the balance
    /// bookkeeping that belongs to those positions.
    fn node_swap(&mut self, a: Handle, b: Handle) {
        self.tree.swap_positions(a, b);

        let (a_balance, a_height) = {
            let node = self.tree.node(a);
            (node.balance(), node.height())
        };
        let (b_balance, b_height) = {
            let node = self.tree.node(b);
            (node.balance(), node.height())
        };

        let node = self.tree.node_mut(a);
        node.set_balance(b_balance);
        node.set_height(b_height);
        let node = self.tree.node_mut(b);
        node.set_balance(a_balance);
        node.set_height(a_height);
    }

    pub(crate) fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K: Ord, V> RawAvlTree<K, V> {
    /// Inserts a key-value pair, returning the previous value if the key was
    /// already present. Overwriting never changes the tree's shape.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let slot = match self.tree.search(&key) {
            SearchResult::Found(handle) => return Some(self.tree.node_mut(handle).replace_value(value)),
            SearchResult::Vacant(slot) => slot,
        };

        let handle = self.tree.attach(slot, key, value);
        debug!("inserted {handle:?} (len {})", self.tree.len());

        // A single insertion creates at most one violation; fixing it restores
        // the subtree's previous height, so nothing above needs a look.
        let mut current = self.tree.node(handle).parent();
        while let Some(ancestor) = current {
            self.update_balance(ancestor);
            if !is_balanced(self.tree.node(ancestor).balance()) {
                self.rebalance(ancestor);
                break;
            }
            current = self.tree.node(ancestor).parent();
        }
        None
    }

    /// Removes a key, returning the stored key and value if it was present.
    pub(crate) fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let target = self.tree.find(key)?;

        if self.tree.node(target).has_two_children() {
            let predecessor = self
                .tree
                .predecessor(target)
                .expect("`RawAvlTree::remove_entry()` - node with a left child has no predecessor!");
            self.node_swap(target, predecessor);
        }

        let parent = self.tree.node(target).parent();
        let entry = self.tree.splice_out(target);
        debug!("removed {target:?} (len {})", self.tree.len());

        // Removal can shorten a subtree all the way up, so walk to the root.
        // After a rotation, continue from the node's pre-rotation parent.
        let mut current = parent;
        while let Some(ancestor) = current {
            self.update_balance(ancestor);
            let above = self.tree.node(ancestor).parent();
            if !is_balanced(self.tree.node(ancestor).balance()) {
                self.rebalance(ancestor);
            }
            current = above;
        }
        Some(entry)
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    /// (key, parent key, balance, height) for each node, in key order.
    type Shape<K> = Vec<(K, Option<K>, i8, u8)>;

    impl<K: Ord + Clone + core::fmt::Debug, V> RawAvlTree<K, V> {
        /// Validates every structural and AVL invariant. Panics with a
        /// descriptive message listing each violation.
        pub(crate) fn validate_invariants(&self) {
            let mut errors: Vec<String> = Vec::new();
            let mut keys: Vec<K> = Vec::new();

            if let Some(root) = self.tree.root() {
                if self.tree.node(root).parent().is_some() {
                    errors.push(alloc::format!("root {root:?} has a parent"));
                }
            }
            self.validate_node(self.tree.root(), &mut keys, &mut errors);

            for pair in keys.windows(2) {
                if pair[0] >= pair[1] {
                    errors.push(alloc::format!("keys out of order: {:?} then {:?}", pair[0], pair[1]));
                }
            }
            if keys.len() != self.tree.len() {
                errors.push(alloc::format!("len mismatch: reachable={}, arena={}", keys.len(), self.tree.len()));
            }

            assert!(errors.is_empty(), "AVL invariant violations:\n{}", errors.join("\n"));
        }

        /// Returns the measured height of the subtree.
        fn validate_node(&self, link: Option<Handle>, keys: &mut Vec<K>, errors: &mut Vec<String>) -> u8 {
            let Some(handle) = link else {
                return 0;
            };
            let node = self.tree.node(handle);
            for child in [node.left(), node.right()].into_iter().flatten() {
                if self.tree.node(child).parent() != Some(handle) {
                    errors.push(alloc::format!("child {child:?} does not point back at {handle:?}"));
                }
            }

            let left = self.validate_node(node.left(), keys, errors);
            keys.push(node.key().clone());
            let right = self.validate_node(node.right(), keys, errors);

            let height = 1 + left.max(right);
            let balance = right as i8 - left as i8;
            if node.height() != height {
                errors.push(alloc::format!("{handle:?}: cached height {} != measured {height}", node.height()));
            }
            if node.balance() != balance {
                errors.push(alloc::format!("{handle:?}: stored balance {} != measured {balance}", node.balance()));
            }
            if !is_balanced(balance) {
                errors.push(alloc::format!("{handle:?}: balance {balance} out of range"));
            }
            height
        }

        fn shape(&self) -> Shape<K> {
            let mut shape = Vec::new();
            let mut current = self.tree.first();
            while let Some(handle) = current {
                let node = self.tree.node(handle);
                let parent = node.parent().map(|p| self.tree.node(p).key().clone());
                shape.push((node.key().clone(), parent, node.balance(), node.height()));
                current = self.tree.successor(handle);
            }
            shape
        }

        fn root_key(&self) -> Option<&K> {
            self.tree.root().map(|root| self.tree.node(root).key())
        }

        fn child_keys(&self, key: &K) -> (Option<&K>, Option<&K>) {
            let node = self.tree.node(self.tree.find(key).expect("key should be present"));
            let key_of = |link: Option<Handle>| link.map(|h| self.tree.node(h).key());
            (key_of(node.left()), key_of(node.right()))
        }
    }

    fn build(keys: &[i32]) -> RawAvlTree<i32, i32> {
        let mut tree = RawAvlTree::new();
        for &key in keys {
            tree.insert(key, key * 10);
            tree.validate_invariants();
        }
        tree
    }

    #[test]
    fn ascending_triple_rotates_once() {
        let tree = build(&[1, 2, 3]);
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(tree.child_keys(&2), (Some(&1), Some(&3)));
        assert!(tree.shape().iter().all(|&(_, _, balance, _)| balance == 0));
    }

    #[test]
    fn descending_triple_then_smaller_key() {
        let mut tree = build(&[3, 2, 1]);
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(tree.height(), 2);

        tree.insert(0, 0);
        tree.validate_invariants();
        let keys: Vec<i32> = tree.shape().into_iter().map(|(key, ..)| key).collect();
        assert_eq!(keys, vec![0, 1, 2, 3]);
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(tree.height(), 3);
    }

    #[test]
    fn left_right_double_rotation() {
        let tree = build(&[3, 1, 2]);
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(tree.child_keys(&2), (Some(&1), Some(&3)));
    }

    #[test]
    fn right_left_double_rotation() {
        let tree = build(&[1, 3, 2]);
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(tree.child_keys(&2), (Some(&1), Some(&3)));
    }

    #[test]
    fn overwrite_changes_only_the_value() {
        let mut tree = build(&[5, 2, 8, 1, 9, 7]);
        let before = tree.shape();

        assert_eq!(tree.insert(8, -1), Some(80));
        assert_eq!(tree.shape(), before);
        let handle = tree.tree().find(&8).unwrap();
        assert_eq!(*tree.tree().node(handle).value(), -1);
        assert_eq!(*tree.tree().node(tree.tree().find(&7).unwrap()).value(), 70);
    }

    #[test]
    fn remove_absent_key_is_a_no_op() {
        let mut tree = build(&[4, 2, 6, 1, 3]);
        let before = tree.shape();
        assert_eq!(tree.remove(&5), None);
        assert_eq!(tree.shape(), before);
        assert_eq!(tree.tree().len(), 5);
    }

    #[test]
    fn remove_node_with_two_children_uses_predecessor() {
        let mut tree = build(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(tree.root_key(), Some(&4));

        assert_eq!(tree.remove_entry(&4), Some((4, 40)));
        tree.validate_invariants();
        assert_eq!(tree.root_key(), Some(&3));
        assert_eq!(tree.child_keys(&3), (Some(&2), Some(&6)));
        assert_eq!(tree.child_keys(&2), (Some(&1), None));
    }

    #[test]
    fn remove_cascades_rotations_to_the_root() {
        // Level order of a minimal AVL tree of height 5; no rotations on the way in.
        let mut tree = build(&[8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1]);
        assert_eq!(tree.root_key(), Some(&8));
        assert_eq!(tree.height(), 5);

        // Rotates at 11, then again at 8.
        tree.remove(&12);
        tree.validate_invariants();
        assert_eq!(tree.root_key(), Some(&5));
        assert_eq!(tree.child_keys(&8), (Some(&7), Some(&10)));
        assert_eq!(tree.child_keys(&10), (Some(&9), Some(&11)));
        assert_eq!(tree.height(), 4);
    }

    #[test]
    fn removing_everything_frees_every_slot() {
        let keys: Vec<i32> = (0..64).map(|i| (i * 37) % 64).collect();
        let mut tree = build(&keys);
        for key in (0..64).rev() {
            assert_eq!(tree.remove(&key), Some(key * 10));
            tree.validate_invariants();
        }
        assert!(tree.tree().is_empty());
        assert_eq!(tree.tree().len(), 0);
        assert_eq!(tree.height(), 0);
    }

    #[test]
    fn node_swap_moves_balance_with_position() {
        let mut tree = build(&[4, 2, 6, 1, 3, 5, 7, 8]);
        let (six, five) = (tree.tree().find(&6).unwrap(), tree.tree().find(&5).unwrap());
        let (six_balance, six_height) = (tree.tree().node(six).balance(), tree.tree().node(six).height());

        tree.node_swap(six, five);
        assert_eq!(tree.tree().node(five).balance(), six_balance);
        assert_eq!(tree.tree().node(five).height(), six_height);
        assert_eq!(tree.tree().node(six).balance(), 0);
        assert_eq!(tree.tree().node(six).height(), 1);

        // Swap back so the search order is valid again.
        tree.node_swap(five, six);
        tree.validate_invariants();
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..1000).prop_map(Op::Insert),
            2 => (0i32..1000).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn invariants_hold_after_every_operation(ops in prop::collection::vec(op_strategy(), 0..400)) {
            let mut tree: RawAvlTree<i32, i32> = RawAvlTree::new();
            let mut model = alloc::collections::BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(key) => prop_assert_eq!(tree.insert(key, key * 2), model.insert(key, key * 2)),
                    Op::Remove(key) => prop_assert_eq!(tree.remove(&key), model.remove(&key)),
                }
                tree.validate_invariants();
            }
            prop_assert_eq!(tree.tree().len(), model.len());
        }

        #[test]
        fn height_stays_logarithmic(keys in prop::collection::vec(any::<i32>(), 1..1000)) {
            let mut tree: RawAvlTree<i32, ()> = RawAvlTree::new();
            for key in keys {
                tree.insert(key, ());
            }
            // AVL height is below 1.4405 * log2(n + 2); 1.5 * bit_length(n + 1) is looser.
            let n = tree.tree().len();
            let bit_length = (usize::BITS - (n + 1).leading_zeros()) as usize;
            prop_assert!(tree.height() <= 3 * bit_length / 2, "height {} for {} keys", tree.height(), n);
        }
    }
}
