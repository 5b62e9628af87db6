//! The B-tree node and its structural primitives.
//!
//! A node owns its key and payload arrays; children are shared through `Arc`.
//! Cloning a node therefore duplicates the arrays but not the subtrees, which
//! is what makes path-copying cheap: an edit clones only the nodes between
//! the root and the touched leaf.

use std::{ops::Range, sync::Arc};

use log::trace;

use super::KeySelector;

#[cfg(any(test, feature = "internal-api"))]
use crate::errors::ValidationError;

pub(crate) struct Node<K, V> {
    /// Maximum child fanout, identical for every node of one tree.
    pub(super) order: usize,
    pub(super) keys: Vec<K>,
    pub(super) values: Vec<V>,
    /// Empty for leaves, `keys.len() + 1` entries otherwise.
    pub(super) children: Vec<Arc<Node<K, V>>>,
    /// Cached element count of the whole subtree.
    pub(super) count: usize,
    /// Cached distance to the leaf level; 0 for leaves.
    pub(super) depth: usize,
}

impl<K: Clone, V: Clone> Clone for Node<K, V> {
    fn clone(&self) -> Self {
        Node {
            order: self.order,
            keys: self.keys.clone(),
            values: self.values.clone(),
            children: self.children.clone(),
            count: self.count,
            depth: self.depth,
        }
    }
}

/// The upper half of a node that overflowed, plus the element separating it
/// from the remaining lower half.
pub(super) struct Splinter<K, V> {
    pub(super) separator: (K, V),
    pub(super) node: Arc<Node<K, V>>,
}

/// Result of a key search within a single node.
pub(super) struct KeySlot {
    /// Slot holding the key, if this node contains a suitable occurrence.
    pub(super) matching: Option<usize>,
    /// Child slot to continue the search in.
    pub(super) descent: usize,
}

/// Result of locating a subtree-local position within a single node.
pub(super) enum PositionSlot {
    /// The position addresses the element in this slot.
    Element(usize),
    /// The position lies inside `children[slot]`, `local` elements into it.
    Child { slot: usize, local: usize },
}

/// Take exclusive ownership of a shared node, cloning it only when other
/// references exist. This is the copy-on-write pivot: every mutating descent
/// funnels through here.
pub(super) fn unshared<K: Clone, V: Clone>(node: Arc<Node<K, V>>) -> Node<K, V> {
    Arc::try_unwrap(node).unwrap_or_else(|shared| (*shared).clone())
}

/// Default fanout for a key type of the given size, aiming at roughly 8 KiB
/// of keys per node but never dropping below 32 children.
pub(crate) fn default_order(key_size: usize) -> usize {
    (8191 / key_size.max(1)).max(32)
}

impl<K: Ord + Clone, V: Clone> Node<K, V> {
    pub(super) fn leaf(order: usize) -> Self {
        debug_assert!(order >= 3);
        Node {
            order,
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
            count: 0,
            depth: 0,
        }
    }

    /// A fresh parent over two sibling subtrees of equal depth.
    pub(super) fn joined(left: Arc<Self>, separator: (K, V), right: Arc<Self>) -> Self {
        debug_assert_eq!(left.depth, right.depth);
        debug_assert_eq!(left.order, right.order);
        Node {
            order: left.order,
            depth: left.depth + 1,
            count: left.count + 1 + right.count,
            keys: vec![separator.0],
            values: vec![separator.1],
            children: vec![left, right],
        }
    }

    /// Carve the subtree covering the given slot range out of this node.
    ///
    /// The result contains `keys[range]` and, for internal nodes, the
    /// children surrounding them. An empty range on an internal node
    /// degenerates to the single child at the boundary, which is returned
    /// directly instead of wrapping it in a key-less parent.
    pub(super) fn from_slot_range(&self, range: Range<usize>) -> Arc<Self> {
        if range.is_empty() && !self.is_leaf() {
            return self.children[range.start].clone();
        }
        let children = if self.is_leaf() {
            Vec::new()
        } else {
            self.children[range.start..=range.end].to_vec()
        };
        let mut node = Node {
            order: self.order,
            keys: self.keys[range.clone()].to_vec(),
            values: self.values[range].to_vec(),
            children,
            count: 0,
            depth: self.depth,
        };
        node.recompute_count();
        Arc::new(node)
    }

    pub(super) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(super) fn max_keys(&self) -> usize {
        self.order - 1
    }

    pub(super) fn min_children(&self) -> usize {
        (self.order + 1) / 2
    }

    pub(super) fn min_keys(&self) -> usize {
        self.min_children() - 1
    }

    pub(super) fn is_overfull(&self) -> bool {
        self.keys.len() > self.max_keys()
    }

    pub(super) fn is_underfull(&self) -> bool {
        self.keys.len() < self.min_keys()
    }

    pub(super) fn recompute_count(&mut self) {
        self.count = self.keys.len() + self.children.iter().map(|c| c.count).sum::<usize>();
    }

    /// Largest key in the subtree, i.e. the last key of the rightmost leaf.
    pub(super) fn max_key(&self) -> &K {
        let mut node = self;
        loop {
            if node.is_leaf() {
                return node.keys.last().expect("max_key on an empty subtree");
            }
            node = node.children.last().expect("internal node without children");
        }
    }

    /// Binary search for `key` within this node's key array.
    ///
    /// `First` demands the leftmost occurrence and `Last` the rightmost, so
    /// their descent slots point into the child that may hold an even earlier
    /// (respectively later) duplicate. `Any` settles for whatever the plain
    /// binary search hits.
    pub(super) fn slot_of_key(&self, key: &K, selector: KeySelector) -> KeySlot {
        match selector {
            KeySelector::Any => match self.keys.binary_search(key) {
                Ok(slot) => KeySlot {
                    matching: Some(slot),
                    descent: slot,
                },
                Err(slot) => KeySlot {
                    matching: None,
                    descent: slot,
                },
            },
            KeySelector::First => {
                let slot = self.keys.partition_point(|k| k < key);
                KeySlot {
                    matching: (slot < self.keys.len() && self.keys[slot] == *key).then_some(slot),
                    descent: slot,
                }
            }
            KeySelector::Last => {
                let slot = self.keys.partition_point(|k| k <= key);
                KeySlot {
                    matching: (slot > 0 && self.keys[slot - 1] == *key).then_some(slot - 1),
                    descent: slot,
                }
            }
        }
    }

    /// Locate the subtree-local position `pos`.
    ///
    /// `pos` may be at most `count`; the one-past-the-end position resolves
    /// to the rightmost child (or the one-past-the-end slot of a leaf), which
    /// is where an append would land.
    pub(super) fn slot_of_position(&self, pos: usize) -> PositionSlot {
        debug_assert!(pos <= self.count);
        if self.is_leaf() {
            return PositionSlot::Element(pos);
        }
        let mut start = 0;
        for (slot, child) in self.children.iter().enumerate() {
            let end = start + child.count;
            if pos < end {
                return PositionSlot::Child {
                    slot,
                    local: pos - start,
                };
            }
            if pos == end && slot < self.keys.len() {
                return PositionSlot::Element(slot);
            }
            start = end + 1;
        }
        let last = self.children.len() - 1;
        PositionSlot::Child {
            slot: last,
            local: self.children[last].count,
        }
    }

    /// Subtree-local position of the element in `slot`.
    pub(super) fn position_of_slot(&self, slot: usize) -> usize {
        if self.is_leaf() {
            slot
        } else {
            slot + self.children[..=slot].iter().map(|c| c.count).sum::<usize>()
        }
    }

    /// Subtree-local position where `children[slot]` begins.
    pub(super) fn position_of_child(&self, slot: usize) -> usize {
        slot + self.children[..slot].iter().map(|c| c.count).sum::<usize>()
    }

    /// Split off the upper half, leaving the lower half in place.
    pub(super) fn split(&mut self) -> Splinter<K, V> {
        self.split_at(self.keys.len() / 2)
    }

    /// Split off everything above `median`; the element at `median` becomes
    /// the separator.
    pub(super) fn split_at(&mut self, median: usize) -> Splinter<K, V> {
        debug_assert!(median < self.keys.len());
        let keys = self.keys.drain(median + 1..).collect();
        let values = self.values.drain(median + 1..).collect();
        let children = if self.is_leaf() {
            Vec::new()
        } else {
            self.children.drain(median + 1..).collect()
        };
        let separator = (
            self.keys.pop().expect("split_at on an empty node"),
            self.values.pop().expect("split_at on an empty node"),
        );
        let mut right = Node {
            order: self.order,
            keys,
            values,
            children,
            count: 0,
            depth: self.depth,
        };
        right.recompute_count();
        self.recompute_count();
        Splinter {
            separator,
            node: Arc::new(right),
        }
    }

    /// Insert a splinter produced by splitting `children[slot]`: the
    /// separator lands in `slot`, the detached node right of it.
    pub(super) fn insert_splinter(&mut self, slot: usize, splinter: Splinter<K, V>) {
        debug_assert_eq!(self.depth, splinter.node.depth + 1);
        self.count += 1 + splinter.node.count;
        self.keys.insert(slot, splinter.separator.0);
        self.values.insert(slot, splinter.separator.1);
        self.children.insert(slot + 1, splinter.node);
    }

    /// Append `separator` and the contents of `other` to this node.
    /// Both nodes must sit at the same depth; the caller deals with overflow.
    pub(super) fn append_fused(&mut self, separator: (K, V), other: &Self) {
        debug_assert_eq!(self.depth, other.depth);
        self.keys.push(separator.0);
        self.values.push(separator.1);
        self.keys.extend_from_slice(&other.keys);
        self.values.extend_from_slice(&other.values);
        self.children.extend(other.children.iter().cloned());
        self.count += 1 + other.count;
    }

    /// Restore the minimum key count in the underfull `children[slot]`,
    /// preferring a rotation from the left sibling, then from the right, and
    /// collapsing two adjacent children only when neither has spare keys.
    /// A collapse removes one key from this node; the caller carries any
    /// resulting deficiency further up.
    pub(super) fn fix_deficiency(&mut self, slot: usize) {
        debug_assert!(!self.is_leaf());
        let min = self.min_keys();
        if slot > 0 && self.children[slot - 1].len() > min {
            self.rotate_from_left(slot);
        } else if slot + 1 < self.children.len() && self.children[slot + 1].len() > min {
            self.rotate_from_right(slot);
        } else if slot > 0 {
            self.collapse(slot - 1);
        } else {
            self.collapse(slot);
        }
    }

    fn rotate_from_left(&mut self, slot: usize) {
        let (left_part, right_part) = self.children.split_at_mut(slot);
        let donor = Arc::make_mut(&mut left_part[slot - 1]);
        let recipient = Arc::make_mut(&mut right_part[0]);
        let key = donor.keys.pop().expect("rotation from an empty sibling");
        let value = donor.values.pop().expect("rotation from an empty sibling");
        let carried = donor.children.pop();
        donor.count -= 1 + carried.as_ref().map_or(0, |c| c.count);
        let down_key = std::mem::replace(&mut self.keys[slot - 1], key);
        let down_value = std::mem::replace(&mut self.values[slot - 1], value);
        recipient.keys.insert(0, down_key);
        recipient.values.insert(0, down_value);
        recipient.count += 1;
        if let Some(carried) = carried {
            recipient.count += carried.count;
            recipient.children.insert(0, carried);
        }
    }

    fn rotate_from_right(&mut self, slot: usize) {
        let (left_part, right_part) = self.children.split_at_mut(slot + 1);
        let recipient = Arc::make_mut(&mut left_part[slot]);
        let donor = Arc::make_mut(&mut right_part[0]);
        let key = donor.keys.remove(0);
        let value = donor.values.remove(0);
        let carried = if donor.is_leaf() {
            None
        } else {
            Some(donor.children.remove(0))
        };
        donor.count -= 1 + carried.as_ref().map_or(0, |c| c.count);
        let down_key = std::mem::replace(&mut self.keys[slot], key);
        let down_value = std::mem::replace(&mut self.values[slot], value);
        recipient.keys.push(down_key);
        recipient.values.push(down_value);
        recipient.count += 1;
        if let Some(carried) = carried {
            recipient.count += carried.count;
            recipient.children.push(carried);
        }
    }

    /// Merge `children[slot]` and `children[slot + 1]` around their
    /// separator. The combined node always fits: two minimal children plus
    /// one key never exceed `max_keys`.
    fn collapse(&mut self, slot: usize) {
        trace!("collapsing children {} and {} at depth {}", slot, slot + 1, self.depth);
        let right = self.children.remove(slot + 1);
        let key = self.keys.remove(slot);
        let value = self.values.remove(slot);
        let left = Arc::make_mut(&mut self.children[slot]);
        left.append_fused((key, value), &right);
        debug_assert!(!left.is_overfull());
    }

    /// Concatenate two trees around a separator element, sharing as much of
    /// both operands as possible. Costs O(|depth(left) - depth(right)|): the
    /// shallower side is grafted onto the spine of the deeper one, and any
    /// overflow splits bubble back towards the root.
    pub(super) fn join(left: Arc<Self>, separator: (K, V), right: Arc<Self>) -> Arc<Self> {
        debug_assert_eq!(left.order, right.order);
        use std::cmp::Ordering;
        match left.depth.cmp(&right.depth) {
            Ordering::Equal => {
                if left.len() + 1 + right.len() <= left.max_keys() {
                    let mut node = unshared(left);
                    node.append_fused(separator, &right);
                    Arc::new(node)
                } else if left.len() >= left.min_keys() && right.len() >= right.min_keys() {
                    Arc::new(Node::joined(left, separator, right))
                } else {
                    // One side is too thin to stand as a child; fuse and
                    // re-split so both halves come out valid.
                    let mut node = unshared(left);
                    node.append_fused(separator, &right);
                    let splinter = node.split();
                    Arc::new(Node::joined(
                        Arc::new(node),
                        splinter.separator,
                        splinter.node,
                    ))
                }
            }
            Ordering::Greater => {
                let mut node = unshared(left);
                match node.graft_right(separator, right) {
                    Some(splinter) => Arc::new(Node::joined(
                        Arc::new(node),
                        splinter.separator,
                        splinter.node,
                    )),
                    None => Arc::new(node),
                }
            }
            Ordering::Less => {
                let mut node = unshared(right);
                match node.graft_left(left, separator) {
                    Some(splinter) => Arc::new(Node::joined(
                        Arc::new(node),
                        splinter.separator,
                        splinter.node,
                    )),
                    None => Arc::new(node),
                }
            }
        }
    }

    /// Attach a shallower subtree after all elements of this one.
    fn graft_right(&mut self, separator: (K, V), subtree: Arc<Self>) -> Option<Splinter<K, V>> {
        debug_assert!(self.depth > subtree.depth);
        self.count += 1 + subtree.count;
        if self.depth == subtree.depth + 1 {
            if subtree.len() >= subtree.min_keys() {
                self.keys.push(separator.0);
                self.values.push(separator.1);
                self.children.push(subtree);
            } else {
                let last = self.children.pop().expect("internal node without children");
                let mut fused = unshared(last);
                fused.append_fused(separator, &subtree);
                if fused.is_overfull() {
                    let splinter = fused.split();
                    self.children.push(Arc::new(fused));
                    self.keys.push(splinter.separator.0);
                    self.values.push(splinter.separator.1);
                    self.children.push(splinter.node);
                } else {
                    self.children.push(Arc::new(fused));
                }
            }
        } else {
            let last = self.children.pop().expect("internal node without children");
            let mut spine = unshared(last);
            let splinter = spine.graft_right(separator, subtree);
            self.children.push(Arc::new(spine));
            if let Some(splinter) = splinter {
                self.keys.push(splinter.separator.0);
                self.values.push(splinter.separator.1);
                self.children.push(splinter.node);
            }
        }
        if self.is_overfull() {
            Some(self.split())
        } else {
            None
        }
    }

    /// Attach a shallower subtree before all elements of this one.
    fn graft_left(&mut self, subtree: Arc<Self>, separator: (K, V)) -> Option<Splinter<K, V>> {
        debug_assert!(self.depth > subtree.depth);
        self.count += 1 + subtree.count;
        if self.depth == subtree.depth + 1 {
            if subtree.len() >= subtree.min_keys() {
                self.keys.insert(0, separator.0);
                self.values.insert(0, separator.1);
                self.children.insert(0, subtree);
            } else {
                let first = self.children.remove(0);
                let mut fused = unshared(subtree);
                fused.append_fused(separator, &first);
                if fused.is_overfull() {
                    let splinter = fused.split();
                    self.children.insert(0, splinter.node);
                    self.keys.insert(0, splinter.separator.0);
                    self.values.insert(0, splinter.separator.1);
                    self.children.insert(0, Arc::new(fused));
                } else {
                    self.children.insert(0, Arc::new(fused));
                }
            }
        } else {
            let first = self.children.remove(0);
            let mut spine = unshared(first);
            let splinter = spine.graft_left(subtree, separator);
            self.children.insert(0, Arc::new(spine));
            if let Some(splinter) = splinter {
                // The splinter is the upper half of the previous first child
                // and belongs directly after it.
                self.keys.insert(0, splinter.separator.0);
                self.values.insert(0, splinter.separator.1);
                self.children.insert(1, splinter.node);
            }
        }
        if self.is_overfull() {
            Some(self.split())
        } else {
            None
        }
    }
}

#[cfg(any(test, feature = "internal-api"))]
impl<K: Ord + Clone, V: Clone> Node<K, V> {
    /// Smallest key in the subtree.
    fn min_key(&self) -> &K {
        let mut node = self;
        loop {
            if node.is_leaf() {
                return node.keys.first().expect("min_key on an empty subtree");
            }
            node = node.children.first().expect("internal node without children");
        }
    }

    /// Cross-check every structural invariant of the subtree.
    pub(crate) fn check(&self, expected_order: usize, is_root: bool) -> Result<(), ValidationError> {
        use itertools::Itertools;

        if self.order != expected_order {
            return Err(ValidationError::OrderMismatch {
                expected: expected_order,
                found: self.order,
            });
        }
        if self.values.len() != self.keys.len() {
            return Err(ValidationError::ArityMismatch {
                keys: self.keys.len(),
                values: self.values.len(),
            });
        }
        if !self.is_leaf() && self.children.len() != self.keys.len() + 1 {
            return Err(ValidationError::FanoutMismatch {
                keys: self.keys.len(),
                children: self.children.len(),
            });
        }
        if !self.keys.iter().tuple_windows().all(|(a, b)| a <= b) {
            return Err(ValidationError::KeyOrder { depth: self.depth });
        }
        let (min, max) = if is_root { (0, self.max_keys()) } else { (self.min_keys(), self.max_keys()) };
        if self.keys.len() < min || self.keys.len() > max {
            return Err(ValidationError::KeyBounds {
                len: self.keys.len(),
                min,
                max,
            });
        }
        let mut computed = self.keys.len();
        for (slot, child) in self.children.iter().enumerate() {
            if child.depth + 1 != self.depth {
                return Err(ValidationError::DepthMismatch {
                    cached: self.depth,
                    actual: child.depth + 1,
                });
            }
            if slot < self.keys.len() && child.max_key() > &self.keys[slot] {
                return Err(ValidationError::SeparatorBound { slot });
            }
            if slot > 0 && child.min_key() < &self.keys[slot - 1] {
                return Err(ValidationError::SeparatorBound { slot: slot - 1 });
            }
            child.check(expected_order, false)?;
            computed += child.count;
        }
        if self.is_leaf() && self.depth != 0 {
            return Err(ValidationError::DepthMismatch {
                cached: self.depth,
                actual: 0,
            });
        }
        if computed != self.count {
            return Err(ValidationError::CountMismatch {
                cached: self.count,
                actual: computed,
            });
        }
        Ok(())
    }

    /// Collect the allocation addresses of every node in the subtree.
    pub(crate) fn collect_identities(node: &Arc<Self>, out: &mut Vec<*const ()>) {
        out.push(Arc::as_ptr(node) as *const ());
        for child in &node.children {
            Self::collect_identities(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Tree;
    use super::*;
    use quickcheck_macros::quickcheck;

    fn leaf_of(order: usize, keys: Range<i32>) -> Node<i32, i32> {
        let mut node = Node::leaf(order);
        for k in keys {
            node.keys.push(k);
            node.values.push(k * 10);
        }
        node.recompute_count();
        node
    }

    #[test]
    fn slot_search_with_duplicates() {
        let mut node = leaf_of(8, 0..0);
        for k in [1, 3, 3, 3, 7] {
            node.keys.push(k);
            node.values.push(k);
        }
        node.recompute_count();

        let any = node.slot_of_key(&3, KeySelector::Any);
        assert!(matches!(any.matching, Some(1..=3)));

        let first = node.slot_of_key(&3, KeySelector::First);
        assert_eq!(first.matching, Some(1));
        assert_eq!(first.descent, 1);

        let last = node.slot_of_key(&3, KeySelector::Last);
        assert_eq!(last.matching, Some(3));
        assert_eq!(last.descent, 4);

        let miss = node.slot_of_key(&5, KeySelector::Any);
        assert_eq!(miss.matching, None);
        assert_eq!(miss.descent, 4);
    }

    #[test]
    fn split_keeps_both_halves_valid() {
        let mut node = leaf_of(8, 0..8);
        assert!(node.is_overfull());
        let splinter = node.split();
        assert_eq!(node.keys, vec![0, 1, 2, 3]);
        assert_eq!(splinter.separator.0, 4);
        assert_eq!(splinter.node.keys, vec![5, 6, 7]);
        assert_eq!(node.count + 1 + splinter.node.count, 8);
        node.check(8, true).unwrap();
        splinter.node.check(8, false).unwrap();
    }

    #[test]
    fn join_of_unequal_depths_shares_the_deep_side() {
        // Left: depth 1 with three full leaves. Right: a single small leaf.
        let leaves: Vec<_> = (0..3)
            .map(|i| Arc::new(leaf_of(4, i * 10..i * 10 + 3)))
            .collect();
        let mut root = Node {
            order: 4,
            keys: vec![5, 15],
            values: vec![50, 150],
            children: leaves,
            count: 0,
            depth: 1,
        };
        root.recompute_count();
        let right = Arc::new(leaf_of(4, 40..42));

        let joined = Node::join(Arc::new(root), (30, 300), right);
        joined.check(4, true).unwrap();
        assert_eq!(joined.count, 11 + 1 + 2);
        assert_eq!(*joined.max_key(), 41);
        assert_eq!(*joined.min_key(), 0);
    }

    #[test]
    fn collapse_after_deficiency() {
        let children = vec![
            Arc::new(leaf_of(4, 0..1)),
            Arc::new(leaf_of(4, 10..11)),
        ];
        let mut parent = Node {
            order: 4,
            keys: vec![5],
            values: vec![50],
            children,
            count: 0,
            depth: 1,
        };
        parent.recompute_count();
        // Neither sibling has spare keys, so the children merge and the
        // parent is left key-less; the caller collapses such roots.
        parent.fix_deficiency(0);
        assert_eq!(parent.keys.len(), 0);
        assert_eq!(parent.children.len(), 1);
        assert_eq!(parent.children[0].keys, vec![0, 5, 10]);
    }

    #[quickcheck]
    fn join_of_arbitrary_sizes_stays_valid(left_len: u16, right_len: u16) {
        let left_len = u32::from(left_len % 512);
        let right_len = u32::from(right_len % 512);
        let left: Tree<u32, u32> =
            Tree::from_sorted_iter_with_order(4, (0..left_len).map(|k| (k, k)));
        let right: Tree<u32, u32> =
            Tree::from_sorted_iter_with_order(4, (0..right_len).map(|k| (10_000 + k, k)));

        let joined = Node::join(left.root().clone(), (5_000, 0), right.root().clone());
        joined.check(4, true).unwrap();
        assert_eq!(joined.count as u32, left_len + 1 + right_len);
        let expected_min = if left_len > 0 { 0 } else { 5_000 };
        let expected_max = if right_len > 0 { 10_000 + right_len - 1 } else { 5_000 };
        assert_eq!(*joined.min_key(), expected_min);
        assert_eq!(*joined.max_key(), expected_max);
    }

    #[test]
    fn rotation_prefers_the_left_sibling() {
        let children = vec![
            Arc::new(leaf_of(4, 0..3)),
            Arc::new(leaf_of(4, 10..11)),
        ];
        let mut parent = Node {
            order: 4,
            keys: vec![5],
            values: vec![50],
            children,
            count: 0,
            depth: 1,
        };
        parent.recompute_count();
        parent.fix_deficiency(1);
        parent.check(4, true).unwrap();
        assert_eq!(parent.keys, vec![2]);
        assert_eq!(parent.children[1].keys, vec![5, 10]);
    }
}
