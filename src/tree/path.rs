//! A root-to-element trail over a shared tree.
//!
//! The path owns a strong reference to every node between the root and the
//! focused element, so it stays valid however the originating tree handle is
//! moved or cloned. Iteration, the splitting primitives and the bulk
//! set-algebra engine are all built on this one type.

use std::{ops::Range, sync::Arc};

use super::{
    node::{Node, PositionSlot},
    KeySelector,
};

/// Boundary policy for limit-bounded path consumption: does the limit key
/// itself still belong to the region?
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) enum Limit {
    Including,
    Excluding,
}

impl Limit {
    fn covers<K: Ord>(self, key: &K, limit: &K) -> bool {
        match self {
            Limit::Including => key <= limit,
            Limit::Excluding => key < limit,
        }
    }
}

/// A maximal region handed out by [`Path::next_part`]: a single element, a
/// whole shared subtree, or a run of consecutive slots inside one leaf.
pub(super) enum TreePart<K, V> {
    Element(K, V),
    Subtree(Arc<Node<K, V>>),
    Run(Arc<Node<K, V>>, Range<usize>),
}

/// Strong read-only path.
///
/// Layout invariants: `nodes[0]` is the root and `nodes[i + 1]` is
/// `nodes[i].children[slots[i]]`; `starts[i]` is the global offset where the
/// subtree of `nodes[i]` begins. The path is *complete* when `slots` carries
/// one entry per node (the last one focuses an element) and briefly
/// *incomplete* inside navigation. The past-the-end position is represented
/// by a root-only trail with `offset == count`.
pub(super) struct Path<K, V> {
    nodes: Vec<Arc<Node<K, V>>>,
    slots: Vec<usize>,
    starts: Vec<usize>,
    offset: usize,
    count: usize,
    /// Number of regions handed out so far; the set-algebra fast-path tests
    /// key off this.
    pub(super) parts: usize,
}

impl<K: Ord + Clone, V: Clone> Path<K, V> {
    /// A path over `root`, parked at the past-the-end position.
    pub(super) fn new(root: Arc<Node<K, V>>) -> Self {
        let count = root.count;
        Path {
            nodes: vec![root],
            slots: Vec::new(),
            starts: vec![0],
            offset: count,
            count,
            parts: 0,
        }
    }

    pub(super) fn at_start(root: Arc<Node<K, V>>) -> Self {
        let mut path = Self::new(root);
        path.move_to_offset(0);
        path
    }

    pub(super) fn at_offset(root: Arc<Node<K, V>>, offset: usize) -> Self {
        let mut path = Self::new(root);
        path.move_to_offset(offset);
        path
    }

    pub(super) fn at_key(root: Arc<Node<K, V>>, key: &K, selector: KeySelector) -> Self {
        let mut path = Self::new(root);
        path.move_to_key(key, selector);
        path
    }

    pub(super) fn count(&self) -> usize {
        self.count
    }

    pub(super) fn offset(&self) -> usize {
        self.offset
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.offset == self.count
    }

    pub(super) fn key(&self) -> &K {
        debug_assert!(!self.is_at_end());
        &self.nodes[self.nodes.len() - 1].keys[*self.slots.last().expect("incomplete path")]
    }

    pub(super) fn value(&self) -> &V {
        debug_assert!(!self.is_at_end());
        &self.nodes[self.nodes.len() - 1].values[*self.slots.last().expect("incomplete path")]
    }

    pub(super) fn element_cloned(&self) -> (K, V) {
        (self.key().clone(), self.value().clone())
    }

    // Trail accessors used by the merger's shared-subtree detection.

    pub(super) fn trail_len(&self) -> usize {
        self.nodes.len()
    }

    pub(super) fn node_at(&self, level: usize) -> &Arc<Node<K, V>> {
        &self.nodes[level]
    }

    pub(super) fn slot_at(&self, level: usize) -> usize {
        self.slots[level]
    }

    pub(super) fn focused_slot(&self) -> Option<usize> {
        if self.slots.len() == self.nodes.len() {
            self.slots.last().copied()
        } else {
            None
        }
    }

    fn goto_end(&mut self) {
        self.nodes.truncate(1);
        self.starts.truncate(1);
        self.slots.clear();
        self.offset = self.count;
    }

    /// Step to the in-order successor. Amortised O(1): a leaf step is a slot
    /// increment, and every edge of the tree is climbed at most twice over a
    /// full traversal.
    pub(super) fn move_forward(&mut self) {
        debug_assert!(!self.is_at_end());
        let (is_leaf, len, slot) = {
            let node = self.nodes.last().expect("empty trail");
            (node.is_leaf(), node.len(), *self.slots.last().expect("incomplete path"))
        };
        self.offset += 1;
        if self.offset == self.count {
            self.goto_end();
            return;
        }
        *self.slots.last_mut().expect("incomplete path") = slot + 1;
        if is_leaf {
            if slot + 1 == len {
                self.ascend_past_exhausted();
            }
        } else {
            self.descend_first_into(slot + 1);
        }
    }

    /// Step to the in-order predecessor. From the past-the-end position this
    /// lands on the last element.
    pub(super) fn move_backward(&mut self) {
        assert!(self.offset > 0, "move_backward at the first element");
        if self.is_at_end() {
            self.offset -= 1;
            let (is_leaf, len, fanout) = {
                let root = &self.nodes[0];
                (root.is_leaf(), root.len(), root.children.len())
            };
            if is_leaf {
                self.slots.push(len - 1);
            } else {
                self.slots.push(fanout - 1);
                self.descend_last_into(fanout - 1);
            }
            return;
        }
        self.offset -= 1;
        let (is_leaf, slot) = {
            let node = self.nodes.last().expect("empty trail");
            (node.is_leaf(), *self.slots.last().expect("incomplete path"))
        };
        if !is_leaf {
            self.descend_last_into(slot);
            return;
        }
        if slot > 0 {
            *self.slots.last_mut().expect("incomplete path") = slot - 1;
            return;
        }
        self.slots.pop();
        loop {
            debug_assert!(self.nodes.len() > 1, "no predecessor on the trail");
            self.nodes.pop();
            self.starts.pop();
            let slot = *self.slots.last().expect("incomplete path");
            if slot > 0 {
                *self.slots.last_mut().expect("incomplete path") = slot - 1;
                return;
            }
            self.slots.pop();
        }
    }

    /// Jump to an arbitrary position. Costs O(log d) where d is the distance
    /// from the current position: the trail is unwound only far enough for
    /// the target to fall inside the focused subtree.
    pub(super) fn move_to_offset(&mut self, offset: usize) {
        assert!(offset <= self.count, "offset {} out of range", offset);
        if offset == self.count {
            self.goto_end();
            return;
        }
        if self.slots.len() == self.nodes.len() {
            self.slots.pop();
        }
        while self.nodes.len() > 1 {
            let start = *self.starts.last().expect("empty trail");
            let span = self.nodes.last().expect("empty trail").count;
            if start <= offset && offset < start + span {
                break;
            }
            self.nodes.pop();
            self.starts.pop();
            self.slots.pop();
        }
        self.descend_to_offset(offset);
    }

    /// Move to an occurrence of `key` chosen by `selector`; on a miss, land
    /// on the first element strictly greater, or past the end.
    pub(super) fn move_to_key(&mut self, key: &K, selector: KeySelector) {
        self.nodes.truncate(1);
        self.starts.truncate(1);
        self.slots.clear();
        // (trail length, slot, offset) of the best occurrence so far; for
        // First and Last a deeper match always supersedes a shallower one.
        let mut best: Option<(usize, usize, usize)> = None;
        loop {
            let start = *self.starts.last().expect("empty trail");
            let (matching, descent, is_leaf, len) = {
                let node = self.nodes.last().expect("empty trail");
                let found = node.slot_of_key(key, selector);
                (
                    found.matching.map(|m| (m, start + node.position_of_slot(m))),
                    found.descent,
                    node.is_leaf(),
                    node.len(),
                )
            };
            if let Some((slot, offset)) = matching {
                if let KeySelector::Any = selector {
                    self.slots.push(slot);
                    self.offset = offset;
                    return;
                }
                best = Some((self.nodes.len(), slot, offset));
            }
            if is_leaf {
                if let Some((depth, slot, offset)) = best {
                    self.nodes.truncate(depth);
                    self.starts.truncate(depth);
                    self.slots.truncate(depth - 1);
                    self.slots.push(slot);
                    self.offset = offset;
                } else if descent < len {
                    self.slots.push(descent);
                    self.offset = start + descent;
                } else {
                    // Larger than everything in this leaf; the successor, if
                    // any, is an ancestor element.
                    self.offset = start + len;
                    if self.offset == self.count {
                        self.goto_end();
                        return;
                    }
                    self.slots.push(descent);
                    self.ascend_past_exhausted();
                }
                return;
            }
            let (child, child_start) = {
                let node = self.nodes.last().expect("empty trail");
                (
                    node.children[descent].clone(),
                    start + node.position_of_child(descent),
                )
            };
            self.slots.push(descent);
            self.nodes.push(child);
            self.starts.push(child_start);
        }
    }

    fn descend_to_offset(&mut self, offset: usize) {
        loop {
            let start = *self.starts.last().expect("empty trail");
            let step = {
                let node = self.nodes.last().expect("empty trail");
                match node.slot_of_position(offset - start) {
                    PositionSlot::Element(slot) => Ok(slot),
                    PositionSlot::Child { slot, local } => {
                        Err((node.children[slot].clone(), slot, local))
                    }
                }
            };
            match step {
                Ok(slot) => {
                    self.slots.push(slot);
                    self.offset = offset;
                    return;
                }
                Err((child, slot, local)) => {
                    self.slots.push(slot);
                    self.nodes.push(child);
                    self.starts.push(offset - local);
                }
            }
        }
    }

    fn descend_first_into(&mut self, mut slot: usize) {
        loop {
            let child = self.nodes.last().expect("empty trail").children[slot].clone();
            let is_leaf = child.is_leaf();
            self.nodes.push(child);
            self.starts.push(self.offset);
            self.slots.push(0);
            if is_leaf {
                return;
            }
            slot = 0;
        }
    }

    fn descend_last_into(&mut self, mut slot: usize) {
        loop {
            let child = self.nodes.last().expect("empty trail").children[slot].clone();
            let start = self.offset + 1 - child.count;
            let (is_leaf, len, fanout) = (child.is_leaf(), child.len(), child.children.len());
            self.nodes.push(child);
            self.starts.push(start);
            if is_leaf {
                self.slots.push(len - 1);
                return;
            }
            slot = fanout - 1;
            self.slots.push(slot);
        }
    }

    /// Climb out of a node whose slots are exhausted until an ancestor still
    /// has an element to offer. Only valid with elements remaining.
    fn ascend_past_exhausted(&mut self) {
        debug_assert!(self.offset < self.count);
        self.slots.pop();
        loop {
            debug_assert!(self.nodes.len() > 1, "exhausted trail with elements remaining");
            self.nodes.pop();
            self.starts.pop();
            let (len, slot) = {
                let node = self.nodes.last().expect("empty trail");
                (node.len(), *self.slots.last().expect("incomplete path"))
            };
            if slot < len {
                return;
            }
            self.slots.pop();
        }
    }

    /// Hand out the next maximal region whose keys all fall under `limit`,
    /// and advance past it. Returns `None` once the focused key (or the end
    /// of the tree) stops the region.
    ///
    /// A region is never enumerated element-wise when a whole subtree
    /// qualifies: if the current position is the start of one or more trail
    /// nodes, the topmost fully-covered one is handed out as a single part.
    /// Coverage of a child is decided by its parent separator alone, so each
    /// call stays O(log n).
    pub(super) fn next_part(&mut self, limit: &K, policy: Limit) -> Option<TreePart<K, V>> {
        self.next_part_impl(Some((limit, policy)))
    }

    /// Like [`next_part`], but unbounded: drains the rest of the tree.
    pub(super) fn next_remaining_part(&mut self) -> Option<TreePart<K, V>> {
        self.next_part_impl(None)
    }

    fn next_part_impl(&mut self, limit: Option<(&K, Limit)>) -> Option<TreePart<K, V>> {
        if self.is_at_end() {
            return None;
        }
        let covers = |key: &K| match limit {
            None => true,
            Some((limit, policy)) => policy.covers(key, limit),
        };
        if !covers(self.key()) {
            return None;
        }
        self.parts += 1;

        // Topmost trail node whose subtree starts right here and is entirely
        // covered. For level > 0 the parent separator bounds every key in
        // the child, so no descent into the subtree is needed.
        let mut best = None;
        for level in (0..self.nodes.len()).rev() {
            if self.starts[level] != self.offset {
                break;
            }
            let covered = if level == 0 {
                covers(self.nodes[0].max_key())
            } else {
                let parent = &self.nodes[level - 1];
                let slot = self.slots[level - 1];
                slot < parent.len() && covers(&parent.keys[slot])
            };
            if covered {
                best = Some(level);
            } else {
                break;
            }
        }
        if let Some(level) = best {
            let subtree = self.nodes[level].clone();
            self.skip_subtree_at(level);
            return Some(TreePart::Subtree(subtree));
        }

        let node = self.nodes.last().expect("empty trail").clone();
        let slot = *self.slots.last().expect("incomplete path");
        if node.is_leaf() {
            let mut end = slot + 1;
            while end < node.len() && covers(&node.keys[end]) {
                end += 1;
            }
            let part = if end - slot == 1 {
                TreePart::Element(node.keys[slot].clone(), node.values[slot].clone())
            } else {
                TreePart::Run(node.clone(), slot..end)
            };
            self.offset += end - slot;
            if self.offset == self.count {
                self.goto_end();
            } else {
                *self.slots.last_mut().expect("incomplete path") = end;
                if end == node.len() {
                    self.ascend_past_exhausted();
                }
            }
            Some(part)
        } else {
            let part = TreePart::Element(node.keys[slot].clone(), node.values[slot].clone());
            self.move_forward();
            Some(part)
        }
    }

    /// Advance past the whole subtree of the trail node at `level`. The
    /// current position must be that subtree's first element.
    pub(super) fn skip_subtree_at(&mut self, level: usize) {
        debug_assert_eq!(self.starts[level], self.offset);
        self.offset += self.nodes[level].count;
        if level == 0 {
            debug_assert_eq!(self.offset, self.count);
            self.goto_end();
            return;
        }
        self.nodes.truncate(level);
        self.starts.truncate(level);
        // The parent's descent slot becomes the focused element slot: it
        // indexes the separator immediately after the skipped subtree.
        self.slots.truncate(level);
        if self.offset == self.count {
            self.goto_end();
            return;
        }
        let (len, slot) = {
            let node = self.nodes.last().expect("empty trail");
            (node.len(), *self.slots.last().expect("incomplete path"))
        };
        if slot == len {
            self.ascend_past_exhausted();
        }
    }

    /// New tree holding every element before the focused one. O(log n):
    /// the result is assembled from shared subtrees by ascending joins, and
    /// a focus at a node boundary skips the join for that level entirely.
    pub(super) fn prefix_tree(&self) -> Arc<Node<K, V>> {
        debug_assert!(!self.is_at_end());
        let slot = *self.slots.last().expect("incomplete path");
        let mut acc = self.nodes.last().expect("empty trail").from_slot_range(0..slot);
        for level in (0..self.nodes.len() - 1).rev() {
            let node = &self.nodes[level];
            let slot = self.slots[level];
            if slot > 0 {
                let before = node.from_slot_range(0..slot - 1);
                let separator = (node.keys[slot - 1].clone(), node.values[slot - 1].clone());
                acc = Node::join(before, separator, acc);
            }
        }
        acc
    }

    /// New tree holding every element strictly after the focused one.
    pub(super) fn suffix_tree(&self) -> Arc<Node<K, V>> {
        debug_assert!(!self.is_at_end());
        let node = self.nodes.last().expect("empty trail");
        let slot = *self.slots.last().expect("incomplete path");
        let mut acc = node.from_slot_range(slot + 1..node.len());
        for level in (0..self.nodes.len() - 1).rev() {
            let node = &self.nodes[level];
            let slot = self.slots[level];
            if slot < node.len() {
                let after = node.from_slot_range(slot + 1..node.len());
                let separator = (node.keys[slot].clone(), node.values[slot].clone());
                acc = Node::join(acc, separator, after);
            }
        }
        acc
    }

    /// Split around the focused element.
    pub(super) fn split_tree(&self) -> (Arc<Node<K, V>>, (K, V), Arc<Node<K, V>>) {
        (self.prefix_tree(), self.element_cloned(), self.suffix_tree())
    }
}

#[cfg(test)]
impl<K: Ord + Clone, V: Clone> Path<K, V> {
    /// Internal consistency of the trail itself.
    fn verify(&self) {
        assert!(!self.nodes.is_empty());
        assert_eq!(self.starts[0], 0);
        if self.is_at_end() {
            assert_eq!(self.nodes.len(), 1);
            assert!(self.slots.is_empty());
            return;
        }
        assert_eq!(self.slots.len(), self.nodes.len());
        for level in 0..self.nodes.len() - 1 {
            let node = &self.nodes[level];
            let slot = self.slots[level];
            assert!(Arc::ptr_eq(&self.nodes[level + 1], &node.children[slot]));
            assert_eq!(
                self.starts[level + 1],
                self.starts[level] + node.position_of_child(slot)
            );
        }
        let node = self.nodes.last().unwrap();
        let slot = *self.slots.last().unwrap();
        assert!(slot < node.len());
        assert_eq!(
            self.offset,
            self.starts.last().unwrap() + node.position_of_slot(slot)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::Tree;
    use super::*;

    fn sample(order: usize, n: i32) -> Tree<i32, i32> {
        Tree::from_sorted_iter_with_order(order, (0..n).map(|k| (k, k * 2)))
    }

    #[test]
    fn forward_walk_visits_everything_in_order() {
        let tree = sample(4, 100);
        let mut path = Path::at_start(tree.root().clone());
        for expected in 0..100 {
            path.verify();
            assert_eq!(*path.key(), expected);
            assert_eq!(path.offset(), expected as usize);
            path.move_forward();
        }
        assert!(path.is_at_end());
    }

    #[test]
    fn backward_walk_mirrors_forward() {
        let tree = sample(4, 57);
        let mut path = Path::new(tree.root().clone());
        for expected in (0..57).rev() {
            path.move_backward();
            path.verify();
            assert_eq!(*path.key(), expected);
        }
        assert_eq!(path.offset(), 0);
    }

    #[test]
    fn offset_jumps_land_exactly() {
        let tree = sample(5, 300);
        let mut path = Path::at_start(tree.root().clone());
        for offset in [299usize, 0, 150, 151, 149, 1, 298, 42] {
            path.move_to_offset(offset);
            path.verify();
            assert_eq!(path.offset(), offset);
            assert_eq!(*path.key(), offset as i32);
        }
        path.move_to_offset(300);
        assert!(path.is_at_end());
    }

    #[test]
    fn key_moves_respect_the_selector() {
        // 0,1,1,1,2,3 with payloads marking insertion order
        let tree = Tree::from_sorted_iter_with_order(
            3,
            [(0, 0), (1, 10), (1, 11), (1, 12), (2, 20), (3, 30)],
        );
        let mut path = Path::new(tree.root().clone());

        path.move_to_key(&1, KeySelector::First);
        assert_eq!(path.offset(), 1);
        assert_eq!(*path.value(), 10);

        path.move_to_key(&1, KeySelector::Last);
        assert_eq!(path.offset(), 3);
        assert_eq!(*path.value(), 12);

        path.move_to_key(&1, KeySelector::Any);
        assert_eq!(*path.key(), 1);

        // Misses land on the first strictly greater element.
        path.move_to_key(&-5, KeySelector::Any);
        assert_eq!(path.offset(), 0);
        let mut path = Path::new(tree.root().clone());
        path.move_to_key(&9, KeySelector::Any);
        assert!(path.is_at_end());
    }

    #[test]
    fn prefix_and_suffix_partition_the_tree() {
        let tree = sample(4, 64);
        for offset in [0usize, 1, 31, 32, 62, 63] {
            let path = Path::at_offset(tree.root().clone(), offset);
            let (prefix, element, suffix) = path.split_tree();
            prefix.check(4, true).unwrap();
            suffix.check(4, true).unwrap();
            assert_eq!(prefix.count, offset);
            assert_eq!(element.0, offset as i32);
            assert_eq!(suffix.count, 63 - offset);
        }
    }

    #[test]
    fn next_part_hands_out_whole_subtrees() {
        let tree = sample(4, 1024);
        let mut path = Path::at_start(tree.root().clone());
        let mut total = 0;
        let mut parts = 0;
        while let Some(part) = path.next_part(&2000, Limit::Excluding) {
            total += match part {
                TreePart::Element(..) => 1,
                TreePart::Subtree(node) => node.count,
                TreePart::Run(_, ref range) => range.len(),
            };
            parts += 1;
        }
        assert!(path.is_at_end());
        assert_eq!(total, 1024);
        // The whole tree is covered, so it must go out as one region.
        assert_eq!(parts, 1);
    }

    #[test]
    fn next_part_stops_at_the_limit() {
        let tree = sample(4, 100);
        let mut path = Path::at_start(tree.root().clone());
        let mut total = 0;
        while let Some(part) = path.next_part(&40, Limit::Including) {
            total += match part {
                TreePart::Element(..) => 1,
                TreePart::Subtree(node) => node.count,
                TreePart::Run(_, ref range) => range.len(),
            };
        }
        assert_eq!(total, 41);
        assert_eq!(*path.key(), 41);
    }
}
