//! A mutating path with exclusive ownership of its tree.
//!
//! The cursor dismantles the spine it walks: descending pops the focused
//! child out of its (by then uniquely owned) parent, leaving a placeholder
//! behind and subtracting the child's element count. Every node on the spine
//! is therefore a plain owned `Node` that can be edited without touching a
//! reference count, and ancestor counts are transiently wrong until the
//! level is reassembled on the way back up. `finish` reassembles the whole
//! spine, so no caller can observe the broken counts.

use std::{mem, sync::Arc};

use log::trace;

use super::{
    node::{unshared, Node, PositionSlot},
    Tree,
};

pub struct Cursor<K, V> {
    /// Ancestors of the focused node, root first. Each has had the focused
    /// child swapped for a placeholder and its count reduced accordingly.
    spine: Vec<Node<K, V>>,
    spine_slots: Vec<usize>,
    /// Global offset where each spine node's subtree begins.
    spine_starts: Vec<usize>,
    /// The focused node, fully intact.
    node: Node<K, V>,
    /// Global offset of `node`'s first element.
    start: usize,
    /// Focused slot within `node`; `node.len()` transiently marks an
    /// insertion point or the past-the-end position.
    slot: usize,
    offset: usize,
    /// Element count of the whole tree, kept current through edits.
    count: usize,
    /// Stand-in stored where the focused child was popped out.
    hole: Arc<Node<K, V>>,
}

impl<K: Ord + Clone, V: Clone> Cursor<K, V> {
    pub(super) fn new(tree: Tree<K, V>, offset: usize) -> Self {
        let count = tree.root.count;
        assert!(offset <= count, "cursor offset {} out of range", offset);
        let order = tree.root.order;
        let mut cursor = Cursor {
            spine: Vec::new(),
            spine_slots: Vec::new(),
            spine_starts: Vec::new(),
            node: unshared(tree.root),
            start: 0,
            slot: 0,
            offset: 0,
            count,
            hole: Arc::new(Node::leaf(order)),
        };
        cursor.descend_to(offset);
        cursor
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_at_end(&self) -> bool {
        self.offset == self.count
    }

    pub fn key(&self) -> &K {
        assert!(!self.is_at_end(), "cursor is past the end");
        &self.node.keys[self.slot]
    }

    pub fn payload(&self) -> &V {
        assert!(!self.is_at_end(), "cursor is past the end");
        &self.node.values[self.slot]
    }

    /// Swap the focused payload, returning the previous one.
    pub fn replace_payload(&mut self, payload: V) -> V {
        assert!(!self.is_at_end(), "cursor is past the end");
        mem::replace(&mut self.node.values[self.slot], payload)
    }

    /// Swap the focused key. The caller must keep the global key order
    /// intact; only the immediate in-node neighbours are cross-checked.
    pub fn replace_key(&mut self, key: K) -> K {
        assert!(!self.is_at_end(), "cursor is past the end");
        debug_assert!(self.slot == 0 || self.node.keys[self.slot - 1] <= key);
        debug_assert!(self.slot + 1 >= self.node.len() || key <= self.node.keys[self.slot + 1]);
        mem::replace(&mut self.node.keys[self.slot], key)
    }

    // -- navigation ---------------------------------------------------------

    pub fn move_to_offset(&mut self, offset: usize) {
        assert!(offset <= self.count, "cursor offset {} out of range", offset);
        while !self.spine.is_empty()
            && !(self.start <= offset && offset < self.start + self.node.count)
        {
            self.pop_up();
        }
        self.descend_to(offset);
    }

    pub fn move_forward(&mut self) {
        assert!(!self.is_at_end(), "cursor is past the end");
        let offset = self.offset;
        self.move_to_offset(offset + 1);
    }

    pub fn move_backward(&mut self) {
        assert!(self.offset > 0, "cursor is at the first element");
        let offset = self.offset;
        self.move_to_offset(offset - 1);
    }

    // -- editing ------------------------------------------------------------

    /// Insert before the focused element (or append when past the end). The
    /// focused element and everything after it shift one position right; the
    /// cursor stays on the originally focused element.
    pub fn insert_before(&mut self, key: K, payload: V) {
        let target = self.offset;
        self.insert_at(target, key, payload);
        self.move_to_offset(target + 1);
    }

    /// Insert immediately after the focused element and move onto the new
    /// element.
    pub fn insert_after(&mut self, key: K, payload: V) {
        assert!(!self.is_at_end(), "insert_after past the end");
        let target = self.offset + 1;
        self.insert_at(target, key, payload);
        self.move_to_offset(target);
    }

    /// Remove the focused element and focus its successor.
    pub fn remove(&mut self) -> (K, V) {
        assert!(!self.is_at_end(), "remove past the end");
        let target = self.offset;
        let removed = if self.node.is_leaf() {
            let key = self.node.keys.remove(self.slot);
            let value = self.node.values.remove(self.slot);
            self.node.count -= 1;
            (key, value)
        } else {
            // Swap the in-order predecessor (always a leaf element) into the
            // vacated slot, then take the leaf slot out.
            let slot = self.slot;
            let hole_level = self.spine.len();
            let child_start = self.start + self.node.position_of_child(slot);
            self.push_down(slot, child_start);
            while !self.node.is_leaf() {
                let last = self.node.children.len() - 1;
                let start = self.start + self.node.position_of_child(last);
                self.push_down(last, start);
            }
            let key = self.node.keys.pop().expect("leaf under an internal node is never empty");
            let value = self.node.values.pop().expect("leaf under an internal node is never empty");
            self.node.count -= 1;
            let internal = &mut self.spine[hole_level];
            (
                mem::replace(&mut internal.keys[slot], key),
                mem::replace(&mut internal.values[slot], value),
            )
        };
        self.count -= 1;
        self.fix_after_remove();
        self.move_to_offset(target);
        removed
    }

    /// Reassemble the spine, restore the ancestor counts and hand the tree
    /// back.
    pub fn finish(mut self) -> Tree<K, V> {
        while !self.spine.is_empty() {
            self.pop_up();
        }
        while self.node.keys.is_empty() && self.node.children.len() == 1 {
            let only = self.node.children.pop().expect("just checked");
            self.node = unshared(only);
        }
        debug_assert_eq!(self.node.count, self.count);
        trace!("cursor finished, {} elements", self.count);
        Tree {
            root: Arc::new(self.node),
        }
    }

    // -- spine plumbing -----------------------------------------------------

    /// Pop `children[slot]` out of the focused node and focus it. The parent
    /// keeps a placeholder and loses the child's count.
    fn push_down(&mut self, slot: usize, child_start: usize) {
        let child = mem::replace(&mut self.node.children[slot], self.hole.clone());
        let child = unshared(child);
        self.node.count -= child.count;
        let parent = mem::replace(&mut self.node, child);
        self.spine.push(parent);
        self.spine_slots.push(slot);
        self.spine_starts.push(self.start);
        self.start = child_start;
    }

    /// Write the focused node back into its parent and focus the parent.
    fn pop_up(&mut self) {
        let parent = self.spine.pop().expect("pop_up at the root");
        let slot = self.spine_slots.pop().expect("pop_up at the root");
        self.start = self.spine_starts.pop().expect("pop_up at the root");
        let child = mem::replace(&mut self.node, parent);
        self.node.count += child.count;
        self.node.children[slot] = Arc::new(child);
        self.slot = slot;
    }

    fn descend_to(&mut self, offset: usize) {
        loop {
            match self.node.slot_of_position(offset - self.start) {
                PositionSlot::Element(slot) => {
                    self.slot = slot;
                    self.offset = offset;
                    return;
                }
                PositionSlot::Child { slot, local } => {
                    self.push_down(slot, offset - local);
                }
            }
        }
    }

    /// Park the cursor on the leaf slot where an element inserted at
    /// `offset` belongs. When the offset falls on an internal element, the
    /// insertion point is the far end of the child before it.
    fn move_to_leaf_insertion(&mut self, offset: usize) {
        while !self.spine.is_empty()
            && !(self.start <= offset && offset <= self.start + self.node.count)
        {
            self.pop_up();
        }
        loop {
            if self.node.is_leaf() {
                self.slot = offset - self.start;
                self.offset = offset;
                return;
            }
            match self.node.slot_of_position(offset - self.start) {
                PositionSlot::Element(slot) => {
                    let child_start = self.start + self.node.position_of_child(slot);
                    self.push_down(slot, child_start);
                }
                PositionSlot::Child { slot, local } => {
                    self.push_down(slot, offset - local);
                }
            }
        }
    }

    fn insert_at(&mut self, offset: usize, key: K, payload: V) {
        self.move_to_leaf_insertion(offset);
        self.node.keys.insert(self.slot, key);
        self.node.values.insert(self.slot, payload);
        self.node.count += 1;
        self.count += 1;
        self.fix_after_insert();
    }

    /// Split overfull nodes upwards; a root split grows the tree by one
    /// level. Leaves the cursor parked on the last split level, so callers
    /// re-aim it with `move_to_offset` afterwards.
    fn fix_after_insert(&mut self) {
        while self.node.is_overfull() {
            let splinter = self.node.split();
            if self.spine.is_empty() {
                let order = self.node.order;
                let left = Arc::new(mem::replace(&mut self.node, Node::leaf(order)));
                self.node = Node::joined(left, splinter.separator, splinter.node);
                self.start = 0;
            } else {
                self.pop_up();
                let slot = self.slot;
                self.node.insert_splinter(slot, splinter);
            }
        }
    }

    /// Repair underfull nodes upwards; a root left key-less over a single
    /// child collapses by one level.
    fn fix_after_remove(&mut self) {
        while self.node.is_underfull() && !self.spine.is_empty() {
            self.pop_up();
            let slot = self.slot;
            self.node.fix_deficiency(slot);
        }
        if self.spine.is_empty() {
            while self.node.keys.is_empty() && self.node.children.len() == 1 {
                let only = self.node.children.pop().expect("just checked");
                self.node = unshared(only);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Tree;

    fn keys(tree: &Tree<i32, i32>) -> Vec<i32> {
        tree.iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn insert_and_remove_around_a_small_tree() {
        // Order 3: min_keys = 1, max_keys = 2. Seven sequential inserts push
        // the tree to depth 2.
        let mut tree = Tree::with_order(3);
        for k in 1..=7 {
            tree.insert_or_replace(k, k * 10);
        }
        assert_eq!(tree.depth(), 2);
        tree.check_invariants().unwrap();

        let removed = tree.remove(&4, super::super::KeySelector::Any);
        assert_eq!(removed, Some((4, 40)));
        tree.check_invariants().unwrap();
        assert_eq!(keys(&tree), vec![1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn cursor_batch_edit() {
        let tree: Tree<i32, i32> = Tree::from_sorted_iter((0..1000).map(|k| (k, k)));
        let mut cursor = tree.cursor_at_offset(100);
        assert_eq!(*cursor.key(), 100);
        for i in 0..10 {
            cursor.insert_after(100, 1000 + i);
        }
        for _ in 0..5 {
            cursor.remove();
        }
        let tree = cursor.finish();
        assert_eq!(tree.len(), 1005);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn insert_before_keeps_the_focus() {
        let tree: Tree<i32, i32> = Tree::from_sorted_iter((0..100).map(|k| (k * 2, k)));
        let mut cursor = tree.cursor_at_offset(50);
        let focused = *cursor.key();
        cursor.insert_before(focused - 1, -1);
        assert_eq!(*cursor.key(), focused);
        assert_eq!(cursor.offset(), 51);
        let tree = cursor.finish();
        assert_eq!(tree.len(), 101);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn removal_cascades_to_a_root_collapse() {
        let mut tree = Tree::with_order(3);
        for k in 0..20 {
            tree.insert_or_replace(k, k);
        }
        for k in 0..19 {
            assert!(tree.remove(&k, super::super::KeySelector::Any).is_some());
            tree.check_invariants().unwrap();
        }
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn edits_at_both_ends() {
        let tree: Tree<i32, i32> = Tree::from_sorted_iter((10..20).map(|k| (k, k)));
        let mut cursor = tree.cursor_at_offset(0);
        cursor.insert_before(5, 5);
        assert_eq!(cursor.offset(), 1);
        cursor.move_to_offset(11);
        assert!(cursor.is_at_end());
        cursor.insert_before(99, 99);
        assert!(cursor.is_at_end());
        let tree = cursor.finish();
        assert_eq!(tree.len(), 12);
        assert_eq!(keys(&tree).first(), Some(&5));
        assert_eq!(keys(&tree).last(), Some(&99));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn remove_walks_forward() {
        let tree: Tree<i32, i32> = Tree::from_sorted_iter((0..50).map(|k| (k, k)));
        let mut cursor = tree.cursor_at_offset(10);
        let (k, _) = cursor.remove();
        assert_eq!(k, 10);
        assert_eq!(*cursor.key(), 11);
        assert_eq!(cursor.offset(), 10);
        let tree = cursor.finish();
        assert_eq!(tree.len(), 49);
        tree.check_invariants().unwrap();
    }
}
