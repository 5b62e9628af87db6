//! Weak-reference indexes into a tree.
//!
//! An index remembers the trail to one element without keeping the nodes
//! alive. Any structural mutation of the originating tree replaces the nodes
//! along the edited path, so a stale index fails to re-resolve instead of
//! silently pointing at the wrong element. Two invalidated indexes compare
//! equal; a live index never equals a dead one.

use std::sync::{Arc, Weak};

use super::{node::Node, path::Path, Tree};

#[derive(Debug)]
pub struct Index<K, V> {
    /// Weak trail from the root to the element, with the slot taken in each
    /// node. The past-the-end index keeps only the root entry.
    trail: Vec<(Weak<Node<K, V>>, usize)>,
    offset: usize,
    count: usize,
}

impl<K: Ord + Clone, V: Clone> Index<K, V> {
    pub(super) fn from_path(path: &Path<K, V>) -> Self {
        let mut trail = Vec::with_capacity(path.trail_len());
        if path.is_at_end() {
            trail.push((Arc::downgrade(path.node_at(0)), 0));
        } else {
            for level in 0..path.trail_len() {
                trail.push((Arc::downgrade(path.node_at(level)), path.slot_at(level)));
            }
        }
        Index {
            trail,
            offset: path.offset(),
            count: path.count(),
        }
    }

    /// The element offset, provided the index still refers into `tree`.
    pub(super) fn resolve(&self, tree: &Tree<K, V>) -> Option<usize> {
        let root = self.resolve_links()?;
        if !Arc::ptr_eq(&root, &tree.root) {
            return None;
        }
        Some(self.offset)
    }

    /// Walk the weak trail, confirming every parent still owns the child the
    /// index remembers. Returns the root on success.
    fn resolve_links(&self) -> Option<Arc<Node<K, V>>> {
        let root = self.trail.first()?.0.upgrade()?;
        if self.offset == self.count {
            return Some(root);
        }
        let mut node = root.clone();
        for level in 0..self.trail.len() - 1 {
            let slot = self.trail[level].1;
            let child = self.trail[level + 1].0.upgrade()?;
            if slot >= node.children.len() || !Arc::ptr_eq(&node.children[slot], &child) {
                return None;
            }
            node = child;
        }
        let slot = self.trail.last()?.1;
        if slot >= node.len() {
            return None;
        }
        Some(root)
    }
}

impl<K: Ord + Clone, V: Clone> PartialEq for Index<K, V> {
    fn eq(&self, other: &Self) -> bool {
        match (self.resolve_links(), other.resolve_links()) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b) && self.offset == other.offset,
            _ => false,
        }
    }
}

impl<K: Ord + Clone, V: Clone> Eq for Index<K, V> {}

impl<K: Ord + Clone, V: Clone> Clone for Index<K, V> {
    fn clone(&self) -> Self {
        Index {
            trail: self.trail.clone(),
            offset: self.offset,
            count: self.count,
        }
    }
}
