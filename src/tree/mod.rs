//! The copy-on-write B-tree engine.
//!
//! [`Tree`] owns a reference-counted root node and behaves like a value: a
//! clone is O(1) and shares every node with the original until one of the
//! two is edited. Single-element edits run through a [`Cursor`] that clones
//! exactly the nodes on the edited path; bulk construction runs through the
//! builder, and the set operations combine two trees by linking shared
//! subtrees instead of copying elements.
//!
//! Keys are ordered and may repeat; iteration yields equal keys in their
//! insertion order. The [`crate::Map`] facade enforces key uniqueness on
//! top of this engine, and [`crate::List`] uses a sentinel key type so that
//! positions come from the cached subtree counts alone.

use std::{fmt, mem, ops::Range, sync::Arc};

use self::node::{Node, PositionSlot};
use self::path::Path;

mod builder;
mod cursor;
mod index;
mod merger;
mod node;
mod path;
mod range;

pub use self::cursor::Cursor;
pub use self::index::Index;
pub use self::range::Iter;

pub(crate) use self::node::default_order;

#[cfg(any(test, feature = "internal-api"))]
use crate::errors::ValidationError;

/// Which occurrence of a duplicated key an operation should pick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeySelector {
    /// The leftmost occurrence.
    First,
    /// The rightmost occurrence.
    Last,
    /// Whichever occurrence the descent happens to hit first.
    Any,
}

/// An ordered collection of key and payload pairs over shared storage.
pub struct Tree<K, V> {
    root: Arc<Node<K, V>>,
}

impl<K, V> Clone for Tree<K, V> {
    fn clone(&self) -> Self {
        Tree {
            root: self.root.clone(),
        }
    }
}

impl<K: Ord + Clone, V: Clone> Default for Tree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> Tree<K, V> {
    /// An empty tree with a fanout suited to the key size.
    pub fn new() -> Self {
        Self::with_order(node::default_order(mem::size_of::<K>()))
    }

    /// An empty tree with an explicit fanout. `order` is the maximum number
    /// of children of an internal node and must be at least 3.
    pub fn with_order(order: usize) -> Self {
        assert!(order >= 3, "order {} is too small for a B-tree", order);
        Tree {
            root: Arc::new(Node::leaf(order)),
        }
    }

    /// Bulk-load from a stream already sorted by key. Panics when the stream
    /// disobeys the ordering.
    pub fn from_sorted_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_sorted_iter_with_order(node::default_order(mem::size_of::<K>()), iter)
    }

    pub fn from_sorted_iter_with_order<I: IntoIterator<Item = (K, V)>>(
        order: usize,
        iter: I,
    ) -> Self {
        Self::load_sorted(builder::Builder::new(order), iter)
    }

    /// Bulk-load with an explicit per-leaf density. Values below the
    /// maximum leave headroom in every node, which trades memory for
    /// cheaper subsequent insertions.
    pub fn from_sorted_iter_packed<I: IntoIterator<Item = (K, V)>>(
        order: usize,
        keys_per_node: usize,
        iter: I,
    ) -> Self {
        Self::load_sorted(builder::Builder::with_keys_per_node(order, keys_per_node), iter)
    }

    fn load_sorted<I: IntoIterator<Item = (K, V)>>(
        mut builder: builder::Builder<K, V>,
        iter: I,
    ) -> Self {
        let mut last: Option<K> = None;
        for (key, value) in iter {
            if let Some(last) = &last {
                assert!(last <= &key, "from_sorted_iter: keys out of order");
            }
            last = Some(key.clone());
            builder.append_element(key, value);
        }
        Tree {
            root: builder.finish(),
        }
    }

    pub fn len(&self) -> usize {
        self.root.count
    }

    pub fn is_empty(&self) -> bool {
        self.root.count == 0
    }

    /// Number of edges between the root and the leaves.
    pub fn depth(&self) -> usize {
        self.root.depth
    }

    pub(crate) fn order(&self) -> usize {
        self.root.order
    }

    pub(crate) fn root(&self) -> &Arc<Node<K, V>> {
        &self.root
    }

    /// Swap this handle for an empty one, keeping the original by value.
    /// The cursor-based edits below work on the extracted tree.
    fn take(&mut self) -> Tree<K, V> {
        let order = self.root.order;
        mem::replace(
            self,
            Tree {
                root: Arc::new(Node::leaf(order)),
            },
        )
    }

    // -- lookups ------------------------------------------------------------

    pub fn get(&self, key: &K, selector: KeySelector) -> Option<&V> {
        let mut node: &Node<K, V> = &self.root;
        let mut best: Option<&V> = None;
        loop {
            let found = node.slot_of_key(key, selector);
            if let Some(slot) = found.matching {
                match selector {
                    KeySelector::Any => return Some(&node.values[slot]),
                    _ => best = Some(&node.values[slot]),
                }
            }
            if node.is_leaf() {
                return best;
            }
            node = &node.children[found.descent];
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key, KeySelector::Any).is_some()
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        if self.is_empty() {
            None
        } else {
            Some(self.element_at_offset(0))
        }
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        if self.is_empty() {
            None
        } else {
            Some(self.element_at_offset(self.len() - 1))
        }
    }

    /// The element at a global position. Panics when out of range.
    pub fn element_at_offset(&self, offset: usize) -> (&K, &V) {
        assert!(offset < self.len(), "offset {} out of range", offset);
        let mut node: &Node<K, V> = &self.root;
        let mut local = offset;
        loop {
            match node.slot_of_position(local) {
                PositionSlot::Element(slot) => return (&node.keys[slot], &node.values[slot]),
                PositionSlot::Child { slot, local: inner } => {
                    node = &node.children[slot];
                    local = inner;
                }
            }
        }
    }

    /// Position of the chosen occurrence of `key`, if present.
    pub fn offset_of(&self, key: &K, selector: KeySelector) -> Option<usize> {
        let (offset, found) = self.locate(key, selector);
        found.then_some(offset)
    }

    /// Position plus a hit flag; a miss reports where the key would insert.
    fn locate(&self, key: &K, selector: KeySelector) -> (usize, bool) {
        let mut node: &Node<K, V> = &self.root;
        let mut start = 0;
        let mut best: Option<usize> = None;
        loop {
            let found = node.slot_of_key(key, selector);
            if let Some(slot) = found.matching {
                let offset = start + node.position_of_slot(slot);
                if let KeySelector::Any = selector {
                    return (offset, true);
                }
                best = Some(offset);
            }
            if node.is_leaf() {
                return match best {
                    Some(offset) => (offset, true),
                    None => (start + found.descent, false),
                };
            }
            start += node.position_of_child(found.descent);
            node = &node.children[found.descent];
        }
    }

    /// Position of the first element with a key at or above `key`.
    pub(crate) fn lower_bound_offset(&self, key: &K) -> usize {
        self.locate(key, KeySelector::First).0
    }

    /// Position just after the last element with a key at or below `key`.
    pub(crate) fn upper_bound_offset(&self, key: &K) -> usize {
        let (offset, found) = self.locate(key, KeySelector::Last);
        if found {
            offset + 1
        } else {
            offset
        }
    }

    // -- single-element edits -----------------------------------------------

    /// Insert an element, replacing the payload of an equal key if one
    /// exists; the prior payload is returned.
    pub fn insert_or_replace(&mut self, key: K, value: V) -> Option<V> {
        let (offset, found) = self.locate(&key, KeySelector::Any);
        let mut cursor = Cursor::new(self.take(), offset);
        let prior = if found {
            Some(cursor.replace_payload(value))
        } else {
            cursor.insert_before(key, value);
            None
        };
        *self = cursor.finish();
        prior
    }

    /// Insert at a position; the caller is responsible for keeping the keys
    /// ordered (the list facade inserts equal sentinel keys everywhere).
    pub fn insert_at_offset(&mut self, offset: usize, key: K, value: V) {
        assert!(offset <= self.len(), "offset {} out of range", offset);
        let mut cursor = Cursor::new(self.take(), offset);
        cursor.insert_before(key, value);
        *self = cursor.finish();
    }

    /// Remove the chosen occurrence of `key`.
    pub fn remove(&mut self, key: &K, selector: KeySelector) -> Option<(K, V)> {
        let (offset, found) = self.locate(key, selector);
        if !found {
            return None;
        }
        Some(self.remove_at_offset(offset))
    }

    pub fn remove_at_offset(&mut self, offset: usize) -> (K, V) {
        assert!(offset < self.len(), "offset {} out of range", offset);
        let mut cursor = Cursor::new(self.take(), offset);
        let removed = cursor.remove();
        *self = cursor.finish();
        removed
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        if self.is_empty() {
            None
        } else {
            Some(self.remove_at_offset(0))
        }
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        if self.is_empty() {
            None
        } else {
            Some(self.remove_at_offset(self.len() - 1))
        }
    }

    /// Replace the payload at a position, returning the previous one.
    pub fn set_payload_at_offset(&mut self, offset: usize, value: V) -> V {
        assert!(offset < self.len(), "offset {} out of range", offset);
        let mut cursor = Cursor::new(self.take(), offset);
        let prior = cursor.replace_payload(value);
        *self = cursor.finish();
        prior
    }

    /// Open a cursor positioned at `offset`, taking the tree with it. The
    /// tree comes back from [`Cursor::finish`].
    pub fn cursor_at_offset(self, offset: usize) -> Cursor<K, V> {
        Cursor::new(self, offset)
    }

    // -- iteration and indexes ----------------------------------------------

    pub fn iter(&self) -> Iter<K, V> {
        Iter::over_tree(self.root.clone())
    }

    /// Iterate over a half-open range of positions.
    pub fn range_at_offsets(&self, range: Range<usize>) -> Iter<K, V> {
        assert!(range.start <= range.end && range.end <= self.len());
        Iter::over_offsets(self.root.clone(), range)
    }

    /// Iterate from the chosen occurrence of `key` (or, when absent, from
    /// the first greater element) to the end.
    pub fn iter_from_key(&self, key: &K, selector: KeySelector) -> Iter<K, V> {
        let (start, _) = self.locate(key, selector);
        Iter::over_offsets(self.root.clone(), start..self.len())
    }

    /// A stable handle to the chosen occurrence of `key`. The handle stays
    /// usable for lookups until the tree is structurally mutated.
    pub fn index_of(&self, key: &K, selector: KeySelector) -> Option<Index<K, V>> {
        let path = Path::at_key(self.root.clone(), key, selector);
        if path.is_at_end() || path.key() != key {
            return None;
        }
        Some(Index::from_path(&path))
    }

    /// A stable handle to the element at `offset`; `offset == len` yields
    /// the past-the-end index.
    pub fn index_at_offset(&self, offset: usize) -> Index<K, V> {
        assert!(offset <= self.len(), "offset {} out of range", offset);
        Index::from_path(&Path::at_offset(self.root.clone(), offset))
    }

    /// Position of an index, or `None` once the index went stale.
    pub fn offset_of_index(&self, index: &Index<K, V>) -> Option<usize> {
        index.resolve(self)
    }

    pub fn element_at_index(&self, index: &Index<K, V>) -> Option<(&K, &V)> {
        let offset = index.resolve(self)?;
        if offset == self.len() {
            return None;
        }
        Some(self.element_at_offset(offset))
    }

    pub fn index_after(&self, index: &Index<K, V>) -> Option<Index<K, V>> {
        let offset = index.resolve(self)?;
        if offset >= self.len() {
            return None;
        }
        Some(self.index_at_offset(offset + 1))
    }

    pub fn index_before(&self, index: &Index<K, V>) -> Option<Index<K, V>> {
        let offset = index.resolve(self)?;
        if offset == 0 {
            return None;
        }
        Some(self.index_at_offset(offset - 1))
    }

    // -- splitting and joining ----------------------------------------------

    /// The elements in a half-open range of positions, as a new tree sharing
    /// the untouched subtrees. O(log n).
    pub fn subtree_at_offsets(&self, range: Range<usize>) -> Tree<K, V> {
        assert!(range.start <= range.end && range.end <= self.len());
        if range.is_empty() {
            return Tree::with_order(self.order());
        }
        let upto = if range.end == self.len() {
            self.clone()
        } else {
            Tree {
                root: Path::at_offset(self.root.clone(), range.end).prefix_tree(),
            }
        };
        if range.start == 0 {
            upto
        } else {
            Tree {
                root: Path::at_offset(upto.root.clone(), range.start - 1).suffix_tree(),
            }
        }
    }

    /// The elements between two indexes (half-open), provided both still
    /// resolve against this tree. O(log n).
    pub fn subtree_between_indexes(
        &self,
        from: &Index<K, V>,
        to: &Index<K, V>,
    ) -> Option<Tree<K, V>> {
        let start = from.resolve(self)?;
        let end = to.resolve(self)?;
        assert!(start <= end, "inverted index range");
        Some(self.subtree_at_offsets(start..end))
    }

    /// The elements with keys in `[from, to)`. O(log n).
    pub fn subtree_in_key_range(&self, from: &K, to: &K) -> Tree<K, V> {
        assert!(from <= to, "inverted key range");
        let start = self.lower_bound_offset(from);
        let end = self.lower_bound_offset(to);
        self.subtree_at_offsets(start..end)
    }

    /// Split into the elements before and from `offset` on. O(log n).
    pub fn split_at_offset(&self, offset: usize) -> (Tree<K, V>, Tree<K, V>) {
        assert!(offset <= self.len(), "offset {} out of range", offset);
        (
            self.subtree_at_offsets(0..offset),
            self.subtree_at_offsets(offset..self.len()),
        )
    }

    /// Split out the element at `offset` together with the trees on either
    /// side of it. O(log n).
    pub fn split_around_offset(&self, offset: usize) -> (Tree<K, V>, (K, V), Tree<K, V>) {
        assert!(offset < self.len(), "offset {} out of range", offset);
        let (prefix, element, suffix) =
            Path::at_offset(self.root.clone(), offset).split_tree();
        (Tree { root: prefix }, element, Tree { root: suffix })
    }

    /// Build a tree out of `left`, then `separator`, then `right`. The
    /// caller must keep the key order intact. O(|depth(left) - depth(right)|).
    pub fn joined(left: Tree<K, V>, separator: (K, V), right: Tree<K, V>) -> Tree<K, V> {
        assert_eq!(left.order(), right.order(), "joining trees of unequal order");
        debug_assert!(left.last().map_or(true, |(k, _)| *k <= separator.0));
        debug_assert!(right.first().map_or(true, |(k, _)| separator.0 <= *k));
        Tree {
            root: Node::join(left.root, separator, right.root),
        }
    }

    /// Concatenate two trees whose key ranges do not overlap out of order.
    pub fn concat(left: Tree<K, V>, mut right: Tree<K, V>) -> Tree<K, V> {
        assert_eq!(left.order(), right.order(), "joining trees of unequal order");
        if left.is_empty() {
            return right;
        }
        if right.is_empty() {
            return left;
        }
        let separator = right.remove_at_offset(0);
        Tree::joined(left, separator, right)
    }

    // -- bulk set algebra ----------------------------------------------------

    /// Multiset union keeping every element of both operands. Equal keys
    /// yield all elements of `self` before those of `other`.
    pub fn union(self, other: Tree<K, V>) -> Tree<K, V> {
        merger::union(self, other)
    }

    /// Union that keeps a single element per key shared by both operands,
    /// taking it from `other`.
    pub fn distinct_union(self, other: Tree<K, V>) -> Tree<K, V> {
        merger::distinct_union(self, other)
    }

    /// Elements of `self` whose keys are absent from `other`.
    pub fn subtract(self, other: Tree<K, V>) -> Tree<K, V> {
        merger::subtract(self, other)
    }

    /// Elements whose keys occur in exactly one operand.
    pub fn exclusive_or(self, other: Tree<K, V>) -> Tree<K, V> {
        merger::exclusive_or(self, other)
    }

    /// Elements of `other` whose keys also occur in `self`.
    pub fn intersect(self, other: Tree<K, V>) -> Tree<K, V> {
        merger::intersect(self, other)
    }
}

#[cfg(any(test, feature = "internal-api"))]
impl<K: Ord + Clone, V: Clone> Tree<K, V> {
    /// Cross-check every structural invariant of the tree.
    pub fn check_invariants(&self) -> Result<(), ValidationError> {
        self.root.check(self.root.order, true)
    }

    /// Number of node allocations reachable from both trees. Exposes the
    /// copy-on-write sharing for tests and debugging tools.
    pub fn count_shared_nodes(&self, other: &Tree<K, V>) -> usize {
        use std::collections::HashSet;
        let mut own = Vec::new();
        Node::collect_identities(&self.root, &mut own);
        let own: HashSet<_> = own.into_iter().collect();
        let mut theirs = Vec::new();
        Node::collect_identities(&other.root, &mut theirs);
        theirs.into_iter().filter(|ptr| own.contains(ptr)).count()
    }

    /// Total number of node allocations in this tree.
    pub fn node_count(&self) -> usize {
        let mut own = Vec::new();
        Node::collect_identities(&self.root, &mut own);
        own.len()
    }
}

impl<K: Ord + Clone + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug for Tree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord + Clone, V: Clone + PartialEq> PartialEq for Tree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Ord + Clone, V: Clone + Eq> Eq for Tree<K, V> {}

impl<'a, K: Ord + Clone, V: Clone> IntoIterator for &'a Tree<K, V> {
    type Item = (K, V);
    type IntoIter = Iter<K, V>;

    fn into_iter(self) -> Iter<K, V> {
        self.iter()
    }
}
