//! An ordered map with unique keys.
//!
//! Thin shell over [`Tree`]: the engine happily stores duplicate keys, so
//! the map's job is merely to route every insertion through
//! replace-on-collision and to pick the matching engine operation for each
//! query. Cloning a map is O(1) and shares storage with the original.

use std::{
    fmt,
    ops::{Bound, RangeBounds},
};

use itertools::Itertools;

use crate::tree::{Index, Iter, KeySelector, Tree};

pub struct Map<K, V> {
    tree: Tree<K, V>,
}

impl<K: Ord + Clone, V: Clone> Map<K, V> {
    pub fn new() -> Self {
        Map { tree: Tree::new() }
    }

    pub fn with_order(order: usize) -> Self {
        Map {
            tree: Tree::with_order(order),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.get(key, KeySelector::Any)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.contains(key)
    }

    /// Insert a pair, replacing the payload of an existing equal key. The
    /// prior payload is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.tree.insert_or_replace(key, value)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.tree.remove(key, KeySelector::Any).map(|(_, v)| v)
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.tree.first()
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.tree.last()
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first()
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last()
    }

    /// Ascending iteration over owned pairs.
    pub fn iter(&self) -> Iter<K, V> {
        self.tree.iter()
    }

    /// Ascending iteration over the keys alone.
    pub fn keys(&self) -> Keys<K, V> {
        Keys { inner: self.iter() }
    }

    /// Iteration over the values, in ascending key order.
    pub fn values(&self) -> Values<K, V> {
        Values { inner: self.iter() }
    }

    /// Rank of `key` in the ascending key sequence.
    pub fn offset_of(&self, key: &K) -> Option<usize> {
        self.tree.offset_of(key, KeySelector::Any)
    }

    /// The `offset`-th pair in key order. Panics when out of range.
    pub fn element_at_offset(&self, offset: usize) -> (&K, &V) {
        self.tree.element_at_offset(offset)
    }

    /// A stable handle onto the entry for `key`; invalidated by any
    /// mutation of this map.
    pub fn index_of(&self, key: &K) -> Option<Index<K, V>> {
        self.tree.index_of(key, KeySelector::Any)
    }

    pub fn offset_of_index(&self, index: &Index<K, V>) -> Option<usize> {
        self.tree.offset_of_index(index)
    }

    pub fn element_at_index(&self, index: &Index<K, V>) -> Option<(&K, &V)> {
        self.tree.element_at_index(index)
    }

    /// The entries whose keys fall in `range`, as a new map sharing
    /// subtrees with this one. O(log n).
    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Map<K, V> {
        let start = match range.start_bound() {
            Bound::Unbounded => 0,
            Bound::Included(key) => self.tree.lower_bound_offset(key),
            Bound::Excluded(key) => self.tree.upper_bound_offset(key),
        };
        let end = match range.end_bound() {
            Bound::Unbounded => self.len(),
            Bound::Included(key) => self.tree.upper_bound_offset(key),
            Bound::Excluded(key) => self.tree.lower_bound_offset(key),
        };
        assert!(start <= end, "inverted key range");
        Map {
            tree: self.tree.subtree_at_offsets(start..end),
        }
    }

    /// Keys of both maps; a key present in both keeps `other`'s value.
    pub fn union(self, other: Map<K, V>) -> Map<K, V> {
        Map {
            tree: self.tree.distinct_union(other.tree),
        }
    }

    /// Entries of `self` whose keys are absent from `other`.
    pub fn difference(self, other: Map<K, V>) -> Map<K, V> {
        Map {
            tree: self.tree.subtract(other.tree),
        }
    }

    /// Entries for keys present in both maps, with `other`'s values.
    pub fn intersection(self, other: Map<K, V>) -> Map<K, V> {
        Map {
            tree: self.tree.intersect(other.tree),
        }
    }

    /// Entries for keys present in exactly one of the maps.
    pub fn symmetric_difference(self, other: Map<K, V>) -> Map<K, V> {
        Map {
            tree: self.tree.exclusive_or(other.tree),
        }
    }
}

#[cfg(any(test, feature = "internal-api"))]
impl<K: Ord + Clone, V: Clone> Map<K, V> {
    pub fn check_invariants(&self) -> Result<(), crate::ValidationError> {
        self.tree.check_invariants()
    }
}

/// Iterator over a map's keys.
pub struct Keys<K, V> {
    inner: Iter<K, V>,
}

impl<K: Ord + Clone, V: Clone> Iterator for Keys<K, V> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Ord + Clone, V: Clone> DoubleEndedIterator for Keys<K, V> {
    fn next_back(&mut self) -> Option<K> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K: Ord + Clone, V: Clone> ExactSizeIterator for Keys<K, V> {}

/// Iterator over a map's values in key order.
pub struct Values<K, V> {
    inner: Iter<K, V>,
}

impl<K: Ord + Clone, V: Clone> Iterator for Values<K, V> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Ord + Clone, V: Clone> DoubleEndedIterator for Values<K, V> {
    fn next_back(&mut self) -> Option<V> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K: Ord + Clone, V: Clone> ExactSizeIterator for Values<K, V> {}

impl<K: Ord + Clone, V: Clone> Default for Map<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> Clone for Map<K, V> {
    fn clone(&self) -> Self {
        Map {
            tree: self.tree.clone(),
        }
    }
}

impl<K: Ord + Clone, V: Clone> FromIterator<(K, V)> for Map<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut pairs: Vec<(K, V)> = iter.into_iter().collect();
        // Stable sort plus keep-last collapses colliding keys to the most
        // recent insertion, matching the incremental `insert` semantics.
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let deduped = pairs.into_iter().coalesce(|a, b| {
            if a.0 == b.0 {
                Ok(b)
            } else {
                Err((a, b))
            }
        });
        Map {
            tree: Tree::from_sorted_iter(deduped),
        }
    }
}

impl<K: Ord + Clone, V: Clone> Extend<(K, V)> for Map<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K: Ord + Clone, V: Clone> IntoIterator for &'a Map<K, V> {
    type Item = (K, V);
    type IntoIter = Iter<K, V>;

    fn into_iter(self) -> Iter<K, V> {
        self.iter()
    }
}

impl<K: Ord + Clone + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug for Map<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord + Clone, V: Clone + PartialEq> PartialEq for Map<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Ord + Clone, V: Clone + Eq> Eq for Map<K, V> {}
