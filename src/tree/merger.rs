//! Bulk set algebra over two trees.
//!
//! Two strong paths sweep the operand trees left to right while a builder
//! assembles the output. Every phase either copies or skips a maximal region
//! bounded by the other operand's current key, so the work done is
//! proportional to how often the two key sequences interleave rather than to
//! the total element count. Runs of equal keys additionally probe for
//! subtrees shared between the operands (same allocation, detected by
//! pointer identity) and link them into the output, or step over them,
//! without visiting their elements.

use std::sync::Arc;

use log::debug;

use super::{
    builder::Builder,
    path::{Limit, Path},
    Tree,
};

struct Merger<K, V> {
    first: Path<K, V>,
    second: Path<K, V>,
    builder: Builder<K, V>,
}

impl<K: Ord + Clone, V: Clone> Merger<K, V> {
    fn new(first: Tree<K, V>, second: Tree<K, V>) -> Self {
        assert_eq!(
            first.root.order, second.root.order,
            "bulk set operations require operands of equal order"
        );
        let order = first.root.order;
        Merger {
            first: Path::at_start(first.root),
            second: Path::at_start(second.root),
            builder: Builder::new(order),
        }
    }

    fn either_done(&self) -> bool {
        self.first.is_at_end() || self.second.is_at_end()
    }

    /// Copy elements of the first operand strictly below (or, with
    /// `Including`, also at) the second operand's current key.
    fn copy_from_first(&mut self, limit: Limit) {
        let boundary = self.second.key().clone();
        while let Some(part) = self.first.next_part(&boundary, limit) {
            self.builder.append_part(part);
        }
    }

    fn copy_from_second(&mut self, limit: Limit) {
        let boundary = self.first.key().clone();
        while let Some(part) = self.second.next_part(&boundary, limit) {
            self.builder.append_part(part);
        }
    }

    fn skip_from_first(&mut self, limit: Limit) {
        let boundary = self.second.key().clone();
        while self.first.next_part(&boundary, limit).is_some() {}
    }

    fn skip_from_second(&mut self, limit: Limit) {
        let boundary = self.first.key().clone();
        while self.second.next_part(&boundary, limit).is_some() {}
    }

    /// Walk a run of equal keys on both operands, appending the second
    /// operand's elements when `copy` is set and discarding them otherwise.
    /// Both positions sitting at the start of one shared subtree consume it
    /// in a single step.
    fn common_elements(&mut self, copy: bool) {
        while !self.either_done() && self.first.key() == self.second.key() {
            if let Some((first_level, second_level)) = self.shared_alignment() {
                let subtree = self.second.node_at(second_level).clone();
                if copy {
                    self.builder.append_subtree(&subtree);
                }
                self.first.skip_subtree_at(first_level);
                self.second.skip_subtree_at(second_level);
            } else {
                if copy {
                    let (key, value) = self.second.element_cloned();
                    self.builder.append_element(key, value);
                }
                self.first.move_forward();
                self.second.move_forward();
            }
        }
    }

    /// Topmost trail levels at which both paths focus the start of the same
    /// allocation. Identity comparison only; structurally equal but
    /// separately built subtrees are handled element-wise.
    fn shared_alignment(&self) -> Option<(usize, usize)> {
        if self.first.focused_slot() != Some(0) || self.second.focused_slot() != Some(0) {
            return None;
        }
        let mut a = self.first.trail_len() - 1;
        let mut b = self.second.trail_len() - 1;
        if !Arc::ptr_eq(self.first.node_at(a), self.second.node_at(b)) {
            return None;
        }
        while a > 0
            && b > 0
            && self.first.slot_at(a - 1) == 0
            && self.second.slot_at(b - 1) == 0
            && Arc::ptr_eq(self.first.node_at(a - 1), self.second.node_at(b - 1))
        {
            a -= 1;
            b -= 1;
        }
        Some((a, b))
    }

    fn append_first_remainder(&mut self) {
        while let Some(part) = self.first.next_remaining_part() {
            self.builder.append_part(part);
        }
    }

    fn append_second_remainder(&mut self) {
        while let Some(part) = self.second.next_remaining_part() {
            self.builder.append_part(part);
        }
    }

    fn parts_consumed(&self) -> usize {
        self.first.parts + self.second.parts
    }

    fn finish(self) -> Tree<K, V> {
        Tree {
            root: self.builder.finish(),
        }
    }
}

/// Multiset union: every element of both operands survives. Equal keys come
/// out with all first-operand occurrences before the second operand's.
pub(super) fn union<K: Ord + Clone, V: Clone>(first: Tree<K, V>, second: Tree<K, V>) -> Tree<K, V> {
    let mut m = Merger::new(first, second);
    while !m.either_done() {
        m.copy_from_first(Limit::Including);
        if m.either_done() {
            break;
        }
        m.copy_from_second(Limit::Excluding);
    }
    m.append_first_remainder();
    m.append_second_remainder();
    debug!("union consumed {} parts", m.parts_consumed());
    m.finish()
}

/// Union without cross-operand duplicates: keys present in both trees keep
/// only the second operand's element.
pub(super) fn distinct_union<K: Ord + Clone, V: Clone>(
    first: Tree<K, V>,
    second: Tree<K, V>,
) -> Tree<K, V> {
    let mut m = Merger::new(first, second);
    while !m.either_done() {
        m.copy_from_first(Limit::Excluding);
        if m.either_done() {
            break;
        }
        m.copy_from_second(Limit::Excluding);
        m.common_elements(true);
    }
    m.append_first_remainder();
    m.append_second_remainder();
    m.finish()
}

/// Elements of the first operand whose keys do not occur in the second.
pub(super) fn subtract<K: Ord + Clone, V: Clone>(
    first: Tree<K, V>,
    second: Tree<K, V>,
) -> Tree<K, V> {
    let mut m = Merger::new(first, second);
    while !m.either_done() {
        m.copy_from_first(Limit::Excluding);
        if m.either_done() {
            break;
        }
        m.skip_from_second(Limit::Excluding);
        m.common_elements(false);
    }
    m.append_first_remainder();
    m.finish()
}

/// Elements whose keys occur in exactly one operand.
pub(super) fn exclusive_or<K: Ord + Clone, V: Clone>(
    first: Tree<K, V>,
    second: Tree<K, V>,
) -> Tree<K, V> {
    let mut m = Merger::new(first, second);
    while !m.either_done() {
        m.copy_from_first(Limit::Excluding);
        if m.either_done() {
            break;
        }
        m.copy_from_second(Limit::Excluding);
        m.common_elements(false);
    }
    m.append_first_remainder();
    m.append_second_remainder();
    m.finish()
}

/// Elements of the second operand whose keys also occur in the first.
pub(super) fn intersect<K: Ord + Clone, V: Clone>(
    first: Tree<K, V>,
    second: Tree<K, V>,
) -> Tree<K, V> {
    let mut m = Merger::new(first, second);
    while !m.either_done() {
        m.skip_from_first(Limit::Excluding);
        if m.either_done() {
            break;
        }
        m.skip_from_second(Limit::Excluding);
        m.common_elements(true);
    }
    m.finish()
}
