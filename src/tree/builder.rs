//! Bulk loader assembling a balanced tree from an ordered stream.
//!
//! Elements fill a *seedling* leaf; each leaf closed at `keys_per_node`
//! moves onto the *sapling* stack, which holds finished subtrees in
//! non-increasing depth order with one separator element between neighbours.
//! Consuming whole subtrees is supported as well, which is what lets the
//! set-algebra engine link shared subtrees into its output without touching
//! their elements.

use std::{mem, sync::Arc};

use log::debug;

use super::{
    node::{unshared, Node},
    path::TreePart,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum BuilderState {
    /// The next element continues the current seedling.
    AwaitingElement,
    /// The current seedling just closed; the next element becomes the
    /// separator in front of whatever follows.
    AwaitingSeparator,
}

/// A finished subtree waiting on the stack, plus the separator between it
/// and the content after it (absent only on the most recent entry).
struct Sapling<K, V> {
    tree: Arc<Node<K, V>>,
    separator: Option<(K, V)>,
}

pub(crate) struct Builder<K, V> {
    order: usize,
    keys_per_node: usize,
    saplings: Vec<Sapling<K, V>>,
    seedling: Node<K, V>,
    state: BuilderState,
}

impl<K: Ord + Clone, V: Clone> Builder<K, V> {
    pub(crate) fn new(order: usize) -> Self {
        // Fully packed leaves give the densest result.
        Self::with_keys_per_node(order, order - 1)
    }

    pub(crate) fn with_keys_per_node(order: usize, keys_per_node: usize) -> Self {
        let probe = Node::<K, V>::leaf(order);
        assert!(
            keys_per_node >= probe.min_keys() && keys_per_node <= probe.max_keys(),
            "keys_per_node {} outside {}..={}",
            keys_per_node,
            probe.min_keys(),
            probe.max_keys(),
        );
        Builder {
            order,
            keys_per_node,
            saplings: Vec::new(),
            seedling: probe,
            state: BuilderState::AwaitingElement,
        }
    }

    /// Append the next element. Elements must arrive in key order; this is
    /// the caller's obligation and only spot-checked in debug builds.
    pub(crate) fn append_element(&mut self, key: K, value: V) {
        debug_assert!(self.seedling.keys.last().map_or(true, |last| *last <= key));
        match self.state {
            BuilderState::AwaitingSeparator => {
                let top = self.saplings.last_mut().expect("separator without a sapling");
                debug_assert!(top.separator.is_none());
                top.separator = Some((key, value));
                self.state = BuilderState::AwaitingElement;
            }
            BuilderState::AwaitingElement => {
                self.seedling.keys.push(key);
                self.seedling.values.push(value);
                self.seedling.count += 1;
                if self.seedling.len() == self.keys_per_node {
                    self.close_seedling(None);
                    self.state = BuilderState::AwaitingSeparator;
                }
            }
        }
    }

    /// Fold a whole subtree into the result. An empty leaf is a no-op and a
    /// non-empty leaf merges into the seedling slot by slot; anything deeper
    /// closes the seedling and grafts onto the sapling stack.
    pub(crate) fn append_subtree(&mut self, node: &Arc<Node<K, V>>) {
        debug_assert_eq!(node.order, self.order);
        if node.count == 0 {
            return;
        }
        if node.is_leaf() {
            for slot in 0..node.len() {
                self.append_element(node.keys[slot].clone(), node.values[slot].clone());
            }
            return;
        }
        if self.state == BuilderState::AwaitingSeparator {
            // A separator is owed before more content may land. Unfold one
            // level of the subtree so its leftmost leaf supplies the
            // separator naturally; the sibling subtrees still graft whole.
            for (slot, child) in node.children.iter().enumerate() {
                self.append_subtree(child);
                if slot < node.len() {
                    self.append_element(node.keys[slot].clone(), node.values[slot].clone());
                }
            }
            return;
        }
        if self.seedling.len() > 0 {
            // Close the seedling early, stealing its last element as the
            // separator in front of the incoming subtree. The remaining
            // leaf may be thin or even empty; `Node::join` copes with both.
            let key = self.seedling.keys.pop().expect("just checked");
            let value = self.seedling.values.pop().expect("just checked");
            self.seedling.count -= 1;
            self.close_seedling(Some((key, value)));
        }
        self.push_sapling(node.clone(), None);
        self.state = BuilderState::AwaitingSeparator;
    }

    /// Feed a region handed out by a path.
    pub(crate) fn append_part(&mut self, part: TreePart<K, V>) {
        match part {
            TreePart::Element(key, value) => self.append_element(key, value),
            TreePart::Subtree(node) => self.append_subtree(&node),
            TreePart::Run(leaf, range) => {
                for slot in range {
                    self.append_element(leaf.keys[slot].clone(), leaf.values[slot].clone());
                }
            }
        }
    }

    /// Join everything into a single balanced root. O(log n): the stack
    /// holds at most a couple of saplings per depth level.
    pub(crate) fn finish(mut self) -> Arc<Node<K, V>> {
        let mut result = Arc::new(mem::replace(
            &mut self.seedling,
            Node::leaf(self.order),
        ));
        while let Some(Sapling { tree, separator }) = self.saplings.pop() {
            result = match separator {
                Some(separator) => Node::join(tree, separator, result),
                None => {
                    debug_assert_eq!(result.count, 0, "missing separator mid-stack");
                    tree
                }
            };
        }
        result
    }

    fn close_seedling(&mut self, separator: Option<(K, V)>) {
        let leaf = mem::replace(&mut self.seedling, Node::leaf(self.order));
        self.push_sapling(Arc::new(leaf), separator);
    }

    /// Push a finished subtree, restoring the stack's depth ordering.
    ///
    /// Two equally deep, fully packed neighbours pair up under a fresh
    /// parent; an under-full parent one level deeper absorbs the newcomer as
    /// its rightmost child; every other combination goes through the general
    /// join. Pairing cascades like a binary counter, which is what keeps the
    /// stack logarithmic.
    fn push_sapling(&mut self, mut new: Arc<Node<K, V>>, trailing: Option<(K, V)>) {
        while let Some(top) = self.saplings.last() {
            if top.tree.depth > new.depth + 1 {
                break;
            }
            let Sapling { tree: top, separator } = self.saplings.pop().expect("just checked");
            let separator = separator.expect("adjacent saplings without a separator");
            if top.depth == new.depth + 1
                && top.children.len() <= self.keys_per_node
                && new.len() >= new.min_keys()
            {
                let mut wide = unshared(top);
                wide.keys.push(separator.0);
                wide.values.push(separator.1);
                wide.count += 1 + new.count;
                wide.children.push(new);
                self.saplings.push(Sapling {
                    tree: Arc::new(wide),
                    separator: trailing,
                });
                return;
            }
            if top.depth == new.depth
                && top.len() == self.keys_per_node
                && new.len() == self.keys_per_node
            {
                new = Arc::new(Node::joined(top, separator, new));
            } else {
                debug!(
                    "builder: irregular graft, depths {} and {}",
                    top.depth, new.depth
                );
                new = Node::join(top, separator, new);
            }
        }
        self.saplings.push(Sapling {
            tree: new,
            separator: trailing,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::super::Tree;
    use super::*;
    use quickcheck_macros::quickcheck;

    fn drain(tree: &Tree<i32, i32>) -> Vec<i32> {
        tree.iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn build_iterate_round_trip() {
        let mut builder = Builder::new(8);
        for k in 0..1000 {
            builder.append_element(k, k * 3);
        }
        let root = builder.finish();
        root.check(8, true).unwrap();
        let tree = Tree { root };
        assert_eq!(drain(&tree), (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn empty_and_tiny_builds() {
        let builder: Builder<i32, i32> = Builder::new(8);
        let root = builder.finish();
        assert_eq!(root.count, 0);

        let mut builder = Builder::new(8);
        builder.append_element(1, 1);
        let root = builder.finish();
        assert_eq!(root.count, 1);
        root.check(8, true).unwrap();
    }

    #[test]
    fn sparse_packing_is_respected() {
        let mut builder = Builder::with_keys_per_node(8, 3);
        for k in 0..500 {
            builder.append_element(k, k);
        }
        let root = builder.finish();
        root.check(8, true).unwrap();
        assert_eq!(root.count, 500);
    }

    #[test]
    fn whole_subtrees_fold_in_between_elements() {
        let chunk: Tree<i32, i32> =
            Tree::from_sorted_iter_with_order(4, (100..200).map(|k| (k, k)));
        let mut builder = Builder::new(4);
        for k in 0..100 {
            builder.append_element(k, k);
        }
        builder.append_subtree(chunk.root());
        for k in 200..300 {
            builder.append_element(k, k);
        }
        let root = builder.finish();
        root.check(4, true).unwrap();
        let tree = Tree { root };
        assert_eq!(drain(&tree), (0..300).collect::<Vec<_>>());
    }

    #[test]
    fn subtree_arriving_while_a_separator_is_owed() {
        // Order 4, keys_per_node 3: exactly 3 elements close the seedling,
        // so the subtree lands in the AwaitingSeparator state.
        let chunk: Tree<i32, i32> =
            Tree::from_sorted_iter_with_order(4, (10..90).map(|k| (k, k)));
        let mut builder = Builder::new(4);
        for k in 0..3 {
            builder.append_element(k, k);
        }
        builder.append_subtree(chunk.root());
        let root = builder.finish();
        root.check(4, true).unwrap();
        let tree = Tree { root };
        let expected: Vec<i32> = (0..3).chain(10..90).collect();
        assert_eq!(drain(&tree), expected);
    }

    #[quickcheck]
    fn random_split_points_round_trip(splits: Vec<u8>) {
        // Interleave element runs and pre-built subtrees at arbitrary
        // boundaries; the output must always be the full sorted sequence.
        let mut builder = Builder::new(4);
        let mut next = 0i32;
        for chunk in splits.iter().take(12) {
            let len = i32::from(*chunk % 17);
            if *chunk % 2 == 0 {
                for k in next..next + len {
                    builder.append_element(k, k);
                }
            } else if len > 0 {
                let sub: Tree<i32, i32> =
                    Tree::from_sorted_iter_with_order(4, (next..next + len).map(|k| (k, k)));
                builder.append_subtree(sub.root());
            }
            next += len;
        }
        let root = builder.finish();
        root.check(4, true).unwrap();
        let tree = Tree { root };
        assert_eq!(drain(&tree), (0..next).collect::<Vec<_>>());
    }
}
