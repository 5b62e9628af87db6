//! End-to-end walks through the documented behaviour of the engine.

use grove::{KeySelector, Tree};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

#[test]
fn build_iterate_round_trip() {
    crate::init_logs();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    let mut keys: Vec<u32> = (0..10_000).map(|_| rng.gen_range(0..1_000_000)).collect();
    keys.sort_unstable();

    let tree: Tree<u32, u32> = Tree::from_sorted_iter(keys.iter().map(|&k| (k, k)));
    tree.check_invariants().unwrap();
    assert!(tree.iter().map(|(k, _)| k).eq(keys.into_iter()));
}

#[test]
fn index_and_offset_are_inverse() {
    let tree: Tree<u32, u32> = Tree::from_sorted_iter((0..5000u32).map(|k| (k * 3, k)));
    for offset in (0..5000usize).step_by(137) {
        let index = tree.index_at_offset(offset);
        assert_eq!(tree.offset_of_index(&index), Some(offset));
        let (key, value) = tree.element_at_index(&index).unwrap();
        let direct = tree.element_at_offset(offset);
        assert_eq!((key, value), direct);
    }
}

#[test]
fn copy_on_write_isolation_with_shared_nodes() {
    crate::init_logs();
    let original: Tree<u32, u32> =
        Tree::from_sorted_iter_with_order(8, (0..1000u32).map(|k| (k, k)));
    let mut copy = original.clone();

    // Freshly cloned handles share the entire structure.
    assert_eq!(
        original.count_shared_nodes(&copy),
        original.node_count()
    );

    let offset = copy.offset_of(&500, KeySelector::Any).unwrap();
    copy.set_payload_at_offset(offset, u32::MAX);

    assert_eq!(original.get(&500, KeySelector::Any), Some(&500));
    assert_eq!(copy.get(&500, KeySelector::Any), Some(&u32::MAX));

    // Only the path from the root to key 500 was rewritten; every other
    // allocation is still referenced from both trees.
    let shared = original.count_shared_nodes(&copy);
    assert!(shared >= original.node_count() - (original.depth() + 1));
    assert!(shared < original.node_count());

    original.check_invariants().unwrap();
    copy.check_invariants().unwrap();
}

#[test]
fn cursor_performs_a_batch_edit() {
    let tree: Tree<u32, u32> = Tree::from_sorted_iter((0..1000u32).map(|k| (k, k)));
    let mut cursor = tree.cursor_at_offset(100);
    assert_eq!(*cursor.key(), 100);
    for n in 0..10 {
        cursor.insert_after(100, 10_000 + n);
    }
    for _ in 0..5 {
        cursor.remove();
    }
    let tree = cursor.finish();
    assert_eq!(tree.len(), 1005);
    tree.check_invariants().unwrap();
}

#[test]
fn insert_remove_round_trip_preserves_equality() {
    let original: Tree<u32, u32> = Tree::from_sorted_iter((0..500u32).map(|k| (k * 2, k)));
    let mut tree = original.clone();
    tree.insert_or_replace(301, 0);
    tree.remove(&301, KeySelector::Any);
    assert_eq!(tree, original);
}

#[test]
fn splits_and_joins_preserve_every_element() {
    let tree: Tree<u32, u32> = Tree::from_sorted_iter_with_order(6, (0..2000u32).map(|k| (k, k)));
    for offset in [0usize, 1, 999, 1000, 1999, 2000] {
        let (low, high) = tree.split_at_offset(offset);
        low.check_invariants().unwrap();
        high.check_invariants().unwrap();
        assert_eq!(low.len() + high.len(), 2000);
        let rejoined = Tree::concat(low, high);
        rejoined.check_invariants().unwrap();
        assert_eq!(rejoined, tree);
    }
}
