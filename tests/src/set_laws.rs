//! Algebraic laws of the bulk set operations, on randomised operands.

use std::collections::BTreeSet;

use grove::Tree;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

fn random_tree(seed: u64, span: u32, len: usize) -> (Tree<u32, u32>, BTreeSet<u32>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let keys: BTreeSet<u32> = (0..len).map(|_| rng.gen_range(0..span)).collect();
    let tree = Tree::from_sorted_iter_with_order(8, keys.iter().map(|&k| (k, k)));
    (tree, keys)
}

fn keys(tree: &Tree<u32, u32>) -> Vec<u32> {
    tree.iter().map(|(k, _)| k).collect()
}

#[test]
fn union_is_commutative_as_a_multiset() {
    crate::init_logs();
    for seed in 0..8 {
        let (a, _) = random_tree(seed, 300, 200);
        let (b, _) = random_tree(seed + 100, 300, 200);
        let ab = keys(&a.clone().union(b.clone()));
        let ba = keys(&b.union(a));
        assert_eq!(ab, ba);
    }
}

#[test]
fn operations_match_the_set_model() {
    for seed in 0..8 {
        let (a, sa) = random_tree(seed, 400, 250);
        let (b, sb) = random_tree(seed * 31 + 1, 400, 250);

        let distinct = keys(&a.clone().distinct_union(b.clone()));
        assert!(distinct.iter().copied().eq(sa.union(&sb).copied()));

        let inter = keys(&a.clone().intersect(b.clone()));
        assert!(inter.iter().copied().eq(sa.intersection(&sb).copied()));

        let diff = keys(&a.clone().subtract(b.clone()));
        assert!(diff.iter().copied().eq(sa.difference(&sb).copied()));

        let sym = keys(&a.clone().exclusive_or(b.clone()));
        assert!(sym
            .iter()
            .copied()
            .eq(sa.symmetric_difference(&sb).copied()));

        for tree in [
            a.clone().distinct_union(b.clone()),
            a.clone().intersect(b.clone()),
            a.clone().subtract(b.clone()),
            a.exclusive_or(b),
        ] {
            tree.check_invariants().unwrap();
        }
    }
}

#[test]
fn subtracting_a_tree_from_itself_empties_it() {
    let (a, _) = random_tree(42, 1000, 500);
    assert_eq!(a.clone().subtract(a).len(), 0);
}

#[test]
fn xor_decomposes_into_union_minus_intersection() {
    for seed in 0..4 {
        let (a, _) = random_tree(seed, 200, 120);
        let (b, _) = random_tree(seed + 7, 200, 120);
        let direct = keys(&a.clone().exclusive_or(b.clone()));
        let composed = keys(
            &a.clone()
                .distinct_union(b.clone())
                .subtract(a.intersect(b)),
        );
        assert_eq!(direct, composed);
    }
}

#[test]
fn shared_subtrees_make_self_combinations_cheap() {
    // A tree combined with its own clone goes through the pointer-identity
    // fast path; with 100k elements an element-wise walk would be obvious.
    let big: Tree<u32, u32> = Tree::from_sorted_iter((0..100_000u32).map(|k| (k, k)));
    let inter = big.clone().intersect(big.clone());
    assert_eq!(inter.len(), 100_000);
    assert_eq!(big.clone().exclusive_or(big.clone()).len(), 0);
    assert_eq!(big.clone().subtract(big.clone()).len(), 0);
    inter.check_invariants().unwrap();

    // The intersection shares its structure with the second operand.
    assert!(inter.count_shared_nodes(&big) > 0);
}
