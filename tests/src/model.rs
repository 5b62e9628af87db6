//! Random operation sequences checked against `std::collections::BTreeMap`.

use std::collections::BTreeMap;

use grove::{KeySelector, List, Map, Tree};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rstest::rstest;

#[rstest]
#[case(3)]
#[case(4)]
#[case(7)]
#[case(32)]
fn tree_mirrors_a_model_map(#[case] order: usize) {
    crate::init_logs();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(order as u64);
    let mut tree: Tree<u16, u32> = Tree::with_order(order);
    let mut model: BTreeMap<u16, u32> = BTreeMap::new();

    for step in 0..4000u32 {
        let key = rng.gen_range(0..500u16);
        match rng.gen_range(0..10) {
            0..=4 => {
                assert_eq!(
                    tree.insert_or_replace(key, step),
                    model.insert(key, step),
                    "insert diverged at step {}",
                    step
                );
            }
            5..=7 => {
                assert_eq!(
                    tree.remove(&key, KeySelector::Any).map(|(_, v)| v),
                    model.remove(&key),
                    "remove diverged at step {}",
                    step
                );
            }
            8 => {
                assert_eq!(tree.get(&key, KeySelector::Any), model.get(&key));
            }
            _ => {
                assert_eq!(tree.len(), model.len());
                if !model.is_empty() {
                    let nth = rng.gen_range(0..model.len());
                    let expected = model.iter().nth(nth).unwrap();
                    let got = tree.element_at_offset(nth);
                    assert_eq!(got, expected);
                }
            }
        }
        if step % 256 == 0 {
            tree.check_invariants().unwrap();
        }
    }

    tree.check_invariants().unwrap();
    assert!(tree
        .iter()
        .eq(model.iter().map(|(k, v)| (*k, *v))));
}

#[rstest]
#[case(3)]
#[case(16)]
fn list_mirrors_a_model_vec(#[case] order: usize) {
    crate::init_logs();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x115_7 ^ order as u64);
    let mut list: List<u32> = List::with_order(order);
    let mut model: Vec<u32> = Vec::new();

    for step in 0..3000u32 {
        match rng.gen_range(0..6) {
            0..=2 => {
                let at = rng.gen_range(0..=model.len());
                list.insert(at, step);
                model.insert(at, step);
            }
            3..=4 if !model.is_empty() => {
                let at = rng.gen_range(0..model.len());
                assert_eq!(list.remove(at), model.remove(at));
            }
            _ if !model.is_empty() => {
                let at = rng.gen_range(0..model.len());
                assert_eq!(list.get(at), model.get(at));
            }
            _ => {}
        }
        assert_eq!(list.len(), model.len());
    }

    list.check_invariants().unwrap();
    assert!(list.iter().eq(model.iter().copied()));
}

#[test]
fn map_agrees_with_model_after_bulk_construction() {
    crate::init_logs();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
    let pairs: Vec<(u16, u32)> = (0..2000).map(|i| (rng.gen_range(0..800), i)).collect();

    let map: Map<u16, u32> = pairs.iter().copied().collect();
    let model: BTreeMap<u16, u32> = pairs.into_iter().collect();

    assert_eq!(map.len(), model.len());
    assert!(map.iter().eq(model.iter().map(|(k, v)| (*k, *v))));
    map.check_invariants().unwrap();
}
