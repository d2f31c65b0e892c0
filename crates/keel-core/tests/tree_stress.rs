//! Red-black invariants and ordered iteration under random workloads.

use proptest::prelude::*;

use keel_core::{Set, Tree};

#[test]
fn deletion_stress_holds_invariants() {
    // Insert 0..1024, then remove every other key in a scrambled order,
    // validating structure and remaining content at each step.
    let mut tree: Tree<u32> = Tree::new();
    for i in 0..1024u32 {
        tree.emplace(i);
    }
    tree.validate();

    let mut victims: Vec<u32> = (0..1024).step_by(2).collect();
    // Deterministic scramble (multiplicative hash ordering).
    victims.sort_by_key(|&v| v.wrapping_mul(2_654_435_761) % 1024);

    let mut expected: Vec<u32> = (0..1024).collect();
    for v in victims {
        assert_eq!(tree.remove(&v), Some(v));
        expected.retain(|&e| e != v);
        tree.validate();
        let got: Vec<u32> = tree.iter().copied().collect();
        assert_eq!(got, expected);
    }
    assert_eq!(tree.len(), 512);
}

proptest! {
    #[test]
    fn invariants_after_random_ops(ops in prop::collection::vec((any::<bool>(), 0u16..512), 1..300)) {
        let mut tree: Tree<u16> = Tree::new();
        let mut model: Vec<u16> = Vec::new();

        for (is_insert, key) in ops {
            if is_insert {
                tree.emplace(key);
                model.push(key);
            } else if tree.remove(&key).is_some() {
                let pos = model.iter().position(|&k| k == key).expect("model in sync");
                model.remove(pos);
            }
            tree.validate();
        }

        model.sort_unstable();
        let got: Vec<u16> = tree.iter().copied().collect();
        prop_assert_eq!(got, model);
    }

    #[test]
    fn set_iteration_is_sorted_unique(values in prop::collection::vec(any::<i32>(), 0..200)) {
        let mut set: Set<i32> = Set::new();
        for &v in &values {
            set.insert(v);
        }
        set.validate();

        let mut expected: Vec<i32> = values.clone();
        expected.sort_unstable();
        expected.dedup();

        let got: Vec<i32> = set.iter().copied().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn bounds_match_model(values in prop::collection::vec(0i32..1000, 1..100), probe in 0i32..1000) {
        let mut set: Set<i32> = Set::new();
        for &v in &values {
            set.insert(v);
        }

        let mut sorted: Vec<i32> = values.clone();
        sorted.sort_unstable();
        sorted.dedup();

        // iter_from starts at the first element >= probe; iter_after
        // starts past the last element <= probe.
        let from_tree: Vec<i32> = set.iter_from(&probe).copied().collect();
        let from_model: Vec<i32> = sorted.iter().copied().filter(|&v| v >= probe).collect();
        prop_assert_eq!(from_tree, from_model);

        let after_tree: Vec<i32> = set.iter_after(&probe).copied().collect();
        let after_model: Vec<i32> = sorted.iter().copied().filter(|&v| v > probe).collect();
        prop_assert_eq!(after_tree, after_model);
    }
}
