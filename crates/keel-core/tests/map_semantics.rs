//! Map determinism: the last insert for a key wins.

use proptest::prelude::*;

use keel_core::{HashMap, Map, Str};

#[test]
fn value_overwrite_seed_case() {
    let mut map: Map<Str, i32> = Map::new();
    map.insert(Str::from("sneppy"), 1);
    map.insert(Str::from("sneppy"), 2);

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&Str::from("sneppy")), Some(&2));

    let mut hmap: HashMap<Str, i32> = HashMap::new();
    hmap.insert(Str::from("sneppy"), 1);
    hmap.insert(Str::from("sneppy"), 2);
    assert_eq!(hmap.len(), 1);
    assert_eq!(hmap.get(&Str::from("sneppy")), Some(&2));
}

proptest! {
    #[test]
    fn last_insert_wins(entries in prop::collection::vec((0u16..64, any::<i32>()), 0..300)) {
        let mut map: Map<u16, i32> = Map::new();
        let mut hmap: HashMap<u16, i32> = HashMap::new();
        let mut model = std::collections::BTreeMap::new();

        for &(k, v) in &entries {
            map.insert(k, v);
            hmap.insert(k, v);
            model.insert(k, v);
        }

        prop_assert_eq!(map.len(), model.len());
        prop_assert_eq!(hmap.len(), model.len());
        for (&k, &v) in &model {
            prop_assert_eq!(map.get(&k), Some(&v));
            prop_assert_eq!(hmap.get(&k), Some(&v));
        }

        // Ordered map iterates in ascending key order.
        let keys: Vec<u16> = map.keys().copied().collect();
        let expected: Vec<u16> = model.keys().copied().collect();
        prop_assert_eq!(keys, expected);
        map.validate();
    }

    #[test]
    fn removal_mirrors_model(
        inserts in prop::collection::vec((0u16..48, any::<i8>()), 0..150),
        removals in prop::collection::vec(0u16..48, 0..80),
    ) {
        let mut map: Map<u16, i8> = Map::new();
        let mut model = std::collections::BTreeMap::new();
        for &(k, v) in &inserts {
            map.insert(k, v);
            model.insert(k, v);
        }
        for &k in &removals {
            prop_assert_eq!(map.remove_at(&k), model.remove(&k));
        }
        prop_assert_eq!(map.len(), model.len());
        map.validate();
    }
}
