use fast_collections::{
    restore, save, Error, FastBitSet, FastMap, FastSequence, FastSet, Rehash, SharedMap,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

#[test]
fn split_maps_restore_in_insertion_order() {
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut map: FastMap<u64, u32, Rehash> = FastMap::with_comparator(Rehash::default());
    let mut keys = vec![];
    for _ in 0..20_000 {
        let key: u64 = rng.random();
        map.put(key, key.count_ones()).unwrap();
        keys.push(key);
    }
    for key in keys.iter().step_by(5) {
        map.remove(key).unwrap();
    }
    assert!(map.statistics().uses_sub_tables);

    let bytes = save(&map).unwrap();
    let restored: FastMap<u64, u32, Rehash> = restore(&bytes).unwrap();
    assert_eq!(restored.len(), map.len());
    assert!(restored.iter().eq(map.iter()));
    assert_eq!(restored.statistics().tombstones, 0);

    let wrong: Result<FastMap<u64, u32>, _> = restore(&bytes);
    assert!(matches!(wrong, Err(Error::ComparatorMismatch { .. })));
}

#[test]
fn shared_maps_restore_after_unwrapping() {
    let shared = SharedMap::new(FastMap::new());
    for word in ["one", "two", "three"] {
        shared.put(word.to_string(), word.len()).unwrap();
    }
    assert_eq!(shared.put_if_absent("two".to_string(), 0).unwrap(), Some(3));
    assert_eq!(shared.remove(&"one".to_string()).unwrap(), Some(3));
    let map = shared.into_inner().unwrap();
    let restored: FastMap<String, usize> = restore(&save(&map).unwrap()).unwrap();
    assert_eq!(
        restored.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["two", "three"]
    );
}

#[test]
fn sequences_sets_and_bit_sets() {
    let sequence: FastSequence<u32> = (0..100).rev().collect();
    let restored: FastSequence<u32> = restore(&save(&sequence).unwrap()).unwrap();
    assert_eq!(restored.first().unwrap(), &99);
    assert_eq!(restored, sequence);

    let set: FastSet<i8> = [-3, 4, -3, 9].into_iter().collect();
    let restored: FastSet<i8> = restore(&save(&set).unwrap()).unwrap();
    assert_eq!(restored.iter().copied().collect::<Vec<_>>(), vec![-3, 4, 9]);

    let bits: FastBitSet = set.iter().map(|&v| (v + 3) as usize).collect();
    assert_eq!(bits.to_string(), "{0, 7, 12}");
}
