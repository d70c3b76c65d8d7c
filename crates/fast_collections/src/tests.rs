//! Collection tests across modules.

use std::sync::{Arc, Barrier};

use proptest::collection::vec;
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::*;

#[test]
fn map_scenario() {
    let mut map = FastMap::new();
    map.put("a", 1).unwrap();
    map.put("b", 2).unwrap();
    map.remove(&"a").unwrap();
    map.put("c", 3).unwrap();
    assert_eq!(
        map.iter().collect::<Vec<_>>(),
        vec![(&"b", &2), (&"c", &3)]
    );
    assert_eq!(map.get(&"a"), None);
}

#[test]
fn table_keeps_values_across_the_block_boundary() {
    let mut table: FastTable<u32> = (0..1100).collect();
    let mut model: Vec<u32> = (0..1100).collect();
    for (n, index) in [0, 15, 16, 1023, 1024, 1025].into_iter().enumerate() {
        let value = 10_000 + n as u32;
        table.insert(index, value).unwrap();
        model.insert(index, value);
    }
    assert_eq!(table.len(), model.len());
    assert!(table.iter().eq(model.iter()));
    for index in [0, 15, 16, 1023, 1024, 1025, model.len() - 1] {
        assert_eq!(table.get(index).unwrap(), &model[index]);
    }
}

#[test]
fn sequence_matches_deque_positions() {
    let mut sequence = FastSequence::new();
    for i in 0..10 {
        if i % 2 == 0 {
            sequence.push_back(i).unwrap();
        } else {
            sequence.push_front(i).unwrap();
        }
    }
    let expected = [9, 7, 5, 3, 1, 0, 2, 4, 6, 8];
    for (index, value) in expected.iter().enumerate() {
        let node = sequence.node_at(index).unwrap();
        assert_eq!(sequence.value(node), Some(value));
    }
    assert!(matches!(
        sequence.node_at(10),
        Err(Error::IndexOutOfBounds { index: 10, len: 10 })
    ));
}

#[test]
fn views_compose() {
    let shared = Shared::new(FastSequence::new());
    for word in ["alpha", "beta", "gamma"] {
        shared.add(word.to_string()).unwrap();
    }
    let guard = shared.read();
    let mut view = Unmodifiable::new(&*guard);
    assert_eq!(view.len(), 3);
    assert!(view.contains(&"beta".to_string()));
    assert!(view.add("delta".to_string()).is_err());
    drop(guard);
    assert_eq!(shared.get(2).unwrap(), "gamma");
}

#[test]
fn shared_sub_lists_detect_foreign_changes() {
    let shared = Shared::new((0..10).collect::<FastTable<u32>>());
    let mut sub = shared.sub_list(2, 6).unwrap();
    assert_eq!(sub.get(0).unwrap(), 2);
    assert_eq!(sub.set(1, 30).unwrap(), 3);
    sub.insert(0, 20).unwrap();
    assert_eq!(sub.len(), 5);
    assert_eq!(sub.to_vec().unwrap(), vec![20, 2, 30, 4, 5]);
    assert_eq!(sub.index_of(&4).unwrap(), Some(3));
    assert_eq!(sub.remove(4).unwrap(), 5);
    assert_eq!(shared.len(), 10);

    // Structural change through the parent.
    shared.add(99).unwrap();
    assert!(matches!(sub.get(0), Err(Error::ConcurrentStructuralChange)));
    assert!(matches!(
        sub.remove(0),
        Err(Error::ConcurrentStructuralChange)
    ));

    let fresh = shared.sub_list(0, 3).unwrap();
    assert_eq!(fresh.to_vec().unwrap(), vec![0, 1, 20]);
    assert!(matches!(
        shared.sub_list(5, 20),
        Err(Error::RangeOutOfBounds { .. })
    ));
}

#[test]
fn shared_mutators_reclaim_retired_nodes() {
    let shared = Shared::new(FastSequence::new());
    for i in 0..8 {
        shared.add(i).unwrap();
    }
    assert!(shared.read().is_shared());
    assert_eq!(shared.remove(0).unwrap(), 0);
    assert!(shared.remove_item(&5).unwrap());
    assert_eq!(shared.to_vec(), vec![1, 2, 3, 4, 6, 7]);
    assert_eq!(shared.reclaim(), 0);

    // Removals under a held write guard stay retired until the next mutating call.
    assert_eq!(shared.write().pop_front().unwrap(), 1);
    assert_eq!(shared.write().pop_back().unwrap(), 7);
    assert_eq!(shared.reclaim(), 2);
    assert_eq!(shared.write().pop_front().unwrap(), 2);
    shared.add(8).unwrap();
    assert_eq!(shared.reclaim(), 0);
    let mut sequence = shared.into_inner().unwrap();
    assert_eq!(sequence.reclaim(), 0);
    assert!(sequence.iter().copied().eq([3, 4, 6, 8]));
}

#[test]
fn shared_churn_keeps_pools_bounded() {
    let map = SharedMap::new(FastMap::<u32, u32>::new());
    let entries = map.read().statistics().entries;
    for i in 0..100_000 {
        map.put(7, i).unwrap();
        assert_eq!(map.remove(&7).unwrap(), Some(i));
    }
    let stats = map.read().statistics();
    assert_eq!((stats.len, stats.entries), (0, entries));

    let sequence = Shared::new(FastSequence::new());
    for i in 0..100_000 {
        sequence.add(i).unwrap();
        assert_eq!(sequence.remove(0).unwrap(), i);
    }
    assert!(sequence.is_empty());
    assert_eq!(sequence.reclaim(), 0);
}

#[test]
fn map_matches_model_through_splits_and_tombstones() {
    const KEYS: u32 = 60_000;
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut map = FastMap::new();
    // Insertion stamp and value of every mapped key.
    let mut model: Vec<Option<(u32, u32)>> = vec![None; KEYS as usize];
    let mut stamp = 0;
    let mut len = 0;
    for _ in 0..300_000 {
        let key = rng.random_range(0..KEYS);
        let slot = &mut model[key as usize];
        if rng.random_bool(0.6) {
            let value: u32 = rng.random();
            assert_eq!(map.put(key, value).unwrap(), slot.map(|(_, v)| v));
            if let Some((_, stored)) = slot {
                *stored = value;
            } else {
                *slot = Some((stamp, value));
                stamp += 1;
                len += 1;
            }
        } else {
            let removed = slot.take();
            if removed.is_some() {
                len -= 1;
            }
            assert_eq!(map.remove(&key).unwrap(), removed.map(|(_, v)| v));
        }
    }

    assert_eq!(map.len(), len);
    let mut expected: Vec<(u32, u32, u32)> = model
        .iter()
        .enumerate()
        .filter_map(|(key, slot)| slot.map(|(stamp, value)| (stamp, key as u32, value)))
        .collect();
    expected.sort_unstable();
    assert!(map
        .iter()
        .map(|(key, value)| (*key, *value))
        .eq(expected.into_iter().map(|(_, key, value)| (key, value))));
    for key in (0..KEYS).step_by(97) {
        assert_eq!(map.get(&key), model[key as usize].as_ref().map(|(_, v)| v));
    }
    let stats = map.statistics();
    assert!(stats.uses_sub_tables);
    assert!(stats.depth >= 1);
}

#[test_log::test]
fn shared_map_racing() {
    const N: u32 = 5000;
    const NREADERS: usize = 4;

    let map = SharedMap::new(FastMap::<u32, u32>::new());
    // Try to make all threads start at once, to maximize chances of a race condition
    let barrier = Arc::new(Barrier::new(NREADERS + 1));

    std::thread::scope(|scope| {
        for _ in 0..NREADERS {
            let barrier = Arc::clone(&barrier);
            let map = map.clone();
            scope.spawn(move || {
                barrier.wait();
                let mut seen = 0;
                while seen < N as usize {
                    let len = {
                        let guard = map.read();
                        for (i, (key, value)) in guard.iter().enumerate() {
                            assert_eq!((*key, *value), (i as u32, 2 * i as u32));
                        }
                        guard.len()
                    };
                    assert!(len >= seen);
                    if len > 0 {
                        let last = len as u32 - 1;
                        assert_eq!(map.get(&last), Some(2 * last));
                    }
                    seen = len;
                }
            });
        }

        // writer
        barrier.wait();
        for i in 0..N {
            map.put(i, 2 * i).unwrap();
        }
    });

    assert_eq!(map.len(), N as usize);
    assert!(map.read().statistics().uses_sub_tables);
}

#[test]
fn shared_table_racing() {
    const N: u32 = 3000;
    const NREADERS: usize = 4;

    let table = Shared::new(FastTable::<u32>::new());
    let barrier = Arc::new(Barrier::new(NREADERS + 1));

    std::thread::scope(|scope| {
        for _ in 0..NREADERS {
            let barrier = Arc::clone(&barrier);
            let table = table.clone();
            scope.spawn(move || {
                barrier.wait();
                let mut count = 0;
                while count < N as usize {
                    let result = table.to_vec();
                    assert!(result.len() >= count);
                    count = result.len();
                    assert_eq!(result, (0..count as u32).collect::<Vec<u32>>());
                }
            });
        }

        barrier.wait();
        for i in 0..N {
            table.add(i).unwrap();
            std::thread::yield_now();
        }
    });

    assert_eq!(table.to_vec(), (0..N).collect::<Vec<u32>>());
}

#[derive(Debug, Clone)]
enum MapOp {
    Put(u8, u32),
    PutIfAbsent(u8, u32),
    Remove(u8),
}

fn map_op() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        (any::<u8>(), any::<u32>()).prop_map(|(k, v)| MapOp::Put(k, v)),
        (any::<u8>(), any::<u32>()).prop_map(|(k, v)| MapOp::PutIfAbsent(k, v)),
        any::<u8>().prop_map(MapOp::Remove),
    ]
}

proptest! {
    #[test]
    fn map_matches_insertion_ordered_model(ops in vec(map_op(), 0..400)) {
        let mut map = FastMap::with_capacity(2);
        let mut model: Vec<(u8, u32)> = vec![];
        for op in ops {
            match op {
                MapOp::Put(key, value) => {
                    let previous = map.put(key, value).unwrap();
                    match model.iter_mut().find(|(k, _)| *k == key) {
                        Some(entry) => {
                            prop_assert_eq!(previous, Some(entry.1));
                            entry.1 = value;
                        }
                        None => {
                            prop_assert_eq!(previous, None);
                            model.push((key, value));
                        }
                    }
                }
                MapOp::PutIfAbsent(key, value) => {
                    let existing = map.put_if_absent(key, value).unwrap().copied();
                    match model.iter().find(|(k, _)| *k == key) {
                        Some(entry) => prop_assert_eq!(existing, Some(entry.1)),
                        None => {
                            prop_assert_eq!(existing, None);
                            model.push((key, value));
                        }
                    }
                }
                MapOp::Remove(key) => {
                    let removed = map.remove(&key).unwrap();
                    let position = model.iter().position(|(k, _)| *k == key);
                    prop_assert_eq!(removed, position.map(|i| model.remove(i).1));
                }
            }
        }
        prop_assert_eq!(map.len(), model.len());
        let pairs: Vec<(u8, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(pairs, model.clone());
        for key in 0..=u8::MAX {
            let expected = model.iter().find(|(k, _)| *k == key).map(|(_, v)| v);
            prop_assert_eq!(map.get(&key), expected);
        }
    }

    #[test]
    fn table_matches_vec(ops in vec((any::<bool>(), any::<u16>()), 0..3000)) {
        let mut table = FastTable::new();
        let mut model = vec![];
        for (push, value) in ops {
            if push || model.is_empty() {
                table.push(value).unwrap();
                model.push(value);
            } else {
                let index = value as usize % model.len();
                prop_assert_eq!(table.remove(index).unwrap(), model.remove(index));
            }
        }
        prop_assert_eq!(table.len(), model.len());
        prop_assert!(table.iter().eq(model.iter()));
    }
}
