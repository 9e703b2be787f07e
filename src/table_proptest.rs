#![cfg(test)]

// Property tests for Table kept inside the crate so they can inspect
// chain placement through crate-private helpers.

use crate::table::Table;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations: indices shrink to earlier keys, the pool
// shrinks in length, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Views,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    (1usize..=8, proptest::collection::vec("[a-z]{0,4}", 1..=10)).prop_flat_map(
        |(capacity, pool)| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let contains_pool = proptest::sample::select(pool.clone());
            let op = prop_oneof![
                (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
                idx.clone().prop_map(OpI::Remove),
                idx.clone().prop_map(OpI::Get),
                prop_oneof![contains_pool, "[a-z]{0,4}"].prop_map(OpI::Contains),
                (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
                Just(OpI::Views),
            ];
            proptest::collection::vec(op, 1..80)
                .prop_map(move |ops| (capacity, pool.clone(), ops))
        },
    )
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences on small
// capacities, so chains regularly hold several keys:
// - `insert` upserts: returns the replaced value and only grows on new keys.
// - `get`/`try_get`/`contains_key` parity with the model; misses carry the key.
// - `remove` returns the model's value, or fails without changing anything.
// - Views match the model's keys, values and pairs.
// - `capacity` never changes; `len` tracks the model after each op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((capacity, pool, ops) in arb_scenario()) {
        let mut sut: Table<String, i32> = Table::new(capacity).unwrap();
        let mut model: HashMap<String, i32> = HashMap::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = pool[i].clone();
                    let prev = sut.insert(k.clone(), v);
                    prop_assert_eq!(prev, model.insert(k, v));
                }
                OpI::Remove(i) => {
                    let k = &pool[i];
                    match (sut.remove(k.as_str()), model.remove(k)) {
                        (Ok(got), Some(want)) => prop_assert_eq!(got, want),
                        (Err(e), None) => prop_assert_eq!(e.key(), k),
                        (got, want) => prop_assert!(false, "remove mismatch: {:?} vs {:?}", got, want),
                    }
                }
                OpI::Get(i) => {
                    let k = pool[i].as_str();
                    prop_assert_eq!(sut.try_get(k), model.get(k));
                    prop_assert_eq!(sut.get(k).ok(), model.get(k));
                }
                OpI::Contains(s) => {
                    prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
                }
                OpI::Mutate(i, d) => {
                    let k = pool[i].as_str();
                    if let Some(v) = sut.try_get_mut(k) {
                        *v = v.wrapping_add(d);
                    }
                    if let Some(v) = model.get_mut(k) {
                        *v = v.wrapping_add(d);
                    }
                }
                OpI::Views => {
                    let keys: BTreeSet<String> = sut.keys_view().into_iter().collect();
                    let model_keys: BTreeSet<String> = model.keys().cloned().collect();
                    prop_assert_eq!(keys, model_keys);

                    let mut values = sut.values_view();
                    let mut model_values: Vec<i32> = model.values().copied().collect();
                    values.sort_unstable();
                    model_values.sort_unstable();
                    prop_assert_eq!(values, model_values);

                    let pairs: BTreeSet<(String, i32)> = sut.pairs_view().into_iter().collect();
                    let model_pairs: BTreeSet<(String, i32)> =
                        model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    prop_assert_eq!(pairs, model_pairs);
                }
            }

            prop_assert_eq!(sut.capacity(), capacity);
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            prop_assert_eq!(sut.iter().len(), model.len());
        }

        // Every live key sits in a chain that its digest selects.
        for k in model.keys() {
            prop_assert!(sut.chain_len_of(k.as_str()) >= 1);
        }
    }
}

// Property: equality ignores insertion order and capacity.
proptest! {
    #[test]
    fn prop_equality_ignores_layout(
        pairs in proptest::collection::hash_map("[a-z]{1,3}", any::<u8>(), 0..24),
        cap_a in 1usize..16,
        cap_b in 1usize..16,
    ) {
        let forward: Vec<(String, u8)> = pairs.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = Table::from_mapping(forward, Some(cap_a)).unwrap();
        let b = Table::from_mapping(reversed, Some(cap_b)).unwrap();
        prop_assert!(a == b);
        prop_assert_eq!(a.pairs_view(), b.pairs_view());

        let mut c = b.clone();
        c.insert("zzzz".to_string(), 0);
        prop_assert!(a != c);
    }
}
