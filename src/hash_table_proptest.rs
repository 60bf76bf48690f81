#![cfg(test)]

// Property tests for HashTable kept inside the crate next to the module
// they exercise.

use crate::alloc::Bounded;
use crate::error::{AllocError, InsertError};
use crate::fnv::FnvBuildHasher;
use crate::hash_table::HashTable;
use crate::records::{Chained, Keyed};
use proptest::prelude::*;
use slotmap::{DefaultKey, SlotMap};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug)]
struct Entry {
    key: String,
    value: i32,
    next: Option<DefaultKey>,
}

impl Chained<DefaultKey> for Entry {
    fn next(&self) -> Option<DefaultKey> {
        self.next
    }
    fn set_next(&mut self, next: Option<DefaultKey>) {
        self.next = next;
    }
}

impl Keyed for Entry {
    type Key = String;
    fn key(&self) -> &String {
        &self.key
    }
}

// Pool-indexed operations to improve shrinking.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Lookup(usize),
    Contains(String),
    Resize(usize),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=12).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Lookup),
            1 => "[a-z]{0,4}".prop_map(Op::Contains),
            1 => (1usize..40).prop_map(Op::Resize),
            1 => Just(Op::Iterate),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: State-machine equivalence against std::collections::HashMap.
// - Duplicate keys are rejected without touching the table.
// - `lookup`/`contains_key` parity; lookups return the inserted record.
// - `remove` returns the inserted record and clears its link.
// - `iter` yields every live record exactly once.
// - Chain lengths always add up to `len`, across explicit resizes too.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut records: SlotMap<DefaultKey, Entry> = SlotMap::new();
        let mut sut: HashTable<DefaultKey> = HashTable::new();
        let mut model: HashMap<String, (DefaultKey, i32)> = HashMap::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let key = pool[i].clone();
                    let h = records.insert(Entry { key: key.clone(), value: v, next: None });
                    match sut.insert(&mut records, h) {
                        Ok(()) => {
                            prop_assert!(!model.contains_key(&key));
                            model.insert(key, (h, v));
                        }
                        Err(InsertError::DuplicateKey) => {
                            prop_assert!(model.contains_key(&key));
                            prop_assert!(records[h].next.is_none());
                            records.remove(h);
                        }
                        Err(e) => prop_assert!(false, "unexpected {e:?}"),
                    }
                }
                Op::Remove(i) => {
                    let got = sut.remove(&mut records, pool[i].as_str());
                    let want = model.remove(&pool[i]).map(|(h, _)| h);
                    prop_assert_eq!(got, want);
                    if let Some(h) = got {
                        prop_assert!(records[h].next.is_none());
                        records.remove(h);
                    }
                }
                Op::Lookup(i) => {
                    let got = sut.lookup(&records, pool[i].as_str());
                    let want = model.get(&pool[i]).copied();
                    prop_assert_eq!(got, want.map(|(h, _)| h));
                    if let (Some(h), Some((_, v))) = (got, want) {
                        prop_assert_eq!(&records[h].key, &pool[i]);
                        prop_assert_eq!(records[h].value, v);
                    }
                }
                Op::Contains(s) => {
                    prop_assert_eq!(sut.contains_key(&records, s.as_str()), model.contains_key(&s));
                }
                Op::Resize(cap) => {
                    sut.resize(&mut records, cap).unwrap();
                    prop_assert_eq!(sut.capacity(), cap);
                }
                Op::Iterate => {
                    let seen: Vec<DefaultKey> = sut.iter(&records).collect();
                    prop_assert_eq!(seen.len(), model.len());
                    let seen: BTreeSet<_> = seen.into_iter().collect();
                    let want: BTreeSet<_> = model.values().map(|&(h, _)| h).collect();
                    prop_assert_eq!(seen, want);
                }
                Op::Clear => {
                    sut.clear(&mut records);
                    for (_, (h, _)) in model.drain() {
                        prop_assert!(records[h].next.is_none());
                        records.remove(h);
                    }
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            let chained: usize = sut.bucket_lengths(&records).sum();
            prop_assert_eq!(chained, model.len());
        }

        for (key, &(h, _)) in &model {
            prop_assert_eq!(sut.lookup(&records, key.as_str()), Some(h));
        }
    }
}

// Property: under a tight allocation budget every insert either succeeds or
// fails with ResizeFailed, and a failed insert changes nothing.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_resize_failure_is_atomic(limit in 1usize..24, n in 1usize..40) {
        let mut records: SlotMap<DefaultKey, Entry> = SlotMap::new();
        let mut sut = HashTable::create_in(1, FnvBuildHasher, Bounded::new(limit)).unwrap();
        let mut live = Vec::new();

        for i in 0..n {
            let h = records.insert(Entry { key: format!("k{i}"), value: i as i32, next: None });
            let cap = sut.capacity();
            match sut.insert(&mut records, h) {
                Ok(()) => live.push(h),
                Err(InsertError::ResizeFailed(AllocError::OutOfMemory { capacity })) => {
                    prop_assert_eq!(capacity, cap * 2);
                    prop_assert_eq!(sut.capacity(), cap);
                    prop_assert!(records[h].next.is_none());
                    prop_assert_eq!(sut.lookup(&records, format!("k{i}").as_str()), None);
                }
                Err(e) => prop_assert!(false, "unexpected {e:?}"),
            }
            prop_assert_eq!(sut.len(), live.len());
            prop_assert!(sut.allocator().in_use() <= limit);
        }
        for (i, &h) in live.iter().enumerate() {
            let key = records[h].key.clone();
            prop_assert_eq!(sut.lookup(&records, key.as_str()), Some(h), "record {}", i);
        }
    }
}
