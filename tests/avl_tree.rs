// AvlTree integration tests over slotmap-backed records.
//
// The core invariants exercised:
// - Order: ascending traversal yields keys strictly increasing.
// - Identity: lookup/remove return the exact handle that was inserted.
// - Bounds: upper(k)/next covers keys >= k, lower(k)/prior keys <= k.
// - Reuse: removed records come back unlinked and can be inserted again.
use handle_engines::avl::{self, AvlTree, Cursor};
use handle_engines::{AvlNode, Keyed};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct TimerId;
}

#[derive(Debug)]
struct Timer {
    deadline: u64,
    label: String,
    left: Option<TimerId>,
    right: Option<TimerId>,
    height: u32,
}

impl Timer {
    fn new(deadline: u64) -> Self {
        Self {
            deadline,
            label: format!("t{deadline}"),
            left: None,
            right: None,
            height: 0,
        }
    }
}

impl AvlNode<TimerId> for Timer {
    fn left(&self) -> Option<TimerId> {
        self.left
    }
    fn set_left(&mut self, left: Option<TimerId>) {
        self.left = left;
    }
    fn right(&self) -> Option<TimerId> {
        self.right
    }
    fn set_right(&mut self, right: Option<TimerId>) {
        self.right = right;
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn set_height(&mut self, height: u32) {
        self.height = height;
    }
}

impl Keyed for Timer {
    type Key = u64;
    fn key(&self) -> &u64 {
        &self.deadline
    }
}

fn lcg(mut s: u64) -> impl FnMut() -> u64 {
    move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        s >> 33
    }
}

fn shuffled(n: u64, seed: u64) -> Vec<u64> {
    let mut v: Vec<u64> = (1..=n).collect();
    let mut rng = lcg(seed);
    for i in (1..v.len()).rev() {
        let j = (rng() % (i as u64 + 1)) as usize;
        v.swap(i, j);
    }
    v
}

// Test: 500 keys inserted in random order.
// Verifies: min/max, full ascending walk 1..=500, then removing every key
// returns the inserted handle and leaves the tree empty.
#[test]
fn five_hundred_shuffled_keys() {
    let mut timers = SlotMap::with_key();
    let mut tree = AvlTree::new();
    let mut cursor = Cursor::new();
    let mut ids = std::collections::HashMap::new();

    for d in shuffled(500, 42) {
        let id = timers.insert(Timer::new(d));
        tree.insert(&mut timers, &mut cursor, id).expect("distinct keys");
        ids.insert(d, id);
    }
    assert_eq!(tree.len(), 500);

    let min = tree.min(&timers).expect("non-empty");
    let max = tree.max(&timers).expect("non-empty");
    assert_eq!(timers[min].deadline, 1);
    assert_eq!(timers[max].deadline, 500);

    tree.entries(&timers, &mut cursor);
    let mut walked = Vec::new();
    while let Some(id) = avl::next(&timers, &mut cursor) {
        walked.push(timers[id].deadline);
    }
    assert_eq!(walked, (1..=500).collect::<Vec<_>>());

    for d in shuffled(500, 7) {
        let id = tree.remove(&mut timers, &mut cursor, &d);
        assert_eq!(id, Some(ids[&d]));
        assert_eq!(timers[ids[&d]].label, format!("t{d}"));
    }
    assert!(tree.is_empty());
}

// Test: due-timer sweep.
// Verifies: remove_min pops deadlines in order and stops at the first
// deadline past `now`; lower/prior lists the overdue ones newest first.
#[test]
fn expire_due_timers() {
    let mut timers = SlotMap::with_key();
    let mut tree = AvlTree::new();
    let mut cursor = Cursor::for_len(64);
    for d in shuffled(64, 3).into_iter().map(|d| d * 10) {
        let id = timers.insert(Timer::new(d));
        tree.insert(&mut timers, &mut cursor, id).unwrap();
    }

    let now = 205;
    tree.lower(&timers, &mut cursor, &now);
    let overdue: Vec<u64> = std::iter::from_fn(|| avl::prior(&timers, &mut cursor))
        .map(|id| timers[id].deadline)
        .collect();
    assert_eq!(overdue, (1..=20).rev().map(|d| d * 10).collect::<Vec<_>>());

    let mut fired = Vec::new();
    while let Some(id) = tree.min(&timers) {
        if timers[id].deadline > now {
            break;
        }
        assert_eq!(tree.remove_min(&mut timers, &mut cursor), Some(id));
        fired.push(timers.remove(id).unwrap().deadline);
    }
    assert_eq!(fired.len(), 20);
    assert_eq!(tree.len(), 44);

    tree.upper(&timers, &mut cursor, &now);
    let first_pending = avl::next(&timers, &mut cursor).map(|id| timers[id].deadline);
    assert_eq!(first_pending, Some(210));
}

// Test: rescheduling moves a record by remove + rekey + insert.
// Verifies: the removed record is fully unlinked and re-enters in order.
#[test]
fn reschedule_reinserts_record() {
    let mut timers = SlotMap::with_key();
    let mut tree = AvlTree::new();
    let mut cursor = Cursor::new();
    let ids: Vec<TimerId> = (1..=10)
        .map(|d| {
            let id = timers.insert(Timer::new(d));
            tree.insert(&mut timers, &mut cursor, id).unwrap();
            id
        })
        .collect();

    let id = tree.remove(&mut timers, &mut cursor, &3).unwrap();
    assert_eq!(id, ids[2]);
    assert!(timers[id].left.is_none() && timers[id].right.is_none());
    timers[id].deadline = 100;
    tree.insert(&mut timers, &mut cursor, id).unwrap();

    assert_eq!(tree.max(&timers), Some(id));
    let order: Vec<u64> = tree.iter(&timers).map(|id| timers[id].deadline).collect();
    assert_eq!(order, vec![1, 2, 4, 5, 6, 7, 8, 9, 10, 100]);
}

// Test: duplicate deadline.
// Verifies: insert fails with the resident handle; the tree is unchanged.
#[test]
fn duplicate_key_is_rejected() {
    let mut timers = SlotMap::with_key();
    let mut tree = AvlTree::new();
    let mut cursor = Cursor::new();
    let a = timers.insert(Timer::new(5));
    let b = timers.insert(Timer::new(5));
    tree.insert(&mut timers, &mut cursor, a).unwrap();
    assert_eq!(tree.insert(&mut timers, &mut cursor, b), Err(a));
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.lookup(&timers, &5), Some(a));
}

// Test: string keys through a custom predicate (length, then bytes).
#[test]
fn custom_order_over_unsized_keys() {
    struct Word {
        text: Box<str>,
        left: Option<usize>,
        right: Option<usize>,
        height: u32,
    }
    impl AvlNode<usize> for Word {
        fn left(&self) -> Option<usize> {
            self.left
        }
        fn set_left(&mut self, left: Option<usize>) {
            self.left = left;
        }
        fn right(&self) -> Option<usize> {
            self.right
        }
        fn set_right(&mut self, right: Option<usize>) {
            self.right = right;
        }
        fn height(&self) -> u32 {
            self.height
        }
        fn set_height(&mut self, height: u32) {
            self.height = height;
        }
    }
    impl Keyed for Word {
        type Key = str;
        fn key(&self) -> &str {
            &self.text
        }
    }

    let mut words: Vec<Word> = ["pear", "fig", "banana", "kiwi", "apple", "plum"]
        .iter()
        .map(|w| Word {
            text: (*w).into(),
            left: None,
            right: None,
            height: 0,
        })
        .collect();
    let mut tree = AvlTree::with_less(|a: &str, b: &str| (a.len(), a) < (b.len(), b));
    let mut cursor = Cursor::new();
    for h in 0..words.len() {
        tree.insert(&mut words, &mut cursor, h).unwrap();
    }
    let sorted: Vec<&str> = tree.iter(&words).map(|h| &*words[h].text).collect();
    assert_eq!(sorted, ["fig", "kiwi", "pear", "plum", "apple", "banana"]);
    assert_eq!(tree.lookup(&words, "kiwi"), Some(3));
}
