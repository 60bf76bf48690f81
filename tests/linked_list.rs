// Linked list integration tests over fixed-size record storage.
//
// The core invariants exercised:
// - Order: push_back appends, push_front prepends, reverse flips.
// - Tail tracking: List::last() stays correct across every removal path.
// - Unlinking: removed records come back with `next` cleared and can be
//   pushed onto another chain.
use handle_engines::list::{self, List};
use handle_engines::Chained;
use std::ops::ControlFlow;

#[derive(Debug, Default, Clone, Copy)]
struct Job {
    id: u32,
    cost: u32,
    next: Option<usize>,
}

impl Chained<usize> for Job {
    fn next(&self) -> Option<usize> {
        self.next
    }
    fn set_next(&mut self, next: Option<usize>) {
        self.next = next;
    }
}

fn jobs<const N: usize>() -> [Job; N] {
    let mut out = [Job::default(); N];
    for (i, j) in out.iter_mut().enumerate() {
        j.id = i as u32;
        j.cost = (i as u32 * 7) % 5;
    }
    out
}

fn ids(records: &[Job; 8], list: &List<usize>) -> Vec<u32> {
    list.iter(records).map(|h| records[h].id).collect()
}

// Test: a ready queue and a free list share one array of records.
// Verifies: moving records between chains through remove/push keeps both
// chains and their tails consistent.
#[test]
fn ready_queue_and_free_list() {
    let mut records = jobs::<8>();
    let mut free = List::new();
    let mut ready = List::new();
    for h in 0..8 {
        free.push_back(&mut records, h);
    }
    assert_eq!(free.len(), 8);

    for _ in 0..5 {
        let h = free.remove_first(&mut records).unwrap();
        ready.push_back(&mut records, h);
    }
    assert_eq!(ids(&records, &ready), [0, 1, 2, 3, 4]);
    assert_eq!(ready.last(), Some(4));
    assert_eq!(free.first(), Some(5));

    // Retire the tail and an interior job.
    assert_eq!(ready.remove_last(&mut records), Some(4));
    assert_eq!(ready.remove(&mut records, 2), Some(2));
    assert_eq!(ready.last(), Some(3));
    free.push_front(&mut records, 4);
    free.push_front(&mut records, 2);
    assert_eq!(ids(&records, &free), [2, 4, 5, 6, 7]);
    assert_eq!(ids(&records, &ready), [0, 1, 3]);

    // A job that is not on the list is not found.
    assert_eq!(ready.remove(&mut records, 6), None);
    assert_eq!(ready.len(), 3);
}

// Test: filter drops expensive jobs, including the tail.
#[test]
fn filter_keeps_order_and_tail() {
    let mut records = jobs::<8>();
    let mut ready = List::new();
    for h in 0..8 {
        ready.push_back(&mut records, h);
    }
    // costs: 0 2 4 1 3 0 2 4
    let removed = ready.filter(&mut records, |j| j.cost < 3);
    assert_eq!(removed, 3);
    assert_eq!(ids(&records, &ready), [0, 1, 3, 5, 6]);
    assert_eq!(ready.last(), Some(6));
    assert!(records[7].next.is_none());
    ready.push_back(&mut records, 7);
    assert_eq!(ready.last(), Some(7));
}

// Test: for_each short-circuits on Break and reports the breaking value.
#[test]
fn for_each_budget() {
    let mut records = jobs::<8>();
    let mut ready = List::new();
    for h in 0..8 {
        ready.push_back(&mut records, h);
    }
    let mut spent = 0;
    let stopped = ready.for_each(&records, |h, job| {
        if spent + job.cost > 6 {
            return ControlFlow::Break(h);
        }
        spent += job.cost;
        ControlFlow::Continue(())
    });
    assert_eq!(stopped, ControlFlow::Break(3));
    assert_eq!(spent, 6);
}

// Test: bare-chain helpers on a head pointer.
#[test]
fn bare_chain_operations() {
    let mut records = jobs::<8>();
    let mut head = None;
    for h in [3, 2, 1, 0] {
        list::push_front(&mut records, &mut head, h);
    }
    assert_eq!(list::count(&records, head), 4);
    assert_eq!(list::at(&records, head, 2), Some(2));
    assert_eq!(list::at(&records, head, 4), None);
    assert_eq!(list::last(&records, head), Some(3));

    list::insert_after(&mut records, 1, 7);
    assert_eq!(list::remove_after(&mut records, 0), Some(1));
    let order: Vec<usize> = list::iter(&records, head).collect();
    assert_eq!(order, [0, 7, 2, 3]);

    let tail = list::reverse(&mut records, &mut head);
    assert_eq!(tail, Some(0));
    let order: Vec<usize> = list::iter(&records, head).collect();
    assert_eq!(order, [3, 2, 7, 0]);
    assert_eq!(list::find(&records, head, |j| j.id == 7), Some(7));

    let removed = list::remove_when(&mut records, &mut head, |j| j.id == 0).unwrap();
    assert_eq!(removed.node, 0);
    assert_eq!(removed.pred, Some(7));
    assert!(removed.was_last);
}
