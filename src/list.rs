//! Singly linked chains threaded through caller-owned records.
//!
//! The free functions work on a bare chain named by its head
//! (`&mut Option<H>`). Operations that can move the tail report the new
//! tail or the removed node's predecessor so a wrapper can keep its `last`
//! pointer in O(1). `List` is that wrapper.
//!
//! A record pushed or inserted must not be on any chain (its `next` is
//! `None`); removed records come back with `next` cleared.

use crate::records::{Chained, Records};
use core::ops::ControlFlow;

#[inline]
fn next_of<R>(records: &R, node: R::Handle) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    records.record(node).next()
}

#[inline]
fn set_next<R>(records: &mut R, node: R::Handle, next: Option<R::Handle>)
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    records.record_mut(node).set_next(next);
}

#[inline]
fn assert_unlinked<R>(records: &R, node: R::Handle)
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    assert!(
        next_of(records, node).is_none(),
        "record {node:?} is already linked into a chain"
    );
}

/// A node unlinked from a chain, plus the node that preceded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removed<H> {
    pub node: H,
    /// `None` when the removed node was the head.
    pub pred: Option<H>,
    /// Whether the removed node was the tail.
    pub was_last: bool,
}

/// Outcome of `filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filtered<H> {
    pub removed: usize,
    /// Tail of the surviving chain.
    pub last: Option<H>,
}

/// Last node of the chain. O(n).
pub fn last<R>(records: &R, head: Option<R::Handle>) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    let mut node = head?;
    while let Some(next) = next_of(records, node) {
        node = next;
    }
    Some(node)
}

/// Number of nodes. O(n).
pub fn count<R>(records: &R, head: Option<R::Handle>) -> usize
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    iter(records, head).count()
}

/// Node at `index`, or `None` past the end. O(n).
pub fn at<R>(records: &R, head: Option<R::Handle>, index: usize) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    iter(records, head).nth(index)
}

pub fn push_front<R>(records: &mut R, head: &mut Option<R::Handle>, node: R::Handle)
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    assert_unlinked(records, node);
    set_next(records, node, *head);
    *head = Some(node);
}

/// Append `node`, walking to the tail. Returns the previous tail. O(n).
pub fn push_back<R>(
    records: &mut R,
    head: &mut Option<R::Handle>,
    node: R::Handle,
) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    assert_unlinked(records, node);
    match last(records, *head) {
        None => {
            *head = Some(node);
            None
        }
        Some(tail) => {
            set_next(records, tail, Some(node));
            Some(tail)
        }
    }
}

/// Link `succ` directly after `node`. O(1).
pub fn insert_after<R>(records: &mut R, node: R::Handle, succ: R::Handle)
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    assert_unlinked(records, succ);
    let after = next_of(records, node);
    set_next(records, succ, after);
    set_next(records, node, Some(succ));
}

/// Unlink and return the successor of `node`, if any. O(1).
pub fn remove_after<R>(records: &mut R, node: R::Handle) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    let succ = next_of(records, node)?;
    let after = next_of(records, succ);
    set_next(records, node, after);
    set_next(records, succ, None);
    Some(succ)
}

pub fn remove_first<R>(records: &mut R, head: &mut Option<R::Handle>) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    let node = (*head)?;
    *head = next_of(records, node);
    set_next(records, node, None);
    Some(node)
}

/// Unlink the tail. `pred` of the result is the new tail. O(n).
pub fn remove_last<R>(
    records: &mut R,
    head: &mut Option<R::Handle>,
) -> Option<Removed<R::Handle>>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    remove_when(records, head, |r| r.next().is_none())
}

/// Unlink `node` if it is on the chain. O(n).
pub fn remove<R>(
    records: &mut R,
    head: &mut Option<R::Handle>,
    node: R::Handle,
) -> Option<Removed<R::Handle>>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    let mut pred = None;
    let mut cur = *head;
    while let Some(c) = cur {
        if c == node {
            return Some(unlink(records, head, pred, c));
        }
        pred = cur;
        cur = next_of(records, c);
    }
    None
}

/// Unlink the first node whose record satisfies `predicate`. O(n).
pub fn remove_when<R, F>(
    records: &mut R,
    head: &mut Option<R::Handle>,
    mut predicate: F,
) -> Option<Removed<R::Handle>>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
    F: FnMut(&R::Record) -> bool,
{
    let mut pred = None;
    let mut cur = *head;
    while let Some(c) = cur {
        if predicate(records.record(c)) {
            return Some(unlink(records, head, pred, c));
        }
        pred = cur;
        cur = next_of(records, c);
    }
    None
}

fn unlink<R>(
    records: &mut R,
    head: &mut Option<R::Handle>,
    pred: Option<R::Handle>,
    node: R::Handle,
) -> Removed<R::Handle>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    let after = next_of(records, node);
    match pred {
        None => *head = after,
        Some(p) => set_next(records, p, after),
    }
    set_next(records, node, None);
    Removed {
        node,
        pred,
        was_last: after.is_none(),
    }
}

/// Keep only the nodes whose record satisfies `keep`, preserving their
/// relative order. Dropped nodes are unlinked with `next` cleared. O(n).
pub fn filter<R, F>(
    records: &mut R,
    head: &mut Option<R::Handle>,
    mut keep: F,
) -> Filtered<R::Handle>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
    F: FnMut(&R::Record) -> bool,
{
    let mut removed = 0;
    let mut first = None;
    let mut prev: Option<R::Handle> = None;
    let mut cur = *head;
    while let Some(c) = cur {
        let next = next_of(records, c);
        if keep(records.record(c)) {
            match prev {
                None => first = Some(c),
                Some(p) => set_next(records, p, Some(c)),
            }
            prev = Some(c);
        } else {
            set_next(records, c, None);
            removed += 1;
        }
        cur = next;
    }
    if let Some(p) = prev {
        set_next(records, p, None);
    }
    *head = first;
    Filtered {
        removed,
        last: prev,
    }
}

/// First node whose record satisfies `predicate`. O(n).
pub fn find<R, F>(records: &R, head: Option<R::Handle>, mut predicate: F) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
    F: FnMut(&R::Record) -> bool,
{
    iter(records, head).find(|&h| predicate(records.record(h)))
}

/// Visit nodes in order until `f` breaks. O(n).
pub fn for_each<R, F, B>(records: &R, head: Option<R::Handle>, mut f: F) -> ControlFlow<B>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
    F: FnMut(R::Handle, &R::Record) -> ControlFlow<B>,
{
    for h in iter(records, head) {
        if let ControlFlow::Break(b) = f(h, records.record(h)) {
            return ControlFlow::Break(b);
        }
    }
    ControlFlow::Continue(())
}

/// Reverse the chain in place. Returns the new tail (the old head). O(n).
pub fn reverse<R>(records: &mut R, head: &mut Option<R::Handle>) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    let tail = *head;
    let mut reversed = None;
    let mut cur = *head;
    while let Some(c) = cur {
        cur = next_of(records, c);
        set_next(records, c, reversed);
        reversed = Some(c);
    }
    *head = reversed;
    tail
}

/// Borrowing iterator over the handles of a chain.
pub fn iter<R>(records: &R, head: Option<R::Handle>) -> Iter<'_, R>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    Iter {
        records,
        node: head,
    }
}

pub struct Iter<'a, R: Records + ?Sized> {
    records: &'a R,
    node: Option<R::Handle>,
}

impl<'a, R> Iterator for Iter<'a, R>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    type Item = R::Handle;

    #[inline]
    fn next(&mut self) -> Option<R::Handle> {
        let node = self.node?;
        self.node = next_of(self.records, node);
        Some(node)
    }
}

/// A chain with O(1) access to both ends.
///
/// Invariants: `first.is_none() == last.is_none()`, and `last` has no
/// successor.
///
/// # Example
///
/// ```
/// use handle_engines::{Chained, List};
///
/// struct Job { id: u32, next: Option<usize> }
///
/// impl Chained<usize> for Job {
///     fn next(&self) -> Option<usize> { self.next }
///     fn set_next(&mut self, next: Option<usize>) { self.next = next; }
/// }
///
/// let mut jobs: Vec<Job> = (0..3).map(|id| Job { id, next: None }).collect();
/// let mut queue = List::new();
/// queue.push_back(&mut jobs, 0);
/// queue.push_back(&mut jobs, 1);
/// queue.push_front(&mut jobs, 2);
///
/// let order: Vec<u32> = queue.iter(&jobs).map(|h| jobs[h].id).collect();
/// assert_eq!(order, [2, 0, 1]);
/// assert_eq!(queue.last(), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List<H> {
    first: Option<H>,
    last: Option<H>,
    len: usize,
}

impl<H> Default for List<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> List<H> {
    pub const fn new() -> Self {
        Self {
            first: None,
            last: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }
}

impl<H: Copy + Eq> List<H> {
    #[inline]
    pub fn first(&self) -> Option<H> {
        self.first
    }

    #[inline]
    pub fn last(&self) -> Option<H> {
        self.last
    }

    pub fn push_front<R>(&mut self, records: &mut R, node: H)
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        push_front(records, &mut self.first, node);
        if self.last.is_none() {
            self.last = Some(node);
        }
        self.len += 1;
    }

    /// Append in O(1) using the tracked tail.
    pub fn push_back<R>(&mut self, records: &mut R, node: H)
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        match self.last {
            None => push_front(records, &mut self.first, node),
            Some(tail) => insert_after(records, tail, node),
        }
        self.last = Some(node);
        self.len += 1;
    }

    /// Link `succ` after `node`, which must be on this list.
    pub fn insert_after<R>(&mut self, records: &mut R, node: H, succ: H)
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        insert_after(records, node, succ);
        if self.last == Some(node) {
            self.last = Some(succ);
        }
        self.len += 1;
    }

    /// Unlink the successor of `node`, which must be on this list.
    pub fn remove_after<R>(&mut self, records: &mut R, node: H) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        let succ = remove_after(records, node)?;
        if self.last == Some(succ) {
            self.last = Some(node);
        }
        self.len -= 1;
        Some(succ)
    }

    pub fn remove_first<R>(&mut self, records: &mut R) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        let node = remove_first(records, &mut self.first)?;
        if self.first.is_none() {
            self.last = None;
        }
        self.len -= 1;
        Some(node)
    }

    /// Unlink the tail. O(n): the chain is singly linked.
    pub fn remove_last<R>(&mut self, records: &mut R) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        let removed = remove_last(records, &mut self.first)?;
        Some(self.account(removed))
    }

    pub fn remove<R>(&mut self, records: &mut R, node: H) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        let removed = remove(records, &mut self.first, node)?;
        Some(self.account(removed))
    }

    pub fn remove_when<R, F>(&mut self, records: &mut R, predicate: F) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
        F: FnMut(&R::Record) -> bool,
    {
        let removed = remove_when(records, &mut self.first, predicate)?;
        Some(self.account(removed))
    }

    fn account(&mut self, removed: Removed<H>) -> H {
        if removed.was_last {
            self.last = removed.pred;
        }
        self.len -= 1;
        removed.node
    }

    /// Keep only the nodes whose record satisfies `keep`. Returns how many
    /// were removed.
    pub fn filter<R, F>(&mut self, records: &mut R, keep: F) -> usize
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
        F: FnMut(&R::Record) -> bool,
    {
        let filtered = filter(records, &mut self.first, keep);
        self.last = filtered.last;
        self.len -= filtered.removed;
        filtered.removed
    }

    pub fn find<R, F>(&self, records: &R, predicate: F) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
        F: FnMut(&R::Record) -> bool,
    {
        find(records, self.first, predicate)
    }

    pub fn for_each<R, F, B>(&self, records: &R, f: F) -> ControlFlow<B>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
        F: FnMut(H, &R::Record) -> ControlFlow<B>,
    {
        for_each(records, self.first, f)
    }

    pub fn reverse<R>(&mut self, records: &mut R)
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        self.last = reverse(records, &mut self.first);
    }

    pub fn iter<'a, R>(&self, records: &'a R) -> Iter<'a, R>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        iter(records, self.first)
    }

    /// Forget every node without touching the records. Their `next` links
    /// still point along the old chain.
    pub fn clear(&mut self) {
        self.first = None;
        self.last = None;
        self.len = 0;
    }
}
