//! Record storage and the per-structure link traits.
//!
//! Records are owned by the caller. An engine only ever sees a copyable
//! handle and reaches the record's link fields through these traits.

use core::fmt::Debug;
use slotmap::{DenseSlotMap, Key, SlotMap};

/// Maps handles to caller-owned records.
///
/// Looking up a handle that does not name a live record is a contract
/// violation and panics; engines never store a handle they were not given.
pub trait Records {
    type Handle: Copy + Eq + Debug;
    type Record;

    fn record(&self, handle: Self::Handle) -> &Self::Record;
    fn record_mut(&mut self, handle: Self::Handle) -> &mut Self::Record;
}

impl<K: Key, T> Records for SlotMap<K, T> {
    type Handle = K;
    type Record = T;

    #[inline]
    fn record(&self, handle: K) -> &T {
        &self[handle]
    }

    #[inline]
    fn record_mut(&mut self, handle: K) -> &mut T {
        &mut self[handle]
    }
}

impl<K: Key, T> Records for DenseSlotMap<K, T> {
    type Handle = K;
    type Record = T;

    #[inline]
    fn record(&self, handle: K) -> &T {
        &self[handle]
    }

    #[inline]
    fn record_mut(&mut self, handle: K) -> &mut T {
        &mut self[handle]
    }
}

impl<T> Records for [T] {
    type Handle = usize;
    type Record = T;

    #[inline]
    fn record(&self, handle: usize) -> &T {
        &self[handle]
    }

    #[inline]
    fn record_mut(&mut self, handle: usize) -> &mut T {
        &mut self[handle]
    }
}

impl<T> Records for Vec<T> {
    type Handle = usize;
    type Record = T;

    #[inline]
    fn record(&self, handle: usize) -> &T {
        &self[handle]
    }

    #[inline]
    fn record_mut(&mut self, handle: usize) -> &mut T {
        &mut self[handle]
    }
}

impl<T, const N: usize> Records for [T; N] {
    type Handle = usize;
    type Record = T;

    #[inline]
    fn record(&self, handle: usize) -> &T {
        &self[handle]
    }

    #[inline]
    fn record_mut(&mut self, handle: usize) -> &mut T {
        &mut self[handle]
    }
}

/// A record that carries the key it is ordered or hashed by.
pub trait Keyed {
    type Key: ?Sized;

    fn key(&self) -> &Self::Key;
}

/// Singly linked chain membership (lists and hash table buckets).
///
/// # Example
///
/// ```
/// use handle_engines::Chained;
///
/// struct Job {
///     id: u32,
///     next: Option<usize>,
/// }
///
/// impl Chained<usize> for Job {
///     fn next(&self) -> Option<usize> { self.next }
///     fn set_next(&mut self, next: Option<usize>) { self.next = next; }
/// }
/// ```
pub trait Chained<H> {
    fn next(&self) -> Option<H>;
    fn set_next(&mut self, next: Option<H>);
}

/// AVL tree membership: child links plus the cached subtree height.
///
/// A record outside any tree has both children `None`; its height is
/// ignored until it is inserted.
pub trait AvlNode<H> {
    fn left(&self) -> Option<H>;
    fn set_left(&mut self, left: Option<H>);
    fn right(&self) -> Option<H>;
    fn set_right(&mut self, right: Option<H>);
    fn height(&self) -> u32;
    fn set_height(&mut self, height: u32);
}
