//! HashTable: open hashing over caller-owned records.
//!
//! Buckets are chain heads stored in a `DynArray`; each record carries its
//! own `next` link and its key. The table owns neither the records nor
//! their keys, only the bucket array.
//!
//! Invariants
//! - Every record reachable from bucket `b` hashes to `b` modulo capacity.
//! - `len` equals the number of records across all chains.
//! - After a completed insert the load factor `len / capacity` is at most
//!   3/4, with two exceptions. Growth doubles once per insert, so a table
//!   that started empty holds one record in one bucket after its first
//!   insert and stays above 3/4 until it reaches four buckets. An explicit
//!   `resize` to a small capacity is honored as given, and the load stays
//!   above 3/4 until later inserts grow the table again.

use crate::alloc::{BufferAlloc, Global};
use crate::array::DynArray;
use crate::error::{AllocError, InsertError};
use crate::fnv::FnvBuildHasher;
use crate::list;
use crate::records::{Chained, Keyed, Records};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use tracing::debug;

/// Growth is triggered when `len / capacity` would exceed
/// `LOAD_NUMERATOR / LOAD_DENOMINATOR`.
pub const LOAD_NUMERATOR: u128 = 3;
pub const LOAD_DENOMINATOR: u128 = 4;

pub struct HashTable<H, S = FnvBuildHasher, A: BufferAlloc = Global> {
    buckets: DynArray<Option<H>, A>,
    len: usize,
    hasher: S,
}

impl<H: Copy + Eq + fmt::Debug> HashTable<H> {
    /// A table with no buckets. The first insert allocates.
    pub fn new() -> Self {
        Self {
            buckets: DynArray::new(),
            len: 0,
            hasher: FnvBuildHasher,
        }
    }

    pub fn create(capacity: usize) -> Result<Self, AllocError> {
        Self::create_in(capacity, FnvBuildHasher, Global)
    }
}

impl<H: Copy + Eq + fmt::Debug> Default for HashTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Copy + Eq + fmt::Debug, S: BuildHasher> HashTable<H, S> {
    pub fn with_hasher(capacity: usize, hasher: S) -> Result<Self, AllocError> {
        Self::create_in(capacity, hasher, Global)
    }
}

#[inline]
fn bucket_of(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

impl<H: Copy + Eq + fmt::Debug, S: BuildHasher, A: BufferAlloc> HashTable<H, S, A> {
    /// Allocate `capacity` empty buckets through `alloc`.
    pub fn create_in(capacity: usize, hasher: S, alloc: A) -> Result<Self, AllocError> {
        Ok(Self {
            buckets: DynArray::create_in(capacity, alloc)?,
            len: 0,
            hasher,
        })
    }

    /// Release the bucket array. Records still carry their old `next`
    /// links; use `clear` first to unlink them.
    pub fn destroy(&mut self) {
        self.buckets.destroy();
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bucket count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn allocator(&self) -> &A {
        self.buckets.allocator()
    }

    pub fn allocator_mut(&mut self) -> &mut A {
        self.buckets.allocator_mut()
    }

    fn would_overload(&self, len: usize) -> bool {
        len as u128 * LOAD_DENOMINATOR > self.capacity() as u128 * LOAD_NUMERATOR
    }

    /// Link `node` into its bucket unless a record with an equal key is
    /// already present. Grows the table (doubling) first when the new
    /// record would push the load past 3/4; if that growth cannot allocate
    /// nothing is inserted.
    ///
    /// # Panics
    ///
    /// Panics if `node` is still linked into a chain.
    pub fn insert<R>(&mut self, records: &mut R, node: H) -> Result<(), InsertError>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H> + Keyed,
        <R::Record as Keyed>::Key: Hash + Eq,
    {
        assert!(
            records.record(node).next().is_none(),
            "record {node:?} is already linked into a chain"
        );
        let hash = self.hasher.hash_one(records.record(node).key());

        if self.capacity() > 0 {
            let key = records.record(node).key();
            let head = self.buckets.buffer()[bucket_of(hash, self.capacity())];
            if list::find(records, head, |r| r.key() == key).is_some() {
                return Err(InsertError::DuplicateKey);
            }
        }

        let len = self.len + 1;
        if self.would_overload(len) {
            let grown = self
                .capacity()
                .checked_mul(2)
                .ok_or(AllocError::CapacityOverflow)?
                .max(1);
            self.resize(records, grown)?;
        }

        let b = bucket_of(hash, self.capacity());
        list::push_front(records, &mut self.buckets.buffer_mut()[b], node);
        self.len = len;
        Ok(())
    }

    /// Rehash every record into a fresh array of `capacity` buckets. On
    /// allocation failure the table is untouched.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn resize<R>(&mut self, records: &mut R, capacity: usize) -> Result<(), AllocError>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H> + Keyed,
        <R::Record as Keyed>::Key: Hash,
    {
        assert!(capacity > 0, "a hash table needs at least one bucket");
        let old_capacity = self.capacity();
        let mut fresh = match self.buckets.allocate_detached(capacity) {
            Ok(fresh) => fresh,
            Err(err) => {
                debug!(from = old_capacity, to = capacity, %err, "bucket table resize failed");
                return Err(err);
            }
        };

        for b in 0..old_capacity {
            let mut cur = self.buckets.buffer()[b];
            while let Some(node) = cur {
                cur = records.record(node).next();
                records.record_mut(node).set_next(None);
                let hash = self.hasher.hash_one(records.record(node).key());
                list::push_front(records, &mut fresh[bucket_of(hash, capacity)], node);
            }
        }

        let old = self.buckets.replace_buffer(fresh, 0);
        self.buckets.free_detached(old);
        debug!(from = old_capacity, to = capacity, len = self.len, "bucket table resized");
        Ok(())
    }

    fn head_for<Q>(&self, key: &Q) -> Option<H>
    where
        Q: ?Sized + Hash,
    {
        if self.capacity() == 0 {
            return None;
        }
        let hash = self.hasher.hash_one(key);
        self.buckets.buffer()[bucket_of(hash, self.capacity())]
    }

    /// The record whose key equals `key`.
    pub fn lookup<R, Q>(&self, records: &R, key: &Q) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H> + Keyed,
        <R::Record as Keyed>::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let head = self.head_for(key);
        list::find(records, head, |r| Borrow::<Q>::borrow(r.key()) == key)
    }

    pub fn contains_key<R, Q>(&self, records: &R, key: &Q) -> bool
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H> + Keyed,
        <R::Record as Keyed>::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.lookup(records, key).is_some()
    }

    /// Unlink and return the record whose key equals `key`. The record's
    /// `next` link is cleared.
    pub fn remove<R, Q>(&mut self, records: &mut R, key: &Q) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H> + Keyed,
        <R::Record as Keyed>::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.capacity() == 0 {
            return None;
        }
        let b = bucket_of(self.hasher.hash_one(key), self.capacity());
        let bucket = &mut self.buckets.buffer_mut()[b];
        let removed =
            list::remove_when(records, bucket, |r| Borrow::<Q>::borrow(r.key()) == key)?;
        self.len -= 1;
        Some(removed.node)
    }

    /// Unlink every record and empty all buckets. Capacity is kept.
    pub fn clear<R>(&mut self, records: &mut R)
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        for bucket in self.buckets.buffer_mut() {
            while list::remove_first(records, bucket).is_some() {}
        }
        self.len = 0;
    }

    /// Records in bucket order, chain order within a bucket. Stable for a
    /// given table state.
    pub fn iter<'a, R>(&'a self, records: &'a R) -> Iter<'a, R>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        Iter {
            records,
            buckets: self.buckets.buffer(),
            bucket: 0,
            node: None,
        }
    }

    /// Chain length per bucket.
    pub fn bucket_lengths<'a, R>(&'a self, records: &'a R) -> impl Iterator<Item = usize> + 'a
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: Chained<H>,
    {
        self.buckets
            .buffer()
            .iter()
            .map(move |&head| list::count(records, head))
    }
}

impl<H: fmt::Debug, S, A: BufferAlloc> fmt::Debug for HashTable<H, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("len", &self.len)
            .field("capacity", &self.buckets.capacity())
            .finish()
    }
}

/// Iterator over the record handles of a `HashTable`.
pub struct Iter<'a, R: Records + ?Sized> {
    records: &'a R,
    buckets: &'a [Option<R::Handle>],
    bucket: usize,
    node: Option<R::Handle>,
}

impl<'a, R> Iterator for Iter<'a, R>
where
    R: Records + ?Sized,
    R::Record: Chained<R::Handle>,
{
    type Item = R::Handle;

    fn next(&mut self) -> Option<R::Handle> {
        loop {
            if let Some(node) = self.node {
                self.node = self.records.record(node).next();
                return Some(node);
            }
            self.node = *self.buckets.get(self.bucket)?;
            self.bucket += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::Bounded;
    use slotmap::{DefaultKey, SlotMap};
    use std::collections::BTreeSet;

    #[derive(Debug)]
    struct Entry {
        key: String,
        value: i32,
        next: Option<DefaultKey>,
    }

    impl Entry {
        fn new(key: &str, value: i32) -> Self {
            Self {
                key: key.to_string(),
                value,
                next: None,
            }
        }
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

    fn assert_buckets_consistent<S: BuildHasher, A: BufferAlloc>(
        t: &HashTable<DefaultKey, S, A>,
        sm: &SlotMap<DefaultKey, Entry>,
    ) {
        for (b, &head) in t.buckets.buffer().iter().enumerate() {
            for h in list::iter(sm, head) {
                let hash = t.hasher.hash_one(&sm[h].key);
                assert_eq!(bucket_of(hash, t.capacity()), b);
            }
        }
        assert_eq!(t.iter(sm).count(), t.len());
    }

    /// Invariant: duplicate keys are rejected and the table is unchanged.
    #[test]
    fn duplicate_insert_rejected() {
        let mut sm = SlotMap::new();
        let mut t = HashTable::create(8).unwrap();
        let a = sm.insert(Entry::new("dup", 1));
        let b = sm.insert(Entry::new("dup", 2));
        t.insert(&mut sm, a).unwrap();
        assert_eq!(t.insert(&mut sm, b), Err(InsertError::DuplicateKey));
        assert_eq!(t.len(), 1);
        assert!(sm[b].next.is_none());
        assert_eq!(t.lookup(&sm, "dup"), Some(a));
    }

    #[test]
    fn lookup_and_remove_with_borrowed_key() {
        let mut sm = SlotMap::new();
        let mut t = HashTable::create(4).unwrap();
        let hs: Vec<_> = ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, k)| sm.insert(Entry::new(k, i as i32)))
            .collect();
        for &h in &hs {
            t.insert(&mut sm, h).unwrap();
        }
        assert_eq!(t.lookup(&sm, "b"), Some(hs[1]));
        assert!(t.contains_key(&sm, "c"));
        assert!(!t.contains_key(&sm, "z"));

        assert_eq!(t.remove(&mut sm, "b"), Some(hs[1]));
        assert_eq!(t.remove(&mut sm, "b"), None);
        assert!(sm[hs[1]].next.is_none());
        assert_eq!(t.len(), 2);
        assert_eq!(t.lookup(&sm, "b"), None);
        assert_buckets_consistent(&t, &sm);
    }

    /// Invariant: growth doubles capacity once the load passes 3/4 and keeps
    /// every record reachable.
    #[test]
    fn grows_past_three_quarters() {
        let mut sm = SlotMap::new();
        let mut t = HashTable::create(4).unwrap();
        for i in 0..3 {
            let h = sm.insert(Entry::new(&format!("k{i}"), i));
            t.insert(&mut sm, h).unwrap();
        }
        assert_eq!(t.capacity(), 4);
        let h = sm.insert(Entry::new("k3", 3));
        t.insert(&mut sm, h).unwrap();
        assert_eq!(t.capacity(), 8);
        for i in 0..4 {
            let k = format!("k{i}");
            let h = t.lookup(&sm, &k).unwrap();
            assert_eq!(sm[h].value, i);
        }
        assert_buckets_consistent(&t, &sm);
    }

    #[test]
    fn zero_capacity_table_grows_on_insert() {
        let mut sm = SlotMap::new();
        let mut t: HashTable<DefaultKey> = HashTable::new();
        assert_eq!(t.lookup(&sm, "x"), None);
        assert_eq!(t.remove(&mut sm, "x"), None);
        assert_eq!(t.iter(&sm).count(), 0);
        for i in 0..20 {
            let h = sm.insert(Entry::new(&i.to_string(), i));
            t.insert(&mut sm, h).unwrap();
        }
        assert_eq!(t.len(), 20);
        assert!(t.capacity() >= 20 * 4 / 3);
        assert_buckets_consistent(&t, &sm);
    }

    /// Invariant: an explicit resize keeps the record count and identities.
    #[test]
    fn resize_preserves_records() {
        let mut sm = SlotMap::new();
        let mut t = HashTable::create(16).unwrap();
        let mut hs = Vec::new();
        for i in 0..10 {
            let h = sm.insert(Entry::new(&format!("key-{i}"), i));
            t.insert(&mut sm, h).unwrap();
            hs.push(h);
        }
        t.resize(&mut sm, 3).unwrap();
        assert_eq!(t.capacity(), 3);
        assert_eq!(t.len(), 10);
        for (i, &h) in hs.iter().enumerate() {
            assert_eq!(t.lookup(&sm, format!("key-{i}").as_str()), Some(h));
        }
        assert_buckets_consistent(&t, &sm);
        let lens: usize = t.bucket_lengths(&sm).sum();
        assert_eq!(lens, 10);
    }

    /// Invariant: a growth that cannot allocate reports ResizeFailed and
    /// leaves the table exactly as it was.
    #[test]
    fn resize_failure_aborts_insert() {
        let mut sm = SlotMap::new();
        let mut t = HashTable::create_in(4, FnvBuildHasher, Bounded::new(4)).unwrap();
        let mut hs = Vec::new();
        for i in 0..3 {
            let h = sm.insert(Entry::new(&format!("k{i}"), i));
            t.insert(&mut sm, h).unwrap();
            hs.push(h);
        }
        let extra = sm.insert(Entry::new("k3", 3));
        assert_eq!(
            t.insert(&mut sm, extra),
            Err(InsertError::ResizeFailed(AllocError::OutOfMemory { capacity: 8 }))
        );
        assert_eq!(t.len(), 3);
        assert_eq!(t.capacity(), 4);
        assert!(sm[extra].next.is_none());
        assert_eq!(t.lookup(&sm, "k3"), None);
        assert_buckets_consistent(&t, &sm);

        // A duplicate is still reported as such even when growth would fail.
        let dup = sm.insert(Entry::new("k0", 9));
        assert_eq!(t.insert(&mut sm, dup), Err(InsertError::DuplicateKey));

        t.allocator_mut().set_limit(12);
        t.insert(&mut sm, extra).unwrap();
        assert_eq!(t.capacity(), 8);
        assert_eq!(t.allocator().in_use(), 8);
    }

    #[test]
    fn iteration_is_bucket_major_and_stable() {
        let mut sm = SlotMap::new();
        let mut t = HashTable::create(8).unwrap();
        for i in 0..6 {
            let h = sm.insert(Entry::new(&format!("{i}"), i));
            t.insert(&mut sm, h).unwrap();
        }
        let first: Vec<_> = t.iter(&sm).collect();
        let second: Vec<_> = t.iter(&sm).collect();
        assert_eq!(first, second);
        let keys: BTreeSet<_> = first.iter().map(|&h| sm[h].key.clone()).collect();
        assert_eq!(keys.len(), 6);

        let buckets: Vec<_> = first
            .iter()
            .map(|&h| bucket_of(t.hasher().hash_one(&sm[h].key), t.capacity()))
            .collect();
        assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn clear_unlinks_everything() {
        let mut sm = SlotMap::new();
        let mut t = HashTable::create(2).unwrap();
        let hs: Vec<_> = (0..5)
            .map(|i| sm.insert(Entry::new(&i.to_string(), i)))
            .collect();
        for &h in &hs {
            t.insert(&mut sm, h).unwrap();
        }
        let cap = t.capacity();
        t.clear(&mut sm);
        assert!(t.is_empty());
        assert_eq!(t.capacity(), cap);
        assert!(hs.iter().all(|&h| sm[h].next.is_none()));
        t.insert(&mut sm, hs[0]).unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    #[should_panic(expected = "already linked")]
    fn inserting_a_linked_record_panics() {
        let mut sm = SlotMap::new();
        let mut t = HashTable::create(1).unwrap();
        let a = sm.insert(Entry::new("a", 0));
        let b = sm.insert(Entry::new("b", 0));
        t.resize(&mut sm, 1).unwrap();
        sm[a].next = Some(b);
        let _ = t.insert(&mut sm, a);
    }

    #[derive(Debug, Default)]
    struct Slot {
        key: u32,
        next: Option<usize>,
    }

    impl Chained<usize> for Slot {
        fn next(&self) -> Option<usize> {
            self.next
        }
        fn set_next(&mut self, next: Option<usize>) {
            self.next = next;
        }
    }

    impl Keyed for Slot {
        type Key = u32;
        fn key(&self) -> &u32 {
            &self.key
        }
    }

    /// Every constructor works for plain index handles over a Vec.
    #[test]
    fn index_handles_through_every_constructor() {
        let mut slots: Vec<Slot> = (0..6).map(|key| Slot { key, next: None }).collect();
        let mut tables: [HashTable<usize>; 3] = [
            HashTable::default(),
            HashTable::create(2).unwrap(),
            HashTable::with_hasher(0, FnvBuildHasher).unwrap(),
        ];
        for t in &mut tables {
            for h in 0..slots.len() {
                t.insert(&mut slots, h).unwrap();
            }
            assert_eq!(t.len(), 6);
            assert_eq!(t.lookup(&slots, &4u32), Some(4));
            t.clear(&mut slots);
        }
        let mut bounded = HashTable::create_in(4, FnvBuildHasher, Bounded::new(4)).unwrap();
        bounded.insert(&mut slots, 0).unwrap();
        assert_eq!(bounded.lookup(&slots, &0u32), Some(0));
    }

    #[test]
    #[should_panic(expected = "record 3 is already linked")]
    fn linked_index_handle_is_named_in_the_panic() {
        let mut slots: Vec<Slot> = (0..4).map(|key| Slot { key, next: None }).collect();
        let mut t: HashTable<usize> = HashTable::create(4).unwrap();
        slots[3].next = Some(0);
        let _ = t.insert(&mut slots, 3);
    }
}
