//! AvlTree: an ordered, height-balanced tree over caller-owned records.
//!
//! Every operation is iterative. Ancestor paths for rebalancing and
//! in-order traversal state live in a caller-supplied [`Cursor`], so the
//! tree itself holds only a root handle, a count and the ordering
//! predicate.
//!
//! Invariants
//! - In-order traversal yields keys strictly ascending under `less`.
//! - Every node's cached height is `1 + max(left, right)`; empty is 0.
//! - Every node's balance (right height minus left height) is in [-1, 1].
//! - Records outside the tree have no children and height 0.

use crate::records::{AvlNode, Keyed, Records};
use core::fmt;
use core::marker::PhantomData;

/// Bounded stack of node handles used as ancestor path and traversal state.
///
/// Allocate once, reuse across calls. Pushing past the capacity means the
/// tree broke its height bound and panics.
#[derive(Clone)]
pub struct Cursor<H> {
    nodes: Vec<H>,
    capacity: usize,
}

/// Capacity of `Cursor::new`, enough for any AVL tree that fits in the
/// address space.
pub const DEFAULT_CURSOR_CAPACITY: usize = usize::BITS as usize * 3 / 2 + 2;

/// Greatest height an AVL tree of `len` nodes can reach.
pub fn max_height(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    // fewest nodes at height h: m(h) = m(h - 1) + m(h - 2) + 1
    let (mut prev, mut cur, mut height) = (0usize, 1usize, 1usize);
    loop {
        match cur.checked_add(prev).and_then(|n| n.checked_add(1)) {
            Some(next) if next <= len => {
                prev = cur;
                cur = next;
                height += 1;
            }
            _ => return height,
        }
    }
}

impl<H: Copy> Cursor<H> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CURSOR_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// A cursor deep enough for any tree of at most `len` records.
    pub fn for_len(len: usize) -> Self {
        Self::with_capacity(max_height(len) + 1)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn reset(&mut self) {
        self.nodes.clear();
    }

    /// The node the next `next`/`prior` call will yield.
    pub fn peek(&self) -> Option<H> {
        self.nodes.last().copied()
    }

    /// # Panics
    ///
    /// Panics when the cursor is full.
    pub fn push(&mut self, node: H) {
        assert!(
            self.nodes.len() < self.capacity,
            "cursor exhausted: tree deeper than {} levels",
            self.capacity
        );
        self.nodes.push(node);
    }

    pub fn pop(&mut self) -> Option<H> {
        self.nodes.pop()
    }
}

impl<H: Copy> Default for Cursor<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: fmt::Debug> fmt::Debug for Cursor<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("nodes", &self.nodes)
            .field("capacity", &self.capacity)
            .finish()
    }
}

fn ord_less<K: Ord + ?Sized>(a: &K, b: &K) -> bool {
    a < b
}

pub struct AvlTree<H, K: ?Sized, L = fn(&K, &K) -> bool> {
    root: Option<H>,
    len: usize,
    less: L,
    _key: PhantomData<fn(&K)>,
}

impl<H, K: Ord + ?Sized> AvlTree<H, K> {
    /// An empty tree ordered by `K: Ord`.
    pub fn new() -> Self {
        Self {
            root: None,
            len: 0,
            less: ord_less::<K> as fn(&K, &K) -> bool,
            _key: PhantomData,
        }
    }
}

impl<H, K: Ord + ?Sized> Default for AvlTree<H, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: fmt::Debug, K: ?Sized, L> fmt::Debug for AvlTree<H, K, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvlTree")
            .field("root", &self.root)
            .field("len", &self.len)
            .finish()
    }
}

#[inline]
fn left<R>(records: &R, node: R::Handle) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    records.record(node).left()
}

#[inline]
fn right<R>(records: &R, node: R::Handle) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    records.record(node).right()
}

#[inline]
fn height<R>(records: &R, node: Option<R::Handle>) -> u32
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    node.map_or(0, |n| records.record(n).height())
}

fn update_height<R>(records: &mut R, node: R::Handle)
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    let hl = height(records, left(records, node));
    let hr = height(records, right(records, node));
    records.record_mut(node).set_height(1 + hl.max(hr));
}

fn balance<R>(records: &R, node: R::Handle) -> i64
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    let hr = i64::from(height(records, right(records, node)));
    hr - i64::from(height(records, left(records, node)))
}

fn rotate_left<R>(records: &mut R, node: R::Handle) -> R::Handle
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    let Some(pivot) = right(records, node) else {
        return node;
    };
    let inner = left(records, pivot);
    records.record_mut(node).set_right(inner);
    records.record_mut(pivot).set_left(Some(node));
    update_height(records, node);
    update_height(records, pivot);
    pivot
}

fn rotate_right<R>(records: &mut R, node: R::Handle) -> R::Handle
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    let Some(pivot) = left(records, node) else {
        return node;
    };
    let inner = right(records, pivot);
    records.record_mut(node).set_left(inner);
    records.record_mut(pivot).set_right(Some(node));
    update_height(records, node);
    update_height(records, pivot);
    pivot
}

/// Refresh `node`'s height and restore its balance with at most two
/// rotations. Returns the root of the rebalanced subtree.
fn rebalance<R>(records: &mut R, node: R::Handle) -> R::Handle
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    update_height(records, node);
    let b = balance(records, node);
    if b > 1 {
        if let Some(r) = right(records, node) {
            if balance(records, r) < 0 {
                let r = rotate_right(records, r);
                records.record_mut(node).set_right(Some(r));
            }
        }
        rotate_left(records, node)
    } else if b < -1 {
        if let Some(l) = left(records, node) {
            if balance(records, l) > 0 {
                let l = rotate_left(records, l);
                records.record_mut(node).set_left(Some(l));
            }
        }
        rotate_right(records, node)
    } else {
        node
    }
}

impl<H, K, L> AvlTree<H, K, L>
where
    H: Copy + Eq + fmt::Debug,
    K: ?Sized,
    L: Fn(&K, &K) -> bool,
{
    /// An empty tree ordered by `less`, which must be a strict weak order.
    pub fn with_less(less: L) -> Self {
        Self {
            root: None,
            len: 0,
            less,
            _key: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<H> {
        self.root
    }

    /// Forget every record. Their links are left as they are.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Link `node` into the tree. If a record with an equal key is already
    /// present nothing changes and that record is returned as the error.
    ///
    /// # Panics
    ///
    /// Panics if `node` still has children, or if `cursor` is too shallow
    /// for the tree.
    pub fn insert<R>(&mut self, records: &mut R, cursor: &mut Cursor<H>, node: H) -> Result<(), H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H> + Keyed<Key = K>,
    {
        {
            let rec = records.record(node);
            assert!(
                rec.left().is_none() && rec.right().is_none(),
                "record {node:?} is already linked into a tree"
            );
        }

        cursor.reset();
        let mut cur = self.root;
        while let Some(c) = cur {
            let key = records.record(node).key();
            let here = records.record(c).key();
            cur = if (self.less)(key, here) {
                left(records, c)
            } else if (self.less)(here, key) {
                right(records, c)
            } else {
                cursor.reset();
                return Err(c);
            };
            cursor.push(c);
        }

        records.record_mut(node).set_height(1);
        let mut sub = node;
        while let Some(parent) = cursor.pop() {
            let go_left = (self.less)(records.record(node).key(), records.record(parent).key());
            if go_left {
                records.record_mut(parent).set_left(Some(sub));
            } else {
                records.record_mut(parent).set_right(Some(sub));
            }
            sub = rebalance(records, parent);
        }
        self.root = Some(sub);
        self.len += 1;
        Ok(())
    }

    /// The record whose key equals `key`. O(height).
    pub fn lookup<R>(&self, records: &R, key: &K) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H> + Keyed<Key = K>,
    {
        let mut cur = self.root;
        while let Some(c) = cur {
            let here = records.record(c).key();
            cur = if (self.less)(key, here) {
                left(records, c)
            } else if (self.less)(here, key) {
                right(records, c)
            } else {
                return Some(c);
            };
        }
        None
    }

    pub fn contains_key<R>(&self, records: &R, key: &K) -> bool
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H> + Keyed<Key = K>,
    {
        self.lookup(records, key).is_some()
    }

    pub fn min<R>(&self, records: &R) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H>,
    {
        let mut c = self.root?;
        while let Some(l) = left(records, c) {
            c = l;
        }
        Some(c)
    }

    pub fn max<R>(&self, records: &R) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H>,
    {
        let mut c = self.root?;
        while let Some(r) = right(records, c) {
            c = r;
        }
        Some(c)
    }

    /// Unlink and return the record whose key equals `key`.
    pub fn remove<R>(&mut self, records: &mut R, cursor: &mut Cursor<H>, key: &K) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H> + Keyed<Key = K>,
    {
        cursor.reset();
        let mut cur = self.root;
        let target = loop {
            let Some(c) = cur else {
                cursor.reset();
                return None;
            };
            let here = records.record(c).key();
            let next = if (self.less)(key, here) {
                left(records, c)
            } else if (self.less)(here, key) {
                right(records, c)
            } else {
                break c;
            };
            cursor.push(c);
            cur = next;
        };
        self.unlink(records, cursor, target);
        Some(target)
    }

    pub fn remove_min<R>(&mut self, records: &mut R, cursor: &mut Cursor<H>) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H>,
    {
        cursor.reset();
        let mut c = self.root?;
        while let Some(l) = left(records, c) {
            cursor.push(c);
            c = l;
        }
        self.unlink(records, cursor, c);
        Some(c)
    }

    pub fn remove_max<R>(&mut self, records: &mut R, cursor: &mut Cursor<H>) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H>,
    {
        cursor.reset();
        let mut c = self.root?;
        while let Some(r) = right(records, c) {
            cursor.push(c);
            c = r;
        }
        self.unlink(records, cursor, c);
        Some(c)
    }

    /// Splice `target` out. `cursor` holds its ancestors, root first.
    fn unlink<R>(&mut self, records: &mut R, cursor: &mut Cursor<H>, target: H)
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H>,
    {
        let mut sub = match (left(records, target), right(records, target)) {
            (Some(l), Some(r)) => {
                // Promote the in-order successor s: the leftmost node of the
                // right subtree. Its right child takes its old place.
                let depth = cursor.len();
                let mut s = r;
                while let Some(sl) = left(records, s) {
                    cursor.push(s);
                    s = sl;
                }
                let mut child = right(records, s);
                while cursor.len() > depth {
                    let Some(p) = cursor.pop() else { break };
                    records.record_mut(p).set_left(child);
                    child = Some(rebalance(records, p));
                }
                let rec = records.record_mut(s);
                rec.set_left(Some(l));
                rec.set_right(child);
                Some(rebalance(records, s))
            }
            (only, None) | (None, only) => only,
        };

        let mut from = target;
        while let Some(p) = cursor.pop() {
            if left(records, p) == Some(from) {
                records.record_mut(p).set_left(sub);
            } else {
                records.record_mut(p).set_right(sub);
            }
            sub = Some(rebalance(records, p));
            from = p;
        }
        self.root = sub;
        self.len -= 1;

        let rec = records.record_mut(target);
        rec.set_left(None);
        rec.set_right(None);
        rec.set_height(0);
    }

    /// Prime `cursor` for ascending traversal. Returns the minimum.
    pub fn entries<R>(&self, records: &R, cursor: &mut Cursor<H>) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H>,
    {
        cursor.reset();
        push_left_spine(records, cursor, self.root);
        cursor.peek()
    }

    /// Prime `cursor` for descending traversal. Returns the maximum.
    pub fn reversed<R>(&self, records: &R, cursor: &mut Cursor<H>) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H>,
    {
        cursor.reset();
        push_right_spine(records, cursor, self.root);
        cursor.peek()
    }

    /// Prime `cursor` at the first record whose key is not less than
    /// `key`, for ascending traversal with `next`. Returns that record.
    pub fn upper<R>(&self, records: &R, cursor: &mut Cursor<H>, key: &K) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H> + Keyed<Key = K>,
    {
        cursor.reset();
        let mut cur = self.root;
        while let Some(c) = cur {
            if (self.less)(records.record(c).key(), key) {
                cur = right(records, c);
            } else {
                cursor.push(c);
                cur = left(records, c);
            }
        }
        cursor.peek()
    }

    /// Prime `cursor` at the last record whose key is not greater than
    /// `key`, for descending traversal with `prior`. Returns that record.
    pub fn lower<R>(&self, records: &R, cursor: &mut Cursor<H>, key: &K) -> Option<H>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H> + Keyed<Key = K>,
    {
        cursor.reset();
        let mut cur = self.root;
        while let Some(c) = cur {
            if (self.less)(key, records.record(c).key()) {
                cur = left(records, c);
            } else {
                cursor.push(c);
                cur = right(records, c);
            }
        }
        cursor.peek()
    }

    /// Ascending iterator over the record handles.
    pub fn iter<'a, R>(&self, records: &'a R) -> Iter<'a, R>
    where
        R: Records<Handle = H> + ?Sized,
        R::Record: AvlNode<H>,
    {
        let mut cursor = Cursor::for_len(self.len);
        push_left_spine(records, &mut cursor, self.root);
        Iter {
            records,
            cursor,
            remaining: self.len,
        }
    }
}

fn push_left_spine<R>(records: &R, cursor: &mut Cursor<R::Handle>, mut cur: Option<R::Handle>)
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    while let Some(c) = cur {
        cursor.push(c);
        cur = left(records, c);
    }
}

fn push_right_spine<R>(records: &R, cursor: &mut Cursor<R::Handle>, mut cur: Option<R::Handle>)
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    while let Some(c) = cur {
        cursor.push(c);
        cur = right(records, c);
    }
}

/// Yield the cursor's current record and step to its in-order successor.
/// O(1) amortized.
pub fn next<R>(records: &R, cursor: &mut Cursor<R::Handle>) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    let node = cursor.pop()?;
    push_left_spine(records, cursor, right(records, node));
    Some(node)
}

/// Yield the cursor's current record and step to its in-order predecessor.
pub fn prior<R>(records: &R, cursor: &mut Cursor<R::Handle>) -> Option<R::Handle>
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    let node = cursor.pop()?;
    push_right_spine(records, cursor, left(records, node));
    Some(node)
}

/// Borrowing ascending iterator; see [`AvlTree::iter`].
pub struct Iter<'a, R: Records + ?Sized> {
    records: &'a R,
    cursor: Cursor<R::Handle>,
    remaining: usize,
}

impl<'a, R> Iterator for Iter<'a, R>
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
    type Item = R::Handle;

    fn next(&mut self) -> Option<R::Handle> {
        let node = next(self.records, &mut self.cursor)?;
        self.remaining = self.remaining.saturating_sub(1);
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, R> ExactSizeIterator for Iter<'a, R>
where
    R: Records + ?Sized,
    R::Record: AvlNode<R::Handle>,
{
}
