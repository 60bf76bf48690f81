//! Array-backed binary heap.
//!
//! Ordering and element moves go through a `HeapOrder`, so a caller whose
//! elements are referenced from elsewhere (e.g. by their heap position) can
//! keep those references consistent on every swap.

use crate::alloc::{BufferAlloc, Global};
use crate::array::DynArray;
use crate::error::AllocError;
use core::fmt;
use core::marker::PhantomData;

/// Comparator and swap callback for `BinaryHeap`.
///
/// The element for which `less` holds against every other element sits at
/// the root: `less = a < b` gives a min-heap.
pub trait HeapOrder<T> {
    fn less(&self, a: &T, b: &T) -> bool;

    /// Exchange the elements at `a` and `b`.
    #[inline]
    fn swap(&mut self, elements: &mut [T], a: usize, b: usize) {
        elements.swap(a, b);
    }
}

/// Smallest element first, by `Ord`.
pub struct MinOrder<T: ?Sized>(PhantomData<fn(&T)>);

impl<T: ?Sized> MinOrder<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: ?Sized> Default for MinOrder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for MinOrder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for MinOrder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MinOrder")
    }
}

impl<T: Ord> HeapOrder<T> for MinOrder<T> {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// A binary heap stored in a `DynArray`.
pub struct BinaryHeap<T: Default, O = MinOrder<T>, A: BufferAlloc = Global> {
    array: DynArray<T, A>,
    order: O,
}

impl<T: Default + Ord> BinaryHeap<T> {
    pub fn new() -> Self {
        Self::with_order(MinOrder::new())
    }
}

impl<T: Default + Ord> Default for BinaryHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default, O: HeapOrder<T>> BinaryHeap<T, O> {
    pub fn with_order(order: O) -> Self {
        Self {
            array: DynArray::new(),
            order,
        }
    }
}

impl<T: Default, O: HeapOrder<T>, A: BufferAlloc> BinaryHeap<T, O, A> {
    /// Build a heap over `array`. Elements already in the array are
    /// discarded so the heap starts empty.
    pub fn from_array(mut array: DynArray<T, A>, order: O) -> Self {
        array.clear();
        Self { array, order }
    }

    pub fn create_in(capacity: usize, order: O, alloc: A) -> Result<Self, AllocError> {
        Ok(Self {
            array: DynArray::create_in(capacity, alloc)?,
            order,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.array.capacity()
    }

    pub fn order(&self) -> &O {
        &self.order
    }

    /// Elements in heap (level) order.
    pub fn as_slice(&self) -> &[T] {
        self.array.as_slice()
    }

    /// Add `elem` and return the index it settled at.
    pub fn insert(&mut self, elem: T) -> Result<usize, AllocError> {
        let index = self.array.len();
        self.array.push_back(elem)?;
        Ok(self.sift_up(index))
    }

    /// The root element, or `None` when empty.
    pub fn peek(&self) -> Option<&T> {
        self.array.first()
    }

    /// Remove and return the root element, or `None` when empty.
    pub fn pop(&mut self) -> Option<T> {
        let last = self.array.len().checked_sub(1)?;
        if last > 0 {
            self.order.swap(self.array.as_mut_slice(), 0, last);
        }
        let top = self.array.pop_back();
        self.sift_down(0);
        top
    }

    pub fn clear(&mut self) {
        self.array.clear();
    }

    /// Release the backing buffer.
    pub fn destroy(&mut self) {
        self.array.destroy();
    }

    fn sift_up(&mut self, mut index: usize) -> usize {
        let elements = self.array.as_mut_slice();
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.order.less(&elements[index], &elements[parent]) {
                break;
            }
            self.order.swap(elements, index, parent);
            index = parent;
        }
        index
    }

    fn sift_down(&mut self, mut index: usize) {
        let elements = self.array.as_mut_slice();
        let len = elements.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut min = index;
            if left < len && self.order.less(&elements[left], &elements[min]) {
                min = left;
            }
            if right < len && self.order.less(&elements[right], &elements[min]) {
                min = right;
            }
            if min == index {
                break;
            }
            self.order.swap(elements, index, min);
            index = min;
        }
    }
}

impl<T: Default + fmt::Debug, O, A: BufferAlloc> fmt::Debug for BinaryHeap<T, O, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryHeap")
            .field("elements", &self.array.as_slice())
            .finish()
    }
}
