//! DynArray: growable contiguous buffer with a caller-supplied allocator.
//!
//! The buffer always holds `capacity` initialized slots; `size` of them are
//! live. Slots past `size` hold `T::default()` (the "zeroed" state) or a
//! value left behind by `zero_buffer`-style direct access through
//! `buffer_mut`. Growth is geometric (factor 2) so `push_back` is amortized
//! O(1). Every failed operation leaves size, capacity and contents as they
//! were.

use crate::alloc::{BufferAlloc, Global};
use crate::error::{AllocError, OutOfBounds, RangeError};
use core::fmt;
use core::mem;
use tracing::debug;

/// Capacity multiplier used by `scale_capacity`.
pub const GROWTH_FACTOR: usize = 2;

pub struct DynArray<T: Default, A: BufferAlloc = Global> {
    buffer: Vec<T>,
    size: usize,
    alloc: A,
}

impl<T: Default> DynArray<T> {
    /// An empty array with no backing buffer.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    pub fn create(capacity: usize) -> Result<Self, AllocError> {
        Self::create_in(capacity, Global)
    }
}

impl<T: Default> Default for DynArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default, A: BufferAlloc> DynArray<T, A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            buffer: Vec::new(),
            size: 0,
            alloc,
        }
    }

    /// Allocate a buffer of `capacity` default slots through `alloc`.
    pub fn create_in(capacity: usize, mut alloc: A) -> Result<Self, AllocError> {
        let buffer = alloc.allocate(capacity)?;
        Ok(Self {
            buffer,
            size: 0,
            alloc,
        })
    }

    /// Adopt an existing buffer whose first `size` slots are live. The
    /// buffer's length is the capacity, and it is charged to `alloc` as if
    /// `alloc` had handed it out. Fails, dropping the buffer, when `alloc`
    /// refuses it.
    ///
    /// # Panics
    ///
    /// Panics if `size > buffer.len()`.
    pub fn from_parts(buffer: Vec<T>, size: usize, mut alloc: A) -> Result<Self, AllocError> {
        assert!(
            size <= buffer.len(),
            "size {size} exceeds buffer capacity {}",
            buffer.len()
        );
        alloc.adopt(&buffer)?;
        Ok(Self {
            buffer,
            size,
            alloc,
        })
    }

    /// Release the backing buffer through the allocator. The array stays
    /// usable as an empty, zero-capacity array.
    pub fn destroy(&mut self) {
        let buffer = mem::take(&mut self.buffer);
        self.size = 0;
        self.alloc.free(buffer);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.alloc
    }

    /// Live elements.
    pub fn as_slice(&self) -> &[T] {
        &self.buffer[..self.size]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.buffer[..self.size]
    }

    /// Every slot up to capacity, ignoring size.
    pub fn buffer(&self) -> &[T] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [T] {
        &mut self.buffer
    }

    /// Drop all live elements. Capacity is kept.
    pub fn clear(&mut self) {
        for slot in &mut self.buffer[..self.size] {
            *slot = T::default();
        }
        self.size = 0;
    }

    /// Reset `length` slots starting at `index` to their default, ignoring
    /// size. Fails without touching anything if the span passes capacity.
    pub fn zero_buffer(&mut self, index: usize, length: usize) -> Result<(), OutOfBounds> {
        let end = index
            .checked_add(length)
            .filter(|&end| end <= self.capacity())
            .ok_or(OutOfBounds {
                index,
                count: length,
                size: self.capacity(),
            })?;
        for slot in &mut self.buffer[index..end] {
            *slot = T::default();
        }
        Ok(())
    }

    #[inline]
    pub fn at(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn last(&self) -> Option<&T> {
        self.as_slice().last()
    }

    pub fn first_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    fn reallocate(&mut self, capacity: usize) -> Result<(), AllocError> {
        let old = self.capacity();
        match self.alloc.reallocate(&mut self.buffer, capacity) {
            Ok(()) => {
                debug!(from = old, to = capacity, "array buffer reallocated");
                Ok(())
            }
            Err(err) => {
                debug!(from = old, to = capacity, %err, "array buffer reallocation failed");
                Err(err)
            }
        }
    }

    /// Set the capacity to exactly `capacity`. Refuses to drop live
    /// elements.
    pub fn resize(&mut self, capacity: usize) -> Result<(), RangeError> {
        if capacity < self.size {
            return Err(OutOfBounds {
                index: capacity,
                count: self.size - capacity,
                size: self.size,
            }
            .into());
        }
        self.reallocate(capacity)?;
        Ok(())
    }

    pub fn shrink_to_fit(&mut self) -> Result<(), AllocError> {
        if self.size == self.capacity() {
            return Ok(());
        }
        self.reallocate(self.size)
    }

    /// Ensure the total capacity is at least `capacity`.
    pub fn reserve(&mut self, capacity: usize) -> Result<(), AllocError> {
        if capacity <= self.capacity() {
            return Ok(());
        }
        self.reallocate(capacity)
    }

    /// Multiply the capacity by `GROWTH_FACTOR` until it reaches `want`.
    /// A zero-capacity array starts from one slot.
    pub fn scale_capacity(&mut self, want: usize) -> Result<(), AllocError> {
        let capacity = self.capacity();
        if want <= capacity {
            return Ok(());
        }
        let mut next = capacity.max(1);
        while next < want {
            next = next
                .checked_mul(GROWTH_FACTOR)
                .ok_or(AllocError::CapacityOverflow)?;
        }
        self.reallocate(next)
    }

    /// Append `elem`, growing if needed, and return the slot it landed in.
    pub fn push_back(&mut self, elem: T) -> Result<&mut T, AllocError> {
        let size = self.size;
        if size == self.capacity() {
            let want = size.checked_add(1).ok_or(AllocError::CapacityOverflow)?;
            self.scale_capacity(want)?;
        }
        self.size = size + 1;
        let slot = &mut self.buffer[size];
        *slot = elem;
        Ok(slot)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }
        self.size -= 1;
        Some(mem::take(&mut self.buffer[self.size]))
    }

    /// Insert `elems` before `index`, shifting the tail up. `index == len()`
    /// appends.
    pub fn insert_range<I>(&mut self, index: usize, elems: I) -> Result<(), RangeError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let elems = elems.into_iter();
        let count = elems.len();
        let size = self.size;
        if index > size {
            return Err(OutOfBounds { index, count, size }.into());
        }
        let new_size = size.checked_add(count).ok_or(AllocError::CapacityOverflow)?;
        self.scale_capacity(new_size)?;

        let mut written = 0;
        for (slot, elem) in self.buffer[size..new_size].iter_mut().zip(elems) {
            *slot = elem;
            written += 1;
        }
        assert_eq!(written, count, "iterator yielded fewer items than its len()");

        self.buffer[index..new_size].rotate_right(count);
        self.size = new_size;
        Ok(())
    }

    /// Remove `count` elements starting at `index`, shifting the tail down.
    pub fn remove_range(&mut self, index: usize, count: usize) -> Result<(), OutOfBounds> {
        let size = self.size;
        let end = index
            .checked_add(count)
            .filter(|&end| end <= size)
            .ok_or(OutOfBounds { index, count, size })?;
        if end < size {
            self.buffer[index..size].rotate_left(count);
        }
        for slot in &mut self.buffer[size - count..size] {
            *slot = T::default();
        }
        self.size = size - count;
        Ok(())
    }

    /// Allocate a buffer through this array's allocator without installing it.
    pub(crate) fn allocate_detached(&mut self, capacity: usize) -> Result<Vec<T>, AllocError> {
        self.alloc.allocate(capacity)
    }

    /// Install `buffer` as the backing store and hand back the old one.
    pub(crate) fn replace_buffer(&mut self, buffer: Vec<T>, size: usize) -> Vec<T> {
        assert!(size <= buffer.len());
        self.size = size;
        mem::replace(&mut self.buffer, buffer)
    }

    pub(crate) fn free_detached(&mut self, buffer: Vec<T>) {
        self.alloc.free(buffer);
    }
}

impl<T: Default, A: BufferAlloc> Drop for DynArray<T, A> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<T: Default + fmt::Debug, A: BufferAlloc> fmt::Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynArray")
            .field("size", &self.size)
            .field("capacity", &self.capacity())
            .field("elements", &self.as_slice())
            .finish()
    }
}
