//! Fallible buffer allocation for the array-backed engines.
//!
//! A `BufferAlloc` value is the allocator state the engines thread through
//! every growth step. Buffers are plain `Vec<T>` whose length is the
//! capacity; unused slots hold `T::default()`.

use crate::error::AllocError;
use core::alloc::Layout;

pub trait BufferAlloc {
    /// Allocate a buffer of exactly `capacity` default slots.
    fn allocate<T: Default>(&mut self, capacity: usize) -> Result<Vec<T>, AllocError>;

    /// Grow or shrink `buffer` to `capacity` slots, keeping the common
    /// prefix. On error `buffer` must be left exactly as it was.
    fn reallocate<T: Default>(
        &mut self,
        buffer: &mut Vec<T>,
        capacity: usize,
    ) -> Result<(), AllocError>;

    /// Release a buffer previously returned by this allocator.
    fn free<T>(&mut self, buffer: Vec<T>);

    /// Take ownership of a buffer allocated elsewhere. After `Ok` the
    /// buffer counts as one of this allocator's own.
    fn adopt<T>(&mut self, buffer: &[T]) -> Result<(), AllocError> {
        let _ = buffer;
        Ok(())
    }
}

fn check_layout<T>(capacity: usize) -> Result<(), AllocError> {
    Layout::array::<T>(capacity)
        .map(|_| ())
        .map_err(|_| AllocError::CapacityOverflow)
}

/// The process heap, with allocation failures reported instead of aborting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Global;

impl BufferAlloc for Global {
    fn allocate<T: Default>(&mut self, capacity: usize) -> Result<Vec<T>, AllocError> {
        check_layout::<T>(capacity)?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| AllocError::OutOfMemory { capacity })?;
        buffer.resize_with(capacity, T::default);
        Ok(buffer)
    }

    fn reallocate<T: Default>(
        &mut self,
        buffer: &mut Vec<T>,
        capacity: usize,
    ) -> Result<(), AllocError> {
        check_layout::<T>(capacity)?;
        if capacity > buffer.len() {
            let additional = capacity - buffer.len();
            buffer
                .try_reserve_exact(additional)
                .map_err(|_| AllocError::OutOfMemory { capacity })?;
            buffer.resize_with(capacity, T::default);
        } else {
            buffer.truncate(capacity);
            buffer.shrink_to_fit();
        }
        Ok(())
    }

    fn free<T>(&mut self, buffer: Vec<T>) {
        drop(buffer);
    }
}

/// Heap allocation limited to a fixed number of live element slots.
///
/// Requests that would push the total past the budget fail with
/// `OutOfMemory`. Useful for hard memory caps and for driving the
/// allocation-failure paths of the engines.
#[derive(Debug, Clone)]
pub struct Bounded {
    limit: usize,
    in_use: usize,
}

impl Bounded {
    pub fn new(limit: usize) -> Self {
        Self { limit, in_use: 0 }
    }

    /// Element slots currently handed out.
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Change the budget. Slots already in use are not reclaimed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    fn admit(&self, extra: usize, capacity: usize) -> Result<(), AllocError> {
        match self.in_use.checked_add(extra) {
            Some(total) if total <= self.limit => Ok(()),
            _ => Err(AllocError::OutOfMemory { capacity }),
        }
    }
}

impl BufferAlloc for Bounded {
    fn allocate<T: Default>(&mut self, capacity: usize) -> Result<Vec<T>, AllocError> {
        self.admit(capacity, capacity)?;
        let buffer = Global.allocate(capacity)?;
        self.in_use += capacity;
        Ok(buffer)
    }

    fn reallocate<T: Default>(
        &mut self,
        buffer: &mut Vec<T>,
        capacity: usize,
    ) -> Result<(), AllocError> {
        let old = buffer.len();
        if capacity > old {
            self.admit(capacity - old, capacity)?;
        }
        Global.reallocate(buffer, capacity)?;
        self.in_use = self.in_use - old + capacity;
        Ok(())
    }

    fn free<T>(&mut self, buffer: Vec<T>) {
        self.in_use -= buffer.len();
        drop(buffer);
    }

    fn adopt<T>(&mut self, buffer: &[T]) -> Result<(), AllocError> {
        let capacity = buffer.len();
        self.admit(capacity, capacity)?;
        self.in_use += capacity;
        Ok(())
    }
}
