//! Error values for operational failures.
//!
//! Contract violations (stale handles, records that are still linked,
//! cursor exhaustion) panic instead; everything here is an expected outcome
//! that leaves the structure in its prior state.

use core::fmt;

/// A backing buffer could not be allocated or grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The requested capacity does not fit in the address space, or
    /// doubling the current capacity would overflow.
    CapacityOverflow,
    /// The allocator refused to provide `capacity` elements.
    OutOfMemory { capacity: usize },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::CapacityOverflow => f.write_str("capacity overflow"),
            AllocError::OutOfMemory { capacity } => {
                write!(f, "allocation of {capacity} elements failed")
            }
        }
    }
}

impl std::error::Error for AllocError {}

/// A range operation reached past the array's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    pub index: usize,
    pub count: usize,
    pub size: usize,
}

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "range {}..{}+{} out of bounds for size {}",
            self.index, self.index, self.count, self.size
        )
    }
}

impl std::error::Error for OutOfBounds {}

/// Failure of `DynArray::insert_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    OutOfBounds(OutOfBounds),
    Alloc(AllocError),
}

impl From<OutOfBounds> for RangeError {
    fn from(e: OutOfBounds) -> Self {
        RangeError::OutOfBounds(e)
    }
}

impl From<AllocError> for RangeError {
    fn from(e: AllocError) -> Self {
        RangeError::Alloc(e)
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::OutOfBounds(e) => e.fmt(f),
            RangeError::Alloc(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for RangeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RangeError::OutOfBounds(e) => Some(e),
            RangeError::Alloc(e) => Some(e),
        }
    }
}

/// Failure of `HashTable::insert`.
///
/// The two cases are kept apart so callers can tell a rejected key (the
/// table is fine, pick another key) from a table that could not grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    DuplicateKey,
    ResizeFailed(AllocError),
}

impl From<AllocError> for InsertError {
    fn from(e: AllocError) -> Self {
        InsertError::ResizeFailed(e)
    }
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::DuplicateKey => f.write_str("a record with this key already exists"),
            InsertError::ResizeFailed(e) => write!(f, "bucket table could not grow: {e}"),
        }
    }
}

impl std::error::Error for InsertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InsertError::DuplicateKey => None,
            InsertError::ResizeFailed(e) => Some(e),
        }
    }
}
