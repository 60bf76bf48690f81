//! handle-engines: intrusive container engines over caller-owned records.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: containers that link, order and hash records the caller already
//!   stores, without owning or copying them.
//! - Layers:
//!   - `records`: the capability traits. `Records` maps a copyable handle to
//!     a record; `Chained`, `AvlNode` and `Keyed` expose the link fields and
//!     key a container needs from that record.
//!   - `alloc`: fallible buffer allocation (`Global`, `Bounded`) for the
//!     array-backed engines.
//!   - Linked engines: `list` (singly linked chains) and `avl` (height
//!     balanced ordered tree). They touch records only through handles.
//!   - Array-backed engines: `array::DynArray` and, on top of it,
//!     `heap::BinaryHeap` and the bucket array of `hash_table::HashTable`.
//!
//! Constraints
//! - Single-threaded, synchronous; every operation runs to completion.
//! - Containers never own records. Storage is passed in per call as
//!   `&mut R`, so a record cannot be freed while an engine is using it.
//! - Handles are `Copy` values (`usize` indices or `slotmap` keys). A stale
//!   handle panics in the storage lookup.
//! - A record is in at most one container per link field. Inserting a
//!   record whose links are still set panics.
//! - Operational failures (allocation, out-of-bounds ranges, duplicate
//!   keys) are returned as errors and leave the container unchanged.
//!
//! Traversal state
//! - The tree keeps no parent links. Ancestor paths live in an
//!   `avl::Cursor` supplied by the caller, sized for the worst-case AVL
//!   height. The same cursor drives ordered traversal (`entries`,
//!   `reversed`, `upper`, `lower` then `avl::next`/`avl::prior`).
//! - Mutating a tree while a cursor walks it is a logic error; the borrow
//!   of the record storage makes it hard to do by accident.
//!
//! Hashing
//! - `HashTable` hashes keys with any `BuildHasher`; the default is 64-bit
//!   FNV (`fnv::FnvBuildHasher`). Keys are read from the records on every
//!   lookup and rehash.

pub mod alloc;
pub mod array;
pub mod avl;
mod avl_proptest;
pub mod error;
pub mod fnv;
pub mod hash_table;
mod hash_table_proptest;
pub mod heap;
pub mod list;
pub mod records;

// Public surface
pub use alloc::{Bounded, BufferAlloc, Global};
pub use array::DynArray;
pub use avl::{AvlTree, Cursor};
pub use error::{AllocError, InsertError, OutOfBounds, RangeError};
pub use fnv::{FnvBuildHasher, FnvHasher};
pub use hash_table::HashTable;
pub use heap::{BinaryHeap, HeapOrder, MinOrder};
pub use list::List;
pub use records::{AvlNode, Chained, Keyed, Records};
