//! FNV hashing, the default hasher of `HashTable`.
//!
//! Each byte is folded in with xor followed by a multiply by the 64-bit
//! FNV prime. Fast and deterministic; not resistant to adversarial keys.

use core::hash::{BuildHasher, Hasher};

pub const OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;
pub const PRIME: u64 = 1_099_511_628_211;

/// Hash `bytes` in one shot.
#[inline]
pub fn fnv(bytes: &[u8]) -> u64 {
    let mut h = FnvHasher::default();
    h.write(bytes);
    h.finish()
}

#[derive(Debug, Clone, Copy)]
pub struct FnvHasher(u64);

impl Default for FnvHasher {
    #[inline]
    fn default() -> Self {
        FnvHasher(OFFSET_BASIS)
    }
}

impl Hasher for FnvHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(PRIME);
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FnvBuildHasher;

impl BuildHasher for FnvBuildHasher {
    type Hasher = FnvHasher;

    #[inline]
    fn build_hasher(&self) -> FnvHasher {
        FnvHasher::default()
    }
}
