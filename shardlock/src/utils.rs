//! Cache-line padding.

use core::ops::{Deref, DerefMut};

// Destructive interference size per architecture.
// s390x: 256B, aarch64: 128B (Apple M-series / Neoverse prefetch pairs),
// everything else: 64B.

/// Width in bytes of one hardware cache line on the build target.
#[cfg(target_arch = "s390x")]
pub const CACHE_LINE_SIZE: usize = 256;

/// Width in bytes of one hardware cache line on the build target.
#[cfg(target_arch = "aarch64")]
pub const CACHE_LINE_SIZE: usize = 128;

/// Width in bytes of one hardware cache line on the build target.
#[cfg(not(any(target_arch = "s390x", target_arch = "aarch64")))]
pub const CACHE_LINE_SIZE: usize = 64;

/// Pads and aligns `T` to [`CACHE_LINE_SIZE`] so that two neighbouring
/// values in a slice never share a cache line.
#[cfg_attr(target_arch = "s390x", repr(align(256)))]
#[cfg_attr(target_arch = "aarch64", repr(align(128)))]
#[cfg_attr(not(any(target_arch = "s390x", target_arch = "aarch64")), repr(align(64)))]
#[derive(Copy, Clone, Default, Debug)]
pub struct CacheAligned<T> {
    /// The padded value
    pub data: T,
}

impl<T> Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for CacheAligned<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T> CacheAligned<T> {
    /// Wraps `t`.
    pub const fn new(t: T) -> Self {
        Self { data: t }
    }

    /// Unwraps the padded value.
    pub fn into_inner(self) -> T {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_matches_cache_line() {
        assert_eq!(core::mem::align_of::<CacheAligned<u8>>(), CACHE_LINE_SIZE);
        assert_eq!(core::mem::size_of::<CacheAligned<u8>>(), CACHE_LINE_SIZE);
    }

    #[test]
    fn test_neighbours_do_not_share_a_line() {
        let cells = [CacheAligned::new(1u64), CacheAligned::new(2u64)];
        let a = &cells[0] as *const _ as usize;
        let b = &cells[1] as *const _ as usize;
        assert!(b - a >= CACHE_LINE_SIZE);
        assert_eq!(a % CACHE_LINE_SIZE, 0);
        assert_eq!(*cells[1], 2);
    }
}
