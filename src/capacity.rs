//! Validated bucket count.

use crate::error::InvalidCapacity;
use core::num::NonZeroUsize;

/// Number of buckets in a `Table`; always at least one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Capacity(NonZeroUsize);

impl Capacity {
    /// A single bucket. Every key lands in the same chain.
    pub const ONE: Capacity = Capacity(NonZeroUsize::MIN);

    #[inline]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    /// `factor` buckets per entry, never fewer than one bucket.
    pub(crate) fn for_entries(entries: usize, factor: usize) -> Self {
        match NonZeroUsize::new(entries.saturating_mul(factor)) {
            Some(n) => Capacity(n),
            None => Capacity::ONE,
        }
    }
}

impl From<NonZeroUsize> for Capacity {
    fn from(n: NonZeroUsize) -> Self {
        Capacity(n)
    }
}

impl From<Capacity> for usize {
    fn from(c: Capacity) -> Self {
        c.get()
    }
}

macro_rules! capacity_try_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl TryFrom<$t> for Capacity {
                type Error = InvalidCapacity;

                fn try_from(n: $t) -> Result<Self, Self::Error> {
                    usize::try_from(n)
                        .ok()
                        .and_then(NonZeroUsize::new)
                        .map(Capacity)
                        .ok_or(InvalidCapacity {
                            requested: n as i128,
                        })
                }
            }
        )*
    };
}

capacity_try_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
