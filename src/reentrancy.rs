//! Debug-only guard against reentering a table while a chain is probed.
//!
//! Probing runs caller code (`K: Hash`, `K: Eq`). If that code reaches
//! back into the same table, debug builds panic instead of observing a
//! half-finished operation. Release builds compile the guard away.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table probe tracker. Guard a probe with `let _g = self.probe.enter();`.
#[derive(Debug)]
pub(crate) struct ProbeGuard {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // Send but !Sync in every profile.
    _nosync: PhantomData<Cell<()>>,
}

impl ProbeGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _nosync: PhantomData,
        }
    }

    /// Mark a probe as running. Debug builds panic if one already is.
    #[inline]
    pub(crate) fn enter(&self) -> Probe<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "table reentered while probing a chain"
            );
            Probe { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            Probe { _z: PhantomData }
        }
    }
}

impl Default for ProbeGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the running flag on drop, including when caller code unwinds.
pub(crate) struct Probe<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ProbeGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for Probe<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(false);
    }
}
