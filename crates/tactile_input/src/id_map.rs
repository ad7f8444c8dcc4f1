//! Remapping of native platform touch ids to stable process-assigned ids.

use hashbrown::HashMap;
use log::warn;

/// First stable id handed out by the mapper. Ids below this value are
/// reserved for a synthetic pointer/mouse touch channel.
pub(crate) const FIRST_STABLE_ID: u32 = 2;

/// Maps native (platform-assigned) contact identifiers to small, stable
/// process-assigned ids, shielding the rest of the system from platform id
/// reuse and duplication quirks.
///
/// Stable ids are drawn from a monotonically increasing counter starting at
/// [`FIRST_STABLE_ID`], wrapping back to it on overflow. A stable id is
/// never handed out again while the mapping that produced it is still open.
#[derive(Debug)]
pub(crate) struct TouchIdMapper {
    open: HashMap<u64, u32>,
    next_id: u32,
}

impl Default for TouchIdMapper {
    fn default() -> Self {
        Self {
            open: HashMap::new(),
            next_id: FIRST_STABLE_ID,
        }
    }
}

impl TouchIdMapper {
    /// Opens a mapping for `native_id` and returns the assigned stable id.
    ///
    /// Registering a native id that already has an open mapping is a
    /// platform event-ordering violation; the old mapping is replaced.
    pub(crate) fn register(&mut self, native_id: u64) -> u32 {
        let stable_id = self.next_id;
        self.next_id = self.next_id.checked_add(1).unwrap_or(FIRST_STABLE_ID);
        if self.open.insert(native_id, stable_id).is_some() {
            warn!("native touch id {native_id} registered twice; replacing the open mapping");
            debug_assert!(false, "native touch id {native_id} registered twice");
        }
        stable_id
    }

    /// Looks up the stable id mapped to `native_id`, if any.
    ///
    /// `None` means the event carrying the native id is stale or
    /// out-of-order and must be dropped.
    pub(crate) fn resolve(&self, native_id: u64) -> Option<u32> {
        self.open.get(&native_id).copied()
    }

    /// Closes the mapping for `native_id` and returns the stable id it held.
    pub(crate) fn unregister(&mut self, native_id: u64) -> Option<u32> {
        self.open.remove(&native_id)
    }

    /// Native ids with an open mapping, collected for bulk release/cancel
    /// sweeps.
    pub(crate) fn open_native_ids(&self) -> Vec<u64> {
        self.open.keys().copied().collect()
    }
}
