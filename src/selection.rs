//! Staleness guarding for in-flight retrievals.
//!
//! Selections are never cancelled: changing station or month while a download
//! is in flight lets the old download finish (its cache write is harmless,
//! the data is immutable), but its *result* must not reach the screen. Each
//! selection therefore draws a generation tag, and a pipeline run whose tag
//! is no longer current is discarded by the caller.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic generation counter; owned by the client, one per application.
#[derive(Debug, Default)]
pub(crate) struct SelectionCounter {
    current: AtomicU64,
}

impl SelectionCounter {
    /// Starts a new selection, invalidating every previously issued tag.
    pub(crate) fn begin(&self) -> SelectionTag {
        SelectionTag(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub(crate) fn is_current(&self, tag: SelectionTag) -> bool {
        self.current.load(Ordering::SeqCst) == tag.0
    }
}

/// Opaque stamp identifying the selection that was active when a request was
/// issued. Obtained from [`crate::Regenstat::begin_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTag(u64);
