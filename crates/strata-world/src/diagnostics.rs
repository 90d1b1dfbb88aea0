use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for data the world recovered from rather than rejected.
#[derive(Debug, Default)]
pub struct Diagnostics {
    palette_misses: AtomicU64,
    orphaned_block_updates: AtomicU64,
    deferred_lighting_updates: AtomicU64,
    dropped_packets: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    /// Blocks decoded as air because their palette index was out of range.
    pub palette_misses: u64,
    /// Block changes aimed at chunks that were not loaded.
    pub orphaned_block_updates: u64,
    /// Light updates held back until their chunk arrived.
    pub deferred_lighting_updates: u64,
    /// Packets abandoned because they failed to decode.
    pub dropped_packets: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn record_palette_misses(&self, count: u64) {
        self.palette_misses.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_orphaned_block_update(&self) {
        self.orphaned_block_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deferred_lighting_update(&self) {
        self.deferred_lighting_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_packet(&self) {
        self.dropped_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            palette_misses: self.palette_misses.load(Ordering::Relaxed),
            orphaned_block_updates: self.orphaned_block_updates.load(Ordering::Relaxed),
            deferred_lighting_updates: self.deferred_lighting_updates.load(Ordering::Relaxed),
            dropped_packets: self.dropped_packets.load(Ordering::Relaxed),
        }
    }
}
