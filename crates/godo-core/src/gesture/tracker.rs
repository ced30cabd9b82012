//! Per-card ordering guard for gesture samples.
//!
//! The host numbers every gesture event with a sequence number that only
//! grows over the lifetime of a session. A tracker is bound to one card and
//! keeps the newest cumulative sample; anything older than what it has
//! already seen is dropped, including late events from the previous card.

use tracing::debug;

use super::{GestureEnd, GestureSample};

#[derive(Debug, Clone)]
pub struct GestureTracker {
    item_id: String,
    /// Highest sequence number applied (or inherited from the previous card).
    high_water: Option<u64>,
    latest: Option<(u64, GestureSample)>,
}

impl GestureTracker {
    /// Start tracking `item_id`. `floor` is the newest sequence number seen
    /// for an earlier card; events at or below it are rejected.
    pub fn new(item_id: impl Into<String>, floor: Option<u64>) -> Self {
        Self {
            item_id: item_id.into(),
            high_water: floor,
            latest: None,
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn high_water(&self) -> Option<u64> {
        self.high_water
    }

    /// Newest applied sample, if any.
    pub fn latest(&self) -> Option<GestureSample> {
        self.latest.map(|(_, s)| s)
    }

    fn is_stale(&self, seq: u64) -> bool {
        self.high_water.is_some_and(|hw| seq <= hw)
    }

    /// Apply an update. Returns `false` when the sample is stale.
    pub fn apply(&mut self, seq: u64, sample: GestureSample) -> bool {
        if self.is_stale(seq) {
            debug!(item_id = %self.item_id, seq, "dropping stale gesture sample");
            return false;
        }
        self.high_water = Some(seq);
        self.latest = Some((seq, sample));
        true
    }

    /// Resolve the sample a release is evaluated on.
    ///
    /// A release older than the newest update keeps its velocity but takes
    /// the newest displacement.
    pub fn resolve_release(&mut self, seq: u64, end: GestureEnd) -> GestureEnd {
        match self.latest {
            Some((latest_seq, sample)) if seq < latest_seq => {
                debug!(
                    item_id = %self.item_id,
                    seq,
                    latest_seq,
                    "release older than newest sample; using newest displacement"
                );
                GestureEnd {
                    dx: sample.dx,
                    dy: sample.dy,
                    ..end
                }
            }
            _ => {
                self.high_water = Some(self.high_water.map_or(seq, |hw| hw.max(seq)));
                end
            }
        }
    }
}
