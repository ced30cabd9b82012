//! Decision set and the destination collections derived from it.
//!
//! The decision map is the only state; every collection and counter is read
//! off a per-direction index that is updated in the same call that changes
//! the map, so the two cannot drift apart.

mod calendar;
mod store;

pub use calendar::{CalendarEntry, CalendarFilter, CalendarVisibility};
pub use store::DecisionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::direction::Direction;
use crate::item::Item;

/// The current direction associated with an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub item_id: String,
    pub direction: Direction,
    pub decided_at: DateTime<Utc>,
}

/// Persisted decision shape, one active record per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    #[serde(alias = "item_id")]
    pub item_id: String,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
}

impl From<&Decision> for DecisionRecord {
    fn from(d: &Decision) -> Self {
        Self {
            item_id: d.item_id.clone(),
            direction: d.direction,
            timestamp: d.decided_at,
        }
    }
}

/// Size of each destination collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecisionCounts {
    pub commit_private: usize,
    pub commit_public: usize,
    pub defer: usize,
    pub discard: usize,
}

impl DecisionCounts {
    pub fn get(&self, direction: Direction) -> usize {
        match direction {
            Direction::CommitPrivate => self.commit_private,
            Direction::CommitPublic => self.commit_public,
            Direction::Defer => self.defer,
            Direction::Discard => self.discard,
        }
    }

    pub fn total(&self) -> usize {
        self.commit_private + self.commit_public + self.defer + self.discard
    }

    /// Items on either calendar.
    pub fn attending(&self) -> usize {
        self.commit_private + self.commit_public
    }
}

/// Swipe statistics for profile views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeStats {
    pub total: usize,
    pub counts: DecisionCounts,
    /// Share of decisions that landed on a calendar, 0.0..=1.0.
    pub attend_rate: f64,
    pub last_decision_at: Option<DateTime<Utc>>,
}

/// Ordering key: decision timestamp, then commit sequence.
type OrderKey = (DateTime<Utc>, u64);

#[derive(Debug, Clone)]
struct Entry {
    decision: Decision,
    key: OrderKey,
}

#[derive(Debug, Clone, Default)]
pub struct CategorizationDispatcher {
    /// Items that may be decided. Decided items stay here across refreshes.
    catalog: HashMap<String, Item>,
    decisions: HashMap<String, Entry>,
    index: [BTreeMap<OrderKey, String>; 4],
    seq: u64,
    revision: u64,
}

impl CategorizationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Catalog ──────────────────────────────────────────────────────

    /// Replace the set of known items after a load or refresh.
    ///
    /// Items that already carry a decision are kept even if the new list
    /// dropped them, so collections keep resolving.
    pub fn sync_catalog(&mut self, items: &[Item]) {
        let mut catalog: HashMap<String, Item> = items
            .iter()
            .map(|item| (item.id.clone(), item.clone()))
            .collect();
        for id in self.decisions.keys() {
            if !catalog.contains_key(id) {
                if let Some(item) = self.catalog.remove(id) {
                    catalog.insert(id.clone(), item);
                }
            }
        }
        self.catalog = catalog;
        self.revision += 1;
    }

    pub fn is_known(&self, item_id: &str) -> bool {
        self.catalog.contains_key(item_id)
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.catalog.get(item_id)
    }

    /// Make `item` decidable even if the latest catalog sync dropped it.
    /// Returns `true` if it was not known before.
    pub fn admit(&mut self, item: &Item) -> bool {
        if self.catalog.contains_key(&item.id) {
            return false;
        }
        debug!(item_id = %item.id, "admitting item missing from catalog");
        self.catalog.insert(item.id.clone(), item.clone());
        self.revision += 1;
        true
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Associate `direction` with `item_id`, superseding any prior decision.
    ///
    /// Returns the updated counts, or `None` if the item is unknown.
    pub fn commit(&mut self, item_id: &str, direction: Direction) -> Option<DecisionCounts> {
        self.commit_at(item_id, direction, Utc::now())
    }

    pub fn commit_at(
        &mut self,
        item_id: &str,
        direction: Direction,
        at: DateTime<Utc>,
    ) -> Option<DecisionCounts> {
        if !self.catalog.contains_key(item_id) {
            debug!(item_id, %direction, "ignoring commit for unknown item");
            return None;
        }

        if let Some(prior) = self.decisions.remove(item_id) {
            self.index[prior.decision.direction.index()].remove(&prior.key);
        }

        self.seq += 1;
        let key = (at, self.seq);
        self.index[direction.index()].insert(key, item_id.to_string());
        self.decisions.insert(
            item_id.to_string(),
            Entry {
                decision: Decision {
                    item_id: item_id.to_string(),
                    direction,
                    decided_at: at,
                },
                key,
            },
        );
        self.revision += 1;
        Some(self.counts())
    }

    /// Remove the decision for `item_id`, returning the item to undecided.
    pub fn undo(&mut self, item_id: &str) -> Option<Decision> {
        let Some(entry) = self.decisions.remove(item_id) else {
            debug!(item_id, "ignoring undo for undecided item");
            return None;
        };
        self.index[entry.decision.direction.index()].remove(&entry.key);
        self.revision += 1;
        Some(entry.decision)
    }

    /// Remove the most recent decision.
    pub fn undo_last(&mut self) -> Option<Decision> {
        let last_id = self
            .index
            .iter()
            .filter_map(|idx| idx.last_key_value())
            .max_by_key(|(key, _)| **key)
            .map(|(_, id)| id.clone())?;
        self.undo(&last_id)
    }

    /// Drop every decision. The catalog is kept.
    pub fn clear(&mut self) {
        self.decisions.clear();
        for idx in &mut self.index {
            idx.clear();
        }
        self.revision += 1;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn decision(&self, item_id: &str) -> Option<&Decision> {
        self.decisions.get(item_id).map(|e| &e.decision)
    }

    pub fn has_decision(&self, item_id: &str) -> bool {
        self.decisions.contains_key(item_id)
    }

    /// All decisions in decision order.
    pub fn decisions(&self) -> Vec<&Decision> {
        let mut entries: Vec<&Entry> = self.decisions.values().collect();
        entries.sort_by_key(|e| e.key);
        entries.into_iter().map(|e| &e.decision).collect()
    }

    /// Items currently associated with `direction`, in decision order.
    pub fn derived_collection(&self, direction: Direction) -> Vec<&Item> {
        self.index[direction.index()]
            .values()
            .filter_map(|id| self.catalog.get(id))
            .collect()
    }

    pub fn counts(&self) -> DecisionCounts {
        DecisionCounts {
            commit_private: self.index[Direction::CommitPrivate.index()].len(),
            commit_public: self.index[Direction::CommitPublic.index()].len(),
            defer: self.index[Direction::Defer.index()].len(),
            discard: self.index[Direction::Discard.index()].len(),
        }
    }

    pub fn stats(&self) -> SwipeStats {
        let counts = self.counts();
        let total = counts.total();
        SwipeStats {
            total,
            counts,
            attend_rate: if total == 0 {
                0.0
            } else {
                counts.attending() as f64 / total as f64
            },
            last_decision_at: self
                .index
                .iter()
                .filter_map(|idx| idx.last_key_value())
                .map(|((at, _), _)| *at)
                .max(),
        }
    }

    /// Monotonic change counter; bumps on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ── Persistence ──────────────────────────────────────────────────

    pub fn records(&self) -> Vec<DecisionRecord> {
        self.decisions().into_iter().map(DecisionRecord::from).collect()
    }

    /// Re-apply persisted records in timestamp order. Records for items not
    /// in the catalog are skipped. Returns how many were applied.
    pub fn restore(&mut self, mut records: Vec<DecisionRecord>) -> usize {
        records.sort_by_key(|r| r.timestamp);
        let mut applied = 0;
        for record in records {
            if self
                .commit_at(&record.item_id, record.direction, record.timestamp)
                .is_some()
            {
                applied += 1;
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::fixtures::{base_time, items};
    use chrono::Duration;

    fn dispatcher(n: usize) -> CategorizationDispatcher {
        let mut d = CategorizationDispatcher::new();
        d.sync_catalog(&items(n));
        d
    }

    #[test]
    fn admit_restores_item_dropped_by_sync() {
        let mut d = dispatcher(3);
        let dropped = d.item("evt-0").unwrap().clone();
        d.sync_catalog(&items(3)[1..]);
        assert!(d.commit("evt-0", Direction::Defer).is_none());

        assert!(d.admit(&dropped));
        assert!(!d.admit(&dropped));
        assert_eq!(d.commit("evt-0", Direction::Defer).unwrap().defer, 1);
    }

    fn collections_containing(d: &CategorizationDispatcher, id: &str) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| d.derived_collection(*dir).iter().any(|i| i.id == id))
            .collect()
    }

    #[test]
    fn commit_places_item_in_exactly_one_collection() {
        for direction in Direction::ALL {
            let mut d = dispatcher(3);
            let counts = d.commit("evt-1", direction).unwrap();
            assert_eq!(counts.get(direction), 1);
            assert_eq!(counts.total(), 1);
            let hits = d
                .derived_collection(direction)
                .iter()
                .filter(|i| i.id == "evt-1")
                .count();
            assert_eq!(hits, 1);
            assert_eq!(collections_containing(&d, "evt-1"), vec![direction]);
        }
    }

    #[test]
    fn recommit_moves_item() {
        let mut d = dispatcher(3);
        d.commit("evt-0", Direction::Defer);
        let counts = d.commit("evt-0", Direction::CommitPublic).unwrap();
        assert_eq!(counts.defer, 0);
        assert_eq!(counts.commit_public, 1);
        assert_eq!(counts.total(), 1);
        assert_eq!(collections_containing(&d, "evt-0"), vec![Direction::CommitPublic]);
    }

    #[test]
    fn undo_returns_item_to_undecided() {
        let mut d = dispatcher(2);
        d.commit("evt-0", Direction::CommitPrivate);
        let undone = d.undo("evt-0").unwrap();
        assert_eq!(undone.direction, Direction::CommitPrivate);
        assert!(!d.has_decision("evt-0"));
        assert!(collections_containing(&d, "evt-0").is_empty());
        assert_eq!(d.counts(), DecisionCounts::default());
    }

    #[test]
    fn unknown_items_are_ignored() {
        let mut d = dispatcher(1);
        let rev = d.revision();
        assert!(d.commit("ghost", Direction::Defer).is_none());
        assert!(d.undo("ghost").is_none());
        assert!(d.undo("evt-0").is_none());
        assert_eq!(d.revision(), rev);
        assert_eq!(d.counts().total(), 0);
    }

    #[test]
    fn collection_is_in_decision_order() {
        let mut d = dispatcher(3);
        let t = base_time();
        d.commit_at("evt-2", Direction::Defer, t);
        d.commit_at("evt-0", Direction::Defer, t + Duration::seconds(1));
        d.commit_at("evt-1", Direction::Defer, t);
        let ids: Vec<_> = d
            .derived_collection(Direction::Defer)
            .iter()
            .map(|i| i.id.clone())
            .collect();
        // evt-1 shares evt-2's timestamp and was committed later.
        assert_eq!(ids, vec!["evt-2", "evt-1", "evt-0"]);
    }

    #[test]
    fn undo_last_removes_most_recent() {
        let mut d = dispatcher(3);
        let t = base_time();
        d.commit_at("evt-0", Direction::Discard, t);
        d.commit_at("evt-1", Direction::CommitPrivate, t + Duration::seconds(5));
        d.commit_at("evt-2", Direction::Defer, t + Duration::seconds(2));
        assert_eq!(d.undo_last().unwrap().item_id, "evt-1");
        assert_eq!(d.undo_last().unwrap().item_id, "evt-2");
        assert_eq!(d.undo_last().unwrap().item_id, "evt-0");
        assert!(d.undo_last().is_none());
    }

    #[test]
    fn counts_match_collection_sizes_after_mixed_operations() {
        let mut d = dispatcher(6);
        let ops: [(&str, Option<Direction>); 9] = [
            ("evt-0", Some(Direction::CommitPrivate)),
            ("evt-1", Some(Direction::CommitPublic)),
            ("evt-0", Some(Direction::Discard)),
            ("evt-2", Some(Direction::Defer)),
            ("evt-1", None),
            ("evt-3", Some(Direction::Defer)),
            ("ghost", Some(Direction::Defer)),
            ("evt-2", Some(Direction::Defer)),
            ("evt-4", None),
        ];
        for (id, op) in ops {
            match op {
                Some(dir) => {
                    d.commit(id, dir);
                }
                None => {
                    d.undo(id);
                }
            }
            let counts = d.counts();
            for dir in Direction::ALL {
                assert_eq!(counts.get(dir), d.derived_collection(dir).len());
            }
            assert_eq!(counts.total(), d.decisions().len());
        }
        assert_eq!(d.counts().discard, 1);
        assert_eq!(d.counts().defer, 2);
    }

    #[test]
    fn refresh_keeps_decided_items_resolvable() {
        let mut d = dispatcher(3);
        d.commit("evt-2", Direction::CommitPrivate);
        d.sync_catalog(&items(1));
        assert!(d.is_known("evt-2"));
        assert!(!d.is_known("evt-1"));
        assert_eq!(d.derived_collection(Direction::CommitPrivate).len(), 1);
        assert!(d.commit("evt-1", Direction::Defer).is_none());
    }

    #[test]
    fn records_roundtrip_through_restore() {
        let mut d = dispatcher(4);
        let t = base_time();
        d.commit_at("evt-0", Direction::CommitPrivate, t);
        d.commit_at("evt-3", Direction::Discard, t + Duration::minutes(1));
        let records = d.records();
        assert_eq!(records[0].item_id, "evt-0");

        let mut restored = dispatcher(4);
        let mut with_ghost = records.clone();
        with_ghost.push(DecisionRecord {
            item_id: "ghost".into(),
            direction: Direction::Defer,
            timestamp: t,
        });
        assert_eq!(restored.restore(with_ghost), 2);
        assert_eq!(restored.records(), records);
    }

    #[test]
    fn record_uses_camel_case_shape() {
        let record = DecisionRecord {
            item_id: "evt-9".into(),
            direction: Direction::Defer,
            timestamp: base_time(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["itemId"], "evt-9");
        assert_eq!(json["direction"], "defer");
        let legacy: DecisionRecord = serde_json::from_value(serde_json::json!({
            "item_id": "evt-9",
            "direction": "defer",
            "timestamp": "2026-05-01T18:00:00Z"
        }))
        .unwrap();
        assert_eq!(legacy, record);
    }

    #[test]
    fn stats_summarize_decisions() {
        let mut d = dispatcher(4);
        let t = base_time();
        d.commit_at("evt-0", Direction::CommitPrivate, t);
        d.commit_at("evt-1", Direction::CommitPublic, t + Duration::minutes(2));
        d.commit_at("evt-2", Direction::Discard, t + Duration::minutes(1));
        d.commit_at("evt-3", Direction::Discard, t);
        let stats = d.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.attend_rate, 0.5);
        assert_eq!(stats.last_decision_at, Some(t + Duration::minutes(2)));
    }
}
