//! Swipe session: ties gestures, the card queue and the decision set
//! together.
//!
//! Every commit, whether from a drag release or a button, goes through one
//! private path that records the decision and hands out an
//! [`AdvanceTicket`]. The queue only moves when that ticket is settled,
//! normally after the exit animation, so a card advances exactly once per
//! commit and never on a cancel.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::direction::Direction;
use crate::dispatch::{Decision, DecisionCounts, DecisionRecord};
use crate::error::CoreError;
use crate::events::Event;
use crate::gesture::{
    GestureClassifier, GestureEnd, GestureSample, GestureTracker, Provisional, Release,
    ThresholdClassifier,
};
use crate::item::Item;
use crate::queue::CardQueue;
use crate::source::{DataAccessFacade, DataNotice, DataOrigin, ItemSource, RemoteSource};
use crate::storage::Config;

/// Permission to advance the queue past one committed card.
///
/// Not `Clone`: settling consumes it, so one commit can advance at most
/// once. Reloading or seeking expires every outstanding ticket.
#[must_use = "settle the ticket or the session keeps ignoring input"]
#[derive(Debug, PartialEq, Eq)]
pub struct AdvanceTicket {
    id: u64,
    item_id: String,
}

impl AdvanceTicket {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }
}

#[must_use = "the ticket inside must be settled"]
#[derive(Debug)]
pub struct CommittedSwipe {
    pub item_id: String,
    pub direction: Direction,
    /// Collection sizes right after the commit.
    pub counts: DecisionCounts,
    pub ticket: AdvanceTicket,
}

#[must_use = "a committed outcome carries a ticket that must be settled"]
#[derive(Debug)]
pub enum SwipeOutcome {
    Committed(CommittedSwipe),
    /// Thresholds not met; the card springs back and stays current.
    ReturnToOrigin,
    /// No current card, an exit is still pending, or the release was stale.
    Ignored,
}

impl SwipeOutcome {
    /// Dropping a committed outcome after this check loses its ticket; use
    /// [`SwipeSession::settle_pending`] to recover.
    pub fn is_committed(&self) -> bool {
        matches!(self, SwipeOutcome::Committed(_))
    }
}

pub struct SwipeSession<R = RemoteSource, C = ThresholdClassifier> {
    facade: DataAccessFacade<R>,
    classifier: C,
    queue: CardQueue,
    tracker: Option<GestureTracker>,
    /// Newest gesture sequence number seen on an earlier gesture.
    seq_floor: Option<u64>,
    /// Id of the ticket the current exit waits on.
    pending_exit: Option<u64>,
    next_ticket: u64,
    settle_delay: Duration,
    events: Vec<Event>,
}

impl SwipeSession<RemoteSource, ThresholdClassifier> {
    /// Session wired from configuration. Call [`SwipeSession::load`] next.
    pub fn from_config(config: &Config) -> Result<Self, CoreError> {
        let thresholds = config.gesture.thresholds();
        thresholds.validate()?;
        let facade = DataAccessFacade::from_config(config)?;
        Ok(Self::new(facade, ThresholdClassifier::new(thresholds))
            .with_settle_delay(config.gesture.settle_delay()))
    }
}

impl<R: ItemSource, C: GestureClassifier> SwipeSession<R, C> {
    pub fn new(facade: DataAccessFacade<R>, classifier: C) -> Self {
        Self {
            facade,
            classifier,
            queue: CardQueue::default(),
            tracker: None,
            seq_floor: None,
            pending_exit: None,
            next_ticket: 0,
            settle_delay: Duration::from_millis(250),
            events: Vec::new(),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch items and rebuild the queue from the first card.
    pub async fn load(&mut self) -> usize {
        let items = self.facade.fetch_all().await;
        self.install(items, false)
    }

    /// Like [`SwipeSession::load`], but only undecided items become cards.
    pub async fn load_unswiped(&mut self) -> usize {
        let items = self.facade.fetch_all().await;
        self.install(items, true)
    }

    /// Drop cached items, refetch and rebuild the queue.
    pub async fn refresh(&mut self) -> usize {
        let items = self.facade.refresh().await;
        self.install(items, false)
    }

    /// Re-apply persisted decisions, then rebuild the queue.
    pub async fn restore(&mut self, records: Vec<DecisionRecord>) -> usize {
        let applied = self.facade.restore_decisions(records).await;
        self.load().await;
        applied
    }

    fn install(&mut self, items: Vec<Item>, undecided_only: bool) -> usize {
        if undecided_only {
            self.queue.reload_undecided(items, self.facade.dispatcher());
        } else {
            self.queue.reload(items);
        }
        let count = self.queue.len();
        self.end_gesture();
        self.pending_exit = None;

        let now = Utc::now();
        let origin = match self.facade.origin() {
            Some(DataOrigin::Remote) => "remote",
            Some(DataOrigin::Local) | None => "local",
            Some(DataOrigin::Fallback { reason }) => {
                self.events.push(Event::SourceFallback {
                    reason: reason.clone(),
                    at: now,
                });
                "fallback"
            }
            Some(DataOrigin::Unavailable) => "unavailable",
        };
        for notice in self.facade.take_notices() {
            match notice {
                DataNotice::NoDataAvailable => {
                    self.events.push(Event::NoDataAvailable { at: now })
                }
            }
        }
        self.events.push(Event::ItemsLoaded {
            count,
            origin: origin.to_string(),
            at: now,
        });
        info!(count, origin, "deck loaded");
        count
    }

    /// Restore a cursor position saved by a host.
    pub fn seek(&mut self, cursor: usize) {
        self.queue.seek(cursor);
        self.end_gesture();
        self.pending_exit = None;
    }

    // ── Gestures ─────────────────────────────────────────────────────

    fn end_gesture(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            self.seq_floor = self.seq_floor.max(tracker.high_water());
        }
    }

    fn tracker_for_current(&mut self) -> Option<&mut GestureTracker> {
        let current_id = self.queue.current()?.id.clone();
        let stale_tracker = self
            .tracker
            .as_ref()
            .is_some_and(|t| t.item_id() != current_id);
        if stale_tracker {
            self.end_gesture();
        }
        let floor = self.seq_floor;
        Some(
            self.tracker
                .get_or_insert_with(|| GestureTracker::new(current_id, floor)),
        )
    }

    /// Feed a drag update. Returns the feedback to render for the newest
    /// applied sample.
    pub fn update(&mut self, seq: u64, sample: GestureSample) -> Provisional {
        if self.pending_exit.is_some() {
            return Provisional::Neutral;
        }
        let Some(tracker) = self.tracker_for_current() else {
            return Provisional::Neutral;
        };
        tracker.apply(seq, sample);
        match tracker.latest() {
            Some(latest) => self.classifier.provisional(&latest),
            None => Provisional::Neutral,
        }
    }

    /// Feed the release of a drag.
    pub fn release(&mut self, seq: u64, end: GestureEnd) -> SwipeOutcome {
        if self.pending_exit.is_some() {
            debug!(seq, "release while exit pending; ignored");
            return SwipeOutcome::Ignored;
        }
        if self.seq_floor.is_some_and(|floor| seq <= floor) {
            debug!(seq, "release from an earlier gesture; ignored");
            return SwipeOutcome::Ignored;
        }
        let Some(tracker) = self.tracker_for_current() else {
            return SwipeOutcome::Ignored;
        };
        let item_id = tracker.item_id().to_string();
        let resolved = tracker.resolve_release(seq, end);

        match self.classifier.release(&resolved) {
            Release::Commit { direction, basis } => {
                debug!(%item_id, ?direction, ?basis, "release commits");
                self.end_gesture();
                match self.commit_current(direction) {
                    Some(committed) => SwipeOutcome::Committed(committed),
                    None => SwipeOutcome::Ignored,
                }
            }
            Release::ReturnToOrigin => {
                self.end_gesture();
                self.events.push(Event::SwipeCancelled {
                    item_id,
                    at: Utc::now(),
                });
                SwipeOutcome::ReturnToOrigin
            }
        }
    }

    /// Commit the current card without a drag (button path).
    pub fn choose(&mut self, direction: Direction) -> Option<CommittedSwipe> {
        if self.pending_exit.is_some() {
            debug!(?direction, "choose while exit pending; ignored");
            return None;
        }
        self.end_gesture();
        self.commit_current(direction)
    }

    fn commit_current(&mut self, direction: Direction) -> Option<CommittedSwipe> {
        let item = self.queue.current()?.clone();
        // The card on screen stays decidable even if a cache reload dropped it.
        let counts = self.facade.commit_item(&item, direction)?;
        let item_id = item.id;

        self.next_ticket += 1;
        let ticket = AdvanceTicket {
            id: self.next_ticket,
            item_id: item_id.clone(),
        };
        self.pending_exit = Some(ticket.id);
        self.events.push(Event::SwipeCommitted {
            item_id: item_id.clone(),
            direction,
            counts,
            at: Utc::now(),
        });
        Some(CommittedSwipe {
            item_id,
            direction,
            counts,
            ticket,
        })
    }

    /// Advance past the committed card. Returns `false` when the ticket
    /// was expired by a reload or seek.
    pub fn settle(&mut self, ticket: AdvanceTicket) -> bool {
        if self.pending_exit != Some(ticket.id) {
            debug!(item_id = %ticket.item_id, "stale advance ticket discarded");
            return false;
        }
        self.finish_exit();
        true
    }

    /// Settle the pending exit without its ticket, for hosts that lost it.
    /// Returns `false` when no exit is pending.
    pub fn settle_pending(&mut self) -> bool {
        if self.pending_exit.is_none() {
            return false;
        }
        debug!("settling pending exit without its ticket");
        self.finish_exit();
        true
    }

    fn finish_exit(&mut self) {
        self.pending_exit = None;
        self.queue.advance();
        self.events.push(Event::QueueAdvanced {
            cursor: self.queue.cursor(),
            item_id: self.queue.current().map(|i| i.id.clone()),
            at: Utc::now(),
        });
    }

    /// Wait out the exit animation, then settle.
    pub async fn settle_after(&mut self, ticket: AdvanceTicket, delay: Duration) -> bool {
        tokio::time::sleep(delay).await;
        self.settle(ticket)
    }

    // ── Decisions ────────────────────────────────────────────────────

    pub fn undo(&mut self, item_id: &str) -> Option<Decision> {
        let undone = self.facade.undo(item_id)?;
        self.push_undone(&undone);
        Some(undone)
    }

    pub fn undo_last(&mut self) -> Option<Decision> {
        let undone = self.facade.undo_last()?;
        self.push_undone(&undone);
        Some(undone)
    }

    fn push_undone(&mut self, undone: &Decision) {
        self.events.push(Event::DecisionUndone {
            item_id: undone.item_id.clone(),
            direction: undone.direction,
            counts: self.facade.dispatcher().counts(),
            at: Utc::now(),
        });
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn current(&self) -> Option<&Item> {
        self.queue.current()
    }

    pub fn next(&self) -> Option<&Item> {
        self.queue.next()
    }

    pub fn queue(&self) -> &CardQueue {
        &self.queue
    }

    pub fn counts(&self) -> DecisionCounts {
        self.facade.dispatcher().counts()
    }

    pub fn exit_pending(&self) -> bool {
        self.pending_exit.is_some()
    }

    pub fn facade(&self) -> &DataAccessFacade<R> {
        &self.facade
    }

    pub fn facade_mut(&mut self) -> &mut DataAccessFacade<R> {
        &mut self.facade
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::item::fixtures::items;
    use crate::source::{LocalDataset, SourceMode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn session(n: usize) -> SwipeSession<LocalDataset> {
        let facade = DataAccessFacade::local(LocalDataset::from_items(items(n)));
        let mut session = SwipeSession::new(facade, ThresholdClassifier::default());
        session.load().await;
        session.drain_events();
        session
    }

    fn committed(outcome: SwipeOutcome) -> CommittedSwipe {
        match outcome {
            SwipeOutcome::Committed(c) => c,
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn release_commits_and_settle_advances_once() {
        let mut s = session(3).await;
        let c = committed(s.release(1, GestureEnd::new(120.0, 10.0, 50.0, 5.0)));
        assert_eq!(c.item_id, "evt-0");
        assert_eq!(c.direction, Direction::CommitPrivate);
        assert_eq!(c.counts.commit_private, 1);

        // Card stays current until the exit settles.
        assert_eq!(s.current().unwrap().id, "evt-0");
        assert!(s.exit_pending());
        assert!(s.settle(c.ticket));
        assert_eq!(s.current().unwrap().id, "evt-1");
        assert!(!s.exit_pending());
    }

    #[tokio::test]
    async fn input_is_ignored_while_exit_pending() {
        let mut s = session(3).await;
        let c = s.choose(Direction::Discard).unwrap();
        assert_eq!(s.update(2, GestureSample::new(200.0, 0.0)), Provisional::Neutral);
        assert!(matches!(
            s.release(3, GestureEnd::new(200.0, 0.0, 900.0, 0.0)),
            SwipeOutcome::Ignored
        ));
        assert!(s.choose(Direction::Defer).is_none());
        assert!(s.settle(c.ticket));
        assert_eq!(s.counts().total(), 1);
    }

    #[tokio::test]
    async fn cancel_keeps_card_and_records_nothing() {
        let mut s = session(2).await;
        assert!(matches!(
            s.release(1, GestureEnd::new(5.0, 5.0, 5.0, 5.0)),
            SwipeOutcome::ReturnToOrigin
        ));
        assert_eq!(s.current().unwrap().id, "evt-0");
        assert_eq!(s.counts().total(), 0);
        let events = s.drain_events();
        assert!(matches!(&events[..], [Event::SwipeCancelled { item_id, .. }] if item_id == "evt-0"));
    }

    #[tokio::test]
    async fn reload_expires_outstanding_ticket() {
        let mut s = session(3).await;
        let c = s.choose(Direction::Defer).unwrap();
        s.refresh().await;
        assert!(!s.settle(c.ticket));
        assert_eq!(s.queue().cursor(), 0);
        // Decision itself survives the refresh.
        assert!(s.facade().has_decision("evt-0"));
    }

    #[tokio::test]
    async fn late_samples_from_previous_card_are_dropped() {
        let mut s = session(3).await;
        assert!(matches!(
            s.update(5, GestureSample::new(60.0, 0.0)),
            Provisional::Leaning { direction: Direction::CommitPrivate, .. }
        ));
        let c = committed(s.release(6, GestureEnd::new(120.0, 0.0, 0.0, 0.0)));
        assert!(s.settle(c.ticket));

        assert_eq!(s.update(4, GestureSample::new(0.0, -90.0)), Provisional::Neutral);
        assert!(matches!(
            s.release(6, GestureEnd::new(0.0, -120.0, 0.0, 0.0)),
            SwipeOutcome::Ignored
        ));
        assert_eq!(s.current().unwrap().id, "evt-1");
        assert!(!s.facade().has_decision("evt-1"));
    }

    #[tokio::test]
    async fn out_of_order_release_uses_newest_displacement() {
        let mut s = session(2).await;
        s.update(10, GestureSample::new(-120.0, 0.0));
        let c = committed(s.release(9, GestureEnd::new(0.0, 0.0, 0.0, 0.0)));
        assert_eq!(c.direction, Direction::Discard);
    }

    #[tokio::test]
    async fn wrapping_recommit_moves_the_item() {
        let mut s = session(3).await;
        for _ in 0..3 {
            let c = s.choose(Direction::Defer).unwrap();
            assert!(s.settle(c.ticket));
        }
        assert_eq!(s.current().unwrap().id, "evt-0");
        let c = s.choose(Direction::CommitPublic).unwrap();
        assert!(s.settle(c.ticket));

        assert_eq!(s.queue().cursor(), 1);
        let counts = s.counts();
        assert_eq!(counts.defer, 2);
        assert_eq!(counts.commit_public, 1);
        assert_eq!(counts.total(), 3);
    }

    #[tokio::test]
    async fn undo_emits_updated_counts() {
        let mut s = session(2).await;
        let c = s.choose(Direction::CommitPrivate).unwrap();
        s.settle(c.ticket);
        s.drain_events();

        let undone = s.undo_last().unwrap();
        assert_eq!(undone.item_id, "evt-0");
        assert!(s.undo("evt-0").is_none());
        match &s.drain_events()[..] {
            [Event::DecisionUndone { counts, direction, .. }] => {
                assert_eq!(counts.total(), 0);
                assert_eq!(*direction, Direction::CommitPrivate);
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_data_reports_once_and_ignores_input() {
        let facade = DataAccessFacade::local(LocalDataset::from_items(Vec::new()));
        let mut s = SwipeSession::new(facade, ThresholdClassifier::default());
        assert_eq!(s.load().await, 0);
        assert!(s.current().is_none());
        assert!(matches!(
            s.release(1, GestureEnd::new(200.0, 0.0, 0.0, 0.0)),
            SwipeOutcome::Ignored
        ));
        assert!(s.choose(Direction::Defer).is_none());

        let events = s.drain_events();
        assert!(events.iter().any(|e| matches!(e, Event::NoDataAvailable { .. })));
        s.refresh().await;
        assert!(!s
            .drain_events()
            .iter()
            .any(|e| matches!(e, Event::NoDataAvailable { .. })));
    }

    #[tokio::test]
    async fn load_unswiped_skips_decided_items() {
        let mut s = session(3).await;
        let c = s.choose(Direction::Discard).unwrap();
        s.settle(c.ticket);
        assert_eq!(s.load_unswiped().await, 2);
        assert_eq!(s.current().unwrap().id, "evt-1");
        assert_eq!(s.load().await, 3);
    }

    #[tokio::test]
    async fn lost_ticket_is_recovered_by_settle_pending() {
        let mut s = session(3).await;
        assert!(!s.settle_pending());
        let _ = s.choose(Direction::Discard);
        assert!(s.choose(Direction::Defer).is_none());

        assert!(s.settle_pending());
        assert!(!s.settle_pending());
        assert_eq!(s.queue().cursor(), 1);
        let c = s.choose(Direction::Defer).unwrap();
        assert_eq!(c.item_id, "evt-1");
        assert!(s.settle(c.ticket));
    }

    /// Serves the full list once, then drops the first item.
    struct ShrinkingSource {
        calls: AtomicUsize,
    }

    impl ItemSource for ShrinkingSource {
        fn name(&self) -> &str {
            "shrinking"
        }

        async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
            let all = items(4);
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(all)
            } else {
                Ok(all[1..].to_vec())
            }
        }
    }

    #[tokio::test]
    async fn card_on_screen_survives_cache_reload() {
        let source = ShrinkingSource {
            calls: AtomicUsize::new(0),
        };
        let facade = DataAccessFacade::new(
            SourceMode::Remote,
            Some(source),
            LocalDataset::from_items(items(2)),
        )
        .with_cache_ttl(Duration::from_millis(1));
        let mut s = SwipeSession::new(facade, ThresholdClassifier::default());
        assert_eq!(s.load().await, 4);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(s.facade_mut().search("event").await.len(), 3);
        assert!(s.facade().dispatcher().item("evt-0").is_none());

        let c = s.choose(Direction::Defer).unwrap();
        assert_eq!(c.item_id, "evt-0");
        assert!(s.facade().has_decision("evt-0"));
        assert!(s.settle(c.ticket));
        assert_eq!(s.current().unwrap().id, "evt-1");
    }

    #[tokio::test]
    async fn settle_after_waits_then_advances() {
        let mut s = session(2).await;
        let c = s.choose(Direction::Defer).unwrap();
        assert!(s.settle_after(c.ticket, Duration::from_millis(1)).await);
        assert_eq!(s.current().unwrap().id, "evt-1");
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, Event::QueueAdvanced { cursor: 1, .. })));
    }
}
