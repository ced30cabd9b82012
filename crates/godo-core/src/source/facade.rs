//! Data access facade.
//!
//! Supplies the canonical item list. In remote mode the remote source is
//! tried first under a bounded timeout; any failure falls back to the local
//! dataset without surfacing an error. Decisions always go to the local
//! decision set; the remote only ever receives a best-effort mirror.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{ItemQuery, ItemSource, LocalDataset, RemoteSource};
use crate::direction::Direction;
use crate::dispatch::{CategorizationDispatcher, Decision, DecisionCounts, DecisionRecord};
use crate::error::{CoreError, SourceError};
use crate::item::{Category, Item};
use crate::storage::Config;

/// Which source `fetch_all` consults first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Remote,
    Local,
}

/// Where the current item list came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataOrigin {
    Remote,
    Local,
    /// Remote mode, but the local dataset was served.
    Fallback { reason: String },
    /// Neither source produced items.
    Unavailable,
}

/// Conditions the host should show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataNotice {
    NoDataAvailable,
}

#[derive(Debug, Clone)]
struct CachedItems {
    items: Vec<Item>,
    fetched_at: Instant,
}

pub struct DataAccessFacade<R = RemoteSource> {
    mode: SourceMode,
    remote: Option<R>,
    local: LocalDataset,
    timeout: Duration,
    cache_ttl: Duration,
    cache: Option<CachedItems>,
    /// Undecided items, tagged with the dispatcher revision they reflect.
    unswiped: Option<(u64, Vec<Item>)>,
    decisions: CategorizationDispatcher,
    mirror_enabled: bool,
    mirror_pending: Vec<Decision>,
    origin: Option<DataOrigin>,
    no_data_reported: bool,
    notices: Vec<DataNotice>,
}

impl DataAccessFacade<RemoteSource> {
    /// Build from configuration. Mode is fixed here for the session.
    pub fn from_config(config: &Config) -> Result<Self, CoreError> {
        let data = &config.data;
        let mode = if data.use_remote() {
            SourceMode::Remote
        } else {
            SourceMode::Local
        };
        let remote = if mode == SourceMode::Remote || data.mirror_decisions {
            Some(RemoteSource::new(&data.base_url, data.timeout())?)
        } else {
            None
        };
        let local = match data.local_dataset_path() {
            Some(path) => LocalDataset::from_path(path),
            None => LocalDataset::bundled(),
        };
        info!(?mode, base_url = %data.base_url, "data access configured");
        Ok(Self::new(mode, remote, local)
            .with_timeout(data.timeout())
            .with_cache_ttl(data.cache_ttl())
            .with_mirror(data.mirror_decisions))
    }
}

impl DataAccessFacade<LocalDataset> {
    /// Local-only facade.
    pub fn local(local: LocalDataset) -> Self {
        Self::new(SourceMode::Local, None, local)
    }
}

impl<R: ItemSource> DataAccessFacade<R> {
    pub fn new(mode: SourceMode, remote: Option<R>, local: LocalDataset) -> Self {
        Self {
            mode,
            remote,
            local,
            timeout: Duration::from_secs(8),
            cache_ttl: Duration::from_secs(300),
            cache: None,
            unswiped: None,
            decisions: CategorizationDispatcher::new(),
            mirror_enabled: false,
            mirror_pending: Vec::new(),
            origin: None,
            no_data_reported: false,
            notices: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// A zero TTL caches until the next explicit refresh.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_mirror(mut self, enabled: bool) -> Self {
        self.mirror_enabled = enabled;
        self
    }

    /// Override the mode chosen at construction. Drops the cache.
    pub fn set_mode(&mut self, mode: SourceMode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "source mode overridden");
            self.mode = mode;
            self.invalidate();
        }
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn origin(&self) -> Option<&DataOrigin> {
        self.origin.as_ref()
    }

    /// Drain pending notices for the host.
    pub fn take_notices(&mut self) -> Vec<DataNotice> {
        std::mem::take(&mut self.notices)
    }

    // ── Loading ──────────────────────────────────────────────────────

    fn cache_is_fresh(&self) -> bool {
        self.cache.as_ref().is_some_and(|c| {
            self.cache_ttl.is_zero() || c.fetched_at.elapsed() < self.cache_ttl
        })
    }

    fn invalidate(&mut self) {
        self.cache = None;
        self.unswiped = None;
    }

    async fn fetch_remote(&self) -> Option<Result<Vec<Item>, SourceError>> {
        if self.mode != SourceMode::Remote {
            return None;
        }
        let Some(remote) = &self.remote else {
            return Some(Err(SourceError::NotConfigured));
        };
        let result = match tokio::time::timeout(self.timeout, remote.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                millis: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };
        Some(result)
    }

    async fn load(&mut self) {
        let mut fallback_reason = None;
        match self.fetch_remote().await {
            Some(Ok(items)) => {
                self.store(items, DataOrigin::Remote);
                return;
            }
            Some(Err(e)) => {
                warn!(error = %e, "remote source unavailable; falling back to local dataset");
                fallback_reason = Some(e.to_string());
            }
            None => {}
        }

        match self.local.fetch().await {
            Ok(items) => {
                let origin = match fallback_reason {
                    Some(reason) => DataOrigin::Fallback { reason },
                    None => DataOrigin::Local,
                };
                self.store(items, origin);
            }
            Err(e) => {
                if !self.no_data_reported {
                    error!(error = %e, "local dataset unusable; no event data available");
                    self.notices.push(DataNotice::NoDataAvailable);
                    self.no_data_reported = true;
                }
                self.cache = Some(CachedItems {
                    items: Vec::new(),
                    fetched_at: Instant::now(),
                });
                self.unswiped = None;
                self.origin = Some(DataOrigin::Unavailable);
            }
        }
    }

    fn store(&mut self, items: Vec<Item>, origin: DataOrigin) {
        info!(count = items.len(), ?origin, "items loaded");
        self.decisions.sync_catalog(&items);
        self.cache = Some(CachedItems {
            items,
            fetched_at: Instant::now(),
        });
        self.unswiped = None;
        self.origin = Some(origin);
        self.no_data_reported = false;
    }

    async fn ensure_loaded(&mut self) -> &[Item] {
        if !self.cache_is_fresh() {
            self.load().await;
        }
        self.cache.as_ref().map_or(&[][..], |c| c.items.as_slice())
    }

    /// Every item from the preferred source, or the local dataset. Never
    /// fails; an empty list means no data is available at all.
    pub async fn fetch_all(&mut self) -> Vec<Item> {
        self.ensure_loaded().await.to_vec()
    }

    /// Drop the cache and reload.
    pub async fn refresh(&mut self) -> Vec<Item> {
        self.invalidate();
        self.fetch_all().await
    }

    // ── Derived queries ──────────────────────────────────────────────

    pub async fn by_id(&mut self, id: &str) -> Option<Item> {
        self.ensure_loaded().await.iter().find(|i| i.id == id).cloned()
    }

    pub async fn by_category(&mut self, category: Category) -> Vec<Item> {
        self.ensure_loaded()
            .await
            .iter()
            .filter(|i| i.category == category)
            .cloned()
            .collect()
    }

    /// Case-insensitive search across title, description, venue name,
    /// neighborhood and tags.
    pub async fn search(&mut self, query: &str) -> Vec<Item> {
        self.ensure_loaded()
            .await
            .iter()
            .filter(|i| i.matches_query(query))
            .cloned()
            .collect()
    }

    /// Items starting within the next `days` days, soonest first.
    pub async fn upcoming(&mut self, days: u32) -> Vec<Item> {
        self.upcoming_from(Utc::now(), days).await
    }

    pub async fn upcoming_from(&mut self, now: DateTime<Utc>, days: u32) -> Vec<Item> {
        let until = now + chrono::Duration::days(i64::from(days));
        let mut items: Vec<Item> = self
            .ensure_loaded()
            .await
            .iter()
            .filter(|i| i.starts_within(now, until))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.id.cmp(&b.id)));
        items
    }

    pub async fn query(&mut self, query: &ItemQuery) -> Vec<Item> {
        let items = self.ensure_loaded().await;
        query.apply(items)
    }

    /// Items without a decision, in source order.
    pub async fn unswiped(&mut self) -> Vec<Item> {
        self.ensure_loaded().await;
        let revision = self.decisions.revision();
        if let Some((cached_rev, items)) = &self.unswiped {
            if *cached_rev == revision {
                return items.clone();
            }
        }
        let items: Vec<Item> = self
            .cache
            .as_ref()
            .map(|c| {
                c.items
                    .iter()
                    .filter(|i| !self.decisions.has_decision(&i.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        self.unswiped = Some((revision, items.clone()));
        items
    }

    // ── Decisions (always local) ─────────────────────────────────────

    pub fn commit(&mut self, item_id: &str, direction: Direction) -> Option<DecisionCounts> {
        let counts = self.decisions.commit(item_id, direction)?;
        if self.mirror_enabled {
            if let Some(decision) = self.decisions.decision(item_id) {
                self.mirror_pending.retain(|d| d.item_id != item_id);
                self.mirror_pending.push(decision.clone());
            }
        }
        Some(counts)
    }

    /// Commit an item the host is holding, re-admitting it to the catalog
    /// if a reload dropped it.
    pub fn commit_item(&mut self, item: &Item, direction: Direction) -> Option<DecisionCounts> {
        self.decisions.admit(item);
        self.commit(&item.id, direction)
    }

    pub fn undo(&mut self, item_id: &str) -> Option<Decision> {
        let undone = self.decisions.undo(item_id)?;
        self.mirror_pending.retain(|d| d.item_id != item_id);
        Some(undone)
    }

    pub fn undo_last(&mut self) -> Option<Decision> {
        let undone = self.decisions.undo_last()?;
        self.mirror_pending.retain(|d| d.item_id != undone.item_id);
        Some(undone)
    }

    pub fn has_decision(&self, item_id: &str) -> bool {
        self.decisions.has_decision(item_id)
    }

    pub fn dispatcher(&self) -> &CategorizationDispatcher {
        &self.decisions
    }

    /// Re-apply persisted decisions. Loads items first so records can be
    /// matched against the catalog.
    pub async fn restore_decisions(&mut self, records: Vec<DecisionRecord>) -> usize {
        self.ensure_loaded().await;
        let applied = self.decisions.restore(records);
        debug!(applied, "decisions restored");
        applied
    }

    pub fn clear_decisions(&mut self) {
        self.decisions.clear();
        self.mirror_pending.clear();
    }

    pub fn pending_mirror(&self) -> usize {
        self.mirror_pending.len()
    }

    /// Push queued decisions to the remote. Failures stay queued and are
    /// only logged. Returns how many were delivered.
    pub async fn flush_mirror(&mut self) -> usize {
        let Some(remote) = &self.remote else {
            return 0;
        };
        let mut delivered = 0;
        let mut still_pending = Vec::new();
        for decision in std::mem::take(&mut self.mirror_pending) {
            match tokio::time::timeout(self.timeout, remote.mirror_decision(&decision)).await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(item_id = %decision.item_id, error = %e, "decision mirror failed");
                    still_pending.push(decision);
                }
                Err(_) => {
                    warn!(item_id = %decision.item_id, "decision mirror timed out");
                    still_pending.push(decision);
                }
            }
        }
        self.mirror_pending = still_pending;
        delivered
    }
}
