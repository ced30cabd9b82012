//! Item sources and the data access facade.
//!
//! Sources are stateless between calls. The facade owns selection,
//! caching, fallback and the local decision set.

mod facade;
mod local;
mod query;
mod remote;

pub use facade::{DataAccessFacade, DataNotice, DataOrigin, SourceMode};
pub use local::LocalDataset;
pub use query::{ItemQuery, SortBy, SortOrder, DEFAULT_RADIUS_KM, MAX_RADIUS_KM};
pub use remote::RemoteSource;

use std::collections::HashSet;
use std::future::Future;

use serde_json::Value;
use tracing::warn;

use crate::dispatch::Decision;
use crate::error::SourceError;
use crate::item::Item;

/// Something that can produce the full item list.
pub trait ItemSource: Send + Sync {
    /// Short identifier used in logs (e.g. "remote", "local").
    fn name(&self) -> &str;

    /// Fetch every item. Implementations return only valid items.
    fn fetch(&self) -> impl Future<Output = Result<Vec<Item>, SourceError>> + Send;

    /// Mirror a committed decision to the source's backend.
    fn mirror_decision(
        &self,
        _decision: &Decision,
    ) -> impl Future<Output = Result<(), SourceError>> + Send {
        async { Ok(()) } // default no-op
    }
}

/// Parse an item payload.
///
/// Accepts a bare JSON array of items, an array of feed entries shaped
/// `{"event": {...}, "recommendation_score": ...}`, or either of those
/// wrapped in `{"data": [...]}`. Entries that fail to parse or validate are
/// skipped; duplicate ids keep their first occurrence.
pub(crate) fn parse_items(payload: &str, source: &str) -> Result<Vec<Item>, SourceError> {
    let root: Value = serde_json::from_str(payload)?;
    let entries = match root {
        Value::Array(entries) => entries,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(SourceError::Malformed(
                    "expected an array of events".to_string(),
                ))
            }
        },
        _ => {
            return Err(SourceError::Malformed(
                "expected an array of events".to_string(),
            ))
        }
    };

    let total = entries.len();
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(total);
    for entry in entries {
        let entry = match entry {
            Value::Object(mut obj) if obj.get("event").is_some_and(Value::is_object) => {
                obj.remove("event").unwrap_or(Value::Null)
            }
            other => other,
        };
        match serde_json::from_value::<Item>(entry) {
            Ok(item) => match item.validate() {
                Ok(()) if seen.insert(item.id.clone()) => items.push(item),
                Ok(()) => warn!(source, item_id = %item.id, "skipping duplicate item"),
                Err(e) => warn!(source, item_id = %item.id, error = %e, "skipping invalid item"),
            },
            Err(e) => warn!(source, error = %e, "skipping unparseable item"),
        }
    }

    if items.is_empty() {
        return Err(if total == 0 {
            SourceError::Empty
        } else {
            SourceError::Malformed(format!("none of {total} entries were valid"))
        });
    }
    Ok(items)
}
