//! Unified calendar view over the two attending collections.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::CategorizationDispatcher;
use crate::direction::Direction;
use crate::item::Item;

/// One calendar row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEntry<'a> {
    pub item: &'a Item,
    pub direction: Direction,
    pub decided_at: DateTime<Utc>,
}

/// Which calendar(s) to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarVisibility {
    #[default]
    All,
    Private,
    Public,
}

impl CalendarVisibility {
    fn admits(&self, direction: Direction) -> bool {
        match self {
            CalendarVisibility::All => direction.is_attending(),
            CalendarVisibility::Private => direction == Direction::CommitPrivate,
            CalendarVisibility::Public => direction == Direction::CommitPublic,
        }
    }
}

/// Filters for [`CategorizationDispatcher::calendar_filtered`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarFilter {
    #[serde(default)]
    pub visibility: CalendarVisibility,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl CategorizationDispatcher {
    /// Private and public collections combined, sorted by item start time.
    pub fn calendar(&self) -> Vec<CalendarEntry<'_>> {
        self.calendar_filtered(&CalendarFilter::default())
    }

    pub fn calendar_filtered(&self, filter: &CalendarFilter) -> Vec<CalendarEntry<'_>> {
        let mut entries: Vec<CalendarEntry<'_>> = [Direction::CommitPrivate, Direction::CommitPublic]
            .into_iter()
            .filter(|d| filter.visibility.admits(*d))
            .flat_map(|direction| {
                self.index[direction.index()]
                    .iter()
                    .filter_map(move |((decided_at, _), id)| {
                        self.catalog.get(id).map(|item| CalendarEntry {
                            item,
                            direction,
                            decided_at: *decided_at,
                        })
                    })
            })
            .filter(|e| filter.from.map_or(true, |from| e.item.starts_at >= from))
            .filter(|e| filter.to.map_or(true, |to| e.item.starts_at <= to))
            .collect();

        entries.sort_by(|a, b| {
            a.item
                .starts_at
                .cmp(&b.item.starts_at)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });

        let limit = filter.limit.unwrap_or(usize::MAX);
        entries.into_iter().skip(filter.offset).take(limit).collect()
    }

    /// Calendar entries grouped by the start date in `offset`.
    pub fn calendar_by_day(&self, offset: FixedOffset) -> BTreeMap<NaiveDate, Vec<CalendarEntry<'_>>> {
        let mut days: BTreeMap<NaiveDate, Vec<CalendarEntry<'_>>> = BTreeMap::new();
        for entry in self.calendar() {
            let day = entry.item.starts_at.with_timezone(&offset).date_naive();
            days.entry(day).or_default().push(entry);
        }
        days
    }
}
