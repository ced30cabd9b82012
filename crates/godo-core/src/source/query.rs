//! In-memory event search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

use crate::error::ValidationError;
use crate::item::{Category, Item};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;
pub const DEFAULT_RADIUS_KM: f64 = 10.0;
pub const MAX_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    StartTime,
    Price,
    /// Attendance relative to capacity.
    Popularity,
    /// Distance from [`ItemQuery::near`]. Items without coordinates sort last.
    Distance,
    /// Last time the source touched the record.
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Search parameters. Unset fields do not filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemQuery {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// Only events whose minimum price is at least this.
    #[serde(default)]
    pub price_min: Option<u32>,
    /// Only events whose minimum price is at most this.
    #[serde(default)]
    pub price_max: Option<u32>,
    #[serde(default)]
    pub featured_only: bool,
    /// Reference point as `(latitude, longitude)`.
    #[serde(default)]
    pub near: Option<(f64, f64)>,
    /// Only events within this many km of `near`. Ignored without `near`.
    #[serde(default)]
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Page size, clamped to 1..=100.
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: None,
            neighborhood: None,
            from: None,
            to: None,
            price_min: None,
            price_max: None,
            featured_only: false,
            near: None,
            radius_km: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl ItemQuery {
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            text: Some(query.into()),
            ..Self::default()
        }
    }

    /// Events within `radius_km` of a point, nearest first.
    pub fn near(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            near: Some((latitude, longitude)),
            radius_km: Some(radius_km),
            sort_by: SortBy::Distance,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some((lat, lon)) = self.near {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ValidationError::invalid("latitude", "must be within -90..=90"));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ValidationError::invalid("longitude", "must be within -180..=180"));
            }
        }
        if let Some(radius) = self.radius_km {
            if !(radius > 0.0 && radius <= MAX_RADIUS_KM) {
                return Err(ValidationError::invalid(
                    "radius_km",
                    format!("must be greater than 0 and at most {MAX_RADIUS_KM}"),
                ));
            }
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if to < from {
                return Err(ValidationError::InvalidTimeRange { start: from, end: to });
            }
        }
        Ok(())
    }

    fn distance(&self, item: &Item) -> Option<f64> {
        let (lat, lon) = self.near?;
        item.venue.distance_km(lat, lon)
    }

    pub fn matches(&self, item: &Item) -> bool {
        if let Some(text) = &self.text {
            if !item.matches_query(text) {
                return false;
            }
        }
        if self.category.is_some_and(|c| c != item.category) {
            return false;
        }
        if let Some(hood) = &self.neighborhood {
            let matches_hood = item
                .venue
                .neighborhood
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(hood.trim()));
            if !matches_hood {
                return false;
            }
        }
        if self.from.is_some_and(|from| item.starts_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| item.starts_at > to) {
            return false;
        }
        if self.price_min.is_some_and(|min| item.price.min < min) {
            return false;
        }
        if self.price_max.is_some_and(|max| item.price.min > max) {
            return false;
        }
        if self.featured_only && !item.is_featured {
            return false;
        }
        if let (Some(_), Some(radius)) = (self.near, self.radius_km) {
            if !self.distance(item).is_some_and(|km| km <= radius) {
                return false;
            }
        }
        true
    }

    /// Filter, sort and page `items`.
    pub fn apply(&self, items: &[Item]) -> Vec<Item> {
        let mut hits: Vec<&Item> = items.iter().filter(|i| self.matches(i)).collect();
        hits.sort_by(|a, b| {
            let ord = match self.sort_by {
                SortBy::StartTime => a.starts_at.cmp(&b.starts_at),
                SortBy::Price => a.price.min.cmp(&b.price.min),
                SortBy::Popularity => a.fill_ratio().total_cmp(&b.fill_ratio()),
                SortBy::UpdatedAt => a.provenance.updated_at.cmp(&b.provenance.updated_at),
                SortBy::Distance => {
                    // Unplaced items stay last in either order.
                    return match (self.distance(a), self.distance(b)) {
                        (Some(x), Some(y)) => self.directed(x.total_cmp(&y)),
                        (Some(_), None) => Ordering::Less,
                        (None, Some(_)) => Ordering::Greater,
                        (None, None) => Ordering::Equal,
                    }
                    .then_with(|| a.starts_at.cmp(&b.starts_at))
                    .then_with(|| a.id.cmp(&b.id));
                }
            };
            let ord = self.directed(ord);
            ord.then_with(|| a.starts_at.cmp(&b.starts_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.into_iter()
            .skip(self.offset)
            .take(self.limit.clamp(1, MAX_LIMIT))
            .cloned()
            .collect()
    }

    fn directed(&self, ord: Ordering) -> Ordering {
        match self.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::fixtures::{base_time, item};
    use crate::item::PriceRange;
    use chrono::Duration;

    fn catalog() -> Vec<Item> {
        let mut a = item("a", 3);
        a.category = Category::Food;
        a.price = PriceRange { min: 40, max: Some(60) };
        a.current_attendees = 90;
        let mut b = item("b", 1);
        b.price = PriceRange { min: 0, max: None };
        b.current_attendees = 10;
        b.is_featured = true;
        let mut c = item("c", 2);
        c.venue.neighborhood = Some("Astoria".into());
        c.current_attendees = 50;
        vec![a, b, c]
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn default_query_sorts_by_start_time() {
        assert_eq!(ids(&ItemQuery::default().apply(&catalog())), vec!["b", "c", "a"]);
    }

    #[test]
    fn filters_combine() {
        let q = ItemQuery {
            category: Some(Category::Culture),
            price_max: Some(10),
            ..ItemQuery::default()
        };
        assert_eq!(ids(&q.apply(&catalog())), vec!["b"]);

        let q = ItemQuery {
            neighborhood: Some("astoria".into()),
            ..ItemQuery::default()
        };
        assert_eq!(ids(&q.apply(&catalog())), vec!["c"]);

        let q = ItemQuery {
            featured_only: true,
            ..ItemQuery::default()
        };
        assert_eq!(ids(&q.apply(&catalog())), vec!["b"]);
    }

    #[test]
    fn date_window() {
        let q = ItemQuery {
            from: Some(base_time() + Duration::minutes(90)),
            to: Some(base_time() + Duration::hours(2)),
            ..ItemQuery::default()
        };
        assert_eq!(ids(&q.apply(&catalog())), vec!["c"]);
    }

    #[test]
    fn sort_by_popularity_desc() {
        let q = ItemQuery {
            sort_by: SortBy::Popularity,
            sort_order: SortOrder::Desc,
            ..ItemQuery::default()
        };
        assert_eq!(ids(&q.apply(&catalog())), vec!["a", "c", "b"]);
    }

    /// Moves an item's venue roughly `km` north of the Brooklyn Museum.
    fn shift_north(item: &mut Item, km: f64) {
        item.venue.latitude = Some(40.6712 + km / 111.2);
    }

    #[test]
    fn radius_keeps_nearby_placed_items() {
        let mut items = catalog();
        shift_north(&mut items[0], 30.0);
        shift_north(&mut items[1], 4.0);
        items[2].venue.latitude = None;

        let q = ItemQuery::near(40.6712, -73.9636, 10.0);
        assert_eq!(ids(&q.apply(&items)), vec!["b"]);

        let q = ItemQuery::near(40.6712, -73.9636, 50.0);
        assert_eq!(ids(&q.apply(&items)), vec!["b", "a"]);
    }

    #[test]
    fn distance_sort_puts_unplaced_items_last() {
        let mut items = catalog();
        shift_north(&mut items[0], 2.0);
        shift_north(&mut items[1], 6.0);
        items[2].venue.longitude = None;

        let mut q = ItemQuery {
            near: Some((40.6712, -73.9636)),
            sort_by: SortBy::Distance,
            ..ItemQuery::default()
        };
        assert_eq!(ids(&q.apply(&items)), vec!["a", "b", "c"]);
        q.sort_order = SortOrder::Desc;
        assert_eq!(ids(&q.apply(&items)), vec!["b", "a", "c"]);
    }

    #[test]
    fn sort_by_updated_at() {
        let mut items = catalog();
        items[0].provenance.updated_at = base_time() - Duration::days(2);
        items[2].provenance.updated_at = base_time() + Duration::days(1);
        let q = ItemQuery {
            sort_by: SortBy::UpdatedAt,
            sort_order: SortOrder::Desc,
            ..ItemQuery::default()
        };
        assert_eq!(ids(&q.apply(&items)), vec!["c", "b", "a"]);
    }

    #[test]
    fn validate_rejects_out_of_range_geo() {
        assert!(ItemQuery::near(40.7, -73.9, 10.0).validate().is_ok());
        assert!(ItemQuery::near(91.0, 0.0, 10.0).validate().is_err());
        assert!(ItemQuery::near(0.0, -181.0, 10.0).validate().is_err());
        assert!(ItemQuery::near(40.7, -73.9, 0.0).validate().is_err());
        assert!(ItemQuery::near(40.7, -73.9, 50.5).validate().is_err());
    }

    #[test]
    fn paging_clamps_limit() {
        let q = ItemQuery {
            limit: 0,
            offset: 1,
            ..ItemQuery::default()
        };
        assert_eq!(ids(&q.apply(&catalog())), vec!["c"]);
    }
}
