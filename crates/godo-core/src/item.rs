//! Event candidate types.
//!
//! Field names follow the wire shape of the events API, so an [`Item`]
//! deserializes directly from a remote payload or the local dataset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Event category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Networking,
    Culture,
    Fitness,
    Food,
    Nightlife,
    Outdoor,
    Professional,
    #[serde(other)]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Networking,
        Category::Culture,
        Category::Fitness,
        Category::Food,
        Category::Nightlife,
        Category::Outdoor,
        Category::Professional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Networking => "networking",
            Self::Culture => "culture",
            Self::Fitness => "fitness",
            Self::Food => "food",
            Self::Nightlife => "nightlife",
            Self::Outdoor => "outdoor",
            Self::Professional => "professional",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {s}"))
    }
}

/// Data source that produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSourceKind {
    Eventbrite,
    Meetup,
    NycParks,
    NycOpenData,
    NycCultural,
    Ticketmaster,
    UserGenerated,
    Manual,
    /// Bundled local dataset.
    Local,
    #[serde(other)]
    Other,
}

impl ItemSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eventbrite => "eventbrite",
            Self::Meetup => "meetup",
            Self::NycParks => "nyc_parks",
            Self::NycOpenData => "nyc_open_data",
            Self::NycCultural => "nyc_cultural",
            Self::Ticketmaster => "ticketmaster",
            Self::UserGenerated => "user_generated",
            Self::Manual => "manual",
            Self::Local => "local",
            Self::Other => "other",
        }
    }
}

/// Where the event happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(rename = "location_name")]
    pub name: String,
    #[serde(rename = "location_address", default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub neighborhood: Option<String>,
}

const EARTH_RADIUS_KM: f64 = 6371.0;

impl Venue {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    /// Great-circle distance to a point, or `None` without coordinates.
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> Option<f64> {
        let (lat, lon) = self.coordinates()?;
        let (phi1, phi2) = (lat.to_radians(), latitude.to_radians());
        let d_phi = (latitude - lat).to_radians();
        let d_lambda = (longitude - lon).to_radians();
        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        Some(2.0 * EARTH_RADIUS_KM * a.sqrt().asin())
    }
}

/// Ticket price bounds, in whole dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(rename = "price_min", default)]
    pub min: u32,
    #[serde(rename = "price_max", default)]
    pub max: Option<u32>,
}

impl PriceRange {
    pub fn is_free(&self) -> bool {
        self.min == 0 && self.max.map_or(true, |max| max == 0)
    }

    /// Upper bound used for sorting and filtering.
    pub fn ceiling(&self) -> u32 {
        self.max.unwrap_or(self.min)
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            return f.write_str("Free");
        }
        match self.max {
            Some(max) if max != self.min => write!(f, "${}-${}", self.min, max),
            _ => write!(f, "${}", self.min),
        }
    }
}

/// Which source produced the item and when it last changed there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: ItemSourceKind,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// An event candidate flowing through the card queue.
///
/// Items are never mutated after they are fetched; a refresh replaces the
/// whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "date_time")]
    pub starts_at: DateTime<Utc>,
    #[serde(rename = "end_time", default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub venue: Venue,
    pub category: Category,
    #[serde(flatten)]
    pub price: PriceRange,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub current_attendees: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(flatten)]
    pub provenance: Provenance,
}

impl Item {
    /// Check the field constraints the events API enforces.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::invalid("id", "must not be empty"));
        }
        let title_len = self.title.trim().chars().count();
        if title_len == 0 || title_len > 255 {
            return Err(ValidationError::invalid("title", "must be 1-255 characters"));
        }
        if let Some(end) = self.ends_at {
            if end <= self.starts_at {
                return Err(ValidationError::InvalidTimeRange {
                    start: self.starts_at,
                    end,
                });
            }
        }
        if let Some(max) = self.price.max {
            if max < self.price.min {
                return Err(ValidationError::invalid(
                    "price_max",
                    "must be greater than or equal to price_min",
                ));
            }
        }
        if self.capacity == Some(0) {
            return Err(ValidationError::invalid("capacity", "must be positive"));
        }
        if let Some(lat) = self.venue.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ValidationError::invalid("latitude", "must be within -90..=90"));
            }
        }
        if let Some(lng) = self.venue.longitude {
            if !(-180.0..=180.0).contains(&lng) {
                return Err(ValidationError::invalid("longitude", "must be within -180..=180"));
            }
        }
        Ok(())
    }

    /// Remaining capacity, if the event has a cap.
    pub fn spots_left(&self) -> Option<u32> {
        self.capacity
            .map(|cap| cap.saturating_sub(self.current_attendees))
    }

    pub fn is_full(&self) -> bool {
        self.spots_left() == Some(0)
    }

    pub fn is_free(&self) -> bool {
        self.price.is_free()
    }

    /// Attendance ratio in 0.0..=1.0, used as a popularity signal.
    pub fn fill_ratio(&self) -> f64 {
        match self.capacity {
            Some(cap) if cap > 0 => (self.current_attendees as f64 / cap as f64).min(1.0),
            _ => 0.0,
        }
    }

    /// Case-insensitive match over title, description, venue name,
    /// neighborhood and tags. An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let contains = |s: &str| s.to_lowercase().contains(&needle);
        contains(&self.title)
            || self.description.as_deref().is_some_and(contains)
            || contains(&self.venue.name)
            || self.venue.neighborhood.as_deref().is_some_and(contains)
            || self.tags.iter().any(|t| contains(t))
    }

    /// Whether the start time falls inside `[from, to]`.
    pub fn starts_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.starts_at >= from && self.starts_at <= to
    }
}
