//! # Godo Core Library
//!
//! This library provides the swipe interaction and categorization engine for
//! the Godo event-discovery app. The user is shown one event card at a time
//! and files it by gesture: right onto the private calendar, up onto the
//! shared calendar, down into "maybe later", left into "not interested".
//! The `godo` CLI and any GUI host drive the same core.
//!
//! ## Architecture
//!
//! - **Gesture**: Pure threshold classifier plus a per-card ordering guard
//!   for out-of-order samples
//! - **Queue**: Ordered candidates with a wrap-around cursor
//! - **Dispatch**: The decision set and the collections derived from it
//! - **Source**: Remote and local item sources behind a facade that falls
//!   back silently to the local dataset
//! - **Session**: Owns everything above; one commit path, one advance per
//!   commit
//!
//! ## Key Components
//!
//! - [`SwipeSession`]: Entry point for hosts
//! - [`ThresholdClassifier`]: Gesture thresholds
//! - [`CategorizationDispatcher`]: Decisions, collections and counts
//! - [`DataAccessFacade`]: Item loading with fallback and caching
//! - [`Config`]: Application configuration management

pub mod direction;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod gesture;
pub mod item;
pub mod queue;
pub mod session;
pub mod source;
pub mod storage;

pub use direction::Direction;
pub use dispatch::{
    CalendarEntry, CalendarFilter, CalendarVisibility, CategorizationDispatcher, Decision,
    DecisionCounts, DecisionRecord, DecisionStore, SwipeStats,
};
pub use error::{ConfigError, CoreError, SourceError, ValidationError};
pub use events::Event;
pub use gesture::{
    GestureClassifier, GestureEnd, GestureSample, GestureTracker, Provisional, Release,
    ThresholdClassifier, Thresholds,
};
pub use item::{Category, Item, ItemSourceKind, PriceRange, Provenance, Venue};
pub use queue::CardQueue;
pub use session::{AdvanceTicket, CommittedSwipe, SwipeOutcome, SwipeSession};
pub use source::{
    DataAccessFacade, DataNotice, DataOrigin, ItemQuery, ItemSource, LocalDataset, RemoteSource,
    SortBy, SortOrder, SourceMode,
};
pub use storage::Config;
