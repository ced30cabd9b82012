pub mod calendar;
pub mod config;
pub mod deck;
pub mod decisions;
pub mod events;

use std::path::PathBuf;

use chrono::Local;
use godo_core::storage::data_dir;
use godo_core::{Config, DecisionStore, Item, SwipeSession};
use serde::{Deserialize, Serialize};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Deck position kept between runs.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DeckState {
    #[serde(default)]
    cursor: usize,
}

/// A loaded session plus the files it is persisted to.
pub struct Workspace {
    pub session: SwipeSession,
    store: DecisionStore,
    deck_path: PathBuf,
}

impl Workspace {
    /// Load config, items, saved decisions and the deck cursor.
    pub async fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let dir = data_dir()?;
        let store = DecisionStore::new_with_path(dir.join("decisions.json"));
        let deck_path = dir.join("deck.json");

        let mut session = SwipeSession::from_config(&config)?;
        session.restore(store.load()?).await;

        let deck: DeckState = match std::fs::read_to_string(&deck_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => DeckState::default(),
        };
        session.seek(deck.cursor);
        session.drain_events();

        Ok(Self {
            session,
            store,
            deck_path,
        })
    }

    /// Write decisions and cursor back, and push pending mirrors.
    pub async fn save(&mut self) -> CliResult {
        self.store
            .persist(&self.session.facade().dispatcher().records())?;
        let deck = DeckState {
            cursor: self.session.queue().cursor(),
        };
        std::fs::write(&self.deck_path, serde_json::to_string_pretty(&deck)?)?;
        if self.session.facade().pending_mirror() > 0 {
            self.session.facade_mut().flush_mirror().await;
        }
        Ok(())
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line summary of an item.
pub fn item_line(item: &Item) -> String {
    let starts = item.starts_at.with_timezone(&Local).format("%a %b %e %H:%M");
    let mut line = format!(
        "{}  {}  {}  @ {}  [{}]  {}",
        item.id, item.title, starts, item.venue.name, item.category, item.price
    );
    if item.is_full() {
        line.push_str("  (full)");
    }
    line
}

pub fn print_items(items: &[Item], json: bool) -> CliResult {
    if json {
        return print_json(items);
    }
    if items.is_empty() {
        println!("No events found.");
    }
    for item in items {
        println!("{}", item_line(item));
    }
    Ok(())
}
