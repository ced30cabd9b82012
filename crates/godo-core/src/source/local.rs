//! Local dataset, used in mock mode and as the remote fallback.

use std::path::PathBuf;

use super::{parse_items, ItemSource};
use crate::error::SourceError;
use crate::item::Item;

const BUNDLED_EVENTS: &str = include_str!("../../data/local_events.json");

#[derive(Debug, Clone)]
enum Backing {
    Bundled,
    File(PathBuf),
    Inline(Vec<Item>),
}

/// Items shipped with the app or supplied by the host.
#[derive(Debug, Clone)]
pub struct LocalDataset {
    backing: Backing,
}

impl LocalDataset {
    /// The dataset compiled into the library.
    pub fn bundled() -> Self {
        Self {
            backing: Backing::Bundled,
        }
    }

    /// A JSON file read on every fetch.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::File(path.into()),
        }
    }

    /// Items supplied in memory (for hosts and tests).
    pub fn from_items(items: Vec<Item>) -> Self {
        Self {
            backing: Backing::Inline(items),
        }
    }

    fn load(&self) -> Result<Vec<Item>, SourceError> {
        match &self.backing {
            Backing::Bundled => parse_items(BUNDLED_EVENTS, "local"),
            Backing::File(path) => {
                let content = std::fs::read_to_string(path)?;
                parse_items(&content, "local")
            }
            Backing::Inline(items) if items.is_empty() => Err(SourceError::Empty),
            Backing::Inline(items) => Ok(items.clone()),
        }
    }
}

impl Default for LocalDataset {
    fn default() -> Self {
        Self::bundled()
    }
}

impl ItemSource for LocalDataset {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        self.load()
    }
}
