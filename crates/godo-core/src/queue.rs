//! Card queue.
//!
//! Holds the ordered candidates and a cursor that wraps modulo the list
//! length. Reads never mutate; the cursor moves only through `advance`,
//! which is crate-private and reached solely from the session's commit
//! path (see [`crate::session::AdvanceTicket`]).

use crate::dispatch::CategorizationDispatcher;
use crate::item::Item;

#[derive(Debug, Clone, Default)]
pub struct CardQueue {
    items: Vec<Item>,
    cursor: usize,
    /// Bumped on every reload so tickets issued for an older list expire.
    generation: u64,
}

impl CardQueue {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            cursor: 0,
            generation: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn current(&self) -> Option<&Item> {
        self.items.get(self.cursor)
    }

    pub fn next(&self) -> Option<&Item> {
        if self.items.is_empty() {
            return None;
        }
        self.items.get((self.cursor + 1) % self.items.len())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub(crate) fn advance(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.items.len();
    }

    /// Replace the backing list and rewind to the first card.
    pub fn reload(&mut self, items: Vec<Item>) {
        self.items = items;
        self.cursor = 0;
        self.generation += 1;
    }

    /// Reload with only the items that carry no decision yet.
    pub fn reload_undecided(&mut self, items: Vec<Item>, decisions: &CategorizationDispatcher) {
        let undecided = items
            .into_iter()
            .filter(|item| !decisions.has_decision(&item.id))
            .collect();
        self.reload(undecided);
    }

    /// Restore a cursor position, e.g. from a previous run. Out-of-range
    /// positions wrap.
    pub fn seek(&mut self, cursor: usize) {
        self.cursor = if self.items.is_empty() {
            0
        } else {
            cursor % self.items.len()
        };
    }
}
