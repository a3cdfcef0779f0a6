//! Queue engine
//!
//! Owns the [`QueueState`] and is the only code that mutates it. Navigation
//! delegates to the pure functions in [`navigation`](super::navigation);
//! shuffle keeps the current entry current across every toggle.

use super::model::{QueueEntry, QueueState};
use super::navigation::{next_index, previous_index};
use crate::error::{Error, Result};
use cadence_common::{RepeatMode, Track};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;
use uuid::Uuid;

/// Result of a successful `remove_at`
#[derive(Debug, Clone)]
pub struct Removal {
    pub entry: QueueEntry,
    /// The removed entry was the current one
    pub current_changed: bool,
}

/// Queue edits and navigation
pub struct QueueEngine {
    state: QueueState,
    rng: StdRng,
}

impl QueueEngine {
    /// Create an empty queue with shuffle off and repeat off
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an empty queue with a deterministic shuffle order
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            state: QueueState::default(),
            rng,
        }
    }

    /// Apply initial shuffle/repeat preferences to an empty queue
    pub fn with_preferences(mut self, shuffle_enabled: bool, repeat_mode: RepeatMode) -> Self {
        self.state.shuffle_enabled = shuffle_enabled;
        self.state.repeat_mode = repeat_mode;
        self
    }

    pub fn state(&self) -> &QueueState {
        &self.state
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.state.current()
    }

    /// Replace the whole queue
    ///
    /// `start_index` selects a track from `tracks` (clamped to the last one).
    /// Under shuffle the effective order is a fresh permutation and the
    /// selected track's position in it becomes current. Does not start playback.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        let original: Vec<QueueEntry> = tracks.into_iter().map(QueueEntry::new).collect();
        let selected = original
            .get(start_index.min(original.len().saturating_sub(1)))
            .map(|entry| entry.entry_id);

        self.state.items = original.clone();
        if self.state.shuffle_enabled {
            self.state.items.shuffle(&mut self.rng);
        }
        self.state.original_order = original;
        self.state.current_index = self.relocate(selected);

        debug!(
            "Queue replaced: {} entries, current index {:?}, shuffle {}",
            self.state.items.len(),
            self.state.current_index,
            self.state.shuffle_enabled
        );
        self.state.debug_check_invariants();
    }

    /// Append a track to the end of the queue
    ///
    /// The current index is left alone, except that a track added to an empty
    /// queue becomes current (there is no "no current item" for a non-empty queue).
    pub fn add(&mut self, track: Track) -> Uuid {
        let entry = QueueEntry::new(track);
        let entry_id = entry.entry_id;

        self.state.original_order.push(entry.clone());
        self.state.items.push(entry);
        if self.state.current_index.is_none() {
            self.state.current_index = Some(0);
        }

        debug!("Added entry {} at position {}", entry_id, self.state.items.len() - 1);
        self.state.debug_check_invariants();
        entry_id
    }

    /// Remove the entry at `index` in the effective order
    ///
    /// Entries before the current one shift the current index down. Removing
    /// the current entry keeps the index, so the next entry slides in; if that
    /// runs off the end the index wraps to 0, or becomes `None` when empty.
    pub fn remove_at(&mut self, index: usize) -> Result<Removal> {
        let len = self.state.items.len();
        if len == 0 {
            return Err(Error::EmptyQueue);
        }
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }

        let entry = self.state.items.remove(index);
        self.state
            .original_order
            .retain(|original| original.entry_id != entry.entry_id);

        let current = self.state.current_index;
        let current_changed = current == Some(index);
        self.state.current_index = match current {
            Some(current) if index < current => Some(current - 1),
            Some(current) if current >= self.state.items.len() => {
                if self.state.items.is_empty() {
                    None
                } else {
                    Some(0)
                }
            }
            other => other,
        };

        debug!(
            "Removed entry {} at position {}, current index now {:?}",
            entry.entry_id, index, self.state.current_index
        );
        self.state.debug_check_invariants();
        Ok(Removal {
            entry,
            current_changed,
        })
    }

    /// Index `advance()` would move to, without moving
    pub fn peek_next(&self) -> Option<usize> {
        next_index(
            self.state.items.len(),
            self.state.current_index,
            self.state.repeat_mode,
        )
    }

    /// Index `retreat()` would move to, without moving
    pub fn peek_previous(&self) -> Option<usize> {
        previous_index(
            self.state.items.len(),
            self.state.current_index,
            self.state.repeat_mode,
        )
    }

    /// Move to the next entry; false at the end of the queue under `Off`
    pub fn advance(&mut self) -> bool {
        match self.peek_next() {
            Some(index) => {
                self.state.current_index = Some(index);
                true
            }
            None => false,
        }
    }

    /// Move to the previous entry; false at the start of the queue under `Off`
    pub fn retreat(&mut self) -> bool {
        match self.peek_previous() {
            Some(index) => {
                self.state.current_index = Some(index);
                true
            }
            None => false,
        }
    }

    /// Make the entry at `index` current
    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        let len = self.state.items.len();
        if len == 0 {
            return Err(Error::EmptyQueue);
        }
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        self.state.current_index = Some(index);
        Ok(())
    }

    /// Flip shuffle, keeping the current entry current
    pub fn toggle_shuffle(&mut self) {
        let current = self.state.current().map(|entry| entry.entry_id);
        self.state.shuffle_enabled = !self.state.shuffle_enabled;

        self.state.items = self.state.original_order.clone();
        if self.state.shuffle_enabled {
            self.state.items.shuffle(&mut self.rng);
        }
        self.state.current_index = self.relocate(current);

        debug!(
            "Shuffle {}: current index now {:?}",
            if self.state.shuffle_enabled { "enabled" } else { "disabled" },
            self.state.current_index
        );
        self.state.debug_check_invariants();
    }

    /// Set shuffle to `enabled`; returns whether anything changed
    pub fn set_shuffle(&mut self, enabled: bool) -> bool {
        if self.state.shuffle_enabled == enabled {
            return false;
        }
        self.toggle_shuffle();
        true
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.state.repeat_mode = mode;
    }

    pub fn clear(&mut self) {
        self.state.items.clear();
        self.state.original_order.clear();
        self.state.current_index = None;
    }

    /// Position of `entry_id` in the effective order, else the first entry
    fn relocate(&self, entry_id: Option<Uuid>) -> Option<usize> {
        entry_id
            .and_then(|id| self.state.position_of(id))
            .or(if self.state.items.is_empty() { None } else { Some(0) })
    }
}

impl Default for QueueEngine {
    fn default() -> Self {
        Self::new()
    }
}
