//! Queue model
//!
//! Pure data, no I/O. `QueueState` is owned and mutated only by
//! [`QueueEngine`](super::QueueEngine); everyone else sees it by shared
//! reference or through a [`QueueSnapshot`].

use cadence_common::{RepeatMode, Track};
use serde::Serialize;
use uuid::Uuid;

/// One slot in the queue
///
/// `entry_id` identifies the slot, not the track: the same track queued twice
/// gets two distinct entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    pub entry_id: Uuid,
    pub track: Track,
}

impl QueueEntry {
    pub fn new(track: Track) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            track,
        }
    }
}

/// Queue contents and navigation policy
///
/// `current_index` is `None` exactly when `items` is empty.
#[derive(Debug, Clone, Default)]
pub struct QueueState {
    /// Effective play order (shuffled or original)
    pub(crate) items: Vec<QueueEntry>,
    /// Reference order used to restore after un-shuffling
    pub(crate) original_order: Vec<QueueEntry>,
    pub(crate) current_index: Option<usize>,
    pub(crate) shuffle_enabled: bool,
    pub(crate) repeat_mode: RepeatMode,
}

impl QueueState {
    pub fn items(&self) -> &[QueueEntry] {
        &self.items
    }

    pub fn original_order(&self) -> &[QueueEntry] {
        &self.original_order
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current_index.and_then(|index| self.items.get(index))
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of an entry in the effective order
    pub fn position_of(&self, entry_id: Uuid) -> Option<usize> {
        self.items.iter().position(|entry| entry.entry_id == entry_id)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            items: self.items.clone(),
            current_index: self.current_index,
            shuffle_enabled: self.shuffle_enabled,
            repeat_mode: self.repeat_mode,
        }
    }

    pub(crate) fn debug_check_invariants(&self) {
        debug_assert_eq!(
            self.current_index.is_none(),
            self.items.is_empty(),
            "current index must be None exactly when the queue is empty"
        );
        debug_assert!(self.current_index.map_or(true, |index| index < self.items.len()));
        debug_assert_eq!(self.items.len(), self.original_order.len());
    }
}

/// Read-only copy of the queue handed to observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSnapshot {
    pub items: Vec<QueueEntry>,
    pub current_index: Option<usize>,
    pub shuffle_enabled: bool,
    pub repeat_mode: RepeatMode,
}

impl QueueSnapshot {
    pub fn current(&self) -> Option<&QueueEntry> {
        self.current_index.and_then(|index| self.items.get(index))
    }
}
