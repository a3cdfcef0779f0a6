//! Next/previous index computation under the repeat policy
//!
//! Pure functions of `(len, current, repeat)`. An empty queue, or a missing
//! current index, always yields `None`.

use cadence_common::RepeatMode;

/// Index that follows `current`, or `None` at the end of the queue under `Off`
pub fn next_index(len: usize, current: Option<usize>, repeat: RepeatMode) -> Option<usize> {
    let current = current.filter(|&index| index < len)?;

    match repeat {
        RepeatMode::One => Some(current),
        _ if current + 1 < len => Some(current + 1),
        RepeatMode::All => Some(0),
        RepeatMode::Off => None,
    }
}

/// Index that precedes `current`, or `None` at the start of the queue under `Off`
pub fn previous_index(len: usize, current: Option<usize>, repeat: RepeatMode) -> Option<usize> {
    let current = current.filter(|&index| index < len)?;

    match repeat {
        RepeatMode::One => Some(current),
        _ if current > 0 => Some(current - 1),
        RepeatMode::All => Some(len - 1),
        RepeatMode::Off => None,
    }
}
