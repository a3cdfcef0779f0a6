//! Player adapter state machine tests
//!
//! Drive a `PlayerAdapter` over the mock engine and check the observable
//! status, queue position and published messages after each step.

mod helpers;

use cadence_common::config::PlaybackDefaults;
use cadence_common::{EngineErrorKind, ErrorDescriptor, PlaybackStatus, RepeatMode, TrackId};
use cadence_player::playback::{EngineCallback, EngineEvent};
use cadence_player::queue::QueueEngine;
use cadence_player::Error;
use helpers::{track, tracks, EngineCall, FailingResolver, Harness};
use std::sync::Arc;

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_set_queue_prepares_selected_track() {
    let mut h = Harness::new();
    h.adapter.set_queue(tracks(&["a", "b", "c"]), 1);

    assert_eq!(h.status(), PlaybackStatus::Preparing);
    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(h.probe.prepare_count(), 1);
    assert_eq!(h.probe.count(&EngineCall::Play), 0);

    h.ready();
    assert_eq!(h.status(), PlaybackStatus::Ready);
    assert!(!h.adapter.state().is_playing());
}

#[test]
fn test_load_failure_keeps_queue_index_and_skip_recovers() {
    let mut h = Harness::with_resolver(Arc::new(FailingResolver::new(&["b"])));
    h.adapter.set_queue(tracks(&["a", "b", "c"]), 1);

    assert_eq!(h.status(), PlaybackStatus::Error);
    assert_eq!(h.adapter.queue().current_index(), Some(1));
    assert_eq!(h.current_id().as_deref(), Some("b"));
    let error = h.adapter.state().last_error.clone().unwrap();
    assert_eq!(error.kind, EngineErrorKind::Permission);
    assert_eq!(h.probe.prepare_count(), 0);

    assert!(h.adapter.skip_next());
    assert_eq!(h.status(), PlaybackStatus::Preparing);
    assert_eq!(h.current_id().as_deref(), Some("c"));
    assert!(h.adapter.state().last_error.is_none());
}

#[test]
fn test_load_failure_while_playing_stops_engine() {
    let mut h = Harness::with_resolver(Arc::new(FailingResolver::new(&["b"])));
    h.adapter.set_queue(tracks(&["a", "b"]), 0);
    h.ready();
    assert!(h.adapter.play());
    let before = h.probe.calls().len();

    assert!(h.adapter.skip_next());
    assert_eq!(h.status(), PlaybackStatus::Error);
    assert_eq!(h.current_id().as_deref(), Some("b"));
    assert_eq!(h.probe.calls()[before..], [EngineCall::Stop]);
}

#[test]
fn test_auto_advance_into_unresolvable_track_stops_engine() {
    let mut h = Harness::with_resolver(Arc::new(FailingResolver::new(&["b"])));
    h.adapter.set_queue(tracks(&["a", "b", "c"]), 0);
    h.ready();
    assert!(h.adapter.play());

    h.engine(EngineEvent::Ended);
    assert_eq!(h.status(), PlaybackStatus::Error);
    assert_eq!(h.probe.calls().last(), Some(&EngineCall::Stop));

    // Skipping past the failed entry resumes playback
    assert!(h.adapter.skip_next());
    h.ready();
    assert_eq!(h.current_id().as_deref(), Some("c"));
    assert_eq!(h.status(), PlaybackStatus::Playing);
}

#[test]
fn test_engine_error_during_prepare_then_retry() {
    let mut h = Harness::new();
    h.adapter.set_queue(tracks(&["a"]), 0);
    let first_generation = h.adapter.generation();

    h.engine(EngineEvent::Error(ErrorDescriptor::new(
        EngineErrorKind::Codec,
        "unsupported format",
    )));
    assert_eq!(h.status(), PlaybackStatus::Error);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(
        h.observer.last().unwrap().error_message,
        "codec error: unsupported format"
    );

    assert!(h.adapter.play());
    assert_eq!(h.status(), PlaybackStatus::Preparing);
    assert!(h.adapter.generation() > first_generation);

    h.ready();
    assert_eq!(h.status(), PlaybackStatus::Playing);
}

#[test]
fn test_skip_from_error_at_end_without_repeat_is_rejected() {
    let mut h = Harness::with_resolver(Arc::new(FailingResolver::new(&["b"])));
    h.adapter.set_queue(tracks(&["a", "b"]), 1);
    assert_eq!(h.status(), PlaybackStatus::Error);

    assert!(!h.adapter.skip_next());
    assert_eq!(h.status(), PlaybackStatus::Error);

    assert!(h.adapter.skip_previous());
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.status(), PlaybackStatus::Preparing);
}

// ============================================================================
// Transport
// ============================================================================

#[test]
fn test_play_pause_cycle() {
    let mut h = Harness::playing(&["a"]);
    assert!(!h.adapter.play());

    h.probe.set_position(12_000);
    assert!(h.adapter.pause());
    assert_eq!(h.status(), PlaybackStatus::Paused);
    assert_eq!(h.adapter.state().position_ms, 12_000);
    assert!(!h.adapter.pause());

    assert!(h.adapter.play());
    assert_eq!(h.status(), PlaybackStatus::Playing);
    assert_eq!(h.probe.count(&EngineCall::Play), 2);
}

#[test]
fn test_pause_while_preparing_cancels_autoplay() {
    let mut h = Harness::new();
    h.adapter.set_queue(tracks(&["a"]), 0);
    assert!(h.adapter.play());
    assert!(h.adapter.pause());

    h.ready();
    assert_eq!(h.status(), PlaybackStatus::Ready);
    assert_eq!(h.probe.count(&EngineCall::Play), 0);
}

#[test]
fn test_seek_in_idle_is_noop() {
    let mut h = Harness::new();
    assert!(!h.adapter.seek(5_000));
    assert_eq!(h.status(), PlaybackStatus::Idle);
    assert_eq!(h.adapter.state().position_ms, 0);
    assert!(h.probe.calls().iter().all(|c| !matches!(c, EngineCall::Seek(_))));
}

#[test]
fn test_seek_is_clamped_to_duration() {
    let mut h = Harness::playing(&["a"]);
    assert!(h.adapter.seek(999_999));
    assert_eq!(h.adapter.state().position_ms, 180_000);
    assert_eq!(h.probe.count(&EngineCall::Seek(180_000)), 1);
}

#[test]
fn test_stop_keeps_queue_and_goes_idle() {
    let mut h = Harness::playing(&["a", "b"]);
    h.adapter.stop();

    assert_eq!(h.status(), PlaybackStatus::Idle);
    assert_eq!(h.adapter.queue().len(), 2);
    assert_eq!(h.adapter.state().position_ms, 0);

    assert!(h.adapter.play());
    assert_eq!(h.status(), PlaybackStatus::Preparing);
    assert_eq!(h.current_id().as_deref(), Some("a"));
}

#[test]
fn test_set_speed_validation() {
    let mut h = Harness::playing(&["a"]);
    assert!(matches!(
        h.adapter.set_speed(0.0),
        Err(Error::InvalidInput(_))
    ));
    assert!(h.adapter.set_speed(f32::NAN).is_err());
    assert_eq!(h.adapter.state().playback_speed, 1.0);

    h.adapter.set_speed(1.5).unwrap();
    assert_eq!(h.adapter.state().playback_speed, 1.5);
    assert_eq!(h.observer.last().unwrap().playback_speed, 1.5);
    assert_eq!(h.probe.count(&EngineCall::SetSpeed(1.5)), 1);
}

#[test]
fn test_shuffle_and_repeat_are_mirrored_into_state() {
    let mut h = Harness::playing(&["a", "b", "c", "d"]);

    h.adapter.set_shuffle(true);
    assert!(h.adapter.state().shuffle_enabled);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.adapter.queue().current().unwrap().track.id, TrackId::new("a"));
    assert_eq!(h.status(), PlaybackStatus::Playing);

    assert!(!h.adapter.toggle_shuffle());
    assert!(!h.observer.last().unwrap().shuffle_enabled);

    h.adapter.set_repeat_mode(RepeatMode::All);
    assert_eq!(h.adapter.state().repeat_mode, RepeatMode::All);
    assert_eq!(h.adapter.queue().repeat_mode(), RepeatMode::All);
}

#[test]
fn test_defaults_seed_initial_state() {
    let defaults = PlaybackDefaults {
        shuffle: true,
        repeat_mode: RepeatMode::One,
        speed: 1.25,
        position_interval_ms: 500,
    };
    let queue = QueueEngine::with_seed(7).with_preferences(true, RepeatMode::One);
    let h = Harness::build(
        Arc::new(cadence_player::collaborators::RootFolderResolver::new("/music")),
        queue,
        &defaults,
    );

    let state = h.adapter.state();
    assert!(state.shuffle_enabled);
    assert_eq!(state.repeat_mode, RepeatMode::One);
    assert_eq!(state.playback_speed, 1.25);
}

// ============================================================================
// Track completion
// ============================================================================

#[test]
fn test_track_finished_auto_advances_and_keeps_playing() {
    let mut h = Harness::playing(&["a", "b"]);

    h.engine(EngineEvent::Ended);
    assert_eq!(h.status(), PlaybackStatus::Preparing);
    assert_eq!(h.adapter.queue().current_index(), Some(1));
    assert_eq!(h.current_id().as_deref(), Some("b"));

    h.ready();
    assert_eq!(h.status(), PlaybackStatus::Playing);
}

#[test]
fn test_track_finished_at_end_of_queue_ends() {
    let mut h = Harness::playing(&["a"]);

    h.engine(EngineEvent::Ended);
    assert_eq!(h.status(), PlaybackStatus::Ended);
    assert_eq!(h.adapter.state().position_ms, 180_000);

    let message = h.observer.last().unwrap();
    assert!(!message.is_playing);
    assert_eq!(message.media_id, "a");
    assert_eq!(message.progress, 1.0);

    // Play from ENDED replays the last track
    assert!(h.adapter.play());
    assert_eq!(h.status(), PlaybackStatus::Preparing);
    assert_eq!(h.current_id().as_deref(), Some("a"));
}

#[test]
fn test_track_finished_under_repeat_all_wraps() {
    let mut h = Harness::playing(&["a", "b"]);
    h.adapter.set_repeat_mode(RepeatMode::All);
    assert!(h.adapter.skip_next());
    h.ready();

    h.engine(EngineEvent::Ended);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.status(), PlaybackStatus::Preparing);
}

#[test]
fn test_track_finished_under_repeat_one_replays() {
    let mut h = Harness::playing(&["a", "b"]);
    h.adapter.set_repeat_mode(RepeatMode::One);
    let prepares = h.probe.prepare_count();

    h.engine(EngineEvent::Ended);
    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.adapter.queue().current_index(), Some(0));
    assert_eq!(h.probe.prepare_count(), prepares + 1);
}

#[test]
fn test_ended_ignored_unless_playing() {
    let mut h = Harness::new();
    h.adapter.set_queue(tracks(&["a", "b"]), 0);
    h.ready();

    h.engine(EngineEvent::Ended);
    assert_eq!(h.status(), PlaybackStatus::Ready);
    assert_eq!(h.adapter.queue().current_index(), Some(0));
}

// ============================================================================
// Engine callbacks
// ============================================================================

#[test]
fn test_stale_callbacks_are_ignored() {
    let mut h = Harness::new();
    h.adapter.set_queue(tracks(&["a", "b"]), 0);
    let stale = h.adapter.generation();
    assert!(h.adapter.skip_next());

    h.adapter.handle_engine_event(EngineCallback {
        generation: stale,
        event: EngineEvent::Ready { duration_ms: 1 },
    });
    assert_eq!(h.status(), PlaybackStatus::Preparing);

    h.adapter.handle_engine_event(EngineCallback {
        generation: stale,
        event: EngineEvent::Error(ErrorDescriptor::new(EngineErrorKind::Io, "gone")),
    });
    assert_eq!(h.status(), PlaybackStatus::Preparing);
    assert!(h.adapter.state().last_error.is_none());
}

#[test]
fn test_buffering_and_position_updates() {
    let mut h = Harness::playing(&["a"]);

    h.engine(EngineEvent::Buffering {
        buffered_position_ms: 60_000,
    });
    h.engine(EngineEvent::Position { position_ms: 30_000 });

    let message = h.observer.last().unwrap();
    assert_eq!(message.buffered_position_ms, 60_000);
    assert_eq!(message.position_ms, 30_000);
    assert!((message.progress - 30_000.0 / 180_000.0).abs() < 1e-6);
}

#[test]
fn test_tick_only_updates_while_playing() {
    let mut h = Harness::playing(&["a"]);
    h.probe.set_position(4_000);
    h.adapter.tick();
    assert_eq!(h.adapter.state().position_ms, 4_000);

    h.adapter.pause();
    h.probe.set_position(9_000);
    h.adapter.tick();
    assert_eq!(h.adapter.state().position_ms, 4_000);
}

// ============================================================================
// Queue edits
// ============================================================================

#[test]
fn test_add_to_empty_queue_loads_track() {
    let mut h = Harness::new();
    h.adapter.add(track("a"));
    assert_eq!(h.status(), PlaybackStatus::Preparing);
    assert_eq!(h.current_id().as_deref(), Some("a"));

    h.adapter.add(track("b"));
    assert_eq!(h.probe.prepare_count(), 1);
    assert_eq!(h.adapter.queue().len(), 2);
}

#[test]
fn test_remove_current_while_playing_loads_successor() {
    let mut h = Harness::playing(&["a", "b", "c"]);
    h.adapter.jump_to(1).unwrap();
    h.ready();
    assert_eq!(h.status(), PlaybackStatus::Playing);

    h.adapter.remove_at(1).unwrap();
    assert_eq!(h.current_id().as_deref(), Some("c"));
    assert_eq!(h.status(), PlaybackStatus::Preparing);

    h.ready();
    assert_eq!(h.status(), PlaybackStatus::Playing);
}

#[test]
fn test_remove_other_entry_keeps_playback() {
    let mut h = Harness::playing(&["a", "b", "c"]);
    let prepares = h.probe.prepare_count();

    h.adapter.remove_at(2).unwrap();
    assert_eq!(h.status(), PlaybackStatus::Playing);
    assert_eq!(h.probe.prepare_count(), prepares);

    assert!(matches!(
        h.adapter.remove_at(5),
        Err(Error::IndexOutOfRange { index: 5, len: 2 })
    ));
}

#[test]
fn test_remove_last_entry_goes_idle() {
    let mut h = Harness::playing(&["a"]);
    h.adapter.remove_at(0).unwrap();

    assert_eq!(h.status(), PlaybackStatus::Idle);
    assert!(h.adapter.state().current_track.is_none());
    assert_eq!(h.observer.last().unwrap().media_id, "");
}

#[test]
fn test_edits_on_empty_queue_are_rejected() {
    let mut h = Harness::new();
    assert!(matches!(h.adapter.remove_at(0), Err(Error::EmptyQueue)));
    assert!(matches!(h.adapter.jump_to(0), Err(Error::EmptyQueue)));
    assert_eq!(h.status(), PlaybackStatus::Idle);
    assert_eq!(h.probe.prepare_count(), 0);
}

#[test]
fn test_jump_out_of_range_changes_nothing() {
    let mut h = Harness::playing(&["a", "b"]);
    let generation = h.adapter.generation();

    assert!(h.adapter.jump_to(9).is_err());
    assert_eq!(h.adapter.generation(), generation);
    assert_eq!(h.status(), PlaybackStatus::Playing);
}

#[test]
fn test_clear_goes_idle_with_no_track() {
    let mut h = Harness::playing(&["a", "b"]);
    h.adapter.clear();

    assert_eq!(h.status(), PlaybackStatus::Idle);
    assert!(h.adapter.queue().is_empty());
    assert_eq!(h.adapter.queue().current_index(), None);
    assert!(!h.adapter.play());
}

// ============================================================================
// Release and history
// ============================================================================

#[test]
fn test_release_from_error_is_idempotent() {
    let mut h = Harness::with_resolver(Arc::new(FailingResolver::new(&["a"])));
    h.adapter.set_queue(tracks(&["a"]), 0);
    assert_eq!(h.status(), PlaybackStatus::Error);

    h.adapter.release();
    h.adapter.release();
    assert_eq!(h.status(), PlaybackStatus::Idle);
    assert_eq!(h.probe.count(&EngineCall::Release), 1);
}

#[test]
fn test_callbacks_after_release_are_ignored() {
    let mut h = Harness::new();
    h.adapter.set_queue(tracks(&["a"]), 0);
    let generation = h.adapter.generation();
    h.adapter.release();

    h.adapter.handle_engine_event(EngineCallback {
        generation,
        event: EngineEvent::Ready { duration_ms: 1 },
    });
    assert_eq!(h.status(), PlaybackStatus::Idle);
}

#[test]
fn test_play_recorded_once_per_load() {
    let mut h = Harness::playing(&["a", "b"]);
    h.adapter.pause();
    h.adapter.play();

    let record = h.history.record(&TrackId::new("a")).unwrap();
    assert_eq!(record.play_count, 1);
    assert!(h.history.record(&TrackId::new("b")).is_none());

    h.engine(EngineEvent::Ended);
    h.ready();
    assert_eq!(h.history.record(&TrackId::new("b")).unwrap().play_count, 1);
}

#[test]
fn test_every_transition_is_published() {
    let mut h = Harness::new();
    h.observer.clear();

    h.adapter.set_queue(tracks(&["a"]), 0);
    h.ready();
    h.adapter.play();

    let statuses: Vec<PlaybackStatus> = h.observer.messages().iter().map(|m| m.status).collect();
    assert_eq!(
        statuses,
        vec![
            PlaybackStatus::Preparing,
            PlaybackStatus::Ready,
            PlaybackStatus::Playing
        ]
    );
}
