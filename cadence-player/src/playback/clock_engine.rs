//! Wall-clock media engine
//!
//! Headless engine used by the service binary: it checks that the media file
//! exists, then "plays" it by advancing a clock at the current speed and
//! reports `Ended` once the known duration has elapsed. It produces no audio.

use super::engine::{MediaEngine, MediaHandle};
use super::events::{EngineCallback, EngineEvent, EngineEventSender};
use cadence_common::{EngineErrorKind, ErrorDescriptor};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Track currently held by the engine
#[derive(Debug)]
struct Loaded {
    generation: u64,
    duration_ms: u64,
    /// Position at `started_at` (or the frozen position when paused)
    anchor_ms: u64,
    started_at: Option<Instant>,
}

pub struct ClockEngine {
    events: EngineEventSender,
    prepare_delay: Duration,
    speed: f32,
    loaded: Option<Loaded>,
    prepare_task: Option<JoinHandle<()>>,
    end_timer: Option<JoinHandle<()>>,
    released: bool,
}

impl ClockEngine {
    pub fn new(events: EngineEventSender) -> Self {
        Self {
            events,
            prepare_delay: Duration::ZERO,
            speed: 1.0,
            loaded: None,
            prepare_task: None,
            end_timer: None,
            released: false,
        }
    }

    /// Simulated time spent preparing each track
    pub fn with_prepare_delay(mut self, delay: Duration) -> Self {
        self.prepare_delay = delay;
        self
    }

    fn is_running(&self) -> bool {
        self.loaded
            .as_ref()
            .is_some_and(|loaded| loaded.started_at.is_some())
    }

    /// Fold elapsed running time into the anchor
    fn freeze(&mut self) {
        let position_ms = self.position_ms();
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.anchor_ms = position_ms;
            loaded.started_at = loaded.started_at.map(|_| Instant::now());
        }
    }

    fn cancel_end_timer(&mut self) {
        if let Some(timer) = self.end_timer.take() {
            timer.abort();
        }
    }

    fn cancel_all(&mut self) {
        if let Some(task) = self.prepare_task.take() {
            task.abort();
        }
        self.cancel_end_timer();
    }

    fn schedule_end(&mut self) {
        self.cancel_end_timer();
        let Some(loaded) = self.loaded.as_ref() else {
            return;
        };
        if loaded.started_at.is_none() || loaded.duration_ms == 0 {
            return;
        }

        let remaining_ms = loaded.duration_ms.saturating_sub(loaded.anchor_ms);
        let wait = Duration::from_secs_f64(remaining_ms as f64 / 1000.0 / self.speed as f64);
        let generation = loaded.generation;
        let events = self.events.clone();

        self.end_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let _ = events.send(EngineCallback {
                generation,
                event: EngineEvent::Ended,
            });
        }));
    }
}

impl MediaEngine for ClockEngine {
    fn prepare(&mut self, media: MediaHandle, generation: u64) {
        if self.released {
            warn!("Prepare called on a released engine");
            return;
        }
        self.cancel_all();
        self.loaded = Some(Loaded {
            generation,
            duration_ms: media.duration_hint_ms,
            anchor_ms: 0,
            started_at: None,
        });

        let events = self.events.clone();
        let delay = self.prepare_delay;
        self.prepare_task = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let event = match tokio::fs::metadata(&media.path).await {
                Ok(meta) if meta.is_file() => {
                    let _ = events.send(EngineCallback {
                        generation,
                        event: EngineEvent::Buffering {
                            buffered_position_ms: media.duration_hint_ms,
                        },
                    });
                    EngineEvent::Ready {
                        duration_ms: media.duration_hint_ms,
                    }
                }
                Ok(_) => EngineEvent::Error(ErrorDescriptor::new(
                    EngineErrorKind::Io,
                    format!("{} is not a file", media.path.display()),
                )),
                Err(e) => {
                    debug!("Cannot open {}: {}", media.path.display(), e);
                    EngineEvent::Error(ErrorDescriptor::from(&e))
                }
            };

            let _ = events.send(EngineCallback { generation, event });
        }));
    }

    fn play(&mut self) {
        if self.is_running() {
            return;
        }
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.started_at = Some(Instant::now());
            self.schedule_end();
        }
    }

    fn pause(&mut self) {
        if !self.is_running() {
            return;
        }
        self.freeze();
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.started_at = None;
        }
        self.cancel_end_timer();
    }

    fn seek(&mut self, position_ms: u64) {
        let running = self.is_running();
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.anchor_ms = if loaded.duration_ms > 0 {
                position_ms.min(loaded.duration_ms)
            } else {
                position_ms
            };
            if running {
                loaded.started_at = Some(Instant::now());
            }
        }
        if running {
            self.schedule_end();
        }
    }

    fn set_speed(&mut self, speed: f32) {
        if !speed.is_finite() || speed <= 0.0 {
            return;
        }
        self.freeze();
        self.speed = speed;
        if self.is_running() {
            self.schedule_end();
        }
    }

    fn stop(&mut self) {
        self.cancel_all();
        self.loaded = None;
    }

    fn position_ms(&self) -> u64 {
        let Some(loaded) = self.loaded.as_ref() else {
            return 0;
        };
        let elapsed_ms = loaded
            .started_at
            .map(|started| (started.elapsed().as_secs_f64() * 1000.0 * self.speed as f64) as u64)
            .unwrap_or(0);
        let position_ms = loaded.anchor_ms.saturating_add(elapsed_ms);
        if loaded.duration_ms > 0 {
            position_ms.min(loaded.duration_ms)
        } else {
            position_ms
        }
    }

    fn release(&mut self) {
        self.cancel_all();
        self.loaded = None;
        self.released = true;
    }
}

impl Drop for ClockEngine {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
