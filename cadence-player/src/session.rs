//! Playback session
//!
//! A session is one tokio task that exclusively owns the [`PlayerAdapter`].
//! Commands arrive over an mpsc channel and are answered on a oneshot; engine
//! callbacks and the position timer are multiplexed into the same loop, so
//! every state mutation happens on a single logical thread.
//!
//! The position timer only exists while the status is PLAYING.

use crate::bridge::StateBridge;
use crate::collaborators::Collaborators;
use crate::error::{Error, Result};
use crate::playback::{
    EngineCallback, EngineEventSender, MediaEngine, PlaybackState, PlayerAdapter,
};
use crate::queue::{QueueEngine, QueueSnapshot};
use cadence_common::config::{PlaybackDefaults, MIN_POSITION_INTERVAL_MS};
use cadence_common::{PlaybackStateMessage, PlaybackStatus, RepeatMode, Track};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Settings for a new session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub defaults: PlaybackDefaults,
    /// Period of position updates while playing
    pub position_interval: Duration,
    /// Bound of the command channel
    pub command_capacity: usize,
    /// Fixed shuffle seed (tests only need this)
    pub shuffle_seed: Option<u64>,
}

impl SessionConfig {
    pub fn from_defaults(defaults: PlaybackDefaults) -> Self {
        let interval_ms = defaults.position_interval_ms.max(MIN_POSITION_INTERVAL_MS);
        Self {
            defaults,
            position_interval: Duration::from_millis(interval_ms),
            command_capacity: 64,
            shuffle_seed: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_defaults(PlaybackDefaults::default())
    }
}

enum Command {
    SetQueue {
        tracks: Vec<Track>,
        start_index: usize,
        reply: oneshot::Sender<()>,
    },
    Add {
        track: Track,
        reply: oneshot::Sender<Uuid>,
    },
    RemoveAt {
        index: usize,
        reply: oneshot::Sender<Result<()>>,
    },
    JumpTo {
        index: usize,
        reply: oneshot::Sender<Result<()>>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    Play {
        reply: oneshot::Sender<bool>,
    },
    Pause {
        reply: oneshot::Sender<bool>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Seek {
        position_ms: u64,
        reply: oneshot::Sender<bool>,
    },
    SkipNext {
        reply: oneshot::Sender<bool>,
    },
    SkipPrevious {
        reply: oneshot::Sender<bool>,
    },
    SetSpeed {
        speed: f32,
        reply: oneshot::Sender<Result<()>>,
    },
    SetRepeatMode {
        mode: RepeatMode,
        reply: oneshot::Sender<()>,
    },
    SetShuffle {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    ToggleShuffle {
        reply: oneshot::Sender<bool>,
    },
    State {
        reply: oneshot::Sender<PlaybackState>,
    },
    Queue {
        reply: oneshot::Sender<QueueSnapshot>,
    },
    RequestSnapshot {
        reply: oneshot::Sender<PlaybackStateMessage>,
    },
    Release {
        reply: oneshot::Sender<()>,
    },
}

/// Entry point for starting playback sessions
pub struct PlaybackSession;

impl PlaybackSession {
    /// Build the engine, adapter and queue, and spawn the session task
    ///
    /// `make_engine` receives the sender its callbacks must go to. The
    /// initial IDLE state is published before this returns. Must be called
    /// within a tokio runtime.
    pub fn spawn<E, F>(
        make_engine: F,
        collaborators: Collaborators,
        bridge: Arc<StateBridge>,
        config: SessionConfig,
    ) -> SessionHandle
    where
        E: MediaEngine + 'static,
        F: FnOnce(EngineEventSender) -> E,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let engine = make_engine(event_tx);

        let queue = match config.shuffle_seed {
            Some(seed) => QueueEngine::with_seed(seed),
            None => QueueEngine::new(),
        }
        .with_preferences(config.defaults.shuffle, config.defaults.repeat_mode);

        let adapter = PlayerAdapter::new(
            queue,
            Box::new(engine),
            collaborators,
            bridge,
            &config.defaults,
        );

        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        tokio::spawn(run(adapter, command_rx, event_rx, config.position_interval));

        info!("Playback session started");
        SessionHandle {
            commands: command_tx,
        }
    }
}

async fn run(
    mut adapter: PlayerAdapter,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedReceiver<EngineCallback>,
    position_interval: Duration,
) {
    let mut events = Some(events);
    let mut ticker: Option<Interval> = None;

    loop {
        // Callbacks already queued are applied before the next command
        tokio::select! {
            biased;

            callback = next_callback(&mut events) => {
                match callback {
                    Some(callback) => adapter.handle_engine_event(callback),
                    None => {
                        warn!("Engine callback channel closed");
                        events = None;
                    }
                }
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("All session handles dropped");
                    adapter.release();
                    break;
                };
                if let Command::Release { reply } = command {
                    adapter.release();
                    let _ = reply.send(());
                    break;
                }
                dispatch(&mut adapter, command);
            }
            _ = next_tick(&mut ticker) => adapter.tick(),
        }

        sync_ticker(&adapter, &mut ticker, position_interval);
    }

    info!("Playback session ended");
}

fn dispatch(adapter: &mut PlayerAdapter, command: Command) {
    match command {
        Command::SetQueue {
            tracks,
            start_index,
            reply,
        } => {
            adapter.set_queue(tracks, start_index);
            let _ = reply.send(());
        }
        Command::Add { track, reply } => {
            let _ = reply.send(adapter.add(track));
        }
        Command::RemoveAt { index, reply } => {
            let _ = reply.send(adapter.remove_at(index));
        }
        Command::JumpTo { index, reply } => {
            let _ = reply.send(adapter.jump_to(index));
        }
        Command::Clear { reply } => {
            adapter.clear();
            let _ = reply.send(());
        }
        Command::Play { reply } => {
            let _ = reply.send(adapter.play());
        }
        Command::Pause { reply } => {
            let _ = reply.send(adapter.pause());
        }
        Command::Stop { reply } => {
            adapter.stop();
            let _ = reply.send(());
        }
        Command::Seek { position_ms, reply } => {
            let _ = reply.send(adapter.seek(position_ms));
        }
        Command::SkipNext { reply } => {
            let _ = reply.send(adapter.skip_next());
        }
        Command::SkipPrevious { reply } => {
            let _ = reply.send(adapter.skip_previous());
        }
        Command::SetSpeed { speed, reply } => {
            let _ = reply.send(adapter.set_speed(speed));
        }
        Command::SetRepeatMode { mode, reply } => {
            adapter.set_repeat_mode(mode);
            let _ = reply.send(());
        }
        Command::SetShuffle { enabled, reply } => {
            adapter.set_shuffle(enabled);
            let _ = reply.send(());
        }
        Command::ToggleShuffle { reply } => {
            let _ = reply.send(adapter.toggle_shuffle());
        }
        Command::State { reply } => {
            let _ = reply.send(adapter.state().clone());
        }
        Command::Queue { reply } => {
            let _ = reply.send(adapter.queue().snapshot());
        }
        Command::RequestSnapshot { reply } => {
            let _ = reply.send(adapter.publish_current());
        }
        Command::Release { reply } => {
            adapter.release();
            let _ = reply.send(());
        }
    }
}

async fn next_callback(
    events: &mut Option<mpsc::UnboundedReceiver<EngineCallback>>,
) -> Option<EngineCallback> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Create the position timer on entering PLAYING, drop it on leaving
fn sync_ticker(adapter: &PlayerAdapter, ticker: &mut Option<Interval>, period: Duration) {
    let playing = adapter.state().status == PlaybackStatus::Playing;
    match (playing, ticker.is_some()) {
        (true, false) => {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            *ticker = Some(interval);
            debug!("Position timer started ({:?})", period);
        }
        (false, true) => {
            *ticker = None;
            debug!("Position timer cancelled");
        }
        _ => {}
    }
}

/// Cloneable handle to a running session
///
/// Every method waits for the session to apply the command. Once the session
/// has been released they fail with [`Error::SessionClosed`], except
/// [`release`](Self::release) which is idempotent.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Replace the queue; the selected track is prepared but not played
    pub async fn set_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.call(|reply| Command::SetQueue {
            tracks,
            start_index,
            reply,
        })
        .await
    }

    /// Append a track and return its entry id
    pub async fn add(&self, track: Track) -> Result<Uuid> {
        self.call(|reply| Command::Add { track, reply }).await
    }

    pub async fn remove_at(&self, index: usize) -> Result<()> {
        self.call(|reply| Command::RemoveAt { index, reply }).await?
    }

    pub async fn jump_to(&self, index: usize) -> Result<()> {
        self.call(|reply| Command::JumpTo { index, reply }).await?
    }

    pub async fn clear(&self) -> Result<()> {
        self.call(|reply| Command::Clear { reply }).await
    }

    pub async fn play(&self) -> Result<bool> {
        self.call(|reply| Command::Play { reply }).await
    }

    pub async fn pause(&self) -> Result<bool> {
        self.call(|reply| Command::Pause { reply }).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.call(|reply| Command::Stop { reply }).await
    }

    pub async fn seek(&self, position_ms: u64) -> Result<bool> {
        self.call(|reply| Command::Seek { position_ms, reply })
            .await
    }

    pub async fn skip_next(&self) -> Result<bool> {
        self.call(|reply| Command::SkipNext { reply }).await
    }

    pub async fn skip_previous(&self) -> Result<bool> {
        self.call(|reply| Command::SkipPrevious { reply }).await
    }

    pub async fn set_speed(&self, speed: f32) -> Result<()> {
        self.call(|reply| Command::SetSpeed { speed, reply }).await?
    }

    pub async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.call(|reply| Command::SetRepeatMode { mode, reply })
            .await
    }

    pub async fn set_shuffle(&self, enabled: bool) -> Result<()> {
        self.call(|reply| Command::SetShuffle { enabled, reply })
            .await
    }

    pub async fn toggle_shuffle(&self) -> Result<bool> {
        self.call(|reply| Command::ToggleShuffle { reply }).await
    }

    /// Copy of the authoritative playback state
    pub async fn state(&self) -> Result<PlaybackState> {
        self.call(|reply| Command::State { reply }).await
    }

    pub async fn queue(&self) -> Result<QueueSnapshot> {
        self.call(|reply| Command::Queue { reply }).await
    }

    /// Re-publish the current state to all subscribers and return it
    pub async fn request_snapshot(&self) -> Result<PlaybackStateMessage> {
        self.call(|reply| Command::RequestSnapshot { reply })
            .await
    }

    /// Release the engine and end the session
    pub async fn release(&self) -> Result<()> {
        match self.call(|reply| Command::Release { reply }).await {
            Ok(()) | Err(Error::SessionClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Whether the session task has exited
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
