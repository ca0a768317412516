use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::config::TrailerConfig;
use crate::engine::{ItemStatus, MediaEngine, Status, Subscription};
use crate::item::TrailerItem;
use crate::lifecycle::{LifecycleCoordinator, LifecycleEvent, LifecycleEventSource};
use crate::session::{PlaybackSession, SessionEvent, WaitingEdge};
use crate::surface::{Orientation, SurfaceParent, VideoSurface};
use crate::thumbnail::{ThumbnailImage, ThumbnailLoader};

/// Delegate notifications, delivered through the channel handed out by
/// [`TrailerPlayer::take_event_receiver`]. A dropped receiver simply
/// mutes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailerEvent {
    /// Emitted at the configured cadence while playback is running.
    PlaybackTime(Duration),
    /// Emitted exactly once per natural end when auto-replay is off.
    DidEndPlaying,
}

/// Commands that can be sent to the trailer controller
enum TrailerCommand {
    SetItem {
        item: TrailerItem,
        respond_to: oneshot::Sender<()>,
    },
    Play {
        respond_to: oneshot::Sender<()>,
    },
    Pause {
        respond_to: oneshot::Sender<()>,
    },
    Replay {
        respond_to: oneshot::Sender<()>,
    },
    Seek {
        position: Duration,
        respond_to: oneshot::Sender<()>,
    },
    ToggleMute {
        respond_to: oneshot::Sender<()>,
    },
    Fullscreen {
        enabled: bool,
        orientation: Option<Orientation>,
        respond_to: oneshot::Sender<()>,
    },
    GetStatus {
        respond_to: oneshot::Sender<Status>,
    },
    IsMuted {
        respond_to: oneshot::Sender<bool>,
    },
    CanUseFullscreen {
        respond_to: oneshot::Sender<bool>,
    },
    GetDuration {
        respond_to: oneshot::Sender<Duration>,
    },
}

/// Callbacks re-posted onto the controller loop. Every variant carries
/// the epoch it was created under; the loop drops events from any epoch
/// but the current one, so nothing from a torn-down session can touch
/// live state.
pub(crate) enum InternalEvent {
    Session { epoch: u64, event: SessionEvent },
    Lifecycle { epoch: u64, event: LifecycleEvent },
    Thumbnail { epoch: u64, image: ThumbnailImage },
}

/// Controller that owns the playback session and processes commands.
///
/// The `run` loop is the single sequencing context: commands, engine
/// signals, lifecycle transitions and thumbnail completions all funnel
/// into it, so session state needs no locking.
pub struct TrailerController {
    engine: Arc<dyn MediaEngine>,
    surface: Arc<dyn VideoSurface>,
    lifecycle_source: Arc<dyn LifecycleEventSource>,
    thumbnails: ThumbnailLoader,
    config: TrailerConfig,

    commands: mpsc::UnboundedReceiver<TrailerCommand>,
    internal_rx: mpsc::UnboundedReceiver<InternalEvent>,
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    events: mpsc::UnboundedSender<TrailerEvent>,

    item: Option<TrailerItem>,
    session: Option<PlaybackSession>,
    lifecycle: LifecycleCoordinator,
    lifecycle_sub: Option<Subscription>,
    thumbnail_task: Option<Subscription>,
    epoch: u64,
}

impl TrailerController {
    /// Create a controller and its handle. The embedder spawns
    /// [`TrailerController::run`] on its runtime and keeps the handle.
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        surface: Arc<dyn VideoSurface>,
        lifecycle_source: Arc<dyn LifecycleEventSource>,
        config: TrailerConfig,
    ) -> (TrailerPlayer, TrailerController) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let controller = TrailerController {
            engine,
            surface,
            lifecycle_source,
            thumbnails: ThumbnailLoader::new(config.thumbnail_timeout()),
            config,
            commands: command_rx,
            internal_rx,
            internal_tx,
            events: event_tx,
            item: None,
            session: None,
            lifecycle: LifecycleCoordinator::new(),
            lifecycle_sub: None,
            thumbnail_task: None,
            epoch: 0,
        };
        let handle = TrailerPlayer {
            sender: command_tx,
            event_receiver: Arc::new(Mutex::new(Some(event_rx))),
        };

        (handle, controller)
    }

    /// Run the controller event loop.
    ///
    /// Internal events take priority over commands so that everything an
    /// engine callback posted before a command is applied first: the
    /// ordering a caller on a single context would observe.
    pub async fn run(mut self) {
        debug!("trailer controller loop started");

        loop {
            tokio::select! {
                biased;
                Some(event) = self.internal_rx.recv() => {
                    self.handle_internal(event).await;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
            }
        }

        // Every handle is gone; tear down like a destroyed view.
        self.reset().await;
        debug!("trailer controller loop terminated");
    }

    async fn handle_command(&mut self, command: TrailerCommand) {
        match command {
            TrailerCommand::SetItem { item, respond_to } => {
                trace!("setting playing item");
                self.set_item(item).await;
                let _ = respond_to.send(());
            }
            TrailerCommand::Play { respond_to } => {
                trace!("starting playback");
                if let Some(session) = &self.session {
                    session.play().await;
                }
                let _ = respond_to.send(());
            }
            TrailerCommand::Pause { respond_to } => {
                trace!("pausing playback");
                if let Some(session) = &self.session {
                    session.pause().await;
                }
                let _ = respond_to.send(());
            }
            TrailerCommand::Replay { respond_to } => {
                trace!("replaying from the top");
                self.replay().await;
                let _ = respond_to.send(());
            }
            TrailerCommand::Seek {
                position,
                respond_to,
            } => {
                trace!("seeking to {:?}", position);
                if let Some(session) = &self.session {
                    session.seek(position).await;
                }
                let _ = respond_to.send(());
            }
            TrailerCommand::ToggleMute { respond_to } => {
                trace!("toggling mute");
                if let Some(session) = &self.session {
                    let muted = session.is_muted().await;
                    session.set_muted(!muted).await;
                }
                let _ = respond_to.send(());
            }
            TrailerCommand::Fullscreen {
                enabled,
                orientation,
                respond_to,
            } => {
                trace!("fullscreen: {}", enabled);
                self.fullscreen(enabled, orientation);
                let _ = respond_to.send(());
            }
            TrailerCommand::GetStatus { respond_to } => {
                let _ = respond_to.send(self.status().await);
            }
            TrailerCommand::IsMuted { respond_to } => {
                let _ = respond_to.send(self.is_muted().await);
            }
            TrailerCommand::CanUseFullscreen { respond_to } => {
                let _ = respond_to.send(self.can_use_fullscreen());
            }
            TrailerCommand::GetDuration { respond_to } => {
                let _ = respond_to.send(self.duration().await);
            }
        }
    }

    async fn handle_internal(&mut self, event: InternalEvent) {
        let epoch = match &event {
            InternalEvent::Session { epoch, .. }
            | InternalEvent::Lifecycle { epoch, .. }
            | InternalEvent::Thumbnail { epoch, .. } => *epoch,
        };
        if epoch != self.epoch {
            trace!("dropping stale event from epoch {}", epoch);
            return;
        }

        match event {
            InternalEvent::Session { event, .. } => self.handle_session_event(event).await,
            InternalEvent::Lifecycle { event, .. } => self.handle_lifecycle_event(event).await,
            InternalEvent::Thumbnail { image, .. } => self.apply_thumbnail(image),
        }
    }

    async fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ItemStatus(ItemStatus::ReadyToPlay) => {
                info!("item ready to play");
                self.surface.set_video_hidden(false);
            }
            SessionEvent::ItemStatus(ItemStatus::Failed) => {
                // Non-fatal: the component degrades to thumbnail-only.
                warn!("media item failed");
            }
            SessionEvent::ItemStatus(ItemStatus::Unknown) => {
                warn!("media item in unknown state");
            }
            SessionEvent::ControlStatus(status) => {
                let edge = self
                    .session
                    .as_mut()
                    .and_then(|session| session.waiting_edge(status));
                match edge {
                    Some(WaitingEdge::Entered) => self.surface.set_loading(true),
                    Some(WaitingEdge::Left) => self.surface.set_loading(false),
                    None => {}
                }
            }
            SessionEvent::PlayedToEnd => self.handle_played_to_end().await,
            SessionEvent::Progress(time) => {
                let _ = self.events.send(TrailerEvent::PlaybackTime(time));
            }
        }
    }

    async fn handle_played_to_end(&mut self) {
        let auto_replay = match &self.item {
            Some(item) => item.auto_replay,
            None => return,
        };

        if auto_replay {
            debug!("looping after natural end");
            self.replay().await;
        } else {
            self.surface.set_video_hidden(true);
            let _ = self.events.send(TrailerEvent::DidEndPlaying);
        }
    }

    async fn handle_lifecycle_event(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::DidEnterBackground => {
                let status = self.status().await;
                self.lifecycle.note_background(status);
            }
            LifecycleEvent::WillEnterForeground => {
                if self.lifecycle.take_resume() {
                    debug!("resuming playback after foreground");
                    if let Some(session) = &self.session {
                        session.play().await;
                    }
                }
            }
        }
    }

    fn apply_thumbnail(&mut self, image: ThumbnailImage) {
        // The thumbnail alone counts as ready when no video is loading.
        let video_loading = self
            .item
            .as_ref()
            .is_some_and(|item| item.video_url.is_some());
        if !video_loading {
            self.surface.set_loading(false);
        }
        self.surface.set_thumbnail(Some(image));
    }

    async fn set_item(&mut self, item: TrailerItem) {
        self.reset().await;
        let epoch = self.epoch;

        if item.video_url.is_none() && item.thumbnail_url.is_none() {
            // Nothing to load: stay idle with the indicator stopped.
            self.item = Some(item);
            return;
        }

        self.surface.set_loading(true);

        if let Some(url) = &item.thumbnail_url {
            let internal = self.internal_tx.clone();
            let task = self.thumbnails.spawn_fetch(url.clone(), move |image| {
                let _ = internal.send(InternalEvent::Thumbnail { epoch, image });
            });
            self.thumbnail_task = Some(task);
        }

        if let Some(url) = &item.video_url {
            let internal = self.internal_tx.clone();
            let post = move |event| {
                let _ = internal.send(InternalEvent::Session { epoch, event });
            };
            let started = PlaybackSession::start(
                self.engine.as_ref(),
                url,
                self.config.progress_interval(),
                post,
            )
            .await;

            match started {
                Ok(session) => {
                    if item.auto_play {
                        session.play().await;
                    }
                    session.set_muted(item.mute).await;

                    let internal = self.internal_tx.clone();
                    self.lifecycle_sub =
                        Some(self.lifecycle_source.subscribe(Box::new(move |event| {
                            let _ = internal.send(InternalEvent::Lifecycle { epoch, event });
                        })));
                    self.session = Some(session);
                }
                Err(err) => warn!("failed to open media source: {:#}", err),
            }
        }

        self.item = Some(item);
    }

    async fn replay(&mut self) {
        if let Some(session) = &self.session {
            session.seek(Duration::ZERO).await;
            session.play().await;
            self.surface.set_video_hidden(false);
        }
    }

    fn fullscreen(&self, enabled: bool, orientation: Option<Orientation>) {
        // Nothing to show fullscreen without a video.
        if !self.can_use_fullscreen() {
            return;
        }

        self.surface.reparent(if enabled {
            SurfaceParent::Fullscreen
        } else {
            SurfaceParent::Inline
        });

        if let Some(orientation) = orientation {
            self.surface.request_orientation(orientation);
        }
    }

    /// Tear everything down, leaving the component indistinguishable
    /// from freshly constructed. Runs on every `set_item` and once more
    /// when the loop exits.
    async fn reset(&mut self) {
        // Invalidate anything still in flight from the previous item.
        self.epoch += 1;

        self.lifecycle_sub = None;
        self.lifecycle.clear();

        if let Some(mut task) = self.thumbnail_task.take() {
            task.cancel();
        }

        self.item = None;
        self.surface.set_thumbnail(None);
        self.surface.set_loading(false);

        if let Some(mut session) = self.session.take() {
            session.dispose().await;
        }
        self.surface.set_video_hidden(true);
    }

    async fn status(&self) -> Status {
        match &self.session {
            Some(session) => session.status().await,
            None => Status::Unknown,
        }
    }

    async fn is_muted(&self) -> bool {
        match &self.session {
            Some(session) => session.is_muted().await,
            None => true,
        }
    }

    fn can_use_fullscreen(&self) -> bool {
        self.item
            .as_ref()
            .is_some_and(|item| item.video_url.is_some())
    }

    async fn duration(&self) -> Duration {
        match &self.session {
            Some(session) => session.duration().await,
            None => Duration::ZERO,
        }
    }
}

/// Handle to send commands to the trailer controller.
#[derive(Clone)]
pub struct TrailerPlayer {
    sender: mpsc::UnboundedSender<TrailerCommand>,
    event_receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<TrailerEvent>>>>,
}

impl std::fmt::Debug for TrailerPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrailerPlayer")
            .field("sender", &"<UnboundedSender>")
            .field("event_receiver", &"<Arc<Mutex<...>>>")
            .finish()
    }
}

impl TrailerPlayer {
    /// Take the delegate event receiver (can only be done once).
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<TrailerEvent>> {
        self.event_receiver.lock().unwrap().take()
    }

    /// Replace the current item, fully disposing any prior session
    /// before this returns.
    pub async fn set_item(&self, item: TrailerItem) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::SetItem { item, respond_to })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }

    /// Start playback; no-op without a session.
    pub async fn play(&self) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::Play { respond_to })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }

    /// Pause playback; no-op without a session.
    pub async fn pause(&self) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::Pause { respond_to })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }

    /// Seek to zero, resume playback and reveal the video surface.
    pub async fn replay(&self) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::Replay { respond_to })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }

    /// Seek to a position; the engine may clamp to the valid range.
    pub async fn seek(&self, position: Duration) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::Seek {
                position,
                respond_to,
            })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }

    /// Toggle mute; calling twice restores the original state.
    pub async fn toggle_mute(&self) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::ToggleMute { respond_to })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }

    /// Move the render surface between its inline container and the
    /// host window; no-op when the current item has no video.
    pub async fn fullscreen(&self, enabled: bool, orientation: Option<Orientation>) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::Fullscreen {
                enabled,
                orientation,
                respond_to,
            })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }

    /// Current playback status; `Unknown` without a session.
    pub async fn status(&self) -> Result<Status> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::GetStatus { respond_to })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }

    /// Muted state; defaults to muted without a session.
    pub async fn is_muted(&self) -> Result<bool> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::IsMuted { respond_to })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }

    /// Whether fullscreen is available for the current item.
    pub async fn can_use_fullscreen(&self) -> Result<bool> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::CanUseFullscreen { respond_to })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }

    /// Item duration; zero when unknown or no item is loaded.
    pub async fn duration(&self) -> Result<Duration> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TrailerCommand::GetDuration { respond_to })
            .map_err(|_| anyhow!("Trailer controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow!("Failed to receive response from trailer controller"))
    }
}
