use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use url::Url;

use crate::engine::{ControlStatus, ItemStatus, MediaEngine, PlayerBackend, Status, Subscription};

/// Signals a live session posts onto the controller loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEvent {
    ItemStatus(ItemStatus),
    ControlStatus(ControlStatus),
    PlayedToEnd,
    Progress(Duration),
}

/// Transition into or out of the waiting-to-play state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitingEdge {
    Entered,
    Left,
}

/// Compares each observed control status against the previous one so the
/// loading indicator only toggles on edges, not on every report. Dies
/// with the session.
#[derive(Debug)]
struct WaitingEdgeDetector {
    previous: ControlStatus,
}

impl WaitingEdgeDetector {
    fn new(initial: ControlStatus) -> Self {
        Self { previous: initial }
    }

    fn observe(&mut self, new: ControlStatus) -> Option<WaitingEdge> {
        let old = std::mem::replace(&mut self.previous, new);
        if old == new {
            return None;
        }
        match (old, new) {
            (ControlStatus::WaitingToPlay, _) => Some(WaitingEdge::Left),
            (_, ControlStatus::WaitingToPlay) => Some(WaitingEdge::Entered),
            _ => None,
        }
    }
}

/// One live playback session: the engine-side player plus every observer
/// token bound to it. At most one exists per player instance; disposal
/// releases everything and is idempotent.
pub(crate) struct PlaybackSession {
    player: Arc<dyn PlayerBackend>,
    ticker: Subscription,
    item_status_sub: Subscription,
    control_status_sub: Subscription,
    end_sub: Subscription,
    edges: WaitingEdgeDetector,
    disposed: bool,
}

impl PlaybackSession {
    /// Open `url` on the engine and wire up observation. `post` re-posts
    /// every signal onto the controller loop; callers tag and filter for
    /// staleness there.
    pub(crate) async fn start(
        engine: &dyn MediaEngine,
        url: &Url,
        progress_interval: Duration,
        post: impl Fn(SessionEvent) + Send + Sync + Clone + 'static,
    ) -> Result<Self> {
        let player: Arc<dyn PlayerBackend> = Arc::from(engine.open(url).await?);

        let item_status_sub = {
            let post = post.clone();
            player.observe_item_status(Box::new(move |status| {
                post(SessionEvent::ItemStatus(status));
            }))
        };
        let control_status_sub = {
            let post = post.clone();
            player.observe_control_status(Box::new(move |status| {
                post(SessionEvent::ControlStatus(status));
            }))
        };
        let end_sub = {
            let post = post.clone();
            player.observe_played_to_end(Box::new(move || {
                post(SessionEvent::PlayedToEnd);
            }))
        };

        let edges = WaitingEdgeDetector::new(player.control_status().await);

        // Progress updates are emitted only while the engine reports
        // Playing; paused and buffering sessions stay quiet.
        let ticker = {
            let player = Arc::clone(&player);
            let handle = tokio::spawn(async move {
                let mut interval = tokio::time::interval(progress_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    if player.control_status().await == ControlStatus::Playing {
                        post(SessionEvent::Progress(player.position().await));
                    }
                }
            });
            Subscription::new(move || handle.abort())
        };

        Ok(Self {
            player,
            ticker,
            item_status_sub,
            control_status_sub,
            end_sub,
            edges,
            disposed: false,
        })
    }

    pub(crate) async fn play(&self) {
        self.player.play().await;
    }

    pub(crate) async fn pause(&self) {
        self.player.pause().await;
    }

    pub(crate) async fn seek(&self, position: Duration) {
        self.player.seek(position).await;
    }

    pub(crate) async fn set_muted(&self, muted: bool) {
        self.player.set_muted(muted).await;
    }

    pub(crate) async fn is_muted(&self) -> bool {
        self.player.is_muted().await
    }

    pub(crate) async fn duration(&self) -> Duration {
        self.player.duration().await.unwrap_or(Duration::ZERO)
    }

    pub(crate) async fn status(&self) -> Status {
        Status::from_control(Some(self.player.control_status().await))
    }

    /// Feed a control-status report through the per-session edge
    /// detector.
    pub(crate) fn waiting_edge(&mut self, new: ControlStatus) -> Option<WaitingEdge> {
        self.edges.observe(new)
    }

    /// Release the ticker, every observer token, and the engine-side
    /// player. Tokens are released in no particular order and each
    /// release is a no-op the second time.
    pub(crate) async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.ticker.cancel();
        self.item_status_sub.cancel();
        self.control_status_sub.cancel();
        self.end_sub.cancel();

        self.player.pause().await;
        self.player.shutdown().await;
    }
}
