use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

/// The engine's play/pause/buffer state, distinct from item readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatus {
    Paused,
    WaitingToPlay,
    Playing,
}

/// Readiness of the media item the engine is loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Unknown,
    ReadyToPlay,
    Failed,
}

/// Public playback status, derived from the active session's control
/// status. `Unknown` when no session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Playing,
    Paused,
    WaitingToPlay,
    Unknown,
}

impl Status {
    pub(crate) fn from_control(control: Option<ControlStatus>) -> Self {
        match control {
            Some(ControlStatus::Playing) => Status::Playing,
            Some(ControlStatus::Paused) => Status::Paused,
            Some(ControlStatus::WaitingToPlay) => Status::WaitingToPlay,
            None => Status::Unknown,
        }
    }
}

pub type ItemStatusCallback = Box<dyn Fn(ItemStatus) + Send + Sync>;
pub type ControlStatusCallback = Box<dyn Fn(ControlStatus) + Send + Sync>;
pub type PlayedToEndCallback = Box<dyn Fn() + Send + Sync>;

/// Token for a registered observer or background task.
///
/// Cancelling stops delivery; cancelling twice is a no-op, and dropping
/// the token cancels it. Tokens may be released in any order.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("live", &self.cancel.is_some())
            .finish()
    }
}

/// Injected media engine capability.
///
/// The engine decodes and renders; this crate only drives it. `open`
/// fails when the URI cannot be resolved at all; load and playback
/// errors after that are reported asynchronously through
/// [`PlayerBackend::observe_item_status`], never through `open`.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn open(&self, url: &Url) -> Result<Box<dyn PlayerBackend>>;
}

/// One engine-side player bound to a media URI.
///
/// Control calls are best-effort forwards; the engine may clamp seeks to
/// the valid range. Observer callbacks may fire on any thread; the
/// session re-posts them onto the controller loop before state is
/// touched. After `shutdown`, queries return defaults and further calls
/// are no-ops.
#[async_trait]
pub trait PlayerBackend: Send + Sync {
    async fn play(&self);
    async fn pause(&self);
    async fn seek(&self, position: Duration);
    async fn set_muted(&self, muted: bool);
    async fn is_muted(&self) -> bool;
    async fn position(&self) -> Duration;
    /// `None` until the engine knows the item's duration.
    async fn duration(&self) -> Option<Duration>;
    async fn control_status(&self) -> ControlStatus;
    /// Stop playback and release the render attachment. Idempotent.
    async fn shutdown(&self);

    fn observe_item_status(&self, callback: ItemStatusCallback) -> Subscription;
    fn observe_control_status(&self, callback: ControlStatusCallback) -> Subscription;
    /// Fires once per item when playback reaches the natural end.
    fn observe_played_to_end(&self, callback: PlayedToEndCallback) -> Subscription;
}
