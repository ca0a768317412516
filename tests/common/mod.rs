#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};
use tokio::sync::mpsc;
use url::Url;

use teaser::{
    ControlStatus, ControlStatusCallback, ItemStatus, ItemStatusCallback, LifecycleCallback,
    LifecycleEvent, LifecycleEventSource, MediaEngine, Orientation, PlayedToEndCallback,
    PlayerBackend, Subscription, SurfaceParent, ThumbnailImage, TrailerConfig, TrailerController,
    TrailerEvent, TrailerItem, TrailerPlayer, VideoSurface,
};

/// Control calls recorded by the fake backend, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Play,
    Pause,
    Seek(Duration),
    SetMuted(bool),
    Shutdown,
}

#[derive(Default)]
struct Observers {
    item_status: HashMap<u64, ItemStatusCallback>,
    control_status: HashMap<u64, ControlStatusCallback>,
    played_to_end: HashMap<u64, PlayedToEndCallback>,
}

/// Shared state of one fake engine-side player. Tests hold it to drive
/// status/end signals and to inspect the calls the coordinator made.
pub struct FakeBackendState {
    calls: Mutex<Vec<BackendCall>>,
    muted: Mutex<bool>,
    control_status: Mutex<ControlStatus>,
    position: Mutex<Duration>,
    duration: Mutex<Option<Duration>>,
    observers: Mutex<Observers>,
    next_observer: AtomicU64,
}

impl FakeBackendState {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            muted: Mutex::new(false),
            control_status: Mutex::new(ControlStatus::Paused),
            position: Mutex::new(Duration::ZERO),
            duration: Mutex::new(None),
            observers: Mutex::new(Observers::default()),
            next_observer: AtomicU64::new(0),
        }
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &BackendCall) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|recorded| *recorded == call)
            .count()
    }

    pub fn is_muted(&self) -> bool {
        *self.muted.lock().unwrap()
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock().unwrap() = position;
    }

    pub fn set_duration(&self, duration: Option<Duration>) {
        *self.duration.lock().unwrap() = duration;
    }

    /// Change the control status and notify observers, like an engine
    /// reporting a transition.
    pub fn set_control_status(&self, status: ControlStatus) {
        *self.control_status.lock().unwrap() = status;
        for callback in self.observers.lock().unwrap().control_status.values() {
            callback(status);
        }
    }

    pub fn fire_item_status(&self, status: ItemStatus) {
        for callback in self.observers.lock().unwrap().item_status.values() {
            callback(status);
        }
    }

    pub fn fire_played_to_end(&self) {
        for callback in self.observers.lock().unwrap().played_to_end.values() {
            callback();
        }
    }

    /// True once every observer registration has been released.
    pub fn observers_released(&self) -> bool {
        let observers = self.observers.lock().unwrap();
        observers.item_status.is_empty()
            && observers.control_status.is_empty()
            && observers.played_to_end.is_empty()
    }
}

struct FakeBackend {
    state: Arc<FakeBackendState>,
}

#[async_trait]
impl PlayerBackend for FakeBackend {
    async fn play(&self) {
        self.state.record(BackendCall::Play);
    }

    async fn pause(&self) {
        self.state.record(BackendCall::Pause);
    }

    async fn seek(&self, position: Duration) {
        self.state.record(BackendCall::Seek(position));
        *self.state.position.lock().unwrap() = position;
    }

    async fn set_muted(&self, muted: bool) {
        self.state.record(BackendCall::SetMuted(muted));
        *self.state.muted.lock().unwrap() = muted;
    }

    async fn is_muted(&self) -> bool {
        *self.state.muted.lock().unwrap()
    }

    async fn position(&self) -> Duration {
        *self.state.position.lock().unwrap()
    }

    async fn duration(&self) -> Option<Duration> {
        *self.state.duration.lock().unwrap()
    }

    async fn control_status(&self) -> ControlStatus {
        *self.state.control_status.lock().unwrap()
    }

    async fn shutdown(&self) {
        self.state.record(BackendCall::Shutdown);
    }

    fn observe_item_status(&self, callback: ItemStatusCallback) -> Subscription {
        let id = self.state.next_observer.fetch_add(1, Ordering::SeqCst);
        self.state
            .observers
            .lock()
            .unwrap()
            .item_status
            .insert(id, callback);
        let state = Arc::clone(&self.state);
        Subscription::new(move || {
            state.observers.lock().unwrap().item_status.remove(&id);
        })
    }

    fn observe_control_status(&self, callback: ControlStatusCallback) -> Subscription {
        let id = self.state.next_observer.fetch_add(1, Ordering::SeqCst);
        self.state
            .observers
            .lock()
            .unwrap()
            .control_status
            .insert(id, callback);
        let state = Arc::clone(&self.state);
        Subscription::new(move || {
            state.observers.lock().unwrap().control_status.remove(&id);
        })
    }

    fn observe_played_to_end(&self, callback: PlayedToEndCallback) -> Subscription {
        let id = self.state.next_observer.fetch_add(1, Ordering::SeqCst);
        self.state
            .observers
            .lock()
            .unwrap()
            .played_to_end
            .insert(id, callback);
        let state = Arc::clone(&self.state);
        Subscription::new(move || {
            state.observers.lock().unwrap().played_to_end.remove(&id);
        })
    }
}

/// Fake media engine: hands out a fresh recording backend per `open`
/// and keeps every opened backend's state for inspection.
#[derive(Default)]
pub struct FakeEngine {
    opened: Mutex<Vec<Arc<FakeBackendState>>>,
    fail_next_open: AtomicBool,
}

impl FakeEngine {
    pub fn fail_next_open(&self) {
        self.fail_next_open.store(true, Ordering::SeqCst);
    }

    pub fn opened_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn backend(&self, index: usize) -> Arc<FakeBackendState> {
        Arc::clone(&self.opened.lock().unwrap()[index])
    }

    pub fn last_backend(&self) -> Arc<FakeBackendState> {
        Arc::clone(
            self.opened
                .lock()
                .unwrap()
                .last()
                .expect("no backend opened"),
        )
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn open(&self, _url: &Url) -> Result<Box<dyn PlayerBackend>> {
        if self.fail_next_open.swap(false, Ordering::SeqCst) {
            anyhow::bail!("unresolvable media source");
        }
        let state = Arc::new(FakeBackendState::new());
        self.opened.lock().unwrap().push(Arc::clone(&state));
        Ok(Box::new(FakeBackend { state }))
    }
}

/// Recording render surface; loading-indicator transitions are kept in
/// order to catch flicker.
pub struct FakeSurface {
    video_hidden: Mutex<bool>,
    loading: Mutex<bool>,
    loading_calls: Mutex<Vec<bool>>,
    thumbnail: Mutex<Option<ThumbnailImage>>,
    parent: Mutex<SurfaceParent>,
    orientations: Mutex<Vec<Orientation>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            video_hidden: Mutex::new(true),
            loading: Mutex::new(false),
            loading_calls: Mutex::new(Vec::new()),
            thumbnail: Mutex::new(None),
            parent: Mutex::new(SurfaceParent::Inline),
            orientations: Mutex::new(Vec::new()),
        }
    }

    pub fn video_hidden(&self) -> bool {
        *self.video_hidden.lock().unwrap()
    }

    pub fn loading(&self) -> bool {
        *self.loading.lock().unwrap()
    }

    pub fn loading_calls(&self) -> Vec<bool> {
        self.loading_calls.lock().unwrap().clone()
    }

    pub fn thumbnail(&self) -> Option<ThumbnailImage> {
        self.thumbnail.lock().unwrap().clone()
    }

    pub fn parent(&self) -> SurfaceParent {
        *self.parent.lock().unwrap()
    }

    pub fn orientations(&self) -> Vec<Orientation> {
        self.orientations.lock().unwrap().clone()
    }
}

impl VideoSurface for FakeSurface {
    fn set_video_hidden(&self, hidden: bool) {
        *self.video_hidden.lock().unwrap() = hidden;
    }

    fn set_loading(&self, animating: bool) {
        *self.loading.lock().unwrap() = animating;
        self.loading_calls.lock().unwrap().push(animating);
    }

    fn set_thumbnail(&self, image: Option<ThumbnailImage>) {
        *self.thumbnail.lock().unwrap() = image;
    }

    fn reparent(&self, parent: SurfaceParent) {
        *self.parent.lock().unwrap() = parent;
    }

    fn request_orientation(&self, orientation: Orientation) {
        self.orientations.lock().unwrap().push(orientation);
    }
}

/// Fake app-lifecycle feed; `emit` fans an event out to every live
/// registration.
#[derive(Default)]
pub struct FakeLifecycle {
    subscribers: Arc<Mutex<HashMap<u64, LifecycleCallback>>>,
    next_id: AtomicU64,
}

impl FakeLifecycle {
    pub fn emit(&self, event: LifecycleEvent) {
        for callback in self.subscribers.lock().unwrap().values() {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl LifecycleEventSource for FakeLifecycle {
    fn subscribe(&self, callback: LifecycleCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().unwrap().insert(id, callback);
        let subscribers = Arc::clone(&self.subscribers);
        Subscription::new(move || {
            subscribers.lock().unwrap().remove(&id);
        })
    }
}

/// A spawned player wired to fakes, plus the delegate event channel.
pub struct TestRig {
    pub player: TrailerPlayer,
    pub engine: Arc<FakeEngine>,
    pub surface: Arc<FakeSurface>,
    pub lifecycle: Arc<FakeLifecycle>,
    pub events: mpsc::UnboundedReceiver<TrailerEvent>,
}

impl TestRig {
    /// Round-trip through the controller loop: everything posted before
    /// this call has been applied once it returns.
    pub async fn settle(&self) {
        let _ = self.player.status().await.unwrap();
    }

    pub fn drain_events(&mut self) -> Vec<TrailerEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }
}

pub fn spawn_player() -> TestRig {
    spawn_player_with(TrailerConfig::default())
}

pub fn spawn_player_with(config: TrailerConfig) -> TestRig {
    let engine = Arc::new(FakeEngine::default());
    let surface = Arc::new(FakeSurface::new());
    let lifecycle = Arc::new(FakeLifecycle::default());

    let (player, controller) =
        TrailerController::new(engine.clone(), surface.clone(), lifecycle.clone(), config);
    let events = player
        .take_event_receiver()
        .expect("event receiver taken twice");
    tokio::spawn(controller.run());

    TestRig {
        player,
        engine,
        surface,
        lifecycle,
        events,
    }
}

pub fn video_url() -> Url {
    Url::parse("https://example.com/trailer.mp4").unwrap()
}

pub fn thumbnail_url() -> Url {
    Url::parse("https://example.com/thumb.png").unwrap()
}

pub fn video_item() -> TrailerItem {
    TrailerItem::new(Some(video_url()), None)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    RgbaImage::new(width, height)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

/// Poll until `condition` holds, panicking after two seconds.
pub async fn wait_for(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}
