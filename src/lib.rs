//! Embeddable trailer-player core.
//!
//! `teaser` owns one playback session at a time and turns low-level
//! engine signals into a small public state machine with autoplay,
//! auto-replay, mute toggling, fullscreen reparenting and
//! lifecycle-aware pause/resume. The media engine, render surface and
//! app-lifecycle feed are injected capabilities; this crate is the
//! coordination layer above them, not a decoder.
//!
//! ```no_run
//! use std::sync::Arc;
//! use teaser::{TrailerConfig, TrailerController, TrailerItem};
//!
//! # async fn embed(
//! #     engine: Arc<dyn teaser::MediaEngine>,
//! #     surface: Arc<dyn teaser::VideoSurface>,
//! #     lifecycle: Arc<dyn teaser::LifecycleEventSource>,
//! # ) -> anyhow::Result<()> {
//! let (player, controller) =
//!     TrailerController::new(engine, surface, lifecycle, TrailerConfig::default());
//! tokio::spawn(controller.run());
//!
//! let item = TrailerItem::new(
//!     Some("https://example.com/trailer.mp4".parse()?),
//!     Some("https://example.com/thumb.jpg".parse()?),
//! )
//! .with_auto_replay(true);
//! player.set_item(item).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod engine;
pub mod item;
pub mod lifecycle;
mod session;
pub mod surface;
pub mod thumbnail;

pub use config::TrailerConfig;
pub use controller::{TrailerController, TrailerEvent, TrailerPlayer};
pub use engine::{
    ControlStatus, ControlStatusCallback, ItemStatus, ItemStatusCallback, MediaEngine,
    PlayedToEndCallback, PlayerBackend, Status, Subscription,
};
pub use item::TrailerItem;
pub use lifecycle::{LifecycleCallback, LifecycleEvent, LifecycleEventSource};
pub use surface::{Orientation, SurfaceParent, VideoSurface};
pub use thumbnail::ThumbnailImage;
