use crate::thumbnail::ThumbnailImage;

/// Container the render surface is currently parented into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceParent {
    /// The surface's normal, embedded container.
    Inline,
    /// The host's top-level window.
    Fullscreen,
}

/// Best-effort device orientation hint for fullscreen transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Injected render-surface capability.
///
/// The host owns the actual visual tree; this contract is the full extent
/// of what the playback core asks of it. All calls arrive from the
/// controller loop. `reparent` must be atomic from the caller's
/// perspective: the surface is never attached to two containers at once.
/// Hosts are expected to apply thumbnails with a brief cross-fade.
pub trait VideoSurface: Send + Sync {
    /// Show or hide the video render surface. Starts hidden; revealed
    /// when the engine reports the item ready.
    fn set_video_hidden(&self, hidden: bool);

    /// Start or stop the loading indicator.
    fn set_loading(&self, animating: bool);

    /// Apply or clear the placeholder thumbnail.
    fn set_thumbnail(&self, image: Option<ThumbnailImage>);

    fn reparent(&self, parent: SurfaceParent);

    /// Ask the host to rotate the device. A hint, not a guarantee.
    fn request_orientation(&self, orientation: Orientation);
}
