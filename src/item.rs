use serde::{Deserialize, Serialize};
use url::Url;

/// One trailer to play: media and thumbnail sources plus playback flags.
///
/// Immutable once handed to the player; replacing it tears the prior
/// session down fully before the new one starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailerItem {
    #[serde(default)]
    pub video_url: Option<Url>,

    #[serde(default)]
    pub thumbnail_url: Option<Url>,

    /// Start playing as soon as the session is up.
    #[serde(default = "default_true")]
    pub auto_play: bool,

    /// Loop forever on natural end instead of notifying the delegate.
    #[serde(default)]
    pub auto_replay: bool,

    /// Start muted.
    #[serde(default = "default_true")]
    pub mute: bool,
}

impl TrailerItem {
    /// Item with the default flags: auto-play on, replay off, muted.
    pub fn new(video_url: Option<Url>, thumbnail_url: Option<Url>) -> Self {
        Self {
            video_url,
            thumbnail_url,
            auto_play: default_true(),
            auto_replay: false,
            mute: default_true(),
        }
    }

    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }

    pub fn with_auto_replay(mut self, auto_replay: bool) -> Self {
        self.auto_replay = auto_replay;
        self
    }

    pub fn with_mute(mut self, mute: bool) -> Self {
        self.mute = mute;
        self
    }
}

fn default_true() -> bool {
    true
}
