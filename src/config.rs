use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Playback tunables. Embedders typically keep the defaults; the struct
/// derives serde so it can live inside a host application's own config
/// file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailerConfig {
    /// Cadence of playback-time updates while playing, in milliseconds.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// Overall timeout for the thumbnail fetch, in seconds.
    #[serde(default = "default_thumbnail_timeout_secs")]
    pub thumbnail_timeout_secs: u64,
}

impl TrailerConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn thumbnail_timeout(&self) -> Duration {
        Duration::from_secs(self.thumbnail_timeout_secs)
    }
}

impl Default for TrailerConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: default_progress_interval_ms(),
            thumbnail_timeout_secs: default_thumbnail_timeout_secs(),
        }
    }
}

fn default_progress_interval_ms() -> u64 {
    100
}

fn default_thumbnail_timeout_secs() -> u64 {
    10
}
