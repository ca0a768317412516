use std::io::Cursor;
use std::time::Duration;

use image::ImageReader;
use once_cell::sync::Lazy;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::engine::Subscription;

static SHARED_CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// Platform-agnostic thumbnail image: the original encoded bytes plus
/// the decoded dimensions, so hosts can hand the data straight to their
/// own texture pipeline.
#[derive(Clone)]
pub struct ThumbnailImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: String, // "jpeg", "png", "webp", etc.
}

#[derive(Debug, Error)]
pub(crate) enum ThumbnailError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unrecognized image data: {0}")]
    Sniff(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Best-effort placeholder fetch. At most one image per fetch; failures
/// are logged and dropped without surfacing anywhere else.
pub(crate) struct ThumbnailLoader {
    client: Client,
}

impl ThumbnailLoader {
    pub(crate) fn new(timeout: Duration) -> Self {
        let client = match Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(err) => {
                warn!("falling back to shared http client: {err}");
                SHARED_CLIENT.clone()
            }
        };
        Self { client }
    }

    /// Fetch `url` in the background, invoking `on_loaded` on success.
    /// Cancelling the returned token aborts the fetch; a completion that
    /// races the cancellation is discarded by the caller's epoch check.
    pub(crate) fn spawn_fetch(
        &self,
        url: Url,
        on_loaded: impl FnOnce(ThumbnailImage) + Send + 'static,
    ) -> Subscription {
        let client = self.client.clone();
        let handle = tokio::spawn(async move {
            match fetch(&client, &url).await {
                Ok(image) => {
                    debug!(
                        "thumbnail loaded: {}x{} {}",
                        image.width, image.height, image.format
                    );
                    on_loaded(image);
                }
                Err(err) => debug!("thumbnail fetch dropped: {err}"),
            }
        });
        Subscription::new(move || handle.abort())
    }
}

async fn fetch(client: &Client, url: &Url) -> Result<ThumbnailImage, ThumbnailError> {
    let bytes = client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    decode(&bytes)
}

fn decode(bytes: &[u8]) -> Result<ThumbnailImage, ThumbnailError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader
        .format()
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("unknown")
        .to_string();
    let decoded = reader.decode()?;
    Ok(ThumbnailImage {
        data: bytes.to_vec(),
        width: decoded.width(),
        height: decoded.height(),
        format,
    })
}
