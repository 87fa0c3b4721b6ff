//! HTTP client for the landmark sidecar.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use sentinel_models::LandmarkFrame;
use sentinel_vision::{Frame, LandmarkSource, VisionError, VisionResult};
use tokio::runtime::Handle;
use tracing::debug;

use crate::config::LandmarkServiceConfig;
use crate::error::{WorkerError, WorkerResult};

/// Sends each frame as a JPEG to the sidecar and parses the landmarks it
/// returns.
///
/// Requests run on the captured runtime handle, so `estimate` must be called
/// from a thread outside the runtime's async workers (for example inside
/// `spawn_blocking`).
pub struct HttpLandmarkSource {
    client: Client,
    url: String,
    jpeg_quality: u8,
    handle: Handle,
}

impl HttpLandmarkSource {
    pub fn new(config: &LandmarkServiceConfig, handle: Handle) -> WorkerResult<Self> {
        reqwest::Url::parse(&config.url)
            .map_err(|e| WorkerError::landmark_service(format!("{}: {e}", config.url)))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(concat!("sentinel-worker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            jpeg_quality: config.jpeg_quality,
            handle,
        })
    }

    async fn request(&self, jpeg: Vec<u8>) -> Result<LandmarkFrame, reqwest::Error> {
        self.client
            .post(&self.url)
            .header(CONTENT_TYPE, "image/jpeg")
            .body(jpeg)
            .send()
            .await?
            .error_for_status()?
            .json::<LandmarkFrame>()
            .await
    }
}

impl LandmarkSource for HttpLandmarkSource {
    fn estimate(&mut self, frame: &Frame) -> VisionResult<LandmarkFrame> {
        let jpeg = frame.encode_jpeg(self.jpeg_quality)?;
        let landmarks = self
            .handle
            .block_on(self.request(jpeg))
            .map_err(|e| VisionError::landmarks(format!("{}: {e}", self.url)))?;
        debug!(
            person = landmarks.has_person(),
            face = landmarks.face.is_some(),
            "Landmarks received"
        );
        Ok(landmarks)
    }
}
