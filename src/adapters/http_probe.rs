use crate::domain::model::Track;
use crate::domain::ports::AudioSink;
use crate::utils::error::{PlayerError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

/// Checks that a track locator answers before handing it to the wrapped sink,
/// so dead links surface as [`PlayerError::ResourceLoad`] and get skipped.
pub struct ProbingSink<S: AudioSink> {
    inner: S,
    client: Client,
}

impl<S: AudioSink> ProbingSink<S> {
    pub fn new(inner: S, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { inner, client })
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub async fn probe(&self, track: &Track) -> Result<()> {
        tracing::debug!("Probing track locator: {}", track.url);
        let to_load_error = |e: reqwest::Error| PlayerError::resource(&track.url, e.to_string());

        let mut response = self
            .client
            .head(&track.url)
            .send()
            .await
            .map_err(to_load_error)?;

        // some CDNs refuse HEAD; ask for a single byte instead
        if response.status() == StatusCode::METHOD_NOT_ALLOWED {
            response = self
                .client
                .get(&track.url)
                .header(header::RANGE, "bytes=0-0")
                .send()
                .await
                .map_err(to_load_error)?;
        }

        let status = response.status();
        tracing::debug!("Probe response status: {}", status);
        if !status.is_success() {
            return Err(PlayerError::resource(&track.url, format!("HTTP {}", status)));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: AudioSink> AudioSink for ProbingSink<S> {
    async fn load(&self, track: &Track) -> Result<()> {
        self.probe(track).await?;
        self.inner.load(track).await
    }

    async fn play(&self, track: &Track) -> Result<()> {
        self.inner.play(track).await
    }

    async fn pause(&self) -> Result<()> {
        self.inner.pause().await
    }

    async fn set_muted(&self, muted: bool) -> Result<()> {
        self.inner.set_muted(muted).await
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.inner.set_volume(volume).await
    }
}
