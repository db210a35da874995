use crate::domain::model::Track;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The single audio source the coordinator drives.
///
/// `play` names the track the coordinator expects to hear, which is the one
/// most recently passed to `load`. It is the only operation the environment
/// may refuse. Implementations report that as
/// [`PlayerError::PlaybackRejected`], and an unreachable locator as
/// [`PlayerError::ResourceLoad`].
///
/// [`PlayerError::PlaybackRejected`]: crate::utils::error::PlayerError::PlaybackRejected
/// [`PlayerError::ResourceLoad`]: crate::utils::error::PlayerError::ResourceLoad
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn load(&self, track: &Track) -> Result<()>;
    async fn play(&self, track: &Track) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn set_muted(&self, muted: bool) -> Result<()>;
    async fn set_volume(&self, volume: f32) -> Result<()>;
}

#[async_trait]
impl<T: AudioSink + ?Sized> AudioSink for Arc<T> {
    async fn load(&self, track: &Track) -> Result<()> {
        (**self).load(track).await
    }

    async fn play(&self, track: &Track) -> Result<()> {
        (**self).play(track).await
    }

    async fn pause(&self) -> Result<()> {
        (**self).pause().await
    }

    async fn set_muted(&self, muted: bool) -> Result<()> {
        (**self).set_muted(muted).await
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        (**self).set_volume(volume).await
    }
}

pub trait PlayerSettings: Send + Sync {
    fn volume(&self) -> f32;
    fn resume_on_interaction(&self) -> bool;
    fn tracks(&self) -> &[Track];
    fn seed(&self) -> Option<u64>;
}
