use crate::domain::model::Track;
use crate::domain::ports::AudioSink;
use crate::utils::error::{PlayerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How the simulated environment treats `play` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoplayPolicy {
    #[default]
    Allow,
    /// Reject until [`SimulatedSink::unlock`] records a user gesture.
    RequireGesture,
    Deny,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Loaded(String),
    Played(String),
    Rejected(String),
    Paused,
    Muted(bool),
    Volume(f32),
}

#[derive(Debug, Default)]
struct SinkState {
    loaded: Option<Track>,
    playing: bool,
    muted: bool,
    volume: f32,
    unlocked: bool,
    // bumped by every load and pause; an in-flight play from an older
    // generation is interrupted
    generation: u64,
    events: Vec<SinkEvent>,
}

/// In-memory audio source with a scriptable environment.
#[derive(Debug)]
pub struct SimulatedSink {
    policy: AutoplayPolicy,
    latency: Duration,
    track_latency: HashMap<String, Duration>,
    unreachable: HashSet<String>,
    state: Mutex<SinkState>,
}

impl SimulatedSink {
    pub fn new(policy: AutoplayPolicy) -> Self {
        Self {
            policy,
            latency: Duration::ZERO,
            track_latency: HashMap::new(),
            unreachable: HashSet::new(),
            state: Mutex::new(SinkState::default()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_track_latency(mut self, url: impl Into<String>, latency: Duration) -> Self {
        self.track_latency.insert(url.into(), latency);
        self
    }

    pub fn with_unreachable(mut self, url: impl Into<String>) -> Self {
        self.unreachable.insert(url.into());
        self
    }

    pub fn unlock(&self) {
        self.lock().unlocked = true;
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.lock().events.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn is_muted(&self) -> bool {
        self.lock().muted
    }

    pub fn volume(&self) -> f32 {
        self.lock().volume
    }

    pub fn loaded(&self) -> Option<Track> {
        self.lock().loaded.clone()
    }

    pub fn play_count(&self) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Played(_)))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reject(state: &mut SinkState, track: &Track, reason: &str) -> PlayerError {
        state.events.push(SinkEvent::Rejected(track.title.clone()));
        PlayerError::rejected(reason)
    }
}

impl Default for SimulatedSink {
    fn default() -> Self {
        Self::new(AutoplayPolicy::Allow)
    }
}

#[async_trait]
impl AudioSink for SimulatedSink {
    async fn load(&self, track: &Track) -> Result<()> {
        if self.unreachable.contains(&track.url) {
            return Err(PlayerError::resource(&track.url, "404 Not Found"));
        }
        let mut state = self.lock();
        state.generation += 1;
        state.playing = false;
        state.loaded = Some(track.clone());
        state.events.push(SinkEvent::Loaded(track.title.clone()));
        Ok(())
    }

    async fn play(&self, track: &Track) -> Result<()> {
        let generation = self.lock().generation;

        let latency = self
            .track_latency
            .get(&track.url)
            .copied()
            .unwrap_or(self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        if state.generation != generation {
            return Err(Self::reject(
                &mut state,
                track,
                "the play() request was interrupted",
            ));
        }
        if state.loaded.as_ref().map(|t| t.url.as_str()) != Some(track.url.as_str()) {
            return Err(Self::reject(&mut state, track, "source is not loaded"));
        }
        match self.policy {
            AutoplayPolicy::Deny => {
                return Err(Self::reject(&mut state, track, "autoplay is disabled"));
            }
            AutoplayPolicy::RequireGesture if !state.unlocked => {
                return Err(Self::reject(
                    &mut state,
                    track,
                    "play() requires a user gesture first",
                ));
            }
            _ => {}
        }
        state.playing = true;
        state.events.push(SinkEvent::Played(track.title.clone()));
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let mut state = self.lock();
        state.generation += 1;
        state.playing = false;
        state.events.push(SinkEvent::Paused);
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<()> {
        let mut state = self.lock();
        state.muted = muted;
        state.events.push(SinkEvent::Muted(muted));
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        let mut state = self.lock();
        state.volume = volume;
        state.events.push(SinkEvent::Volume(volume));
        Ok(())
    }
}
