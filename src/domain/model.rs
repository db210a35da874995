use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub url: String,
}

impl Track {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Identifies one play attempt. Ids grow monotonically per coordinator, so a
/// resolution carrying an older id is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

/// What asked for playback to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayOrigin {
    Consent,
    Toggle,
    Skip,
    AutoAdvance,
    Unmute,
    Resume,
    Interaction,
}

impl PlayOrigin {
    /// Resume-type requests fall back to the suppressed state when rejected.
    pub fn is_resume(self) -> bool {
        matches!(self, Self::Resume | Self::Interaction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayRequest {
    pub id: RequestId,
    pub origin: PlayOrigin,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PauseReason {
    User,
    Suppression,
    /// The environment refused to start playback.
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum Phase {
    Idle,
    Pending { request: PlayRequest },
    Playing,
    Paused { reason: PauseReason },
}

impl Phase {
    pub fn paused(reason: PauseReason) -> Self {
        Self::Paused { reason }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Pending { .. } | Self::Playing)
    }

    pub fn pending_request(&self) -> Option<PlayRequest> {
        match self {
            Self::Pending { request } => Some(*request),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    pub current_index: usize,
    pub phase: Phase,
    pub muted: bool,
    pub was_playing_before_suppression: bool,
    pub consent_given: bool,
    pub resume_armed: bool,
    pub volume: f32,
}

impl PlaybackState {
    pub fn new(volume: f32) -> Self {
        Self {
            current_index: 0,
            phase: Phase::Idle,
            muted: false,
            was_playing_before_suppression: false,
            consent_given: false,
            resume_armed: false,
            volume,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase.is_playing()
    }
}

/// Instruction for whatever owns the real audio source.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load { index: usize, track: Track },
    Play { request: RequestId, track: Track },
    Pause,
    SetMuted(bool),
    SetVolume(f32),
}

/// How a play attempt resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    Rejected(String),
    LoadFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub index: usize,
    pub title: String,
    pub url: String,
    pub phase: Phase,
    pub playing: bool,
    pub muted: bool,
    pub consent_given: bool,
    pub volume: f32,
}
