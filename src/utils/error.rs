use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Playback rejected: {reason}")]
    PlaybackRejected { reason: String },

    #[error("Failed to load track {url}: {message}")]
    ResourceLoad { url: String, message: String },

    #[error("Handler for '{signal}' failed: {message}")]
    Handler { signal: String, message: String },

    #[error("Playlist has no tracks")]
    EmptyPlaylist,

    #[error("Audio engine is no longer running")]
    EngineClosed,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Playback,
    Resource,
    Bus,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PlayerError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::PlaybackRejected {
            reason: reason.into(),
        }
    }

    pub fn resource(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResourceLoad {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PlaybackRejected { .. } => ErrorCategory::Playback,
            Self::ResourceLoad { .. } | Self::HttpError(_) => ErrorCategory::Resource,
            Self::Handler { .. } => ErrorCategory::Bus,
            Self::EmptyPlaylist
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::EngineClosed | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    /// Nothing here is fatal to playback; severity only drives logging and
    /// the CLI exit code.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Playback | ErrorCategory::Bus => ErrorSeverity::Low,
            ErrorCategory::Resource => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::PlaybackRejected { .. } => {
                "Interact with the player (toggle, next or unmute) to start playback"
            }
            Self::ResourceLoad { .. } | Self::HttpError(_) => {
                "Check that the track URL is reachable; the player skips to the next track"
            }
            Self::Handler { .. } => "Inspect the failing subscriber; other subscribers were notified",
            Self::EmptyPlaylist => "Add at least one [[tracks]] entry or remove the section",
            Self::EngineClosed => "Restart the player",
            Self::IoError(_) => "Check that the file exists and is readable",
            Self::SerializationError(_) => "Report this as a bug",
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => "Fix the configuration file and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::PlaybackRejected { .. } => {
                "The environment blocked audio playback".to_string()
            }
            Self::ResourceLoad { url, .. } => format!("Could not load track at {}", url),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            Self::MissingConfigError { field } => format!("Missing setting '{}'", field),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
