use crate::adapters::AutoplayPolicy;
use crate::core::coordinator::DEFAULT_VOLUME;
use crate::core::playlist::default_tracks;
use crate::domain::model::Track;
use crate::domain::ports::PlayerSettings;
use crate::utils::error::{PlayerError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_PROBE_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub player: PlayerSection,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default = "default_tracks")]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerSection {
    pub volume: Option<f32>,
    pub resume_on_interaction: Option<bool>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub enabled: bool,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub autoplay: Option<AutoplayPolicy>,
    pub latency_ms: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            player: PlayerSection::default(),
            probe: ProbeConfig::default(),
            simulation: SimulationConfig::default(),
            tracks: default_tracks(),
        }
    }
}

impl PlayerConfig {
    /// Reads and parses a player config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PlayerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses a config document after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PlayerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PlayerError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.player.seed = seed;
        }
        self
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(volume) = self.player.volume {
            validation::validate_range("player.volume", volume, 0.0, 1.0)?;
        }

        if let Some(timeout) = self.probe.timeout_seconds {
            validation::validate_positive_number("probe.timeout_seconds", timeout, 1)?;
        }

        if self.tracks.is_empty() {
            return Err(PlayerError::MissingConfigError {
                field: "tracks".to_string(),
            });
        }

        for (i, track) in self.tracks.iter().enumerate() {
            validation::validate_non_empty_string(&format!("tracks[{}].title", i), &track.title)?;
            validation::validate_url(&format!("tracks[{}].url", i), &track.url)?;
        }

        Ok(())
    }

    pub fn probe_enabled(&self) -> bool {
        self.probe.enabled
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(
            self.probe
                .timeout_seconds
                .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECONDS),
        )
    }

    pub fn autoplay(&self) -> AutoplayPolicy {
        self.simulation.autoplay.unwrap_or_default()
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.simulation.latency_ms.unwrap_or(0))
    }
}

impl PlayerSettings for PlayerConfig {
    fn volume(&self) -> f32 {
        self.player.volume.unwrap_or(DEFAULT_VOLUME)
    }

    fn resume_on_interaction(&self) -> bool {
        self.player.resume_on_interaction.unwrap_or(true)
    }

    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn seed(&self) -> Option<u64> {
        self.player.seed
    }
}

impl Validate for PlayerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
