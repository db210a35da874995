pub mod toml_config;

pub use toml_config::PlayerConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "vinyl-deck")]
#[command(about = "Console for the background music player")]
pub struct CliConfig {
    #[arg(long, help = "Path to a TOML player configuration")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Seed for a reproducible shuffle")]
    pub seed: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Print status and logs as JSON")]
    pub json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Reads the configured file, or the built-in defaults when none is given.
    pub fn load_player_config(&self) -> Result<PlayerConfig> {
        let config = match &self.config {
            Some(path) => PlayerConfig::from_file(path)?,
            None => PlayerConfig::default(),
        };
        Ok(config.with_seed(self.seed))
    }
}
