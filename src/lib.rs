pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::PlayerConfig;

pub use adapters::{AutoplayPolicy, ProbingSink, SimulatedSink, SinkEvent};
pub use core::{
    bus::{BroadcastBus, Delivery, Signal, Subscription},
    coordinator::{AudioCoordinator, CoordinatorOptions},
    engine::{AudioEngine, EngineHandle},
    playlist::Playlist,
};
pub use utils::error::{PlayerError, Result};
