pub mod bus;
pub mod coordinator;
pub mod engine;
pub mod playlist;

pub use crate::domain::model::{Command, Phase, PlaybackState, PlayerStatus, Track};
pub use crate::domain::ports::{AudioSink, PlayerSettings};
pub use crate::utils::error::Result;
