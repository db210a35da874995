// Adapters layer: concrete audio sinks behind the `AudioSink` port.

pub mod http_probe;
pub mod simulated;

pub use http_probe::ProbingSink;
pub use simulated::{AutoplayPolicy, SimulatedSink, SinkEvent};
