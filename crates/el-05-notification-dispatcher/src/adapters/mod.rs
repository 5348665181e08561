//! Sink adapters.

pub mod logging_sink;
pub mod recording_sink;

pub use logging_sink::LoggingSink;
pub use recording_sink::RecordingSink;
