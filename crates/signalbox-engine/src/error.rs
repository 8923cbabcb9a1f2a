//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup, the run and
//! teardown, so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: signalbox_core::config::ConfigError,
    },

    /// The light timing could not be built.
    #[error("timing error: {source}")]
    Timing {
        /// The underlying timing error.
        #[from]
        source: signalbox_core::timing::TimingError,
    },

    /// A light failed to start or stop.
    #[error("light error: {source}")]
    Light {
        /// The underlying light error.
        #[from]
        source: signalbox_core::light::LightError,
    },

    /// A vehicle task could not be joined.
    #[error("vehicle task error: {message}")]
    Vehicle {
        /// Description of the join failure.
        message: String,
    },

    /// The run summary could not be serialized.
    #[error("summary error: {source}")]
    Summary {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
