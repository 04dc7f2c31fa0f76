use thiserror::Error;

/// Main error type for the Corral supervisor
#[derive(Debug, Error)]
pub enum CorralError {
    // Process-related errors
    #[error("Failed to launch process: {0}")]
    Launch(String),

    #[error("Failed to terminate process {0}: {1}")]
    Terminate(String, String),

    #[error("Process {0} (pid {1}) still alive after {2} termination attempts")]
    Unkillable(String, u32, u32),

    #[error("Signal error: {0}")]
    Signal(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Missing required configuration field: {0}")]
    MissingConfigField(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Corral operations
pub type Result<T> = std::result::Result<T, CorralError>;
