use thiserror::Error;

/// Exit code reported when the container configuration is rejected.
pub const EXIT_CONFIG_ERROR: i32 = 125;

/// Exit code reported for cancellation and every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Autorun error types
#[derive(Error, Debug)]
pub enum AutoRunError {
    /// Quoting error in a label-supplied command line
    #[error("Unclosed quote in command line: {input}")]
    MalformedInput { input: String },

    /// Option value with invalid syntax (network mode, mount spec, ...)
    #[error("invalid {option} value {value:?}: {reason}")]
    InvalidOption {
        option: &'static str,
        value: String,
        reason: String,
    },

    /// Working directory or process environment could not be read
    #[error("environment unavailable: {0}")]
    EnvironmentUnavailable(String),

    /// Image is not present in the local engine store
    #[error("No such image: {0}")]
    NotFound(String),

    /// User declined the confirmation prompt
    #[error("canceled")]
    Canceled,

    /// Confirmation prompt could not be read
    #[error("failed to read confirmation: {0}")]
    InputError(String),

    /// Container configuration rejected before running
    #[error("{0}")]
    ConfigError(String),

    /// Image reference could not be parsed
    #[error("invalid reference format: {0}")]
    InvalidReference(String),

    /// Engine command failed
    #[error("{command} failed: {message}")]
    Engine { command: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AutoRunError {
    /// Build an [`AutoRunError::InvalidOption`].
    pub fn invalid_option(
        option: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AutoRunError::InvalidOption {
            option,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            AutoRunError::ConfigError(_) => EXIT_CONFIG_ERROR,
            _ => EXIT_FAILURE,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AutoRunError::NotFound(_))
    }
}

impl From<serde_json::Error> for AutoRunError {
    fn from(err: serde_json::Error) -> Self {
        AutoRunError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AutoRunError {
    fn from(err: serde_yaml::Error) -> Self {
        AutoRunError::Serialization(err.to_string())
    }
}

/// Result type alias for autorun operations
pub type Result<T> = std::result::Result<T, AutoRunError>;
