use gymway_core::{IdentityError, LocalCacheError, RemoteError, ValidationError};

use crate::config::ConfigError;

/// Errors surfaced by `gym` commands.
#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Cache(LocalCacheError),
    Identity(IdentityError),
    Remote(RemoteError),
    Validation(ValidationError),
    Io(std::io::Error),
    /// A background task panicked or was cancelled.
    Task(tokio::task::JoinError),
    NotSignedIn,
    /// An action finished with an error message in the view state.
    Failed(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Cache(e) => write!(f, "Local cache error: {}", e),
            CliError::Identity(e) => write!(f, "{}", e),
            CliError::Remote(e) => write!(f, "{}", e),
            CliError::Validation(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Task(e) => write!(f, "Background task failed: {}", e),
            CliError::NotSignedIn => {
                write!(f, "Not signed in. Run 'gym auth login <email>' first.")
            }
            CliError::Failed(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Cache(e) => Some(e),
            CliError::Identity(e) => Some(e),
            CliError::Remote(e) => Some(e),
            CliError::Validation(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Task(e) => Some(e),
            CliError::NotSignedIn | CliError::Failed(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<LocalCacheError> for CliError {
    fn from(e: LocalCacheError) -> Self {
        CliError::Cache(e)
    }
}

impl From<IdentityError> for CliError {
    fn from(e: IdentityError) -> Self {
        CliError::Identity(e)
    }
}

impl From<RemoteError> for CliError {
    fn from(e: RemoteError) -> Self {
        CliError::Remote(e)
    }
}

impl From<ValidationError> for CliError {
    fn from(e: ValidationError) -> Self {
        CliError::Validation(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<tokio::task::JoinError> for CliError {
    fn from(e: tokio::task::JoinError) -> Self {
        CliError::Task(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Failed(format!("Failed to format output: {}", e))
    }
}

impl From<String> for CliError {
    fn from(message: String) -> Self {
        CliError::Failed(message)
    }
}
