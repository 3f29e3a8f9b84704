//! Error types for the deployer
//!
//! Every failure inside deploy, destroy and update is terminal for that
//! invocation and is surfaced to the caller verbatim. Status never returns
//! these directly; each sub-check folds its error into its own finding.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Local workspace could not be created or written
    #[error("Workspace setup failed: {0}")]
    SetupError(String),

    /// Credential rejected by the Git remote or the cluster
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Clone, commit or push failure
    #[error("Git error: {0}")]
    GitError(String),

    /// Manifest materialization failure
    #[error("Failed to render manifests: {0}")]
    RenderError(String),

    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// A required resource does not exist
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Invalid process configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid operation argument
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    TaskError(String),
}

impl Error {
    /// Short stable label for the error category, used in metrics and API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Error::SetupError(_) => "setup",
            Error::AuthError(_) => "auth",
            Error::GitError(_) => "git",
            Error::RenderError(_) => "render",
            Error::KubeError(_) => "kube",
            Error::NotFoundError(_) => "not_found",
            Error::ConfigError(_) => "config",
            Error::ValidationError(_) => "validation",
            Error::TaskError(_) => "task",
        }
    }
}

impl From<git2::Error> for Error {
    fn from(e: git2::Error) -> Self {
        if e.code() == git2::ErrorCode::Auth {
            Error::AuthError(e.message().to_string())
        } else {
            Error::GitError(e.message().to_string())
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::TaskError(e.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
