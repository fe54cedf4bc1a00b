//! Error types for the gitmigrate core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and the
//! top-level [`MigrateError`] unifies the kinds that abort a run. Transfer
//! errors ([`GitError`]) are deliberately excluded from [`MigrateError`]:
//! they are handled per candidate and never terminate the run.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Fatal error for a migration run.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    GitLab(#[from] GitLabError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// I/O failure preparing the local workspace directory.
    #[error("workspace I/O error: {0}")]
    Workspace(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration and allow-list loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config or allow-list file not found.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set (or is empty).
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing {
        var: String,
        field: String,
    },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading a configuration input.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// GitLab API errors
// ---------------------------------------------------------------------------

/// Errors from the source-side GitLab REST API.
#[derive(Debug, Error)]
pub enum GitLabError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("GitLab HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("GitLab API error (HTTP {status}): {body}")]
    ApiError {
        status: u16,
        body: String,
    },

    /// Private token is missing or invalid.
    #[error("GitLab authentication failed: {0}")]
    AuthenticationFailed(String),
}

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from the destination-side GitHub REST API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("GitHub HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("GitHub API error (HTTP {status}): {body}")]
    ApiError {
        status: u16,
        body: String,
    },

    /// Authentication token is missing or invalid.
    #[error("GitHub authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded.
    #[error("GitHub rate limit exceeded, resets at {reset_at}")]
    RateLimited {
        reset_at: String,
    },
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from `git` CLI operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// A `git` command exited with a non-zero status.
    #[error("git command failed (exit {exit_code}): {stderr}")]
    CommandFailed {
        exit_code: i32,
        stderr: String,
    },

    /// A clone URL that cannot carry credentials.
    #[error("invalid clone URL: {0}")]
    InvalidUrl(String),

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
