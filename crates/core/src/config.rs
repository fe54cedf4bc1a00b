//! TOML-based configuration for gitmigrate.
//!
//! Tokens are stored as `*_env` fields that reference environment variable
//! names; the actual secrets are resolved at runtime via
//! [`AppConfig::resolve_env_vars`] and never appear in the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source provider (GitLab) settings.
    pub gitlab: GitLabConfig,

    /// Destination provider (GitHub) settings.
    pub github: GitHubConfig,

    /// Migration run settings.
    pub migrate: MigrateConfig,
}

// ---------------------------------------------------------------------------
// GitLab
// ---------------------------------------------------------------------------

/// Source-side GitLab API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// GitLab API base URL (default `https://gitlab.com/api/v4`).
    #[serde(default = "default_gitlab_api_url")]
    pub api_url: String,

    /// Group whose projects are eligible for migration. Subgroups are
    /// addressed by full path (e.g. `acme/tools`).
    pub group: String,

    /// Environment variable holding the GitLab private token.
    pub token_env: String,

    /// Resolved token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_gitlab_api_url() -> String {
    "https://gitlab.com/api/v4".into()
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

/// Destination-side GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Organization that receives the migrated repositories.
    pub org: String,

    /// Environment variable holding the GitHub personal access token.
    pub token_env: String,

    /// Resolved token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}

// ---------------------------------------------------------------------------
// Migration run
// ---------------------------------------------------------------------------

/// Visibility of repositories created at the destination.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn is_private(self) -> bool {
        self == Self::Private
    }
}

/// Settings for the migration run itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Path to the newline-delimited repository allow-list.
    pub repo_list: PathBuf,

    /// Directory for ephemeral mirror clones. Each repository is cloned to
    /// `<workdir>/<name>.git` and removed before the next one starts.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// Visibility of repositories created at the destination.
    #[serde(default)]
    pub visibility: Visibility,

    /// Directory for run-scoped log files. Console-only logging when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_workdir() -> PathBuf {
    std::env::temp_dir().join("gitmigrate")
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve the `*_env` token fields from environment variables.
    ///
    /// Missing variables are logged here and rejected by
    /// [`validate`](Self::validate), which runs before any network call.
    pub fn resolve_env_vars(&mut self) {
        self.gitlab.token = resolve_optional_env(&self.gitlab.token_env, "gitlab.token_env");
        self.github.token = resolve_optional_env(&self.github.token_env, "github.token_env");
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gitlab.group.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "gitlab.group".into(),
                detail: "GitLab group must not be empty".into(),
            });
        }
        if self.github.org.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "github.org".into(),
                detail: "GitHub organization must not be empty".into(),
            });
        }
        if self.gitlab.token.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::EnvVarMissing {
                var: self.gitlab.token_env.clone(),
                field: "gitlab.token_env".into(),
            });
        }
        if self.github.token.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::EnvVarMissing {
                var: self.github.token_env.clone(),
                field: "github.token_env".into(),
            });
        }
        if self.migrate.repo_list.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "migrate.repo_list".into(),
                detail: "allow-list path must not be empty".into(),
            });
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars();
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[gitlab]
api_url = "https://gitlab.example.com/api/v4"
group = "acme/tools"
token_env = "GITLAB_TOKEN"

[github]
api_url = "https://api.github.com"
org = "acme"
token_env = "GITHUB_TOKEN"

[migrate]
repo_list = "repos.txt"
workdir = "/tmp/gitmigrate-test"
visibility = "public"
log_dir = "/var/log/gitmigrate"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.gitlab.group, "acme/tools");
        assert_eq!(config.github.org, "acme");
        assert_eq!(config.migrate.repo_list, PathBuf::from("repos.txt"));
        assert_eq!(config.migrate.visibility, Visibility::Public);
        assert_eq!(
            config.migrate.log_dir,
            Some(PathBuf::from("/var/log/gitmigrate"))
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.gitlab.api_url, "https://gitlab.example.com/api/v4");
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_validate_rejects_empty_group() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.gitlab.token = Some("glpat-abc".into());
        config.github.token = Some("ghp_abc".into());
        config.gitlab.group = String::new();
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "gitlab.group"
        ));
    }

    #[test]
    fn test_validate_rejects_unresolved_token() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.gitlab.token = Some("glpat-abc".into());
        config.github.token = None;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::EnvVarMissing { ref var, .. }) if var == "GITHUB_TOKEN"
        ));
    }

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("TEST_GM_GL_TOKEN", "glpat-abc");
        std::env::set_var("TEST_GM_GH_TOKEN", "ghp_abc");

        let toml_str = r#"
[gitlab]
group = "acme"
token_env = "TEST_GM_GL_TOKEN"
[github]
org = "acme"
token_env = "TEST_GM_GH_TOKEN"
[migrate]
repo_list = "repos.txt"
"#;
        let mut config: AppConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars();

        assert_eq!(config.gitlab.token.as_deref(), Some("glpat-abc"));
        assert_eq!(config.github.token.as_deref(), Some("ghp_abc"));
        assert!(config.validate().is_ok());

        // Clean up
        std::env::remove_var("TEST_GM_GL_TOKEN");
        std::env::remove_var("TEST_GM_GH_TOKEN");
    }

    #[test]
    fn test_defaults() {
        let minimal = r#"
[gitlab]
group = "acme"
token_env = "GL_TOKEN"
[github]
org = "acme"
token_env = "GH_TOKEN"
[migrate]
repo_list = "repos.txt"
"#;
        let config: AppConfig = toml::from_str(minimal).unwrap();
        assert_eq!(config.gitlab.api_url, "https://gitlab.com/api/v4");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.migrate.workdir, std::env::temp_dir().join("gitmigrate"));
        assert_eq!(config.migrate.visibility, Visibility::Private);
        assert!(config.migrate.log_dir.is_none());
    }
}
