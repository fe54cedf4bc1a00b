//! GitHub REST API client (destination provider).

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::errors::GitHubError;

/// A GitHub repository, as returned by the get and create endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    /// Canonical HTTP clone URL.
    pub clone_url: String,
    pub private: bool,
}

/// Result of a repository create call.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    /// Repository created (HTTP 201).
    Created(GitHubRepo),
    /// A same-named repository appeared between the existence check and the
    /// create call (HTTP 422 name conflict).
    AlreadyExists,
}

/// Asynchronous GitHub REST API client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("gitmigrate/0.1"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("failed to build reqwest client");
        info!(api_url = %api_url, "created GitHubClient");
        Self {
            http,
            api_url,
            token: token.into(),
        }
    }

    /// Fetch a repository by org and name, distinguishing absence (404)
    /// from failure.
    #[instrument(skip(self))]
    pub async fn get_repo(
        &self,
        org: &str,
        name: &str,
    ) -> Result<Option<GitHubRepo>, GitHubError> {
        let url = format!("{}/repos/{}/{}", self.api_url, org, name);
        let resp = self.http.get(&url).bearer_auth(&self.token).send().await?;

        if resp.status().as_u16() == 404 {
            debug!(org, name, "repository not found at destination");
            return Ok(None);
        }
        self.check_response(&resp)?;
        let repo: GitHubRepo = resp.json().await?;
        debug!(org, name = %repo.name, "fetched repository");
        Ok(Some(repo))
    }

    /// Create a repository under `org`.
    ///
    /// A 422 name conflict is reported as [`CreateOutcome::AlreadyExists`]
    /// rather than an error; every other non-success status is.
    #[instrument(skip(self))]
    pub async fn create_org_repo(
        &self,
        org: &str,
        name: &str,
        private: bool,
    ) -> Result<CreateOutcome, GitHubError> {
        let url = format!("{}/orgs/{}/repos", self.api_url, org);
        let payload = serde_json::json!({
            "name": name,
            "private": private,
            "auto_init": false,
        });
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        if resp.status().as_u16() == 422 {
            info!(org, name, "create conflicted, repository already exists");
            return Ok(CreateOutcome::AlreadyExists);
        }
        self.check_response(&resp)?;
        let repo: GitHubRepo = resp.json().await?;
        info!(org, name, private, "created repository");
        Ok(CreateOutcome::Created(repo))
    }

    fn check_response(&self, resp: &reqwest::Response) -> Result<(), GitHubError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GitHubError::AuthenticationFailed(format!(
                "HTTP {}",
                status
            )));
        }
        if status.as_u16() == 429 {
            let reset = resp
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            return Err(GitHubError::RateLimited { reset_at: reset });
        }
        Err(GitHubError::ApiError {
            status: status.as_u16(),
            body: format!("HTTP {}", status),
        })
    }
}
