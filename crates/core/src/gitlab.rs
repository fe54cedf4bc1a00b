//! GitLab REST API client (source provider).

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::errors::GitLabError;

/// A GitLab project as returned by the group projects listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabProject {
    pub id: u64,
    pub name: String,
    pub path: String,
    /// Full path including namespace (e.g. `acme/tools/alpha`).
    pub path_with_namespace: String,
    /// HTTP clone URL.
    pub http_url_to_repo: String,
}

/// Page size for group project listings (GitLab caps at 100).
const PER_PAGE: usize = 100;

/// Asynchronous GitLab REST API client.
#[derive(Clone)]
pub struct GitLabClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitLabClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("gitmigrate/0.1"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("failed to build reqwest client");
        info!(api_url = %api_url, "created GitLabClient");
        Self {
            http,
            api_url,
            token: token.into(),
        }
    }

    /// List every project of `group`, following pagination to completion.
    #[instrument(skip(self))]
    pub async fn list_group_projects(
        &self,
        group: &str,
    ) -> Result<Vec<GitLabProject>, GitLabError> {
        let url = format!(
            "{}/groups/{}/projects",
            self.api_url,
            encode_group_path(group)
        );

        let mut projects = Vec::new();
        let mut page: u32 = 1;
        loop {
            let resp = self
                .http
                .get(&url)
                .header("PRIVATE-TOKEN", &self.token)
                .query(&[
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await?;
            self.check_response(&resp)?;

            // GitLab sends `x-next-page` on every page; it is empty on the
            // last one. Servers that omit it entirely still terminate on a
            // short page.
            let next_page = resp
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u32>().ok());

            let batch: Vec<GitLabProject> = resp.json().await?;
            debug!(page, count = batch.len(), "fetched project page");
            let batch_len = batch.len();
            projects.extend(batch);

            match next_page {
                Some(n) => page = n,
                None if batch_len < PER_PAGE => break,
                None => page += 1,
            }
        }

        debug!(group, count = projects.len(), "listed group projects");
        Ok(projects)
    }

    fn check_response(&self, resp: &reqwest::Response) -> Result<(), GitLabError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GitLabError::AuthenticationFailed(format!(
                "HTTP {}",
                status
            )));
        }
        Err(GitLabError::ApiError {
            status: status.as_u16(),
            body: format!("HTTP {}", status),
        })
    }
}

/// GitLab addresses groups by URL-encoded full path
/// (`acme/tools` → `acme%2Ftools`).
fn encode_group_path(group: &str) -> String {
    group.replace('/', "%2F")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_group_path() {
        assert_eq!(encode_group_path("acme"), "acme");
        assert_eq!(encode_group_path("acme/tools"), "acme%2Ftools");
        assert_eq!(encode_group_path("a/b/c"), "a%2Fb%2Fc");
    }
}
