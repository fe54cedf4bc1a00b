//! Migration engine — inventory, destination reconciliation, mirror
//! transfer.
//!
//! A run walks three strictly sequential stages:
//!
//! 1. Resolve candidates: list the source group's projects, filter to the
//!    allow-list.
//! 2. Reconcile destination: per candidate, skip if a same-named repository
//!    already exists, create it otherwise.
//! 3. Transfer: mirror-clone from source, mirror-push to destination,
//!    remove the local workspace.
//!
//! Inventory and reconciliation errors abort the run -- an incomplete view
//! of what to migrate, or ambiguity about destination state, is unsafe to
//! act on. Transfer errors are recorded per candidate and the loop moves on.

use std::path::Path;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::allow_list::AllowList;
use crate::config::AppConfig;
use crate::errors::{GitError, GitHubError, GitLabError, MigrateError};
use crate::git::{authenticated_url, GitMirror};
use crate::github::{CreateOutcome, GitHubClient};
use crate::gitlab::GitLabClient;
use crate::models::{
    MigrationCandidate, PlanEntry, ReconcileAction, RunSummary, TransferFailure,
};

/// Username placed in the userinfo slot of authenticated GitLab clone URLs.
const GITLAB_URL_USER: &str = "oauth2";
/// Username placed in the userinfo slot of authenticated GitHub clone URLs.
const GITHUB_URL_USER: &str = "x-access-token";

/// Orchestrates a one-shot migration run.
///
/// Holds the read-once configuration and the three external collaborators;
/// candidates are processed one at a time, never concurrently.
pub struct MigrationEngine {
    config: AppConfig,
    gitlab: GitLabClient,
    github: GitHubClient,
    git: GitMirror,
}

impl MigrationEngine {
    pub fn new(
        config: AppConfig,
        gitlab: GitLabClient,
        github: GitHubClient,
        git: GitMirror,
    ) -> Self {
        Self {
            config,
            gitlab,
            github,
            git,
        }
    }

    /// Inventory stage: every allow-listed project of the source group.
    ///
    /// Output order follows the provider's listing order. Allow-list names
    /// absent from the source produce no candidate and no error.
    #[instrument(skip_all)]
    pub async fn resolve_candidates(
        &self,
        allow_list: &AllowList,
    ) -> Result<Vec<MigrationCandidate>, GitLabError> {
        info!(group = %self.config.gitlab.group, "resolving migration candidates");
        let projects = self
            .gitlab
            .list_group_projects(&self.config.gitlab.group)
            .await?;
        let listed = projects.len();

        let candidates: Vec<MigrationCandidate> = projects
            .into_iter()
            .filter(|p| allow_list.contains(&p.name))
            .map(|p| MigrationCandidate::new(p.name, p.http_url_to_repo))
            .collect();

        info!(
            listed,
            selected = candidates.len(),
            "candidate resolution complete"
        );
        Ok(candidates)
    }

    /// Reconciliation stage: make sure a same-named destination repository
    /// exists, creating it if absent.
    ///
    /// Idempotent: repeated calls for the same name converge on the same
    /// clone URL and never create duplicates. A create that loses the race
    /// to a concurrent writer (422 conflict) is resolved by re-fetching the
    /// repository.
    #[instrument(skip(self))]
    pub async fn ensure_destination(
        &self,
        name: &str,
    ) -> Result<(String, ReconcileAction), GitHubError> {
        let org = &self.config.github.org;

        if let Some(repo) = self.github.get_repo(org, name).await? {
            info!(name, "destination repository already exists, skipping");
            return Ok((repo.clone_url, ReconcileAction::Skipped));
        }

        let private = self.config.migrate.visibility.is_private();
        match self.github.create_org_repo(org, name, private).await? {
            CreateOutcome::Created(repo) => Ok((repo.clone_url, ReconcileAction::Created)),
            CreateOutcome::AlreadyExists => {
                // Lost the create race; the repository is there now, fetch
                // its canonical clone URL.
                let repo = self.github.get_repo(org, name).await?.ok_or_else(|| {
                    GitHubError::ApiError {
                        status: 422,
                        body: format!(
                            "repository '{}' conflicted on create but is absent on re-fetch",
                            name
                        ),
                    }
                })?;
                Ok((repo.clone_url, ReconcileAction::Created))
            }
        }
    }

    /// Transfer stage: mirror-clone from source, mirror-push to
    /// destination. The local workspace is removed whether or not the
    /// transfer succeeds.
    #[instrument(skip(self, candidate, destination_url), fields(name = %candidate.name))]
    async fn transfer(
        &self,
        candidate: &MigrationCandidate,
        destination_url: &str,
    ) -> Result<(), GitError> {
        let local_path = self
            .config
            .migrate
            .workdir
            .join(format!("{}.git", candidate.name));

        if local_path.exists() {
            // Stale workspace from an earlier interrupted run.
            warn!(path = %local_path.display(), "removing stale local workspace");
            std::fs::remove_dir_all(&local_path)?;
        }

        let source = authenticated_url(
            &candidate.source_url,
            GITLAB_URL_USER,
            self.config.gitlab.token.as_deref().unwrap_or_default(),
        )?;
        let destination = authenticated_url(
            destination_url,
            GITHUB_URL_USER,
            self.config.github.token.as_deref().unwrap_or_default(),
        )?;

        let result = self.transfer_inner(&source, &destination, &local_path).await;

        if local_path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&local_path) {
                warn!(path = %local_path.display(), error = %e, "failed to remove local workspace");
            }
        }
        result
    }

    async fn transfer_inner(
        &self,
        source: &str,
        destination: &str,
        local_path: &Path,
    ) -> Result<(), GitError> {
        self.git.mirror_clone(source, local_path).await?;
        self.git.set_push_url(local_path, destination).await?;
        self.git.push_mirror(local_path).await
    }

    /// Read-only dry run: resolve candidates and report, per candidate,
    /// whether the destination already exists. Creates, clones, and pushes
    /// nothing.
    pub async fn plan(&self, allow_list: &AllowList) -> Result<Vec<PlanEntry>, MigrateError> {
        let candidates = self.resolve_candidates(allow_list).await?;
        let mut entries = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let exists = self
                .github
                .get_repo(&self.config.github.org, &candidate.name)
                .await?
                .is_some();
            entries.push(PlanEntry {
                name: candidate.name,
                exists_at_destination: exists,
            });
        }
        Ok(entries)
    }

    /// Run the full migration: resolve once, then reconcile and transfer
    /// each candidate in turn.
    ///
    /// An empty candidate set is a clean "nothing to migrate" result, not
    /// an error.
    pub async fn run(&self, allow_list: &AllowList) -> Result<RunSummary, MigrateError> {
        let mut summary = RunSummary {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        let candidates = self.resolve_candidates(allow_list).await?;
        summary.candidates = candidates.len();
        if candidates.is_empty() {
            info!("no repositories to migrate");
            summary.finished_at = Some(Utc::now());
            return Ok(summary);
        }

        std::fs::create_dir_all(&self.config.migrate.workdir)?;

        for mut candidate in candidates {
            info!(name = %candidate.name, "starting migration");

            let (destination_url, action) = self.ensure_destination(&candidate.name).await?;
            if action == ReconcileAction::Skipped {
                summary.skipped += 1;
                continue;
            }
            candidate.destination_url = Some(destination_url.clone());

            match self.transfer(&candidate, &destination_url).await {
                Ok(()) => {
                    info!(name = %candidate.name, "repository migrated");
                    summary.migrated += 1;
                }
                Err(e) => {
                    // One bad repository must not abort migration of the
                    // rest.
                    error!(
                        name = %candidate.name,
                        error = %e,
                        "transfer failed, continuing with next candidate"
                    );
                    summary.failed.push(TransferFailure {
                        name: candidate.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        summary.finished_at = Some(Utc::now());
        info!(
            migrated = summary.migrated,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "migration run complete"
        );
        Ok(summary)
    }
}
