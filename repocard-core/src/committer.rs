//! Writes the scorecard back to the repository.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{info, warn};

use crate::config::CommitConfig;
use crate::domain::RepositoryBundle;
use crate::error::{RepoCardError, Result};
use crate::github::{PutFileRequest, RepositoryApi};
use crate::scorecard::Scorecard;

/// Commit message used for every scorecard update.
pub const COMMIT_MESSAGE: &str = "Update component-score.json with automated scorecard analysis";
/// Result text reported after a successful commit.
pub const COMMIT_SUCCESS: &str = "Scorecard committed successfully";

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Sha of the created commit.
    pub sha: String,
    /// Human-readable result.
    pub message: String,
}

/// Commits `component-score.json` through a [`RepositoryApi`].
#[derive(Debug, Clone)]
pub struct Committer<A: RepositoryApi> {
    api: A,
    config: CommitConfig,
    web_url: String,
}

impl<A: RepositoryApi> Committer<A> {
    /// Build a committer; the client must carry credentials.
    pub fn new(api: A, config: CommitConfig, web_url: impl Into<String>) -> Result<Self> {
        if !api.is_authenticated() {
            return Err(RepoCardError::MissingCredential("GITHUB_TOKEN".to_string()));
        }
        Ok(Self {
            api,
            config,
            web_url: web_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create or update the scorecard file in a single commit.
    pub fn commit_scorecard(
        &self,
        bundle: &RepositoryBundle,
        scorecard: &Scorecard,
    ) -> Result<CommitOutcome> {
        let (owner, repo) = (bundle.owner.as_str(), bundle.repo_name.as_str());
        let path = self.config.target_file.as_str();
        info!("committing {path} to {owner}/{repo}@{}", self.config.branch);

        let json = scorecard
            .to_json_pretty()
            .map_err(|err| RepoCardError::Other(format!("failed to serialize scorecard: {err}")))?;

        let sha = match self.api.get_file_sha(owner, repo, path, &self.config.branch) {
            Ok(sha) => sha,
            Err(err) => {
                warn!("could not look up existing {path}, creating it: {err}");
                None
            }
        };
        if sha.is_some() {
            info!("updating existing {path}");
        } else {
            info!("creating new {path}");
        }

        let request = PutFileRequest {
            message: COMMIT_MESSAGE.to_string(),
            content: STANDARD.encode(json.as_bytes()),
            branch: self.config.branch.clone(),
            sha,
        };
        let commit_sha = self.api.put_file(owner, repo, path, &request)?;
        info!("committed {path} as {commit_sha}");
        Ok(CommitOutcome {
            sha: commit_sha,
            message: COMMIT_SUCCESS.to_string(),
        })
    }

    /// Check that a commit is readable. Never fails; problems are logged.
    pub fn verify_commit(&self, owner: &str, repo: &str, sha: &str) -> bool {
        match self.api.get_commit_message(owner, repo, sha) {
            Ok(message) => {
                info!("verified commit {sha}: {}", message.lines().next().unwrap_or(""));
                true
            }
            Err(err) => {
                warn!("could not verify commit {sha}: {err}");
                false
            }
        }
    }

    /// Browser URL of the scorecard file on the configured branch.
    pub fn file_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/{owner}/{repo}/blob/{}/{}",
            self.web_url, self.config.branch, self.config.target_file
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::organize;
    use crate::domain::{RepositoryFile, RepositoryMetadata};
    use crate::github::MockRepositoryApi;
    use crate::scorecard::{EntryScores, assemble};
    use chrono::{TimeZone, Utc};

    fn bundle() -> RepositoryBundle {
        let files = vec![RepositoryFile::new("README.md", "README.md", 6, "# Demo")];
        RepositoryBundle {
            owner: "acme".to_string(),
            repo_name: "demo".to_string(),
            metadata: RepositoryMetadata::default(),
            languages: Default::default(),
            organized_files: organize(&files),
            files,
        }
    }

    fn scorecard() -> Scorecard {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        assemble("demo", &EntryScores::new(), time)
    }

    fn authed() -> MockRepositoryApi {
        let mut api = MockRepositoryApi::new();
        api.expect_is_authenticated().return_const(true);
        api
    }

    #[test]
    fn construction_requires_credentials() {
        let mut api = MockRepositoryApi::new();
        api.expect_is_authenticated().return_const(false);
        let err =
            Committer::new(api, CommitConfig::default(), "https://github.com").unwrap_err();
        assert!(
            matches!(err, RepoCardError::MissingCredential(ref name) if name == "GITHUB_TOKEN")
        );
    }

    #[test]
    fn creating_omits_sha() {
        let mut api = authed();
        api.expect_get_file_sha()
            .withf(|owner, repo, path, branch| {
                owner == "acme"
                    && repo == "demo"
                    && path == "component-score.json"
                    && branch == "main"
            })
            .returning(|_, _, _, _| Ok(None));
        api.expect_put_file()
            .withf(|_, _, path, request| {
                path == "component-score.json"
                    && request.sha.is_none()
                    && request.branch == "main"
                    && request.message == COMMIT_MESSAGE
            })
            .times(1)
            .returning(|_, _, _, _| Ok("c0ffee".to_string()));

        let committer = Committer::new(api, CommitConfig::default(), "https://github.com").unwrap();
        let outcome = committer.commit_scorecard(&bundle(), &scorecard()).unwrap();
        assert_eq!(outcome.sha, "c0ffee");
        assert_eq!(outcome.message, COMMIT_SUCCESS);
    }

    #[test]
    fn updating_passes_existing_sha_unchanged() {
        let mut api = authed();
        api.expect_get_file_sha()
            .returning(|_, _, _, _| Ok(Some("abc123".to_string())));
        api.expect_put_file()
            .withf(|_, _, _, request| request.sha.as_deref() == Some("abc123"))
            .times(1)
            .returning(|_, _, _, _| Ok("def456".to_string()));

        let committer = Committer::new(api, CommitConfig::default(), "https://github.com").unwrap();
        let outcome = committer.commit_scorecard(&bundle(), &scorecard()).unwrap();
        assert_eq!(outcome.sha, "def456");
    }

    #[test]
    fn content_is_base64_of_pretty_json() {
        let expected = STANDARD.encode(scorecard().to_json_pretty().unwrap());
        let mut api = authed();
        api.expect_get_file_sha().returning(|_, _, _, _| Ok(None));
        api.expect_put_file()
            .withf(move |_, _, _, request| request.content == expected)
            .returning(|_, _, _, _| Ok("c0ffee".to_string()));

        let committer = Committer::new(api, CommitConfig::default(), "https://github.com").unwrap();
        committer.commit_scorecard(&bundle(), &scorecard()).unwrap();
    }

    #[test]
    fn sha_lookup_failure_falls_back_to_create() {
        let mut api = authed();
        api.expect_get_file_sha().returning(|_, _, _, _| {
            Err(RepoCardError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        });
        api.expect_put_file()
            .withf(|_, _, _, request| request.sha.is_none())
            .returning(|_, _, _, _| Ok("c0ffee".to_string()));

        let committer = Committer::new(api, CommitConfig::default(), "https://github.com").unwrap();
        assert!(committer.commit_scorecard(&bundle(), &scorecard()).is_ok());
    }

    #[test]
    fn rejected_put_surfaces_status_and_body() {
        let mut api = authed();
        api.expect_get_file_sha().returning(|_, _, _, _| Ok(None));
        api.expect_put_file().returning(|_, _, _, _| {
            Err(RepoCardError::CommitRejected {
                status: 409,
                body: "conflict".to_string(),
            })
        });

        let committer = Committer::new(api, CommitConfig::default(), "https://github.com").unwrap();
        let err = committer.commit_scorecard(&bundle(), &scorecard()).unwrap_err();
        assert_eq!(err.to_string(), "failed to commit file: 409 - conflict");
    }

    #[test]
    fn verification_never_fails() {
        let mut api = authed();
        api.expect_get_commit_message()
            .returning(|_, _, sha| match sha {
                "good" => Ok("Update component-score.json".to_string()),
                _ => Err(RepoCardError::Http("timeout".to_string())),
            });

        let committer = Committer::new(api, CommitConfig::default(), "https://github.com").unwrap();
        assert!(committer.verify_commit("acme", "demo", "good"));
        assert!(!committer.verify_commit("acme", "demo", "bad"));
    }

    #[test]
    fn file_url_uses_branch_and_target() {
        let config = CommitConfig {
            branch: "develop".to_string(),
            ..CommitConfig::default()
        };
        let committer = Committer::new(authed(), config, "https://github.example.com/").unwrap();
        assert_eq!(
            committer.file_url("acme", "demo"),
            "https://github.example.com/acme/demo/blob/develop/component-score.json"
        );
    }
}
