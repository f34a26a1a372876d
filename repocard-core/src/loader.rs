//! Repository loading: URL resolution, traversal, decoding and classification.

use log::{debug, info, warn};

use crate::classify::{is_relevant_file, is_skipped_dir, organize};
use crate::config::LoaderConfig;
use crate::domain::{LanguageHistogram, RepositoryBundle, RepositoryFile};
use crate::error::{RepoCardError, Result};
use crate::github::{ContentKind, RepositoryApi};

/// Split a repository URL into `(owner, repo)`.
///
/// Accepts `https://host/owner/repo[.git]`, `git@host:owner/repo.git` and a
/// bare `owner/repo`. Extra path segments after the repository are ignored.
pub fn parse_repo_url(url: &str) -> Result<(String, String)> {
    let invalid = || RepoCardError::InvalidReference(url.to_string());
    let trimmed = url.trim();
    let path = if let Some((_, rest)) = trimmed.split_once("://") {
        rest.split_once('/').map(|(_, path)| path).unwrap_or("")
    } else if let Some((_, path)) = trimmed
        .strip_prefix("git@")
        .and_then(|rest| rest.split_once(':'))
    {
        path
    } else {
        trimmed
    };
    let path = path.split(['?', '#']).next().unwrap_or("");

    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let repo = segments.next().ok_or_else(invalid)?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return Err(invalid());
    }
    Ok((owner.to_string(), repo.to_string()))
}

/// Loads a repository through a [`RepositoryApi`].
#[derive(Debug, Clone)]
pub struct RepoLoader<A: RepositoryApi> {
    api: A,
    config: LoaderConfig,
}

impl<A: RepositoryApi> RepoLoader<A> {
    /// Create a loader with the default traversal depth.
    pub fn new(api: A) -> Self {
        Self::with_config(api, LoaderConfig::default())
    }

    /// Create a loader with explicit traversal settings.
    pub fn with_config(api: A, config: LoaderConfig) -> Self {
        Self { api, config }
    }

    /// Resolve, fetch and classify a repository.
    pub fn load(&self, repo_url: &str) -> Result<RepositoryBundle> {
        info!("loading repository {repo_url}");
        let (owner, repo) = parse_repo_url(repo_url)?;

        let metadata = self.api.get_metadata(&owner, &repo).map_err(|err| {
            warn!("metadata request for {owner}/{repo} failed: {err}");
            RepoCardError::MetadataUnavailable(format!("{owner}/{repo}"))
        })?;

        let languages = self
            .api
            .get_languages(&owner, &repo)
            .unwrap_or_else(|err| {
                warn!("language histogram unavailable for {owner}/{repo}: {err}");
                LanguageHistogram::new()
            });

        info!("scanning files in {owner}/{repo}");
        let mut files = Vec::new();
        self.traverse(&owner, &repo, "", self.config.max_depth, &mut files);
        if files.is_empty() {
            return Err(RepoCardError::NoRelevantFiles(format!("{owner}/{repo}")));
        }

        let organized_files = organize(&files);
        info!("loaded {} files from {owner}/{repo}", files.len());
        Ok(RepositoryBundle {
            owner,
            repo_name: repo,
            metadata,
            languages,
            files,
            organized_files,
        })
    }

    fn traverse(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        depth: usize,
        files: &mut Vec<RepositoryFile>,
    ) {
        if depth == 0 {
            return;
        }

        let entries = match self.api.list_directory(owner, repo, path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("failed to list '{path}': {err}");
                return;
            }
        };

        for entry in entries {
            match entry.kind {
                ContentKind::File => {
                    if !is_relevant_file(&entry.name, &entry.path) {
                        continue;
                    }
                    match self.api.get_file_content(owner, repo, &entry.path) {
                        Ok(Some(content)) if !content.is_empty() => {
                            debug!("decoded {}", entry.path);
                            files.push(RepositoryFile::new(
                                entry.path,
                                entry.name,
                                entry.size,
                                content,
                            ));
                        }
                        Ok(_) => debug!("skipping {} (no text content)", entry.path),
                        Err(err) => warn!("skipping {}: {err}", entry.path),
                    }
                }
                ContentKind::Dir if !is_skipped_dir(&entry.name) => {
                    self.traverse(owner, repo, &entry.path, depth - 1, files);
                }
                _ => {}
            }
        }
    }
}
