//! GitHub REST API access.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::GitHubConfig;
use crate::domain::{LanguageHistogram, RepositoryMetadata};
use crate::error::{RepoCardError, Result};

/// Kind of an entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// A regular file.
    File,
    /// A directory.
    Dir,
    /// Symlinks, submodules and anything else.
    Other(String),
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    /// Entry name.
    pub name: String,
    /// Path from the repository root.
    pub path: String,
    /// Entry kind.
    pub kind: ContentKind,
    /// Size in bytes.
    pub size: u64,
}

impl ContentEntry {
    /// Convenience constructor for a file entry.
    pub fn file(path: &str, size: u64) -> Self {
        Self::new(path, ContentKind::File, size)
    }

    /// Convenience constructor for a directory entry.
    pub fn dir(path: &str) -> Self {
        Self::new(path, ContentKind::Dir, 0)
    }

    fn new(path: &str, kind: ContentKind, size: u64) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            name,
            path: path.to_string(),
            kind,
            size,
        }
    }
}

/// Body of a create-or-update contents request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutFileRequest {
    /// Commit message.
    pub message: String,
    /// Base64-encoded file content.
    pub content: String,
    /// Target branch.
    pub branch: String,
    /// Blob sha of the file being replaced; omitted when creating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Repository operations used by the loader and the committer.
#[cfg_attr(test, mockall::automock)]
pub trait RepositoryApi {
    /// Whether requests carry a credential.
    fn is_authenticated(&self) -> bool;
    /// Fetch repository metadata.
    fn get_metadata(&self, owner: &str, repo: &str) -> Result<RepositoryMetadata>;
    /// Fetch the language byte histogram.
    fn get_languages(&self, owner: &str, repo: &str) -> Result<LanguageHistogram>;
    /// List one directory; an empty path lists the root.
    fn list_directory(&self, owner: &str, repo: &str, path: &str) -> Result<Vec<ContentEntry>>;
    /// Fetch and decode a file. `None` when the payload is not base64.
    fn get_file_content(&self, owner: &str, repo: &str, path: &str) -> Result<Option<String>>;
    /// Current blob sha of a file on a branch, `None` if it does not exist.
    fn get_file_sha(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>>;
    /// Create or update a file, returning the new commit sha.
    fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<String>;
    /// Fetch the message of a commit.
    fn get_commit_message(&self, owner: &str, repo: &str, sha: &str) -> Result<String>;
}

/// Blocking GitHub REST client.
#[derive(Debug, Clone)]
pub struct GitHubApiClient {
    base_url: String,
    token: Option<String>,
    user_agent: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: Option<String>,
    full_name: Option<String>,
    description: Option<String>,
    language: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    #[serde(default)]
    topics: Vec<String>,
    license: Option<GitHubLicense>,
}

#[derive(Debug, Deserialize)]
struct GitHubLicense {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GitHubFile {
    encoding: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubFileSha {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubPutResponse {
    commit: GitHubCommitRef,
}

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    commit: GitHubCommitDetail,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitDetail {
    message: String,
}

impl From<GitHubRepository> for RepositoryMetadata {
    fn from(value: GitHubRepository) -> Self {
        Self {
            name: value.name.unwrap_or_default(),
            full_name: value.full_name.unwrap_or_default(),
            description: value.description,
            language: value.language,
            created_at: value.created_at,
            updated_at: value.updated_at,
            size: value.size,
            stargazers_count: value.stargazers_count,
            forks_count: value.forks_count,
            open_issues_count: value.open_issues_count,
            topics: value.topics,
            license: value.license.and_then(|license| license.name),
        }
    }
}

impl From<GitHubContentItem> for ContentEntry {
    fn from(value: GitHubContentItem) -> Self {
        let kind = match value.kind.as_str() {
            "file" => ContentKind::File,
            "dir" => ContentKind::Dir,
            _ => ContentKind::Other(value.kind),
        };
        Self {
            name: value.name,
            path: value.path,
            kind,
            size: value.size,
        }
    }
}

impl GitHubApiClient {
    /// Build a client from explicit configuration.
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            user_agent: config.user_agent.clone(),
            client,
        })
    }

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        )
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!(
            "{}/contents/{}",
            self.repo_url(owner, repo),
            encode_path(path)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/vnd.github.v3+json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get(&self, url: String) -> Result<Response> {
        debug!("GET {url}");
        Ok(self.authorize(self.client.get(url)).send()?)
    }

    fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        decode_json(ensure_success(self.get(url)?)?)
    }
}

impl RepositoryApi for GitHubApiClient {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn get_metadata(&self, owner: &str, repo: &str) -> Result<RepositoryMetadata> {
        let raw: GitHubRepository = self.get_json(self.repo_url(owner, repo))?;
        Ok(raw.into())
    }

    fn get_languages(&self, owner: &str, repo: &str) -> Result<LanguageHistogram> {
        self.get_json(format!("{}/languages", self.repo_url(owner, repo)))
    }

    fn list_directory(&self, owner: &str, repo: &str, path: &str) -> Result<Vec<ContentEntry>> {
        let items: Vec<GitHubContentItem> = self.get_json(self.contents_url(owner, repo, path))?;
        Ok(items.into_iter().map(ContentEntry::from).collect())
    }

    fn get_file_content(&self, owner: &str, repo: &str, path: &str) -> Result<Option<String>> {
        let file: GitHubFile = self.get_json(self.contents_url(owner, repo, path))?;
        if file.encoding.as_deref() != Some("base64") {
            return Ok(None);
        }
        let encoded = file.content.unwrap_or_default();
        decode_base64_text(&encoded).map(Some)
    }

    fn get_file_sha(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>> {
        let url = self.contents_url(owner, repo, path);
        debug!("GET {url}?ref={branch}");
        let response = self
            .authorize(self.client.get(url))
            .query(&[("ref", branch)])
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let file: GitHubFileSha = decode_json(ensure_success(response)?)?;
        Ok(Some(file.sha))
    }

    fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<String> {
        let url = self.contents_url(owner, repo, path);
        debug!("PUT {url}");
        let response = self.authorize(self.client.put(url)).json(request).send()?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(RepoCardError::CommitRejected { status, body });
        }
        let created: GitHubPutResponse = decode_json(response)?;
        Ok(created.commit.sha)
    }

    fn get_commit_message(&self, owner: &str, repo: &str, sha: &str) -> Result<String> {
        let url = format!(
            "{}/commits/{}",
            self.repo_url(owner, repo),
            urlencoding::encode(sha)
        );
        let commit: GitHubCommit = self.get_json(url)?;
        Ok(commit.commit.message)
    }
}

/// Decode a base64 payload (GitHub wraps it at 60 columns) into UTF-8 text.
pub fn decode_base64_text(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|err| RepoCardError::Decode(format!("invalid base64: {err}")))?;
    String::from_utf8(bytes).map_err(|err| RepoCardError::Decode(format!("invalid utf-8: {err}")))
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    Err(RepoCardError::Api { status, body })
}

fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .map_err(|err| RepoCardError::Decode(err.to_string()))
}
