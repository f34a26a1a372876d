//! Explicit configuration for the pipeline components.
//!
//! Every component receives its configuration at construction. The
//! `from_env` constructors read the process environment once; nothing in the
//! pipeline consults the environment afterwards.

use std::time::Duration;

use crate::error::{RepoCardError, Result};

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_GITHUB_WEB_URL: &str = "https://github.com";
const DEFAULT_USER_AGENT: &str = "repocard";
const DEFAULT_MODEL_API_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Name of the scorecard file written to the repository root.
pub const SCORECARD_FILE: &str = "component-score.json";
/// Default recursion bound for repository traversal.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Connection settings for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// REST base URL.
    pub api_url: String,
    /// Web base URL used to render links to committed files.
    pub web_url: String,
    /// Optional access token; required for writes.
    pub token: Option<String>,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GitHubConfig {
    /// Build a GitHub configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_url: env_or("GITHUB_API_URL", DEFAULT_GITHUB_API_URL),
            web_url: env_or("GITHUB_WEB_URL", DEFAULT_GITHUB_WEB_URL),
            token: env_opt("GITHUB_TOKEN"),
            user_agent: env_or("GITHUB_USER_AGENT", DEFAULT_USER_AGENT),
            timeout: timeout_from_env(),
        }
    }

    /// Configuration pointing at an explicit base URL, mostly for tests.
    pub fn with_api_url(api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            api_url: api_url.into(),
            web_url: DEFAULT_GITHUB_WEB_URL.to_string(),
            token,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Connection settings for the scoring model.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Base URL of the generative language API.
    pub api_url: String,
    /// API key; the model client cannot be built without one.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ModelConfig {
    /// Build a model configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_url: env_or("REPOCARD_MODEL_API_URL", DEFAULT_MODEL_API_URL),
            api_key: env_opt("GOOGLE_API_KEY"),
            model: env_or("REPOCARD_MODEL", DEFAULT_MODEL),
            timeout: timeout_from_env(),
        }
    }

    /// Configuration pointing at an explicit base URL, mostly for tests.
    pub fn with_api_url(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Where and how the scorecard is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitConfig {
    /// Target branch.
    pub branch: String,
    /// Target file path at the repository root.
    pub target_file: String,
}

impl CommitConfig {
    /// Build a commit configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            branch: env_or("REPOCARD_BRANCH", DEFAULT_BRANCH),
            target_file: SCORECARD_FILE.to_string(),
        }
    }
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            target_file: SCORECARD_FILE.to_string(),
        }
    }
}

/// Traversal settings for the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Maximum directory depth to descend into.
    pub max_depth: usize,
}

impl LoaderConfig {
    /// Build a loader configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let max_depth = match env_opt("REPOCARD_MAX_DEPTH") {
            Some(raw) => raw.parse().map_err(|err| {
                RepoCardError::Other(format!("invalid REPOCARD_MAX_DEPTH: {err}"))
            })?,
            None => DEFAULT_MAX_DEPTH,
        };
        Ok(Self { max_depth })
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// All pipeline settings gathered in one place.
#[derive(Debug, Clone)]
pub struct Settings {
    /// GitHub connection settings.
    pub github: GitHubConfig,
    /// Model connection settings.
    pub model: ModelConfig,
    /// Commit target settings.
    pub commit: CommitConfig,
    /// Traversal settings.
    pub loader: LoaderConfig,
}

impl Settings {
    /// Read every section from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            github: GitHubConfig::from_env(),
            model: ModelConfig::from_env(),
            commit: CommitConfig::from_env(),
            loader: LoaderConfig::from_env()?,
        })
    }
}

/// Settings for the SonarCloud project bootstrap utility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SonarConfig {
    /// SonarCloud host.
    pub host_url: String,
    /// API token, sent as the basic-auth username.
    pub token: String,
    /// Project key to look up or create.
    pub project_key: String,
    /// Owning organization.
    pub organization: String,
    /// Display name for a newly created project.
    pub project_name: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SonarConfig {
    /// Build the configuration from environment variables.
    ///
    /// Fails with [`RepoCardError::MissingCredential`] naming every missing
    /// variable.
    pub fn from_env() -> Result<Self> {
        let host_url = env_or("SONAR_HOST_URL", "https://sonarcloud.io");
        let token = env_opt("SONAR_TOKEN");
        let project_key = env_opt("SONAR_PROJECT_KEY");
        let organization = env_opt("SONAR_ORG");
        let project_name = env_opt("SONAR_PROJECT_NAME");

        let missing: Vec<&str> = [
            ("SONAR_TOKEN", token.is_none()),
            ("SONAR_PROJECT_KEY", project_key.is_none()),
            ("SONAR_ORG", organization.is_none()),
            ("SONAR_PROJECT_NAME", project_name.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (token, project_key, organization, project_name) {
            (Some(token), Some(project_key), Some(organization), Some(project_name)) => {
                Ok(Self {
                    host_url,
                    token,
                    project_key,
                    organization,
                    project_name,
                    timeout: timeout_from_env(),
                })
            }
            _ => Err(RepoCardError::MissingCredential(missing.join(", "))),
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn timeout_from_env() -> Duration {
    let secs = env_opt("REPOCARD_HTTP_TIMEOUT_SECS")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Duration::from_secs(secs)
}
