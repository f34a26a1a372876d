//! SonarCloud project bootstrap.

use std::fs;
use std::path::Path;

use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::config::SonarConfig;
use crate::error::{RepoCardError, Result};

/// Default file name for the analysis properties.
pub const PROPERTIES_FILE: &str = "sonar-project.properties";

/// What [`SonarClient::ensure_project`] found or did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProjectState {
    /// The project was already registered.
    Existing,
    /// The project was created.
    Created,
}

#[derive(Debug, Deserialize)]
struct ProjectSearch {
    #[serde(default)]
    components: Vec<serde_json::Value>,
}

/// Minimal SonarCloud web API client.
#[derive(Debug, Clone)]
pub struct SonarClient {
    config: SonarConfig,
    client: Client,
}

impl SonarClient {
    /// Build a client for the configured host.
    pub fn new(config: SonarConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.host_url.trim_end_matches('/'))
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.basic_auth(&self.config.token, Some("")).send()?;
        if !matches!(response.status().as_u16(), 200 | 201 | 204) {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(RepoCardError::Api { status, body });
        }
        Ok(response)
    }

    /// Whether the project key is registered in the organization.
    pub fn project_exists(&self) -> Result<bool> {
        let url = self.url("/api/projects/search");
        debug!("GET {url}");
        let response = self.send(self.client.get(url).query(&[
            ("projects", self.config.project_key.as_str()),
            ("organization", self.config.organization.as_str()),
        ]))?;
        let search: ProjectSearch = response
            .json()
            .map_err(|err| RepoCardError::Decode(err.to_string()))?;
        Ok(!search.components.is_empty())
    }

    /// Register the project.
    pub fn create_project(&self) -> Result<()> {
        let url = self.url("/api/projects/create");
        debug!("POST {url}");
        self.send(self.client.post(url).form(&[
            ("name", self.config.project_name.as_str()),
            ("project", self.config.project_key.as_str()),
            ("organization", self.config.organization.as_str()),
        ]))?;
        info!("created project '{}'", self.config.project_key);
        Ok(())
    }

    /// Create the project unless it already exists.
    pub fn ensure_project(&self) -> Result<ProjectState> {
        info!("checking whether project '{}' exists", self.config.project_key);
        if self.project_exists()? {
            info!("project already exists");
            return Ok(ProjectState::Existing);
        }
        self.create_project()?;
        Ok(ProjectState::Created)
    }
}

/// Contents of `sonar-project.properties` for a configuration.
pub fn render_properties(config: &SonarConfig) -> String {
    format!(
        "sonar.projectKey={key}\n\
         sonar.organization={org}\n\
         \n\
         # This is the name and version displayed in the SonarCloud UI.\n\
         #sonar.projectName={name}\n\
         #sonar.projectVersion=1.0\n\
         \n\
         # Path is relative to the sonar-project.properties file. Replace \"\\\" by \"/\" on Windows.\n\
         sonar.sources=src/\n\
         \n\
         # Encoding of the source code. Default is default system encoding\n\
         #sonar.sourceEncoding=UTF-8\n",
        key = config.project_key,
        org = config.organization,
        name = config.project_name,
    )
}

/// Write the properties file, replacing any existing one.
pub fn write_properties(config: &SonarConfig, path: &Path) -> Result<()> {
    fs::write(path, render_properties(config))?;
    info!("wrote {}", path.display());
    Ok(())
}
