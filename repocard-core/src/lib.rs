#![deny(missing_docs)]
//! RepoCard core library.
//!
//! Loads a GitHub repository, scores it against a fixed quality rubric and
//! commits the resulting `component-score.json` back to the repository.

pub mod classify;
pub mod committer;
pub mod config;
pub mod domain;
pub mod error;
pub mod github;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod rubric;
pub mod scorecard;
pub mod scorer;
pub mod sonar;

pub use committer::{CommitOutcome, Committer};
pub use config::{
    CommitConfig, GitHubConfig, LoaderConfig, ModelConfig, SCORECARD_FILE, Settings, SonarConfig,
};
pub use domain::{FileCategory, RepositoryBundle, RepositoryFile, RepositoryMetadata};
pub use error::{RepoCardError, Result, ScoringError};
pub use github::{ContentEntry, ContentKind, GitHubApiClient, PutFileRequest, RepositoryApi};
pub use loader::{RepoLoader, parse_repo_url};
pub use model::{GeminiClient, ModelClient};
pub use pipeline::{
    CommitStage, LoadStage, Pipeline, PipelineState, PipelineStatus, ScoreStage, Stage, route,
};
pub use report::{RunReport, render_json, render_markdown, render_text};
pub use scorecard::{EntryScore, EntryScores, ScoreStatus, Scorecard, assemble};
pub use scorer::{Scorer, fallback_scores};
pub use sonar::{ProjectState, SonarClient, render_properties, write_properties};
