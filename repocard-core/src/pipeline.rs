//! Sequencing of the load, score and commit stages.

use log::{error, info};
use serde::Serialize;

use crate::committer::{CommitOutcome, Committer};
use crate::domain::RepositoryBundle;
use crate::error::Result;
use crate::github::RepositoryApi;
use crate::loader::RepoLoader;
use crate::model::ModelClient;
use crate::scorecard::Scorecard;
use crate::scorer::Scorer;

/// Progress of a pipeline run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Nothing has run yet.
    Initialized,
    /// The repository bundle is available.
    RepoLoaded,
    /// The scorecard is available.
    ScoringComplete,
    /// The scorecard was committed.
    Complete,
    /// A stage failed; see the recorded errors.
    Failed,
}

impl PipelineStatus {
    /// Status tag used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Initialized => "initialized",
            PipelineStatus::RepoLoaded => "repo_loaded",
            PipelineStatus::ScoringComplete => "scoring_complete",
            PipelineStatus::Complete => "complete",
            PipelineStatus::Failed => "failed",
        }
    }
}

/// Next stage chosen by [`route`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Load the repository.
    Load,
    /// Score the loaded bundle.
    Score,
    /// Commit the scorecard.
    Commit,
}

/// Everything a run has produced so far.
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Repository URL being processed.
    pub repo_url: String,
    /// Loaded repository, once available.
    pub bundle: Option<RepositoryBundle>,
    /// Scorecard, once available.
    pub scorecard: Option<Scorecard>,
    /// Sha of the scorecard commit.
    pub commit_sha: Option<String>,
    /// Human-readable commit result.
    pub commit_result: Option<String>,
    /// Browser URL of the committed file.
    pub file_url: Option<String>,
    /// Current status.
    pub status: PipelineStatus,
    /// Accumulated error messages.
    pub errors: Vec<String>,
}

impl PipelineState {
    /// Fresh state for a repository URL.
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            bundle: None,
            scorecard: None,
            commit_sha: None,
            commit_result: None,
            file_url: None,
            status: PipelineStatus::Initialized,
            errors: Vec::new(),
        }
    }

    fn fail(mut self, message: String) -> Self {
        error!("{message}");
        self.errors.push(message);
        self.status = PipelineStatus::Failed;
        self
    }
}

/// Produces a repository bundle from a URL.
pub trait LoadStage {
    /// Load and classify the repository.
    fn load_bundle(&self, repo_url: &str) -> Result<RepositoryBundle>;
}

/// Produces a scorecard from a bundle. Never fails.
pub trait ScoreStage {
    /// Score the bundle.
    fn score_bundle(&self, bundle: &RepositoryBundle) -> Scorecard;
}

/// Publishes a scorecard to the repository.
pub trait CommitStage {
    /// Commit the scorecard file.
    fn commit(&self, bundle: &RepositoryBundle, scorecard: &Scorecard) -> Result<CommitOutcome>;
    /// Best-effort check of a created commit.
    fn verify(&self, owner: &str, repo: &str, sha: &str) -> bool;
    /// Browser URL of the committed file.
    fn location(&self, owner: &str, repo: &str) -> String;
}

impl<A: RepositoryApi> LoadStage for RepoLoader<A> {
    fn load_bundle(&self, repo_url: &str) -> Result<RepositoryBundle> {
        self.load(repo_url)
    }
}

impl<M: ModelClient> ScoreStage for Scorer<M> {
    fn score_bundle(&self, bundle: &RepositoryBundle) -> Scorecard {
        self.score(bundle)
    }
}

impl<A: RepositoryApi> CommitStage for Committer<A> {
    fn commit(&self, bundle: &RepositoryBundle, scorecard: &Scorecard) -> Result<CommitOutcome> {
        self.commit_scorecard(bundle, scorecard)
    }

    fn verify(&self, owner: &str, repo: &str, sha: &str) -> bool {
        self.verify_commit(owner, repo, sha)
    }

    fn location(&self, owner: &str, repo: &str) -> String {
        self.file_url(owner, repo)
    }
}

/// Pick the stage that should run next, or `None` to stop.
pub fn route(state: &PipelineState) -> Option<Stage> {
    if state.status == PipelineStatus::Failed || !state.errors.is_empty() {
        return None;
    }
    match state.status {
        PipelineStatus::Initialized => Some(Stage::Load),
        PipelineStatus::RepoLoaded => Some(Stage::Score),
        PipelineStatus::ScoringComplete => Some(Stage::Commit),
        PipelineStatus::Complete | PipelineStatus::Failed => None,
    }
}

/// Run the load stage.
pub fn load_stage<L: LoadStage + ?Sized>(loader: &L, mut state: PipelineState) -> PipelineState {
    if state.repo_url.trim().is_empty() {
        return state.fail("No repository URL provided".to_string());
    }
    match loader.load_bundle(state.repo_url.trim()) {
        Ok(bundle) => {
            state.bundle = Some(bundle);
            state.status = PipelineStatus::RepoLoaded;
            state
        }
        Err(err) => state.fail(format!("Repository loading error: {err}")),
    }
}

/// Run the score stage.
pub fn score_stage<S: ScoreStage + ?Sized>(scorer: &S, mut state: PipelineState) -> PipelineState {
    let Some(bundle) = state.bundle.as_ref() else {
        return state.fail("No repository data available for scoring".to_string());
    };
    let scorecard = scorer.score_bundle(bundle);
    info!(
        "scored {} at {}% ({})",
        scorecard.entity_ref.name,
        scorecard.score_percent,
        scorecard.score_success.as_str()
    );
    state.scorecard = Some(scorecard);
    state.status = PipelineStatus::ScoringComplete;
    state
}

/// Run the commit stage, then verify the commit and record the file URL.
pub fn commit_stage<C: CommitStage + ?Sized>(
    committer: &C,
    mut state: PipelineState,
) -> PipelineState {
    let (Some(bundle), Some(scorecard)) = (state.bundle.as_ref(), state.scorecard.as_ref()) else {
        return state.fail("Missing scorecard or repository data for commit".to_string());
    };
    match committer.commit(bundle, scorecard) {
        Ok(outcome) => {
            committer.verify(&bundle.owner, &bundle.repo_name, &outcome.sha);
            state.file_url = Some(committer.location(&bundle.owner, &bundle.repo_name));
            state.commit_sha = Some(outcome.sha);
            state.commit_result = Some(outcome.message);
            state.status = PipelineStatus::Complete;
            state
        }
        Err(err) => state.fail(format!("Commit error: {err}")),
    }
}

/// The three stages wired together.
#[derive(Debug, Clone)]
pub struct Pipeline<L, S, C> {
    loader: L,
    scorer: S,
    committer: C,
}

impl<L: LoadStage, S: ScoreStage, C: CommitStage> Pipeline<L, S, C> {
    /// Wire stages into a pipeline.
    pub fn new(loader: L, scorer: S, committer: C) -> Self {
        Self {
            loader,
            scorer,
            committer,
        }
    }

    /// Run until completion or the first failure.
    pub fn run(&self, repo_url: &str) -> PipelineState {
        let mut state = PipelineState::new(repo_url);
        while let Some(stage) = route(&state) {
            info!("running {stage:?} stage");
            state = match stage {
                Stage::Load => load_stage(&self.loader, state),
                Stage::Score => score_stage(&self.scorer, state),
                Stage::Commit => commit_stage(&self.committer, state),
            };
        }
        info!("pipeline finished with status {}", state.status.as_str());
        state
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::classify::organize;
    use crate::domain::{RepositoryFile, RepositoryMetadata};
    use crate::error::RepoCardError;
    use crate::scorecard::{EntryScores, assemble};
    use chrono::Utc;

    struct StaticLoader;

    impl LoadStage for StaticLoader {
        fn load_bundle(&self, _repo_url: &str) -> Result<RepositoryBundle> {
            let files = vec![RepositoryFile::new("README.md", "README.md", 6, "# Demo")];
            Ok(RepositoryBundle {
                owner: "acme".to_string(),
                repo_name: "demo".to_string(),
                metadata: RepositoryMetadata::default(),
                languages: Default::default(),
                organized_files: organize(&files),
                files,
            })
        }
    }

    struct FailingLoader;

    impl LoadStage for FailingLoader {
        fn load_bundle(&self, repo_url: &str) -> Result<RepositoryBundle> {
            Err(RepoCardError::InvalidReference(repo_url.to_string()))
        }
    }

    struct FixedScorer;

    impl ScoreStage for FixedScorer {
        fn score_bundle(&self, bundle: &RepositoryBundle) -> Scorecard {
            assemble(bundle.component_name(), &EntryScores::new(), Utc::now())
        }
    }

    #[derive(Default)]
    struct RecordingCommitter {
        fail: bool,
        verified: RefCell<Vec<String>>,
    }

    impl CommitStage for RecordingCommitter {
        fn commit(
            &self,
            _bundle: &RepositoryBundle,
            _scorecard: &Scorecard,
        ) -> Result<CommitOutcome> {
            if self.fail {
                return Err(RepoCardError::CommitRejected {
                    status: 422,
                    body: "invalid".to_string(),
                });
            }
            Ok(CommitOutcome {
                sha: "c0ffee".to_string(),
                message: "Scorecard committed successfully".to_string(),
            })
        }

        fn verify(&self, _owner: &str, _repo: &str, sha: &str) -> bool {
            self.verified.borrow_mut().push(sha.to_string());
            false
        }

        fn location(&self, owner: &str, repo: &str) -> String {
            format!("https://github.com/{owner}/{repo}/blob/main/component-score.json")
        }
    }

    #[test]
    fn status_tags_are_stable() {
        let tags: Vec<&str> = [
            PipelineStatus::Initialized,
            PipelineStatus::RepoLoaded,
            PipelineStatus::ScoringComplete,
            PipelineStatus::Complete,
            PipelineStatus::Failed,
        ]
        .iter()
        .map(PipelineStatus::as_str)
        .collect();
        assert_eq!(
            tags,
            vec!["initialized", "repo_loaded", "scoring_complete", "complete", "failed"]
        );
    }

    #[test]
    fn routes_follow_status() {
        let mut state = PipelineState::new("https://github.com/acme/demo");
        assert_eq!(route(&state), Some(Stage::Load));
        state.status = PipelineStatus::RepoLoaded;
        assert_eq!(route(&state), Some(Stage::Score));
        state.status = PipelineStatus::ScoringComplete;
        assert_eq!(route(&state), Some(Stage::Commit));
        state.status = PipelineStatus::Complete;
        assert_eq!(route(&state), None);
    }

    #[test]
    fn errors_stop_routing_regardless_of_status() {
        let mut state = PipelineState::new("https://github.com/acme/demo");
        state.errors.push("earlier problem".to_string());
        assert_eq!(route(&state), None);
    }

    #[test]
    fn successful_run_completes() {
        let committer = RecordingCommitter::default();
        let pipeline = Pipeline::new(StaticLoader, FixedScorer, committer);
        let state = pipeline.run("https://github.com/acme/demo");

        assert_eq!(state.status, PipelineStatus::Complete);
        assert!(state.errors.is_empty());
        assert_eq!(state.commit_sha.as_deref(), Some("c0ffee"));
        assert_eq!(state.commit_result.as_deref(), Some("Scorecard committed successfully"));
        assert_eq!(
            state.file_url.as_deref(),
            Some("https://github.com/acme/demo/blob/main/component-score.json")
        );
        assert_eq!(pipeline.committer.verified.borrow().as_slice(), ["c0ffee"]);
    }

    #[test]
    fn empty_url_fails_before_loading() {
        let pipeline = Pipeline::new(FailingLoader, FixedScorer, RecordingCommitter::default());
        let state = pipeline.run("  ");
        assert_eq!(state.status, PipelineStatus::Failed);
        assert_eq!(state.errors, vec!["No repository URL provided".to_string()]);
    }

    #[test]
    fn load_failure_skips_later_stages() {
        let pipeline = Pipeline::new(FailingLoader, FixedScorer, RecordingCommitter::default());
        let state = pipeline.run("https://github.com/acme");

        assert_eq!(state.status, PipelineStatus::Failed);
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].starts_with("Repository loading error: "));
        assert!(state.bundle.is_none());
        assert!(state.scorecard.is_none());
        assert!(state.commit_sha.is_none());
    }

    #[test]
    fn commit_failure_keeps_scorecard() {
        let committer = RecordingCommitter {
            fail: true,
            ..RecordingCommitter::default()
        };
        let pipeline = Pipeline::new(StaticLoader, FixedScorer, committer);
        let state = pipeline.run("https://github.com/acme/demo");

        assert_eq!(state.status, PipelineStatus::Failed);
        assert_eq!(
            state.errors,
            vec!["Commit error: failed to commit file: 422 - invalid".to_string()]
        );
        assert!(state.scorecard.is_some());
        assert!(state.file_url.is_none());
        assert!(pipeline.committer.verified.borrow().is_empty());
    }

    #[test]
    fn stages_report_missing_inputs() {
        let state = score_stage(&FixedScorer, PipelineState::new("x"));
        assert_eq!(state.errors, vec!["No repository data available for scoring".to_string()]);

        let state = commit_stage(&RecordingCommitter::default(), PipelineState::new("x"));
        assert_eq!(
            state.errors,
            vec!["Missing scorecard or repository data for commit".to_string()]
        );
        assert_eq!(state.status, PipelineStatus::Failed);
    }
}
