use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use repocard_core::domain::LanguageHistogram;
use repocard_core::{
    CommitConfig, Committer, ContentEntry, ModelClient, Pipeline, PipelineStatus, PutFileRequest,
    RepoCardError, RepoLoader, RepositoryApi, RepositoryMetadata, Result, RunReport, Scorer,
    ScoringError, render_text,
};

/// In-memory repository with a recorded commit log.
#[derive(Clone, Default)]
struct MemoryRepo {
    files: BTreeMap<String, String>,
    existing_sha: Option<String>,
    authenticated: bool,
    puts: Rc<RefCell<Vec<(String, PutFileRequest)>>>,
}

impl MemoryRepo {
    fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(path, content)| (path.to_string(), content.to_string()))
                .collect(),
            authenticated: true,
            ..Self::default()
        }
    }
}

impl RepositoryApi for MemoryRepo {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn get_metadata(&self, owner: &str, repo: &str) -> Result<RepositoryMetadata> {
        Ok(RepositoryMetadata {
            name: repo.to_string(),
            full_name: format!("{owner}/{repo}"),
            description: Some("Demo service".to_string()),
            language: Some("Python".to_string()),
            ..RepositoryMetadata::default()
        })
    }

    fn get_languages(&self, _owner: &str, _repo: &str) -> Result<LanguageHistogram> {
        Ok([("Python".to_string(), 4096)].into_iter().collect())
    }

    fn list_directory(&self, _owner: &str, _repo: &str, path: &str) -> Result<Vec<ContentEntry>> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut entries: Vec<ContentEntry> = Vec::new();
        for (file_path, content) in &self.files {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    let dir_path = format!("{prefix}{dir}");
                    if !entries.iter().any(|entry| entry.path == dir_path) {
                        entries.push(ContentEntry::dir(&dir_path));
                    }
                }
                None => entries.push(ContentEntry::file(file_path, content.len() as u64)),
            }
        }
        Ok(entries)
    }

    fn get_file_content(&self, _owner: &str, _repo: &str, path: &str) -> Result<Option<String>> {
        Ok(self.files.get(path).cloned())
    }

    fn get_file_sha(
        &self,
        _owner: &str,
        _repo: &str,
        _path: &str,
        _branch: &str,
    ) -> Result<Option<String>> {
        Ok(self.existing_sha.clone())
    }

    fn put_file(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<String> {
        self.puts
            .borrow_mut()
            .push((path.to_string(), request.clone()));
        Ok(format!("commit-{}", self.puts.borrow().len()))
    }

    fn get_commit_message(&self, _owner: &str, _repo: &str, _sha: &str) -> Result<String> {
        Err(RepoCardError::Other("history unavailable".to_string()))
    }
}

struct ScriptedModel(std::result::Result<String, ScoringError>);

impl ModelClient for ScriptedModel {
    fn generate(&self, _prompt: &str) -> std::result::Result<String, ScoringError> {
        self.0.clone()
    }
}

fn sample_repo() -> MemoryRepo {
    MemoryRepo::with_files(&[
        ("README.md", "# Demo\nA small service."),
        ("app/main.py", "print('hello')"),
        ("app/assets/logo.png", "not fetched"),
        ("node_modules/left-pad/index.js", "module.exports = 1"),
    ])
}

fn committed_json(repo: &MemoryRepo) -> serde_json::Value {
    let puts = repo.puts.borrow();
    let (_, request) = puts.last().expect("a commit");
    let decoded = STANDARD.decode(&request.content).expect("base64");
    serde_json::from_slice(&decoded).expect("scorecard json")
}

#[test]
fn heuristic_scorecard_is_committed_when_model_is_down() {
    let repo = sample_repo();
    let loader = RepoLoader::new(repo.clone());
    let scorer = Scorer::new(ScriptedModel(Err(ScoringError::ModelUnavailable(
        "offline".to_string(),
    ))));
    let committer =
        Committer::new(repo.clone(), CommitConfig::default(), "https://github.com").expect("auth");

    let state = Pipeline::new(loader, scorer, committer).run("https://github.com/acme/demo.git");

    assert_eq!(state.status, PipelineStatus::Complete, "{:?}", state.errors);
    let bundle = state.bundle.as_ref().expect("bundle");
    let paths: Vec<&str> = bundle.files.iter().map(|file| file.path.as_str()).collect();
    assert_eq!(paths, vec!["README.md", "app/main.py"]);

    let scorecard = state.scorecard.as_ref().expect("scorecard");
    let areas: Vec<u8> = scorecard
        .area_scores
        .iter()
        .map(|area| area.score_percent)
        .collect();
    assert_eq!(areas, vec![70, 33, 62, 45]);
    assert_eq!(scorecard.score_percent, 52);

    assert_eq!(state.commit_sha.as_deref(), Some("commit-1"));
    assert_eq!(
        state.file_url.as_deref(),
        Some("https://github.com/acme/demo/blob/main/component-score.json")
    );

    let puts = repo.puts.borrow();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].0, "component-score.json");
    assert!(puts[0].1.sha.is_none());
    drop(puts);

    let json = committed_json(&repo);
    assert_eq!(json["entityRef"]["kind"], "component");
    assert_eq!(json["entityRef"]["name"], "demo");
    assert_eq!(json["scorePercent"], 52);
    assert_eq!(json["areaScores"][0]["scoreEntries"][0]["scorePercent"], 80);
}

#[test]
fn model_scores_update_an_existing_scorecard() {
    let mut repo = sample_repo();
    repo.existing_sha = Some("blob-1".to_string());
    let response = r#"```json
{"entries": {"1": {"score": 95, "details": "Great README"}, "4": {"score": 10, "details": "No CI"}}}
```"#;

    let pipeline = Pipeline::new(
        RepoLoader::new(repo.clone()),
        Scorer::new(ScriptedModel(Ok(response.to_string()))),
        Committer::new(repo.clone(), CommitConfig::default(), "https://github.com").expect("auth"),
    );
    let state = pipeline.run("https://github.com/acme/demo");
    assert_eq!(state.status, PipelineStatus::Complete);

    let puts = repo.puts.borrow();
    assert_eq!(puts[0].1.sha.as_deref(), Some("blob-1"));
    drop(puts);

    let json = committed_json(&repo);
    let first = &json["areaScores"][0]["scoreEntries"][0];
    assert_eq!(first["scorePercent"], 95);
    assert_eq!(first["details"], "Great README");
    let second = &json["areaScores"][0]["scoreEntries"][1];
    assert_eq!(second["scorePercent"], 50);
    assert_eq!(second["details"], "No analysis available");
}

#[test]
fn unauthenticated_client_cannot_build_a_committer() {
    let mut repo = sample_repo();
    repo.authenticated = false;
    match Committer::new(repo, CommitConfig::default(), "https://github.com") {
        Err(err) => assert_eq!(err.to_string(), "GITHUB_TOKEN is required"),
        Ok(_) => panic!("committer built without credentials"),
    }
}

#[test]
fn repository_without_relevant_files_fails_the_run() {
    let repo = MemoryRepo::with_files(&[("docs/diagram.png", "binary")]);
    let pipeline = Pipeline::new(
        RepoLoader::new(repo.clone()),
        Scorer::new(ScriptedModel(Err(ScoringError::EmptyResponse))),
        Committer::new(repo.clone(), CommitConfig::default(), "https://github.com").expect("auth"),
    );
    let state = pipeline.run("https://github.com/acme/demo");

    assert_eq!(state.status, PipelineStatus::Failed);
    assert_eq!(state.errors.len(), 1);
    assert!(state.errors[0].starts_with("Repository loading error: "));
    assert!(repo.puts.borrow().is_empty());

    let text = render_text(&RunReport::from_state(&state));
    assert!(text.contains("Status: failed"));
}
