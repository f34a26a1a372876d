//! Run report formatting.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::domain::{FileCategory, LanguageHistogram, RepositoryBundle};
use crate::pipeline::{PipelineState, PipelineStatus};
use crate::scorecard::{ScoreStatus, Scorecard};

/// Repository facts shown in a run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    /// `owner/name`.
    pub full_name: String,
    /// Number of decoded files.
    pub total_files: usize,
    /// File counts per category label.
    pub categories: BTreeMap<String, usize>,
    /// Language shares in percent, largest first.
    pub languages: Vec<(String, f64)>,
}

impl RepositorySummary {
    /// Summarize a loaded bundle.
    pub fn from_bundle(bundle: &RepositoryBundle) -> Self {
        let full_name = if bundle.metadata.full_name.is_empty() {
            format!("{}/{}", bundle.owner, bundle.repo_name)
        } else {
            bundle.metadata.full_name.clone()
        };
        let categories = FileCategory::ALL
            .iter()
            .map(|category| (category.as_str().to_string(), bundle.files_in(*category).len()))
            .collect();
        Self {
            full_name,
            total_files: bundle.total_files(),
            categories,
            languages: language_shares(&bundle.languages),
        }
    }
}

/// One area line of a run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSummary {
    /// Area title.
    pub title: String,
    /// Area score.
    pub score_percent: u8,
    /// Area status.
    pub score_success: ScoreStatus,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Repository URL that was processed.
    pub repo_url: String,
    /// Final status.
    pub status: PipelineStatus,
    /// Errors recorded by the pipeline.
    pub errors: Vec<String>,
    /// Sha of the scorecard commit.
    pub commit_sha: Option<String>,
    /// Commit result text.
    pub commit_result: Option<String>,
    /// Browser URL of the committed file.
    pub file_url: Option<String>,
    /// Repository facts, when loading succeeded.
    pub repository: Option<RepositorySummary>,
    /// Overall score, when scoring ran.
    pub score_percent: Option<u8>,
    /// Overall status label, when scoring ran.
    pub score_success: Option<ScoreStatus>,
    /// Per-area scores.
    pub areas: Vec<AreaSummary>,
}

impl RunReport {
    /// Build a report from a finished pipeline state.
    pub fn from_state(state: &PipelineState) -> Self {
        let scorecard = state.scorecard.as_ref();
        Self {
            repo_url: state.repo_url.clone(),
            status: state.status,
            errors: state.errors.clone(),
            commit_sha: state.commit_sha.clone(),
            commit_result: state.commit_result.clone(),
            file_url: state.file_url.clone(),
            repository: state.bundle.as_ref().map(RepositorySummary::from_bundle),
            score_percent: scorecard.map(|card| card.score_percent),
            score_success: scorecard.map(|card| card.score_success),
            areas: scorecard.map(area_summaries).unwrap_or_default(),
        }
    }

    /// Whether the run finished with a committed scorecard.
    pub fn is_complete(&self) -> bool {
        self.status == PipelineStatus::Complete
    }
}

/// Render a run report as plain text.
pub fn render_text(report: &RunReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Repository: {}", report.repo_url);
    let _ = writeln!(output, "Status: {}", report.status.as_str());
    if let Some(repository) = &report.repository {
        let _ = writeln!(
            output,
            "Loaded: {} ({} files)",
            repository.full_name, repository.total_files
        );
    }
    if let (Some(score), Some(status)) = (report.score_percent, report.score_success) {
        let _ = writeln!(output, "Overall score: {score}% ({})", status.as_str());
        for area in &report.areas {
            let _ = writeln!(
                output,
                "  {}: {}% ({})",
                area.title,
                area.score_percent,
                area.score_success.as_str()
            );
        }
    }
    if let Some(sha) = &report.commit_sha {
        let _ = writeln!(output, "Commit: {sha}");
    }
    if let Some(result) = &report.commit_result {
        let _ = writeln!(output, "Result: {result}");
    }
    if let Some(url) = &report.file_url {
        let _ = writeln!(output, "File: {url}");
    }
    for error in &report.errors {
        let _ = writeln!(output, "Error: {error}");
    }
    output
}

/// Render a run report as Markdown.
pub fn render_markdown(report: &RunReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# RepoCard Report\n");
    let _ = writeln!(output, "## {}\n", report.repo_url);
    let _ = writeln!(output, "- Status: {}", report.status.as_str());
    if let Some(url) = &report.file_url {
        let _ = writeln!(output, "- Scorecard: {url}");
    }
    if let Some(sha) = &report.commit_sha {
        let _ = writeln!(output, "- Commit: `{sha}`");
    }
    let _ = writeln!(output);

    match &report.repository {
        Some(repository) => append_repository(&mut output, repository),
        None => {
            let _ = writeln!(output, "### Repository\nRepository not loaded.\n");
        }
    }

    match (report.score_percent, report.score_success) {
        (Some(score), Some(status)) => {
            let _ = writeln!(output, "### Scores");
            let _ = writeln!(output, "Overall: {score}% ({})\n", status.as_str());
            let _ = writeln!(output, "| Area | Score | Status |");
            let _ = writeln!(output, "|---|---|---|");
            for area in &report.areas {
                let _ = writeln!(
                    output,
                    "| {} | {}% | {} |",
                    area.title,
                    area.score_percent,
                    area.score_success.as_str()
                );
            }
            let _ = writeln!(output);
        }
        _ => {
            let _ = writeln!(output, "### Scores\nNo scorecard produced.\n");
        }
    }

    if report.errors.is_empty() {
        let _ = writeln!(output, "### Errors\nNo errors reported.\n");
    } else {
        let _ = writeln!(output, "### Errors");
        for error in &report.errors {
            let _ = writeln!(output, "- {error}");
        }
        let _ = writeln!(output);
    }
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

/// Byte histogram as percentages sorted by share.
pub fn language_shares(languages: &LanguageHistogram) -> Vec<(String, f64)> {
    let total: u64 = languages.values().sum();
    if total == 0 {
        return Vec::new();
    }
    let mut items: Vec<(String, f64)> = languages
        .iter()
        .map(|(name, bytes)| (name.clone(), *bytes as f64 * 100.0 / total as f64))
        .collect();
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    items
}

fn area_summaries(scorecard: &Scorecard) -> Vec<AreaSummary> {
    scorecard
        .area_scores
        .iter()
        .map(|area| AreaSummary {
            title: area.title.clone(),
            score_percent: area.score_percent,
            score_success: area.score_success,
        })
        .collect()
}

fn append_repository(output: &mut String, repository: &RepositorySummary) {
    let _ = writeln!(output, "### Repository");
    let _ = writeln!(output, "- Name: {}", repository.full_name);
    let _ = writeln!(output, "- Files: {}", repository.total_files);
    for (category, count) in &repository.categories {
        let _ = writeln!(output, "- {category}: {count}");
    }
    let _ = writeln!(output);
    if repository.languages.is_empty() {
        let _ = writeln!(output, "### Languages\nLanguages unavailable.\n");
        return;
    }
    let _ = writeln!(output, "### Languages");
    for (language, percent) in &repository.languages {
        let _ = writeln!(output, "- {language}: {percent:.2}%");
    }
    let _ = writeln!(output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::organize;
    use crate::domain::{RepositoryFile, RepositoryMetadata};
    use crate::scorecard::{EntryScores, assemble};
    use chrono::{TimeZone, Utc};

    fn completed_state() -> PipelineState {
        let files = vec![
            RepositoryFile::new("README.md", "README.md", 6, "# Demo"),
            RepositoryFile::new("src/main.rs", "main.rs", 12, "fn main() {}"),
        ];
        let bundle = RepositoryBundle {
            owner: "acme".to_string(),
            repo_name: "demo".to_string(),
            metadata: RepositoryMetadata {
                name: "demo".to_string(),
                full_name: "acme/demo".to_string(),
                ..RepositoryMetadata::default()
            },
            languages: [("Rust".to_string(), 300), ("Shell".to_string(), 100)]
                .into_iter()
                .collect(),
            organized_files: organize(&files),
            files,
        };
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let mut state = PipelineState::new("https://github.com/acme/demo");
        state.scorecard = Some(assemble("demo", &EntryScores::new(), time));
        state.bundle = Some(bundle);
        state.commit_sha = Some("c0ffee".to_string());
        state.commit_result = Some("Scorecard committed successfully".to_string());
        state.file_url =
            Some("https://github.com/acme/demo/blob/main/component-score.json".to_string());
        state.status = PipelineStatus::Complete;
        state
    }

    #[test]
    fn renders_text_summary() {
        let report = RunReport::from_state(&completed_state());
        assert!(report.is_complete());
        let output = render_text(&report);
        assert!(output.contains("Status: complete"));
        assert!(output.contains("Loaded: acme/demo (2 files)"));
        assert!(output.contains("Overall score: 50% (warning)"));
        assert!(output.contains("  Code Quality: 50% (warning)"));
        assert!(output.contains("Commit: c0ffee"));
        assert!(
            output.contains("File: https://github.com/acme/demo/blob/main/component-score.json")
        );
        assert!(!output.contains("Error:"));
    }

    #[test]
    fn renders_failed_run_markdown() {
        let mut state = PipelineState::new("https://github.com/acme");
        state.status = PipelineStatus::Failed;
        state.errors.push("Repository loading error: invalid".to_string());
        let report = RunReport::from_state(&state);
        assert!(!report.is_complete());

        let output = render_markdown(&report);
        assert!(output.contains("RepoCard Report"));
        assert!(output.contains("- Status: failed"));
        assert!(output.contains("Repository not loaded."));
        assert!(output.contains("No scorecard produced."));
        assert!(output.contains("- Repository loading error: invalid"));
    }

    #[test]
    fn renders_completed_markdown() {
        let output = render_markdown(&RunReport::from_state(&completed_state()));
        assert!(output.contains("- Rust: 75.00%"));
        assert!(output.contains("- source_code: 1"));
        assert!(output.contains("| Testing | 50% | warning |"));
        assert!(output.contains("No errors reported."));
    }

    #[test]
    fn renders_json_payload() {
        let report = RunReport::from_state(&completed_state());
        let json = render_json(&report).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed["status"], "complete");
        assert_eq!(parsed["commitSha"], "c0ffee");
        assert_eq!(parsed["scorePercent"], 50);
        assert_eq!(parsed["repository"]["categories"]["documentation"], 1);
        assert_eq!(parsed["areas"][0]["scoreSuccess"], "warning");
    }

    #[test]
    fn language_shares_sorted_by_size() {
        let histogram: LanguageHistogram = [("Go".to_string(), 10), ("Rust".to_string(), 30)]
            .into_iter()
            .collect();
        let shares = language_shares(&histogram);
        assert_eq!(shares[0].0, "Rust");
        assert_eq!(shares[0].1, 75.0);
        assert!(language_shares(&LanguageHistogram::new()).is_empty());
    }
}
