//! Rubric scoring through a language model with a heuristic fallback.

use std::fmt::Write;

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::Value;

use crate::domain::{FileCategory, RepositoryBundle, RepositoryFile};
use crate::error::ScoringError;
use crate::model::ModelClient;
use crate::scorecard::{EntryScore, EntryScores, Scorecard, assemble};

/// Attempts made against the model before falling back.
pub const MAX_ATTEMPTS: usize = 3;

const README_LIMIT: usize = 2000;
const BUILD_LIMIT: usize = 1000;
const CI_LIMIT: usize = 1000;
const SOURCE_LIMIT: usize = 1500;
const SOURCE_SAMPLES: usize = 3;
const KEY_BUILD_FILES: &[&str] = &["package.json", "requirements.txt", "pom.xml", "cargo.toml"];

const ANALYSIS_INSTRUCTIONS: &str = r#"You are an expert code reviewer analyzing a repository. You MUST return a valid JSON response only.

Analyze the repository and provide scores (0-100) for these 10 entries:
1. Documentation - README quality, comments, API docs
2. Static Code Analysis - Linting tools, code quality checks
3. Code Structure - Organization, patterns, maintainability
4. CI/CD Pipeline - Automated workflows, GitHub Actions
5. Dependency Management - Package files, updates
6. Configuration Management - Config files, environment handling
7. Security Practices - Security headers, input validation
8. Secrets Management - No hardcoded secrets, env variables
9. Test Coverage - Test files, testing frameworks
10. Test Quality - Test structure and implementation

You MUST return ONLY this JSON format with no additional text:
{
  "entries": {
    "1": {"score": 80, "details": "Good README with comprehensive documentation"},
    "2": {"score": 70, "details": "Basic linting configuration found"},
    "3": {"score": 85, "details": "Well-organized code structure with clear patterns"},
    "4": {"score": 90, "details": "GitHub Actions workflow properly configured"},
    "5": {"score": 75, "details": "Package dependencies regularly maintained"},
    "6": {"score": 60, "details": "Basic environment configuration present"},
    "7": {"score": 65, "details": "Some security practices implemented"},
    "8": {"score": 80, "details": "No hardcoded secrets detected"},
    "9": {"score": 50, "details": "Limited test coverage identified"},
    "10": {"score": 60, "details": "Basic test implementation found"}
  }
}

IMPORTANT: Return ONLY the JSON above, no explanations or additional text."#;

/// A labelled excerpt of a repository file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFile {
    /// Label shown in the prompt.
    pub label: String,
    /// Truncated file content.
    pub content: String,
}

/// Scores bundles against the rubric.
#[derive(Debug, Clone)]
pub struct Scorer<M: ModelClient> {
    model: M,
    max_attempts: usize,
}

impl<M: ModelClient> Scorer<M> {
    /// Create a scorer that makes up to [`MAX_ATTEMPTS`] model calls.
    pub fn new(model: M) -> Self {
        Self {
            model,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Score a bundle. Every failure resolves to [`fallback_scores`].
    pub fn score(&self, bundle: &RepositoryBundle) -> Scorecard {
        info!("scoring {}", bundle.component_name());
        let prompt = build_prompt(bundle);
        let entries = match retry(self.max_attempts, |attempt| {
            debug!("model attempt {attempt}/{}", self.max_attempts);
            let text = self.model.generate(&prompt)?;
            parse_and_validate(&text)
        }) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("model scoring failed ({err}); using heuristic scores");
                fallback_scores(bundle)
            }
        };
        assemble(bundle.component_name(), &entries, Utc::now())
    }
}

/// Run `attempt` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` calls have been made. Attempts are numbered from 1.
pub fn retry<T, F>(max_attempts: usize, mut attempt: F) -> Result<T, ScoringError>
where
    F: FnMut(usize) -> Result<T, ScoringError>,
{
    let mut last_error = ScoringError::EmptyResponse;
    for number in 1..=max_attempts.max(1) {
        match attempt(number) {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                debug!("attempt {number} failed: {err}");
                last_error = err;
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_error)
}

/// Repository summary lines for the prompt.
pub fn build_context(bundle: &RepositoryBundle) -> String {
    let metadata = &bundle.metadata;
    let mut context = String::new();
    let full_name = if metadata.full_name.is_empty() {
        "Unknown"
    } else {
        metadata.full_name.as_str()
    };
    let _ = writeln!(context, "Repository: {full_name}");
    let _ = writeln!(
        context,
        "Description: {}",
        metadata.description.as_deref().unwrap_or("No description")
    );
    let _ = writeln!(
        context,
        "Primary Language: {}",
        metadata.language.as_deref().unwrap_or("Unknown")
    );
    if !bundle.languages.is_empty() {
        let names: Vec<&str> = bundle.languages.keys().map(String::as_str).collect();
        let _ = writeln!(context, "Languages: {}", names.join(", "));
    }
    let _ = writeln!(context, "Total Files: {}", bundle.total_files());
    let counts = [
        ("Source Code Files", FileCategory::SourceCode),
        ("Config Files", FileCategory::ConfigFiles),
        ("Documentation Files", FileCategory::Documentation),
        ("Build Files", FileCategory::BuildFiles),
        ("CI/CD Files", FileCategory::CiCd),
    ];
    for (label, category) in counts {
        let _ = writeln!(context, "{label}: {}", bundle.files_in(category).len());
    }
    context.trim_end().to_string()
}

/// Select and truncate the files shown to the model.
pub fn key_files(bundle: &RepositoryBundle) -> Vec<KeyFile> {
    let mut selected = Vec::new();

    if let Some(readme) = bundle
        .files_in(FileCategory::Documentation)
        .iter()
        .find(|file| file.name.to_lowercase().contains("readme"))
    {
        selected.push(excerpt("readme".to_string(), readme, README_LIMIT));
    }

    if let Some(build) = bundle
        .files_in(FileCategory::BuildFiles)
        .iter()
        .find(|file| KEY_BUILD_FILES.contains(&file.name.to_lowercase().as_str()))
    {
        selected.push(excerpt(build.name.clone(), build, BUILD_LIMIT));
    }

    if let Some(ci) = bundle.files_in(FileCategory::CiCd).first() {
        selected.push(excerpt(format!("cicd_{}", ci.name), ci, CI_LIMIT));
    }

    for (index, source) in bundle
        .files_in(FileCategory::SourceCode)
        .iter()
        .take(SOURCE_SAMPLES)
        .enumerate()
    {
        let label = format!("source_{}_{}", index + 1, source.name);
        selected.push(excerpt(label, source, SOURCE_LIMIT));
    }

    selected
}

/// Full prompt: instructions, a blank line, then repository evidence.
pub fn build_prompt(bundle: &RepositoryBundle) -> String {
    let files = key_files(bundle)
        .iter()
        .map(|file| format!("=== {} ===\n{}", file.label, file.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "{ANALYSIS_INSTRUCTIONS}\n\nRepository Context:\n{}\n\nKey Files Content:\n{files}\n\nAnalyze this repository and provide scores for all 10 entries based on the evidence.",
        build_context(bundle)
    )
}

/// Keep the first fenced block, if any, then cut it down to its outermost
/// `{...}` span.
pub fn clean_response(text: &str) -> &str {
    let mut cleaned = text.trim();
    let body_start = cleaned
        .find("```json")
        .map(|index| index + "```json".len())
        .or_else(|| cleaned.find("```").map(|index| index + "```".len()));
    if let Some(start) = body_start {
        let body = &cleaned[start..];
        cleaned = body.find("```").map_or(body, |end| &body[..end]);
    }
    let cleaned = cleaned.trim();
    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => cleaned,
    }
}

/// Parse a model response into per-entry scores.
///
/// The response must be an object with a non-empty `entries` object whose
/// values all carry a numeric `score` and a string `details`. Keys that are
/// not numeric ids are dropped after validation.
pub fn parse_and_validate(text: &str) -> Result<EntryScores, ScoringError> {
    if text.trim().is_empty() {
        return Err(ScoringError::EmptyResponse);
    }
    let cleaned = clean_response(text);
    if cleaned.is_empty() {
        return Err(ScoringError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|err| ScoringError::ResponseUnparsable(err.to_string()))?;
    let entries = value
        .get("entries")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ScoringError::ResponseInvalidShape("missing 'entries' object".to_string())
        })?;
    if entries.is_empty() {
        return Err(ScoringError::ResponseInvalidShape("'entries' is empty".to_string()));
    }

    let mut scores = EntryScores::new();
    for (key, entry) in entries {
        let score = entry.get("score").and_then(Value::as_f64);
        let details = entry.get("details").and_then(Value::as_str);
        let (Some(score), Some(details)) = (score, details) else {
            return Err(ScoringError::ResponseInvalidShape(format!(
                "entry {key} needs a numeric 'score' and string 'details'"
            )));
        };
        match key.trim().parse::<u32>() {
            Ok(id) => {
                scores.insert(id, EntryScore::from_raw(score, details));
            }
            Err(_) => debug!("ignoring non-numeric entry key '{key}'"),
        }
    }
    Ok(scores)
}

/// Heuristic scores from category presence alone.
pub fn fallback_scores(bundle: &RepositoryBundle) -> EntryScores {
    let by_presence = |category: FileCategory, present: u8, absent: u8| {
        if bundle.has(category) { present } else { absent }
    };
    let table = [
        (
            1,
            by_presence(FileCategory::Documentation, 80, 20),
            "Documentation analysis based on file presence",
        ),
        (2, 60, "Basic static analysis assessment"),
        (3, by_presence(FileCategory::SourceCode, 70, 30), "Code structure evaluation"),
        (4, by_presence(FileCategory::CiCd, 80, 30), "CI/CD pipeline assessment"),
        (5, by_presence(FileCategory::BuildFiles, 70, 40), "Dependency management evaluation"),
        (6, by_presence(FileCategory::ConfigFiles, 60, 30), "Configuration management assessment"),
        (7, 55, "Basic security practices evaluation"),
        (8, 70, "Secrets management assessment"),
        (9, 40, "Test coverage evaluation"),
        (10, 50, "Test quality assessment"),
    ];
    table
        .into_iter()
        .map(|(id, score, details)| (id, EntryScore::new(score, details)))
        .collect()
}

fn excerpt(label: String, file: &RepositoryFile, limit: usize) -> KeyFile {
    KeyFile {
        label,
        content: truncate_chars(&file.content, limit).to_string(),
    }
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
