#![deny(missing_docs)]
//! RepoCard command-line interface.
//!
//! Scores a GitHub repository against the quality rubric and commits the
//! scorecard, and bootstraps SonarCloud projects.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use repocard_core::report::RunReport;
use repocard_core::sonar::PROPERTIES_FILE;
use repocard_core::{
    Committer, GeminiClient, GitHubApiClient, Pipeline, PipelineState, ProjectState, RepoLoader,
    Scorer, Settings, SonarClient, SonarConfig, render_json, render_markdown, render_text,
    write_properties,
};
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

type GitHubPipeline =
    Pipeline<RepoLoader<GitHubApiClient>, Scorer<GeminiClient>, Committer<GitHubApiClient>>;

#[derive(Parser)]
#[command(name = "repocard", version, about = "RepoCard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Args, Clone)]
struct ScoreArgs {
    /// Repository URL to score.
    #[arg(long, env = "REPO_URL")]
    repo_url: Option<String>,
    /// Branch to commit the scorecard to.
    #[arg(long)]
    branch: Option<String>,
    /// Maximum directory depth to traverse.
    #[arg(long)]
    max_depth: Option<usize>,
    /// Model used for scoring.
    #[arg(long)]
    model: Option<String>,
    #[command(flatten)]
    report: OutputArgs,
}

#[derive(Args, Clone)]
struct SonarArgs {
    /// Where to write the analysis properties file.
    #[arg(long, default_value = PROPERTIES_FILE)]
    properties_output: PathBuf,
    /// Only ensure the project exists.
    #[arg(long)]
    skip_properties: bool,
    #[command(flatten)]
    report: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, score and commit a scorecard for one repository.
    Score(ScoreArgs),
    /// Ensure a SonarCloud project exists and write its properties file.
    SonarBootstrap(SonarArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SonarReport {
    project_key: String,
    organization: String,
    created: bool,
    properties_file: Option<PathBuf>,
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Score(args) => run_score(args).await?,
        Commands::SonarBootstrap(args) => run_sonar_bootstrap(args).await?,
    }
    Ok(())
}

#[cfg(test)]
fn main() {}

async fn run_score(args: ScoreArgs) -> CliResult<()> {
    let mut settings = Settings::from_env()?;
    apply_overrides(&mut settings, &args);
    let repo_url = args.repo_url.clone().unwrap_or_default();

    // Blocking clients must be created and dropped off the async runtime.
    let state = tokio::task::spawn_blocking(move || -> CliResult<PipelineState> {
        let pipeline = build_pipeline(&settings)?;
        Ok(pipeline.run(&repo_url))
    })
    .await??;

    let report = RunReport::from_state(&state);
    emit_run_report(&report, &args.report).await?;
    if !report.is_complete() {
        return Err(format!("pipeline finished with status {}", report.status.as_str()).into());
    }
    Ok(())
}

fn apply_overrides(settings: &mut Settings, args: &ScoreArgs) {
    if let Some(branch) = &args.branch {
        settings.commit.branch = branch.trim().to_string();
    }
    if let Some(max_depth) = args.max_depth {
        settings.loader.max_depth = max_depth;
    }
    if let Some(model) = &args.model {
        settings.model.model = model.trim().to_string();
    }
}

fn build_pipeline(settings: &Settings) -> CliResult<GitHubPipeline> {
    let github = GitHubApiClient::new(&settings.github)?;
    let committer = Committer::new(
        github.clone(),
        settings.commit.clone(),
        settings.github.web_url.clone(),
    )?;
    let scorer = Scorer::new(GeminiClient::new(&settings.model)?);
    let loader = RepoLoader::with_config(github, settings.loader);
    Ok(Pipeline::new(loader, scorer, committer))
}

async fn run_sonar_bootstrap(args: SonarArgs) -> CliResult<()> {
    let config = SonarConfig::from_env()?;
    let properties = (!args.skip_properties).then(|| args.properties_output.clone());

    let report = tokio::task::spawn_blocking(move || bootstrap_sonar(config, properties.as_deref()))
        .await??;
    let contents = match args.report.format {
        OutputFormat::Text | OutputFormat::Markdown => render_sonar_text(&report),
        OutputFormat::Json => render_json(&report)?,
    };
    emit_output(&args.report, contents).await
}

fn bootstrap_sonar(config: SonarConfig, properties: Option<&Path>) -> CliResult<SonarReport> {
    let client = SonarClient::new(config.clone())?;
    let state = client.ensure_project()?;
    if let Some(path) = properties {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        write_properties(&config, path)?;
    } else {
        info!("skipping properties file");
    }
    Ok(SonarReport {
        project_key: config.project_key,
        organization: config.organization,
        created: state == ProjectState::Created,
        properties_file: properties.map(Path::to_path_buf),
    })
}

fn render_sonar_text(report: &SonarReport) -> String {
    let mut output = String::new();
    let status = if report.created { "created" } else { "already exists" };
    let _ = writeln!(
        output,
        "Project: {} ({}) {status}",
        report.project_key, report.organization
    );
    match &report.properties_file {
        Some(path) => {
            let _ = writeln!(output, "Properties: {}", path.display());
        }
        None => {
            let _ = writeln!(output, "Properties: skipped");
        }
    }
    output
}

async fn emit_run_report(report: &RunReport, output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Markdown => render_markdown(report),
        OutputFormat::Json => render_json(report)?,
    };
    emit_output(output, contents).await
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}
