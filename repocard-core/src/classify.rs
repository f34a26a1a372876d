//! Relevance filtering and categorization of repository files.

use crate::domain::{FileCategory, OrganizedFiles, RepositoryFile, file_extension};

/// Directories never descended into during traversal.
const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    ".pytest_cache",
    "venv",
    "env",
    "target",
    "build",
    "dist",
    ".next",
];

/// Path fragments that mark a file as configuration worth fetching.
const CONFIG_MARKERS: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pom.xml",
    "build.gradle",
    "dockerfile",
    "docker-compose.yml",
    "catalog-info.yaml",
    ".github/workflows",
    "terraform",
    "k8s",
    "kubernetes",
];

/// Whether a directory with this name should be skipped.
pub fn is_skipped_dir(name: &str) -> bool {
    SKIP_DIRS.contains(&name)
}

/// Whether a file is worth fetching and decoding.
pub fn is_relevant_file(name: &str, path: &str) -> bool {
    if is_fetched_extension(&file_extension(name)) {
        return true;
    }

    let path = path.to_lowercase();
    if CONFIG_MARKERS.iter().any(|marker| path.contains(marker)) {
        return true;
    }

    matches!(
        name.to_lowercase().as_str(),
        "readme.md"
            | "readme.txt"
            | "license"
            | "changelog.md"
            | "contributing.md"
            | "security.md"
            | "makefile"
    )
}

/// Assign a file to exactly one category. The first matching rule wins.
pub fn classify(file: &RepositoryFile) -> FileCategory {
    let name = file.name.to_lowercase();
    let path = file.path.to_lowercase();
    let ext = file.extension.as_str();

    if is_source_extension(ext) {
        FileCategory::SourceCode
    } else if is_config_extension(ext) || matches!(name.as_str(), "dockerfile" | "makefile") {
        FileCategory::ConfigFiles
    } else if matches!(ext, "md" | "txt" | "rst") || name.contains("readme") {
        FileCategory::Documentation
    } else if is_build_file(&name) {
        FileCategory::BuildFiles
    } else if path.contains(".github/workflows")
        || path.contains("jenkins")
        || name.starts_with(".gitlab-ci")
    {
        FileCategory::CiCd
    } else {
        FileCategory::Other
    }
}

/// Group files by category. Every category key is present in the result.
pub fn organize(files: &[RepositoryFile]) -> OrganizedFiles {
    let mut organized: OrganizedFiles = FileCategory::ALL
        .iter()
        .map(|category| (*category, Vec::new()))
        .collect();
    for file in files {
        organized
            .entry(classify(file))
            .or_default()
            .push(file.clone());
    }
    organized
}

fn is_source_extension(ext: &str) -> bool {
    matches!(
        ext,
        "py" | "js"
            | "ts"
            | "jsx"
            | "tsx"
            | "java"
            | "cpp"
            | "c"
            | "cs"
            | "go"
            | "rb"
            | "php"
            | "swift"
            | "kt"
            | "rs"
            | "scala"
    )
}

fn is_fetched_extension(ext: &str) -> bool {
    is_source_extension(ext)
        || matches!(ext, "sh" | "yml" | "yaml" | "json" | "xml" | "dockerfile" | "tf")
}

fn is_config_extension(ext: &str) -> bool {
    matches!(ext, "json" | "yml" | "yaml" | "xml" | "toml" | "ini" | "conf")
}

fn is_build_file(name: &str) -> bool {
    matches!(
        name,
        "package.json"
            | "requirements.txt"
            | "pom.xml"
            | "build.gradle"
            | "setup.py"
            | "cargo.toml"
    )
}
