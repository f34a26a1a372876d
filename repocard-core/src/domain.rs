//! Domain entities for RepoCard.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A mapping of language names to the number of bytes written in them.
pub type LanguageHistogram = BTreeMap<String, u64>;

/// A decoded file fetched from the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFile {
    /// Path relative to the repository root.
    pub path: String,
    /// File name (last path segment).
    pub name: String,
    /// Content kind reported by the API, always `file`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Size in bytes as reported by the API.
    pub size: u64,
    /// Decoded UTF-8 content.
    pub content: String,
    /// Lowercase extension without the leading dot, empty when absent.
    pub extension: String,
}

impl RepositoryFile {
    /// Build a file record, deriving the extension from the name.
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        size: u64,
        content: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let extension = file_extension(&name);
        Self {
            path: path.into(),
            name,
            kind: "file".to_string(),
            size,
            content: content.into(),
            extension,
        }
    }
}

/// Lowercase extension of a file name, empty for dotfiles and bare names.
pub fn file_extension(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

/// Repository metadata reported by the hosting provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// Short repository name.
    pub name: String,
    /// `owner/name` form.
    pub full_name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Primary language detected by the provider.
    pub language: Option<String>,
    /// Creation timestamp as reported.
    pub created_at: Option<String>,
    /// Last update timestamp as reported.
    pub updated_at: Option<String>,
    /// Repository size in kilobytes.
    pub size: u64,
    /// Star count.
    pub stargazers_count: u64,
    /// Fork count.
    pub forks_count: u64,
    /// Open issue count.
    pub open_issues_count: u64,
    /// Topic labels.
    pub topics: Vec<String>,
    /// License display name.
    pub license: Option<String>,
}

/// Category assigned to every fetched file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// Program source.
    SourceCode,
    /// Configuration data.
    ConfigFiles,
    /// Prose documentation.
    Documentation,
    /// Build and dependency manifests.
    BuildFiles,
    /// Continuous integration definitions.
    CiCd,
    /// Anything else.
    Other,
}

impl FileCategory {
    /// All categories in classification order.
    pub const ALL: [FileCategory; 6] = [
        FileCategory::SourceCode,
        FileCategory::ConfigFiles,
        FileCategory::Documentation,
        FileCategory::BuildFiles,
        FileCategory::CiCd,
        FileCategory::Other,
    ];

    /// Stable snake_case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::SourceCode => "source_code",
            FileCategory::ConfigFiles => "config_files",
            FileCategory::Documentation => "documentation",
            FileCategory::BuildFiles => "build_files",
            FileCategory::CiCd => "ci_cd",
            FileCategory::Other => "other",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Files grouped by category. Every category key is always present.
pub type OrganizedFiles = BTreeMap<FileCategory, Vec<RepositoryFile>>;

/// Everything the loader collected about one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryBundle {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo_name: String,
    /// Provider metadata.
    pub metadata: RepositoryMetadata,
    /// Language byte histogram, empty when unavailable.
    pub languages: LanguageHistogram,
    /// Flat list of decoded files in traversal order.
    pub files: Vec<RepositoryFile>,
    /// The same files grouped by category.
    pub organized_files: OrganizedFiles,
}

impl RepositoryBundle {
    /// Number of decoded files.
    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    /// Files in a category; empty when the category has none.
    pub fn files_in(&self, category: FileCategory) -> &[RepositoryFile] {
        self.organized_files
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the category holds at least one file.
    pub fn has(&self, category: FileCategory) -> bool {
        !self.files_in(category).is_empty()
    }

    /// Name used as the scorecard entity reference.
    pub fn component_name(&self) -> &str {
        if self.metadata.name.is_empty() {
            &self.repo_name
        } else {
            &self.metadata.name
        }
    }
}
