//! Content item domain model
//!
//! A content item is one logical unit of content (a blog post, a project,
//! an idea, an episode series, a resume), possibly spanning multiple files
//! and languages. Items are pure data: all I/O lives in the parser and
//! storage layers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::relationship::RelatedContentRef;

/// Logical content type of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Blog,
    Project,
    Idea,
    Episode,
    Resume,
}

impl ContentType {
    /// Returns all content types, in sync order
    pub fn all() -> &'static [ContentType] {
        &[
            ContentType::Blog,
            ContentType::Project,
            ContentType::Idea,
            ContentType::Episode,
            ContentType::Resume,
        ]
    }

    /// Collection directory name under the content root
    pub fn collection_dir(&self) -> &'static str {
        match self {
            ContentType::Blog => "blog",
            ContentType::Project => "projects",
            ContentType::Idea => "ideas",
            ContentType::Episode => "episodes",
            ContentType::Resume => "resume",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Blog => write!(f, "blog"),
            ContentType::Project => write!(f, "project"),
            ContentType::Idea => write!(f, "idea"),
            ContentType::Episode => write!(f, "episode"),
            ContentType::Resume => write!(f, "resume"),
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blog" => Ok(ContentType::Blog),
            "project" | "projects" => Ok(ContentType::Project),
            "idea" | "ideas" => Ok(ContentType::Idea),
            "episode" | "episodes" => Ok(ContentType::Episode),
            "resume" => Ok(ContentType::Resume),
            _ => Err(format!("Unknown content type: {}", s)),
        }
    }
}

/// Publication status of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Draft,
    Active,
    Published,
    Implemented,
    Completed,
    Archived,
    Deprecated,
    Planned,
}

impl ContentStatus {
    /// Returns all valid status values
    pub fn all() -> &'static [ContentStatus] {
        &[
            ContentStatus::Draft,
            ContentStatus::Active,
            ContentStatus::Published,
            ContentStatus::Implemented,
            ContentStatus::Completed,
            ContentStatus::Archived,
            ContentStatus::Deprecated,
            ContentStatus::Planned,
        ]
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Active => "active",
            ContentStatus::Published => "published",
            ContentStatus::Implemented => "implemented",
            ContentStatus::Completed => "completed",
            ContentStatus::Archived => "archived",
            ContentStatus::Deprecated => "deprecated",
            ContentStatus::Planned => "planned",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ContentStatus::Draft),
            "active" => Ok(ContentStatus::Active),
            "published" => Ok(ContentStatus::Published),
            "implemented" => Ok(ContentStatus::Implemented),
            "completed" | "complete" => Ok(ContentStatus::Completed),
            "archived" => Ok(ContentStatus::Archived),
            "deprecated" => Ok(ContentStatus::Deprecated),
            "planned" => Ok(ContentStatus::Planned),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Priority declared in manifests (projects and ideas)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Difficulty declared in manifests (ideas)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            "expert" => Ok(Difficulty::Expert),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

/// Role a file plays within an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Single-file content (blog posts, resume)
    #[default]
    Content,
    Overview,
    Progress,
    Reference,
    Result,
    Episode,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileKind::Content => "content",
            FileKind::Overview => "overview",
            FileKind::Progress => "progress",
            FileKind::Reference => "reference",
            FileKind::Result => "result",
            FileKind::Episode => "episode",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "content" => Ok(FileKind::Content),
            "overview" => Ok(FileKind::Overview),
            "progress" => Ok(FileKind::Progress),
            "reference" => Ok(FileKind::Reference),
            "result" => Ok(FileKind::Result),
            "episode" => Ok(FileKind::Episode),
            _ => Err(format!("Unknown file type: {}", s)),
        }
    }
}

/// Parsed YAML frontmatter of a markdown file
///
/// `title` is the only key every content type requires; everything else is
/// kept as-is so per-type parsers can pull what they need.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frontmatter {
    pub title: Option<String>,

    pub status: Option<ContentStatus>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Frontmatter {
    /// Gets an extra value by key
    pub fn get(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.extra.get(key)
    }

    /// Gets an extra value as a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

/// One physical markdown file belonging to an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFile {
    /// Path relative to the item directory
    pub rel_path: PathBuf,

    /// Language code ("en", "zh", ...)
    pub language: String,

    /// Role within the item
    pub kind: FileKind,

    /// Parsed frontmatter
    pub frontmatter: Frontmatter,

    /// Raw markdown body (frontmatter excluded)
    pub body: String,

    /// Whether this is the primary language variant
    pub is_primary: bool,

    /// Ordering within the item (episodes)
    pub sort_order: Option<i64>,
}

/// One language variant of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageVariant {
    pub path: PathBuf,
    pub is_primary: bool,
}

/// One logical content entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable id derived from the directory or file name
    pub id: String,

    pub content_type: ContentType,

    pub title: String,

    pub status: ContentStatus,

    pub sort_order: i64,

    /// Item directory relative to the content root
    pub directory_path: PathBuf,

    /// Language code -> variant. Exactly one variant is primary.
    pub language_variants: BTreeMap<String, LanguageVariant>,

    /// Declared references to other items, resolved in a later phase
    #[serde(default)]
    pub related_content: Vec<RelatedContentRef>,

    /// Deterministic hash over all constituent files
    pub content_hash: String,

    /// Constituent files, in registry order
    pub files: Vec<ContentFile>,

    /// Type-specific metadata carried to the database as JSON
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ContentItem {
    /// Returns the primary language variant, if any
    pub fn primary_variant(&self) -> Option<(&String, &LanguageVariant)> {
        self.language_variants.iter().find(|(_, v)| v.is_primary)
    }

    /// Returns the primary language code, defaulting to "en"
    pub fn primary_language(&self) -> &str {
        self.primary_variant()
            .map(|(lang, _)| lang.as_str())
            .unwrap_or("en")
    }
}
