//! Typed manifest model
//!
//! A `.silan-cache` file describes structure and sync metadata for a
//! collection or item without containing prose content. The payload is a
//! closed sum type with one variant per manifest content type: unknown
//! shapes are a validation error, never accepted silently.
//!
//! Manifests are re-parsed fresh from disk on every pass and never
//! mutated in place.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::{ContentStatus, ContentType, Difficulty, FileKind, Priority};
use super::relationship::RelatedContentRef;

/// Level of a manifest within the content tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestLevel {
    Root,
    Collection,
    Item,
}

impl std::fmt::Display for ManifestLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestLevel::Root => write!(f, "root"),
            ManifestLevel::Collection => write!(f, "collection"),
            ManifestLevel::Item => write!(f, "item"),
        }
    }
}

/// The `content_type` value of a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestType {
    Root,
    BlogCollection,
    ProjectsCollection,
    IdeasCollection,
    EpisodesCollection,
    /// Resume has a single manifest that is both collection and item:
    /// it carries the `resume_files` registry directly.
    ResumeCollection,
    BlogPost,
    VlogSeries,
    ProjectFiles,
    IdeaProject,
    EpisodeSeries,
}

impl ManifestType {
    /// The level this manifest type is expected at
    pub fn level(&self) -> ManifestLevel {
        match self {
            ManifestType::Root => ManifestLevel::Root,
            ManifestType::BlogCollection
            | ManifestType::ProjectsCollection
            | ManifestType::IdeasCollection
            | ManifestType::EpisodesCollection
            | ManifestType::ResumeCollection => ManifestLevel::Collection,
            ManifestType::BlogPost
            | ManifestType::VlogSeries
            | ManifestType::ProjectFiles
            | ManifestType::IdeaProject
            | ManifestType::EpisodeSeries => ManifestLevel::Item,
        }
    }

    /// The logical content type of items governed by this manifest
    pub fn content_type(&self) -> Option<ContentType> {
        match self {
            ManifestType::Root => None,
            ManifestType::BlogCollection | ManifestType::BlogPost | ManifestType::VlogSeries => {
                Some(ContentType::Blog)
            }
            ManifestType::ProjectsCollection | ManifestType::ProjectFiles => {
                Some(ContentType::Project)
            }
            ManifestType::IdeasCollection | ManifestType::IdeaProject => Some(ContentType::Idea),
            ManifestType::EpisodesCollection | ManifestType::EpisodeSeries => {
                Some(ContentType::Episode)
            }
            ManifestType::ResumeCollection => Some(ContentType::Resume),
        }
    }
}

impl std::fmt::Display for ManifestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ManifestType::Root => "root",
            ManifestType::BlogCollection => "blog_collection",
            ManifestType::ProjectsCollection => "projects_collection",
            ManifestType::IdeasCollection => "ideas_collection",
            ManifestType::EpisodesCollection => "episodes_collection",
            ManifestType::ResumeCollection => "resume_collection",
            ManifestType::BlogPost => "blog_post",
            ManifestType::VlogSeries => "vlog_series",
            ManifestType::ProjectFiles => "project_files",
            ManifestType::IdeaProject => "idea_project",
            ManifestType::EpisodeSeries => "episode_series",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ManifestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "root" => Ok(ManifestType::Root),
            "blog_collection" => Ok(ManifestType::BlogCollection),
            "projects_collection" => Ok(ManifestType::ProjectsCollection),
            "ideas_collection" => Ok(ManifestType::IdeasCollection),
            "episodes_collection" => Ok(ManifestType::EpisodesCollection),
            "resume_collection" => Ok(ManifestType::ResumeCollection),
            "blog_post" => Ok(ManifestType::BlogPost),
            "vlog_series" => Ok(ManifestType::VlogSeries),
            "project_files" => Ok(ManifestType::ProjectFiles),
            "idea_project" => Ok(ManifestType::IdeaProject),
            "episode_series" => Ok(ManifestType::EpisodeSeries),
            _ => Err(format!("Unknown content_type: {}", s)),
        }
    }
}

/// How item fields are combined with existing database rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Update fields in place, keep database-only columns
    #[default]
    Merge,
    /// Replace the row wholesale
    Replace,
}

/// Policy for items where both disk and database changed since last sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Files on disk win; the row is overwritten
    #[default]
    LocalWins,
    /// The database row wins; the item is skipped
    RemoteWins,
    /// Hold the item for operator review; report, do not write
    Manual,
}

impl std::fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictStrategy::LocalWins => write!(f, "local_wins"),
            ConflictStrategy::RemoteWins => write!(f, "remote_wins"),
            ConflictStrategy::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "local_wins" | "local" => Ok(ConflictStrategy::LocalWins),
            "remote_wins" | "remote" => Ok(ConflictStrategy::RemoteWins),
            "manual" => Ok(ConflictStrategy::Manual),
            _ => Err(format!("Unknown conflict strategy: {}", s)),
        }
    }
}

/// Sync behavior knobs declared per manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub merge_strategy: MergeStrategy,

    /// Declared conflict strategy; `None` falls back to the workspace
    /// configuration
    pub conflict_resolution: Option<ConflictStrategy>,

    /// Keep existing database primary keys on update so foreign keys held
    /// by comments/likes/views survive
    pub preserve_ids: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            merge_strategy: MergeStrategy::Merge,
            conflict_resolution: None,
            preserve_ids: true,
        }
    }
}

/// Reference from the root manifest to a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    pub collection_id: String,
    pub directory_path: PathBuf,
    pub content_type: ContentType,
}

/// One item registration inside a collection manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Stable item id, also the directory name by convention
    pub id: String,

    /// Item directory relative to the collection directory
    pub directory_path: PathBuf,

    pub sort_order: i64,

    pub status: Option<ContentStatus>,

    pub priority: Option<Priority>,

    pub difficulty: Option<Difficulty>,
}

/// One file registration inside an item manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRegistration {
    /// File path relative to the manifest's directory
    pub path: PathBuf,

    pub language: Option<String>,

    #[serde(default)]
    pub file_type: FileKind,

    #[serde(default)]
    pub is_primary: bool,

    pub sort_order: Option<i64>,
}

/// Type-specific info block of an item manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub title: Option<String>,

    pub status: Option<ContentStatus>,

    pub priority: Option<Priority>,

    pub difficulty: Option<Difficulty>,

    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub has_series_config: bool,

    #[serde(default)]
    pub supports_multilang: bool,

    /// Declared language codes; with `supports_multilang` every entry must
    /// resolve to an existing file
    #[serde(default)]
    pub language_variants: Vec<String>,

    pub sort_order: Option<i64>,
}

/// Payload of a manifest, one variant per `content_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestPayload {
    Root {
        collections: Vec<CollectionRef>,
    },
    BlogCollection {
        posts: Vec<RegistryEntry>,
    },
    ProjectsCollection {
        projects: Vec<RegistryEntry>,
    },
    IdeasCollection {
        ideas: Vec<RegistryEntry>,
    },
    EpisodesCollection {
        series: Vec<RegistryEntry>,
    },
    ResumeCollection {
        files: Vec<FileRegistration>,
    },
    BlogPost {
        info: ItemInfo,
        files: Vec<FileRegistration>,
    },
    VlogSeries {
        info: ItemInfo,
        files: Vec<FileRegistration>,
    },
    ProjectFiles {
        info: ItemInfo,
        files: Vec<FileRegistration>,
    },
    IdeaProject {
        info: ItemInfo,
        files: Vec<FileRegistration>,
    },
    EpisodeSeries {
        info: ItemInfo,
        episodes: Vec<FileRegistration>,
    },
}

impl ManifestPayload {
    /// Registry entries of a collection payload
    pub fn registry(&self) -> Option<&[RegistryEntry]> {
        match self {
            ManifestPayload::BlogCollection { posts } => Some(posts),
            ManifestPayload::ProjectsCollection { projects } => Some(projects),
            ManifestPayload::IdeasCollection { ideas } => Some(ideas),
            ManifestPayload::EpisodesCollection { series } => Some(series),
            _ => None,
        }
    }

    /// File registrations of an item payload
    pub fn files(&self) -> Option<&[FileRegistration]> {
        match self {
            ManifestPayload::ResumeCollection { files }
            | ManifestPayload::BlogPost { files, .. }
            | ManifestPayload::VlogSeries { files, .. }
            | ManifestPayload::ProjectFiles { files, .. }
            | ManifestPayload::IdeaProject { files, .. } => Some(files),
            ManifestPayload::EpisodeSeries { episodes, .. } => Some(episodes),
            _ => None,
        }
    }

    /// Info block of an item payload
    pub fn info(&self) -> Option<&ItemInfo> {
        match self {
            ManifestPayload::BlogPost { info, .. }
            | ManifestPayload::VlogSeries { info, .. }
            | ManifestPayload::ProjectFiles { info, .. }
            | ManifestPayload::IdeaProject { info, .. }
            | ManifestPayload::EpisodeSeries { info, .. } => Some(info),
            _ => None,
        }
    }
}

/// Parsed and validated representation of one `.silan-cache` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentManifest {
    /// Manifest path relative to the content root
    pub path: PathBuf,

    pub item_id: String,

    pub manifest_type: ManifestType,

    pub last_update_time: Option<DateTime<Utc>>,

    pub last_file_hash: Option<String>,

    pub sync_enabled: bool,

    pub settings: SyncSettings,

    pub related_content: Vec<RelatedContentRef>,

    pub payload: ManifestPayload,
}

impl ContentManifest {
    /// Directory containing this manifest, relative to the content root
    pub fn directory(&self) -> PathBuf {
        self.path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default()
    }

    /// Level of this manifest
    pub fn level(&self) -> ManifestLevel {
        self.manifest_type.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_type_parses_all_known_values() {
        let values = [
            "root",
            "blog_collection",
            "projects_collection",
            "ideas_collection",
            "episodes_collection",
            "resume_collection",
            "blog_post",
            "vlog_series",
            "project_files",
            "idea_project",
            "episode_series",
        ];
        for v in values {
            assert!(v.parse::<ManifestType>().is_ok(), "should parse {}", v);
        }
        assert!("gallery".parse::<ManifestType>().is_err());
    }

    #[test]
    fn manifest_type_levels() {
        assert_eq!("root".parse::<ManifestType>().unwrap().level(), ManifestLevel::Root);
        assert_eq!(
            "blog_collection".parse::<ManifestType>().unwrap().level(),
            ManifestLevel::Collection
        );
        assert_eq!(
            "blog_post".parse::<ManifestType>().unwrap().level(),
            ManifestLevel::Item
        );
        // Resume is collection-level but carries its file registry directly.
        assert_eq!(
            "resume_collection".parse::<ManifestType>().unwrap().level(),
            ManifestLevel::Collection
        );
    }

    #[test]
    fn conflict_strategy_accepts_cli_spellings() {
        assert_eq!(
            "remote-wins".parse::<ConflictStrategy>().unwrap(),
            ConflictStrategy::RemoteWins
        );
        assert_eq!(
            "local_wins".parse::<ConflictStrategy>().unwrap(),
            ConflictStrategy::LocalWins
        );
        assert_eq!("manual".parse::<ConflictStrategy>().unwrap(), ConflictStrategy::Manual);
        assert!("newest".parse::<ConflictStrategy>().is_err());
    }

    #[test]
    fn sync_settings_defaults() {
        let settings = SyncSettings::default();
        assert_eq!(settings.merge_strategy, MergeStrategy::Merge);
        assert_eq!(settings.conflict_resolution, None);
        assert!(settings.preserve_ids);
    }

    #[test]
    fn payload_accessors() {
        let payload = ManifestPayload::BlogCollection {
            posts: vec![RegistryEntry {
                id: "hello".into(),
                directory_path: "hello".into(),
                sort_order: 1,
                status: None,
                priority: None,
                difficulty: None,
            }],
        };
        assert_eq!(payload.registry().unwrap().len(), 1);
        assert!(payload.files().is_none());
        assert!(payload.info().is_none());
    }
}
