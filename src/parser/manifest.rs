//! Manifest parsing and validation
//!
//! Deserializes one `.silan-cache` YAML file into a typed
//! [`ContentManifest`]. Validation is staged: (1) structural YAML parse,
//! (2) required-field presence, (3) enum membership for
//! `content_type`/`status`/`priority`/`difficulty`, (4) referenced-file
//! existence relative to the manifest's directory, (5) `sort_order`
//! uniqueness within one registry. A duplicate `sort_order` is an error,
//! never silently renumbered.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{
    CollectionRef, ContentManifest, ContentStatus, ContentType, Difficulty, FileKind,
    FileRegistration, ItemInfo, ManifestPayload, ManifestType, Priority, RegistryEntry,
    RelatedContentRef, RelationshipKind, SyncSettings,
};
use crate::error::{Result, SyncError};

/// Manifest file name used at every level of the content tree
pub const MANIFEST_FILE: &str = ".silan-cache";

// Raw deserialization targets. Enum-valued fields come in as strings so
// membership failures produce a validation error naming the field instead
// of an opaque serde message.

#[derive(Debug, Deserialize)]
struct RawManifest {
    sync_metadata: Option<RawSyncMetadata>,

    #[serde(default)]
    sync_settings: RawSyncSettings,

    collection_info: Option<RawCollectionInfo>,

    collections: Option<Vec<RawCollectionRef>>,
    blog_posts: Option<Vec<RawRegistryEntry>>,
    projects: Option<Vec<RawRegistryEntry>>,
    ideas: Option<Vec<RawRegistryEntry>>,
    episode_series: Option<Vec<RawRegistryEntry>>,
    resume_files: Option<Vec<RawFileRegistration>>,

    post_info: Option<RawItemInfo>,
    series_info: Option<RawItemInfo>,
    project_info: Option<RawItemInfo>,
    idea_info: Option<RawItemInfo>,

    files: Option<Vec<RawFileRegistration>>,
    episodes: Option<Vec<RawFileRegistration>>,

    #[serde(default)]
    related_content: Vec<RawRelatedRef>,
}

#[derive(Debug, Deserialize)]
struct RawSyncMetadata {
    item_id: Option<String>,
    content_type: Option<String>,
    last_update_time: Option<DateTime<Utc>>,
    last_file_hash: Option<String>,
    #[serde(default = "default_true")]
    sync_enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RawSyncSettings {
    merge_strategy: Option<String>,
    conflict_resolution: Option<String>,
    preserve_ids: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawCollectionInfo {
    collection_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCollectionRef {
    collection_id: String,
    directory_path: PathBuf,
    content_type: String,
}

#[derive(Debug, Deserialize)]
struct RawRegistryEntry {
    #[serde(alias = "blog_id", alias = "project_id", alias = "idea_id", alias = "series_id")]
    id: String,
    directory_path: PathBuf,
    sort_order: i64,
    status: Option<String>,
    priority: Option<String>,
    difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFileRegistration {
    path: PathBuf,
    language: Option<String>,
    file_type: Option<String>,
    #[serde(default)]
    is_primary: bool,
    sort_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawItemInfo {
    title: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    difficulty: Option<String>,
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    has_series_config: bool,
    #[serde(default)]
    supports_multilang: bool,
    #[serde(default)]
    language_variants: Vec<String>,
    sort_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawRelatedRef {
    target_type: String,
    target_id: String,
    kind: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Parses and validates the manifest at `content_root/rel_path`.
pub fn parse_manifest(content_root: &Path, rel_path: &Path) -> Result<ContentManifest> {
    let abs_path = content_root.join(rel_path);
    let text = fs::read_to_string(&abs_path).map_err(|e| SyncError::fs(rel_path, &e))?;

    parse_manifest_str(content_root, rel_path, &text)
}

/// Parses manifest text. Separated from file reading for testability.
pub fn parse_manifest_str(
    content_root: &Path,
    rel_path: &Path,
    text: &str,
) -> Result<ContentManifest> {
    // Stage 1: structural YAML parse
    let raw: RawManifest = serde_yaml::from_str(text)
        .map_err(|e| SyncError::parsing(rel_path, format!("invalid manifest YAML: {}", e)))?;

    // Stage 2: required fields
    let metadata = raw.sync_metadata.as_ref().ok_or_else(|| {
        SyncError::validation(rel_path.display().to_string(), "sync_metadata", "block is required")
    })?;

    let item_id = metadata
        .item_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            SyncError::validation(
                rel_path.display().to_string(),
                "sync_metadata.item_id",
                "field is required",
            )
        })?
        .to_string();

    let content_type_str = metadata.content_type.as_deref().ok_or_else(|| {
        SyncError::validation(&item_id, "sync_metadata.content_type", "field is required")
    })?;

    // Stage 3: enum membership
    let manifest_type: ManifestType = content_type_str
        .parse()
        .map_err(|e: String| SyncError::validation(&item_id, "sync_metadata.content_type", e))?;

    let settings = parse_settings(&item_id, &raw.sync_settings)?;
    let related_content = parse_related(&item_id, &raw.related_content)?;

    let manifest_dir = rel_path.parent().unwrap_or_else(|| Path::new(""));
    let payload = build_payload(content_root, manifest_dir, &item_id, manifest_type, &raw)?;

    Ok(ContentManifest {
        path: rel_path.to_path_buf(),
        item_id,
        manifest_type,
        last_update_time: metadata.last_update_time,
        last_file_hash: metadata.last_file_hash.clone(),
        sync_enabled: metadata.sync_enabled,
        settings,
        related_content,
        payload,
    })
}

fn parse_settings(item_id: &str, raw: &RawSyncSettings) -> Result<SyncSettings> {
    let mut settings = SyncSettings::default();

    if let Some(s) = &raw.merge_strategy {
        settings.merge_strategy = match s.as_str() {
            "merge" => crate::domain::MergeStrategy::Merge,
            "replace" => crate::domain::MergeStrategy::Replace,
            other => {
                return Err(SyncError::validation(
                    item_id,
                    "sync_settings.merge_strategy",
                    format!("Unknown merge strategy: {}", other),
                ))
            }
        };
    }
    if let Some(s) = &raw.conflict_resolution {
        settings.conflict_resolution = Some(s.parse().map_err(|e: String| {
            SyncError::validation(item_id, "sync_settings.conflict_resolution", e)
        })?);
    }
    if let Some(preserve) = raw.preserve_ids {
        settings.preserve_ids = preserve;
    }

    Ok(settings)
}

fn parse_related(item_id: &str, raw: &[RawRelatedRef]) -> Result<Vec<RelatedContentRef>> {
    raw.iter()
        .map(|r| {
            let target_type: ContentType = r.target_type.parse().map_err(|e: String| {
                SyncError::validation(item_id, "related_content.target_type", e)
            })?;
            let kind = match &r.kind {
                Some(k) => k
                    .parse::<RelationshipKind>()
                    .map_err(|e| SyncError::validation(item_id, "related_content.kind", e))?,
                None => RelationshipKind::Related,
            };
            Ok(RelatedContentRef {
                target_type,
                target_id: r.target_id.clone(),
                kind,
            })
        })
        .collect()
}

fn build_payload(
    content_root: &Path,
    manifest_dir: &Path,
    item_id: &str,
    manifest_type: ManifestType,
    raw: &RawManifest,
) -> Result<ManifestPayload> {
    match manifest_type {
        ManifestType::Root => {
            let collections = raw
                .collections
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|c| {
                    Ok(CollectionRef {
                        collection_id: c.collection_id.clone(),
                        directory_path: c.directory_path.clone(),
                        content_type: c.content_type.parse().map_err(|e: String| {
                            SyncError::validation(item_id, "collections.content_type", e)
                        })?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ManifestPayload::Root { collections })
        }

        ManifestType::BlogCollection => Ok(ManifestPayload::BlogCollection {
            posts: collection_registry(content_root, manifest_dir, item_id, "blog_posts", &raw.blog_posts, raw)?,
        }),
        ManifestType::ProjectsCollection => Ok(ManifestPayload::ProjectsCollection {
            projects: collection_registry(content_root, manifest_dir, item_id, "projects", &raw.projects, raw)?,
        }),
        ManifestType::IdeasCollection => Ok(ManifestPayload::IdeasCollection {
            ideas: collection_registry(content_root, manifest_dir, item_id, "ideas", &raw.ideas, raw)?,
        }),
        ManifestType::EpisodesCollection => Ok(ManifestPayload::EpisodesCollection {
            series: collection_registry(content_root, manifest_dir, item_id, "episode_series", &raw.episode_series, raw)?,
        }),

        ManifestType::ResumeCollection => {
            require_collection_info(item_id, raw)?;
            let files = file_registry(
                content_root,
                manifest_dir,
                item_id,
                "resume_files",
                &raw.resume_files,
            )?;
            Ok(ManifestPayload::ResumeCollection { files })
        }

        ManifestType::BlogPost => {
            let info = item_info(item_id, "post_info", &raw.post_info)?;
            let files = file_registry(content_root, manifest_dir, item_id, "files", &raw.files)?;
            Ok(ManifestPayload::BlogPost { info, files })
        }
        ManifestType::VlogSeries => {
            let info = item_info(item_id, "series_info", &raw.series_info)?;
            let files = file_registry(content_root, manifest_dir, item_id, "files", &raw.files)?;
            Ok(ManifestPayload::VlogSeries { info, files })
        }
        ManifestType::ProjectFiles => {
            let info = item_info(item_id, "project_info", &raw.project_info)?;
            let files = file_registry(content_root, manifest_dir, item_id, "files", &raw.files)?;
            Ok(ManifestPayload::ProjectFiles { info, files })
        }
        ManifestType::IdeaProject => {
            let info = item_info(item_id, "idea_info", &raw.idea_info)?;
            let files = file_registry(content_root, manifest_dir, item_id, "files", &raw.files)?;
            Ok(ManifestPayload::IdeaProject { info, files })
        }
        ManifestType::EpisodeSeries => {
            let info = item_info(item_id, "series_info", &raw.series_info)?;
            let episodes =
                file_registry(content_root, manifest_dir, item_id, "episodes", &raw.episodes)?;
            Ok(ManifestPayload::EpisodeSeries { info, episodes })
        }
    }
}

fn require_collection_info(item_id: &str, raw: &RawManifest) -> Result<()> {
    let info = raw.collection_info.as_ref().ok_or_else(|| {
        SyncError::validation(item_id, "collection_info", "block is required")
    })?;
    info.collection_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            SyncError::validation(item_id, "collection_info.collection_id", "field is required")
        })?;
    Ok(())
}

fn collection_registry(
    content_root: &Path,
    manifest_dir: &Path,
    item_id: &str,
    field: &str,
    entries: &Option<Vec<RawRegistryEntry>>,
    raw: &RawManifest,
) -> Result<Vec<RegistryEntry>> {
    require_collection_info(item_id, raw)?;

    let entries = entries
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            SyncError::validation(item_id, field, "registry must be present and non-empty")
        })?;

    let mut seen_orders: BTreeMap<i64, &str> = BTreeMap::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        if !seen_ids.insert(entry.id.as_str()) {
            return Err(SyncError::validation(
                item_id,
                format!("{}.id", field),
                format!("duplicate entry id '{}'", entry.id),
            ));
        }
        // Stage 5: sort_order uniqueness. Duplicates are rejected, not renumbered.
        if let Some(other) = seen_orders.insert(entry.sort_order, &entry.id) {
            return Err(SyncError::validation(
                item_id,
                format!("{}.sort_order", field),
                format!(
                    "duplicate sort_order {} ('{}' and '{}')",
                    entry.sort_order, other, entry.id
                ),
            ));
        }

        // Stage 4: the registered directory must exist
        let dir = content_root.join(manifest_dir).join(&entry.directory_path);
        if !dir.is_dir() {
            return Err(SyncError::validation(
                &entry.id,
                format!("{}.directory_path", field),
                format!("directory '{}' does not exist", entry.directory_path.display()),
            ));
        }

        out.push(RegistryEntry {
            id: entry.id.clone(),
            directory_path: entry.directory_path.clone(),
            sort_order: entry.sort_order,
            status: parse_opt_enum::<ContentStatus>(&entry.id, field, "status", &entry.status)?,
            priority: parse_opt_enum::<Priority>(&entry.id, field, "priority", &entry.priority)?,
            difficulty: parse_opt_enum::<Difficulty>(
                &entry.id,
                field,
                "difficulty",
                &entry.difficulty,
            )?,
        });
    }

    Ok(out)
}

fn file_registry(
    content_root: &Path,
    manifest_dir: &Path,
    item_id: &str,
    field: &str,
    files: &Option<Vec<RawFileRegistration>>,
) -> Result<Vec<FileRegistration>> {
    let files = files
        .as_deref()
        .filter(|f| !f.is_empty())
        .ok_or_else(|| {
            SyncError::validation(item_id, field, "file registry must be present and non-empty")
        })?;

    let mut seen_orders: BTreeMap<i64, &Path> = BTreeMap::new();

    let mut out = Vec::with_capacity(files.len());
    for file in files {
        let kind = match &file.file_type {
            Some(t) => t.parse::<FileKind>().map_err(|e| {
                SyncError::validation(item_id, format!("{}.file_type", field), e)
            })?,
            None => FileKind::default(),
        };

        if let Some(order) = file.sort_order {
            if let Some(other) = seen_orders.insert(order, &file.path) {
                return Err(SyncError::validation(
                    item_id,
                    format!("{}.sort_order", field),
                    format!(
                        "duplicate sort_order {} ('{}' and '{}')",
                        order,
                        other.display(),
                        file.path.display()
                    ),
                ));
            }
        }

        // Stage 4: referenced files must exist relative to the manifest dir
        let abs = content_root.join(manifest_dir).join(&file.path);
        if !abs.is_file() {
            return Err(SyncError::validation(
                item_id,
                format!("{}.path", field),
                format!("file '{}' does not exist", file.path.display()),
            ));
        }

        out.push(FileRegistration {
            path: file.path.clone(),
            language: file.language.clone(),
            file_type: kind,
            is_primary: file.is_primary,
            sort_order: file.sort_order,
        });
    }

    Ok(out)
}

fn item_info(item_id: &str, block: &str, raw: &Option<RawItemInfo>) -> Result<ItemInfo> {
    let raw = raw
        .as_ref()
        .ok_or_else(|| SyncError::validation(item_id, block, "block is required"))?;

    Ok(ItemInfo {
        title: raw.title.clone(),
        status: parse_opt_enum::<ContentStatus>(item_id, block, "status", &raw.status)?,
        priority: parse_opt_enum::<Priority>(item_id, block, "priority", &raw.priority)?,
        difficulty: parse_opt_enum::<Difficulty>(item_id, block, "difficulty", &raw.difficulty)?,
        description: raw.description.clone(),
        tags: raw.tags.clone(),
        has_series_config: raw.has_series_config,
        supports_multilang: raw.supports_multilang,
        language_variants: raw.language_variants.clone(),
        sort_order: raw.sort_order,
    })
}

fn parse_opt_enum<T>(
    item_id: &str,
    block: &str,
    field: &str,
    value: &Option<String>,
) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    match value {
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|e| SyncError::validation(item_id, format!("{}.{}", block, field), e)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn blog_post_manifest() -> &'static str {
        r#"
sync_metadata:
  item_id: hello-world
  content_type: blog_post
sync_settings:
  conflict_resolution: local_wins
  preserve_ids: true
post_info:
  title: Hello World
  status: published
files:
  - path: en.md
    language: en
    is_primary: true
"#
    }

    #[test]
    fn parses_valid_blog_post_manifest() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "blog/hello-world/en.md", "---\ntitle: Hello\n---\nbody");

        let manifest = parse_manifest_str(
            dir.path(),
            Path::new("blog/hello-world/.silan-cache"),
            blog_post_manifest(),
        )
        .unwrap();

        assert_eq!(manifest.item_id, "hello-world");
        assert_eq!(manifest.manifest_type, ManifestType::BlogPost);
        assert_eq!(manifest.payload.files().unwrap().len(), 1);
        assert!(manifest.sync_enabled);
    }

    #[test]
    fn missing_item_id_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        let text = "sync_metadata:\n  content_type: blog_post\n";

        let err =
            parse_manifest_str(dir.path(), Path::new("blog/x/.silan-cache"), text).unwrap_err();

        match err {
            SyncError::Validation { field, .. } => assert_eq!(field, "sync_metadata.item_id"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_content_type_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        let text = "sync_metadata:\n  item_id: x\n  content_type: gallery\n";

        let err =
            parse_manifest_str(dir.path(), Path::new("gallery/.silan-cache"), text).unwrap_err();

        match err {
            SyncError::Validation { field, reason, .. } => {
                assert_eq!(field, "sync_metadata.content_type");
                assert!(reason.contains("gallery"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn missing_registered_file_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        // en.md deliberately not created

        let err = parse_manifest_str(
            dir.path(),
            Path::new("blog/hello-world/.silan-cache"),
            blog_post_manifest(),
        )
        .unwrap_err();

        match err {
            SyncError::Validation { item, reason, .. } => {
                assert_eq!(item, "hello-world");
                assert!(reason.contains("en.md"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_sort_order_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "blog/a/x.md", "x");
        fs::create_dir_all(dir.path().join("blog/one")).unwrap();
        fs::create_dir_all(dir.path().join("blog/two")).unwrap();

        let text = r#"
sync_metadata:
  item_id: blog
  content_type: blog_collection
collection_info:
  collection_id: blog
blog_posts:
  - blog_id: one
    directory_path: one
    sort_order: 1
  - blog_id: two
    directory_path: two
    sort_order: 1
"#;

        let err = parse_manifest_str(dir.path(), Path::new("blog/.silan-cache"), text).unwrap_err();

        match err {
            SyncError::Validation { field, reason, .. } => {
                assert_eq!(field, "blog_posts.sort_order");
                assert!(reason.contains("duplicate"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn empty_registry_is_rejected() {
        let dir = TempDir::new().unwrap();
        let text = r#"
sync_metadata:
  item_id: blog
  content_type: blog_collection
collection_info:
  collection_id: blog
blog_posts: []
"#;

        let err = parse_manifest_str(dir.path(), Path::new("blog/.silan-cache"), text).unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));
    }

    #[test]
    fn registry_accepts_type_specific_id_key() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("projects/silan-site")).unwrap();

        let text = r#"
sync_metadata:
  item_id: projects
  content_type: projects_collection
collection_info:
  collection_id: projects
projects:
  - project_id: silan-site
    directory_path: silan-site
    sort_order: 1
    status: active
    priority: high
"#;

        let manifest =
            parse_manifest_str(dir.path(), Path::new("projects/.silan-cache"), text).unwrap();
        let registry = manifest.payload.registry().unwrap();

        assert_eq!(registry[0].id, "silan-site");
        assert_eq!(registry[0].priority, Some(Priority::High));
    }

    #[test]
    fn malformed_yaml_is_a_parsing_error() {
        let dir = TempDir::new().unwrap();
        let err = parse_manifest_str(
            dir.path(),
            Path::new("blog/.silan-cache"),
            "sync_metadata: [unterminated",
        )
        .unwrap_err();

        assert!(matches!(err, SyncError::Parsing { .. }));
    }

    #[test]
    fn unknown_status_in_info_block_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "blog/x/en.md", "x");

        let text = r#"
sync_metadata:
  item_id: x
  content_type: blog_post
post_info:
  title: X
  status: shiny
files:
  - path: en.md
"#;

        let err = parse_manifest_str(dir.path(), Path::new("blog/x/.silan-cache"), text).unwrap_err();

        match err {
            SyncError::Validation { field, .. } => assert_eq!(field, "post_info.status"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn related_content_is_parsed() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "blog/x/en.md", "x");

        let text = r#"
sync_metadata:
  item_id: x
  content_type: blog_post
post_info:
  title: X
files:
  - path: en.md
related_content:
  - target_type: project
    target_id: silan-site
    kind: case_study_of
"#;

        let manifest =
            parse_manifest_str(dir.path(), Path::new("blog/x/.silan-cache"), text).unwrap();

        assert_eq!(manifest.related_content.len(), 1);
        assert_eq!(manifest.related_content[0].target_id, "silan-site");
    }
}
