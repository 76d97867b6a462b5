//! Content parsing layer
//!
//! Turns a validated item manifest plus the markdown files it registers
//! into a [`ContentItem`]. File I/O happens once up front in
//! [`load_source`]; the per-type parsers are pure functions over the
//! loaded source, so their rules are testable without touching disk.

pub mod blog;
pub mod episode;
pub mod frontmatter;
pub mod idea;
pub mod manifest;
pub mod project;
pub mod resume;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{
    content_hash, ContentFile, ContentItem, ContentManifest, ContentStatus, ContentType,
    LanguageVariant, ManifestType, RegistryEntry,
};
use crate::error::{Result, SyncError};

pub use manifest::{parse_manifest, MANIFEST_FILE};

/// Everything a per-type parser needs about one item, loaded from disk
#[derive(Debug)]
pub struct ItemSource<'a> {
    pub item_id: String,

    pub content_type: ContentType,

    /// Item directory relative to the content root
    pub directory_path: PathBuf,

    /// Registration in the parent collection manifest, if any
    pub entry: Option<&'a RegistryEntry>,

    pub manifest: &'a ContentManifest,

    /// Loaded files, in registry order
    pub files: Vec<ContentFile>,

    /// Hash over all registered file contents and paths
    pub content_hash: String,
}

/// A parser for one content type
pub trait ContentParser {
    fn content_type(&self) -> ContentType;

    /// Builds a content item from loaded source. Pure: no I/O.
    fn parse(&self, source: ItemSource<'_>) -> Result<ContentItem>;
}

/// Reads and hashes every file an item manifest registers.
pub fn load_source<'a>(
    content_root: &Path,
    item_manifest: &'a ContentManifest,
    entry: Option<&'a RegistryEntry>,
) -> Result<ItemSource<'a>> {
    let content_type = item_manifest.manifest_type.content_type().ok_or_else(|| {
        SyncError::parsing(&item_manifest.path, "manifest does not describe an item")
    })?;
    let registrations = item_manifest.payload.files().ok_or_else(|| {
        SyncError::parsing(&item_manifest.path, "manifest carries no file registry")
    })?;

    let dir = item_manifest.directory();
    let mut files = Vec::with_capacity(registrations.len());
    let mut hashed: Vec<(String, Vec<u8>)> = Vec::with_capacity(registrations.len());

    for registration in registrations {
        let abs = content_root.join(&dir).join(&registration.path);
        let bytes = fs::read(&abs).map_err(|e| SyncError::fs(dir.join(&registration.path), &e))?;
        let text = String::from_utf8(bytes.clone()).map_err(|_| {
            SyncError::parsing(dir.join(&registration.path), "file is not valid UTF-8")
        })?;

        let (fm, body) = frontmatter::parse_document(&dir.join(&registration.path), &text)?;

        let language = registration
            .language
            .clone()
            .or_else(|| language_from_path(&registration.path))
            .unwrap_or_else(|| "en".to_string());

        files.push(ContentFile {
            rel_path: registration.path.clone(),
            language,
            kind: registration.file_type,
            frontmatter: fm,
            body,
            is_primary: registration.is_primary,
            sort_order: registration.sort_order,
        });
        hashed.push((registration.path.display().to_string(), bytes));
    }

    let content_hash = content_hash(&hashed);

    Ok(ItemSource {
        item_id: item_manifest.item_id.clone(),
        content_type,
        directory_path: dir,
        entry,
        manifest: item_manifest,
        files,
        content_hash,
    })
}

/// Dispatches a loaded source to the parser for its manifest type.
pub fn parse_item(source: ItemSource<'_>) -> Result<ContentItem> {
    match source.manifest.manifest_type {
        ManifestType::BlogPost | ManifestType::VlogSeries => blog::BlogParser.parse(source),
        ManifestType::ProjectFiles => project::ProjectParser.parse(source),
        ManifestType::IdeaProject => idea::IdeaParser.parse(source),
        ManifestType::EpisodeSeries => episode::EpisodeParser.parse(source),
        ManifestType::ResumeCollection => resume::ResumeParser.parse(source),
        other => Err(SyncError::parsing(
            &source.manifest.path,
            format!("'{}' is not an item manifest", other),
        )),
    }
}

/// Extracts the language code from a `name.{lang}.md` file name.
///
/// Plain `name.md` has no embedded language and returns `None`.
pub fn language_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(".md")?;
    let (_, lang) = stem.rsplit_once('.')?;
    if lang.is_empty() || lang.len() > 8 || !lang.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
    {
        return None;
    }
    Some(lang.to_string())
}

// Shared rules used by every per-type parser.

/// Item title: manifest info block first, primary file frontmatter second.
fn resolve_title(source: &ItemSource<'_>) -> Result<String> {
    if let Some(title) = source
        .manifest
        .payload
        .info()
        .and_then(|i| i.title.as_deref())
    {
        let title = title.trim();
        if !title.is_empty() {
            return Ok(title.to_string());
        }
    }

    let primary = primary_file(source);
    if let Some(file) = primary {
        if let Some(title) = file.frontmatter.title.as_deref() {
            let title = title.trim();
            if !title.is_empty() {
                return Ok(title.to_string());
            }
        }
    }

    Err(SyncError::parsing(
        &source.manifest.path,
        format!("no title for item '{}' in manifest or frontmatter", source.item_id),
    ))
}

/// Status precedence: collection registry entry, then info block, then
/// primary file frontmatter, then the default.
fn resolve_status(source: &ItemSource<'_>) -> ContentStatus {
    source
        .entry
        .and_then(|e| e.status)
        .or_else(|| source.manifest.payload.info().and_then(|i| i.status))
        .or_else(|| primary_file(source).and_then(|f| f.frontmatter.status))
        .unwrap_or_default()
}

fn resolve_sort_order(source: &ItemSource<'_>) -> i64 {
    source
        .entry
        .map(|e| e.sort_order)
        .or_else(|| source.manifest.payload.info().and_then(|i| i.sort_order))
        .unwrap_or(0)
}

/// The explicitly flagged primary file, or the first file as fallback.
fn primary_file<'s>(source: &'s ItemSource<'_>) -> Option<&'s ContentFile> {
    source
        .files
        .iter()
        .find(|f| f.is_primary)
        .or_else(|| source.files.first())
}

/// Builds the language variant map from loaded files.
///
/// The first file per language wins unless a later one is flagged primary.
/// Exactly one variant ends up primary: the flagged one, or "en", or the
/// first in language order.
fn language_variants(files: &[ContentFile]) -> BTreeMap<String, LanguageVariant> {
    let mut variants: BTreeMap<String, LanguageVariant> = BTreeMap::new();

    for file in files {
        let candidate = LanguageVariant {
            path: file.rel_path.clone(),
            is_primary: file.is_primary,
        };
        match variants.get_mut(&file.language) {
            Some(existing) => {
                if file.is_primary && !existing.is_primary {
                    *existing = candidate;
                }
            }
            None => {
                variants.insert(file.language.clone(), candidate);
            }
        }
    }

    if !variants.values().any(|v| v.is_primary) {
        let key = if variants.contains_key("en") {
            Some("en".to_string())
        } else {
            variants.keys().next().cloned()
        };
        if let Some(key) = key {
            if let Some(v) = variants.get_mut(&key) {
                v.is_primary = true;
            }
        }
    }

    variants
}

/// With `supports_multilang`, every declared language must have a file.
fn check_declared_languages(source: &ItemSource<'_>) -> Result<()> {
    let info = match source.manifest.payload.info() {
        Some(info) if info.supports_multilang => info,
        _ => return Ok(()),
    };

    for lang in &info.language_variants {
        if !source.files.iter().any(|f| &f.language == lang) {
            return Err(SyncError::validation(
                &source.item_id,
                "language_variants",
                format!("declared language '{}' has no file", lang),
            ));
        }
    }
    Ok(())
}

/// Metadata common to every type, pulled from the info block.
fn base_metadata(source: &ItemSource<'_>) -> BTreeMap<String, serde_json::Value> {
    let mut metadata = BTreeMap::new();

    if let Some(info) = source.manifest.payload.info() {
        if let Some(description) = &info.description {
            metadata.insert("description".to_string(), serde_json::json!(description));
        }
        if !info.tags.is_empty() {
            metadata.insert("tags".to_string(), serde_json::json!(info.tags));
        }
        if let Some(priority) = source.entry.and_then(|e| e.priority).or(info.priority) {
            metadata.insert("priority".to_string(), serde_json::json!(priority));
        }
        if let Some(difficulty) = source.entry.and_then(|e| e.difficulty).or(info.difficulty) {
            metadata.insert("difficulty".to_string(), serde_json::json!(difficulty));
        }
    }

    metadata
}

/// Assembles the parts every parser fills in the same way.
fn base_item(source: &ItemSource<'_>, title: String) -> ContentItem {
    ContentItem {
        id: source.item_id.clone(),
        content_type: source.content_type,
        title,
        status: resolve_status(source),
        sort_order: resolve_sort_order(source),
        directory_path: source.directory_path.clone(),
        language_variants: language_variants(&source.files),
        related_content: source.manifest.related_content.clone(),
        content_hash: source.content_hash.clone(),
        files: source.files.clone(),
        metadata: base_metadata(source),
    }
}
