//! Project parsing
//!
//! A project directory holds several documents with distinct roles
//! (overview, progress notes, references, results). Each role may carry
//! language variants; within one language a role appears at most once.

use std::collections::HashSet;

use crate::domain::{ContentItem, ContentType};
use crate::error::{Result, SyncError};

use super::{base_item, check_declared_languages, resolve_title, ContentParser, ItemSource};

pub struct ProjectParser;

impl ContentParser for ProjectParser {
    fn content_type(&self) -> ContentType {
        ContentType::Project
    }

    fn parse(&self, source: ItemSource<'_>) -> Result<ContentItem> {
        check_declared_languages(&source)?;
        check_unique_roles(&source)?;
        let title = resolve_title(&source)?;

        let mut item = base_item(&source, title);

        let kinds: Vec<String> = {
            let mut seen = HashSet::new();
            source
                .files
                .iter()
                .filter(|f| seen.insert(f.kind))
                .map(|f| f.kind.to_string())
                .collect()
        };
        item.metadata
            .insert("file_kinds".to_string(), serde_json::json!(kinds));

        Ok(item)
    }
}

/// Rejects two files claiming the same role in the same language.
pub(super) fn check_unique_roles(source: &ItemSource<'_>) -> Result<()> {
    let mut seen = HashSet::new();
    for file in &source.files {
        if !seen.insert((file.kind, file.language.as_str())) {
            return Err(SyncError::validation(
                &source.item_id,
                "files.file_type",
                format!(
                    "duplicate {} file for language '{}' ('{}')",
                    file.kind,
                    file.language,
                    file.rel_path.display()
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::domain::{
        ContentManifest, FileKind, FileRegistration, ItemInfo, ManifestPayload, ManifestType,
        SyncSettings,
    };
    use crate::parser::{load_source, parse_item};

    use super::*;

    fn project_manifest(files: Vec<FileRegistration>) -> ContentManifest {
        ContentManifest {
            path: "projects/silan-site/.silan-cache".into(),
            item_id: "silan-site".into(),
            manifest_type: ManifestType::ProjectFiles,
            last_update_time: None,
            last_file_hash: None,
            sync_enabled: true,
            settings: SyncSettings::default(),
            related_content: vec![],
            payload: ManifestPayload::ProjectFiles {
                info: ItemInfo {
                    title: Some("Silan Site".into()),
                    supports_multilang: true,
                    language_variants: vec!["en".into(), "zh".into()],
                    ..Default::default()
                },
                files,
            },
        }
    }

    fn registration(path: &str, language: &str, kind: FileKind) -> FileRegistration {
        FileRegistration {
            path: path.into(),
            language: Some(language.into()),
            file_type: kind,
            is_primary: language == "en" && kind == FileKind::Overview,
            sort_order: None,
        }
    }

    fn write_files(root: &std::path::Path, names: &[&str]) {
        let dir = root.join("projects/silan-site");
        std::fs::create_dir_all(&dir).unwrap();
        for name in names {
            std::fs::write(dir.join(name), format!("content of {}", name)).unwrap();
        }
    }

    #[test]
    fn multi_role_project_parses() {
        let dir = tempfile::TempDir::new().unwrap();
        write_files(dir.path(), &["overview.md", "overview.zh.md", "progress.md"]);

        let manifest = project_manifest(vec![
            registration("overview.md", "en", FileKind::Overview),
            registration("overview.zh.md", "zh", FileKind::Overview),
            registration("progress.md", "en", FileKind::Progress),
        ]);
        let source = load_source(dir.path(), &manifest, None).unwrap();
        let item = parse_item(source).unwrap();

        assert_eq!(item.content_type, ContentType::Project);
        assert_eq!(item.language_variants.len(), 2);
        let kinds = item.metadata["file_kinds"].as_array().unwrap();
        assert_eq!(kinds.len(), 2);
    }

    #[test]
    fn missing_declared_language_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        write_files(dir.path(), &["overview.md"]);

        // Manifest declares zh but registers only an en file.
        let manifest = project_manifest(vec![registration("overview.md", "en", FileKind::Overview)]);
        let source = load_source(dir.path(), &manifest, None).unwrap();

        let err = parse_item(source).unwrap_err();
        match err {
            SyncError::Validation { reason, .. } => assert!(reason.contains("zh")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_role_per_language_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        write_files(dir.path(), &["overview.md", "overview.zh.md", "overview2.md"]);

        let manifest = project_manifest(vec![
            registration("overview.md", "en", FileKind::Overview),
            registration("overview.zh.md", "zh", FileKind::Overview),
            registration("overview2.md", "en", FileKind::Overview),
        ]);
        let source = load_source(dir.path(), &manifest, None).unwrap();

        let err = parse_item(source).unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));
    }
}
