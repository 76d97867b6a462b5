//! Resume parsing
//!
//! The resume is a single logical item fed by one file per language. Its
//! manifest sits at the collection level and registers the files directly.

use std::collections::HashSet;

use crate::domain::{ContentItem, ContentType};
use crate::error::{Result, SyncError};

use super::{base_item, resolve_title, ContentParser, ItemSource};

pub struct ResumeParser;

impl ContentParser for ResumeParser {
    fn content_type(&self) -> ContentType {
        ContentType::Resume
    }

    fn parse(&self, source: ItemSource<'_>) -> Result<ContentItem> {
        let mut languages = HashSet::new();
        for file in &source.files {
            if !languages.insert(file.language.as_str()) {
                return Err(SyncError::validation(
                    &source.item_id,
                    "resume_files.language",
                    format!(
                        "more than one resume file for language '{}' ('{}')",
                        file.language,
                        file.rel_path.display()
                    ),
                ));
            }
        }

        let primary_count = source.files.iter().filter(|f| f.is_primary).count();
        if primary_count != 1 {
            return Err(SyncError::validation(
                &source.item_id,
                "resume_files.is_primary",
                format!("exactly one primary file required, found {}", primary_count),
            ));
        }

        let title = resolve_title(&source)?;
        Ok(base_item(&source, title))
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{ContentManifest, FileRegistration, ManifestPayload, ManifestType, SyncSettings};
    use crate::parser::{load_source, parse_item};

    use super::*;

    fn resume_manifest(files: Vec<FileRegistration>) -> ContentManifest {
        ContentManifest {
            path: "resume/.silan-cache".into(),
            item_id: "resume".into(),
            manifest_type: ManifestType::ResumeCollection,
            last_update_time: None,
            last_file_hash: None,
            sync_enabled: true,
            settings: SyncSettings::default(),
            related_content: vec![],
            payload: ManifestPayload::ResumeCollection { files },
        }
    }

    fn registration(path: &str, language: &str, is_primary: bool) -> FileRegistration {
        FileRegistration {
            path: path.into(),
            language: Some(language.into()),
            file_type: Default::default(),
            is_primary,
            sort_order: None,
        }
    }

    #[test]
    fn one_file_per_language_parses() {
        let dir = tempfile::TempDir::new().unwrap();
        let resume_dir = dir.path().join("resume");
        std::fs::create_dir_all(&resume_dir).unwrap();
        std::fs::write(resume_dir.join("resume.md"), "---\ntitle: Resume\n---\nen").unwrap();
        std::fs::write(resume_dir.join("resume.zh.md"), "zh").unwrap();

        let manifest = resume_manifest(vec![
            registration("resume.md", "en", true),
            registration("resume.zh.md", "zh", false),
        ]);
        let source = load_source(dir.path(), &manifest, None).unwrap();
        let item = parse_item(source).unwrap();

        assert_eq!(item.content_type, ContentType::Resume);
        assert_eq!(item.title, "Resume");
        assert_eq!(item.language_variants.len(), 2);
        assert!(item.language_variants["en"].is_primary);
    }

    #[test]
    fn duplicate_language_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let resume_dir = dir.path().join("resume");
        std::fs::create_dir_all(&resume_dir).unwrap();
        std::fs::write(resume_dir.join("a.md"), "a").unwrap();
        std::fs::write(resume_dir.join("b.md"), "b").unwrap();

        let manifest = resume_manifest(vec![
            registration("a.md", "en", true),
            registration("b.md", "en", false),
        ]);
        let source = load_source(dir.path(), &manifest, None).unwrap();

        let err = parse_item(source).unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));
    }

    #[test]
    fn exactly_one_primary_required() {
        let dir = tempfile::TempDir::new().unwrap();
        let resume_dir = dir.path().join("resume");
        std::fs::create_dir_all(&resume_dir).unwrap();
        std::fs::write(resume_dir.join("resume.md"), "en").unwrap();

        let manifest = resume_manifest(vec![registration("resume.md", "en", false)]);
        let source = load_source(dir.path(), &manifest, None).unwrap();

        let err = parse_item(source).unwrap_err();
        match err {
            SyncError::Validation { field, .. } => assert_eq!(field, "resume_files.is_primary"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
