//! Episode series parsing
//!
//! A series manifest registers its episode files with explicit sort
//! orders. Gaps in the numbering are fine; a missing sort_order is not.

use crate::domain::{ContentItem, ContentType};
use crate::error::{Result, SyncError};

use super::{base_item, check_declared_languages, resolve_title, ContentParser, ItemSource};

pub struct EpisodeParser;

impl ContentParser for EpisodeParser {
    fn content_type(&self) -> ContentType {
        ContentType::Episode
    }

    fn parse(&self, source: ItemSource<'_>) -> Result<ContentItem> {
        check_declared_languages(&source)?;

        for file in &source.files {
            if file.sort_order.is_none() {
                return Err(SyncError::validation(
                    &source.item_id,
                    "episodes.sort_order",
                    format!("episode '{}' has no sort_order", file.rel_path.display()),
                ));
            }
        }

        let title = resolve_title(&source)?;
        let mut item = base_item(&source, title);
        item.files.sort_by_key(|f| (f.sort_order, f.rel_path.clone()));
        item.metadata.insert(
            "episode_count".to_string(),
            serde_json::json!(item.files.len()),
        );

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::domain::{
        ContentManifest, FileKind, FileRegistration, ItemInfo, ManifestPayload, ManifestType,
        SyncSettings,
    };
    use crate::parser::{load_source, parse_item};

    use super::*;

    fn series_manifest(episodes: Vec<FileRegistration>) -> ContentManifest {
        ContentManifest {
            path: "episodes/rust-basics/.silan-cache".into(),
            item_id: "rust-basics".into(),
            manifest_type: ManifestType::EpisodeSeries,
            last_update_time: None,
            last_file_hash: None,
            sync_enabled: true,
            settings: SyncSettings::default(),
            related_content: vec![],
            payload: ManifestPayload::EpisodeSeries {
                info: ItemInfo {
                    title: Some("Rust Basics".into()),
                    ..Default::default()
                },
                episodes,
            },
        }
    }

    fn episode(path: &str, sort_order: Option<i64>) -> FileRegistration {
        FileRegistration {
            path: path.into(),
            language: None,
            file_type: FileKind::Episode,
            is_primary: false,
            sort_order,
        }
    }

    #[test]
    fn episodes_sorted_with_gaps_allowed() {
        let dir = tempfile::TempDir::new().unwrap();
        let series_dir = dir.path().join("episodes/rust-basics");
        std::fs::create_dir_all(&series_dir).unwrap();
        for name in ["ep-10.md", "ep-01.md", "ep-05.md"] {
            std::fs::write(series_dir.join(name), name).unwrap();
        }

        let manifest = series_manifest(vec![
            episode("ep-10.md", Some(10)),
            episode("ep-01.md", Some(1)),
            episode("ep-05.md", Some(5)),
        ]);
        let source = load_source(dir.path(), &manifest, None).unwrap();
        let item = parse_item(source).unwrap();

        let order: Vec<&Path> = item.files.iter().map(|f| f.rel_path.as_path()).collect();
        assert_eq!(
            order,
            vec![Path::new("ep-01.md"), Path::new("ep-05.md"), Path::new("ep-10.md")]
        );
        assert_eq!(item.metadata["episode_count"], serde_json::json!(3));
    }

    #[test]
    fn missing_sort_order_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let series_dir = dir.path().join("episodes/rust-basics");
        std::fs::create_dir_all(&series_dir).unwrap();
        std::fs::write(series_dir.join("ep-01.md"), "one").unwrap();

        let manifest = series_manifest(vec![episode("ep-01.md", None)]);
        let source = load_source(dir.path(), &manifest, None).unwrap();

        let err = parse_item(source).unwrap_err();
        match err {
            SyncError::Validation { field, .. } => assert_eq!(field, "episodes.sort_order"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
