//! Blog post and vlog series parsing
//!
//! A blog post is one markdown document, possibly with language variants.
//! A vlog series reuses the blog shape but orders its files like episodes.

use crate::domain::{ContentItem, ContentType, ManifestType};
use crate::error::{Result, SyncError};

use super::{base_item, check_declared_languages, resolve_title, ContentParser, ItemSource};

pub struct BlogParser;

impl ContentParser for BlogParser {
    fn content_type(&self) -> ContentType {
        ContentType::Blog
    }

    fn parse(&self, source: ItemSource<'_>) -> Result<ContentItem> {
        check_declared_languages(&source)?;
        let title = resolve_title(&source)?;

        let is_series = source.manifest.manifest_type == ManifestType::VlogSeries
            || source
                .manifest
                .payload
                .info()
                .map(|i| i.has_series_config)
                .unwrap_or(false);

        if is_series {
            // Series parts are ordered explicitly, like episodes.
            for file in &source.files {
                if file.sort_order.is_none() {
                    return Err(SyncError::validation(
                        &source.item_id,
                        "files.sort_order",
                        format!("series file '{}' has no sort_order", file.rel_path.display()),
                    ));
                }
            }
        }

        let mut item = base_item(&source, title);
        if is_series {
            item.metadata
                .insert("is_series".to_string(), serde_json::json!(true));
            item.metadata.insert(
                "part_count".to_string(),
                serde_json::json!(item.files.len()),
            );
            item.files
                .sort_by_key(|f| (f.sort_order, f.rel_path.clone()));
        }

        Ok(item)
    }
}
