//! Idea parsing
//!
//! Ideas share the project file shape (role-tagged documents, optional
//! language variants) and add difficulty alongside priority.

use crate::domain::{ContentItem, ContentType};
use crate::error::Result;

use super::project::check_unique_roles;
use super::{base_item, check_declared_languages, resolve_title, ContentParser, ItemSource};

pub struct IdeaParser;

impl ContentParser for IdeaParser {
    fn content_type(&self) -> ContentType {
        ContentType::Idea
    }

    fn parse(&self, source: ItemSource<'_>) -> Result<ContentItem> {
        check_declared_languages(&source)?;
        check_unique_roles(&source)?;
        let title = resolve_title(&source)?;

        Ok(base_item(&source, title))
    }
}
