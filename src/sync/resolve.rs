//! Relationship resolution
//!
//! Runs after every item has been parsed so references can point at
//! items that appear later in the pass. A reference to an item that
//! exists neither on disk nor in the database is dropped with a
//! warning, never an error.

use std::collections::HashSet;

use crate::domain::{ContentItem, ContentType, RelationshipLink, SyncWarning};

/// Resolution outcome: the links to persist plus dangling-ref warnings
#[derive(Debug, Default)]
pub struct ResolvedLinks {
    pub links: Vec<RelationshipLink>,
    pub warnings: Vec<SyncWarning>,
}

/// Resolves every declared reference against the set of known items.
///
/// `known` holds every item seen this pass plus everything already in
/// the database, so links may target items outside the current filter.
pub fn resolve_links(
    items: &[ContentItem],
    known: &HashSet<(ContentType, String)>,
) -> ResolvedLinks {
    let mut resolved = ResolvedLinks::default();
    let mut seen: HashSet<(ContentType, String, ContentType, String)> = HashSet::new();

    for item in items {
        for reference in &item.related_content {
            let target_key = (reference.target_type, reference.target_id.clone());
            if !known.contains(&target_key) {
                resolved.warnings.push(SyncWarning::for_item(
                    &item.id,
                    format!(
                        "related content '{}/{}' does not exist, link dropped",
                        reference.target_type, reference.target_id
                    ),
                ));
                continue;
            }
            if reference.target_type == item.content_type && reference.target_id == item.id {
                resolved.warnings.push(SyncWarning::for_item(
                    &item.id,
                    "item references itself, link dropped",
                ));
                continue;
            }

            let key = (
                item.content_type,
                item.id.clone(),
                reference.target_type,
                reference.target_id.clone(),
            );
            if !seen.insert(key) {
                continue;
            }

            resolved.links.push(RelationshipLink {
                from_type: item.content_type,
                from_id: item.id.clone(),
                to_type: reference.target_type,
                to_id: reference.target_id.clone(),
                kind: reference.kind,
            });
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentStatus, RelatedContentRef, RelationshipKind};
    use std::collections::BTreeMap;

    fn item(id: &str, content_type: ContentType, refs: Vec<RelatedContentRef>) -> ContentItem {
        ContentItem {
            id: id.into(),
            content_type,
            title: id.into(),
            status: ContentStatus::Published,
            sort_order: 0,
            directory_path: id.into(),
            language_variants: BTreeMap::new(),
            related_content: refs,
            content_hash: String::new(),
            files: vec![],
            metadata: BTreeMap::new(),
        }
    }

    fn reference(target_type: ContentType, target_id: &str) -> RelatedContentRef {
        RelatedContentRef {
            target_type,
            target_id: target_id.into(),
            kind: RelationshipKind::Related,
        }
    }

    #[test]
    fn resolves_forward_references() {
        // The blog post references a project parsed later in the pass.
        let items = vec![
            item("post", ContentType::Blog, vec![reference(ContentType::Project, "proj")]),
            item("proj", ContentType::Project, vec![]),
        ];
        let known: HashSet<_> = items
            .iter()
            .map(|i| (i.content_type, i.id.clone()))
            .collect();

        let resolved = resolve_links(&items, &known);

        assert_eq!(resolved.links.len(), 1);
        assert_eq!(resolved.links[0].to_id, "proj");
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn dangling_reference_warns_and_drops() {
        let items = vec![item(
            "post",
            ContentType::Blog,
            vec![reference(ContentType::Project, "ghost")],
        )];
        let known: HashSet<_> = items
            .iter()
            .map(|i| (i.content_type, i.id.clone()))
            .collect();

        let resolved = resolve_links(&items, &known);

        assert!(resolved.links.is_empty());
        assert_eq!(resolved.warnings.len(), 1);
        assert!(resolved.warnings[0].message.contains("ghost"));
    }

    #[test]
    fn duplicate_and_self_references_are_dropped() {
        let items = vec![
            item(
                "post",
                ContentType::Blog,
                vec![
                    reference(ContentType::Project, "proj"),
                    reference(ContentType::Project, "proj"),
                    reference(ContentType::Blog, "post"),
                ],
            ),
            item("proj", ContentType::Project, vec![]),
        ];
        let known: HashSet<_> = items
            .iter()
            .map(|i| (i.content_type, i.id.clone()))
            .collect();

        let resolved = resolve_links(&items, &known);

        assert_eq!(resolved.links.len(), 1);
        assert_eq!(resolved.warnings.len(), 1);
    }

    #[test]
    fn links_may_target_database_only_items() {
        let items = vec![item(
            "post",
            ContentType::Blog,
            vec![reference(ContentType::Project, "archived-proj")],
        )];
        let mut known: HashSet<_> = items
            .iter()
            .map(|i| (i.content_type, i.id.clone()))
            .collect();
        known.insert((ContentType::Project, "archived-proj".into()));

        let resolved = resolve_links(&items, &known);
        assert_eq!(resolved.links.len(), 1);
    }
}
