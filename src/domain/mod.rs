//! Domain models for the silan sync engine
//!
//! Pure types with no I/O concerns: manifests, content items,
//! relationships, sync records, and the pass report.

mod hash;
mod item;
mod manifest;
mod record;
mod relationship;
mod report;

pub use hash::content_hash;
pub use item::{
    ContentFile, ContentItem, ContentStatus, ContentType, Difficulty, FileKind, Frontmatter,
    LanguageVariant, Priority,
};
pub use manifest::{
    CollectionRef, ConflictStrategy, ContentManifest, FileRegistration, ItemInfo, ManifestLevel,
    ManifestPayload, ManifestType, MergeStrategy, RegistryEntry, SyncSettings,
};
pub use record::{ChangeKind, SyncRecord};
pub use relationship::{RelatedContentRef, RelationshipKind, RelationshipLink};
pub use report::{ItemFailure, SyncReport, SyncWarning};
