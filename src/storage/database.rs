//! SQLite persistence
//!
//! The database lives in `.silan/silan.db` and mirrors the content tree.
//! `content_items` keeps an integer primary key (`db_id`) distinct from
//! the textual item id so rows referenced by external tables survive
//! updates. Each item is written in its own transaction; one failed
//! item never rolls back its neighbors.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{
    ContentItem, ContentType, MergeStrategy, RelationshipLink, SyncRecord,
};
use crate::error::{Result, SyncError};

/// Handle to the sync database
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Schema version, bump to force a rebuild on open
    const SCHEMA_VERSION: i32 = 1;

    /// Opens (creating if needed) the database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|e| SyncError::fs(parent, &e))?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;",
        )?;

        let mut db = Self { conn };
        db.ensure_schema()?;
        Ok(db)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.ensure_schema()?;
        Ok(db)
    }

    fn ensure_schema(&mut self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?
            .unwrap_or(0);

        if version != Self::SCHEMA_VERSION {
            self.create_schema()?;
        }
        Ok(())
    }

    fn create_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            DROP TABLE IF EXISTS relationships;
            DROP TABLE IF EXISTS sync_records;
            DROP TABLE IF EXISTS content_items;

            CREATE TABLE content_items (
                db_id INTEGER PRIMARY KEY,
                content_type TEXT NOT NULL,
                item_id TEXT NOT NULL,
                title TEXT NOT NULL,
                status TEXT NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                directory_path TEXT NOT NULL,
                primary_language TEXT NOT NULL,
                language_variants TEXT NOT NULL,
                files TEXT NOT NULL,
                metadata TEXT,
                content_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (content_type, item_id)
            );

            CREATE TABLE relationships (
                from_type TEXT NOT NULL,
                from_id TEXT NOT NULL,
                to_type TEXT NOT NULL,
                to_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                PRIMARY KEY (from_type, from_id, to_type, to_id)
            );

            CREATE TABLE sync_records (
                content_type TEXT NOT NULL,
                item_id TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                last_synced_at TEXT NOT NULL,
                source_manifest_path TEXT NOT NULL,
                PRIMARY KEY (content_type, item_id)
            );

            CREATE INDEX idx_items_type ON content_items(content_type);
            CREATE INDEX idx_items_status ON content_items(status);
            CREATE INDEX idx_rel_to ON relationships(to_type, to_id);
            ",
        )?;

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;
        Ok(())
    }

    /// Loads every sync record, keyed by (type, id).
    pub fn load_sync_records(&self) -> Result<HashMap<(ContentType, String), SyncRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT content_type, item_id, content_hash, last_synced_at, source_manifest_path
             FROM sync_records",
        )?;

        let mut records = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        for row in rows {
            let (type_str, item_id, content_hash, synced_str, manifest_path) = row?;
            let content_type: ContentType = type_str
                .parse()
                .map_err(SyncError::Database)?;
            let last_synced_at = DateTime::parse_from_rfc3339(&synced_str)
                .map_err(|e| SyncError::Database(format!("bad timestamp in sync record: {}", e)))?
                .with_timezone(&Utc);

            records.insert(
                (content_type, item_id.clone()),
                SyncRecord {
                    content_type,
                    item_id,
                    content_hash,
                    last_synced_at,
                    source_manifest_path: PathBuf::from(manifest_path),
                },
            );
        }

        Ok(records)
    }

    /// Every (type, id) currently present in `content_items`.
    pub fn known_items(&self) -> Result<HashSet<(ContentType, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT content_type, item_id FROM content_items")?;

        let mut known = HashSet::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (type_str, item_id) = row?;
            let content_type: ContentType = type_str.parse().map_err(SyncError::Database)?;
            known.insert((content_type, item_id));
        }

        Ok(known)
    }

    /// Writes one item and its sync record in a single transaction.
    ///
    /// With `preserve_ids` an existing row is updated in place so its
    /// `db_id` survives; otherwise, or with the replace strategy, the row
    /// is deleted and reinserted.
    pub fn upsert_item(&mut self, item: &ContentItem, manifest_path: &Path) -> Result<()> {
        self.write_item(item, manifest_path, true, MergeStrategy::Merge)
    }

    pub fn write_item(
        &mut self,
        item: &ContentItem,
        manifest_path: &Path,
        preserve_ids: bool,
        merge_strategy: MergeStrategy,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let type_str = item.content_type.to_string();
        let variants = serde_json::to_string(&item.language_variants)
            .map_err(|e| SyncError::Database(e.to_string()))?;
        let files = serde_json::to_string(&item.files)
            .map_err(|e| SyncError::Database(e.to_string()))?;
        let metadata = if item.metadata.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&item.metadata)
                    .map_err(|e| SyncError::Database(e.to_string()))?,
            )
        };

        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT db_id FROM content_items WHERE content_type = ?1 AND item_id = ?2",
                params![type_str, item.id],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(db_id) if preserve_ids && merge_strategy == MergeStrategy::Merge => {
                tx.execute(
                    "UPDATE content_items
                     SET title = ?1, status = ?2, sort_order = ?3, directory_path = ?4,
                         primary_language = ?5, language_variants = ?6, files = ?7,
                         metadata = ?8, content_hash = ?9, updated_at = ?10
                     WHERE db_id = ?11",
                    params![
                        item.title,
                        item.status.to_string(),
                        item.sort_order,
                        item.directory_path.display().to_string(),
                        item.primary_language(),
                        variants,
                        files,
                        metadata,
                        item.content_hash,
                        now,
                        db_id,
                    ],
                )?;
            }
            _ => {
                if existing.is_some() {
                    tx.execute(
                        "DELETE FROM content_items WHERE content_type = ?1 AND item_id = ?2",
                        params![type_str, item.id],
                    )?;
                }
                tx.execute(
                    "INSERT INTO content_items
                     (content_type, item_id, title, status, sort_order, directory_path,
                      primary_language, language_variants, files, metadata, content_hash,
                      created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    params![
                        type_str,
                        item.id,
                        item.title,
                        item.status.to_string(),
                        item.sort_order,
                        item.directory_path.display().to_string(),
                        item.primary_language(),
                        variants,
                        files,
                        metadata,
                        item.content_hash,
                        now,
                        now,
                    ],
                )?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO sync_records
             (content_type, item_id, content_hash, last_synced_at, source_manifest_path)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                type_str,
                item.id,
                item.content_hash,
                now,
                manifest_path.display().to_string(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// The stored db_id of an item, if present.
    pub fn item_db_id(&self, content_type: ContentType, item_id: &str) -> Result<Option<i64>> {
        let db_id = self
            .conn
            .query_row(
                "SELECT db_id FROM content_items WHERE content_type = ?1 AND item_id = ?2",
                params![content_type.to_string(), item_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(db_id)
    }

    /// Replaces the outgoing relationships of the given items.
    ///
    /// Runs after every item is persisted so links can target items
    /// written later in the same pass. Items outside `from_items` keep
    /// their links untouched.
    pub fn replace_relationships(
        &mut self,
        from_items: &[(ContentType, String)],
        links: &[RelationshipLink],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        for (content_type, item_id) in from_items {
            tx.execute(
                "DELETE FROM relationships WHERE from_type = ?1 AND from_id = ?2",
                params![content_type.to_string(), item_id],
            )?;
        }

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO relationships (from_type, from_id, to_type, to_id, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for link in links {
                stmt.execute(params![
                    link.from_type.to_string(),
                    link.from_id,
                    link.to_type.to_string(),
                    link.to_id,
                    link.kind.to_string(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Item counts per content type, for status reporting.
    pub fn counts_by_type(&self) -> Result<Vec<(ContentType, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT content_type, COUNT(*) FROM content_items
             GROUP BY content_type ORDER BY content_type",
        )?;

        let mut counts = Vec::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (type_str, count) = row?;
            let content_type: ContentType = type_str.parse().map_err(SyncError::Database)?;
            counts.push((content_type, count));
        }

        Ok(counts)
    }

    /// Number of stored relationships.
    pub fn relationship_count(&self) -> Result<i64> {
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentStatus, RelationshipKind};
    use std::collections::BTreeMap;

    fn item(id: &str, hash: &str) -> ContentItem {
        ContentItem {
            id: id.into(),
            content_type: ContentType::Blog,
            title: format!("Title of {}", id),
            status: ContentStatus::Published,
            sort_order: 1,
            directory_path: format!("blog/{}", id).into(),
            language_variants: BTreeMap::new(),
            related_content: vec![],
            content_hash: hash.into(),
            files: vec![],
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn insert_then_lookup() {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_item(&item("hello", "h1"), Path::new("blog/hello/.silan-cache"))
            .unwrap();

        let known = db.known_items().unwrap();
        assert!(known.contains(&(ContentType::Blog, "hello".to_string())));

        let records = db.load_sync_records().unwrap();
        let record = &records[&(ContentType::Blog, "hello".to_string())];
        assert_eq!(record.content_hash, "h1");
    }

    #[test]
    fn preserve_ids_keeps_db_id_across_updates() {
        let mut db = Database::open_in_memory().unwrap();
        let manifest = Path::new("blog/hello/.silan-cache");

        db.upsert_item(&item("hello", "h1"), manifest).unwrap();
        let first = db.item_db_id(ContentType::Blog, "hello").unwrap().unwrap();

        db.upsert_item(&item("hello", "h2"), manifest).unwrap();
        let second = db.item_db_id(ContentType::Blog, "hello").unwrap().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn replace_strategy_reinserts_the_row() {
        let mut db = Database::open_in_memory().unwrap();
        let manifest = Path::new("blog/hello/.silan-cache");

        db.upsert_item(&item("hello", "h1"), manifest).unwrap();
        db.write_item(&item("hello", "h2"), manifest, false, MergeStrategy::Replace)
            .unwrap();

        let records = db.load_sync_records().unwrap();
        assert_eq!(
            records[&(ContentType::Blog, "hello".to_string())].content_hash,
            "h2"
        );
    }

    #[test]
    fn relationships_replace_only_named_sources() {
        let mut db = Database::open_in_memory().unwrap();

        let link = |from: &str, to: &str| RelationshipLink {
            from_type: ContentType::Blog,
            from_id: from.into(),
            to_type: ContentType::Project,
            to_id: to.into(),
            kind: RelationshipKind::Related,
        };

        db.replace_relationships(
            &[
                (ContentType::Blog, "a".into()),
                (ContentType::Blog, "b".into()),
            ],
            &[link("a", "p1"), link("b", "p2")],
        )
        .unwrap();
        assert_eq!(db.relationship_count().unwrap(), 2);

        // Re-sync only "a": its links are replaced, "b" keeps its own.
        db.replace_relationships(&[(ContentType::Blog, "a".into())], &[link("a", "p3")])
            .unwrap();
        assert_eq!(db.relationship_count().unwrap(), 2);
    }

    #[test]
    fn counts_by_type_groups_rows() {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_item(&item("a", "h1"), Path::new("blog/a/.silan-cache"))
            .unwrap();
        db.upsert_item(&item("b", "h2"), Path::new("blog/b/.silan-cache"))
            .unwrap();

        let counts = db.counts_by_type().unwrap();
        assert_eq!(counts, vec![(ContentType::Blog, 2)]);
    }
}
