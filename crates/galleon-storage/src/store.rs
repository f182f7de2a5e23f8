//! SQLite implementation of the gallery index.
//!
//! [`IndexStore`] persists file records and per-sampler metadata in a
//! SQLite database with WAL mode, atomic transactions on every write, and
//! automatic schema migrations. Sampler rows are replaced wholesale per
//! file (delete-then-reinsert) because the number of samplers per file
//! varies between extractions; replacement inside the same transaction as
//! the file upsert guarantees no stale rows survive a crash mid-commit.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use tracing::debug;

use galleon_core::SamplerRecord;

use crate::error::StoreError;
use crate::ids;
use crate::query::{build_conditions, FileFilter, SortDir, SortKey};
use crate::types::{
    FileEntry, FileKind, FilePage, FileRecord, FilterOptions, IndexStats, KindStats, OptionCount,
    WorkflowStats,
};

const FILE_COLUMNS: &str = "f.id, f.path, f.mtime, f.name, f.kind, f.duration, f.dimensions, \
                            f.has_workflow, f.is_favorite, f.prompt_preview, f.sampler_names";

/// SQLite-backed gallery index.
///
/// Every write operation is wrapped in a transaction for atomicity. The
/// connection is not `Sync`; callers share the store behind an async mutex.
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    /// Opens (or creates) the index database at `path`.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = crate::schema::open_database(path)?;
        Ok(IndexStore { conn })
    }

    /// Opens an in-memory index (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(IndexStore { conn })
    }

    // -----------------------------------------------------------------------
    // Write surface (sync engine only)
    // -----------------------------------------------------------------------

    /// Upserts a batch of file records in one transaction.
    ///
    /// Updates rewrite every column except `is_favorite`, which is user
    /// state and survives re-indexing.
    pub fn upsert_files(&mut self, batch: &[FileRecord]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        upsert_files_tx(&tx, batch)?;
        tx.commit()?;
        Ok(())
    }

    /// Replaces all sampler rows for one file in one transaction.
    pub fn replace_samplers(
        &mut self,
        file_id: &str,
        records: &[SamplerRecord],
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        replace_samplers_tx(&tx, file_id, records)?;
        tx.commit()?;
        Ok(())
    }

    /// Commits one collected batch — file upserts plus per-file sampler
    /// replacement — inside a single transaction, so a crash mid-commit
    /// cannot leave a file's new record alongside its old sampler rows.
    pub fn commit_batch(
        &mut self,
        files: &[FileRecord],
        samplers: &[(String, Vec<SamplerRecord>)],
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        upsert_files_tx(&tx, files)?;
        for (file_id, records) in samplers {
            replace_samplers_tx(&tx, file_id, records)?;
        }
        tx.commit()?;
        debug!(
            files = files.len(),
            sampler_sets = samplers.len(),
            "committed index batch"
        );
        Ok(())
    }

    /// Deletes records by path in one transaction, returning the number of
    /// rows removed. Sampler rows cascade.
    pub fn delete_by_paths(&mut self, paths: &[String]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare_cached("DELETE FROM files WHERE path = ?1")?;
            for path in paths {
                deleted += stmt.execute(params![path])?;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }

    /// Deletes records by id in one transaction.
    pub fn delete_by_ids(&mut self, ids: &[String]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare_cached("DELETE FROM files WHERE id = ?1")?;
            for id in ids {
                deleted += stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }

    // -----------------------------------------------------------------------
    // Mutation surface (CRUD handlers)
    // -----------------------------------------------------------------------

    /// Sets the favorite flag on a batch of files, returning the number of
    /// rows updated.
    pub fn set_favorite(&mut self, ids: &[String], favorite: bool) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut updated = 0;
        {
            let mut stmt =
                tx.prepare_cached("UPDATE files SET is_favorite = ?1 WHERE id = ?2")?;
            for id in ids {
                updated += stmt.execute(params![favorite as i64, id])?;
            }
        }
        tx.commit()?;
        Ok(updated)
    }

    /// Flips the favorite flag on one file, returning the new state.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool, StoreError> {
        let current: Option<bool> = self
            .conn
            .query_row(
                "SELECT is_favorite FROM files WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let current = current.ok_or_else(|| StoreError::FileNotFound(id.to_string()))?;
        self.conn.execute(
            "UPDATE files SET is_favorite = ?1 WHERE id = ?2",
            params![!current as i64, id],
        )?;
        Ok(!current)
    }

    /// Atomically rewrites a file's path, name, and path-derived id after
    /// the filesystem rename/move has already succeeded.
    ///
    /// Sampler rows follow the id via `ON UPDATE CASCADE`, so the old id's
    /// rows are gone and the new id's rows are present with no duplicates.
    /// Returns the new id.
    pub fn update_path(
        &mut self,
        old_id: &str,
        new_path: &str,
        new_name: &str,
    ) -> Result<String, StoreError> {
        let new_id = ids::file_id(new_path);
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE files SET id = ?1, path = ?2, name = ?3 WHERE id = ?4",
            params![new_id, new_path, new_name, old_id],
        )?;
        if changed == 0 {
            return Err(StoreError::FileNotFound(old_id.to_string()));
        }
        tx.commit()?;
        Ok(new_id)
    }

    // -----------------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------------

    /// Returns `path -> mtime` for the whole index, or for the direct
    /// children of one folder.
    pub fn path_mtimes(&self, folder: Option<&str>) -> Result<HashMap<String, f64>, StoreError> {
        let mut result = HashMap::new();
        match folder {
            None => {
                let mut stmt = self.conn.prepare_cached("SELECT path, mtime FROM files")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                })?;
                for row in rows {
                    let (path, mtime) = row?;
                    result.insert(path, mtime);
                }
            }
            Some(dir) => {
                let prefix = format!(
                    "{}{}%",
                    dir.trim_end_matches(std::path::MAIN_SEPARATOR),
                    std::path::MAIN_SEPARATOR
                );
                let mut stmt = self
                    .conn
                    .prepare_cached("SELECT path, mtime FROM files WHERE path LIKE ?1")?;
                let rows = stmt.query_map(params![prefix], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                })?;
                let dir_path = Path::new(dir);
                for row in rows {
                    let (path, mtime) = row?;
                    // LIKE matched the whole subtree; keep direct children only.
                    if Path::new(&path).parent() == Some(dir_path) {
                        result.insert(path, mtime);
                    }
                }
            }
        }
        Ok(result)
    }

    /// Counts files matching a filter.
    pub fn count_matching(&self, filter: &FileFilter) -> Result<i64, StoreError> {
        let (conditions, sql_params) = build_conditions(filter);
        let sql = format!(
            "SELECT COUNT(*) FROM files f {}",
            where_clause(&conditions)
        );
        let count = self
            .conn
            .query_row(&sql, params_from_iter(sql_params), |row| row.get(0))?;
        Ok(count)
    }

    /// Returns one page of matching files plus the total matching count.
    pub fn query_page(
        &self,
        filter: &FileFilter,
        sort: SortKey,
        dir: SortDir,
        limit: u32,
        offset: u32,
    ) -> Result<FilePage, StoreError> {
        let (conditions, sql_params) = build_conditions(filter);
        let clause = where_clause(&conditions);

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM files f {clause}"),
            params_from_iter(sql_params.clone()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {FILE_COLUMNS}, \
             COALESCE((SELECT COUNT(*) FROM samplers s WHERE s.file_id = f.id), 0) \
             AS sampler_count \
             FROM files f {clause} ORDER BY f.{} {} LIMIT ? OFFSET ?",
            sort.column(),
            dir.keyword()
        );
        let mut page_params = sql_params;
        page_params.push(SqlValue::Integer(limit as i64));
        page_params.push(SqlValue::Integer(offset as i64));

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(page_params), |row| {
            Ok(FileEntry {
                record: file_from_row(row)?,
                sampler_count: row.get("sampler_count")?,
            })
        })?;

        let mut files = Vec::new();
        for row in rows {
            files.push(row?);
        }
        Ok(FilePage { files, total })
    }

    /// Looks up one file record by id.
    pub fn get_file(&self, id: &str) -> Result<Option<FileRecord>, StoreError> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files f WHERE f.id = ?1");
        let record = self
            .conn
            .query_row(&sql, params![id], |row| file_from_row(row))
            .optional()?;
        Ok(record)
    }

    /// Returns all sampler rows for one file, ordered by sampler index.
    pub fn samplers_for_file(&self, file_id: &str) -> Result<Vec<SamplerRecord>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT sampler_index, model_name, sampler_name, scheduler, cfg, steps, \
             positive_prompt, negative_prompt, width, height \
             FROM samplers WHERE file_id = ?1 ORDER BY sampler_index",
        )?;
        let rows = stmt.query_map(params![file_id], |row| {
            Ok(SamplerRecord {
                sampler_index: row.get::<_, i64>(0)? as u32,
                model_name: row.get(1)?,
                sampler_name: row.get(2)?,
                scheduler: row.get(3)?,
                cfg: row.get(4)?,
                steps: row.get::<_, Option<i64>>(5)?.map(|s| s as u32),
                positive_prompt: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                negative_prompt: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                width: row.get::<_, Option<i64>>(8)?.map(|w| w as u32),
                height: row.get::<_, Option<i64>>(9)?.map(|h| h as u32),
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Total number of indexed files.
    pub fn file_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?)
    }

    /// Number of files carrying at least one sampler row.
    pub fn files_with_metadata(&self) -> Result<i64, StoreError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(DISTINCT file_id) FROM samplers",
            [],
            |row| row.get(0),
        )?)
    }

    /// Aggregates distinct filterable values and numeric ranges.
    ///
    /// This is the expensive computation the caller shields behind a
    /// bounded cache.
    pub fn filter_options(&self) -> Result<FilterOptions, StoreError> {
        let models = self.option_counts("model_name")?;
        let samplers = self.option_counts("sampler_name")?;
        let schedulers = self.option_counts("scheduler")?;

        let cfg_range: Option<(f64, f64)> = self
            .conn
            .query_row(
                "SELECT MIN(cfg), MAX(cfg) FROM samplers WHERE cfg IS NOT NULL",
                [],
                |row| Ok((row.get::<_, Option<f64>>(0)?, row.get::<_, Option<f64>>(1)?)),
            )
            .map(|(min, max)| min.zip(max))?;
        let steps_range = self.int_range("steps")?;
        let width_range = self.int_range("width")?;
        let height_range = self.int_range("height")?;

        Ok(FilterOptions {
            models,
            samplers,
            schedulers,
            cfg_range,
            steps_range,
            width_range,
            height_range,
        })
    }

    fn option_counts(&self, column: &str) -> Result<Vec<OptionCount>, StoreError> {
        let sql = format!(
            "SELECT {column}, COUNT(DISTINCT file_id) AS file_count FROM samplers \
             WHERE {column} IS NOT NULL AND {column} != '' \
             GROUP BY {column} ORDER BY file_count DESC, {column}"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(OptionCount {
                value: row.get(0)?,
                file_count: row.get(1)?,
            })
        })?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    fn int_range(&self, column: &str) -> Result<Option<(i64, i64)>, StoreError> {
        let sql = format!(
            "SELECT MIN({column}), MAX({column}) FROM samplers WHERE {column} IS NOT NULL"
        );
        let range = self
            .conn
            .query_row(&sql, [], |row| {
                Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, Option<i64>>(1)?))
            })
            .map(|(min, max)| min.zip(max))?;
        Ok(range)
    }

    /// Per-kind and workflow-wide statistics.
    pub fn stats(&self) -> Result<IndexStats, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT kind, COUNT(*), \
             SUM(CASE WHEN has_workflow = 1 THEN 1 ELSE 0 END), \
             SUM(CASE WHEN is_favorite = 1 THEN 1 ELSE 0 END) \
             FROM files GROUP BY kind",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(KindStats {
                kind: row.get(0)?,
                count: row.get(1)?,
                with_workflow: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                favorites: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
            })
        })?;
        let mut files = Vec::new();
        for row in rows {
            files.push(row?);
        }

        let workflows = self.conn.query_row(
            "SELECT COUNT(DISTINCT file_id), COUNT(*), \
             COUNT(DISTINCT model_name), COUNT(DISTINCT sampler_name), \
             COUNT(DISTINCT scheduler) FROM samplers",
            [],
            |row| {
                Ok(WorkflowStats {
                    total_files: row.get(0)?,
                    total_samplers: row.get(1)?,
                    unique_models: row.get(2)?,
                    unique_samplers: row.get(3)?,
                    unique_schedulers: row.get(4)?,
                })
            },
        )?;

        Ok(IndexStats { files, workflows })
    }
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

fn upsert_files_tx(tx: &Transaction<'_>, batch: &[FileRecord]) -> Result<(), StoreError> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO files (id, path, mtime, name, kind, duration, dimensions, \
         has_workflow, prompt_preview, sampler_names) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
         ON CONFLICT(id) DO UPDATE SET \
         path = excluded.path, mtime = excluded.mtime, name = excluded.name, \
         kind = excluded.kind, duration = excluded.duration, \
         dimensions = excluded.dimensions, has_workflow = excluded.has_workflow, \
         prompt_preview = excluded.prompt_preview, \
         sampler_names = excluded.sampler_names",
    )?;
    for record in batch {
        stmt.execute(params![
            record.id,
            record.path,
            record.mtime,
            record.name,
            record.kind.as_str(),
            record.duration,
            record.dimensions,
            record.has_workflow as i64,
            record.prompt_preview,
            record.sampler_names,
        ])?;
    }
    Ok(())
}

fn replace_samplers_tx(
    tx: &Transaction<'_>,
    file_id: &str,
    records: &[SamplerRecord],
) -> Result<(), StoreError> {
    tx.execute("DELETE FROM samplers WHERE file_id = ?1", params![file_id])?;
    let mut stmt = tx.prepare_cached(
        "INSERT INTO samplers (file_id, sampler_index, model_name, sampler_name, \
         scheduler, cfg, steps, positive_prompt, negative_prompt, width, height) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;
    for record in records {
        stmt.execute(params![
            file_id,
            record.sampler_index,
            record.model_name,
            record.sampler_name,
            record.scheduler,
            record.cfg,
            record.steps,
            record.positive_prompt,
            record.negative_prompt,
            record.width,
            record.height,
        ])?;
    }
    Ok(())
}

fn file_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        path: row.get(1)?,
        mtime: row.get(2)?,
        name: row.get(3)?,
        kind: FileKind::parse(&row.get::<_, String>(4)?),
        duration: row.get(5)?,
        dimensions: row.get(6)?,
        has_workflow: row.get::<_, i64>(7)? != 0,
        is_favorite: row.get::<_, i64>(8)? != 0,
        prompt_preview: row.get(9)?,
        sampler_names: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::MetadataFilter;

    fn record(path: &str, mtime: f64) -> FileRecord {
        let name = Path::new(path)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        FileRecord {
            id: ids::file_id(path),
            path: path.to_string(),
            mtime,
            name,
            kind: FileKind::Image,
            duration: None,
            dimensions: Some("1024x768".to_string()),
            has_workflow: true,
            is_favorite: false,
            prompt_preview: None,
            sampler_names: "euler".to_string(),
        }
    }

    fn sampler(index: u32, name: &str, cfg: f64) -> SamplerRecord {
        SamplerRecord {
            sampler_index: index,
            model_name: Some("sdxl_base".to_string()),
            sampler_name: Some(name.to_string()),
            scheduler: Some("normal".to_string()),
            positive_prompt: "a castle".to_string(),
            negative_prompt: String::new(),
            width: Some(1024),
            height: Some(768),
            cfg: Some(cfg),
            steps: Some(20),
        }
    }

    #[test]
    fn upsert_preserves_favorite_flag_across_updates() {
        let mut store = IndexStore::in_memory().unwrap();
        let rec = record("/g/a.png", 100.0);
        store.upsert_files(&[rec.clone()]).unwrap();
        store.set_favorite(&[rec.id.clone()], true).unwrap();

        let mut updated = rec.clone();
        updated.mtime = 200.0;
        store.upsert_files(&[updated]).unwrap();

        let loaded = store.get_file(&rec.id).unwrap().unwrap();
        assert!(loaded.is_favorite);
        assert_eq!(loaded.mtime, 200.0);
    }

    #[test]
    fn replace_samplers_leaves_no_stale_rows() {
        let mut store = IndexStore::in_memory().unwrap();
        let rec = record("/g/a.png", 100.0);
        store.upsert_files(&[rec.clone()]).unwrap();
        store
            .replace_samplers(
                &rec.id,
                &[sampler(0, "euler", 7.0), sampler(1, "dpmpp_2m", 4.0), sampler(2, "ddim", 2.0)],
            )
            .unwrap();
        assert_eq!(store.samplers_for_file(&rec.id).unwrap().len(), 3);

        // A later extraction found fewer samplers; old extras must vanish.
        store
            .replace_samplers(&rec.id, &[sampler(0, "euler", 7.0)])
            .unwrap();
        let rows = store.samplers_for_file(&rec.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sampler_name.as_deref(), Some("euler"));
    }

    #[test]
    fn metadata_filter_never_duplicates_files() {
        let mut store = IndexStore::in_memory().unwrap();
        let rec = record("/g/a.png", 100.0);
        store.upsert_files(&[rec.clone()]).unwrap();
        // Two samplers that both satisfy a cfg range filter.
        store
            .replace_samplers(&rec.id, &[sampler(0, "euler", 7.0), sampler(1, "dpmpp_2m", 4.0)])
            .unwrap();

        let filter = FileFilter {
            metadata: MetadataFilter {
                cfg_min: Some(1.0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(store.count_matching(&filter).unwrap(), 1);
        let page = store
            .query_page(&filter, SortKey::Mtime, SortDir::Desc, 10, 0)
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.files.len(), 1);
        assert_eq!(page.files[0].sampler_count, 2);
    }

    #[test]
    fn metadata_filter_requires_one_sampler_matching_all_criteria() {
        let mut store = IndexStore::in_memory().unwrap();
        let rec = record("/g/a.png", 100.0);
        store.upsert_files(&[rec.clone()]).unwrap();
        store
            .replace_samplers(&rec.id, &[sampler(0, "euler", 7.0), sampler(1, "dpmpp_2m", 4.0)])
            .unwrap();

        // Matches sampler 0 exactly.
        let filter = FileFilter {
            metadata: MetadataFilter {
                sampler: Some("euler".to_string()),
                cfg_min: Some(6.0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(store.count_matching(&filter).unwrap(), 1);

        // Name matches sampler 1 but the cfg bound only matches sampler 0:
        // no single sampler satisfies both.
        let disjoint = FileFilter {
            metadata: MetadataFilter {
                sampler: Some("dpmpp_2m".to_string()),
                cfg_min: Some(6.0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(store.count_matching(&disjoint).unwrap(), 0);
    }

    #[test]
    fn rename_moves_id_and_cascades_sampler_rows() {
        let mut store = IndexStore::in_memory().unwrap();
        let rec = record("/g/a.png", 100.0);
        store.upsert_files(&[rec.clone()]).unwrap();
        store
            .replace_samplers(&rec.id, &[sampler(0, "euler", 7.0)])
            .unwrap();

        let new_id = store
            .update_path(&rec.id, "/g/renamed.png", "renamed.png")
            .unwrap();
        assert_eq!(new_id, ids::file_id("/g/renamed.png"));
        assert_ne!(new_id, rec.id);

        assert!(store.get_file(&rec.id).unwrap().is_none());
        let moved = store.get_file(&new_id).unwrap().unwrap();
        assert_eq!(moved.path, "/g/renamed.png");

        assert!(store.samplers_for_file(&rec.id).unwrap().is_empty());
        assert_eq!(store.samplers_for_file(&new_id).unwrap().len(), 1);
    }

    #[test]
    fn update_path_on_missing_id_errors() {
        let mut store = IndexStore::in_memory().unwrap();
        let result = store.update_path("nope", "/g/x.png", "x.png");
        assert!(matches!(result, Err(StoreError::FileNotFound(_))));
    }

    #[test]
    fn delete_by_paths_cascades_samplers() {
        let mut store = IndexStore::in_memory().unwrap();
        let rec = record("/g/a.png", 100.0);
        store.upsert_files(&[rec.clone()]).unwrap();
        store
            .replace_samplers(&rec.id, &[sampler(0, "euler", 7.0)])
            .unwrap();

        assert_eq!(store.delete_by_paths(&[rec.path.clone()]).unwrap(), 1);
        assert_eq!(store.file_count().unwrap(), 0);
        assert_eq!(store.files_with_metadata().unwrap(), 0);
    }

    #[test]
    fn query_page_paginates_with_totals() {
        let mut store = IndexStore::in_memory().unwrap();
        let batch: Vec<FileRecord> = (0..5)
            .map(|i| record(&format!("/g/f{i}.png"), 100.0 + i as f64))
            .collect();
        store.upsert_files(&batch).unwrap();

        let page = store
            .query_page(&FileFilter::default(), SortKey::Mtime, SortDir::Desc, 2, 2)
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.files.len(), 2);
        // Descending mtime: f4, f3 | f2, f1 | f0.
        assert_eq!(page.files[0].record.name, "f2.png");
        assert_eq!(page.files[1].record.name, "f1.png");
    }

    #[test]
    fn folder_scope_limits_path_mtimes_to_direct_children() {
        let mut store = IndexStore::in_memory().unwrap();
        store
            .upsert_files(&[
                record("/g/a.png", 1.0),
                record("/g/sub/b.png", 2.0),
                record("/other/c.png", 3.0),
            ])
            .unwrap();

        let all = store.path_mtimes(None).unwrap();
        assert_eq!(all.len(), 3);

        let scoped = store.path_mtimes(Some("/g")).unwrap();
        assert_eq!(scoped.len(), 1);
        assert!(scoped.contains_key("/g/a.png"));
    }

    #[test]
    fn filter_options_aggregate_counts_and_ranges() {
        let mut store = IndexStore::in_memory().unwrap();
        let a = record("/g/a.png", 1.0);
        let b = record("/g/b.png", 2.0);
        store.upsert_files(&[a.clone(), b.clone()]).unwrap();
        store
            .replace_samplers(&a.id, &[sampler(0, "euler", 7.0), sampler(1, "euler", 3.0)])
            .unwrap();
        store
            .replace_samplers(&b.id, &[sampler(0, "dpmpp_2m", 5.5)])
            .unwrap();

        let options = store.filter_options().unwrap();
        // "euler" appears in two rows of one file: file_count is distinct.
        let euler = options
            .samplers
            .iter()
            .find(|o| o.value == "euler")
            .unwrap();
        assert_eq!(euler.file_count, 1);
        assert_eq!(options.cfg_range, Some((3.0, 7.0)));
        assert_eq!(options.steps_range, Some((20, 20)));
    }

    #[test]
    fn stats_group_by_kind() {
        let mut store = IndexStore::in_memory().unwrap();
        let mut vid = record("/g/v.mp4", 1.0);
        vid.kind = FileKind::Video;
        vid.has_workflow = false;
        store.upsert_files(&[record("/g/a.png", 1.0), vid]).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.files.len(), 2);
        let images = stats.files.iter().find(|k| k.kind == "image").unwrap();
        assert_eq!(images.count, 1);
        assert_eq!(images.with_workflow, 1);
        assert_eq!(stats.workflows.total_samplers, 0);
    }
}
