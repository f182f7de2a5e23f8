//! The reconciliation state machine.
//!
//! One pass runs Scan → Diff → Dispatch → Collect → Commit → Publish:
//! enumerate candidate files with mtimes, three-way diff against the
//! index, fan extraction out over a bounded worker pool, gather results as
//! they complete, commit in batched transactions, then invalidate cached
//! aggregates. The driver is single-threaded relative to one pass; only
//! the dispatch phase fans out. Concurrent passes serialize on an internal
//! guard so one pass's commits complete before another's begin.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use galleon_core::SamplerRecord;
use galleon_storage::{file_id, thumb_hash, FileRecord, FilterOptions, IndexStore};

use crate::analyzer;
use crate::cache::BoundedCache;
use crate::config::{ExtensionSets, SyncConfig, WorkerContext};
use crate::error::SyncError;

/// One progress event from an on-demand folder sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncProgress {
    pub message: String,
    pub current: usize,
    pub total: usize,
}

/// Outcome counters for one reconciliation pass.
///
/// Partial failures are summarized here rather than surfaced as a single
/// pass/fail flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncSummary {
    /// Files on disk but not in the index.
    pub added: usize,
    /// Files whose on-disk mtime advanced past the indexed one.
    pub updated: usize,
    /// Index rows whose path disappeared from disk.
    pub deleted: usize,
    /// Files successfully processed by a worker.
    pub processed: usize,
    /// Files whose worker failed; they are excluded from this pass.
    pub failed: usize,
    /// Processed files carrying embedded metadata.
    pub with_workflow: usize,
    /// Files whose metadata yielded at least one sampler record.
    pub metadata_extracted: usize,
    /// Files with metadata present but no extractable sampler records.
    pub without_metadata: usize,
    /// Sampler records extracted across the pass.
    pub total_samplers: usize,
}

impl SyncSummary {
    /// True when the pass found nothing to do.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.deleted == 0
    }
}

struct ProcessedFile {
    record: FileRecord,
    samplers: Vec<SamplerRecord>,
}

/// Disk/index reconciliation engine.
pub struct SyncEngine {
    store: Arc<tokio::sync::Mutex<IndexStore>>,
    context: Arc<WorkerContext>,
    config: SyncConfig,
    filter_cache: Arc<BoundedCache<String, FilterOptions>>,
    /// Serializes passes: batched commits from one pass complete before
    /// another pass's commits begin.
    pass_guard: tokio::sync::Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<tokio::sync::Mutex<IndexStore>>,
        context: Arc<WorkerContext>,
        config: SyncConfig,
        filter_cache: Arc<BoundedCache<String, FilterOptions>>,
    ) -> Self {
        SyncEngine {
            store,
            context,
            config,
            filter_cache,
            pass_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Full reconciliation of the whole directory tree. Used at startup
    /// and after schema migrations.
    pub async fn run_full_sync(&self) -> Result<SyncSummary, SyncError> {
        let _pass = self.pass_guard.lock().await;
        info!(base = %self.config.base_path.display(), "starting full reconciliation pass");

        let disk = scan_tree(
            &self.config.base_path,
            &self.config.excluded_dirs,
            &self.context.extensions,
        );
        let summary = self.reconcile(disk, None, None).await?;

        info!(
            added = summary.added,
            updated = summary.updated,
            deleted = summary.deleted,
            processed = summary.processed,
            failed = summary.failed,
            with_workflow = summary.with_workflow,
            metadata_extracted = summary.metadata_extracted,
            total_samplers = summary.total_samplers,
            "full reconciliation pass complete"
        );
        Ok(summary)
    }

    /// On-demand reconciliation of one folder's direct children, streaming
    /// a progress event after each completed file.
    pub async fn run_folder_sync(
        &self,
        folder: &Path,
        progress: mpsc::Sender<SyncProgress>,
    ) -> Result<SyncSummary, SyncError> {
        let _pass = self.pass_guard.lock().await;
        send_progress(Some(&progress), "Checking folder for changes...", 0, 1).await;

        let disk = scan_folder(folder, &self.context.extensions);
        let scope = folder.to_string_lossy().into_owned();
        let summary = self.reconcile(disk, Some(&scope), Some(&progress)).await?;

        let message = if summary.is_noop() {
            "Folder is up-to-date."
        } else {
            "Sync complete."
        };
        send_progress(Some(&progress), message, 1, 1).await;
        Ok(summary)
    }

    async fn reconcile(
        &self,
        disk: HashMap<String, f64>,
        scope: Option<&str>,
        progress: Option<&mpsc::Sender<SyncProgress>>,
    ) -> Result<SyncSummary, SyncError> {
        let mut summary = SyncSummary::default();

        // Diff: three-way set comparison against the index. Mtimes compare
        // at whole-second precision so sub-second filesystem jitter does
        // not churn the index.
        let indexed = self.store.lock().await.path_mtimes(scope)?;
        let mut to_process: Vec<(String, f64)> = Vec::new();
        for (path, &mtime) in &disk {
            match indexed.get(path) {
                None => {
                    summary.added += 1;
                    to_process.push((path.clone(), mtime));
                }
                Some(&indexed_mtime) if (mtime as i64) > (indexed_mtime as i64) => {
                    summary.updated += 1;
                    to_process.push((path.clone(), mtime));
                }
                Some(_) => {}
            }
        }
        let to_delete: Vec<String> = indexed
            .keys()
            .filter(|path| !disk.contains_key(*path))
            .cloned()
            .collect();

        debug!(
            to_process = to_process.len(),
            to_delete = to_delete.len(),
            "diff complete"
        );

        // Dispatch: bounded worker pool over analysis + extraction.
        let total = to_process.len();
        if total > 0 {
            send_progress(
                progress,
                &format!("Found {total} new or modified files. Processing..."),
                0,
                total,
            )
            .await;
        }

        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut workers: JoinSet<(String, Option<ProcessedFile>)> = JoinSet::new();
        for (path, mtime) in to_process {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let context = Arc::clone(&self.context);
            workers.spawn(async move {
                let _permit = permit;
                let worker_path = path.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    process_file(&context, Path::new(&worker_path), mtime)
                })
                .await;
                match joined {
                    Ok(result) => (path, result),
                    Err(e) => {
                        warn!(error = %e, path = %path, "extraction worker panicked");
                        (path, None)
                    }
                }
            });
        }

        // Collect: gather per-file results as they complete. One failure
        // never blocks collection of the rest.
        let mut collected: Vec<ProcessedFile> = Vec::new();
        let mut current = 0usize;
        while let Some(joined) = workers.join_next().await {
            current += 1;
            match joined {
                Ok((_, Some(file))) => {
                    summary.processed += 1;
                    if file.record.has_workflow {
                        summary.with_workflow += 1;
                        if file.samplers.is_empty() {
                            summary.without_metadata += 1;
                        } else {
                            summary.metadata_extracted += 1;
                            summary.total_samplers += file.samplers.len();
                        }
                    }
                    send_progress(
                        progress,
                        &format!("Processed {}", file.record.name),
                        current,
                        total,
                    )
                    .await;
                    collected.push(file);
                }
                Ok((path, None)) => {
                    summary.failed += 1;
                    warn!(path = %path, "file excluded from pass");
                    send_progress(progress, "Processing failed for one file", current, total)
                        .await;
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(error = %e, "worker task aborted");
                }
            }
        }

        // Commit: batched transactions; deletions in one transaction.
        {
            let mut store = self.store.lock().await;
            for chunk in collected.chunks(self.config.batch_size.max(1)) {
                let files: Vec<FileRecord> =
                    chunk.iter().map(|f| f.record.clone()).collect();
                let samplers: Vec<(String, Vec<SamplerRecord>)> = chunk
                    .iter()
                    .map(|f| (f.record.id.clone(), f.samplers.clone()))
                    .collect();
                store.commit_batch(&files, &samplers)?;
            }
            if !to_delete.is_empty() {
                summary.deleted = store.delete_by_paths(&to_delete)?;
            }
        }

        // Publish: cached aggregates may now be stale.
        self.filter_cache.clear();

        Ok(summary)
    }
}

async fn send_progress(
    progress: Option<&mpsc::Sender<SyncProgress>>,
    message: &str,
    current: usize,
    total: usize,
) {
    if let Some(tx) = progress {
        tx.send(SyncProgress {
            message: message.to_string(),
            current,
            total,
        })
        .await
        .ok();
    }
}

/// Worker body: classify, probe, extract, thumbnail, assemble the record.
///
/// Runs on the blocking pool with only the immutable context; returns None
/// when the file vanished or has no usable name.
fn process_file(context: &WorkerContext, path: &Path, mtime: f64) -> Option<ProcessedFile> {
    let name = path.file_name()?.to_string_lossy().into_owned();
    let path_str = path.to_string_lossy().into_owned();

    let details = analyzer::analyze(path, &context.extensions);
    let raw = context.source.raw_metadata(path);
    let has_workflow = raw.is_some();
    let samplers = match &raw {
        Some(bytes) => context
            .metadata
            .extract_named(&name, bytes, details.pixel_size),
        None => Vec::new(),
    };

    let prompt_preview = samplers
        .first()
        .and_then(|s| preview_text(&s.positive_prompt));
    let names: BTreeSet<&str> = samplers
        .iter()
        .filter_map(|s| s.sampler_name.as_deref())
        .collect();
    let sampler_names = names.into_iter().collect::<Vec<_>>().join(", ");

    let id = file_id(&path_str);
    context
        .thumbnails
        .produce(path, &thumb_hash(&path_str, mtime), details.kind);

    Some(ProcessedFile {
        record: FileRecord {
            id,
            path: path_str,
            mtime,
            name,
            kind: details.kind,
            duration: details.duration,
            dimensions: details.dimensions,
            has_workflow,
            is_favorite: false,
            prompt_preview,
            sampler_names,
        },
        samplers,
    })
}

/// Display preview: the first 150 characters of the prompt, with an
/// ellipsis when truncated. Character-based so multibyte text never splits.
fn preview_text(prompt: &str) -> Option<String> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut preview: String = trimmed.chars().take(150).collect();
    if trimmed.chars().count() > 150 {
        preview.push_str("...");
    }
    Some(preview)
}

/// Recursive scan of the whole tree, skipping excluded directory names.
/// Unreadable subtrees contribute nothing; the rest of the scan proceeds.
fn scan_tree(
    base: &Path,
    excluded: &[String],
    extensions: &ExtensionSets,
) -> HashMap<String, f64> {
    let mut disk = HashMap::new();
    let walker = WalkDir::new(base).into_iter().filter_entry(|entry| {
        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            !excluded.iter().any(|ex| ex.as_str() == name)
        } else {
            true
        }
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = analyzer::dotted_extension(entry.path());
        if !extensions.is_media(&ext) {
            continue;
        }
        if let Some(mtime) = entry.metadata().ok().as_ref().and_then(system_mtime) {
            disk.insert(entry.path().to_string_lossy().into_owned(), mtime);
        }
    }
    disk
}

/// Non-recursive scan of one folder's direct children.
fn scan_folder(folder: &Path, extensions: &ExtensionSets) -> HashMap<String, f64> {
    let mut disk = HashMap::new();
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, folder = %folder.display(), "could not read folder");
            return disk;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = analyzer::dotted_extension(&path);
        if !extensions.is_media(&ext) {
            continue;
        }
        if let Some(mtime) = entry.metadata().ok().as_ref().and_then(system_mtime) {
            disk.insert(path.to_string_lossy().into_owned(), mtime);
        }
    }
    disk
}

fn system_mtime(meta: &std::fs::Metadata) -> Option<f64> {
    meta.modified()
        .ok()?
        .duration_since(std::time::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs_f64())
}
