//! Ingestion pipeline orchestration.
//!
//! Coordinates the full run: discovery → digest → load → chunk → persist →
//! register. Files are independent units: a failure in one is recorded in
//! the run report and never aborts the run, and no cross-file ordering is
//! guaranteed. Within one file, document and chunk order is preserved
//! exactly as produced.
//!
//! The registry is the only shared mutable state; in worker-pool mode it
//! sits behind a mutex as the single point of serialized access.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::chunker::{self, SplitParams};
use crate::config::Config;
use crate::error::IngestError;
use crate::identity;
use crate::loader;
use crate::models::DiscoveredFile;
use crate::progress::{IngestProgressEvent, ProgressReporter};
use crate::registry::Registry;
use crate::sink::ChunkSink;

/// Terminal state of one file within a run.
#[derive(Debug)]
pub enum FileOutcome {
    /// Registry digest matched; nothing to do.
    Skipped,
    /// Processed and registered.
    Done { chunks: usize },
    /// Any per-file error; the registry entry is left untouched so the next
    /// run retries the file.
    Failed { error: IngestError },
}

/// Aggregate of per-file outcomes. The run's result is this report, never a
/// single pass/fail.
#[derive(Debug, Default)]
pub struct RunReport {
    pub discovered: usize,
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
    pub chunks_written: usize,
    pub failures: Vec<(String, IngestError)>,
    pub cancelled: bool,
}

pub async fn run_ingest(
    config: &Config,
    force: bool,
    workers: usize,
    reporter: Box<dyn ProgressReporter>,
) -> Result<RunReport> {
    let root = &config.source.root;
    if !root.exists() {
        bail!("Corpus root does not exist: {}", root.display());
    }

    let params = SplitParams::new(config.chunking.chunk_size, config.chunking.chunk_overlap)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    reporter.report(IngestProgressEvent::Discovering {
        root: root.display().to_string(),
    });
    let files = discover_files(config)?;

    let registry = Arc::new(Mutex::new(Registry::load(&config.store.registry_path)?));
    let sink = ChunkSink::new(&config.store.chunks_dir);

    // Graceful stop: finish the file in flight, skip the rest.
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let report = if workers <= 1 {
        run_sequential(&files, force, &params, &sink, &registry, &stop, reporter.as_ref())
    } else {
        run_parallel(
            files, force, params, sink, registry, stop, workers, reporter,
        )
        .await
    };

    print_summary(root, &report);
    Ok(report)
}

/// Enumerates regular files under the corpus root, applying include/exclude
/// globs and skipping hidden files. Order is deterministic.
pub fn discover_files(config: &Config) -> Result<Vec<DiscoveredFile>> {
    let src = &config.source;
    let include_set = build_globset(&src.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(src.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(&src.root).follow_links(src.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false);
        if hidden {
            continue;
        }

        let relative = path.strip_prefix(&src.root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(DiscoveredFile {
            path: path.to_path_buf(),
            rel_path: rel_str,
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[allow(clippy::too_many_arguments)]
fn run_sequential(
    files: &[DiscoveredFile],
    force: bool,
    params: &SplitParams,
    sink: &ChunkSink,
    registry: &Mutex<Registry>,
    stop: &AtomicBool,
    reporter: &dyn ProgressReporter,
) -> RunReport {
    let mut report = RunReport {
        discovered: files.len(),
        ..Default::default()
    };
    let total = files.len() as u64;

    for (i, file) in files.iter().enumerate() {
        if stop.load(Ordering::SeqCst) {
            report.cancelled = true;
            break;
        }
        reporter.report(IngestProgressEvent::Processing {
            n: i as u64 + 1,
            total,
            file: file.rel_path.clone(),
        });
        let outcome = process_file(file, force, params, sink, registry);
        record(&mut report, &file.rel_path, outcome);
    }
    report
}

#[allow(clippy::too_many_arguments)]
async fn run_parallel(
    files: Vec<DiscoveredFile>,
    force: bool,
    params: SplitParams,
    sink: ChunkSink,
    registry: Arc<Mutex<Registry>>,
    stop: Arc<AtomicBool>,
    workers: usize,
    reporter: Box<dyn ProgressReporter>,
) -> RunReport {
    use tokio::sync::Semaphore;
    use tokio::task::JoinSet;

    let mut report = RunReport {
        discovered: files.len(),
        ..Default::default()
    };
    let total = files.len() as u64;
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks: JoinSet<(String, FileOutcome)> = JoinSet::new();

    let mut spawned = 0u64;
    for file in files {
        if stop.load(Ordering::SeqCst) {
            report.cancelled = true;
            break;
        }
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("worker semaphore closed");
        // Re-check after waiting on a slot so a stop request during a long
        // file does not start new work.
        if stop.load(Ordering::SeqCst) {
            report.cancelled = true;
            break;
        }

        spawned += 1;
        reporter.report(IngestProgressEvent::Processing {
            n: spawned,
            total,
            file: file.rel_path.clone(),
        });

        let sink = sink.clone();
        let registry = registry.clone();
        tasks.spawn_blocking(move || {
            let outcome = process_file(&file, force, &params, &sink, &registry);
            drop(permit);
            (file.rel_path, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((rel_path, outcome)) => record(&mut report, &rel_path, outcome),
            Err(e) => record(
                &mut report,
                "(worker)",
                FileOutcome::Failed {
                    error: IngestError::Io(format!("worker task failed: {}", e)),
                },
            ),
        }
    }
    report
}

/// Runs one file through the pipeline. Every error becomes a
/// [`FileOutcome::Failed`]; nothing escapes the per-file boundary.
fn process_file(
    file: &DiscoveredFile,
    force: bool,
    params: &SplitParams,
    sink: &ChunkSink,
    registry: &Mutex<Registry>,
) -> FileOutcome {
    match try_process(file, force, params, sink, registry) {
        Ok(outcome) => outcome,
        Err(error) => FileOutcome::Failed { error },
    }
}

fn try_process(
    file: &DiscoveredFile,
    force: bool,
    params: &SplitParams,
    sink: &ChunkSink,
    registry: &Mutex<Registry>,
) -> Result<FileOutcome, IngestError> {
    let bytes = std::fs::read(&file.path)?;
    let digest = identity::digest_bytes(&bytes);

    let previous_digest = {
        let reg = registry.lock().expect("registry lock poisoned");
        if !force && reg.is_processed(&file.rel_path, &digest) {
            return Ok(FileOutcome::Skipped);
        }
        reg.entry(&file.rel_path).map(|e| e.digest.clone())
    };

    let documents = loader::load_file(&file.path, &bytes)?;
    let chunks = chunker::split_documents(&documents, params);
    sink.persist(&chunks)?;

    // Supersede units of the old content version once the new ones exist.
    if let Some(old) = previous_digest {
        if old != digest {
            sink.remove_source(&old)?;
        }
    }

    registry
        .lock()
        .expect("registry lock poisoned")
        .register_file(&file.rel_path, &digest, chunks.len())?;

    Ok(FileOutcome::Done {
        chunks: chunks.len(),
    })
}

fn record(report: &mut RunReport, rel_path: &str, outcome: FileOutcome) {
    match outcome {
        FileOutcome::Skipped => report.skipped += 1,
        FileOutcome::Done { chunks } => {
            report.done += 1;
            report.chunks_written += chunks;
        }
        FileOutcome::Failed { error } => {
            report.failed += 1;
            report.failures.push((rel_path.to_string(), error));
        }
    }
}

fn print_summary(root: &Path, report: &RunReport) {
    println!("ingest {}", root.display());
    println!("  discovered: {} files", report.discovered);
    println!("  done: {} ({} chunks written)", report.done, report.chunks_written);
    println!("  skipped: {}", report.skipped);
    println!("  failed: {}", report.failed);
    for (path, error) in &report.failures {
        println!("    {} [{}]: {}", path, error.kind(), error);
    }
    if report.cancelled {
        println!("  cancelled: remaining files were not processed");
    }
    println!("ok");
}
