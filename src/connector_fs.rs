use anyhow::{bail, Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::chunk::non_empty_chunks;
use crate::config::{Config, LocalConfig};
use crate::models::LocalTrainReport;
use crate::store::DocumentStore;

/// A file selected for training.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub path: PathBuf,
    pub relative_path: String,
}

/// Walk `root` recursively and return allow-listed files, sorted by path.
///
/// Also returns how many regular files were left out by the globs.
pub fn scan_directory(root: &Path, config: &LocalConfig) -> Result<(Vec<LocalFile>, usize)> {
    if !root.exists() {
        bail!("Directory does not exist: {}", root.display());
    }
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut excludes = vec!["**/.git/**".to_string()];
    excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&excludes)?;

    let mut files = Vec::new();
    let mut filtered = 0usize;

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            tracing::debug!(path = %rel_str, "skipping non-text file");
            filtered += 1;
            continue;
        }

        files.push(LocalFile {
            path: path.to_path_buf(),
            relative_path: rel_str,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok((files, filtered))
}

/// Replace the store's corpus with the text files under `root`.
///
/// Each file is chunked like a web page and tagged
/// `<local.source_prefix>/<file name>`. The fallback facts are appended
/// unconditionally at the end.
pub fn train_local_files(
    store: &DocumentStore,
    root: &Path,
    config: &Config,
) -> Result<LocalTrainReport> {
    info!(root = %root.display(), "training on local files");
    store.clear();

    let (files, filtered) = scan_directory(root, &config.local)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    info!(count = files.len(), "found files");

    let mut report = LocalTrainReport {
        skipped: filtered,
        ..Default::default()
    };

    for file in &files {
        let content = match std::fs::read_to_string(&file.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %file.relative_path, error = %e, "unreadable file");
                report.skipped += 1;
                continue;
            }
        };

        if content.is_empty() {
            warn!(path = %file.relative_path, "empty file");
            report.skipped += 1;
            continue;
        }

        let source = local_source(&config.local.source_prefix, &file.path);
        let chunks = non_empty_chunks(&content, config.training.chunk_size);
        let added = chunks.len();
        for chunk in chunks {
            store.add_document(chunk, &source);
        }

        report.files += 1;
        report.chunks += added;
        info!(path = %file.relative_path, chunks = added, "trained on file");
    }

    for fact in &config.fallback.facts {
        store.add_document(fact.as_str(), &config.fallback.site);
    }
    report.chunks += config.fallback.facts.len();

    info!(
        files = report.files,
        skipped = report.skipped,
        chunks = report.chunks,
        websites = ?store.get_websites(),
        "local training complete"
    );

    Ok(report)
}

fn local_source(prefix: &str, path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{}/{}", prefix.trim_end_matches('/'), name)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}
