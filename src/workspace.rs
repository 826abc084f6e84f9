use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Resolve the workspace roots passed on the command line.
///
/// Roots are canonicalized where possible; duplicates and anything that is
/// not a directory are dropped.
pub fn list_workspace_roots(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut roots = Vec::new();

    for path in paths {
        let root = path.canonicalize().unwrap_or_else(|_| path.clone());
        if !root.is_dir() {
            warn!(path = %path.display(), "not a directory, skipping workspace root");
            continue;
        }
        if seen.insert(root.clone()) {
            roots.push(root);
        }
    }

    roots
}

/// Recursively list the regular files under `root`, in a stable order.
///
/// Directories whose name is in `ignore_dirs` are not descended into.
/// Unreadable entries are logged and skipped.
pub fn walk_directory(root: &Path, ignore_dirs: &[String]) -> Vec<PathBuf> {
    let is_ignored = |entry: &DirEntry| {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| ignore_dirs.iter().any(|d| d == name))
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored(e))
    {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => debug!(root = %root.display(), error = %e, "skipping unreadable entry"),
        }
    }

    files
}

/// Lossless string form of a path; non-UTF-8 paths are logged and dropped.
fn path_to_string(path: PathBuf) -> Option<String> {
    match path.into_os_string().into_string() {
        Ok(path) => Some(path),
        Err(raw) => {
            warn!(path = %Path::new(&raw).display(), "skipping non-UTF-8 path");
            None
        }
    }
}

/// Walk every root concurrently and concatenate the listings in root order.
pub async fn collect_files(roots: &[PathBuf], ignore_dirs: &[String]) -> Result<Vec<String>> {
    let walks = roots.iter().map(|root| {
        let root = root.clone();
        let ignore_dirs = ignore_dirs.to_vec();
        tokio::task::spawn_blocking(move || walk_directory(&root, &ignore_dirs))
    });

    let mut files = Vec::new();
    for listing in join_all(walks).await {
        files.extend(listing?.into_iter().filter_map(path_to_string));
    }

    debug!(count = files.len(), "collected workspace files");
    Ok(files)
}
