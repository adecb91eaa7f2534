use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::config::SourceSettings;
use crate::constants::IMAGE_EXTENSIONS;

// --- Helper: Recursively Collect Image Paths ---
pub fn scan_sources<'a>(roots: impl IntoIterator<Item = &'a Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for root in roots {
        if !root.is_dir() {
            debug!(path = %root.display(), "skipping missing source");
            continue;
        }
        scan_directory(root, &mut paths);
    }
    paths
}

fn scan_directory(dir: &Path, paths: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "failed to read directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        // Symlinked directories are listed but not descended into
        let is_link = entry.file_type().map(|t| t.is_symlink()).unwrap_or(false);
        if path.is_dir() {
            if !is_link {
                scan_directory(&path, paths);
            }
        } else if is_image_path(&path) {
            paths.push(path);
        }
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Shuffled playlist with a wrapping play position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageCatalog {
    paths: Vec<PathBuf>,
    index: usize,
}

impl ImageCatalog {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, index: 0 }
    }

    pub fn from_sources(sources: &SourceSettings) -> Self {
        let mut paths = scan_sources(sources.roots());
        paths.shuffle(&mut rand::rng());
        info!(count = paths.len(), "loaded image catalog");
        Self::new(paths)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Path> {
        self.paths.get(self.index).map(PathBuf::as_path)
    }

    /// Moves to the next entry, wrapping to the start after the last one.
    pub fn advance(&mut self) -> Option<&Path> {
        if self.paths.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.paths.len();
        self.current()
    }
}
