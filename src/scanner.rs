//! Project discovery.
//!
//! Only the immediate subdirectories of the scan root are considered. A
//! subdirectory is a project when the build descriptor sits directly inside
//! it; nested descriptors and other build files are ignored.

use std::path::Path;

use anyhow::{Result, bail};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::project::Project;

/// Finds buildable projects under a scan root.
pub struct Scanner {
    /// File name that marks a directory as a project
    descriptor: String,
}

impl Scanner {
    /// Create a scanner looking for `descriptor` (usually `CMakeLists.txt`).
    #[must_use]
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
        }
    }

    /// List the projects directly under `root`, sorted by directory name.
    ///
    /// Symbolic links to directories are treated like directories. Entries
    /// that cannot be inspected are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory or cannot be read.
    pub fn scan(&self, root: &Path) -> Result<Vec<Project>> {
        if !root.is_dir() {
            bail!("Scan root {} is not a directory", root.display());
        }

        let mut projects = Vec::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if let Some(project) = self.detect_project(&entry) {
                        projects.push(project);
                    }
                }
                Err(e) if e.depth() == 0 => {
                    bail!("Failed to read scan root {}: {e}", root.display());
                }
                Err(e) => warn!("Skipping unreadable entry: {e}"),
            }
        }

        debug!(count = projects.len(), root = %root.display(), "scan complete");

        Ok(projects)
    }

    fn detect_project(&self, entry: &DirEntry) -> Option<Project> {
        if !entry.file_type().is_dir() {
            return None;
        }

        let path = entry.path();
        if !path.join(&self.descriptor).exists() {
            debug!(path = %path.display(), "no build descriptor, skipping");
            return None;
        }

        let name = entry.file_name().to_string_lossy().into_owned();

        Some(Project::new(name, path.to_path_buf()))
    }
}
