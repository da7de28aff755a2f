//! Filesystem layout of a build run.
//!
//! A run works with three directories: the scan root holding the third-party
//! sources, a sibling install directory shared by every project, and a scratch
//! directory inside the scan root for out-of-source builds.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::debug;

/// Default name of the shared install directory, next to the scan root.
pub const DEFAULT_INSTALL_DIR_NAME: &str = "dependency";

/// Default name of the scratch directory, inside the scan root.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "build";

/// Names of the directories derived from the scan root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirNames {
    pub install: String,
    pub scratch: String,
}

impl Default for DirNames {
    fn default() -> Self {
        Self {
            install: DEFAULT_INSTALL_DIR_NAME.to_string(),
            scratch: DEFAULT_SCRATCH_DIR_NAME.to_string(),
        }
    }
}

/// Resolved paths for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildLayout {
    /// Directory whose immediate subdirectories are scanned for projects
    pub scan_root: PathBuf,

    /// Install prefix handed to every project; never created here
    pub install_path: PathBuf,

    /// Out-of-source build tree, one subdirectory per project
    pub build_scratch: PathBuf,
}

impl BuildLayout {
    /// Compute the install and scratch paths for a scan root.
    ///
    /// A scan root without a parent (a filesystem root) keeps the install
    /// directory inside itself.
    #[must_use]
    pub fn resolve(scan_root: &Path, names: &DirNames) -> Self {
        let parent = scan_root.parent().unwrap_or(scan_root);

        Self {
            scan_root: scan_root.to_path_buf(),
            install_path: parent.join(&names.install),
            build_scratch: scan_root.join(&names.scratch),
        }
    }

    /// Get the scratch tree ready for a run.
    ///
    /// With `rebuild`, an existing scratch directory is removed with all its
    /// contents first. The directory is then created if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch directory cannot be removed or created.
    pub fn prepare(&self, rebuild: bool) -> Result<()> {
        if rebuild && self.build_scratch.exists() {
            debug!(path = %self.build_scratch.display(), "removing scratch directory");

            fs::remove_dir_all(&self.build_scratch).with_context(|| {
                format!(
                    "Failed to remove scratch directory {}",
                    self.build_scratch.display()
                )
            })?;
        }

        ensure_dir(&self.build_scratch)
    }

    /// Scratch directory for the project named `name`.
    #[must_use]
    pub fn project_scratch(&self, name: &str) -> PathBuf {
        self.build_scratch.join(name)
    }
}

/// Create `path` if it does not exist yet.
///
/// Only the last component is created, the parent must already exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to create {}", path.display())),
    }
}

/// Directory containing the running executable.
///
/// # Errors
///
/// Returns an error if the executable path cannot be determined.
pub fn default_scan_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let exe = exe.canonicalize().unwrap_or(exe);

    exe.parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("{} has no parent directory", exe.display()))
}
