//! Third-party project candidates.

use std::{
    fmt::{Display, Formatter, Result},
    path::PathBuf,
};

use serde::Serialize;

/// A subdirectory of the scan root that carries a build descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Project {
    /// Directory name, also used as the name of its scratch directory
    pub name: String,

    /// The project's source directory, handed to the configure step
    pub source_dir: PathBuf,
}

impl Project {
    #[must_use]
    pub const fn new(name: String, source_dir: PathBuf) -> Self {
        Self { name, source_dir }
    }
}

impl Display for Project {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.source_dir.display())
    }
}
