//! Command-line interface definition.
//!
//! Every option can also come from the configuration file; the methods on
//! [`Cli`] merge both with the CLI taking precedence.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use depbuild::{
    config::{ExecutionOptions, FileConfig, Toolchain, file::expand_tilde},
    layout::{DirNames, default_scan_root},
};

#[derive(Parser)]
struct BuildArgs {
    /// Print each command before running it and show its output instead of logging it
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Delete the scratch build directory first, forcing every project to rebuild
    #[arg(short = 'r', long)]
    rebuild: bool,
}

#[derive(Parser)]
struct ReportArgs {
    /// Exit with a non-zero status if any configure, build or install step failed
    #[arg(long)]
    strict: bool,

    /// Print the build report as JSON
    #[arg(long, conflicts_with = "verbose")]
    json: bool,
}

#[derive(Parser)]
#[command(name = "depbuild", version)]
#[command(
    about = "Configure, build and install every CMake project found next to this executable"
)]
pub(crate) struct Cli {
    /// Directory to scan for projects [default: the directory containing depbuild]
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Build options
    #[command(flatten)]
    build: BuildArgs,

    /// Reporting options
    #[command(flatten)]
    report: ReportArgs,
}

impl Cli {
    /// Whether `--json` was passed; decided before the config file is read.
    pub(crate) const fn json(&self) -> bool {
        self.report.json
    }

    /// Resolve the scan root: `--root`, then `root` from the config file,
    /// then the directory holding the executable. The result is absolute.
    pub(crate) fn scan_root(&self, config: &FileConfig) -> Result<PathBuf> {
        let root = match (&self.root, &config.root) {
            (Some(root), _) => root.clone(),
            (None, Some(root)) => expand_tilde(root),
            (None, None) => default_scan_root()?,
        };

        std::path::absolute(&root)
            .with_context(|| format!("Failed to resolve scan root {}", root.display()))
    }

    pub(crate) fn dir_names(config: &FileConfig) -> DirNames {
        let defaults = DirNames::default();

        DirNames {
            install: config
                .install_dir_name
                .clone()
                .unwrap_or(defaults.install),
            scratch: config
                .scratch_dir_name
                .clone()
                .unwrap_or(defaults.scratch),
        }
    }

    pub(crate) fn execution_options(&self, config: &FileConfig) -> ExecutionOptions {
        ExecutionOptions {
            verbose: self.build.verbose || config.build.verbose.unwrap_or(false),
            rebuild: self.build.rebuild || config.build.rebuild.unwrap_or(false),
            strict: self.report.strict || config.build.strict.unwrap_or(false),
            json: self.report.json,
        }
    }

    pub(crate) fn toolchain(config: &FileConfig) -> Toolchain {
        Toolchain::default().with_overrides(&config.toolchain)
    }
}
