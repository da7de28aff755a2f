//! # depbuild
//!
//! Configures, builds and installs every third-party `CMake` project sitting
//! next to the executable.
//!
//! For each immediate subdirectory of the scan root that contains a
//! `CMakeLists.txt`, depbuild runs `cmake` in `build/<project>` with
//! `CMAKE_INSTALL_PREFIX` pointing at the shared `dependency/` directory beside
//! the scan root, then the native build tool (`make`, or `nmake` on Windows),
//! then its `install` target.
//!
//! ## Usage
//!
//! ```bash
//! # Build everything, command output goes to build/<project>/log.txt
//! depbuild
//!
//! # Show commands and their output
//! depbuild --verbose
//!
//! # Start from a clean scratch tree
//! depbuild --rebuild
//! ```

mod cli;

use std::{io::IsTerminal, process::exit};

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use depbuild::{
    builder::Builder,
    command::ProcessRunner,
    config::{FileConfig, Platform},
    layout::BuildLayout,
    output::JsonOutput,
};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Entry point for the depbuild application.
///
/// Errors from [`inner_main`] are printed to stderr and turn into exit code 1.
/// With `--strict`, a run where any step failed also exits with 1.
fn main() {
    match inner_main() {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(err) => {
            eprintln!("Error: {err:#}");

            exit(1);
        }
    }
}

/// Diagnostics go to stderr at `warn` unless `RUST_LOG` asks for more.
fn setup_logging() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

/// Main application logic that can return errors.
///
/// Returns `Ok(false)` when the run completed but `--strict` asks for a
/// failing exit status.
fn inner_main() -> Result<bool> {
    let args = Cli::parse();
    let json_mode = args.json();

    let file_config = match FileConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e:#}", "Warning: Failed to load config file:".yellow());
            FileConfig::default()
        }
    };

    let options = args.execution_options(&file_config);
    setup_logging();

    let scan_root = args.scan_root(&file_config)?;
    let layout = BuildLayout::resolve(&scan_root, &Cli::dir_names(&file_config));
    let toolchain = Cli::toolchain(&file_config);
    debug!(?layout, ?toolchain, "resolved build configuration");

    let runner = ProcessRunner::new(toolchain.log_file.as_str());
    let strict = options.strict;
    let report = Builder::new(layout, toolchain, options, runner).run()?;

    if json_mode {
        let output = JsonOutput::from_report(&report, Platform::host());
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if report.projects.is_empty() {
        println!("{}", "✨ No buildable projects found!".green());
    } else {
        report.print_summary();
    }

    Ok(!(strict && report.has_failures()))
}
