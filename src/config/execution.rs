//! Execution configuration for a build run.
//!
//! This module defines the options that control how a run behaves: whether
//! commands are echoed, whether the scratch tree is wiped first, and how
//! failures are reported.

use crate::command::OutputMode;

/// Configuration for build execution behavior.
#[derive(Clone, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExecutionOptions {
    /// Print each command before running it and let its output reach the terminal
    pub verbose: bool,

    /// Delete the scratch build directory before starting
    pub rebuild: bool,

    /// Exit with a non-zero status when any step failed
    pub strict: bool,

    /// Emit the build report as JSON instead of human-readable output
    pub json: bool,
}

impl ExecutionOptions {
    /// How external commands should treat their output.
    ///
    /// JSON mode always logs to file so stdout carries only the report.
    #[must_use]
    pub const fn output_mode(&self) -> OutputMode {
        if self.verbose && !self.json {
            OutputMode::Verbose
        } else {
            OutputMode::Quiet
        }
    }
}
