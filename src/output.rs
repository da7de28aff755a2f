//! JSON output for `--json` mode.
//!
//! The report is printed as a single document on stdout once the run is
//! over, so scripts can inspect every step without parsing log files.

use std::path::Path;

use serde::Serialize;

use crate::{
    builder::{BuildReport, ProjectOutcome},
    config::Platform,
};

/// Top-level JSON document.
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub platform: Platform,
    pub summary: JsonSummary,
    pub scan_root: &'a Path,
    pub install_path: &'a Path,
    pub build_scratch: &'a Path,
    pub projects: &'a [ProjectOutcome],
}

/// Aggregate counts for the run.
#[derive(Serialize)]
pub struct JsonSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl<'a> JsonOutput<'a> {
    #[must_use]
    pub fn from_report(report: &'a BuildReport, platform: Platform) -> Self {
        Self {
            platform,
            summary: JsonSummary {
                total: report.projects.len(),
                succeeded: report.succeeded(),
                failed: report.failed(),
            },
            scan_root: &report.scan_root,
            install_path: &report.install_path,
            build_scratch: &report.build_scratch,
            projects: &report.projects,
        }
    }
}
