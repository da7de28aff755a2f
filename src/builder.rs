//! Build orchestration.
//!
//! This module drives a whole run: it prepares the scratch tree, discovers
//! projects, and runs configure, build and install for each of them in turn.
//! A failing step never stops the run; every outcome is collected into a
//! [`BuildReport`] that can be summarized or serialized at the end.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    command::{BuildCommand, CommandRunner, StepOutcome},
    config::{ExecutionOptions, Toolchain},
    layout::{BuildLayout, ensure_dir},
    project::Project,
    scanner::Scanner,
};

/// Result of building a single project.
#[derive(Clone, Debug, Serialize)]
pub struct ProjectOutcome {
    #[serde(flatten)]
    pub project: Project,

    /// Out-of-source build directory used as the working directory of every step
    pub scratch_dir: PathBuf,

    /// Configure, build and install, in the order they ran
    pub steps: Vec<StepOutcome>,
}

impl ProjectOutcome {
    /// Whether every step exited successfully.
    #[must_use]
    pub fn success(&self) -> bool {
        self.steps.iter().all(|s| s.success)
    }

    /// Steps that did not succeed.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| !s.success)
    }
}

/// Everything that happened during one run.
#[derive(Clone, Debug, Serialize)]
pub struct BuildReport {
    pub scan_root: PathBuf,
    pub install_path: PathBuf,
    pub build_scratch: PathBuf,
    pub projects: Vec<ProjectOutcome>,
}

impl BuildReport {
    fn new(layout: &BuildLayout) -> Self {
        Self {
            scan_root: layout.scan_root.clone(),
            install_path: layout.install_path.clone(),
            build_scratch: layout.build_scratch.clone(),
            projects: Vec::new(),
        }
    }

    /// Number of projects whose three steps all succeeded.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.projects.iter().filter(|p| p.success()).count()
    }

    /// Number of projects with at least one failed step.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.projects.len() - self.succeeded()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Print a human-readable summary of the run.
    ///
    /// Failed steps are listed with their exit status and the directory
    /// holding their log.
    ///
    /// # Output Format
    ///
    /// ```text
    /// 📊 Build Summary:
    ///   ✅ Built: 2 projects
    ///   ❌ Failed: 1 projects
    ///     zlib: configure exited with 1 (/tp/build/zlib)
    ///   📦 Installed into: /dependency
    /// ```
    pub fn print_summary(&self) {
        println!("\n{}", "📊 Build Summary:".bold());
        println!(
            "  ✅ Built: {} projects",
            self.succeeded().to_string().green()
        );

        if self.has_failures() {
            println!("  ❌ Failed: {} projects", self.failed().to_string().red());

            for project in self.projects.iter().filter(|p| !p.success()) {
                for step in project.failed_steps() {
                    let reason = match (&step.error, step.exit_code) {
                        (Some(error), _) => error.clone(),
                        (None, Some(code)) => format!("exited with {code}"),
                        (None, None) => "terminated by a signal".to_string(),
                    };
                    eprintln!(
                        "    {}",
                        format!(
                            "{}: {} {reason} ({})",
                            project.project.name,
                            step.step,
                            step.working_dir.display()
                        )
                        .red()
                    );
                }
            }
        }

        println!(
            "  📦 Installed into: {}",
            self.install_path.display().to_string().bright_white()
        );
    }
}

/// Runs configure, build and install for every project under a scan root.
pub struct Builder<R> {
    layout: BuildLayout,
    toolchain: Toolchain,
    options: ExecutionOptions,
    runner: R,
}

impl<R: CommandRunner> Builder<R> {
    #[must_use]
    pub const fn new(
        layout: BuildLayout,
        toolchain: Toolchain,
        options: ExecutionOptions,
        runner: R,
    ) -> Self {
        Self {
            layout,
            toolchain,
            options,
            runner,
        }
    }

    /// Run the whole build.
    ///
    /// Steps:
    /// 1. Prepare the scratch directory (wiping it first with `rebuild`)
    /// 2. Discover projects under the scan root
    /// 3. For each project, create its scratch directory and run configure,
    ///    build and install there
    ///
    /// The three steps of a project always run, even if an earlier one failed.
    ///
    /// # Errors
    ///
    /// Returns an error on filesystem failures: preparing the scratch tree,
    /// reading the scan root, creating a project's scratch directory or its
    /// log file. A command that fails or cannot be started is not an error;
    /// it is recorded in the report.
    pub fn run(&self) -> Result<BuildReport> {
        self.layout.prepare(self.options.rebuild)?;

        let projects =
            Scanner::new(self.toolchain.descriptor.as_str()).scan(&self.layout.scan_root)?;
        info!(count = projects.len(), "discovered projects");

        let progress = self.progress_bar(projects.len())?;
        let mut report = BuildReport::new(&self.layout);

        for project in projects {
            self.announce(&progress, &project);
            progress.set_message(project.name.clone());

            let outcome = self.build_project(project)?;
            Self::warn_failures(&progress, &outcome);

            report.projects.push(outcome);
            progress.inc(1);
        }

        progress.finish_and_clear();

        Ok(report)
    }

    fn build_project(&self, project: Project) -> Result<ProjectOutcome> {
        let scratch_dir = self.layout.project_scratch(&project.name);
        ensure_dir(&scratch_dir)?;

        let commands = [
            BuildCommand::configure(
                &self.toolchain,
                &self.layout.install_path,
                &project.source_dir,
                &scratch_dir,
            ),
            BuildCommand::build(&self.toolchain, &scratch_dir),
            BuildCommand::install(&self.toolchain, &scratch_dir),
        ];

        let mode = self.options.output_mode();
        let steps = commands
            .iter()
            .map(|command| self.runner.run(command, mode))
            .collect::<Result<Vec<_>>>()?;

        Ok(ProjectOutcome {
            project,
            scratch_dir,
            steps,
        })
    }

    /// Log failed steps without tearing the progress bar.
    fn warn_failures(progress: &ProgressBar, outcome: &ProjectOutcome) {
        if outcome.success() {
            return;
        }

        progress.suspend(|| {
            for step in outcome.failed_steps() {
                warn!(
                    project = %outcome.project.name,
                    step = %step.step,
                    exit_code = ?step.exit_code,
                    "step failed"
                );
            }
        });
    }

    fn announce(&self, progress: &ProgressBar, project: &Project) {
        if self.options.json {
            return;
        }

        let line = format!("{} {project}", "compile:".cyan());
        if progress.is_hidden() {
            println!("{line}");
        } else {
            progress.println(line);
        }
    }

    fn progress_bar(&self, total: usize) -> Result<ProgressBar> {
        if self.options.json || self.options.verbose || total == 0 {
            return Ok(ProgressBar::hidden());
        }

        let progress = ProgressBar::new(total as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );

        Ok(progress)
    }
}
