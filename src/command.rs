//! External command construction and execution.
//!
//! Every project goes through three commands: configure, build and install.
//! Each command carries its own working directory, so running one never
//! touches the working directory of this process.

use std::{
    ffi::OsString,
    fmt::{self, Display, Formatter},
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    process::Command,
    time::Instant,
};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::config::Toolchain;

/// The three steps run for every project, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Configure,
    Build,
    Install,
}

impl Display for StepKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
        };
        f.write_str(name)
    }
}

/// Where a command's output goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    /// stdout and stderr are written to the log file in the working directory
    Quiet,

    /// The command line is printed first and output reaches the terminal
    Verbose,
}

/// A single command-line argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    /// Passed and displayed as is
    Plain(String),

    /// Passed as is, displayed in double quotes
    Quoted(String),

    /// A path, displayed in double quotes
    Path(PathBuf),

    /// `-D<name>=<path>`, displayed as `-D<name>="<path>"`
    Define { name: String, value: PathBuf },
}

impl Arg {
    fn to_os_string(&self) -> OsString {
        match self {
            Self::Plain(s) | Self::Quoted(s) => OsString::from(s),
            Self::Path(p) => p.clone().into_os_string(),
            Self::Define { name, value } => {
                let mut arg = OsString::from(format!("-D{name}="));
                arg.push(value.as_os_str());
                arg
            }
        }
    }
}

impl Display for Arg {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(s) => f.write_str(s),
            Self::Quoted(s) => write!(f, "\"{s}\""),
            Self::Path(p) => write!(f, "\"{}\"", p.display()),
            Self::Define { name, value } => write!(f, "-D{name}=\"{}\"", value.display()),
        }
    }
}

/// A fully described external command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildCommand {
    pub step: StepKind,
    pub program: String,
    pub args: Vec<Arg>,
    pub working_dir: PathBuf,
}

impl BuildCommand {
    /// `cmake [-G "<generator>"] -D<prefix var>="<install>" "<source>"`
    #[must_use]
    pub fn configure(
        toolchain: &Toolchain,
        install_path: &Path,
        source_dir: &Path,
        working_dir: &Path,
    ) -> Self {
        let mut args = Vec::with_capacity(4);

        if let Some(generator) = &toolchain.generator {
            args.push(Arg::Plain("-G".to_string()));
            args.push(Arg::Quoted(generator.clone()));
        }

        args.push(Arg::Define {
            name: toolchain.install_prefix_var.clone(),
            value: install_path.to_path_buf(),
        });
        args.push(Arg::Path(source_dir.to_path_buf()));

        Self {
            step: StepKind::Configure,
            program: toolchain.cmake.clone(),
            args,
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// The native build tool with no arguments.
    #[must_use]
    pub fn build(toolchain: &Toolchain, working_dir: &Path) -> Self {
        Self {
            step: StepKind::Build,
            program: toolchain.make.clone(),
            args: Vec::new(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// The native build tool with `install`.
    #[must_use]
    pub fn install(toolchain: &Toolchain, working_dir: &Path) -> Self {
        Self {
            step: StepKind::Install,
            program: toolchain.make.clone(),
            args: vec![Arg::Plain("install".to_string())],
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Arguments exactly as handed to the process, without display quoting.
    #[must_use]
    pub fn os_args(&self) -> Vec<OsString> {
        self.args.iter().map(Arg::to_os_string).collect()
    }

    fn to_process(&self) -> Command {
        let mut process = Command::new(&self.program);
        process.args(self.os_args()).current_dir(&self.working_dir);
        process
    }
}

impl Display for BuildCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What happened when a command ran.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: StepKind,

    /// The rendered command line
    pub command: String,

    pub working_dir: PathBuf,

    /// Exit code, absent when the process could not start or was killed by a signal
    pub exit_code: Option<i32>,

    pub success: bool,

    /// Why the program could not be started
    pub error: Option<String>,

    pub elapsed_ms: u64,
}

impl StepOutcome {
    /// Outcome for a command that ran to completion with `exit_code`.
    #[must_use]
    pub fn exited(command: &BuildCommand, exit_code: Option<i32>, success: bool) -> Self {
        Self {
            step: command.step,
            command: command.to_string(),
            working_dir: command.working_dir.clone(),
            exit_code,
            success,
            error: None,
            elapsed_ms: 0,
        }
    }

    /// Outcome for a command whose program could not be started.
    #[must_use]
    pub fn not_started(command: &BuildCommand, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::exited(command, None, false)
        }
    }

    #[must_use]
    fn with_elapsed(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }
}

/// Runs build commands.
///
/// A command that fails or cannot be started is reported through the
/// returned [`StepOutcome`]; `Err` is reserved for problems setting up the
/// run itself, such as an unwritable log file.
pub trait CommandRunner {
    /// Run `command` to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the command's output cannot be redirected.
    fn run(&self, command: &BuildCommand, mode: OutputMode) -> Result<StepOutcome>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, command: &BuildCommand, mode: OutputMode) -> Result<StepOutcome> {
        (**self).run(command, mode)
    }
}

/// Runs commands as real child processes, blocking until each one exits.
pub struct ProcessRunner {
    log_file: String,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(log_file: impl Into<String>) -> Self {
        Self {
            log_file: log_file.into(),
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &BuildCommand, mode: OutputMode) -> Result<StepOutcome> {
        let mut process = command.to_process();

        // Kept open so a spawn failure can still be written to the log.
        let mut log = None;

        match mode {
            OutputMode::Quiet => {
                let log_path = command.working_dir.join(&self.log_file);
                let file = File::create(&log_path)
                    .with_context(|| format!("Failed to create {}", log_path.display()))?;
                let stdout = file
                    .try_clone()
                    .with_context(|| format!("Failed to share {}", log_path.display()))?;
                let stderr = file
                    .try_clone()
                    .with_context(|| format!("Failed to share {}", log_path.display()))?;

                process.stdout(stdout).stderr(stderr);
                log = Some(file);
            }
            OutputMode::Verbose => println!("{command}"),
        }

        debug!(step = %command.step, cwd = %command.working_dir.display(), "running {command}");

        let started = Instant::now();
        let outcome = match process.status() {
            Ok(status) => StepOutcome::exited(command, status.code(), status.success()),
            Err(e) => {
                let message = format!("failed to run {}: {e}", command.program);
                if let Some(file) = log.as_mut() {
                    writeln!(file, "{message}").with_context(|| {
                        format!(
                            "Failed to write to {}",
                            command.working_dir.join(&self.log_file).display()
                        )
                    })?;
                } else {
                    eprintln!("{message}");
                }
                StepOutcome::not_started(command, message)
            }
        };
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(outcome.with_elapsed(elapsed_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;
    use tempfile::TempDir;

    fn posix() -> Toolchain {
        Toolchain::for_platform(Platform::Posix)
    }

    #[test]
    fn test_configure_posix_display() {
        let cmd = BuildCommand::configure(
            &posix(),
            Path::new("/w/dependency"),
            Path::new("/w/thirdparty/zlib"),
            Path::new("/w/thirdparty/build/zlib"),
        );

        assert_eq!(cmd.step, StepKind::Configure);
        assert_eq!(
            cmd.to_string(),
            r#"cmake -DCMAKE_INSTALL_PREFIX="/w/dependency" "/w/thirdparty/zlib""#
        );
        assert_eq!(cmd.working_dir, PathBuf::from("/w/thirdparty/build/zlib"));
    }

    #[test]
    fn test_configure_windows_has_generator() {
        let toolchain = Toolchain::for_platform(Platform::Windows);
        let cmd = BuildCommand::configure(
            &toolchain,
            Path::new("/w/dependency"),
            Path::new("/w/thirdparty/zlib"),
            Path::new("/w/thirdparty/build/zlib"),
        );

        assert_eq!(
            cmd.to_string(),
            r#"cmake -G "NMake Makefiles" -DCMAKE_INSTALL_PREFIX="/w/dependency" "/w/thirdparty/zlib""#
        );
    }

    #[test]
    fn test_configure_os_args_are_unquoted() {
        let toolchain = Toolchain::for_platform(Platform::Windows);
        let cmd = BuildCommand::configure(
            &toolchain,
            Path::new("/w/my deps"),
            Path::new("/w/src dir"),
            Path::new("/w/out"),
        );

        assert_eq!(
            cmd.os_args(),
            vec![
                OsString::from("-G"),
                OsString::from("NMake Makefiles"),
                OsString::from("-DCMAKE_INSTALL_PREFIX=/w/my deps"),
                OsString::from("/w/src dir"),
            ]
        );
    }

    #[test]
    fn test_build_and_install_commands() {
        let toolchain = Toolchain::for_platform(Platform::Windows);
        let dir = Path::new("/w/out");

        let build = BuildCommand::build(&toolchain, dir);
        let install = BuildCommand::install(&toolchain, dir);

        assert_eq!(build.to_string(), "nmake");
        assert!(build.os_args().is_empty());
        assert_eq!(install.to_string(), "nmake install");
        assert_eq!(install.step, StepKind::Install);
        assert_eq!(BuildCommand::install(&posix(), dir).to_string(), "make install");
    }

    #[test]
    fn test_step_kind_display() {
        assert_eq!(StepKind::Configure.to_string(), "configure");
        assert_eq!(StepKind::Build.to_string(), "build");
        assert_eq!(StepKind::Install.to_string(), "install");
    }

    #[test]
    fn test_not_started_outcome() {
        let cmd = BuildCommand::build(&posix(), Path::new("/w"));
        let outcome = StepOutcome::not_started(&cmd, "no such file");

        assert!(!outcome.success);
        assert!(outcome.exit_code.is_none());
        assert_eq!(outcome.error.as_deref(), Some("no such file"));
        assert_eq!(outcome.command, "make");
    }

    fn command_in(dir: &Path, program: &str, args: &[&str]) -> BuildCommand {
        BuildCommand {
            step: StepKind::Build,
            program: program.to_string(),
            args: args.iter().map(|a| Arg::Plain((*a).to_string())).collect(),
            working_dir: dir.to_path_buf(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_quiet_run_writes_log() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new("log.txt");

        let outcome = runner
            .run(&command_in(temp.path(), "echo", &["hello"]), OutputMode::Quiet)
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.exit_code, Some(0));
        let log = std::fs::read_to_string(temp.path().join("log.txt")).unwrap();
        assert_eq!(log, "hello\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_quiet_run_captures_stderr() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new("log.txt");

        runner
            .run(
                &command_in(temp.path(), "sh", &["-c", "echo out; echo err 1>&2"]),
                OutputMode::Quiet,
            )
            .unwrap();

        let log = std::fs::read_to_string(temp.path().join("log.txt")).unwrap();
        assert!(log.contains("out"));
        assert!(log.contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn test_quiet_run_truncates_previous_log() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new("log.txt");

        runner
            .run(&command_in(temp.path(), "echo", &["first"]), OutputMode::Quiet)
            .unwrap();
        runner
            .run(&command_in(temp.path(), "echo", &["second"]), OutputMode::Quiet)
            .unwrap();

        let log = std::fs::read_to_string(temp.path().join("log.txt")).unwrap();
        assert_eq!(log, "second\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_working_dir() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new("log.txt");

        runner
            .run(&command_in(temp.path(), "pwd", &[]), OutputMode::Quiet)
            .unwrap();

        let log = std::fs::read_to_string(temp.path().join("log.txt")).unwrap();
        let reported = PathBuf::from(log.trim()).canonicalize().unwrap();
        assert_eq!(reported, temp.path().canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new("log.txt");

        let outcome = runner
            .run(&command_in(temp.path(), "false", &[]), OutputMode::Quiet)
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(1));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_missing_program_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new("log.txt");

        let outcome = runner
            .run(
                &command_in(temp.path(), "depbuild-no-such-program", &[]),
                OutputMode::Quiet,
            )
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        let log = std::fs::read_to_string(temp.path().join("log.txt")).unwrap();
        assert!(log.contains("depbuild-no-such-program"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unwritable_log_after_spawn_failure_is_an_error() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new("/dev/full");

        let result = runner.run(
            &command_in(temp.path(), "depbuild-no-such-program", &[]),
            OutputMode::Quiet,
        );

        let err = result.unwrap_err();
        assert!(err.to_string().contains("/dev/full"));
    }

    #[cfg(unix)]
    #[test]
    fn test_verbose_run_leaves_no_log() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new("log.txt");

        let outcome = runner
            .run(&command_in(temp.path(), "true", &[]), OutputMode::Verbose)
            .unwrap();

        assert!(outcome.success);
        assert!(!temp.path().join("log.txt").exists());
    }

    #[test]
    fn test_missing_working_dir_log_is_an_error() {
        let temp = TempDir::new().unwrap();
        let runner = ProcessRunner::new("log.txt");

        let result = runner.run(
            &command_in(&temp.path().join("absent"), "true", &[]),
            OutputMode::Quiet,
        );

        assert!(result.is_err());
    }
}
