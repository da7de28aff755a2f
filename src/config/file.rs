//! Configuration file support for persistent settings.
//!
//! This module provides support for loading configuration from a TOML file
//! located at `~/.config/depbuild/config.toml` (or the platform-specific
//! equivalent). Configuration file values serve as defaults that can be
//! overridden by CLI arguments.
//!
//! # Layering
//!
//! The precedence order is: **CLI argument > config file > hardcoded default**.
//!
//! # Example config
//!
//! ```toml
//! root = "~/src/engine/thirdparty"
//! install_dir_name = "dependency"
//! scratch_dir_name = "build"
//!
//! [build]
//! verbose = false
//! rebuild = false
//! strict = true
//!
//! [toolchain]
//! cmake = "cmake"
//! generator = "NMake Makefiles"   # empty string disables -G
//! make = "nmake"
//! install_prefix_var = "CMAKE_INSTALL_PREFIX"
//! descriptor = "CMakeLists.txt"
//! log_file = "log.txt"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Top-level configuration file structure.
///
/// All fields are `Option<T>` so we can detect which values are present in the
/// config file and apply layered configuration (CLI > config file > defaults).
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default scan root
    pub root: Option<PathBuf>,

    /// Name of the install directory created next to the scan root
    pub install_dir_name: Option<String>,

    /// Name of the scratch directory created inside the scan root
    pub scratch_dir_name: Option<String>,

    /// Build behavior
    #[serde(default)]
    pub build: FileBuildConfig,

    /// Toolchain overrides
    #[serde(default)]
    pub toolchain: FileToolchainConfig,
}

/// Build options from the configuration file.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileBuildConfig {
    /// Whether to print commands and show their output
    pub verbose: Option<bool>,

    /// Whether to wipe the scratch directory before building
    pub rebuild: Option<bool>,

    /// Whether a failed step makes the process exit with a non-zero status
    pub strict: Option<bool>,
}

/// Toolchain overrides from the configuration file.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct FileToolchainConfig {
    pub cmake: Option<String>,
    pub generator: Option<String>,
    pub make: Option<String>,
    pub install_prefix_var: Option<String>,
    pub descriptor: Option<String>,
    pub log_file: Option<String>,
}

/// Expand a leading `~` in a path to the user's home directory.
///
/// Paths that don't start with `~` are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

impl FileConfig {
    /// Returns the path where the configuration file is expected.
    ///
    /// The configuration file is located at `<config_dir>/depbuild/config.toml`,
    /// where `<config_dir>` is the platform-specific configuration directory
    /// (e.g., `~/.config` on Linux, `%APPDATA%` on Windows).
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("depbuild").join("config.toml"))
    }

    /// Load configuration from the default config file location.
    ///
    /// If the config file doesn't exist, returns a default (empty) configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML
    /// or unexpected fields.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_config() {
        let config = FileConfig::default();

        assert!(config.root.is_none());
        assert!(config.install_dir_name.is_none());
        assert!(config.scratch_dir_name.is_none());
        assert!(config.build.verbose.is_none());
        assert!(config.build.rebuild.is_none());
        assert!(config.build.strict.is_none());
        assert!(config.toolchain.cmake.is_none());
        assert!(config.toolchain.generator.is_none());
        assert!(config.toolchain.make.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
root = "~/thirdparty"
install_dir_name = "deps"
scratch_dir_name = "_build"

[build]
verbose = true
rebuild = false
strict = true

[toolchain]
cmake = "/opt/cmake/bin/cmake"
generator = "Ninja"
make = "ninja"
install_prefix_var = "CMAKE_INSTALL_PREFIX"
descriptor = "CMakeLists.txt"
log_file = "out.txt"
"#;

        let config: FileConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.root, Some(PathBuf::from("~/thirdparty")));
        assert_eq!(config.install_dir_name.as_deref(), Some("deps"));
        assert_eq!(config.scratch_dir_name.as_deref(), Some("_build"));
        assert_eq!(config.build.verbose, Some(true));
        assert_eq!(config.build.rebuild, Some(false));
        assert_eq!(config.build.strict, Some(true));
        assert_eq!(config.toolchain.cmake.as_deref(), Some("/opt/cmake/bin/cmake"));
        assert_eq!(config.toolchain.generator.as_deref(), Some("Ninja"));
        assert_eq!(config.toolchain.make.as_deref(), Some("ninja"));
        assert_eq!(config.toolchain.log_file.as_deref(), Some("out.txt"));
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[toolchain]
make = "gmake"
"#;

        let config: FileConfig = toml::from_str(toml_content).unwrap();

        assert!(config.root.is_none());
        assert_eq!(config.toolchain.make.as_deref(), Some("gmake"));
        assert!(config.toolchain.cmake.is_none());
        assert!(config.build.verbose.is_none());
    }

    #[test]
    fn test_parse_empty_config() {
        let config: FileConfig = toml::from_str("").unwrap();

        assert!(config.root.is_none());
        assert!(config.build.rebuild.is_none());
    }

    #[test]
    fn test_malformed_config_errors() {
        let toml_content = r#"
[build]
verbose = "yes please"
"#;
        assert!(toml::from_str::<FileConfig>(toml_content).is_err());
    }

    #[test]
    fn test_unknown_field_errors() {
        assert!(toml::from_str::<FileConfig>("jobs = 4").is_err());
    }

    #[test]
    fn test_load_from_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[build]\nrebuild = 3\n").unwrap();

        let err = FileConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(FileConfig::load_from(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_config_path_returns_expected_suffix() {
        if let Some(p) = FileConfig::config_path() {
            assert!(p.ends_with("depbuild/config.toml"));
        }
    }

    #[test]
    fn test_expand_tilde_with_home() {
        let expanded = expand_tilde(&PathBuf::from("~/thirdparty"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("thirdparty"));
        }
    }

    #[test]
    fn test_expand_tilde_absolute_path_unchanged() {
        let path = PathBuf::from("/absolute/path");
        assert_eq!(expand_tilde(&path), path);
    }

    #[test]
    fn test_expand_tilde_relative_path_unchanged() {
        let path = PathBuf::from("relative/path");
        assert_eq!(expand_tilde(&path), path);
    }
}
