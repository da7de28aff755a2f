//! Native toolchain selection.
//!
//! The configure program, the `CMake` generator and the native build tool all
//! depend on the host platform. They are looked up once at startup from a
//! [`Platform`] and can then be overridden field by field from the
//! configuration file.

use serde::Serialize;

use super::file::FileToolchainConfig;

/// File whose presence marks a directory as a buildable sub-project.
pub const DEFAULT_DESCRIPTOR: &str = "CMakeLists.txt";

/// File that receives a command's output when not running verbosely.
pub const DEFAULT_LOG_FILE: &str = "log.txt";

/// `CMake` cache variable that controls where `install` puts its files.
pub const DEFAULT_INSTALL_PREFIX_VAR: &str = "CMAKE_INSTALL_PREFIX";

/// Host platform family, as far as build tool selection is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Unix-like hosts using `make`.
    Posix,

    /// Windows hosts using `nmake` and the `NMake Makefiles` generator.
    Windows,
}

impl Platform {
    /// The platform this binary was compiled for.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

/// Programs and conventions used to configure, build and install a project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolchain {
    /// The build-configuration program (`cmake`)
    pub cmake: String,

    /// Generator passed with `-G`, if any
    pub generator: Option<String>,

    /// The native build tool (`make` or `nmake`)
    pub make: String,

    /// Variable receiving the install path on the configure command line
    pub install_prefix_var: String,

    /// Build-descriptor file name
    pub descriptor: String,

    /// Log file name used in quiet mode
    pub log_file: String,
}

impl Toolchain {
    /// Default toolchain for a platform.
    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        let (generator, make) = match platform {
            Platform::Posix => (None, "make"),
            Platform::Windows => (Some("NMake Makefiles".to_string()), "nmake"),
        };

        Self {
            cmake: "cmake".to_string(),
            generator,
            make: make.to_string(),
            install_prefix_var: DEFAULT_INSTALL_PREFIX_VAR.to_string(),
            descriptor: DEFAULT_DESCRIPTOR.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }

    /// Apply the overrides found in the `[toolchain]` table of the config file.
    ///
    /// An empty `generator` string removes the generator argument entirely,
    /// which lets Windows users fall back to `CMake`'s own default.
    #[must_use]
    pub fn with_overrides(mut self, file: &FileToolchainConfig) -> Self {
        if let Some(cmake) = &file.cmake {
            self.cmake.clone_from(cmake);
        }

        if let Some(generator) = &file.generator {
            self.generator = if generator.is_empty() {
                None
            } else {
                Some(generator.clone())
            };
        }

        if let Some(make) = &file.make {
            self.make.clone_from(make);
        }

        if let Some(var) = &file.install_prefix_var {
            self.install_prefix_var.clone_from(var);
        }

        if let Some(descriptor) = &file.descriptor {
            self.descriptor.clone_from(descriptor);
        }

        if let Some(log_file) = &file.log_file {
            self.log_file.clone_from(log_file);
        }

        self
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::for_platform(Platform::host())
    }
}
