//! Configuration types and options for the application.
//!
//! This module contains all configuration structures used throughout the application,
//! including the toolchain lookup, execution options and the persistent config file.

pub mod execution;
pub mod file;
pub mod toolchain;

pub use execution::ExecutionOptions;
pub use file::FileConfig;
pub use toolchain::{Platform, Toolchain};
