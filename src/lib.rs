//! # depbuild
//!
//! Builds the third-party projects that live next to the `depbuild` executable.
//!
//! Every immediate subdirectory of the scan root that holds a `CMakeLists.txt`
//! is configured, built and installed out of source, one project at a time,
//! into a shared `dependency/` directory beside the scan root.

pub mod builder;
pub mod command;
pub mod config;
pub mod layout;
pub mod output;
pub mod project;
pub mod scanner;
