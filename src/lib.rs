//! Webpack command line tool.
//!
//! Flags are normalized into a [`option::BuildOption`], the project config is
//! resolved into a [`config::ResolvedConfig`], and the assembler expands it
//! into one bundler configuration per target. The pipelines then build,
//! serve, print or archive.

pub mod archive;
pub mod assembler;
pub mod bundler;
pub mod checker;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod installer;
pub mod logger;
pub mod option;
pub mod pipelines;
pub mod templates;
pub mod tools;
pub mod tree;

pub use error::{CliError, Result};
