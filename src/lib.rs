//! Dependency discovery across Go, Java, Node, Python, Ruby and Rust trees.
//!
//! A single depth-first walk over a project tree finds dependency marker
//! files and hands each one to the extractor for its ecosystem. Some
//! markers count at any depth, others only as the project's manifest of
//! record at the walk root; see [`walker::discover`] for the contract.

pub mod basedir;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod ignore;
pub mod models;
pub mod toolchain;
pub mod walker;

pub use error::DiscoverError;
pub use models::{Dependency, Discovery, Ecosystem, EcosystemSet};
pub use walker::{discover, discover_with};
