//! Source discovery and structural complexity scoring via tree-sitter.
//!
//! [`walker`] finds analyzable Python files under a repository root while
//! skipping virtual environments, package caches, and build output.
//! [`scorer`] turns file content into a cyclomatic complexity score plus
//! function and class tallies.

pub mod scorer;
pub mod walker;

pub use scorer::{score_source, ComplexityScore};
pub use walker::{discover_sources, is_analyzable};
