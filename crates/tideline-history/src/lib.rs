//! Commit history reading and per-commit snapshot extraction.
//!
//! [`repo::RepositoryHandle`] is the narrow interface the engine consumes;
//! [`git::GitRepository`] implements it with git2. [`mining`] lists the
//! commits that touched a path inside a time window, and [`snapshot`]
//! turns the file content at each of those commits into a complexity
//! snapshot.

pub mod git;
pub mod mining;
pub mod repo;
pub mod snapshot;

pub use git::GitRepository;
pub use mining::{list_commits, HistoryOptions};
pub use repo::{path_key, resolve_in_repository, RepositoryHandle};
pub use snapshot::{build_series, extract};
