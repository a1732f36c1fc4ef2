use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tideline_core::{CommitRef, TidelineError};

/// Read-only access to a repository's history and working tree.
///
/// Implementations must be safe to call repeatedly; the engine keeps no
/// state between calls and re-reads history on every evaluation.
pub trait RepositoryHandle {
    /// Absolute path of the working tree root.
    fn root(&self) -> &Path;

    /// Commits that modified `path` with a commit time at or after `since`,
    /// newest first, at most `max_count` of them.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::HistoryAccess`] if history cannot be read.
    fn commits_touching(
        &self,
        path: &Path,
        since: DateTime<Utc>,
        max_count: usize,
    ) -> Result<Vec<CommitRef>, TidelineError>;

    /// Raw bytes of `path` as of `commit`, or `None` if the path did not
    /// name a file at that commit.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::HistoryAccess`] if the objects cannot be read.
    fn file_at(&self, commit: &CommitRef, path: &Path) -> Result<Option<Vec<u8>>, TidelineError>;

    /// Analyzable files in the working tree, relative to [`root`](Self::root).
    ///
    /// # Errors
    ///
    /// Returns an error if the working tree cannot be walked.
    fn list_files(&self, extra_excludes: &[String]) -> Result<Vec<PathBuf>, TidelineError>;
}

/// Resolve a user-supplied path to one relative to the repository root.
///
/// Absolute paths are canonicalized and must live under `root`; relative
/// paths are taken as repository-relative. `.` components are dropped and
/// `..` may not climb above the root.
///
/// # Errors
///
/// Returns [`TidelineError::PathNotInRepository`] if the path escapes the
/// root or names the root itself.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tideline_history::repo::resolve_in_repository;
///
/// let root = Path::new("/srv/project");
/// let rel = resolve_in_repository(root, Path::new("./pkg/../app.py")).unwrap();
/// assert_eq!(rel, PathBuf::from("app.py"));
/// assert!(resolve_in_repository(root, Path::new("../other.py")).is_err());
/// ```
pub fn resolve_in_repository(root: &Path, path: &Path) -> Result<PathBuf, TidelineError> {
    let not_in_repo = || TidelineError::PathNotInRepository(path.to_path_buf());

    let relative = if path.is_absolute() {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        canonical
            .strip_prefix(&root)
            .map_err(|_| not_in_repo())?
            .to_path_buf()
    } else {
        PathBuf::from(path.to_string_lossy().replace('\\', "/"))
    };

    let mut normalized = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(not_in_repo());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(not_in_repo()),
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(not_in_repo());
    }
    Ok(normalized)
}

/// Forward-slash rendering of a repository-relative path, used as the
/// `file_path` of results.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tideline_history::repo::path_key;
///
/// assert_eq!(path_key(Path::new("pkg/app.py")), "pkg/app.py");
/// ```
pub fn path_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
