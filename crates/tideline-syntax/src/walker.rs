use std::path::{Path, PathBuf};

use tideline_core::TidelineError;

/// Maximum file size to consider (1 MB).
const MAX_FILE_SIZE: u64 = 1_048_576;

/// Directory names never descended into: virtual environments, package
/// caches, bytecode caches, and build output.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".venv",
    "venv",
    "env",
    "__pycache__",
    "site-packages",
    "node_modules",
    ".tox",
    ".nox",
    ".eggs",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    "build",
    "dist",
    ".git",
];

/// Whether `path` names a file the scorer understands.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tideline_syntax::walker::is_analyzable;
///
/// assert!(is_analyzable(Path::new("pkg/app.py")));
/// assert!(!is_analyzable(Path::new("pkg/app.pyi")));
/// assert!(!is_analyzable(Path::new("README.md")));
/// ```
pub fn is_analyzable(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("py")
}

/// Walk `root`, respecting `.gitignore`, returning analyzable files.
///
/// Skips [`DEFAULT_EXCLUDED_DIRS`] plus any names in `extra_excludes`, and
/// files larger than 1 MB. Returned paths are relative to `root` and sorted,
/// so repository runs visit files in a stable order.
///
/// # Errors
///
/// Returns [`TidelineError::FileNotFound`] if `root` is not a directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tideline_syntax::walker::discover_sources;
///
/// let files = discover_sources(Path::new("."), &[]).unwrap();
/// for f in &files {
///     println!("{}", f.display());
/// }
/// ```
pub fn discover_sources(root: &Path, extra_excludes: &[String]) -> Result<Vec<PathBuf>, TidelineError> {
    if !root.is_dir() {
        return Err(TidelineError::FileNotFound(root.to_path_buf()));
    }

    let extra: Vec<String> = extra_excludes.to_vec();
    let walker = ignore::WalkBuilder::new(root)
        .hidden(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if !is_dir {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !DEFAULT_EXCLUDED_DIRS.contains(&name.as_ref())
                && !extra.iter().any(|e| e.as_str() == name.as_ref())
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        if !is_analyzable(path) {
            continue;
        }

        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(_) => continue,
        };
        if metadata.len() > MAX_FILE_SIZE {
            continue;
        }

        let relative = match path.strip_prefix(root) {
            Ok(r) => r.to_path_buf(),
            Err(_) => path.to_path_buf(),
        };
        files.push(relative);
    }

    files.sort();
    Ok(files)
}
