use std::path::PathBuf;

/// Errors that can occur across Tideline.
///
/// The first four variants form the evaluation failure taxonomy surfaced by
/// single-file evaluation; the rest cover configuration and I/O. Library
/// crates use this type directly; it derives [`miette::Diagnostic`] so the
/// binary can report it with help text.
///
/// # Examples
///
/// ```
/// use tideline_core::TidelineError;
///
/// let err = TidelineError::InsufficientHistory { found: 1, required: 2 };
/// assert!(err.to_string().contains("found 1"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TidelineError {
    /// The requested path cannot be resolved relative to the repository root.
    #[error("path {} is not inside the repository", .0.display())]
    #[diagnostic(
        code(tideline::path_not_in_repository),
        help("pass a path inside the repository selected with --repo")
    )]
    PathNotInRepository(PathBuf),

    /// The underlying repository cannot be queried.
    #[error("history access error: {0}")]
    #[diagnostic(code(tideline::history_access))]
    HistoryAccess(String),

    /// Too few commits touch the path within the evaluation window.
    #[error("insufficient commit history: found {found} commits, need at least {required}")]
    #[diagnostic(
        code(tideline::insufficient_history),
        help("widen the window with --window, or lower evaluation.min_commits")
    )]
    InsufficientHistory {
        /// Commits found in the window.
        found: usize,
        /// Configured minimum.
        required: usize,
    },

    /// Too few usable snapshots remain after extraction.
    #[error("insufficient temporal data: extracted {found} snapshots, need at least {required}")]
    #[diagnostic(
        code(tideline::insufficient_data),
        help("some commits could not be read as text; widen the window with --window")
    )]
    InsufficientData {
        /// Usable snapshots.
        found: usize,
        /// Minimum series length.
        required: usize,
    },

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(tideline::config), help("check .tideline.toml and TIDELINE_* variables"))]
    Config(String),

    /// Source code parsing failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl TidelineError {
    /// Whether this failure means the file simply lacks enough history,
    /// as opposed to a repository or configuration fault.
    pub fn is_insufficient(&self) -> bool {
        matches!(
            self,
            TidelineError::InsufficientHistory { .. } | TidelineError::InsufficientData { .. }
        )
    }
}
