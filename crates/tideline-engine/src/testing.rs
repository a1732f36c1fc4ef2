//! In-memory fixtures shared by the engine's unit tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tideline_core::{CommitRef, EvolutionSeries, Snapshot, TidelineError};
use tideline_history::RepositoryHandle;

/// Series with one snapshot per complexity value, a day apart, oldest first.
pub(crate) fn make_series(complexities: &[u32]) -> EvolutionSeries {
    let start = Utc::now() - Duration::days(complexities.len() as i64 + 1);
    let snapshots = complexities
        .iter()
        .enumerate()
        .map(|(i, &complexity)| Snapshot {
            timestamp: start + Duration::days(i as i64),
            complexity,
            lines_of_code: 10,
            function_count: 1,
            class_count: 0,
            author: format!("dev{}", i % 2),
            commit_id: format!("{i:040x}"),
        })
        .collect();
    EvolutionSeries::new("app.py", snapshots)
}

/// Python source whose complexity is exactly `complexity`; zero yields
/// source that does not parse.
pub(crate) fn source_with_complexity(complexity: u32) -> String {
    if complexity == 0 {
        return "def broken(:\n    return\n".to_string();
    }
    let mut source = String::from("def f(x):\n");
    for _ in 1..complexity {
        source.push_str("    if x:\n        x -= 1\n");
    }
    source.push_str("    return x\n");
    source
}

struct Version {
    commit: CommitRef,
    content: Option<Vec<u8>>,
}

/// A repository held entirely in memory.
pub(crate) struct MemoryRepo {
    root: PathBuf,
    files: BTreeMap<PathBuf, Vec<Version>>,
    failing_history: Vec<PathBuf>,
    counter: usize,
}

impl MemoryRepo {
    pub(crate) fn new() -> Self {
        Self {
            root: PathBuf::from("/mem/repo"),
            files: BTreeMap::new(),
            failing_history: Vec::new(),
            counter: 0,
        }
    }

    /// Add one commit per complexity value, oldest first, an hour apart,
    /// the newest an hour ago.
    pub(crate) fn with_history(mut self, path: &str, complexities: &[u32]) -> Self {
        let n = complexities.len() as i64;
        for (i, &c) in complexities.iter().enumerate() {
            let when = Utc::now() - Duration::hours(n - i as i64);
            self.push(path, when, Some(source_with_complexity(c).into_bytes()));
        }
        self
    }

    /// Record a commit of `path` with raw content, or a deletion.
    pub(crate) fn push(&mut self, path: &str, when: DateTime<Utc>, content: Option<Vec<u8>>) {
        self.counter += 1;
        let commit = CommitRef {
            id: format!("{:040x}", self.counter),
            timestamp: when,
            author: format!("dev{}", self.counter % 3),
        };
        self.files
            .entry(PathBuf::from(path))
            .or_default()
            .push(Version { commit, content });
    }

    /// Make every history query for `path` fail.
    pub(crate) fn fail_history(mut self, path: &str) -> Self {
        self.failing_history.push(PathBuf::from(path));
        self
    }
}

impl RepositoryHandle for MemoryRepo {
    fn root(&self) -> &Path {
        &self.root
    }

    fn commits_touching(
        &self,
        path: &Path,
        since: DateTime<Utc>,
        max_count: usize,
    ) -> Result<Vec<CommitRef>, TidelineError> {
        if self.failing_history.iter().any(|p| p == path) {
            return Err(TidelineError::HistoryAccess("object store unavailable".into()));
        }
        let Some(versions) = self.files.get(path) else {
            return Ok(Vec::new());
        };
        let mut commits: Vec<CommitRef> = versions
            .iter()
            .rev()
            .filter(|v| v.commit.timestamp >= since)
            .map(|v| v.commit.clone())
            .collect();
        commits.truncate(max_count);
        Ok(commits)
    }

    fn file_at(&self, commit: &CommitRef, path: &Path) -> Result<Option<Vec<u8>>, TidelineError> {
        Ok(self
            .files
            .get(path)
            .and_then(|versions| versions.iter().find(|v| v.commit.id == commit.id))
            .and_then(|v| v.content.clone()))
    }

    fn list_files(&self, _extra_excludes: &[String]) -> Result<Vec<PathBuf>, TidelineError> {
        Ok(self.files.keys().cloned().collect())
    }
}
