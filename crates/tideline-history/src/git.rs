//! git2-backed [`RepositoryHandle`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use git2::{Commit, ErrorCode, ObjectType, Oid, Repository, Sort, Tree};
use tideline_core::{CommitRef, TidelineError};

use crate::repo::RepositoryHandle;

/// A repository opened from disk.
pub struct GitRepository {
    repo: Repository,
    root: PathBuf,
}

impl GitRepository {
    /// Open the repository whose working tree contains `path`.
    ///
    /// Searches upward from `path` for the enclosing repository.
    ///
    /// # Errors
    ///
    /// Returns [`TidelineError::HistoryAccess`] if no repository is found or
    /// the repository is bare.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use tideline_history::{GitRepository, RepositoryHandle};
    ///
    /// let repo = GitRepository::open(Path::new(".")).unwrap();
    /// println!("{}", repo.root().display());
    /// ```
    pub fn open(path: &Path) -> Result<Self, TidelineError> {
        let repo = Repository::discover(path)
            .map_err(|e| TidelineError::HistoryAccess(format!("failed to open repository: {e}")))?;
        let workdir = repo.workdir().ok_or_else(|| {
            TidelineError::HistoryAccess("bare repositories have no working tree".into())
        })?;
        let root = workdir
            .canonicalize()
            .unwrap_or_else(|_| workdir.to_path_buf());
        Ok(Self { repo, root })
    }

    fn find_commit(&self, id: &str) -> Result<Commit<'_>, TidelineError> {
        let oid = Oid::from_str(id)
            .map_err(|e| TidelineError::HistoryAccess(format!("invalid commit id '{id}': {e}")))?;
        self.repo
            .find_commit(oid)
            .map_err(|e| TidelineError::HistoryAccess(format!("failed to find commit: {e}")))
    }

    /// Whether `commit` changed the blob at `path`.
    ///
    /// A root commit touches every path it contains. Any other commit touches
    /// `path` unless it matches at least one parent there, which keeps merges
    /// that took one side unchanged out of the history.
    fn touches(&self, commit: &Commit<'_>, path: &Path) -> Result<bool, TidelineError> {
        let tree = commit
            .tree()
            .map_err(|e| TidelineError::HistoryAccess(format!("failed to get commit tree: {e}")))?;
        let current = entry_id(&tree, path)?;

        if commit.parent_count() == 0 {
            return Ok(current.is_some());
        }

        for parent in commit.parents() {
            let parent_tree = parent.tree().map_err(|e| {
                TidelineError::HistoryAccess(format!("failed to get parent tree: {e}"))
            })?;
            if entry_id(&parent_tree, path)? == current {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl RepositoryHandle for GitRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn commits_touching(
        &self,
        path: &Path,
        since: DateTime<Utc>,
        max_count: usize,
    ) -> Result<Vec<CommitRef>, TidelineError> {
        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| TidelineError::HistoryAccess(format!("failed to create revwalk: {e}")))?;
        revwalk.set_sorting(Sort::TIME).ok();

        match revwalk.push_head() {
            Ok(()) => {}
            // Freshly initialised repository with nothing committed.
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(TidelineError::HistoryAccess(format!(
                    "failed to push HEAD: {e}"
                )))
            }
        }

        let cutoff = since.timestamp();
        let mut commits = Vec::new();

        for oid_result in revwalk {
            if commits.len() >= max_count {
                break;
            }
            let oid = oid_result
                .map_err(|e| TidelineError::HistoryAccess(format!("revwalk error: {e}")))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| TidelineError::HistoryAccess(format!("failed to find commit: {e}")))?;

            let seconds = commit.time().seconds();
            if seconds < cutoff {
                break;
            }
            if !self.touches(&commit, path)? {
                continue;
            }

            let timestamp = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
                TidelineError::HistoryAccess(format!("commit {oid} has an invalid timestamp"))
            })?;
            let author = commit.author();
            commits.push(CommitRef {
                id: oid.to_string(),
                timestamp,
                author: author.name().unwrap_or("unknown").to_string(),
            });
        }

        Ok(commits)
    }

    fn file_at(&self, commit: &CommitRef, path: &Path) -> Result<Option<Vec<u8>>, TidelineError> {
        let commit = self.find_commit(&commit.id)?;
        let tree = commit
            .tree()
            .map_err(|e| TidelineError::HistoryAccess(format!("failed to get commit tree: {e}")))?;

        let entry = match tree.get_path(path) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => {
                return Err(TidelineError::HistoryAccess(format!(
                    "failed to look up {}: {e}",
                    path.display()
                )))
            }
        };
        if entry.kind() != Some(ObjectType::Blob) {
            return Ok(None);
        }

        let blob = self
            .repo
            .find_blob(entry.id())
            .map_err(|e| TidelineError::HistoryAccess(format!("failed to read blob: {e}")))?;
        Ok(Some(blob.content().to_vec()))
    }

    fn list_files(&self, extra_excludes: &[String]) -> Result<Vec<PathBuf>, TidelineError> {
        tideline_syntax::discover_sources(&self.root, extra_excludes)
    }
}

fn entry_id(tree: &Tree<'_>, path: &Path) -> Result<Option<Oid>, TidelineError> {
    match tree.get_path(path) {
        Ok(entry) => Ok(Some(entry.id())),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(TidelineError::HistoryAccess(format!(
            "failed to look up {}: {e}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use git2::{Signature, Time};
    use std::fs;

    struct TestRepo {
        dir: tempfile::TempDir,
        repo: Repository,
    }

    impl TestRepo {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let repo = Repository::init(dir.path()).unwrap();
            Self { dir, repo }
        }

        fn commit(&self, files: &[(&str, &str)], author: &str, when: i64) -> Oid {
            let mut index = self.repo.index().unwrap();
            for (path, content) in files {
                let full = self.dir.path().join(path);
                fs::create_dir_all(full.parent().unwrap()).unwrap();
                fs::write(&full, content).unwrap();
                index.add_path(Path::new(path)).unwrap();
            }
            index.write().unwrap();
            self.write_commit(&mut index, author, when)
        }

        fn remove(&self, path: &str, when: i64) -> Oid {
            let mut index = self.repo.index().unwrap();
            fs::remove_file(self.dir.path().join(path)).unwrap();
            index.remove_path(Path::new(path)).unwrap();
            index.write().unwrap();
            self.write_commit(&mut index, "alice", when)
        }

        fn write_commit(&self, index: &mut git2::Index, author: &str, when: i64) -> Oid {
            let tree_id = index.write_tree().unwrap();
            let tree = self.repo.find_tree(tree_id).unwrap();
            let sig = Signature::new(author, &format!("{author}@example.com"), &Time::new(when, 0))
                .unwrap();
            let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
            let parents: Vec<&Commit<'_>> = parent.iter().collect();
            self.repo
                .commit(Some("HEAD"), &sig, &sig, "change", &tree, &parents)
                .unwrap()
        }

        fn open(&self) -> GitRepository {
            GitRepository::open(self.dir.path()).unwrap()
        }
    }

    fn hours_ago(hours: i64) -> i64 {
        (Utc::now() - Duration::hours(hours)).timestamp()
    }

    fn week_ago() -> DateTime<Utc> {
        Utc::now() - Duration::days(7)
    }

    #[test]
    fn lists_only_commits_that_touch_the_path() {
        let t = TestRepo::new();
        t.commit(&[("app.py", "x = 1\n")], "alice", hours_ago(5));
        t.commit(&[("other.py", "y = 1\n")], "bob", hours_ago(4));
        t.commit(&[("app.py", "x = 2\n")], "bob", hours_ago(3));

        let repo = t.open();
        let commits = repo
            .commits_touching(Path::new("app.py"), week_ago(), 100)
            .unwrap();

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].author, "bob");
        assert_eq!(commits[1].author, "alice");
        assert!(commits[0].timestamp > commits[1].timestamp);
    }

    #[test]
    fn window_and_cap_limit_results() {
        let t = TestRepo::new();
        let old = (Utc::now() - Duration::days(30)).timestamp();
        t.commit(&[("app.py", "x = 0\n")], "alice", old);
        for i in 1..=4 {
            let body = format!("x = {i}\n");
            t.commit(&[("app.py", &body)], "alice", hours_ago(10 - i));
        }

        let repo = t.open();
        let recent = repo
            .commits_touching(Path::new("app.py"), week_ago(), 100)
            .unwrap();
        assert_eq!(recent.len(), 4);

        let capped = repo
            .commits_touching(Path::new("app.py"), week_ago(), 2)
            .unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0].id, recent[0].id);
    }

    #[test]
    fn deletion_counts_as_a_touch() {
        let t = TestRepo::new();
        t.commit(&[("app.py", "x = 1\n")], "alice", hours_ago(3));
        t.remove("app.py", hours_ago(2));

        let repo = t.open();
        let commits = repo
            .commits_touching(Path::new("app.py"), week_ago(), 100)
            .unwrap();
        assert_eq!(commits.len(), 2);

        assert!(repo.file_at(&commits[0], Path::new("app.py")).unwrap().is_none());
        assert_eq!(
            repo.file_at(&commits[1], Path::new("app.py")).unwrap().unwrap(),
            b"x = 1\n"
        );
    }

    #[test]
    fn directories_are_not_files() {
        let t = TestRepo::new();
        t.commit(&[("pkg/mod.py", "x = 1\n")], "alice", hours_ago(1));

        let repo = t.open();
        let commits = repo
            .commits_touching(Path::new("pkg/mod.py"), week_ago(), 100)
            .unwrap();
        assert_eq!(commits.len(), 1);
        assert!(repo.file_at(&commits[0], Path::new("pkg")).unwrap().is_none());
    }

    #[test]
    fn empty_repository_has_no_commits() {
        let t = TestRepo::new();
        let repo = t.open();
        let commits = repo
            .commits_touching(Path::new("app.py"), week_ago(), 100)
            .unwrap();
        assert!(commits.is_empty());
    }

    #[test]
    fn unknown_commit_is_a_history_error() {
        let t = TestRepo::new();
        t.commit(&[("app.py", "x = 1\n")], "alice", hours_ago(1));
        let repo = t.open();

        let bogus = CommitRef {
            id: "0123456789abcdef0123456789abcdef01234567".into(),
            timestamp: Utc::now(),
            author: "nobody".into(),
        };
        let err = repo.file_at(&bogus, Path::new("app.py")).unwrap_err();
        assert!(matches!(err, TidelineError::HistoryAccess(_)));
    }

    #[test]
    fn open_outside_a_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = GitRepository::open(dir.path());
        assert!(matches!(result, Err(TidelineError::HistoryAccess(_))));
    }

    #[test]
    fn list_files_walks_the_working_tree() {
        let t = TestRepo::new();
        t.commit(
            &[("app.py", "x = 1\n"), ("notes.txt", "hi\n")],
            "alice",
            hours_ago(1),
        );
        let repo = t.open();
        let files = repo.list_files(&[]).unwrap();
        assert_eq!(files, vec![PathBuf::from("app.py")]);
    }
}
