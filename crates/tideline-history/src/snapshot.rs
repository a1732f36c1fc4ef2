//! Per-commit complexity snapshots.

use std::path::Path;

use tideline_core::{CommitRef, EvolutionSeries, Snapshot, TidelineError};
use tideline_syntax::score_source;

/// How far into a blob to look for a NUL byte.
const BINARY_SNIFF_LEN: usize = 8192;

/// Decode blob bytes as UTF-8 source text.
///
/// Returns `None` for binary content (a NUL byte near the start) or bytes
/// that are not valid UTF-8. A leading byte-order mark is dropped.
///
/// # Examples
///
/// ```
/// use tideline_history::snapshot::decode_text;
///
/// assert_eq!(decode_text(b"x = 1\n").as_deref(), Some("x = 1\n"));
/// assert!(decode_text(&[0xff, 0xfe, 0x00]).is_none());
/// ```
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    if sniff.contains(&0) {
        return None;
    }
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).ok()
}

/// Count lines the way Python's `str.splitlines` splits them.
///
/// Besides `\n` and `\r\n`, a lone `\r`, vertical tab, form feed, the file,
/// group and record separators, NEL and the Unicode line and paragraph
/// separators all end a line. A trailing separator does not start a new one.
pub fn count_lines(text: &str) -> usize {
    let mut lines = 0;
    let mut open = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                lines += 1;
                open = false;
            }
            '\n' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}'
            | '\u{2029}' => {
                lines += 1;
                open = false;
            }
            _ => open = true,
        }
    }
    lines + usize::from(open)
}

/// Measure decoded source as it stood at `commit`.
///
/// Content that fails to parse still yields a snapshot, with complexity
/// and counts of zero.
///
/// # Errors
///
/// Returns [`TidelineError::Parse`] if the grammar cannot be loaded.
pub fn snapshot_from_text(text: &str, commit: &CommitRef) -> Result<Snapshot, TidelineError> {
    let score = score_source(text)?;
    let (complexity, function_count, class_count) = match score {
        Some(s) => (s.complexity, s.function_count, s.class_count),
        None => {
            tracing::debug!(commit = commit.short_id(), "content does not parse, scoring as zero");
            (0, 0, 0)
        }
    };

    Ok(Snapshot {
        timestamp: commit.timestamp,
        complexity,
        lines_of_code: u32::try_from(count_lines(text)).unwrap_or(u32::MAX),
        function_count,
        class_count,
        author: commit.author.clone(),
        commit_id: commit.id.clone(),
    })
}

/// Extract the snapshot of `path` at `commit`.
///
/// Returns `Ok(None)` when the path is absent at that commit or its content
/// cannot be decoded as text.
///
/// # Errors
///
/// Returns [`TidelineError::HistoryAccess`] if the blob cannot be read.
pub fn extract<R>(repo: &R, commit: &CommitRef, path: &Path) -> Result<Option<Snapshot>, TidelineError>
where
    R: crate::repo::RepositoryHandle + ?Sized,
{
    let Some(bytes) = repo.file_at(commit, path)? else {
        return Ok(None);
    };
    let Some(text) = decode_text(&bytes) else {
        tracing::debug!(
            commit = commit.short_id(),
            path = %path.display(),
            "content is not text, skipping"
        );
        return Ok(None);
    };
    snapshot_from_text(&text, commit).map(Some)
}

/// Build the evolution series for `path` from newest-first `commits`.
///
/// Commits whose content is absent, undecodable, or unreadable are left
/// out. Read failures are logged and do not abort the series.
pub fn build_series<R>(
    repo: &R,
    path: &Path,
    file_key: &str,
    commits: &[CommitRef],
) -> EvolutionSeries
where
    R: crate::repo::RepositoryHandle + ?Sized,
{
    let snapshots = commits
        .iter()
        .rev()
        .filter_map(|commit| match extract(repo, commit, path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(commit = commit.short_id(), error = %e, "dropping commit");
                None
            }
        })
        .collect();
    EvolutionSeries::new(file_key, snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::RepositoryHandle;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[derive(Default)]
    struct MemoryRepo {
        blobs: HashMap<String, Vec<u8>>,
        broken: Vec<String>,
    }

    impl RepositoryHandle for MemoryRepo {
        fn root(&self) -> &Path {
            Path::new("/mem")
        }

        fn commits_touching(
            &self,
            _: &Path,
            _: DateTime<Utc>,
            _: usize,
        ) -> Result<Vec<CommitRef>, TidelineError> {
            Ok(Vec::new())
        }

        fn file_at(&self, commit: &CommitRef, _: &Path) -> Result<Option<Vec<u8>>, TidelineError> {
            if self.broken.contains(&commit.id) {
                return Err(TidelineError::HistoryAccess("corrupt object".into()));
            }
            Ok(self.blobs.get(&commit.id).cloned())
        }

        fn list_files(&self, _: &[String]) -> Result<Vec<PathBuf>, TidelineError> {
            Ok(Vec::new())
        }
    }

    fn make_commit(id: &str, hours_ago: i64) -> CommitRef {
        CommitRef {
            id: id.into(),
            timestamp: Utc::now() - Duration::hours(hours_ago),
            author: format!("author-{id}"),
        }
    }

    #[test]
    fn decode_rejects_binary_and_invalid_utf8() {
        assert!(decode_text(b"print('hi')\x00\x01").is_none());
        assert!(decode_text(&[b'x', b' ', b'=', b' ', 0xc3, 0x28]).is_none());
        assert_eq!(decode_text(b"").as_deref(), Some(""));
    }

    #[test]
    fn decode_strips_bom() {
        assert_eq!(decode_text(b"\xef\xbb\xbfx = 1\n").as_deref(), Some("x = 1\n"));
    }

    #[test]
    fn counts_every_line_ending() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("x = 1"), 1);
        assert_eq!(count_lines("x = 1\n"), 1);
        assert_eq!(count_lines("a\nb\r\nc"), 3);
        assert_eq!(count_lines("a\rb\rc\r"), 3);
        assert_eq!(count_lines("a\n\nb\n"), 3);
        assert_eq!(count_lines("a\x0cb\u{2028}c"), 3);
    }

    #[test]
    fn classic_mac_endings_count_lines() {
        let snap = snapshot_from_text("x = 1\ry = 2\rz = 3\r", &make_commit("mac", 1)).unwrap();
        assert_eq!(snap.lines_of_code, 3);
    }

    #[test]
    fn snapshot_carries_commit_metadata() {
        let commit = make_commit("abc", 1);
        let snap = snapshot_from_text("def f(x):\n    if x:\n        pass\n", &commit).unwrap();
        assert_eq!(snap.complexity, 2);
        assert_eq!(snap.function_count, 1);
        assert_eq!(snap.lines_of_code, 3);
        assert_eq!(snap.commit_id, "abc");
        assert_eq!(snap.author, "author-abc");
        assert_eq!(snap.timestamp, commit.timestamp);
    }

    #[test]
    fn unparsable_content_scores_zero() {
        let snap = snapshot_from_text("def broken(:\n", &make_commit("a", 1)).unwrap();
        assert_eq!(snap.complexity, 0);
        assert_eq!(snap.function_count, 0);
        assert_eq!(snap.class_count, 0);
        assert_eq!(snap.lines_of_code, 1);
    }

    #[test]
    fn extract_returns_none_for_missing_or_binary() {
        let mut repo = MemoryRepo::default();
        repo.blobs.insert("bin".into(), vec![0x89, b'P', b'N', b'G', 0x00]);

        let path = Path::new("app.py");
        assert!(extract(&repo, &make_commit("gone", 1), path).unwrap().is_none());
        assert!(extract(&repo, &make_commit("bin", 1), path).unwrap().is_none());
    }

    #[test]
    fn series_is_oldest_first_and_skips_bad_commits() {
        let mut repo = MemoryRepo::default();
        repo.blobs.insert("c1".into(), b"x = 1\n".to_vec());
        repo.blobs.insert("c2".into(), b"if a:\n    pass\n".to_vec());
        repo.blobs.insert("c4".into(), vec![0xff, 0xfe]);
        repo.blobs
            .insert("c5".into(), b"if a and b:\n    pass\nwhile c:\n    pass\n".to_vec());
        repo.broken.push("c3".into());

        // Newest first, the way the commit reader returns them.
        let commits = vec![
            make_commit("c5", 1),
            make_commit("c4", 2),
            make_commit("c3", 3),
            make_commit("c2", 4),
            make_commit("c1", 5),
            make_commit("c0", 6),
        ];

        let series = build_series(&repo, Path::new("app.py"), "app.py", &commits);
        assert_eq!(series.file_path(), "app.py");
        let complexities: Vec<u32> = series.snapshots().iter().map(|s| s.complexity).collect();
        assert_eq!(complexities, vec![1, 2, 4]);
        let ids: Vec<&str> = series.snapshots().iter().map(|s| s.commit_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c5"]);
    }
}
