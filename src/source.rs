//! Where an [`crate::attr_file::AttrFile`] comes from, and the cache key
//! derived from it (spec §3).

use std::path::{Path, PathBuf};

/// The four shapes a rule file can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A real file on disk at `base_dir.join(filename)`.
    FileSystem { base_dir: PathBuf, filename: PathBuf },
    /// A blob at `filename` in the current index.
    IndexBlob { filename: PathBuf },
    /// A blob at `filename` in a named commit (typically `HEAD`).
    CommitBlob { commit: String, filename: PathBuf },
    /// An in-memory buffer, for tests and for macro expansion fixtures.
    Buffer { label: String },
}

impl Source {
    pub fn filesystem(base_dir: impl Into<PathBuf>, filename: impl Into<PathBuf>) -> Self {
        Self::FileSystem {
            base_dir: base_dir.into(),
            filename: filename.into(),
        }
    }

    pub fn index_blob(filename: impl Into<PathBuf>) -> Self {
        Self::IndexBlob {
            filename: filename.into(),
        }
    }

    pub fn commit_blob(commit: impl Into<String>, filename: impl Into<PathBuf>) -> Self {
        Self::CommitBlob {
            commit: commit.into(),
            filename: filename.into(),
        }
    }

    pub fn buffer(label: impl Into<String>) -> Self {
        Self::Buffer { label: label.into() }
    }

    /// The directory component of a filesystem source; empty for every
    /// other source shape. Callers that need the directory anchored
    /// patterns in this source should match against (which for index/commit
    /// blobs is not necessarily this) pass it separately — see
    /// `Cache::get`'s `anchor` parameter.
    pub fn base_dir(&self) -> &Path {
        match self {
            Self::FileSystem { base_dir, .. } => base_dir,
            _ => Path::new(""),
        }
    }

    /// A human-readable path for diagnostics (I/O error messages, tracing
    /// fields) — not used as a cache key, see [`Source::fingerprint`].
    pub fn display_path(&self) -> PathBuf {
        match self {
            Self::FileSystem { base_dir, filename } => base_dir.join(filename),
            Self::IndexBlob { filename } | Self::CommitBlob { filename, .. } => filename.clone(),
            Self::Buffer { label } => PathBuf::from(label),
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Self::FileSystem { base_dir, filename } => Fingerprint {
                tag: SourceTag::FileSystem,
                base_dir: base_dir.clone(),
                filename: filename.clone(),
                commit: None,
            },
            Self::IndexBlob { filename } => Fingerprint {
                tag: SourceTag::IndexBlob,
                base_dir: PathBuf::new(),
                filename: filename.clone(),
                commit: None,
            },
            Self::CommitBlob { commit, filename } => Fingerprint {
                tag: SourceTag::CommitBlob,
                base_dir: PathBuf::new(),
                filename: filename.clone(),
                commit: Some(commit.clone()),
            },
            Self::Buffer { label } => Fingerprint {
                tag: SourceTag::Buffer,
                base_dir: PathBuf::new(),
                filename: PathBuf::from(label),
                commit: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SourceTag {
    FileSystem,
    IndexBlob,
    CommitBlob,
    Buffer,
}

/// Cache key for a [`Source`]: `(tag, base_dir, filename, commit-id-or-none)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    tag: SourceTag,
    base_dir: PathBuf,
    filename: PathBuf,
    commit: Option<String>,
}

/// Whatever is needed to detect a source's content changed without
/// re-reading it in full (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSignature {
    /// `(size, mtime_nanos, inode, mode)` — cheap to recompute via `stat`.
    FileStat {
        size: u64,
        mtime_nanos: i64,
        inode: u64,
        mode: u32,
    },
    /// Object id of a blob, for index/commit sources.
    ObjectId(String),
    /// Buffers never change out from under the cache once created.
    Fixed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_sources_have_distinct_fingerprints() {
        let a = Source::filesystem("/repo/sub", ".gitattributes").fingerprint();
        let b = Source::filesystem("/repo", ".gitattributes").fingerprint();
        assert_ne!(a, b);
    }

    #[test]
    fn same_source_has_stable_fingerprint() {
        let a = Source::commit_blob("HEAD", ".gitattributes").fingerprint();
        let b = Source::commit_blob("HEAD", ".gitattributes").fingerprint();
        assert_eq!(a, b);
    }

    #[test]
    fn commit_and_index_blobs_at_same_path_differ() {
        let a = Source::index_blob(".gitattributes").fingerprint();
        let b = Source::commit_blob("HEAD", ".gitattributes").fingerprint();
        assert_ne!(a, b);
    }
}
