//! Repository collaborators consumed, not implemented, by the core (spec §6)
//! plus the one concrete implementation this crate ships: a plain
//! `std::fs`-backed work tree with no index or object database.

use crate::cache::SourceLoader;
use crate::source::{ContentSignature, Source};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Everything the Collector needs to know about the embedding repository.
pub trait Repository: Send + Sync {
    fn workdir(&self) -> Option<&Path>;
    fn is_bare(&self) -> bool;
    /// Object id of `path` as recorded in the index, if present there.
    fn index_entry(&self, path: &Path) -> io::Result<Option<String>>;
    /// Object id of `path` as recorded in `commit`'s tree, if present.
    fn commit_tree_entry(&self, commit: &str, path: &Path) -> io::Result<Option<String>>;
    /// `$GIT_DIR/info/attributes`, if this repository has a `$GIT_DIR`.
    fn info_attributes_path(&self) -> Option<PathBuf>;
    /// The path named by `core.attributesfile`, if configured.
    fn attributes_extra_path(&self) -> Option<PathBuf>;
}

/// Plain filesystem access, kept separate from `Repository` so the Cache's
/// `SourceLoader` can be implemented without depending on VCS concepts.
pub trait FileSystemApi: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<Option<ContentSignature>>;
    fn open_read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Blob storage, addressed by object id. `FsRepository` has none; a real VCS
/// backend plugs one in here.
pub trait ObjectDb: Send + Sync {
    fn read_blob(&self, oid: &str) -> io::Result<Vec<u8>>;
}

/// A `Repository` with no index and no object database — just a work tree on
/// disk. `index_entry`/`commit_tree_entry` always return `Ok(None)`, so
/// `INDEX_ONLY`/`INDEX_THEN_FILE`/`INCLUDE_HEAD` queries against it
/// degrade to "no contribution from that backend," per spec §4.4's "missing
/// files at any level are not errors."
pub struct FsRepository {
    workdir: PathBuf,
    info_attributes_path: Option<PathBuf>,
    attributes_extra_path: Option<PathBuf>,
}

impl FsRepository {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        let info_attributes_path = Some(workdir.join(".git").join("info").join("attributes"));
        Self {
            workdir,
            info_attributes_path,
            attributes_extra_path: None,
        }
    }

    #[must_use]
    pub fn with_attributes_extra_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.attributes_extra_path = Some(path.into());
        self
    }
}

impl Repository for FsRepository {
    fn workdir(&self) -> Option<&Path> {
        Some(&self.workdir)
    }

    fn is_bare(&self) -> bool {
        false
    }

    fn index_entry(&self, _path: &Path) -> io::Result<Option<String>> {
        Ok(None)
    }

    fn commit_tree_entry(&self, _commit: &str, _path: &Path) -> io::Result<Option<String>> {
        Ok(None)
    }

    fn info_attributes_path(&self) -> Option<PathBuf> {
        self.info_attributes_path.clone()
    }

    fn attributes_extra_path(&self) -> Option<PathBuf> {
        self.attributes_extra_path.clone()
    }
}

impl FileSystemApi for FsRepository {
    fn stat(&self, path: &Path) -> io::Result<Option<ContentSignature>> {
        match std::fs::metadata(path) {
            Ok(meta) => {
                let mtime_nanos = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map_or(0, |d| d.as_nanos() as i64);
                #[cfg(unix)]
                let inode = {
                    use std::os::unix::fs::MetadataExt;
                    meta.ino()
                };
                #[cfg(not(unix))]
                let inode = 0;
                #[cfg(unix)]
                let mode = {
                    use std::os::unix::fs::MetadataExt;
                    meta.mode()
                };
                #[cfg(not(unix))]
                let mode = 0;
                Ok(Some(ContentSignature::FileStat {
                    size: meta.len(),
                    mtime_nanos,
                    inode,
                    mode,
                }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn open_read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// An `ObjectDb` that has no blobs — paired with `FsRepository`, whose
/// `index_entry`/`commit_tree_entry` never return an oid in the first place.
pub struct NullObjectDb;

impl ObjectDb for NullObjectDb {
    fn read_blob(&self, oid: &str) -> io::Result<Vec<u8>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no object database available to read blob {oid}"),
        ))
    }
}

/// Bridges `Repository` + `FileSystemApi` + `ObjectDb` into the
/// [`SourceLoader`] the Cache needs, dispatching on the `Source` variant.
pub struct RepoSourceLoader<'a> {
    pub repository: &'a dyn Repository,
    pub filesystem: &'a dyn FileSystemApi,
    pub object_db: &'a dyn ObjectDb,
}

impl SourceLoader for RepoSourceLoader<'_> {
    fn stat(&self, source: &Source) -> io::Result<Option<ContentSignature>> {
        match source {
            Source::FileSystem { base_dir, filename } => self.filesystem.stat(&base_dir.join(filename)),
            Source::IndexBlob { filename } => Ok(self
                .repository
                .index_entry(filename)?
                .map(ContentSignature::ObjectId)),
            Source::CommitBlob { commit, filename } => Ok(self
                .repository
                .commit_tree_entry(commit, filename)?
                .map(ContentSignature::ObjectId)),
            Source::Buffer { label } => Err(unsupported_buffer(label)),
        }
    }

    fn read(&self, source: &Source) -> io::Result<Vec<u8>> {
        match source {
            Source::FileSystem { base_dir, filename } => self.filesystem.open_read(&base_dir.join(filename)),
            Source::IndexBlob { filename } => {
                let oid = self
                    .repository
                    .index_entry(filename)?
                    .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "index entry vanished"))?;
                self.object_db.read_blob(&oid)
            }
            Source::CommitBlob { commit, filename } => {
                let oid = self
                    .repository
                    .commit_tree_entry(commit, filename)?
                    .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "commit tree entry vanished"))?;
                self.object_db.read_blob(&oid)
            }
            Source::Buffer { label } => Err(unsupported_buffer(label)),
        }
    }
}

fn unsupported_buffer(label: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("buffer source {label:?} has no backing store; construct its AttrFile directly"),
    )
}

/// Ancestor directories from `start` up to and including `root`, replacing
/// the source's callback-driven descent with an iterator the Collector can
/// fold over directly (SPEC_FULL §4.4.1).
pub struct Ancestors {
    next: Option<PathBuf>,
    root: PathBuf,
}

pub fn ancestors(start: &Path, root: &Path) -> Ancestors {
    Ancestors {
        next: Some(start.to_path_buf()),
        root: root.to_path_buf(),
    }
}

impl Iterator for Ancestors {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if current == self.root {
            self.next = None;
        } else {
            self.next = current.parent().map(Path::to_path_buf).filter(|p| p.starts_with(&self.root));
        }
        Some(current)
    }
}
