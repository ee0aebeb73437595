//! Attribute resolution engine: layered gitattributes-style pattern matching
//! over multiple rule sources.
//!
//! [`Engine`] is the crate's facade — it owns the process-wide [`Cache`] and
//! the repository collaborators a query needs, and exposes the five public
//! operations spec'd for the core: [`Engine::get`], [`Engine::get_many`],
//! [`Engine::foreach`], [`Engine::add_macro`], and [`Engine::cache_flush`].
//! Everything underneath — [`Pattern`] matching, [`AttrFile`] parsing,
//! [`collector`] assembly, [`resolver`] lookup — is reusable on its own for
//! callers that want to drive the pieces directly (e.g. an embedder that
//! already has its own collected file vector).

pub mod attr_file;
pub mod cache;
pub mod cancel;
pub mod collector;
pub mod error;
pub mod flags;
pub mod pattern;
pub mod repo;
pub mod resolver;
pub mod rule;
pub mod session;
pub mod source;
#[cfg(test)]
mod test_support;
pub mod value;

pub use attr_file::AttrFile;
pub use cache::Cache;
pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use flags::{Flags, SourceOrder};
pub use pattern::Pattern;
pub use repo::{FsRepository, NullObjectDb, ObjectDb, RepoSourceLoader, Repository};
pub use rule::Rule;
pub use session::Session;
pub use source::{ContentSignature, Fingerprint, Source};
pub use value::{Assignment, AttributeValue};

use std::path::Path;
use std::sync::Arc;

/// Bundles the repository collaborators and the cache a sequence of queries
/// share. Cheap to construct per repository handle; expensive per-file
/// parses are memoized in the owned [`Cache`], not here.
pub struct Engine {
    repository: Arc<dyn Repository>,
    filesystem: Arc<dyn repo::FileSystemApi>,
    object_db: Arc<dyn ObjectDb>,
    cache: Cache,
}

impl Engine {
    pub fn new(
        repository: Arc<dyn Repository>,
        filesystem: Arc<dyn repo::FileSystemApi>,
        object_db: Arc<dyn ObjectDb>,
    ) -> Self {
        Self {
            repository,
            filesystem,
            object_db,
            cache: Cache::new(),
        }
    }

    /// Convenience constructor for a plain work tree with no index or
    /// object database backing it.
    pub fn for_workdir(workdir: impl Into<std::path::PathBuf>) -> Self {
        let repository = Arc::new(FsRepository::new(workdir));
        let repository_dyn: Arc<dyn Repository> = repository.clone();
        let filesystem_dyn: Arc<dyn repo::FileSystemApi> = repository;
        Self {
            repository: repository_dyn,
            filesystem: filesystem_dyn,
            object_db: Arc::new(NullObjectDb),
            cache: Cache::new(),
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    fn loader(&self) -> RepoSourceLoader<'_> {
        RepoSourceLoader {
            repository: self.repository.as_ref(),
            filesystem: self.filesystem.as_ref(),
            object_db: self.object_db.as_ref(),
        }
    }

    fn collect(&self, session: &mut Session, flags: &Flags, path: &Path) -> Result<Vec<Arc<AttrFile>>> {
        if let Some(cached) = session.cached_files(path, flags) {
            return Ok(cached.to_vec());
        }
        let loader = self.loader();
        let files = collector::collect(self.repository.as_ref(), session, &self.cache, &loader, flags, path)?;
        session.remember_files(path, flags, files.clone());
        Ok(files)
    }

    /// Single-attribute lookup (spec §4.5 / §6). `is_dir` tells whether
    /// `path` names a directory, which `DIRECTORY_ONLY` patterns need.
    pub fn get(&self, flags: &Flags, path: &Path, is_dir: bool, name: &str) -> Result<AttributeValue> {
        let mut session = Session::new();
        let files = self.collect(&mut session, flags, path)?;
        Ok(resolver::get(&files, &self.cache, path, is_dir, name))
    }

    /// As [`Engine::get`], reusing a caller-owned [`Session`] across many
    /// queries to amortize collection.
    pub fn get_with_session(
        &self,
        session: &mut Session,
        flags: &Flags,
        path: &Path,
        is_dir: bool,
        name: &str,
    ) -> Result<AttributeValue> {
        let files = self.collect(session, flags, path)?;
        Ok(resolver::get(&files, &self.cache, path, is_dir, name))
    }

    /// Multi-attribute lookup (spec §4.5 / §6).
    pub fn get_many(
        &self,
        flags: &Flags,
        path: &Path,
        is_dir: bool,
        names: &[&str],
    ) -> Result<Vec<AttributeValue>> {
        let mut session = Session::new();
        let files = self.collect(&mut session, flags, path)?;
        Ok(resolver::get_many(&files, &self.cache, path, is_dir, names))
    }

    /// Enumeration (spec §4.5 / §6).
    pub fn foreach<F>(&self, flags: &Flags, path: &Path, is_dir: bool, callback: F) -> Result<i32>
    where
        F: FnMut(&str, &AttributeValue) -> i32,
    {
        let mut session = Session::new();
        let files = self.collect(&mut session, flags, path)?;
        resolver::foreach(&files, &self.cache, path, is_dir, callback)
    }

    /// Register a macro directly, bypassing the trust checks that gate
    /// `[attr]` lines parsed from a file (spec §6). `definition` is a
    /// space-separated assignment list, same grammar as a rule line's tail.
    pub fn add_macro(&self, name: &str, definition: &str) -> Result<()> {
        if name.is_empty() || !value::parse_assignment(name).is_some_and(|a| a.name.as_ref() == name) {
            return Err(Error::InvalidArgument(format!("invalid macro name: {name:?}")));
        }
        let assignments: Vec<_> = definition.split_whitespace().filter_map(value::parse_assignment).collect();
        let marker = Pattern::macro_marker(name, Path::new(""));
        self.cache.register_macro(name.to_string(), Rule::new(marker, assignments));
        Ok(())
    }

    /// Drop every cached parse (spec §4.3 / §6).
    pub fn cache_flush(&self) {
        self.cache.flush();
    }
}
