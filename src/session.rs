//! A short-lived scratch object amortizing setup across many queries within
//! one higher-level operation, e.g. a single checkout (spec §4.6).
//!
//! A `Session` is not thread-safe by design — spec §5 is explicit that it is
//! a scratch buffer, not a concurrency primitive. Its lifetime is expected to
//! be strictly shorter than the [`crate::cache::Cache`] it borrows from.

use crate::attr_file::AttrFile;
use crate::flags::Flags;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Caps the per-session collected-file-vector memo so a pathological caller
/// hammering distinct `(path, flags)` pairs can't grow it unboundedly.
const MEMO_CAPACITY: usize = 256;

pub struct Session {
    system_attributes_path: OnceLock<Option<PathBuf>>,
    collected_memo: HashMap<(PathBuf, Flags), Vec<Arc<AttrFile>>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            system_attributes_path: OnceLock::new(),
            collected_memo: HashMap::new(),
        }
    }

    /// Resolve (once) and return the system attributes file path, via
    /// `resolve` — typically a fixed, platform-specific path such as
    /// `/etc/gitattributes`. Subsequent calls never invoke `resolve` again,
    /// matching spec §9's "global system-file path" design note.
    pub fn system_attributes_path(&self, resolve: impl FnOnce() -> Option<PathBuf>) -> Option<&Path> {
        self.system_attributes_path.get_or_init(resolve).as_deref()
    }

    pub fn cached_files(&self, path: &Path, flags: &Flags) -> Option<&[Arc<AttrFile>]> {
        self.collected_memo
            .get(&(path.to_path_buf(), flags.clone()))
            .map(Vec::as_slice)
    }

    pub fn remember_files(&mut self, path: &Path, flags: &Flags, files: Vec<Arc<AttrFile>>) {
        if self.collected_memo.len() >= MEMO_CAPACITY && !self.collected_memo.contains_key(&(path.to_path_buf(), flags.clone())) {
            // Simplest possible bound: stop growing rather than implement a
            // full LRU for a scratch object whose whole point is to be
            // short-lived.
            return;
        }
        self.collected_memo.insert((path.to_path_buf(), flags.clone()), files);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
