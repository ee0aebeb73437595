//! Process-wide cache keyed by [`Fingerprint`], plus the macro table it owns
//! (spec §3, §4.3).

use crate::attr_file::AttrFile;
use crate::error::{Error, Result};
use crate::rule::Rule;
use crate::source::{ContentSignature, Fingerprint, Source};
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, trace};

/// Reads and stats a [`Source`]. Implemented by [`crate::repo::FsRepository`]
/// and by test doubles; kept separate from `Repository` so the cache doesn't
/// need to know about the rest of the repository surface.
pub trait SourceLoader: Send + Sync {
    /// Cheap existence/change check. `Ok(None)` means the source does not
    /// currently exist.
    fn stat(&self, source: &Source) -> std::io::Result<Option<ContentSignature>>;

    /// Read the full contents. Only called once `stat` has indicated the
    /// source exists and is either new or changed.
    fn read(&self, source: &Source) -> std::io::Result<Vec<u8>>;
}

enum Slot {
    Missing,
    Present {
        signature: ContentSignature,
        file: Arc<AttrFile>,
    },
}

/// Per-key lock: held for the duration of a stat-check-and-possibly-reparse,
/// giving single-flight semantics per fingerprint while distinct
/// fingerprints proceed fully in parallel (spec §4.3).
struct Entry(Mutex<Slot>);

/// The process-wide attribute-file cache.
pub struct Cache {
    entries: DashMap<Fingerprint, Arc<Entry>>,
    macros: RwLock<HashMap<String, Rule>>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            macros: RwLock::new(HashMap::new()),
        }
    }

    /// Return the parsed `AttrFile` for `source`, loading and parsing it (or
    /// reusing a still-fresh cached parse) as needed. `Ok(None)` means the
    /// source does not exist — this is not an error, Collector simply skips
    /// it (spec §4.3/§4.4). `anchor` is the directory this source's anchored
    /// patterns match relative to; see [`AttrFile::parse`].
    pub fn get(
        &self,
        source: &Source,
        allow_macros: bool,
        anchor: &Path,
        loader: &dyn SourceLoader,
    ) -> Result<Option<Arc<AttrFile>>> {
        let fingerprint = source.fingerprint();
        let entry = self
            .entries
            .entry(fingerprint.clone())
            .or_insert_with(|| Arc::new(Entry(Mutex::new(Slot::Missing))))
            .clone();

        let mut slot = entry.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let fresh_signature = loader.stat(source).map_err(|e| Error::Io {
            path: source.display_path(),
            source: e,
        })?;

        let Some(fresh_signature) = fresh_signature else {
            trace!(?fingerprint, "source missing, caching negative entry");
            *slot = Slot::Missing;
            return Ok(None);
        };

        if let Slot::Present { signature, file } = &*slot {
            if *signature == fresh_signature {
                trace!(?fingerprint, "cache hit");
                return Ok(Some(file.clone()));
            }
        }

        debug!(?fingerprint, "parsing source");
        let bytes = loader.read(source).map_err(|e| Error::Io {
            path: source.display_path(),
            source: e,
        })?;
        let (file, macros) = AttrFile::parse(&bytes, source.clone(), fresh_signature.clone(), allow_macros, anchor);
        let file = Arc::new(file);

        for (name, rule) in macros {
            self.register_macro(name, rule);
        }

        *slot = Slot::Present {
            signature: fresh_signature,
            file: file.clone(),
        };
        Ok(Some(file))
    }

    pub(crate) fn register_macro(&self, name: String, rule: Rule) {
        trace!(macro_name = %name, "registering macro");
        self.macros.write().unwrap_or_else(std::sync::PoisonError::into_inner).insert(name, rule);
    }

    /// Look up a macro by name, expanding `[attr]name` references at match
    /// time (spec §4.5).
    pub fn lookup_macro(&self, name: &str) -> Option<Rule> {
        self.macros
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Drop every cached parse. Macro definitions survive a flush — they
    /// come only from trusted sources and are cheap to re-validate lazily
    /// the next time that source is re-fetched.
    pub fn flush(&self) {
        debug!("flushing attribute file cache");
        self.entries.clear();
    }

    /// Drop the cached parse for one named `source`, without touching the
    /// rest of the cache. Unlike [`Cache::flush`], this names a resource the
    /// caller expects to already be cached, so the absence of one is an
    /// error rather than a silent no-op.
    pub fn flush_source(&self, source: &Source) -> Result<()> {
        let fingerprint = source.fingerprint();
        trace!(?fingerprint, "flushing single cache entry");
        self.entries
            .remove(&fingerprint)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(source.display_path().display().to_string()))
    }
}
