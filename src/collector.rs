//! Assembles the ordered attribute-file vector a query walks (spec §4.4).

use crate::cache::{Cache, SourceLoader};
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::attr_file::AttrFile;
use crate::flags::{Flags, SourceOrder};
use crate::repo::{ancestors, Repository};
use crate::session::Session;
use crate::source::Source;
use std::path::Path;
use std::sync::Arc;

/// Build the highest-to-lowest-precedence file vector for `query_path`.
///
/// Order: `$GIT_DIR/info/attributes`, then per-directory files from
/// `query_path`'s directory up to the work-tree root, then the configured
/// extra file, then the system file (unless `NO_SYSTEM`). Missing files at
/// any level contribute nothing and do not abort the walk.
pub fn collect(
    repository: &dyn Repository,
    session: &Session,
    cache: &Cache,
    loader: &dyn SourceLoader,
    flags: &Flags,
    query_path: &Path,
) -> Result<Vec<Arc<AttrFile>>> {
    collect_cancellable(repository, session, cache, loader, flags, query_path, &CancellationToken::new())
}

/// As [`collect`], but checked against `cancel` between every file load.
pub fn collect_cancellable(
    repository: &dyn Repository,
    session: &Session,
    cache: &Cache,
    loader: &dyn SourceLoader,
    flags: &Flags,
    query_path: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<Arc<AttrFile>>> {
    let mut files = Vec::new();
    let workdir = repository.workdir();
    // Patterns in the info/extra/system files anchor at the work-tree root,
    // same as a root-level `.gitattributes` would (spec §4.1/§4.4) — they
    // don't live inside the tree they describe.
    let root_anchor = workdir.unwrap_or(Path::new(""));

    if let Some(info_path) = repository.info_attributes_path() {
        load_into(&mut files, cache, loader, &file_source(&info_path), true, root_anchor, cancel)?;
    }

    if let Some(workdir) = workdir.filter(|_| !repository.is_bare()) {
        let start_dir = query_path.parent().unwrap_or(query_path);
        for dir in ancestors(start_dir, workdir) {
            let at_root = dir == workdir;
            collect_directory(&mut files, repository, cache, loader, flags, &dir, at_root, cancel)?;
        }
    } else if flags.source_order() != SourceOrder::FileThenIndex || flags.include_head() {
        // Bare repository: only index/commit-backed lookups make sense, and
        // there is no per-directory walk to anchor them to — consult the
        // index/HEAD directly at the query path's directory.
        collect_directory_bare(&mut files, cache, loader, flags, query_path, cancel)?;
    }

    if let Some(extra_path) = repository.attributes_extra_path() {
        load_into(&mut files, cache, loader, &file_source(&extra_path), true, root_anchor, cancel)?;
    }

    if !flags.no_system() {
        if let Some(system_path) = session.system_attributes_path(|| None) {
            load_into(&mut files, cache, loader, &file_source(system_path), true, root_anchor, cancel)?;
        }
    }

    Ok(files)
}

fn file_source(path: &Path) -> Source {
    let base_dir = path.parent().unwrap_or(Path::new(""));
    let filename = path.file_name().map_or_else(|| path.to_path_buf(), std::path::PathBuf::from);
    Source::filesystem(base_dir, filename)
}

const ATTRIBUTES_FILE_NAME: &str = ".gitattributes";

/// Macros are trusted only at the work-tree root, and even there only for
/// the working-tree file itself — never for an index or commit blob at any
/// directory level (spec §4.3).
#[allow(clippy::too_many_arguments)]
fn collect_directory(
    files: &mut Vec<Arc<AttrFile>>,
    repository: &dyn Repository,
    cache: &Cache,
    loader: &dyn SourceLoader,
    flags: &Flags,
    dir: &Path,
    at_root: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let full_path = dir.join(ATTRIBUTES_FILE_NAME);
    let index_path = repository_relative_path(repository, dir);

    let load_file = |files: &mut Vec<Arc<AttrFile>>| {
        load_into(files, cache, loader, &file_source(&full_path), at_root, dir, cancel)
    };
    let load_index = |files: &mut Vec<Arc<AttrFile>>| {
        load_into(files, cache, loader, &Source::index_blob(index_path.clone()), false, dir, cancel)
    };

    match flags.source_order() {
        SourceOrder::FileThenIndex => {
            load_file(files)?;
            load_index(files)?;
        }
        SourceOrder::IndexThenFile => {
            load_index(files)?;
            load_file(files)?;
        }
        SourceOrder::IndexOnly => {
            load_index(files)?;
        }
    }

    if flags.include_head() {
        load_into(files, cache, loader, &Source::commit_blob("HEAD", index_path.clone()), false, dir, cancel)?;
    }
    if let Some(commit) = flags.include_commit() {
        load_into(files, cache, loader, &Source::commit_blob(commit.to_string(), index_path), false, dir, cancel)?;
    }

    Ok(())
}

fn collect_directory_bare(
    files: &mut Vec<Arc<AttrFile>>,
    cache: &Cache,
    loader: &dyn SourceLoader,
    flags: &Flags,
    query_path: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let dir = query_path.parent().unwrap_or(Path::new(""));
    let path = dir.join(ATTRIBUTES_FILE_NAME);
    // Index/commit blobs are never trusted for macros, at any directory
    // level (spec §4.3) — a bare repository has no working-tree file to be
    // the one exception.
    load_into(files, cache, loader, &Source::index_blob(path.clone()), false, dir, cancel)?;
    if flags.include_head() {
        load_into(files, cache, loader, &Source::commit_blob("HEAD", path), false, dir, cancel)?;
    }
    Ok(())
}

/// `dir/.gitattributes` expressed relative to the work-tree root, the form
/// an index or commit tree addresses paths by.
fn repository_relative_path(repository: &dyn Repository, dir: &Path) -> std::path::PathBuf {
    let relative_dir = repository
        .workdir()
        .and_then(|root| dir.strip_prefix(root).ok())
        .unwrap_or(Path::new(""));
    relative_dir.join(ATTRIBUTES_FILE_NAME)
}

#[allow(clippy::too_many_arguments)]
fn load_into(
    files: &mut Vec<Arc<AttrFile>>,
    cache: &Cache,
    loader: &dyn SourceLoader,
    source: &Source,
    trust_macros: bool,
    anchor: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(crate::error::Error::Cancelled);
    }
    if let Some(file) = cache.get(source, trust_macros, anchor, loader)? {
        files.push(file);
    }
    Ok(())
}
