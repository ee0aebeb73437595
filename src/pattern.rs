//! Glob pattern compilation and matching (spec §4.1).
//!
//! Compilation is delegated to [`globset`] — the teacher crate's own
//! pattern-matching dependency — which already implements the well-known
//! shell-glob dialect (`*`, `**`, `?`, bracket classes, `\x` escapes). This
//! module only has to express the gitattributes-specific bookkeeping layered
//! on top: negation, directory-only matching, anchoring, and the
//! basename-vs-anchored split, following the same `trim` / `!` / trailing
//! `/` / leading `/` pipeline as
//! `scriptedworld-raptar::rules::analyze_pattern` and
//! `houseabsolute-precious::gitignore::ruleset::parse_line`.

use globset::{Glob, GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};

/// Minimal hand-rolled bitflags, since this crate's dependency stack (see
/// DESIGN.md) doesn't carry the `bitflags` crate and a single `u8` mask
/// doesn't warrant adding one.
macro_rules! bitflags_lite {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(
                $(#[$field_meta:meta])*
                const $field:ident = $value:expr;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name($ty);

        impl $name {
            $(
                $(#[$field_meta])*
                pub const $field: Self = Self($value);
            )*

            pub const fn empty() -> Self {
                Self(0)
            }

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

bitflags_lite! {
    /// Bitmask of flags recorded alongside a compiled pattern (spec §3).
    pub struct PatternFlags: u8 {
        const NEGATE = 1 << 0;
        const DIRECTORY_ONLY = 1 << 1;
        const ANCHORED = 1 << 2;
        const HAS_WILDCARDS = 1 << 3;
        /// Set on the synthetic [`Pattern`] that carries a `[attr]name`
        /// macro definition's name. Macro rules are never matched against a
        /// path directly — the resolver only walks [`crate::attr_file::AttrFile::rules`],
        /// never `macros` — this flag exists purely so the data shape
        /// matches spec §3's description of the bitmask.
        const IS_MACRO = 1 << 4;
    }
}

/// A compiled glob line: the literal text, its flags, the directory the
/// owning attribute file lives in (needed to resolve anchored patterns), and
/// the compiled matcher(s). A directory-only pattern carries a second,
/// widened matcher for its contents — see [`Pattern::matches`].
#[derive(Debug, Clone)]
pub struct Pattern {
    text: Box<str>,
    flags: PatternFlags,
    base_dir: PathBuf,
    matcher: GlobMatcher,
    contents_matcher: Option<GlobMatcher>,
}

impl Pattern {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    pub fn is_negated(&self) -> bool {
        self.flags.contains(PatternFlags::NEGATE)
    }

    pub fn is_directory_only(&self) -> bool {
        self.flags.contains(PatternFlags::DIRECTORY_ONLY)
    }

    pub fn is_anchored(&self) -> bool {
        self.flags.contains(PatternFlags::ANCHORED)
    }

    pub fn is_macro(&self) -> bool {
        self.flags.contains(PatternFlags::IS_MACRO)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Compile one non-comment, non-empty line into a `Pattern`. `base_dir`
    /// is the directory containing the attribute file the line came from.
    ///
    /// Returns `None` only on a malformed glob (the parser otherwise never
    /// fails — see `crate::attr_file`); callers skip the line in that case.
    pub fn compile(line: &str, base_dir: &Path) -> Option<Self> {
        let mut text = line;

        let negate = text.starts_with('!') && !text.starts_with(r"\!");
        if negate {
            text = &text[1..];
        }

        let dir_only = ends_with_unescaped_slash(text);
        if dir_only {
            text = &text[..text.len() - 1];
        }

        // Anchored iff there's a `/` anywhere except trailing (already
        // stripped above). A leading `/` also anchors and is consumed.
        let leading_slash = text.starts_with('/');
        let body = text.strip_prefix('/').unwrap_or(text);
        let anchored = leading_slash || body.contains('/');

        let unescaped = unescape(body);
        if unescaped.is_empty() {
            return None;
        }

        let has_wildcards = contains_wildcard(&unescaped);

        // Build the globset pattern. Anchored patterns fold `base_dir` into
        // the glob text, so a rule from a nested `.gitattributes` only
        // matches candidates under that directory; basename patterns get a
        // `**/` prefix instead so they match the last path component at any
        // depth regardless of base_dir (mirrors `analyze_pattern`'s
        // "universal" bucket).
        let glob_text = if anchored {
            anchor_prefixed(base_dir, &unescaped)
        } else {
            format!("**/{unescaped}")
        };

        let glob = build_glob(&glob_text, anchored)?;

        // Directory-only patterns should also match the directory's
        // contents, not just the directory entry itself — compile a second,
        // widened `{glob_text}/**` matcher for that, same trick
        // `houseabsolute-precious` uses for `foo/**` patterns. Kept separate
        // from `matcher` so `matches` can still tell a literal directory hit
        // from a descendant one (the former needs `is_dir`, the latter
        // doesn't).
        let contents_matcher = dir_only
            .then(|| build_glob(&format!("{glob_text}/**"), anchored))
            .flatten()
            .map(Glob::compile_matcher);

        let mut flags = PatternFlags::empty();
        if negate {
            flags |= PatternFlags::NEGATE;
        }
        if dir_only {
            flags |= PatternFlags::DIRECTORY_ONLY;
        }
        if anchored {
            flags |= PatternFlags::ANCHORED;
        }
        if has_wildcards {
            flags |= PatternFlags::HAS_WILDCARDS;
        }

        Some(Self {
            text: unescaped.into_boxed_str(),
            flags,
            base_dir: base_dir.to_path_buf(),
            matcher: glob.compile_matcher(),
            contents_matcher,
        })
    }

    /// Build the synthetic pattern carrying a macro's name (spec §4.2).
    /// Never matched against a path; `IS_MACRO` is set so its shape agrees
    /// with spec §3.
    pub fn macro_marker(name: &str, base_dir: &Path) -> Self {
        // A trivial matcher that never matches anything real; macro
        // "patterns" are looked up by name, never tested against a path.
        let glob = Glob::new(&globset::escape(name)).expect("escaped literal is always valid");
        Self {
            text: name.into(),
            flags: PatternFlags::IS_MACRO,
            base_dir: base_dir.to_path_buf(),
            matcher: glob.compile_matcher(),
            contents_matcher: None,
        }
    }

    /// Test whether this pattern matches `path`. `path` must be expressed in
    /// the same coordinate system `base_dir` was given in at compile time
    /// (the crate uses absolute filesystem paths throughout, so in practice
    /// both are absolute). `is_dir` tells whether the candidate is a
    /// directory.
    ///
    /// A directory-only pattern matches two distinct shapes: the directory
    /// entry itself (only when `is_dir` is set) and anything nested under
    /// it (regardless of `is_dir`, via `contents_matcher`) — so `build/`
    /// matches both the directory `build` and a file `build/output.txt`.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        if self.is_directory_only() {
            if is_dir && self.matcher.is_match(path) {
                return true;
            }
            return self.contents_matcher.as_ref().is_some_and(|m| m.is_match(path));
        }
        self.matcher.is_match(path)
    }
}

/// Fold `base_dir` into an anchored pattern's glob text, so a rule defined in
/// a subdirectory only matches candidates under that subdirectory. `base_dir`
/// empty (the repository root) leaves `pattern` untouched.
fn anchor_prefixed(base_dir: &Path, pattern: &str) -> String {
    if base_dir.as_os_str().is_empty() {
        return pattern.to_string();
    }
    format!("{}/{pattern}", globset::escape(&base_dir.to_string_lossy()))
}

fn ends_with_unescaped_slash(text: &str) -> bool {
    if !text.ends_with('/') {
        return false;
    }
    let backslashes = text[..text.len() - 1]
        .bytes()
        .rev()
        .take_while(|&b| b == b'\\')
        .count();
    backslashes % 2 == 0
}

fn contains_wildcard(text: &str) -> bool {
    text.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
}

/// Resolve `\x` escapes to literal `x`, the only escaping the dialect
/// defines (spec §4.1).
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                out.push(next);
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn build_glob(text: &str, anchored: bool) -> Option<Glob> {
    GlobBuilder::new(text)
        .literal_separator(anchored)
        .build()
        .ok()
}
