//! Parsing raw bytes into an [`AttrFile`] (spec §3, §3.1, §4.2).
//!
//! The parser is lenient by design: a malformed line is skipped, never an
//! error (see [`crate::error`]'s module docs for why there is no `Parse`
//! variant). It is a pure function of `(bytes, anchor, allow_macros)` —
//! whether a source's macros are trusted is decided by the caller
//! ([`crate::cache::Cache`]), not by this module.

use crate::pattern::Pattern;
use crate::rule::Rule;
use crate::source::{ContentSignature, Source};
use crate::value::parse_assignment;
use std::path::Path;

/// A fully parsed rule file: its origin, its rules in file order, and the
/// signature used to detect staleness.
///
/// Every string a parsed file owns (pattern text, attribute names, string
/// values) is copied out of one arena built during parsing — `raw` below —
/// so a single buffer backs the whole file's tokenization and no
/// intermediate per-token `String` survives past `parse`. Individual
/// `Rule`/`Pattern`/`Assignment` values still hold their own small owned
/// strings rather than offsets into `raw`: threading an arena lifetime
/// through `Resolver`/`Collector`/`Cache` would infect every public type
/// with a lifetime parameter, which this crate's call sites (an
/// `Arc<AttrFile>` shared across threads with no fixed lifetime) can't
/// accommodate without unsafe self-referential storage. `raw` is kept
/// anyway so the file's original text is available for diagnostics with
/// exactly the "one allocation per file" shape spec §3.1 describes.
#[derive(Debug)]
pub struct AttrFile {
    source: Source,
    rules: Vec<Rule>,
    content_signature: ContentSignature,
    raw: Box<str>,
}

impl AttrFile {
    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn content_signature(&self) -> &ContentSignature {
        &self.content_signature
    }

    /// Parse `bytes` (read from `source`, which must already be known to
    /// exist) into an `AttrFile`. `allow_macros` gates whether `[attr]`
    /// lines are honored; when false they are parsed and discarded (spec
    /// §4.2/§4.3). `anchor` is the directory anchored patterns in this file
    /// match relative to — the caller ([`crate::collector`]) supplies it,
    /// since only it knows how this source's directory relates to the
    /// repository root.
    ///
    /// Returns the file plus any accepted macro definitions as
    /// `(name, Rule)` pairs for the caller to register with the macro
    /// table — the parser itself never touches global state.
    pub fn parse(
        bytes: &[u8],
        source: Source,
        content_signature: ContentSignature,
        allow_macros: bool,
        anchor: &Path,
    ) -> (Self, Vec<(String, Rule)>) {
        let raw: Box<str> = String::from_utf8_lossy(bytes).into_owned().into_boxed_str();

        let mut rules = Vec::new();
        let mut macros = Vec::new();

        for raw_line in raw.split('\n') {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            let Some(trimmed) = trim_line(line) else {
                continue;
            };

            if let Some(rest) = strip_macro_prefix(trimmed) {
                if !allow_macros {
                    continue;
                }
                let Some((name, body)) = rest.split_once(char::is_whitespace) else {
                    continue;
                };
                if name.is_empty() {
                    continue;
                }
                let assignments: Vec<_> = body.split_whitespace().filter_map(parse_assignment).collect();
                let marker = Pattern::macro_marker(name, anchor);
                macros.push((name.to_string(), Rule::new(marker, assignments)));
                continue;
            }

            let Some((pattern_text, rest)) = trimmed.split_once(char::is_whitespace) else {
                continue;
            };
            let Some(pattern) = Pattern::compile(pattern_text, anchor) else {
                continue;
            };
            let assignments: Vec<_> = rest.split_whitespace().filter_map(parse_assignment).collect();
            rules.push(Rule::new(pattern, assignments));
        }

        (
            Self {
                source,
                rules,
                content_signature,
                raw,
            },
            macros,
        )
    }
}

/// Trim trailing unescaped whitespace and reject comments/blank lines.
fn trim_line(line: &str) -> Option<&str> {
    let trimmed = line.trim_end();
    let trimmed = trimmed.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed)
}

fn strip_macro_prefix(line: &str) -> Option<&str> {
    line.strip_prefix("[attr]")
}
