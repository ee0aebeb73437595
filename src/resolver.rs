//! Attribute lookup over an already-collected file vector (spec §4.5).
//!
//! Operates on the `Vec<Arc<AttrFile>>` [`crate::collector`] produces:
//! highest-precedence file first. Within one file, a later matching rule
//! overrides an earlier one for the same attribute (per
//! [`crate::attr_file::AttrFile`]'s own ordering invariant); across files,
//! the first file with any opinion wins.

use crate::attr_file::AttrFile;
use crate::cache::Cache;
use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::rule::Rule;
use crate::value::{find_assignment, AttributeValue};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Value `name` takes at `path`, or `UNSPECIFIED` if no rule opines.
pub fn get(files: &[Arc<AttrFile>], cache: &Cache, path: &Path, is_dir: bool, name: &str) -> AttributeValue {
    get_cancellable(files, cache, path, is_dir, name, &CancellationToken::new())
        .unwrap_or(AttributeValue::Unspecified)
}

/// As [`get`], checked against `cancel` between files.
pub fn get_cancellable(
    files: &[Arc<AttrFile>],
    cache: &Cache,
    path: &Path,
    is_dir: bool,
    name: &str,
    cancel: &CancellationToken,
) -> Result<AttributeValue> {
    for file in files {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let value = file_value(file, cache, path, is_dir, name, cancel)?;
        if !value.is_unspecified() {
            return Ok(value);
        }
    }
    Ok(AttributeValue::Unspecified)
}

/// Batched lookup: `result[i]` is `get(files, ..., names[i])`. Never
/// partially fills its output on error — spec §7.
pub fn get_many(
    files: &[Arc<AttrFile>],
    cache: &Cache,
    path: &Path,
    is_dir: bool,
    names: &[&str],
) -> Vec<AttributeValue> {
    get_many_cancellable(files, cache, path, is_dir, names, &CancellationToken::new())
        .unwrap_or_else(|_| vec![AttributeValue::Unspecified; names.len()])
}

pub fn get_many_cancellable(
    files: &[Arc<AttrFile>],
    cache: &Cache,
    path: &Path,
    is_dir: bool,
    names: &[&str],
    cancel: &CancellationToken,
) -> Result<Vec<AttributeValue>> {
    let mut results = vec![AttributeValue::Unspecified; names.len()];
    let mut remaining = names.len();
    'files: for file in files {
        if remaining == 0 {
            break;
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        for (i, name) in names.iter().enumerate() {
            if !results[i].is_unspecified() {
                continue;
            }
            let value = file_value(file, cache, path, is_dir, name, cancel)?;
            if !value.is_unspecified() {
                results[i] = value;
                remaining -= 1;
                if remaining == 0 {
                    break 'files;
                }
            }
        }
    }
    Ok(results)
}

/// Invoke `callback(name, value)` once per attribute name mentioned by any
/// matching rule, in first-seen (= highest precedence) order. Stops early if
/// `callback` returns non-zero; that value is returned.
pub fn foreach<F>(
    files: &[Arc<AttrFile>],
    cache: &Cache,
    path: &Path,
    is_dir: bool,
    callback: F,
) -> Result<i32>
where
    F: FnMut(&str, &AttributeValue) -> i32,
{
    foreach_cancellable(files, cache, path, is_dir, callback, &CancellationToken::new())
}

pub fn foreach_cancellable<F>(
    files: &[Arc<AttrFile>],
    cache: &Cache,
    path: &Path,
    is_dir: bool,
    mut callback: F,
    cancel: &CancellationToken,
) -> Result<i32>
where
    F: FnMut(&str, &AttributeValue) -> i32,
{
    let mut seen = HashSet::new();
    for file in files {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        for name in names_mentioned(file, cache, path, is_dir) {
            if seen.contains(&name) {
                continue;
            }
            let value = file_value(file, cache, path, is_dir, &name, cancel)?;
            if value.is_unspecified() {
                continue;
            }
            seen.insert(name.clone());
            let status = callback(&name, &value);
            if status != 0 {
                return Err(Error::CallbackAborted(status));
            }
        }
    }
    Ok(0)
}

/// This file's answer for `name`: the last matching, non-negated rule that
/// mentions it (directly or via macro expansion), or `UNSPECIFIED`.
fn file_value(
    file: &AttrFile,
    cache: &Cache,
    path: &Path,
    is_dir: bool,
    name: &str,
    cancel: &CancellationToken,
) -> Result<AttributeValue> {
    let mut value = AttributeValue::Unspecified;
    for rule in file.rules() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if !rule.pattern().matches(path, is_dir) {
            continue;
        }
        let candidate = rule_value_with_macros(rule, cache, name);
        if !candidate.is_unspecified() {
            value = candidate;
        }
    }
    Ok(value)
}

/// Attribute names any matching, non-negated rule in `file` mentions
/// (directly or via macro expansion), in file order, each listed once.
fn names_mentioned(file: &AttrFile, cache: &Cache, path: &Path, is_dir: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    let mut push = |name: &str, seen: &mut HashSet<String>, names: &mut Vec<String>| {
        if seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    };
    for rule in file.rules() {
        if rule.pattern().is_negated() || !rule.pattern().matches(path, is_dir) {
            continue;
        }
        for assignment in rule.assignments() {
            push(&assignment.name, &mut seen, &mut names);
            if assignment.value == AttributeValue::True {
                if let Some(macro_rule) = cache.lookup_macro(&assignment.name) {
                    for macro_assignment in macro_rule.assignments() {
                        push(&macro_assignment.name, &mut seen, &mut names);
                    }
                }
            }
        }
    }
    names
}

/// Value `name` takes from one matching rule, expanding a macro reference at
/// match time if the rule sets a registered macro name to `TRUE` (spec
/// §4.5). A direct assignment on the rule itself takes precedence over one
/// supplied through macro expansion.
fn rule_value_with_macros(rule: &Rule, cache: &Cache, name: &str) -> AttributeValue {
    if rule.pattern().is_negated() {
        return AttributeValue::Unspecified;
    }
    if let Some(assignment) = find_assignment(rule.assignments(), name) {
        return assignment.value.clone();
    }
    for assignment in rule.assignments() {
        if assignment.value != AttributeValue::True {
            continue;
        }
        if let Some(macro_rule) = cache.lookup_macro(&assignment.name) {
            if let Some(macro_assignment) = find_assignment(macro_rule.assignments(), name) {
                return macro_assignment.value.clone();
            }
        }
    }
    AttributeValue::Unspecified
}
