use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::UNIX_EPOCH;

use log::{debug, warn};

/// Cache-busting asset versioning for `FilePath("...")` path
/// expressions and the `filetime` filter. Results are memoized per
/// engine instance; the memo is idempotent and never invalidated
/// within a process run.
#[derive(Debug, Default)]
pub(crate) struct AssetResolver {
    root: Option<PathBuf>,
    cache: RwLock<HashMap<String, String>>,
}

impl AssetResolver {
    pub(crate) fn new(root: Option<PathBuf>) -> Self {
        AssetResolver { root, cache: RwLock::new(HashMap::new()) }
    }

    /// `path` -> `path?v=<mtime>` when the asset exists under the
    /// configured root, `path` unchanged otherwise.
    pub(crate) fn version(&self, path: &str) -> String {
        let cache = self.cache.read().unwrap_or_else(|poison| poison.into_inner());
        if let Some(hit) = cache.get(path) {
            return hit.clone();
        }
        drop(cache);
        let stamped = self.stamp(path);
        self.cache
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .insert(path.to_owned(), stamped.clone());
        stamped
    }

    fn stamp(&self, path: &str) -> String {
        let root = match &self.root {
            Some(root) => root,
            None => return path.to_owned(),
        };
        match fs::metadata(root.join(path)).and_then(|meta| meta.modified()) {
            Ok(modified) => match modified.duration_since(UNIX_EPOCH) {
                Ok(age) => format!("{}?v={}", path, age.as_secs()),
                Err(_) => path.to_owned(),
            },
            Err(err) => {
                debug!("asset {} has no modification time: {}", path, err);
                path.to_owned()
            }
        }
    }
}

/// Extracts and validates the argument of a `FilePath("...")` call.
/// Returns None (with a diagnostic) on malformed syntax, an empty
/// argument, or a traversal attempt.
pub(crate) fn parse_call(text: &str) -> Option<String> {
    let inner = match text
        .strip_prefix("FilePath(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => inner.trim(),
        None => {
            warn!("malformed FilePath call left verbatim: {}", text);
            return None;
        }
    };
    let path = strip_quotes(inner);
    if path.is_empty() {
        warn!("FilePath call with empty argument left verbatim: {}", text);
        return None;
    }
    if path.contains("..") || path.contains('\0') {
        warn!("unsafe FilePath argument rejected: {}", path);
        return None;
    }
    Some(path.to_owned())
}

fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 {
        let bytes = text.as_bytes();
        if (bytes[0] == b'"' && bytes[text.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[text.len() - 1] == b'\'')
        {
            return &text[1..text.len() - 1];
        }
    }
    text
}
