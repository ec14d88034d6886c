//! Resolution of untrusted client paths against the configured root.

use crate::{FilesError, FilesResult};
use opsdeck_util::path::normalize;
use std::path::{Path, PathBuf};

/// Resolves client-supplied paths against a configured root directory and
/// rejects any resolution that escapes it.
///
/// Resolution is purely lexical and computed fresh per request; resolved
/// paths are never cached or persisted.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver jailed to `root`.
    ///
    /// The root should already be an absolute, canonical path; the resolver
    /// compares lexically and does not consult the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the configured root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a client-supplied path to an absolute path beneath the root.
    ///
    /// The input is normalized lexically, joined onto the root, normalized
    /// again, and the result must equal the root or sit beneath it;
    /// anything else is `AccessDenied`. An input that looks absolute is
    /// treated as relative to the root -- unless the root is the
    /// filesystem root itself, where "absolute" and "rooted" coincide and
    /// the input is accepted verbatim after normalization.
    ///
    /// Empty input and inputs consisting only of separators resolve to the
    /// root itself. `AccessDenied` messages carry only the client-supplied
    /// path, never the resolved server-side path.
    pub fn resolve(&self, user_path: &str) -> FilesResult<PathBuf> {
        let trimmed = user_path.trim();

        if self.root == Path::new("/") {
            let joined = Path::new("/").join(trimmed.trim_start_matches('/'));
            let resolved = normalize(&joined);
            if resolved.is_absolute() {
                return Ok(resolved);
            }
            return Err(FilesError::AccessDenied(user_path.to_string()));
        }

        // Strip any absolute-looking lead, collapse `.`/`..`, then join and
        // re-normalize so surviving `..` segments are checked against the
        // root instead of silently clamped.
        let relative = normalize(Path::new(trimmed.trim_start_matches('/')));
        let resolved = normalize(&self.root.join(relative));

        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(FilesError::AccessDenied(user_path.to_string()))
        }
    }
}
