//! Lexical path helpers.

use std::path::{Component, Path, PathBuf};

/// Get the opsdeck data directory.
///
/// This follows XDG conventions:
/// - `$XDG_DATA_HOME/opsdeck` if set
/// - `~/.local/share/opsdeck` otherwise
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("opsdeck"))
}

/// Normalize a path lexically: drop `.` segments and collapse `..` against
/// preceding normal segments.
///
/// Unlike `canonicalize`, this doesn't require the path to exist. A `..`
/// that has nothing to collapse against is kept on relative paths (so
/// escape attempts stay visible to containment checks) and dropped at the
/// filesystem root, which has no parent.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(Component::ParentDir),
            },
            _ => parts.push(component),
        }
    }

    parts.into_iter().collect()
}

/// Make a path relative to a base directory.
///
/// Returns `None` if the path is not within the base directory.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}
