use std::path::{Component, Path, PathBuf};

// Example paths a model copies out of its own instructions.
const PLACEHOLDER_MARKERS: [&str; 2] = ["/path/to/", "/your/"];

/// Expands a leading `~` to the current user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Makes `path` absolute against `base` and folds `.` and `..` lexically.
/// Symlinks are not resolved, so the result is stable for paths that do not
/// exist yet.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

pub fn is_placeholder_path(path: &Path) -> bool {
    let text = path.to_string_lossy();
    PLACEHOLDER_MARKERS.iter().any(|marker| text.contains(marker))
}
