use shared::utils::absolutize;
use std::path::{Path, PathBuf};

/// Paths blocked when no restricted list is configured.
pub const DEFAULT_RESTRICTED_PATHS: [&str; 7] = [
    "/etc/passwd",
    "/etc/shadow",
    "/boot",
    "/etc/sudoers",
    "/etc/ssh",
    "/root",
    "/var/log/auth.log",
];

/// Forbids access to a set of restricted path prefixes.
///
/// Relative paths, both the checked ones and restricted entries, are resolved
/// against `base_dir` (the working directory at construction time). Matching
/// is component-wise, so `/etc/sshd` is not covered by `/etc/ssh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyPolicy {
    restricted: Vec<PathBuf>,
    base_dir: PathBuf,
}

impl SafetyPolicy {
    pub fn new() -> Self {
        Self::with_restricted_paths(DEFAULT_RESTRICTED_PATHS)
    }

    pub fn with_restricted_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self::with_base_dir(paths, base_dir)
    }

    pub fn with_base_dir<I, P>(paths: I, base_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let base_dir = base_dir.into();
        let restricted = paths
            .into_iter()
            .map(|p| absolutize(p.as_ref(), &base_dir))
            .collect();
        Self {
            restricted,
            base_dir,
        }
    }

    pub fn restricted_paths(&self) -> &[PathBuf] {
        &self.restricted
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn is_path_safe(&self, path: &Path) -> bool {
        let resolved = absolutize(path, &self.base_dir);
        match self.restricted.iter().find(|r| resolved.starts_with(r)) {
            Some(prefix) => {
                tracing::warn!(
                    path = %resolved.display(),
                    restricted = %prefix.display(),
                    "access to restricted path denied"
                );
                false
            }
            None => true,
        }
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::new()
    }
}
