use domain::outcome::FileOpError;
use domain::safety_policy::SafetyPolicy;
use shared::utils::{absolutize, expand_home, is_placeholder_path};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Reads, writes, appends and deletes files behind a [`SafetyPolicy`].
///
/// Relative paths resolve against the policy's base directory. Paths that look
/// like copied template text (`/path/to/...`) are redirected into the output
/// directory under their final segment.
#[derive(Debug, Clone)]
pub struct FileBackend {
    policy: SafetyPolicy,
    output_dir: PathBuf,
}

impl FileBackend {
    pub fn new(policy: SafetyPolicy, output_dir: impl AsRef<Path>) -> Self {
        let output_dir = absolutize(output_dir.as_ref(), policy.base_dir());
        Self { policy, output_dir }
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Expands `~`, makes the path absolute and applies placeholder redirection.
    pub fn resolve_target(&self, path: &str) -> PathBuf {
        let expanded = expand_home(path);
        let absolute = absolutize(&expanded, self.policy.base_dir());

        if !looks_like_placeholder(&expanded) {
            return absolute;
        }

        let redirected = match absolute.file_name() {
            Some(name) => self.output_dir.join(name),
            None => self.output_dir.clone(),
        };
        tracing::warn!(original = path, "path appears to be a placeholder");
        tracing::warn!(target = %redirected.display(), "redirecting placeholder path");
        redirected
    }

    /// On success the message is the file content (`read`) or a confirmation.
    pub fn op(&self, action: &str, path: &str, content: Option<&str>) -> Result<String, FileOpError> {
        tracing::info!(action, path, "performing file operation");

        if path.trim().is_empty() {
            return Err(FileOpError::EmptyPath);
        }

        let target = self.resolve_target(path);
        if !self.policy.is_path_safe(&target) {
            return Err(FileOpError::Restricted(target));
        }

        let result = match action {
            "read" => read(&target),
            "write" => write(&target, content.unwrap_or(""), false),
            "append" => write(&target, content.unwrap_or(""), true),
            "delete" => delete(&target),
            other => Err(FileOpError::UnknownOperation(other.to_string())),
        };

        if let Err(err) = &result {
            tracing::error!(action, path = %target.display(), %err, "file operation failed");
        }
        result
    }
}

/// Only the path as given is inspected, never the base directory it resolves
/// against. A relative `path/to/x` is checked as if rooted.
fn looks_like_placeholder(expanded: &Path) -> bool {
    if expanded.is_absolute() {
        is_placeholder_path(expanded)
    } else {
        is_placeholder_path(&Path::new("/").join(expanded))
    }
}

fn read(target: &Path) -> Result<String, FileOpError> {
    if !target.exists() {
        return Err(FileOpError::NotFound(target.to_path_buf()));
    }
    fs::read_to_string(target).map_err(|err| io_error(target, err))
}

fn write(target: &Path, content: &str, append: bool) -> Result<String, FileOpError> {
    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|err| classify(err, dir, FileOpError::CreateDirDenied))?;
            tracing::info!(dir = %dir.display(), "created directory");
        }
    }

    let denied_or_io = |err: io::Error| classify(err, target, FileOpError::WriteDenied);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .open(target)
        .map_err(denied_or_io)?;
    file.write_all(content.as_bytes()).map_err(denied_or_io)?;

    Ok(format!("Successfully wrote to {}", target.display()))
}

fn delete(target: &Path) -> Result<String, FileOpError> {
    let metadata = match fs::symlink_metadata(target) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(FileOpError::NotFound(target.to_path_buf()));
        }
        Err(err) => return Err(io_error(target, err)),
    };

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(target)
    } else {
        fs::remove_file(target)
    };
    removed.map_err(|err| classify(err, target, FileOpError::DeleteDenied))?;

    Ok(format!("Successfully deleted {}", target.display()))
}

/// Permission failures get the stage-specific `denied` variant.
fn classify(err: io::Error, path: &Path, denied: fn(PathBuf) -> FileOpError) -> FileOpError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => denied(path.to_path_buf()),
        _ => io_error(path, err),
    }
}

fn io_error(path: &Path, err: io::Error) -> FileOpError {
    FileOpError::Io {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
