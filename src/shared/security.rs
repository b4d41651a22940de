use crate::shared::error::PipelineError;
use crate::shared::Result;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Maximum size of a generated BOM artifact accepted for upload (100 MB)
pub const MAX_ARTIFACT_SIZE: u64 = 100 * 1024 * 1024;

/// Validates that a path exists and is a regular file (not a directory or symlink)
pub fn validate_regular_file(path: &Path, file_description: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {} metadata: {}", file_description, e))?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, symbolic links are not allowed.",
            path.display()
        );
    }

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    Ok(())
}

/// Validates file size is within acceptable limits
pub fn validate_file_size(file_size: u64, path: &Path, max_size: u64) -> Result<()> {
    if file_size > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            file_size,
            max_size
        );
    }
    Ok(())
}

/// Normalizes an archive member name into a relative path that stays inside
/// the extraction root.
///
/// Both `/` and `\` are treated as separators so that archives produced on
/// Windows cannot smuggle a traversal past the check. `.` segments are
/// dropped and `..` segments are resolved lexically; a `..` that would climb
/// above the root is rejected.
///
/// # Errors
/// `PathTraversal` for absolute paths, drive-letter paths, NUL bytes, or any
/// path resolving outside the root.
pub fn sanitize_member_path(raw: &str) -> std::result::Result<PathBuf, PipelineError> {
    let traversal = || PipelineError::PathTraversal {
        member: raw.to_string(),
    };

    if raw.contains('\0') || raw.starts_with('/') || raw.starts_with('\\') {
        return Err(traversal());
    }

    let bytes = raw.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Err(traversal());
    }

    let mut parts: Vec<&str> = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                if parts.pop().is_none() {
                    return Err(traversal());
                }
            }
            other => parts.push(other),
        }
    }

    let normalized: PathBuf = parts.iter().collect();

    // Only plain components may remain.
    if normalized
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(traversal());
    }

    Ok(normalized)
}

/// Resolves `candidate` and checks that it is an existing directory at or
/// below `root`. Returns the canonical path.
pub fn ensure_dir_within(root: &Path, candidate: &Path) -> std::result::Result<PathBuf, PipelineError> {
    let canonical_root = root
        .canonicalize()
        .map_err(|e| PipelineError::io(root, e))?;
    let canonical = candidate
        .canonicalize()
        .map_err(|e| PipelineError::io(candidate, e))?;

    if !canonical.starts_with(&canonical_root) {
        return Err(PipelineError::PathTraversal {
            member: candidate.display().to_string(),
        });
    }

    if !canonical.is_dir() {
        return Err(PipelineError::io(
            candidate,
            std::io::Error::other("not a directory"),
        ));
    }

    Ok(canonical)
}
