//! Mutating filesystem operations, each confined to one area.
//!
//! All functions take the area base directory and user supplied relative
//! paths, sandbox them, and return a [`FileOpError`] instead of panicking or
//! propagating raw I/O failures to the caller's caller.

use log::{error, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{FileOpError, FileOpResult};
use crate::validation::{extension_of, relative_display, safe_join, resolve_within, sanitize_filename};

/// Move `origin_rel` to `dest_rel` inside `base` and return the final relative path.
///
/// A destination that is the area root or an existing directory receives the
/// origin under its own name; anything else is taken literally, which makes
/// "move" double as "rename". Existing targets are never overwritten and
/// missing parent directories are never created.
pub fn move_entry(base: &Path, origin_rel: &str, dest_rel: &str) -> FileOpResult<String> {
    let base = base.canonicalize()?;
    let origin = safe_join(&base, origin_rel)?;
    if !origin.exists() {
        return Err(FileOpError::NotFound(origin_rel.to_string()));
    }
    if origin == base {
        return Err(FileOpError::BaseDirectoryProtected);
    }

    let dest = safe_join(&base, dest_rel)?;
    let effective = if dest == base || dest.is_dir() {
        let name = origin.file_name().ok_or(FileOpError::BaseDirectoryProtected)?;
        resolve_within(&base, &dest.join(name))?
    } else {
        dest
    };

    if effective == origin {
        return Err(FileOpError::NoOp);
    }
    if effective.exists() {
        return Err(FileOpError::Collision { is_dir: effective.is_dir() });
    }
    match effective.parent() {
        Some(parent) if parent.is_dir() => {}
        _ => return Err(FileOpError::MissingParent),
    }
    if effective.starts_with(&origin) {
        return Err(FileOpError::IntoItself);
    }

    relocate(&origin, &effective).map_err(|e| {
        error!("Error moving {} to {}: {}", origin.display(), effective.display(), e);
        FileOpError::Io(e)
    })?;
    let final_rel = relative_display(&base, &effective);
    info!("Moved {} -> {}", origin_rel, final_rel);
    Ok(final_rel)
}

/// Rename, falling back to copy + remove across filesystems.
///
/// The fallback is not atomic: if the removal fails both copies remain and
/// the error is reported as-is.
fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            warn!("{} and {} are on different filesystems, copying", from.display(), to.display());
            copy_recursive(from, to)?;
            if from.is_dir() { fs::remove_dir_all(from) } else { fs::remove_file(from) }
        }
        Err(e) => Err(e),
    }
}

fn copy_recursive(from: &Path, to: &Path) -> io::Result<()> {
    if from.is_dir() {
        fs::create_dir(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(from, to).map(|_| ())
    }
}

/// Delete a file, or a directory recursively.
pub fn delete_entry(base: &Path, relative: &str) -> FileOpResult<()> {
    let base = base.canonicalize()?;
    let target = safe_join(&base, relative)?;
    if target == base {
        return Err(FileOpError::BaseDirectoryProtected);
    }
    if !target.exists() {
        return Err(FileOpError::NotFound(relative.to_string()));
    }
    let result = if target.is_dir() { fs::remove_dir_all(&target) } else { fs::remove_file(&target) };
    result.map_err(|e| {
        error!("Error deleting {}: {}", target.display(), e);
        FileOpError::Io(e)
    })?;
    info!("Deleted {}", relative);
    Ok(())
}

/// Rename a file in place. The new name is sanitized with the file's current
/// extension as the expected one; directories are rejected.
pub fn rename_file(base: &Path, relative: &str, new_name: &str) -> FileOpResult<String> {
    let base = base.canonicalize()?;
    let source = safe_join(&base, relative)?;
    if source == base {
        return Err(FileOpError::BaseDirectoryProtected);
    }
    if !source.exists() {
        return Err(FileOpError::NotFound(relative.to_string()));
    }
    if source.is_dir() {
        return Err(FileOpError::Unsupported("rename a directory"));
    }

    let current_name = source.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let sanitized = sanitize_filename(new_name, extension_of(&current_name), Some(current_name.as_str()))?;
    let parent = source.parent().ok_or(FileOpError::BaseDirectoryProtected)?;
    let dest = resolve_within(&base, &parent.join(&sanitized))?;

    if dest == source {
        return Err(FileOpError::NoOp);
    }
    if dest.exists() {
        return Err(FileOpError::Collision { is_dir: dest.is_dir() });
    }

    fs::rename(&source, &dest).map_err(|e| {
        error!("Error renaming {} to {}: {}", source.display(), dest.display(), e);
        FileOpError::Io(e)
    })?;
    let final_rel = relative_display(&base, &dest);
    info!("Renamed {} -> {}", relative, final_rel);
    Ok(final_rel)
}

/// Create a directory (and any missing parents) inside the area.
pub fn make_dir(base: &Path, relative: &str) -> FileOpResult<String> {
    let base = base.canonicalize()?;
    let target = safe_join(&base, relative)?;
    fs::create_dir_all(&target).map_err(|e| {
        error!("Error creating directory {}: {}", target.display(), e);
        FileOpError::Io(e)
    })?;
    info!("Created directory {}", target.display());
    Ok(relative_display(&base, &target))
}

/// Where an upload goes, derived from its caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub dir: PathBuf,
    pub file_name: String,
    /// Set when the caption used `-f`; callers cache it for the rest of an album.
    pub redirected: bool,
}

impl UploadTarget {
    pub fn path(&self) -> PathBuf { self.dir.join(&self.file_name) }
}

/// Resolve the directory and file name for an incoming file.
///
/// `-f <folder words>` selects a folder (created if absent). Otherwise a
/// folder cached for the same album is reused. Out-of-bounds folders fall back
/// to the area root. The file name comes from the caption after the folder
/// words (with `-f`) or the whole caption (without), else `default_name`.
pub fn resolve_upload_target(
    base: &Path,
    caption: Option<&str>,
    cached_dir: Option<&Path>,
    default_name: &str,
    ext: Option<&str>,
) -> FileOpResult<UploadTarget> {
    let base = base.canonicalize()?;
    let raw_caption = caption.map(str::trim).unwrap_or("");
    let tokens: Vec<&str> = raw_caption.split_whitespace().collect();
    let redirected = tokens.first() == Some(&"-f") && tokens.len() >= 2;

    let dir = if redirected {
        // folder words run to the end of the caption; a name needs a third token
        let folder = tokens[1..].join(" ");
        safe_join(&base, &folder).unwrap_or_else(|_| {
            warn!("Upload folder '{}' escapes the area, using the root", folder);
            base.clone()
        })
    } else if let Some(cached) = cached_dir {
        resolve_within(&base, cached).unwrap_or_else(|_| base.clone())
    } else {
        base.clone()
    };
    fs::create_dir_all(&dir)?;

    let sanitized_default = sanitize_filename(default_name, ext, Some(default_name))?;
    let file_name = if tokens.is_empty() {
        sanitized_default.clone()
    } else if tokens[0] == "-f" {
        if tokens.len() > 2 {
            sanitize_filename(&tokens[2..].join(" "), ext, Some(sanitized_default.as_str()))?
        } else {
            sanitized_default.clone()
        }
    } else {
        sanitize_filename(raw_caption, ext, Some(sanitized_default.as_str()))?
    };

    // the name must land directly inside `dir`; `.` and `..` do not
    let file_name = match resolve_within(&base, &dir.join(&file_name)) {
        Ok(path) if path.parent() == Some(dir.as_path()) => file_name,
        _ => {
            warn!("Upload name '{}' does not stay in {}, using '{}'", file_name, dir.display(), sanitized_default);
            sanitized_default
        }
    };

    Ok(UploadTarget { dir, file_name, redirected })
}

/// Scratch file next to an upload destination.
///
/// Downloads are written here and only renamed over the destination once
/// complete, so a failed transfer never touches a file already stored there.
#[derive(Debug)]
pub struct PartialFile {
    partial: PathBuf,
    dest: PathBuf,
}

impl PartialFile {
    pub fn for_dest(dest: &Path) -> Self {
        let name = dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let partial = dest.with_file_name(format!(".{name}.part"));
        PartialFile { partial, dest: dest.to_path_buf() }
    }

    pub fn path(&self) -> &Path { &self.partial }

    /// Replace the destination with the finished download.
    pub fn commit(self) -> io::Result<()> {
        if let Err(e) = fs::rename(&self.partial, &self.dest) {
            error!("Error storing {}: {}", self.dest.display(), e);
            self.discard();
            return Err(e);
        }
        Ok(())
    }

    /// Drop the scratch file, leaving the destination as it was.
    pub fn discard(self) {
        match fs::remove_file(&self.partial) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", self.partial.display(), e),
        }
    }
}
