//! Path sandboxing and file name sanitizing.
//!
//! Everything a user types that ends up in a filesystem path goes through
//! [`resolve_within`] first. Names for new files go through [`sanitize_filename`].

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{FileOpError, FileOpResult};

/// Characters that are never allowed in a stored file name.
const INVALID_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Resolve `candidate` and make sure it is `base` or lives below it.
///
/// Symbolic links are followed for every component that exists and `..` is
/// applied against the real parent. Components that do not exist yet (a move
/// destination, a new folder) are appended lexically. Any resolution failure
/// is treated as out of bounds.
pub fn resolve_within(base: &Path, candidate: &Path) -> FileOpResult<PathBuf> {
    let out_of_bounds = || FileOpError::OutOfBounds(candidate.display().to_string());
    let base = base.canonicalize().map_err(|_| out_of_bounds())?;
    let resolved = resolve_lenient(candidate).map_err(|_| out_of_bounds())?;
    if resolved == base || resolved.starts_with(&base) {
        Ok(resolved)
    } else {
        Err(out_of_bounds())
    }
}

/// Join a user supplied relative path onto `base` and sandbox the result.
pub fn safe_join(base: &Path, relative: &str) -> FileOpResult<PathBuf> {
    resolve_within(base, &base.join(relative))
}

fn resolve_lenient(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                // A dangling link errors here, which the caller maps to out-of-bounds.
                if fs::symlink_metadata(&resolved).is_ok() {
                    resolved = resolved.canonicalize()?;
                }
            }
        }
    }
    Ok(resolved)
}

/// Relative display form of `path` under `base`, always `/` separated.
/// The base itself renders as `.`.
pub fn relative_display(base: &Path, path: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.display().to_string(),
    }
}

/// Extension of a file name including the dot (`"a.JPG"` -> `".JPG"`).
///
/// Dot files (`.bashrc`) and names ending in a dot have no extension.
pub fn extension_of(name: &str) -> Option<&str> {
    let idx = name.rfind('.')?;
    if idx == 0 || idx + 1 == name.len() {
        return None;
    }
    Some(&name[idx..])
}

/// Normalize a user supplied file name.
///
/// Runs of unsafe characters become a single `_`, spaces become `_`. An empty
/// result yields `fallback`, or [`FileOpError::EmptyName`] without one.
///
/// With `expected_ext`, a name without an extension gets it appended. A name
/// that already carries a *different* extension keeps the user's extension.
pub fn sanitize_filename(raw: &str, expected_ext: Option<&str>, fallback: Option<&str>) -> FileOpResult<String> {
    let mut candidate = String::with_capacity(raw.len());
    let mut in_invalid_run = false;
    for ch in raw.trim().chars() {
        if INVALID_FILENAME_CHARS.contains(&ch) {
            if !in_invalid_run {
                candidate.push('_');
            }
            in_invalid_run = true;
        } else {
            candidate.push(if ch == ' ' { '_' } else { ch });
            in_invalid_run = false;
        }
    }

    if candidate.is_empty() {
        return match fallback {
            Some(f) if !f.is_empty() => Ok(f.to_string()),
            _ => Err(FileOpError::EmptyName),
        };
    }

    if let Some(ext) = expected_ext.filter(|e| !e.is_empty()) {
        let expected = if ext.starts_with('.') { ext.to_string() } else { format!(".{ext}") };
        match extension_of(&candidate) {
            Some(current) if current.eq_ignore_ascii_case(&expected) => {}
            // user picked another extension on purpose; keep it
            Some(_) => {}
            None => candidate.push_str(&expected),
        }
    }

    Ok(candidate)
}
