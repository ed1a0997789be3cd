//! Storage areas on the server filesystem.
//!
//! The bot manages exactly two areas under one base directory: pictures and
//! documents. Each area is a sandbox; nothing the user types can reach outside
//! of it.

pub mod matcher;
pub mod ops;

use anyhow::{anyhow, Result};
use log::info;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::error::FileOpResult;
use crate::validation::{relative_display, safe_join};

pub use matcher::{find_matches, Entry, MatchOptions};

pub const FOLDER_EMOJI: &str = "📂";

/// Which managed area a command or callback refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaKind {
    Photos,
    Documents,
}

impl AreaKind {
    pub const ALL: [AreaKind; 2] = [AreaKind::Photos, AreaKind::Documents];

    /// Identifier used in button payloads.
    pub fn scope(self) -> &'static str {
        match self {
            AreaKind::Photos => "photos",
            AreaKind::Documents => "docs",
        }
    }

    pub fn from_scope(scope: &str) -> Option<Self> {
        match scope {
            "photos" => Some(AreaKind::Photos),
            "docs" => Some(AreaKind::Documents),
            _ => None,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            AreaKind::Photos => "🖼️",
            AreaKind::Documents => "📄",
        }
    }
}

/// One managed subtree with its own extension policy.
#[derive(Debug, Clone)]
pub struct StorageArea {
    pub kind: AreaKind,
    /// Absolute and canonical.
    pub base_dir: PathBuf,
    /// Lower-cased, dot-prefixed. `None` accepts every file.
    pub allowed_extensions: Option<HashSet<String>>,
    pub emoji: &'static str,
    /// Deliver matching images as photos up to this size; documents otherwise.
    pub photo_limit: Option<u64>,
}

impl StorageArea {
    /// Sandbox a path relative to this area's base directory.
    pub fn resolve(&self, relative: &str) -> FileOpResult<PathBuf> {
        safe_join(&self.base_dir, relative)
    }

    pub fn relative(&self, path: &Path) -> String {
        relative_display(&self.base_dir, path)
    }

    /// Directory name of the area root, e.g. `Pictures`.
    pub fn root_name(&self) -> String {
        self.base_dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// Does the extension policy accept this file name?
    pub fn accepts_name(&self, name: &str) -> bool {
        match &self.allowed_extensions {
            None => true,
            Some(allowed) => Path::new(name)
                .extension()
                .map(|ext| allowed.contains(&format!(".{}", ext.to_string_lossy().to_lowercase())))
                .unwrap_or(false),
        }
    }

    /// Regular file accepted by the extension policy.
    pub fn is_valid_file(&self, path: &Path) -> bool {
        path.is_file()
            && path.file_name().map(|n| self.accepts_name(&n.to_string_lossy())).unwrap_or(false)
    }

    /// Immediate children of `dir`: directories first, then accepted files,
    /// each group ordered case-insensitively.
    pub fn entries(&self, dir: &Path) -> FileOpResult<Vec<Entry>> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for child in sorted_children(dir)? {
            let name = child.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            if child.is_dir() {
                dirs.push(Entry { name, path: child, is_dir: true, emoji: FOLDER_EMOJI });
            } else if self.is_valid_file(&child) {
                files.push(Entry { name, path: child, is_dir: false, emoji: self.emoji });
            }
        }
        dirs.extend(files);
        Ok(dirs)
    }

    /// Recursive substring search honouring this area's extension policy.
    pub fn find(&self, needle: &str, include_dirs: bool) -> Vec<PathBuf> {
        find_matches(&self.base_dir, needle, &MatchOptions {
            allowed_extensions: self.allowed_extensions.as_ref(),
            include_dirs,
        })
    }

    /// Recursive search for directories only (extension policy does not apply).
    pub fn find_dirs(&self, needle: &str) -> Vec<PathBuf> {
        find_matches(&self.base_dir, needle, &MatchOptions { allowed_extensions: None, include_dirs: true })
            .into_iter()
            .filter(|p| p.is_dir())
            .collect()
    }

    /// Display line for a path inside this area: emoji plus relative path.
    pub fn display_line(&self, path: &Path) -> String {
        let emoji = if path.is_dir() { FOLDER_EMOJI } else { self.emoji };
        format!("{} {}", emoji, self.relative(path))
    }
}

/// Children of a directory ordered by lower-cased name.
pub(crate) fn sorted_children(dir: &Path) -> FileOpResult<Vec<PathBuf>> {
    let mut children = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    children.sort_by_key(|p| p.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default());
    Ok(children)
}

/// Both managed areas plus the shared limits.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    pictures: StorageArea,
    documents: StorageArea,
    max_download_bytes: u64,
}

impl Storage {
    /// Create the area directories if needed and canonicalize them.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let root = PathBuf::from(&config.base_dir);
        fs::create_dir_all(&root)
            .map_err(|e| anyhow!("Failed to create base directory {}: {}", root.display(), e))?;
        let root = root.canonicalize()?;

        let make_area = |kind: AreaKind, dir_name: &str| -> Result<StorageArea> {
            let dir = root.join(dir_name);
            fs::create_dir_all(&dir)
                .map_err(|e| anyhow!("Failed to create area directory {}: {}", dir.display(), e))?;
            let base_dir = dir.canonicalize()?;
            info!("{} area at {}", kind.scope(), base_dir.display());
            let (allowed_extensions, photo_limit) = match kind {
                AreaKind::Photos => (
                    Some(config.image_extensions.iter().map(|e| normalize_extension(e)).collect()),
                    Some(config.max_photo_bytes),
                ),
                AreaKind::Documents => (None, None),
            };
            Ok(StorageArea {
                kind,
                base_dir,
                allowed_extensions,
                emoji: kind.emoji(),
                photo_limit,
            })
        };

        let pictures = make_area(AreaKind::Photos, &config.pictures_dir_name)?;
        let documents = make_area(AreaKind::Documents, &config.documents_dir_name)?;

        Ok(Storage { root, pictures, documents, max_download_bytes: config.max_download_bytes })
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn area(&self, kind: AreaKind) -> &StorageArea {
        match kind {
            AreaKind::Photos => &self.pictures,
            AreaKind::Documents => &self.documents,
        }
    }

    pub fn max_download_bytes(&self) -> u64 { self.max_download_bytes }
}

pub fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.starts_with('.') { lower } else { format!(".{lower}") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn areas_are_created_on_startup() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = Config::default().storage;
        cfg.base_dir = tmp.path().join("root").to_string_lossy().into_owned();
        let storage = Storage::new(&cfg).unwrap();
        assert!(storage.area(AreaKind::Photos).base_dir.ends_with("Pictures"));
        assert!(storage.area(AreaKind::Documents).base_dir.is_dir());
        assert!(storage.area(AreaKind::Photos).accepts_name("A.JPG"));
        assert!(!storage.area(AreaKind::Photos).accepts_name("notes.txt"));
        assert!(storage.area(AreaKind::Documents).accepts_name("notes"));
    }

    #[test]
    fn entries_list_dirs_then_filtered_files() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = Config::default().storage;
        cfg.base_dir = tmp.path().to_string_lossy().into_owned();
        let storage = Storage::new(&cfg).unwrap();
        let area = storage.area(AreaKind::Photos);
        fs::write(area.base_dir.join("b.png"), b"x").unwrap();
        fs::write(area.base_dir.join("A.jpg"), b"x").unwrap();
        fs::write(area.base_dir.join("readme.txt"), b"x").unwrap();
        fs::create_dir(area.base_dir.join("zoo")).unwrap();
        fs::create_dir(area.base_dir.join("Alps")).unwrap();
        let names: Vec<_> = area.entries(&area.base_dir).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Alps", "zoo", "A.jpg", "b.png"]);
    }

    #[test]
    fn scope_round_trip() {
        for kind in AreaKind::ALL {
            assert_eq!(AreaKind::from_scope(kind.scope()), Some(kind));
        }
        assert_eq!(AreaKind::from_scope("music"), None);
    }
}
