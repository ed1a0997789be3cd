//! Recursive name search inside an area.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::validation::relative_display;

/// Ephemeral projection of a filesystem node for listings.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub emoji: &'static str,
}

impl Entry {
    pub fn display_name(&self) -> String {
        if self.is_dir { format!("{}/", self.name) } else { self.name.clone() }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions<'a> {
    /// Lower-cased, dot-prefixed extensions a *file* must have to match.
    pub allowed_extensions: Option<&'a HashSet<String>>,
    pub include_dirs: bool,
}

/// Every file or directory below `base_dir` whose name contains `needle`
/// (case-insensitive), sorted by lower-cased relative path.
///
/// The walk itself is unfiltered: a directory that does not match is still
/// descended into. An empty needle matches nothing.
pub fn find_matches(base_dir: &Path, needle: &str, opts: &MatchOptions<'_>) -> Vec<PathBuf> {
    if needle.is_empty() {
        return Vec::new();
    }
    let needle = needle.to_lowercase();

    let mut results: Vec<PathBuf> = WalkDir::new(base_dir)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            let name = match path.file_name() {
                Some(n) => n.to_string_lossy().to_lowercase(),
                None => return false,
            };
            if path.is_dir() {
                opts.include_dirs && name.contains(&needle)
            } else if path.is_file() {
                let ext_ok = match opts.allowed_extensions {
                    None => true,
                    Some(allowed) => path
                        .extension()
                        .map(|e| allowed.contains(&format!(".{}", e.to_string_lossy().to_lowercase())))
                        .unwrap_or(false),
                };
                ext_ok && name.contains(&needle)
            } else {
                false
            }
        })
        .collect();

    results.sort_by_cached_key(|p| relative_display(base_dir, p).to_lowercase());
    results
}
