use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::storage::{AreaKind, StorageArea};
use crate::validation::resolve_within;

use super::messages::FlowKind;

/// Per-user conversation state. Lives in memory only; a restart puts every
/// browser back at its area root and drops pending flows.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub last_activity: DateTime<Utc>,
    /// Browser that receives bare numbers and `go` shortcuts.
    pub active_browser: Option<AreaKind>,
    cursors: HashMap<AreaKind, BrowserCursor>,
    pub delete: Option<DeleteContext>,
    pub moving: Option<MoveContext>,
    pub rename: Option<RenameContext>,
    pub go: Option<GoContext>,
    upload_dirs: HashMap<(AreaKind, String), PathBuf>,
    last_announced_group: HashMap<AreaKind, String>,
}

/// Current directory of one browser plus what it last showed the user.
#[derive(Debug, Clone)]
pub struct BrowserCursor {
    pub current: PathBuf,
    /// Last rendered listing, in display order.
    pub listing: Vec<ListedEntry>,
    /// Pending ambiguous `show` matches, relative to the area base.
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub relative: String,
    pub is_dir: bool,
}

impl BrowserCursor {
    fn at(base: &Path) -> Self {
        Self { current: base.to_path_buf(), listing: Vec::new(), matches: Vec::new() }
    }

    pub fn has_context(&self) -> bool {
        !self.listing.is_empty() || !self.matches.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteContext {
    Select { area: AreaKind, candidates: Vec<String> },
    Confirm { area: AreaKind, pending: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveContext {
    AwaitOriginInput { area: AreaKind },
    AwaitOriginChoice { area: AreaKind, candidates: Vec<String> },
    AwaitDestinationInput { area: AreaKind, origin: String },
    AwaitDestinationChoice { area: AreaKind, origin: String, candidates: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameContext {
    AwaitTargetInput { area: AreaKind },
    AwaitTargetChoice { area: AreaKind, candidates: Vec<String> },
    AwaitNewName { area: AreaKind, target: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoContext {
    /// Directory names (immediate children of the cursor) awaiting a pick.
    Select { area: AreaKind, candidates: Vec<String> },
}

impl DeleteContext {
    pub fn area(&self) -> AreaKind {
        match self {
            DeleteContext::Select { area, .. } | DeleteContext::Confirm { area, .. } => *area,
        }
    }
}

impl MoveContext {
    pub fn area(&self) -> AreaKind {
        match self {
            MoveContext::AwaitOriginInput { area }
            | MoveContext::AwaitOriginChoice { area, .. }
            | MoveContext::AwaitDestinationInput { area, .. }
            | MoveContext::AwaitDestinationChoice { area, .. } => *area,
        }
    }
}

impl RenameContext {
    pub fn area(&self) -> AreaKind {
        match self {
            RenameContext::AwaitTargetInput { area }
            | RenameContext::AwaitTargetChoice { area, .. }
            | RenameContext::AwaitNewName { area, .. } => *area,
        }
    }
}

impl Session {
    pub fn new(user_id: i64) -> Self {
        Session {
            user_id,
            last_activity: Utc::now(),
            active_browser: None,
            cursors: HashMap::new(),
            delete: None,
            moving: None,
            rename: None,
            go: None,
            upload_dirs: HashMap::new(),
            last_announced_group: HashMap::new(),
        }
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Time since the previous request from this user.
    pub fn idle_for(&self) -> chrono::Duration {
        Utc::now() - self.last_activity
    }

    /// The browser cursor for `area`, created at the base on first use and
    /// reset there if the stored directory vanished or left the sandbox.
    pub fn cursor(&mut self, area: &StorageArea) -> &mut BrowserCursor {
        let cursor = self.cursors.entry(area.kind).or_insert_with(|| BrowserCursor::at(&area.base_dir));
        let still_valid = resolve_within(&area.base_dir, &cursor.current)
            .map(|p| p.is_dir())
            .unwrap_or(false);
        if !still_valid {
            debug!("User {}: resetting {} browser to its root", self.user_id, area.kind.scope());
            cursor.current = area.base_dir.clone();
        }
        cursor
    }

    /// Cursor without validation, for read-only routing checks.
    pub fn peek_cursor(&self, kind: AreaKind) -> Option<&BrowserCursor> {
        self.cursors.get(&kind)
    }

    pub fn clear_flow(&mut self, flow: FlowKind) {
        match flow {
            FlowKind::Delete => self.delete = None,
            FlowKind::Move => self.moving = None,
            FlowKind::Rename => self.rename = None,
            FlowKind::Go => self.go = None,
        }
    }

    /// Folder an album was redirected to with `-f`.
    pub fn upload_dir(&self, kind: AreaKind, group: &str) -> Option<&Path> {
        self.upload_dirs.get(&(kind, group.to_string())).map(PathBuf::as_path)
    }

    pub fn remember_upload_dir(&mut self, kind: AreaKind, group: &str, dir: PathBuf) {
        self.upload_dirs.insert((kind, group.to_string()), dir);
    }

    /// Whether an upload should produce a "saved in" notice: always for a
    /// single item, once for the first item of an album.
    pub fn should_announce_upload(&mut self, kind: AreaKind, group: Option<&str>) -> bool {
        match group {
            None => true,
            Some(group) => {
                if self.last_announced_group.get(&kind).map(String::as_str) == Some(group) {
                    false
                } else {
                    self.last_announced_group.insert(kind, group.to_string());
                    true
                }
            }
        }
    }
}
