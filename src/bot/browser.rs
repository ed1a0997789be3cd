//! Read-only navigation inside one storage area.
//!
//! A [`Browser`] is a short-lived view over a [`StorageArea`]; the state it
//! navigates (current directory, last listing, pending matches) lives in the
//! user's [`Session`].

use log::{debug, info};
use std::fs;
use std::path::Path;

use crate::error::{FileOpError, FileOpResult};
use crate::storage::{sorted_children, AreaKind, StorageArea};
use crate::validation::resolve_within;

use super::callback::{BrowseTarget, Callback};
use super::messages::Texts;
use super::paginate::paginate;
use super::reply::{button_rows, Button, Reply};
use super::session::{ListedEntry, Session};

pub struct Browser<'a> {
    area: &'a StorageArea,
    texts: &'a Texts,
    limit: usize,
    /// Accept `list`, `show` and bare numbers even while another browser is active.
    allow_text_commands: bool,
}

impl<'a> Browser<'a> {
    pub fn new(area: &'a StorageArea, texts: &'a Texts, limit: usize) -> Self {
        Browser { area, texts, limit, allow_text_commands: area.kind == AreaKind::Photos }
    }

    pub fn kind(&self) -> AreaKind { self.area.kind }

    fn activate(&self, session: &mut Session) {
        session.active_browser = Some(self.area.kind);
    }

    fn header(&self, dir: &Path) -> String {
        let root = self.area.root_name();
        match self.area.relative(dir).as_str() {
            "." => format!("📂 {root}/"),
            rel => format!("📂 {root}/{rel}/"),
        }
    }

    fn blocks(&self, header: &str, lines: &[String]) -> Vec<Reply> {
        paginate(header, lines, self.limit).into_iter().map(Reply::text).collect()
    }

    /// List the current directory and remember it for numeric selection.
    pub fn list(&self, session: &mut Session) -> Vec<Reply> {
        let cursor = session.cursor(self.area);
        let current = cursor.current.clone();
        let entries = match self.area.entries(&current) {
            Ok(entries) => entries,
            Err(e) => return vec![Reply::text(self.texts.error(&e))],
        };

        cursor.listing = entries
            .iter()
            .map(|e| ListedEntry { relative: self.area.relative(&e.path), is_dir: e.is_dir })
            .collect();
        cursor.matches.clear();
        self.activate(session);

        let header = self.header(&current);
        if entries.is_empty() {
            return vec![Reply::text(format!("{header}\n{}", self.texts.empty_marker()))];
        }
        let lines: Vec<String> = entries.iter().map(|e| format!("{} {}", e.emoji, e.display_name())).collect();
        self.blocks(&header, &lines)
    }

    /// Enter an immediate child directory, exact name first, then ignoring case.
    pub fn enter(&self, session: &mut Session, name: &str) -> FileOpResult<Vec<Reply>> {
        let current = session.cursor(self.area).current.clone();
        let wanted = name.trim().trim_end_matches('/');
        let dirs: Vec<_> = sorted_children(&current)?.into_iter().filter(|p| p.is_dir()).collect();
        let named = |p: &&std::path::PathBuf| p.file_name().map(|n| n.to_string_lossy().into_owned());

        let found = dirs
            .iter()
            .find(|p| named(p).as_deref() == Some(wanted))
            .or_else(|| {
                let lowered = wanted.to_lowercase();
                dirs.iter().find(|p| named(p).map(|n| n.to_lowercase()) == Some(lowered.clone()))
            })
            .ok_or_else(|| FileOpError::NotFound(wanted.to_string()))?;

        self.set_current(session, found)?;
        Ok(self.list(session))
    }

    fn set_current(&self, session: &mut Session, dir: &Path) -> FileOpResult<()> {
        let safe = resolve_within(&self.area.base_dir, dir)?;
        let cursor = session.cursor(self.area);
        cursor.current = safe;
        cursor.listing.clear();
        cursor.matches.clear();
        debug!("User {}: {} browser now at {}", session.user_id, self.area.kind.scope(), self.area.relative(dir));
        self.activate(session);
        Ok(())
    }

    /// `go <dir>` / `go..`
    pub fn go(&self, session: &mut Session, target: &str) -> Vec<Reply> {
        let target = target.trim();
        if target.is_empty() {
            return vec![Reply::text(self.texts.go_usage())];
        }
        if matches!(target, ".." | "../" | "go..") {
            return self.go_up(session);
        }
        match self.enter(session, target) {
            Ok(replies) => replies,
            Err(FileOpError::NotFound(_)) => vec![Reply::text(self.texts.dir_not_found(target))],
            Err(e) => vec![Reply::text(self.texts.error(&e))],
        }
    }

    pub fn go_up(&self, session: &mut Session) -> Vec<Reply> {
        let current = session.cursor(self.area).current.clone();
        if current == self.area.base_dir {
            let mut replies = vec![Reply::text(self.texts.already_root())];
            replies.extend(self.list(session));
            return replies;
        }
        let parent = current.parent().unwrap_or(self.area.base_dir.as_path()).to_path_buf();
        match self.set_current(session, &parent) {
            Ok(()) => self.list(session),
            Err(e) => vec![Reply::text(self.texts.error(&e))],
        }
    }

    /// Pick entry `n` (1-based) from the pending matches, or else from the
    /// last listing. `None` when neither exists.
    pub fn select_by_number(&self, session: &mut Session, n: usize) -> Option<Vec<Reply>> {
        let cursor = session.cursor(self.area);
        if !cursor.matches.is_empty() {
            if n == 0 || n > cursor.matches.len() {
                return Some(vec![Reply::text(self.texts.out_of_range())]);
            }
            let relative = cursor.matches.remove(n - 1);
            cursor.matches.clear();
            self.activate(session);
            return Some(self.send_relative(session, &relative));
        }
        if cursor.listing.is_empty() {
            return None;
        }
        if n == 0 || n > cursor.listing.len() {
            return Some(vec![Reply::text(self.texts.out_of_range())]);
        }
        let entry = cursor.listing[n - 1].clone();
        Some(self.send_relative(session, &entry.relative))
    }

    fn send_relative(&self, session: &mut Session, relative: &str) -> Vec<Reply> {
        match self.area.resolve(relative) {
            Ok(path) => self.send_entry(session, &path),
            Err(e) => vec![Reply::text(self.texts.error(&e))],
        }
    }

    /// Deliver a file, or enter it if it is a directory.
    pub fn send_entry(&self, session: &mut Session, path: &Path) -> Vec<Reply> {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if path.is_dir() {
            return match self.set_current(session, path) {
                Ok(()) => self.list(session),
                Err(e) => vec![Reply::text(self.texts.error(&e))],
            };
        }
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(_) => return vec![Reply::text(self.texts.file_missing(&name))],
        };
        if size == 0 {
            return vec![Reply::text(self.texts.file_empty(&name))];
        }
        self.activate(session);
        info!("Sending {} ({} bytes)", self.area.relative(path), size);

        let as_photo = matches!(self.area.photo_limit, Some(limit) if size <= limit) && self.area.accepts_name(&name);
        let reply = if as_photo {
            Reply::Photo { path: path.to_path_buf(), caption: Some(format!("📸 {name}")) }
        } else {
            Reply::Document { path: path.to_path_buf(), caption: Some(format!("📂 {name}")) }
        };
        vec![reply]
    }

    /// Search files in the current directory (not recursive) by name.
    pub fn show(&self, session: &mut Session, query: &str) -> Vec<Reply> {
        let query = query.trim();
        if query.is_empty() {
            return vec![Reply::text(self.texts.show_usage(self.area.kind))];
        }
        if let Ok(n) = query.parse::<usize>() {
            if query.chars().all(|c| c.is_ascii_digit()) {
                if let Some(replies) = self.select_by_number(session, n) {
                    return replies;
                }
            }
        }

        let current = session.cursor(self.area).current.clone();
        let needle = query.to_lowercase();
        let matches: Vec<_> = match sorted_children(&current) {
            Ok(children) => children
                .into_iter()
                .filter(|p| self.area.is_valid_file(p))
                .filter(|p| p.file_name().map(|n| n.to_string_lossy().to_lowercase().contains(&needle)).unwrap_or(false))
                .collect(),
            Err(e) => return vec![Reply::text(self.texts.error(&e))],
        };

        match matches.len() {
            0 => vec![Reply::text(self.texts.show_none(self.area.kind))],
            1 => self.send_entry(session, &matches[0]),
            count => {
                let relatives: Vec<String> = matches.iter().map(|p| self.area.relative(p)).collect();
                session.cursor(self.area).matches = relatives.clone();
                self.activate(session);

                let lines: Vec<String> = matches
                    .iter()
                    .map(|p| format!("{} {}", self.area.emoji, p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()))
                    .collect();
                let mut replies = self.blocks(&self.texts.matches_header(count), &lines);
                let buttons = relatives
                    .iter()
                    .enumerate()
                    .map(|(i, rel)| Button::new((i + 1).to_string(), &Callback::browse(self.area.kind, rel, i + 1)))
                    .collect();
                replies.push(Reply::with_keyboard(self.texts.browser_selection_prompt(self.area.kind), button_rows(buttons)));
                replies
            }
        }
    }

    /// Button press from a match list.
    pub fn open(&self, session: &mut Session, target: &BrowseTarget) -> Vec<Reply> {
        let relative = match target {
            BrowseTarget::Path(rel) => rel.clone(),
            BrowseTarget::Match(n) => {
                let cursor = session.cursor(self.area);
                match n.checked_sub(1).and_then(|i| cursor.matches.get(i)) {
                    Some(rel) => rel.clone(),
                    None => return vec![Reply::alert(self.texts.invalid_context())],
                }
            }
        };
        session.cursor(self.area).matches.clear();
        match self.area.resolve(&relative) {
            Ok(path) => {
                let mut replies = vec![Reply::ack()];
                replies.extend(self.send_entry(session, &path));
                replies
            }
            Err(_) => vec![Reply::ack(), Reply::EditText(self.texts.invalid_path().to_string())],
        }
    }

    /// Names of immediate child directories containing `query`, ignoring case.
    pub fn matching_child_dirs(&self, session: &mut Session, query: &str) -> FileOpResult<Vec<String>> {
        let current = session.cursor(self.area).current.clone();
        let needle = query.to_lowercase();
        Ok(sorted_children(&current)?
            .into_iter()
            .filter(|p| p.is_dir())
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Free-text shortcuts. `None` means "not for this browser".
    pub fn process_text(&self, session: &mut Session, text: &str) -> Option<Vec<Reply>> {
        let stripped = text.trim();
        if stripped.is_empty() {
            return None;
        }
        let is_active = session.active_browser == Some(self.area.kind);
        let has_context = session.peek_cursor(self.area.kind).map(|c| c.has_context()).unwrap_or(false);

        if stripped.chars().all(|c| c.is_ascii_digit()) {
            if !is_active && !(self.allow_text_commands && has_context) {
                return None;
            }
            let n = stripped.parse::<usize>().unwrap_or(usize::MAX);
            return self.select_by_number(session, n);
        }

        let lowered = stripped.to_lowercase();
        if is_active && (lowered == "go.." || lowered == "go ..") {
            return Some(self.go_up(session));
        }
        if is_active {
            if let Some(target) = strip_prefix_ignore_case(stripped, "go ") {
                return Some(self.go(session, target));
            }
        }
        if let Some(query) = strip_prefix_ignore_case(stripped, "show ") {
            if !is_active && !self.allow_text_commands {
                return None;
            }
            return Some(self.show(session, query));
        }
        if self.allow_text_commands && lowered == "list" {
            return Some(self.list(session));
        }
        None
    }
}

fn strip_prefix_ignore_case<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::messages::Locale;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn photos(base: &Path) -> StorageArea {
        StorageArea {
            kind: AreaKind::Photos,
            base_dir: base.canonicalize().unwrap(),
            allowed_extensions: Some([".jpg", ".png"].iter().map(|s| s.to_string()).collect::<HashSet<_>>()),
            emoji: "🖼️",
            photo_limit: Some(1024),
        }
    }

    fn texts_of(replies: &[Reply]) -> Vec<String> {
        replies.iter().filter_map(|r| r.as_text().map(str::to_string)).collect()
    }

    fn tree() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("Pictures");
        fs::create_dir_all(base.join("Trip/day1")).unwrap();
        fs::write(base.join("cat.jpg"), b"cat").unwrap();
        fs::write(base.join("catalog.png"), b"png").unwrap();
        fs::write(base.join("notes.txt"), b"txt").unwrap();
        fs::write(base.join("empty.jpg"), b"").unwrap();
        (tmp, base)
    }

    #[test]
    fn list_then_select_directory_and_file() {
        let (_tmp, base) = tree();
        let area = photos(&base);
        let texts = Texts::new(Locale::En);
        let browser = Browser::new(&area, &texts, 3500);
        let mut session = Session::new(1);

        let listing = texts_of(&browser.list(&mut session));
        assert_eq!(listing, vec!["📂 Pictures/\n1. 📂 Trip/\n2. 🖼️ cat.jpg\n3. 🖼️ catalog.png\n4. 🖼️ empty.jpg"]);
        assert_eq!(session.active_browser, Some(AreaKind::Photos));

        let sent = browser.select_by_number(&mut session, 2).unwrap();
        assert!(matches!(&sent[0], Reply::Photo { path, .. } if path.ends_with("cat.jpg")));

        let entered = texts_of(&browser.select_by_number(&mut session, 1).unwrap());
        assert_eq!(entered, vec!["📂 Pictures/Trip/\n1. 📂 day1/"]);

        assert_eq!(texts_of(&browser.select_by_number(&mut session, 9).unwrap()), vec![texts.out_of_range()]);
    }

    #[test]
    fn enter_is_case_insensitive_fallback_and_go_up_stops_at_root() {
        let (_tmp, base) = tree();
        let area = photos(&base);
        let texts = Texts::new(Locale::En);
        let browser = Browser::new(&area, &texts, 3500);
        let mut session = Session::new(1);

        browser.enter(&mut session, "trip").unwrap();
        assert!(session.cursor(&area).current.ends_with("Trip"));
        assert!(matches!(browser.enter(&mut session, "nowhere"), Err(FileOpError::NotFound(_))));

        browser.go_up(&mut session);
        let replies = texts_of(&browser.go_up(&mut session));
        assert_eq!(replies[0], texts.already_root());
        assert_eq!(session.cursor(&area).current, area.base_dir);
    }

    #[test]
    fn show_disambiguates_and_numbers_pick_from_matches() {
        let (_tmp, base) = tree();
        let area = photos(&base);
        let texts = Texts::new(Locale::En);
        let browser = Browser::new(&area, &texts, 3500);
        let mut session = Session::new(1);

        let replies = browser.show(&mut session, "cat");
        assert_eq!(texts_of(&replies)[0], "🔍 There are 2 matches:\n1. 🖼️ cat.jpg\n2. 🖼️ catalog.png");
        assert!(matches!(replies.last(), Some(Reply::Text { keyboard: Some(rows), .. }) if rows[0].len() == 2));

        let picked = browser.process_text(&mut session, "2").unwrap();
        assert!(matches!(&picked[0], Reply::Photo { path, .. } if path.ends_with("catalog.png")));
        assert!(session.cursor(&area).matches.is_empty());

        assert_eq!(texts_of(&browser.show(&mut session, "notes")), vec![texts.show_none(AreaKind::Photos)]);
        assert_eq!(texts_of(&browser.show(&mut session, "empty")), vec![texts.file_empty("empty.jpg")]);
    }

    #[test]
    fn button_open_consumes_pending_matches() {
        let (_tmp, base) = tree();
        let area = photos(&base);
        let texts = Texts::new(Locale::En);
        let browser = Browser::new(&area, &texts, 3500);
        let mut session = Session::new(1);

        browser.list(&mut session);
        browser.show(&mut session, "cat");
        let opened = browser.open(&mut session, &BrowseTarget::Path("catalog.png".into()));
        assert!(opened.iter().any(|r| matches!(r, Reply::Photo { path, .. } if path.ends_with("catalog.png"))));
        assert!(session.cursor(&area).matches.is_empty());

        // a later bare number indexes the listing, not the old matches
        browser.process_text(&mut session, "1").unwrap();
        assert!(session.cursor(&area).current.ends_with("Trip"));
    }

    #[test]
    fn large_images_go_out_as_documents() {
        let (_tmp, base) = tree();
        fs::write(base.join("huge.jpg"), vec![0u8; 2048]).unwrap();
        let area = photos(&base);
        let texts = Texts::new(Locale::En);
        let browser = Browser::new(&area, &texts, 3500);
        let mut session = Session::new(1);
        let replies = browser.send_entry(&mut session, &area.base_dir.join("huge.jpg"));
        assert!(matches!(&replies[0], Reply::Document { .. }));
    }

    #[test]
    fn text_routing_respects_activity() {
        let (_tmp, base) = tree();
        let area = photos(&base);
        let texts = Texts::new(Locale::En);
        let browser = Browser::new(&area, &texts, 3500);
        let mut session = Session::new(1);

        // no listing yet and not active
        assert!(browser.process_text(&mut session, "1").is_none());
        assert!(browser.process_text(&mut session, "go Trip").is_none());
        assert!(browser.process_text(&mut session, "list").is_some());
        assert!(browser.process_text(&mut session, "go Trip").is_some());
        assert!(session.cursor(&area).current.ends_with("Trip"));
        assert!(browser.process_text(&mut session, "go..").is_some());
        assert_eq!(session.cursor(&area).current, area.base_dir);
        assert!(browser.process_text(&mut session, "hello").is_none());
    }
}
