//! Multi-step file operations: delete, move, rename and the directory jump.
//!
//! Each flow is a small state machine stored in the [`Session`]. Starting a
//! flow replaces any pending context of the same kind. Inside a flow:
//!
//! - a cancel word clears the context at any stage
//! - a non-number where a number is expected reports a format error and keeps the stage
//! - a number outside the candidate list reports a range error and keeps the stage
//!
//! Button presses are validated against the stored context and then take the
//! same path as the equivalent numeric reply.

use log::debug;
use std::path::PathBuf;

use crate::error::{FileOpError, FileOpResult};
use crate::storage::{ops, AreaKind, Storage, StorageArea};

use super::browser::Browser;
use super::callback::{Callback, PickAction};
use super::messages::{is_cancel_word, FlowKind, Texts};
use super::paginate::paginate;
use super::reply::{button_rows, Button, Reply};
use super::session::{DeleteContext, GoContext, MoveContext, RenameContext, Session};

pub struct Flows<'a> {
    storage: &'a Storage,
    texts: &'a Texts,
    limit: usize,
}

/// Turn a reply into a 0-based index into `count` candidates.
pub fn parse_choice(text: &str, count: usize) -> FileOpResult<usize> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(FileOpError::Format);
    }
    match trimmed.parse::<usize>() {
        Ok(n) if n >= 1 && n <= count => Ok(n - 1),
        _ => Err(FileOpError::Range { max: count }),
    }
}

impl<'a> Flows<'a> {
    pub fn new(storage: &'a Storage, texts: &'a Texts, limit: usize) -> Self {
        Flows { storage, texts, limit }
    }

    fn area(&self, kind: AreaKind) -> &'a StorageArea {
        self.storage.area(kind)
    }

    fn browser(&self, kind: AreaKind) -> Browser<'a> {
        Browser::new(self.area(kind), self.texts, self.limit)
    }

    fn say(&self, text: impl Into<String>) -> Vec<Reply> {
        vec![Reply::text(text)]
    }

    /// Numbered candidate list followed by a prompt carrying one button per candidate.
    fn candidate_list(
        &self,
        area: &StorageArea,
        header: &str,
        paths: &[PathBuf],
        action: PickAction,
        prompt: &str,
    ) -> Vec<Reply> {
        let lines: Vec<String> = paths.iter().map(|p| area.display_line(p)).collect();
        let mut replies: Vec<Reply> = paginate(header, &lines, self.limit).into_iter().map(Reply::text).collect();
        let buttons = (0..paths.len())
            .map(|index| Button::new((index + 1).to_string(), &Callback::Pick { action, area: area.kind, index }))
            .collect();
        replies.push(Reply::with_keyboard(prompt, button_rows(buttons)));
        replies
    }

    /// A choice error keeps the stage; everything else is rendered as-is.
    fn choice_error(&self, err: FileOpError, format_hint: &str) -> Vec<Reply> {
        match err {
            FileOpError::Format => self.say(format_hint),
            other => self.say(self.texts.error(&other)),
        }
    }

    // ---------------------------------------------------------------------
    // Free text
    // ---------------------------------------------------------------------

    /// Route a free-text reply to whichever flow is waiting for one.
    /// `None` when no flow is pending.
    pub fn handle_text(&self, session: &mut Session, text: &str) -> Option<Vec<Reply>> {
        let text = text.trim();
        self.delete_text(session, text)
            .or_else(|| self.go_text(session, text))
            .or_else(|| self.move_text(session, text))
            .or_else(|| self.rename_text(session, text))
    }

    // ---------------------------------------------------------------------
    // Delete
    // ---------------------------------------------------------------------

    pub fn start_delete(&self, session: &mut Session, kind: AreaKind, pattern: &str) -> Vec<Reply> {
        session.clear_flow(FlowKind::Delete);
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return self.say(self.texts.delete_usage(kind));
        }

        let area = self.area(kind);
        let matches = area.find(pattern, true);
        debug!("User {}: delete '{}' in {} matched {}", session.user_id, pattern, kind.scope(), matches.len());
        match matches.len() {
            0 => self.say(self.texts.delete_none(kind, pattern)),
            1 => self.confirm_delete(session, area, &area.relative(&matches[0])),
            count => {
                let candidates = matches.iter().map(|p| area.relative(p)).collect();
                session.delete = Some(DeleteContext::Select { area: kind, candidates });
                self.candidate_list(area, &self.texts.matches_header(count), &matches, PickAction::DeleteSelect, self.texts.delete_prompt())
            }
        }
    }

    fn confirm_delete(&self, session: &mut Session, area: &StorageArea, relative: &str) -> Vec<Reply> {
        let emoji = match area.resolve(relative) {
            Ok(path) if path.is_dir() => crate::storage::FOLDER_EMOJI,
            _ => area.emoji,
        };
        session.delete = Some(DeleteContext::Confirm { area: area.kind, pending: relative.to_string() });
        let keyboard = vec![vec![
            Button::new(self.texts.yes(), &Callback::confirm(area.kind, true, relative)),
            Button::new(self.texts.no(), &Callback::confirm(area.kind, false, relative)),
        ]];
        vec![Reply::with_keyboard(self.texts.delete_confirm(emoji, relative), keyboard)]
    }

    fn delete_text(&self, session: &mut Session, text: &str) -> Option<Vec<Reply>> {
        let ctx = session.delete.clone()?;
        if is_cancel_word(text) {
            session.clear_flow(FlowKind::Delete);
            return Some(self.say(self.texts.cancelled(FlowKind::Delete)));
        }
        Some(match ctx {
            DeleteContext::Select { area, candidates } => match parse_choice(text, candidates.len()) {
                Ok(index) => self.confirm_delete(session, self.area(area), &candidates[index]),
                Err(e) => self.choice_error(e, self.texts.enter_number()),
            },
            DeleteContext::Confirm { .. } => self.say(self.texts.use_confirm_buttons()),
        })
    }

    /// Yes/No button. Anything that does not match the pending confirmation cancels.
    pub fn handle_confirm(&self, session: &mut Session, kind: AreaKind, accept: bool, relative: Option<String>) -> Vec<Reply> {
        let pending = match session.delete.take() {
            Some(DeleteContext::Confirm { area, pending }) if area == kind => Some(pending),
            _ => None,
        };
        let target = match (pending, relative) {
            (Some(pending), None) => Some(pending),
            (Some(pending), Some(rel)) if pending == rel => Some(pending),
            _ => None,
        };

        let outcome = match (accept, target) {
            (true, Some(rel)) => match ops::delete_entry(&self.area(kind).base_dir, &rel) {
                Ok(()) => self.texts.deleted(&rel),
                Err(e) => self.texts.error(&e),
            },
            _ => self.texts.cancelled(FlowKind::Delete).to_string(),
        };
        vec![Reply::ack(), Reply::EditText(outcome)]
    }

    // ---------------------------------------------------------------------
    // Directory jump
    // ---------------------------------------------------------------------

    /// Partial match against immediate child directories of the browser cursor.
    pub fn start_jump(&self, session: &mut Session, kind: AreaKind, query: &str) -> Vec<Reply> {
        session.clear_flow(FlowKind::Go);
        let browser = self.browser(kind);
        let query = query.trim();
        match query {
            ".." | "../" => return browser.go(session, ".."),
            "" | "." => return browser.list(session),
            _ => {}
        }

        let names = match browser.matching_child_dirs(session, query) {
            Ok(names) => names,
            Err(e) => return self.say(self.texts.error(&e)),
        };
        match names.len() {
            0 => self.say(self.texts.go_none()),
            1 => browser.go(session, &names[0]),
            count => {
                let lines: Vec<String> = names.iter().map(|n| format!("{} {}/", crate::storage::FOLDER_EMOJI, n)).collect();
                let mut replies: Vec<Reply> =
                    paginate(&self.texts.go_header(count), &lines, self.limit).into_iter().map(Reply::text).collect();
                let buttons = (0..count)
                    .map(|index| Button::new((index + 1).to_string(), &Callback::Pick { action: PickAction::GoSelect, area: kind, index }))
                    .collect();
                replies.push(Reply::with_keyboard(self.texts.go_prompt(), button_rows(buttons)));
                session.go = Some(GoContext::Select { area: kind, candidates: names });
                replies
            }
        }
    }

    fn go_text(&self, session: &mut Session, text: &str) -> Option<Vec<Reply>> {
        let GoContext::Select { area, candidates } = session.go.clone()?;
        if is_cancel_word(text) {
            session.clear_flow(FlowKind::Go);
            return Some(self.say(self.texts.cancelled(FlowKind::Go)));
        }
        Some(match parse_choice(text, candidates.len()) {
            Ok(index) => {
                session.clear_flow(FlowKind::Go);
                self.browser(area).go(session, &candidates[index])
            }
            Err(e) => self.choice_error(e, self.texts.enter_number_or_buttons()),
        })
    }

    // ---------------------------------------------------------------------
    // Move
    // ---------------------------------------------------------------------

    /// `/mvX` alone starts the assistant, `/mvX <origin>` starts it with an
    /// origin search and `/mvX <origin> <destination>` moves directly.
    pub fn start_move(&self, session: &mut Session, kind: AreaKind, args: &[String]) -> Vec<Reply> {
        session.clear_flow(FlowKind::Move);
        match args {
            [] => {
                session.moving = Some(MoveContext::AwaitOriginInput { area: kind });
                self.say(self.texts.move_start(&self.area(kind).root_name()))
            }
            [origin] => {
                session.moving = Some(MoveContext::AwaitOriginInput { area: kind });
                self.move_text(session, origin).unwrap_or_default()
            }
            [origin, destination] => self.run_move(session, kind, origin, destination),
            _ => self.say(self.texts.move_usage(kind)),
        }
    }

    fn run_move(&self, session: &mut Session, kind: AreaKind, origin: &str, destination: &str) -> Vec<Reply> {
        session.clear_flow(FlowKind::Move);
        match ops::move_entry(&self.area(kind).base_dir, origin, destination) {
            Ok(final_rel) => self.say(self.texts.moved(origin, &final_rel)),
            Err(e) => self.say(self.texts.error(&e)),
        }
    }

    fn move_text(&self, session: &mut Session, text: &str) -> Option<Vec<Reply>> {
        let ctx = session.moving.clone()?;
        if is_cancel_word(text) {
            session.clear_flow(FlowKind::Move);
            return Some(self.say(self.texts.cancelled(FlowKind::Move)));
        }
        let area = self.area(ctx.area());
        Some(match ctx {
            MoveContext::AwaitOriginChoice { area: kind, candidates } => match parse_choice(text, candidates.len()) {
                Ok(index) => {
                    session.moving = Some(MoveContext::AwaitDestinationInput { area: kind, origin: candidates[index].clone() });
                    self.say(self.texts.move_destination_prompt(&area.root_name()))
                }
                Err(e) => self.choice_error(e, self.texts.enter_number()),
            },
            MoveContext::AwaitDestinationChoice { area: kind, origin, candidates } => {
                match parse_choice(text, candidates.len()) {
                    Ok(index) => self.run_move(session, kind, &origin, &candidates[index]),
                    Err(e) => self.choice_error(e, self.texts.enter_number()),
                }
            }
            MoveContext::AwaitOriginInput { area: kind } => {
                let matches = area.find(text, true);
                match matches.len() {
                    0 => self.say(self.texts.move_origin_none()),
                    1 => {
                        session.moving = Some(MoveContext::AwaitDestinationInput { area: kind, origin: area.relative(&matches[0]) });
                        self.say(self.texts.move_destination_prompt(&area.root_name()))
                    }
                    count => {
                        let candidates = matches.iter().map(|p| area.relative(p)).collect();
                        session.moving = Some(MoveContext::AwaitOriginChoice { area: kind, candidates });
                        self.candidate_list(area, &self.texts.move_origin_header(count), &matches, PickAction::MoveSource, self.texts.move_origin_prompt())
                    }
                }
            }
            MoveContext::AwaitDestinationInput { area: kind, origin } => {
                if text == "." {
                    return Some(self.run_move(session, kind, &origin, "."));
                }
                let matches = area.find_dirs(text);
                match matches.len() {
                    0 => self.say(self.texts.move_destination_none()),
                    1 => self.run_move(session, kind, &origin, &area.relative(&matches[0])),
                    count => {
                        let candidates = matches.iter().map(|p| area.relative(p)).collect();
                        session.moving = Some(MoveContext::AwaitDestinationChoice { area: kind, origin, candidates });
                        self.candidate_list(
                            area,
                            &self.texts.move_destination_header(count),
                            &matches,
                            PickAction::MoveDestination,
                            self.texts.move_destination_choice_prompt(),
                        )
                    }
                }
            }
        })
    }

    // ---------------------------------------------------------------------
    // Rename
    // ---------------------------------------------------------------------

    pub fn start_rename(&self, session: &mut Session, kind: AreaKind, query: &str) -> Vec<Reply> {
        session.clear_flow(FlowKind::Rename);
        session.rename = Some(RenameContext::AwaitTargetInput { area: kind });
        let query = query.trim();
        if query.is_empty() {
            return self.say(self.texts.rename_start(&self.area(kind).root_name()));
        }
        self.rename_text(session, query).unwrap_or_default()
    }

    fn rename_text(&self, session: &mut Session, text: &str) -> Option<Vec<Reply>> {
        let ctx = session.rename.clone()?;
        if is_cancel_word(text) {
            session.clear_flow(FlowKind::Rename);
            return Some(self.say(self.texts.cancelled(FlowKind::Rename)));
        }
        let area = self.area(ctx.area());
        Some(match ctx {
            RenameContext::AwaitTargetChoice { area: kind, candidates } => match parse_choice(text, candidates.len()) {
                Ok(index) => {
                    session.rename = Some(RenameContext::AwaitNewName { area: kind, target: candidates[index].clone() });
                    self.say(self.texts.rename_new_name())
                }
                Err(e) => self.choice_error(e, self.texts.enter_number()),
            },
            RenameContext::AwaitTargetInput { area: kind } => {
                let matches = area.find(text, false);
                match matches.len() {
                    0 => self.say(self.texts.rename_none()),
                    1 => {
                        session.rename = Some(RenameContext::AwaitNewName { area: kind, target: area.relative(&matches[0]) });
                        self.say(self.texts.rename_new_name())
                    }
                    count => {
                        let candidates = matches.iter().map(|p| area.relative(p)).collect();
                        session.rename = Some(RenameContext::AwaitTargetChoice { area: kind, candidates });
                        self.candidate_list(area, &self.texts.matches_header(count), &matches, PickAction::RenameSelect, self.texts.rename_prompt())
                    }
                }
            }
            RenameContext::AwaitNewName { target, .. } => {
                session.clear_flow(FlowKind::Rename);
                match ops::rename_file(&area.base_dir, &target, text) {
                    Ok(new_rel) => self.say(self.texts.renamed(&target, &new_rel)),
                    Err(e) => self.say(self.texts.error(&e)),
                }
            }
        })
    }

    // ---------------------------------------------------------------------
    // Buttons
    // ---------------------------------------------------------------------

    /// Candidate button from any flow. The context must still be in the
    /// matching stage for the same area.
    pub fn handle_pick(&self, session: &mut Session, action: PickAction, kind: AreaKind, index: usize) -> Vec<Reply> {
        let (flow, candidates) = match (action, &session.delete, &session.moving, &session.rename, &session.go) {
            (PickAction::DeleteSelect, Some(DeleteContext::Select { area, candidates }), ..) if *area == kind => {
                (FlowKind::Delete, candidates.clone())
            }
            (PickAction::MoveSource, _, Some(MoveContext::AwaitOriginChoice { area, candidates }), ..) if *area == kind => {
                (FlowKind::Move, candidates.clone())
            }
            (PickAction::MoveDestination, _, Some(MoveContext::AwaitDestinationChoice { area, candidates, .. }), ..)
                if *area == kind =>
            {
                (FlowKind::Move, candidates.clone())
            }
            (PickAction::RenameSelect, _, _, Some(RenameContext::AwaitTargetChoice { area, candidates }), _) if *area == kind => {
                (FlowKind::Rename, candidates.clone())
            }
            (PickAction::GoSelect, _, _, _, Some(GoContext::Select { area, candidates })) if *area == kind => {
                (FlowKind::Go, candidates.clone())
            }
            _ => return vec![Reply::alert(self.texts.invalid_context())],
        };
        let Some(chosen) = candidates.get(index) else {
            return vec![Reply::alert(self.texts.index_out_of_range())];
        };

        let mut replies = vec![Reply::ack(), Reply::ClearKeyboard, Reply::EditText(self.texts.selected(flow, chosen))];
        let choice = (index + 1).to_string();
        let next = match flow {
            FlowKind::Delete => self.delete_text(session, &choice),
            FlowKind::Move => self.move_text(session, &choice),
            FlowKind::Rename => self.rename_text(session, &choice),
            FlowKind::Go => self.go_text(session, &choice),
        };
        replies.extend(next.unwrap_or_default());
        replies
    }

    // ---------------------------------------------------------------------
    // mkdir
    // ---------------------------------------------------------------------

    pub fn make_dir(&self, kind: AreaKind, path: &str) -> Vec<Reply> {
        let path = path.trim();
        if path.is_empty() {
            return self.say(self.texts.mkdir_usage(kind));
        }
        match ops::make_dir(&self.area(kind).base_dir, path) {
            Ok(rel) => self.say(self.texts.dir_created(&rel)),
            Err(e) => self.say(self.texts.error(&e)),
        }
    }
}
