use anyhow::Result;
use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::FileOpError;
use crate::storage::{ops, AreaKind, Storage};
use crate::validation::{extension_of, sanitize_filename};

use super::browser::Browser;
use super::callback::Callback;
use super::commands::{Command, CommandParser};
use super::flows::Flows;
use super::messages::{FlowKind, Texts};
use super::reply::{Inbound, InboundKind, Reply, Upload};
use super::session::Session;

/// Dispatcher: checks the caller, then routes each unit of work to the
/// browsers or the flow controller with that user's session locked.
pub struct BotServer {
    config: Config,
    storage: Storage,
    texts: Texts,
    parser: CommandParser,
    sessions: StdMutex<HashMap<i64, Arc<Mutex<Session>>>>,
}

impl BotServer {
    /// Create the server and make sure both storage areas exist.
    pub async fn new(config: Config) -> Result<Self> {
        let texts = Texts::new(config.bot.locale);
        let storage = Storage::new(&config.storage)?;
        info!("Serving files from {}", storage.root().display());

        Ok(BotServer {
            config,
            storage,
            texts,
            parser: CommandParser::new(),
            sessions: StdMutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn storage(&self) -> &Storage { &self.storage }

    pub fn texts(&self) -> &Texts { &self.texts }

    pub fn authorized_user_id(&self) -> i64 { self.config.bot.authorized_user_id }

    pub fn is_authorized(&self, user_id: i64) -> bool {
        user_id == self.config.bot.authorized_user_id
    }

    /// Text to send the owner when the bot comes up, if enabled.
    pub fn startup_notice(&self) -> Option<&'static str> {
        self.config.bot.announce_startup.then(|| self.texts.startup_notice())
    }

    /// Print configuration and storage statistics.
    pub async fn show_status(&self) -> Result<()> {
        println!("=== filebot status ===");
        println!("Authorized user: {}", self.config.bot.authorized_user_id);
        println!("Locale: {:?}", self.texts.locale());
        println!("Base directory: {}", self.storage.root().display());

        for kind in AreaKind::ALL {
            let area = self.storage.area(kind);
            let (mut files, mut dirs) = (0usize, 0usize);
            for entry in walkdir::WalkDir::new(&area.base_dir).min_depth(1).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_dir() {
                    dirs += 1;
                } else if area.accepts_name(&entry.file_name().to_string_lossy()) {
                    files += 1;
                }
            }
            println!("{} {}: {} file(s), {} folder(s)", area.emoji, area.root_name(), files, dirs);
        }

        let sessions = self.sessions.lock().map(|s| s.len()).unwrap_or(0);
        println!("Active sessions: {}", sessions);
        Ok(())
    }

    fn session_for(&self, user_id: i64) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions
            .entry(user_id)
            .or_insert_with(|| {
                debug!("New session for user {}", user_id);
                Arc::new(Mutex::new(Session::new(user_id)))
            })
            .clone()
    }

    fn limit(&self) -> usize { self.config.bot.listing_limit }

    fn browser(&self, kind: AreaKind) -> Browser<'_> {
        Browser::new(self.storage.area(kind), &self.texts, self.limit())
    }

    fn flows(&self) -> Flows<'_> {
        Flows::new(&self.storage, &self.texts, self.limit())
    }

    /// Handle one inbound unit of work. Requests for the same user are
    /// serialized; different users never block each other.
    pub async fn handle(&self, inbound: Inbound) -> Vec<Reply> {
        if !self.is_authorized(inbound.user_id) {
            warn!("Rejected request from unauthorized user {}", inbound.user_id);
            return match inbound.kind {
                InboundKind::Callback(_) => vec![Reply::alert(self.texts.not_authorized())],
                _ => vec![Reply::text(self.texts.not_authorized())],
            };
        }

        let session = self.session_for(inbound.user_id);
        let mut session = session.lock().await;
        trace!("User {} back after {}s", inbound.user_id, session.idle_for().num_seconds());
        session.update_activity();

        match inbound.kind {
            InboundKind::Text(text) => self.handle_text(&mut session, &text),
            InboundKind::Callback(data) => self.handle_callback(&mut session, &data),
            InboundKind::Upload(upload) => self.handle_upload(&mut session, &upload),
        }
    }

    fn handle_text(&self, session: &mut Session, text: &str) -> Vec<Reply> {
        match self.parser.parse(text) {
            Some(command) => self.handle_command(session, command),
            None => self.handle_reply(session, text),
        }
    }

    fn handle_command(&self, session: &mut Session, command: Command) -> Vec<Reply> {
        debug!("User {}: {:?}", session.user_id, command);
        match command {
            Command::Help => vec![Reply::text(self.texts.help())],
            Command::List(kind) => self.browser(kind).list(session),
            Command::Show { area: None, query } => {
                let kind = match session.active_browser {
                    Some(AreaKind::Documents) => AreaKind::Documents,
                    _ => AreaKind::Photos,
                };
                self.browser(kind).show(session, &query)
            }
            Command::Show { area: Some(kind), query } if query.is_empty() => self.browser(kind).list(session),
            Command::Show { area: Some(kind), query } => self.browser(kind).show(session, &query),
            Command::Go { target } => {
                session.clear_flow(FlowKind::Go);
                self.browser(AreaKind::Photos).go(session, &target)
            }
            Command::Jump { area, query } => self.flows().start_jump(session, area, &query),
            Command::Delete { area, pattern } => self.flows().start_delete(session, area, &pattern),
            Command::Move { area, args } => self.flows().start_move(session, area, &args),
            Command::Rename { area, query } => self.flows().start_rename(session, area, &query),
            Command::Mkdir { area, path } => self.flows().make_dir(area, &path),
            Command::Unknown(name) => vec![Reply::text(self.texts.unknown_command(&name))],
        }
    }

    /// Free text: pending flows first, then the browsers' shortcuts.
    fn handle_reply(&self, session: &mut Session, text: &str) -> Vec<Reply> {
        if let Some(replies) = self.flows().handle_text(session, text) {
            return replies;
        }
        for kind in [AreaKind::Documents, AreaKind::Photos] {
            if let Some(replies) = self.browser(kind).process_text(session, text) {
                return replies;
            }
        }
        trace!("User {}: unrouted text '{}'", session.user_id, text);
        vec![Reply::text(self.texts.not_understood())]
    }

    fn handle_callback(&self, session: &mut Session, data: &str) -> Vec<Reply> {
        match Callback::parse(data) {
            Some(Callback::Browse { area, target }) => self.browser(area).open(session, &target),
            Some(Callback::Pick { action, area, index }) => self.flows().handle_pick(session, action, area, index),
            Some(Callback::Confirm { area, accept, relative }) => {
                self.flows().handle_confirm(session, area, accept, relative)
            }
            None => {
                debug!("User {}: unrecognised callback '{}'", session.user_id, data);
                vec![Reply::alert(self.texts.unrecognised_action())]
            }
        }
    }

    /// Work out where an upload goes. The transport performs the download.
    fn handle_upload(&self, session: &mut Session, upload: &Upload) -> Vec<Reply> {
        let limit = self.storage.max_download_bytes();
        if upload.size.map(|s| s > limit).unwrap_or(false) {
            return vec![Reply::text(self.texts.error(&FileOpError::TransportLimit { limit }))];
        }

        let area = self.storage.area(upload.kind);
        let (default_name, ext) = match upload.kind {
            AreaKind::Photos => (format!("pic_{}.jpg", upload.unique_id), Some(".jpg".to_string())),
            AreaKind::Documents => {
                let original = upload
                    .file_name
                    .as_deref()
                    .and_then(|n| std::path::Path::new(n).file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let ext = extension_of(&original).map(str::to_string);
                let fallback = format!("doc_{}{}", upload.unique_id, ext.as_deref().unwrap_or(""));
                let source = if original.is_empty() { fallback.as_str() } else { original.as_str() };
                let name = sanitize_filename(source, ext.as_deref(), Some(fallback.as_str())).unwrap_or_else(|_| fallback.clone());
                (name, ext)
            }
        };

        let group = upload.media_group_id.as_deref();
        let cached = group.and_then(|g| session.upload_dir(upload.kind, g)).map(|p| p.to_path_buf());
        let target = match ops::resolve_upload_target(
            &area.base_dir,
            upload.caption.as_deref(),
            cached.as_deref(),
            &default_name,
            ext.as_deref(),
        ) {
            Ok(target) => target,
            Err(e) => return vec![Reply::text(self.texts.error(&e))],
        };

        if let (Some(group), true) = (group, target.redirected) {
            session.remember_upload_dir(upload.kind, group, target.dir.clone());
        }
        let notice = session.should_announce_upload(upload.kind, group).then(|| {
            let shown = match area.relative(&target.dir).as_str() {
                "." => area.root_name(),
                rel => format!("{}/{}", area.root_name(), rel),
            };
            self.texts.saved_in(upload.kind, &shown)
        });

        info!("Saving {} upload to {}", upload.kind.scope(), target.path().display());
        vec![Reply::Save { dest: target.path(), notice }]
    }
}
