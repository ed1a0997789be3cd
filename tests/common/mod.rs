#![allow(dead_code)]

use filebot::bot::{BotServer, Inbound, Reply};
use filebot::config::Config;
use filebot::storage::AreaKind;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const OWNER: i64 = 4242;

/// Server over a fresh temp tree. Keep the `TempDir` alive for the test.
pub async fn server() -> (TempDir, BotServer) {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.bot.token = "123456:TEST".into();
    cfg.bot.authorized_user_id = OWNER;
    cfg.storage.base_dir = tmp.path().join("files").to_str().unwrap().to_string();
    cfg.logging.level = "error".into();
    let server = BotServer::new(cfg).await.unwrap();
    (tmp, server)
}

pub fn base(server: &BotServer, kind: AreaKind) -> PathBuf {
    server.storage().area(kind).base_dir.clone()
}

pub fn touch(dir: &Path, rel: &str, content: &[u8]) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub async fn say(server: &BotServer, text: &str) -> Vec<Reply> {
    server.handle(Inbound::text(OWNER, text)).await
}

pub async fn press(server: &BotServer, data: &str) -> Vec<Reply> {
    server.handle(Inbound::callback(OWNER, data)).await
}

pub fn texts(replies: &[Reply]) -> Vec<String> {
    replies.iter().filter_map(|r| r.as_text().map(str::to_string)).collect()
}

/// Payloads of every button in the replies, in order.
pub fn buttons(replies: &[Reply]) -> Vec<String> {
    replies
        .iter()
        .filter_map(|r| match r {
            Reply::Text { keyboard: Some(rows), .. } => Some(rows.iter().flatten().map(|b| b.data.clone()).collect::<Vec<_>>()),
            _ => None,
        })
        .flatten()
        .collect()
}
