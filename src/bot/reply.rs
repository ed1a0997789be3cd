//! Transport-neutral units of work.
//!
//! The dispatcher consumes [`Inbound`] and produces a list of [`Reply`]
//! actions; a transport turns those into API calls. Nothing here knows about
//! any particular chat platform.

use std::path::PathBuf;

use crate::storage::AreaKind;

use super::callback::Callback;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: i64,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// Any text message, commands included.
    Text(String),
    /// Raw button payload.
    Callback(String),
    Upload(Upload),
}

/// An incoming photo or document, before it is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub kind: AreaKind,
    /// Stable per-file id from the transport, used for default names.
    pub unique_id: String,
    /// Original file name, documents only.
    pub file_name: Option<String>,
    pub caption: Option<String>,
    /// Album id shared by items sent together.
    pub media_group_id: Option<String>,
    pub size: Option<u64>,
}

impl Inbound {
    pub fn text(user_id: i64, text: impl Into<String>) -> Self {
        Inbound { user_id, kind: InboundKind::Text(text.into()) }
    }

    pub fn callback(user_id: i64, data: impl Into<String>) -> Self {
        Inbound { user_id, kind: InboundKind::Callback(data.into()) }
    }

    pub fn upload(user_id: i64, upload: Upload) -> Self {
        Inbound { user_id, kind: InboundKind::Upload(upload) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, callback: &Callback) -> Self {
        Button { label: label.into(), data: callback.encode() }
    }
}

/// Rows of inline buttons.
pub type Keyboard = Vec<Vec<Button>>;

/// Lay out buttons four to a row.
pub fn button_rows(buttons: Vec<Button>) -> Keyboard {
    let mut rows = Vec::new();
    let mut row = Vec::with_capacity(4);
    for button in buttons {
        row.push(button);
        if row.len() == 4 {
            rows.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text { text: String, keyboard: Option<Keyboard> },
    /// Deliver an image inline; the transport falls back to a document on failure.
    Photo { path: PathBuf, caption: Option<String> },
    Document { path: PathBuf, caption: Option<String> },
    /// Replace the text of the message whose button was pressed.
    EditText(String),
    /// Remove the buttons from the message whose button was pressed.
    ClearKeyboard,
    /// Acknowledge a button press, optionally with a toast or alert.
    Answer { text: Option<String>, alert: bool },
    /// Download the inbound upload to `dest`, then send `notice` if any.
    Save { dest: PathBuf, notice: Option<String> },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text { text: text.into(), keyboard: None }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Reply::Text { text: text.into(), keyboard: Some(keyboard) }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Reply::Answer { text: Some(text.into()), alert: true }
    }

    pub fn ack() -> Self {
        Reply::Answer { text: None, alert: false }
    }

    /// Text body, for replies that have one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text { text, .. } | Reply::EditText(text) => Some(text),
            Reply::Answer { text: Some(text), .. } => Some(text),
            _ => None,
        }
    }
}
