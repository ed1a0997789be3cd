use log::trace;

use crate::storage::AreaKind;

/// A slash command with its arguments already split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// `/list` is an alias for the photos browser.
    List(AreaKind),
    /// `/show` picks the active browser, `/showp` and `/showd` name one.
    Show { area: Option<AreaKind>, query: String },
    /// Exact directory change in the photos browser (`/go`).
    Go { target: String },
    /// Partial directory jump (`/gop`, `/god`).
    Jump { area: AreaKind, query: String },
    Delete { area: AreaKind, pattern: String },
    Move { area: AreaKind, args: Vec<String> },
    Rename { area: AreaKind, query: String },
    Mkdir { area: AreaKind, path: String },
    Unknown(String),
}

/// Parses slash commands. Plain text is not a command and yields `None`.
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self { Self }

    pub fn parse(&self, raw: &str) -> Option<Command> {
        let trimmed = raw.trim();
        if !trimmed.starts_with('/') {
            return None;
        }
        let head = trimmed.split_whitespace().next().unwrap_or(trimmed);
        // "/listp@my_bot" addresses this bot explicitly in group chats
        let name = head[1..].split('@').next().unwrap_or("").to_lowercase();
        let args = split_arguments(trimmed);
        let joined = args.join(" ").trim().to_string();
        trace!("Parsed command '{}' with {} argument(s)", name, args.len());

        let cmd = match name.as_str() {
            "start" | "help" => Command::Help,
            "list" | "listp" => Command::List(AreaKind::Photos),
            "listd" => Command::List(AreaKind::Documents),
            "show" => Command::Show { area: None, query: joined },
            "showp" => Command::Show { area: Some(AreaKind::Photos), query: joined },
            "showd" => Command::Show { area: Some(AreaKind::Documents), query: joined },
            "go" => Command::Go { target: joined },
            "gop" => Command::Jump { area: AreaKind::Photos, query: joined },
            "god" => Command::Jump { area: AreaKind::Documents, query: joined },
            "rmp" => Command::Delete { area: AreaKind::Photos, pattern: joined },
            "rmd" => Command::Delete { area: AreaKind::Documents, pattern: joined },
            "mvp" => Command::Move { area: AreaKind::Photos, args },
            "mvd" => Command::Move { area: AreaKind::Documents, args },
            "rnp" | "renamep" => Command::Rename { area: AreaKind::Photos, query: joined },
            "rnd" | "renamed" => Command::Rename { area: AreaKind::Documents, query: joined },
            "mkdirp" => Command::Mkdir { area: AreaKind::Photos, path: joined },
            "mkdird" => Command::Mkdir { area: AreaKind::Documents, path: joined },
            _ => Command::Unknown(head.to_string()),
        };
        Some(cmd)
    }
}

impl Default for CommandParser {
    fn default() -> Self { Self::new() }
}

/// Split a command line shell style, dropping the command itself.
///
/// Single and double quotes group words and a backslash escapes the next
/// character outside single quotes. Unbalanced quoting falls back to plain
/// whitespace splitting so a name like `it's.jpg` still works.
pub fn split_arguments(text: &str) -> Vec<String> {
    let mut parts = shell_split(text).unwrap_or_else(|| text.split_whitespace().map(str::to_string).collect());
    if parts.first().map(|p| p.starts_with('/')).unwrap_or(false) {
        parts.remove(0);
    }
    parts
}

fn shell_split(text: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '\'' => break,
                        c => current.push(c),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '"' => break,
                        '\\' => current.push(chars.next()?),
                        c => current.push(c),
                    }
                }
            }
            '\\' => {
                in_word = true;
                current.push(chars.next()?);
            }
            c if c.is_whitespace() => {
                if in_word {
                    parts.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        parts.push(current);
    }
    Some(parts)
}
