//! Button payloads.
//!
//! Pipe delimited: namespace, action, then action specific fields. Relative
//! paths are percent-encoded so a `|` or non-ASCII name survives the trip.
//! The transport caps payloads at [`MAX_PAYLOAD_BYTES`]; paths that do not
//! fit are replaced by a reference into state the session already holds.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::storage::AreaKind;

pub const MAX_PAYLOAD_BYTES: usize = 64;

const BROWSER_NS: &str = "FB";
const OPS_NS: &str = "OPS";
const DELETE_ACTION: &str = "DEL";
/// Stands in for the pending delete path when the path is too long to carry.
const PENDING_MARKER: &str = "-";

/// Unreserved characters stay readable, everything else is escaped.
const PAYLOAD_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'.').remove(b'-').remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickAction {
    DeleteSelect,
    MoveSource,
    MoveDestination,
    RenameSelect,
    GoSelect,
}

impl PickAction {
    fn tag(self) -> &'static str {
        match self {
            PickAction::DeleteSelect => "DELSEL",
            PickAction::MoveSource => "MOVSRC",
            PickAction::MoveDestination => "MOVDST",
            PickAction::RenameSelect => "RENSEL",
            PickAction::GoSelect => "GOSEL",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "DELSEL" => PickAction::DeleteSelect,
            "MOVSRC" => PickAction::MoveSource,
            "MOVDST" => PickAction::MoveDestination,
            "RENSEL" => PickAction::RenameSelect,
            "GOSEL" => PickAction::GoSelect,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseTarget {
    /// Relative path inside the area.
    Path(String),
    /// 1-based index into the browser's pending match set.
    Match(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// Open a file from a browser match list.
    Browse { area: AreaKind, target: BrowseTarget },
    /// Pick candidate `index` (0-based) in a flow's disambiguation list.
    Pick { action: PickAction, area: AreaKind, index: usize },
    /// Answer a delete confirmation. `relative` is `None` when the path was
    /// too long to embed and the session's pending path applies.
    Confirm { area: AreaKind, accept: bool, relative: Option<String> },
}

impl Callback {
    /// Browse button for `relative`, falling back to the match index when the
    /// encoded path would not fit.
    pub fn browse(area: AreaKind, relative: &str, match_index: usize) -> Self {
        let by_path = Callback::Browse { area, target: BrowseTarget::Path(relative.to_string()) };
        if by_path.encode().len() <= MAX_PAYLOAD_BYTES {
            by_path
        } else {
            Callback::Browse { area, target: BrowseTarget::Match(match_index) }
        }
    }

    pub fn confirm(area: AreaKind, accept: bool, relative: &str) -> Self {
        let full = Callback::Confirm { area, accept, relative: Some(relative.to_string()) };
        if full.encode().len() <= MAX_PAYLOAD_BYTES {
            full
        } else {
            Callback::Confirm { area, accept, relative: None }
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Callback::Browse { area, target: BrowseTarget::Path(rel) } => {
                format!("{}|{}|{}", BROWSER_NS, area.scope(), utf8_percent_encode(rel, PAYLOAD_SET))
            }
            Callback::Browse { area, target: BrowseTarget::Match(n) } => {
                format!("{}|{}|#{}", BROWSER_NS, area.scope(), n)
            }
            Callback::Pick { action, area, index } => {
                format!("{}|{}|{}|{}", OPS_NS, action.tag(), area.scope(), index)
            }
            Callback::Confirm { area, accept, relative } => {
                let answer = if *accept { "YES" } else { "NO" };
                let rel = match relative {
                    Some(rel) => utf8_percent_encode(rel, PAYLOAD_SET).to_string(),
                    None => PENDING_MARKER.to_string(),
                };
                format!("{}|{}|{}|{}|{}", OPS_NS, DELETE_ACTION, area.scope(), answer, rel)
            }
        }
    }

    /// Parse a payload. `None` for anything this bot did not produce.
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.splitn(2, '|');
        match parts.next()? {
            BROWSER_NS => {
                let mut rest = parts.next()?.splitn(2, '|');
                let area = AreaKind::from_scope(rest.next()?)?;
                let raw = rest.next()?;
                let target = match raw.strip_prefix('#') {
                    Some(n) => BrowseTarget::Match(n.parse().ok()?),
                    None => BrowseTarget::Path(decode(raw)?),
                };
                Some(Callback::Browse { area, target })
            }
            OPS_NS => {
                let fields: Vec<&str> = parts.next()?.splitn(4, '|').collect();
                match fields.as_slice() {
                    [DELETE_ACTION, scope, answer, rel] => {
                        let area = AreaKind::from_scope(scope)?;
                        let accept = match *answer {
                            "YES" => true,
                            "NO" => false,
                            _ => return None,
                        };
                        let relative = if *rel == PENDING_MARKER { None } else { Some(decode(rel)?) };
                        Some(Callback::Confirm { area, accept, relative })
                    }
                    [action, scope, index] => Some(Callback::Pick {
                        action: PickAction::from_tag(action)?,
                        area: AreaKind::from_scope(scope)?,
                        index: index.parse().ok()?,
                    }),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn decode(raw: &str) -> Option<String> {
    percent_decode_str(raw).decode_utf8().ok().map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_with_delimiters_and_unicode_survive() {
        for rel in ["a|b/c.jpg", "viaje/año nuevo.png", "100%.txt", "plain.jpg"] {
            let cb = Callback::browse(AreaKind::Photos, rel, 1);
            let encoded = cb.encode();
            assert_eq!(encoded.matches('|').count(), 2, "{encoded}");
            assert_eq!(Callback::parse(&encoded), Some(cb));
        }
    }

    #[test]
    fn long_paths_fall_back_to_references() {
        let long = "deep/".repeat(20) + "photo.jpg";
        let browse = Callback::browse(AreaKind::Photos, &long, 3);
        assert_eq!(browse, Callback::Browse { area: AreaKind::Photos, target: BrowseTarget::Match(3) });
        assert!(browse.encode().len() <= MAX_PAYLOAD_BYTES);

        let confirm = Callback::confirm(AreaKind::Documents, true, &long);
        assert_eq!(confirm.encode(), "OPS|DEL|docs|YES|-");
        assert_eq!(Callback::parse("OPS|DEL|docs|YES|-"), Some(confirm));
    }

    #[test]
    fn pick_payloads_use_zero_based_indexes() {
        let cb = Callback::Pick { action: PickAction::MoveDestination, area: AreaKind::Documents, index: 0 };
        assert_eq!(cb.encode(), "OPS|MOVDST|docs|0");
        assert_eq!(Callback::parse("OPS|GOSEL|photos|7"),
            Some(Callback::Pick { action: PickAction::GoSelect, area: AreaKind::Photos, index: 7 }));
    }

    #[test]
    fn foreign_payloads_are_rejected() {
        for bad in ["", "XX|photos|a", "FB|music|a", "OPS|DEL|docs|MAYBE|a", "OPS|DELSEL|docs|x", "OPS|NOPE|docs|1"] {
            assert_eq!(Callback::parse(bad), None, "{bad}");
        }
    }
}
