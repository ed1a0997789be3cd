//! Bot core module
//!
//! Everything between an inbound chat event and the list of replies for it:
//! - Command parsing and the dispatcher
//! - Per-user sessions with browser cursors and pending flows
//! - The two directory browsers and the delete/move/rename/jump flows
//! - Button payloads, pagination and localized texts

pub mod browser;
pub mod callback;
pub mod commands;
pub mod flows;
pub mod messages;
pub mod paginate;
pub mod reply;
pub mod server;
pub mod session;

pub use commands::{Command, CommandParser};
pub use reply::{Inbound, InboundKind, Reply, Upload};
pub use server::BotServer;
pub use session::Session;
