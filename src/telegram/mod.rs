//! Telegram transport.
//!
//! Converts updates into [`Inbound`] work for the [`BotServer`] and executes
//! the returned [`Reply`] list against the Bot API, using long polling.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::LoggingErrorHandler,
    net::Download,
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, Update},
};

use crate::bot::reply::Keyboard;
use crate::bot::{BotServer, Inbound, Reply, Upload};
use crate::storage::ops::PartialFile;
use crate::storage::AreaKind;

/// Where the replies for one update go.
struct Target {
    chat: ChatId,
    /// Message carrying the pressed button, for edits.
    message: Option<MessageId>,
    callback_id: Option<String>,
    /// File to fetch when the dispatcher asks for a save.
    file: Option<String>,
}

/// Poll for updates until interrupted.
pub async fn run(server: Arc<BotServer>) -> Result<()> {
    let bot = Bot::new(server.config().bot.token.clone());

    match bot.get_me().await {
        Ok(me) => info!("Authenticated as @{}", me.username.as_deref().unwrap_or("unknown")),
        Err(e) => anyhow::bail!("Bot authentication failed: {}", e),
    }

    if let Some(notice) = server.startup_notice() {
        let owner = ChatId(server.authorized_user_id());
        if let Err(e) = bot.send_message(owner, notice).await {
            warn!("Failed to send startup notice: {}", e);
        }
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    info!("Listening for updates");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![server])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("Error in update handler"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped");
    Ok(())
}

async fn message_handler(bot: Bot, msg: Message, server: Arc<BotServer>) -> ResponseResult<()> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
    let mut target = Target { chat: msg.chat.id, message: None, callback_id: None, file: None };

    let inbound = if let Some(text) = msg.text() {
        Inbound::text(user_id, text)
    } else if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        target.file = Some(photo.file.id.clone());
        Inbound::upload(user_id, Upload {
            kind: AreaKind::Photos,
            unique_id: photo.file.unique_id.clone(),
            file_name: None,
            caption: msg.caption().map(str::to_string),
            media_group_id: msg.media_group_id().map(|g| g.to_string()),
            size: Some(u64::from(photo.file.size)),
        })
    } else if let Some(doc) = msg.document() {
        target.file = Some(doc.file.id.clone());
        Inbound::upload(user_id, Upload {
            kind: AreaKind::Documents,
            unique_id: doc.file.unique_id.clone(),
            file_name: doc.file_name.clone(),
            caption: msg.caption().map(str::to_string),
            media_group_id: msg.media_group_id().map(|g| g.to_string()),
            size: Some(u64::from(doc.file.size)),
        })
    } else {
        debug!("Ignoring message {} without text or file", msg.id.0);
        return Ok(());
    };

    let replies = server.handle(inbound).await;
    deliver(&bot, &server, &target, replies).await
}

async fn callback_handler(bot: Bot, q: CallbackQuery, server: Arc<BotServer>) -> ResponseResult<()> {
    let (chat, message) = match q.message.as_ref() {
        Some(m) => (m.chat().id, Some(m.id())),
        None => (ChatId(q.from.id.0 as i64), None),
    };
    let target = Target { chat, message, callback_id: Some(q.id.clone()), file: None };
    let data = q.data.clone().unwrap_or_default();

    let replies = server.handle(Inbound::callback(q.from.id.0 as i64, data)).await;
    let answered = replies.iter().any(|r| matches!(r, Reply::Answer { .. }));
    deliver(&bot, &server, &target, replies).await?;

    // every button press must be acknowledged or the client keeps spinning
    if !answered {
        bot.answer_callback_query(q.id.clone()).await?;
    }
    Ok(())
}

fn markup(keyboard: Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.into_iter().map(|row| {
        row.into_iter()
            .map(|b| InlineKeyboardButton::callback(b.label, b.data))
            .collect::<Vec<_>>()
    }))
}

async fn deliver(bot: &Bot, server: &BotServer, target: &Target, replies: Vec<Reply>) -> ResponseResult<()> {
    let texts = server.texts();
    for reply in replies {
        match reply {
            Reply::Text { text, keyboard: Some(keyboard) } if !keyboard.is_empty() => {
                bot.send_message(target.chat, text).reply_markup(markup(keyboard)).await?;
            }
            Reply::Text { text, .. } => {
                bot.send_message(target.chat, text).await?;
            }
            Reply::Photo { path, caption } => {
                let mut request = bot.send_photo(target.chat, InputFile::file(&path));
                if let Some(caption) = caption.clone() {
                    request = request.caption(caption);
                }
                if let Err(e) = request.await {
                    warn!("Sending {} as photo failed: {}", path.display(), e);
                    bot.send_message(target.chat, texts.photo_fallback(&e.to_string())).await?;
                    send_document(bot, server, target.chat, &path, caption).await?;
                }
            }
            Reply::Document { path, caption } => {
                send_document(bot, server, target.chat, &path, caption).await?;
            }
            Reply::EditText(text) => match target.message {
                Some(id) => {
                    bot.edit_message_text(target.chat, id, text).await?;
                }
                None => {
                    bot.send_message(target.chat, text).await?;
                }
            },
            Reply::ClearKeyboard => {
                if let Some(id) = target.message {
                    bot.edit_message_reply_markup(target.chat, id).await?;
                }
            }
            Reply::Answer { text, alert } => {
                if let Some(id) = target.callback_id.clone() {
                    let mut request = bot.answer_callback_query(id);
                    if let Some(text) = text {
                        request = request.text(text).show_alert(alert);
                    }
                    request.await?;
                }
            }
            Reply::Save { dest, notice } => {
                let Some(file_id) = target.file.clone() else {
                    warn!("Save requested without an inbound file");
                    continue;
                };
                match download(bot, file_id, &dest).await {
                    Ok(()) => {
                        info!("Saved upload to {}", dest.display());
                        if let Some(notice) = notice {
                            bot.send_message(target.chat, notice).await?;
                        }
                    }
                    Err(e) => {
                        error!("Download to {} failed: {}", dest.display(), e);
                        bot.send_message(target.chat, texts.download_failed(&e.to_string())).await?;
                    }
                }
            }
        }
    }
    Ok(())
}

async fn send_document(
    bot: &Bot,
    server: &BotServer,
    chat: ChatId,
    path: &Path,
    caption: Option<String>,
) -> ResponseResult<()> {
    let mut request = bot.send_document(chat, InputFile::file(path));
    if let Some(caption) = caption {
        request = request.caption(caption);
    }
    if let Err(e) = request.await {
        warn!("Sending {} as document failed: {}", path.display(), e);
        bot.send_message(chat, server.texts().send_failed(&e.to_string())).await?;
    }
    Ok(())
}

/// Fetch a file into a scratch copy, then move it over `dest`.
async fn download(bot: &Bot, file_id: String, dest: &Path) -> Result<()> {
    let file = bot.get_file(file_id).await?;
    let partial = PartialFile::for_dest(dest);
    let mut dst = tokio::fs::File::create(partial.path()).await?;

    let fetched = match bot.download_file(&file.path, &mut dst).await {
        Ok(()) => dst.flush().await.map_err(anyhow::Error::from),
        Err(e) => Err(e.into()),
    };
    drop(dst);

    match fetched {
        Ok(()) => Ok(partial.commit()?),
        Err(e) => {
            partial.discard();
            Err(e)
        }
    }
}
