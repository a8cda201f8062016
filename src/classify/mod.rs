//! Decides which messages count as pending automated notifications.

use crate::source::message::Message;

/// Subtypes that are never notifications, even when posted by a bot or app.
/// Checked before any positive signal.
pub const EXCLUDED_SUBTYPES: [&str; 3] = ["channel_join", "channel_leave", "thread_broadcast"];

const BOT_MESSAGE_SUBTYPE: &str = "bot_message";

/// Returns true if the message was posted by a bot or app integration.
pub fn is_notification(message: Option<&Message>) -> bool {
    let Some(message) = message else {
        return false;
    };

    if let Some(subtype) = message.subtype.as_deref() {
        if EXCLUDED_SUBTYPES.contains(&subtype) {
            return false;
        }
    }

    message.subtype.as_deref() == Some(BOT_MESSAGE_SUBTYPE)
        || is_present(message.bot_id.as_deref())
        || is_present(message.app_id.as_deref())
}

/// Returns true if the message carries at least one reaction.
pub fn has_reactions(message: Option<&Message>) -> bool {
    message
        .and_then(|m| m.reactions.as_ref())
        .is_some_and(|reactions| !reactions.is_empty())
}

/// A notification nobody has reacted to yet.
pub fn is_pending(message: Option<&Message>) -> bool {
    is_notification(message) && !has_reactions(message)
}

fn is_present(field: Option<&str>) -> bool {
    field.is_some_and(|value| !value.is_empty())
}

impl Message {
    pub fn is_notification(&self) -> bool {
        is_notification(Some(self))
    }

    pub fn has_reactions(&self) -> bool {
        has_reactions(Some(self))
    }

    pub fn is_pending(&self) -> bool {
        is_pending(Some(self))
    }
}
