//! Sales assistant chat.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::{
    base::types::{ChatMessage, ChatSender},
    service::llm::LlmClient,
};

pub const GREETING: &str = "Hello! I'm your sales assistant. How can I help you today?";

/// Replies used when the assistant model is unavailable.
pub const CANNED_REPLIES: [&str; 6] = [
    "I'm checking on that for you. One moment...",
    "Can you provide the customer ID or order number?",
    "That sounds like a great opportunity! Let me pull up the relevant product information.",
    "I see. Based on our current inventory, I can suggest an alternative.",
    "Thank you for the update. I have logged it in the system.",
    "I'm sorry, I'm just a demo bot and can't process that specific request yet.",
];

/// The message that opens every conversation.
pub fn greeting() -> ChatMessage {
    ChatMessage {
        id: 1,
        text: GREETING.to_string(),
        sender: ChatSender::Bot,
    }
}

/// One round trip: the user's message and the bot's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub user: ChatMessage,
    pub bot: ChatMessage,
}

fn canned_reply() -> &'static str {
    CANNED_REPLIES.choose(&mut rand::thread_rng()).copied().unwrap_or(CANNED_REPLIES[0])
}

/// Answer `input` in the context of `history`.
///
/// Returns `None` for blank input.
#[instrument(skip_all, fields(turns = history.len()))]
pub async fn respond(llm: &LlmClient, history: &[ChatMessage], input: &str) -> Option<ChatExchange> {
    if input.trim().is_empty() {
        return None;
    }

    let user = ChatMessage {
        id: chrono::Utc::now().timestamp_millis(),
        text: input.to_string(),
        sender: ChatSender::User,
    };

    let mut transcript = history.to_vec();
    transcript.push(user.clone());

    let text = match llm.sales_assistant_reply(&transcript).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("Sales assistant returned an empty reply; using a canned one.");
            canned_reply().to_string()
        }
        Err(err) => {
            warn!("Sales assistant unavailable, using a canned reply: {err}");
            canned_reply().to_string()
        }
    };

    let bot = ChatMessage {
        id: user.id + 1,
        text,
        sender: ChatSender::Bot,
    };

    Some(ChatExchange { user, bot })
}
