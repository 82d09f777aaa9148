//! Common imports for the crate's modules and tests.

pub use crate::{
    base::{
        config::Config,
        types::{ChatMessage, ChatSender, Email, EmailCategory, Err, Res, Void},
    },
    runtime::Runtime,
    service::{db::DbClient, geocode::GeocodeClient, llm::LlmClient, mail::MailClient},
};
pub use anyhow::anyhow;
pub use tracing::{debug, error, info, instrument, warn};
