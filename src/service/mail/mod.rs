//! Mailbox access for the dispatch desk.
//!
//! This module reads the inbox and sends replies:
//! - Fetching the most recent messages with their read state
//! - Marking messages as seen
//! - Sending plain-text replies
//!
//! It defines the `GenericMailClient` trait that can be implemented for different
//! mail providers, with a default implementation over IMAP and SMTP.

pub mod imap;
pub mod parse;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::base::types::{Res, Void};

// Types.

/// A message read from the inbox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub uid: u32,
    /// Bare sender address, e.g. `ana@example.com`.
    pub sender: String,
    pub subject: String,
    /// Raw `Date` header.
    pub date: String,
    pub seen: bool,
    /// First plain-text part, undecorated.
    pub body: String,
}

/// A plain-text message to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Errors raised while sending mail.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Recipient and reply are required")]
    Incomplete,
    #[error("SMTP authentication failed")]
    Authentication,
    #[error("Invalid address `{0}`")]
    InvalidAddress(String),
    #[error("Failed to send email: {0}")]
    Transport(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// Traits.

/// Generic mail client trait that clients must implement.
#[async_trait]
pub trait GenericMailClient: Send + Sync + 'static {
    /// Fetch the `limit` most recent inbox messages, newest first.
    ///
    /// Fetching does not mark messages as seen.
    async fn fetch_recent(&self, limit: usize) -> Res<Vec<InboxMessage>>;

    /// Set the `\Seen` flag on a message.
    async fn mark_seen(&self, uid: u32) -> Void;

    /// Send a plain-text message from the configured account.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

// Structs.

/// Mail client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct MailClient {
    inner: Arc<dyn GenericMailClient>,
}

impl Deref for MailClient {
    type Target = dyn GenericMailClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl MailClient {
    pub fn new(inner: Arc<dyn GenericMailClient>) -> Self {
        Self { inner }
    }
}
