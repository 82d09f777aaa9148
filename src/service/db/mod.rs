use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::{
    base::types::{EmailCategory, Res, Void},
    service::mail::InboxMessage,
};

pub mod surreal;

// Types.

/// Stored state of an inbox message, keyed by its IMAP UID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailRecord {
    pub uid: u32,
    pub sender: String,
    pub title: String,
    pub date: String,
    pub body: String,
    pub read: bool,
    pub category: Option<EmailCategory>,
    pub categorized: bool,
    pub replied: bool,
    pub summary: Option<String>,
    /// Free-text tone tag written by an external classifier; display only.
    pub emotion: Option<String>,
}

impl EmailRecord {
    pub fn new(uid: u32) -> Self {
        Self { uid, ..Default::default() }
    }
}

/// Kind of change reported by the live query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailAction {
    Create,
    Update,
    Delete,
}

impl EmailAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// A single change to the `email` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailEvent {
    pub action: EmailAction,
    pub email: EmailRecord,
}

// Traits.

/// Generic database client trait that clients must implement.
///
/// This trait defines the core functionality for storing and retrieving inbox
/// state. Implementing this trait allows different database backends to be used
/// with the dispatch desk.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Gets the email record by UID, if it has been stored.
    async fn get_email(&self, uid: u32) -> Res<Option<EmailRecord>>;

    /// Inserts or replaces the whole record.
    async fn upsert_email(&self, record: &EmailRecord) -> Void;

    /// Writes the mail-derived fields of a fetched message, leaving every other field as stored.
    async fn store_message(&self, message: &InboxMessage) -> Void;

    /// Stores the category and flags the record as categorized.
    async fn set_category(&self, uid: u32, category: EmailCategory) -> Void;

    /// Flags the record as replied.
    async fn mark_replied(&self, uid: u32) -> Void;

    /// Flags the record as read.
    async fn mark_read(&self, uid: u32) -> Void;

    /// Stores a generated summary on the record.
    async fn set_summary(&self, uid: u32, summary: &str) -> Void;

    /// Lists every stored record, newest (highest UID) first.
    async fn list_emails(&self) -> Res<Vec<EmailRecord>>;

    /// Starts a stream of a live query for email records.
    async fn get_email_live_query(&self) -> Res<BoxStream<'static, Res<EmailEvent>>>;
}

/// Database client for the dispatch desk.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }
}
