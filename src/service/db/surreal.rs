//! SurrealDB implementation for inbox state storage.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use serde_json::json;
use surrealdb::{
    Action, Notification, Surreal,
    engine::any::{self, Any},
    method::Stream,
    opt::auth::Root,
};
use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{EmailCategory, Res, Void},
    },
    service::mail::InboxMessage,
};

use super::{DbClient, EmailAction, EmailEvent, EmailRecord, GenericDbClient};

const EMAIL_TABLE: &str = "email";

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Connect to the database named by the configuration.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let client = SurrealDbClient::new(config).await?;
        Ok(Self { inner: Arc::new(client) })
    }

    /// Create an in-memory database, mostly for tests.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::memory().await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Structs.

/// SurrealDB client implementation.
#[derive(Clone)]
pub struct SurrealDbClient {
    db: Surreal<Any>,
}

impl SurrealDbClient {
    /// Create a new database client from the configured endpoint.
    ///
    /// `memory` (or any `mem://` endpoint) runs embedded; anything else is treated as a
    /// remote server and signed into with the root credentials.
    #[instrument(name = "SurrealDbClient::new", skip_all, fields(endpoint = %config.db_endpoint))]
    pub async fn new(config: &Config) -> Res<Self> {
        if config.db_endpoint == "memory" || config.db_endpoint.starts_with("mem://") {
            return Self::memory().await;
        }

        let db = any::connect(config.db_endpoint.as_str()).await?;

        db.signin(Root {
            username: &config.db_username,
            password: &config.db_password,
        })
        .await?;

        Self::init(db).await
    }

    /// Create an embedded in-memory database.
    #[instrument(name = "SurrealDbClient::memory", skip_all)]
    pub async fn memory() -> Res<Self> {
        let db = any::connect("mem://").await?;

        Self::init(db).await
    }

    async fn init(db: Surreal<Any>) -> Res<Self> {
        db.use_ns("dispatch").use_db("desk").await?;

        // Schema for inbox state; fields stay flexible so external taggers can add columns.
        db.query("DEFINE TABLE IF NOT EXISTS email SCHEMALESS").await?;
        db.query("DEFINE INDEX IF NOT EXISTS email_uid ON email FIELDS uid UNIQUE").await?;

        info!("Database initialized successfully.");

        Ok(Self { db })
    }

    /// Merge `patch` into the record, creating it when missing.
    async fn merge_email(&self, uid: u32, patch: serde_json::Value) -> Void {
        let _: Option<EmailRecord> = self.db.upsert((EMAIL_TABLE, i64::from(uid))).merge(patch).await?;

        Ok(())
    }
}

fn to_event(notification: Notification<EmailRecord>) -> Option<EmailEvent> {
    let action = match notification.action {
        Action::Create => EmailAction::Create,
        Action::Update => EmailAction::Update,
        Action::Delete => EmailAction::Delete,
        _ => return None,
    };

    Some(EmailEvent {
        action,
        email: notification.data,
    })
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self))]
    async fn get_email(&self, uid: u32) -> Res<Option<EmailRecord>> {
        let record: Option<EmailRecord> = self.db.select((EMAIL_TABLE, i64::from(uid))).await?;

        Ok(record)
    }

    #[instrument(skip_all, fields(uid = record.uid))]
    async fn upsert_email(&self, record: &EmailRecord) -> Void {
        let _: Option<EmailRecord> = self.db.upsert((EMAIL_TABLE, i64::from(record.uid))).content(record.clone()).await?;

        Ok(())
    }

    #[instrument(skip_all, fields(uid = message.uid))]
    async fn store_message(&self, message: &InboxMessage) -> Void {
        let patch = json!({
            "uid": message.uid,
            "sender": message.sender,
            "title": message.subject,
            "date": message.date,
            "body": message.body,
            "read": message.seen,
        });

        self.merge_email(message.uid, patch).await
    }

    #[instrument(skip(self))]
    async fn set_category(&self, uid: u32, category: EmailCategory) -> Void {
        self.merge_email(uid, json!({ "uid": uid, "category": category, "categorized": true })).await
    }

    #[instrument(skip(self))]
    async fn mark_replied(&self, uid: u32) -> Void {
        self.merge_email(uid, json!({ "uid": uid, "replied": true })).await
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, uid: u32) -> Void {
        self.merge_email(uid, json!({ "uid": uid, "read": true })).await
    }

    #[instrument(skip(self, summary))]
    async fn set_summary(&self, uid: u32, summary: &str) -> Void {
        self.merge_email(uid, json!({ "uid": uid, "summary": summary })).await
    }

    #[instrument(skip(self))]
    async fn list_emails(&self) -> Res<Vec<EmailRecord>> {
        let mut response = self.db.query("SELECT * FROM type::table($table) ORDER BY uid DESC").bind(("table", EMAIL_TABLE)).await?;
        let records: Vec<EmailRecord> = response.take(0)?;

        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get_email_live_query(&self) -> Res<BoxStream<'static, Res<EmailEvent>>> {
        let stream: Stream<Vec<EmailRecord>> = self.db.select(EMAIL_TABLE).live().await?;

        let events = stream.filter_map(|notification| async move {
            match notification {
                Ok(notification) => to_event(notification).map(Ok),
                Err(err) => {
                    warn!("Live query error: {err}");
                    Some(Err(err.into()))
                }
            }
        });

        Ok(events.boxed())
    }
}
