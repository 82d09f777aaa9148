//! Inbox workflows: syncing, classifying, replying and summarizing.

use std::{
    collections::{BTreeMap, HashSet},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{Instrument, debug, error, info, instrument, warn};

use crate::{
    base::types::{Email, EmailCategory, ReadState, ReplyState, Res, Void},
    service::{
        db::{DbClient, EmailRecord},
        llm::LlmClient,
        mail::{InboxMessage, MailClient, MailError, OutgoingMail},
    },
};

/// Subject used when a reply does not carry one.
pub const DEFAULT_REPLY_SUBJECT: &str = "Re: Your email";

// Classification.

/// Classify a message, reusing the stored category when there is one.
///
/// Never fails: any error is logged and the message is treated as [`EmailCategory::Other`].
#[instrument(skip(db, llm, content))]
pub async fn classify(db: &DbClient, llm: &LlmClient, uid: u32, content: &str) -> EmailCategory {
    match classify_internal(db, llm, uid, content).await {
        Ok(category) => category,
        Err(err) => {
            error!("Error classifying email {uid}: {err}");
            EmailCategory::Other
        }
    }
}

async fn classify_internal(db: &DbClient, llm: &LlmClient, uid: u32, content: &str) -> Res<EmailCategory> {
    match db.get_email(uid).await? {
        Some(EmailRecord {
            categorized: true,
            category: Some(category),
            ..
        }) => {
            debug!("Email {uid} already classified as `{category}`.");
            return Ok(category);
        }
        Some(_) => {}
        None => db.upsert_email(&EmailRecord::new(uid)).await?,
    }

    let answer = llm.classify_email(content).await?;
    let category = EmailCategory::from_answer(&answer);

    db.set_category(uid, category).await?;
    info!("Email {uid} classified as `{category}`.");

    Ok(category)
}

// Sync.

/// Fetch the most recent messages, store and classify them, and return dashboard rows.
///
/// A message that fails to store is logged and skipped.
#[instrument(skip(db, llm, mail))]
pub async fn sync_inbox(db: &DbClient, llm: &LlmClient, mail: &MailClient, limit: usize) -> Res<Vec<Email>> {
    let messages = mail.fetch_recent(limit).await?;

    let mut emails = Vec::with_capacity(messages.len());

    for message in messages {
        let uid = message.uid;

        match sync_message(db, llm, message).await {
            Ok(email) => emails.push(email),
            Err(err) => error!("Error processing email {uid}: {err}"),
        }
    }

    Ok(emails)
}

async fn sync_message(db: &DbClient, llm: &LlmClient, message: InboxMessage) -> Res<Email> {
    // Only the fields the mail server owns; flags written by other requests must survive.
    db.store_message(&message).await?;

    let classification = classify(db, llm, message.uid, &message.body).await;

    let replied = match db.get_email(message.uid).await {
        Ok(stored) => stored.is_some_and(|stored| stored.replied),
        Err(err) => {
            warn!("Could not read the replied flag for email {}: {err}", message.uid);
            false
        }
    };

    Ok(to_email(message, classification, replied))
}

/// Shape an inbox message as a dashboard row.
pub fn to_email(message: InboxMessage, classification: EmailCategory, replied: bool) -> Email {
    let body = message.body.trim();

    Email {
        id: message.uid,
        from: message.sender.clone(),
        title: message.subject,
        date: message.date,
        read: ReadState::from(message.seen),
        replied: ReplyState::from(replied),
        classification,
        body: if body.is_empty() { "No content".to_string() } else { body.to_string() },
        email: message.sender,
    }
}

/// Shape a stored record as a dashboard row.
pub fn record_to_email(record: EmailRecord) -> Email {
    let body = record.body.trim();

    Email {
        id: record.uid,
        from: record.sender.clone(),
        title: record.title,
        date: record.date,
        read: ReadState::from(record.read),
        replied: ReplyState::from(record.replied),
        classification: record.category.unwrap_or(EmailCategory::Other),
        body: if body.is_empty() { "No content".to_string() } else { body.to_string() },
        email: record.sender,
    }
}

/// Prepend the incoming emails whose ids are not already listed.
pub fn merge_new(existing: Vec<Email>, incoming: Vec<Email>) -> Vec<Email> {
    let known: HashSet<u32> = existing.iter().map(|email| email.id).collect();

    let mut merged: Vec<Email> = incoming.into_iter().filter(|email| !known.contains(&email.id)).collect();
    merged.extend(existing);

    merged
}

/// Periodically sync the inbox in the background.
///
/// Each sync runs to completion before the next tick is taken; ticks missed meanwhile are skipped.
#[instrument(skip(db, llm, mail))]
pub fn spawn_inbox_poller(db: DbClient, llm: LlmClient, mail: MailClient, period: Duration, limit: usize) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                let (db, llm, mail) = (db.clone(), llm.clone(), mail.clone());

                // Process the sync; a panic surfaces as a join error instead of stopping the poller.
                let result = tokio::spawn(async move { sync_inbox(&db, &llm, &mail, limit).await }.in_current_span()).await;

                // Log any errors.
                match result {
                    Ok(Ok(emails)) => debug!("Background sync saw {} emails.", emails.len()),
                    Ok(Err(err)) => error!("Error while syncing inbox: {err}"),
                    Err(err) => error!("Inbox sync task failed: {err}"),
                }
            }
        }
        .in_current_span(),
    )
}

// Mark seen.

/// Mark a message as seen on the server and in the store.
#[instrument(skip(db, mail))]
pub async fn mark_seen(db: &DbClient, mail: &MailClient, uid: u32) -> Void {
    mail.mark_seen(uid).await?;
    db.mark_read(uid).await?;

    Ok(())
}

// Replies.

/// A reply drafted in the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub subject: Option<String>,
    /// UID of the message being answered, if any.
    #[serde(default)]
    pub id: Option<u32>,
}

/// Send a reply and, when it answers a stored message, flag that message as replied.
#[instrument(skip_all, fields(uid = request.id))]
pub async fn send_reply(db: &DbClient, mail: &MailClient, request: &ReplyRequest) -> Result<(), MailError> {
    let to = request.to.trim();

    if to.is_empty() || request.reply.trim().is_empty() {
        return Err(MailError::Incomplete);
    }

    let subject = request.subject.as_deref().map(str::trim).filter(|subject| !subject.is_empty()).unwrap_or(DEFAULT_REPLY_SUBJECT);

    let outgoing = OutgoingMail {
        to: to.to_string(),
        subject: subject.to_string(),
        body: request.reply.clone(),
    };

    mail.send(&outgoing).await?;

    if let Some(uid) = request.id {
        // The mail is already out; a store failure only costs the badge.
        if let Err(err) = db.mark_replied(uid).await {
            error!("Failed to mark email {uid} as replied: {err}");
        }
    }

    Ok(())
}

// Summaries.

/// Summarize a message and keep the summary on its record.
#[instrument(skip(db, llm, title, from, body))]
pub async fn summarize(db: &DbClient, llm: &LlmClient, uid: u32, title: &str, from: &str, body: &str) -> Res<String> {
    let summary = llm.summarize_email(title, from, body).await?;

    if let Err(err) = db.set_summary(uid, &summary).await {
        warn!("Failed to store summary for email {uid}: {err}");
    }

    Ok(summary)
}

// Stored records.

/// Filters accepted by the stored-email listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct StoredFilter {
    pub classification: Option<EmailCategory>,
    pub read: Option<ReadState>,
    pub replied: Option<ReplyState>,
}

impl StoredFilter {
    pub fn matches(&self, record: &EmailRecord) -> bool {
        self.classification.is_none_or(|category| record.category.unwrap_or(EmailCategory::Other) == category)
            && self.read.is_none_or(|read| ReadState::from(record.read) == read)
            && self.replied.is_none_or(|replied| ReplyState::from(record.replied) == replied)
    }
}

/// Stored records matching `filter`, newest first.
#[instrument(skip(db))]
pub async fn stored_emails(db: &DbClient, filter: StoredFilter) -> Res<Vec<Email>> {
    let records = db.list_emails().await?;

    Ok(records.into_iter().filter(|record| filter.matches(record)).map(record_to_email).collect())
}

// Dashboard.

/// Counts shown on the dashboard cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboxSummary {
    pub total: usize,
    pub unread: usize,
    pub replied: usize,
    pub awaiting_reply: usize,
    pub uncategorized: usize,
    pub by_category: BTreeMap<EmailCategory, usize>,
}

impl InboxSummary {
    pub fn from_records(records: &[EmailRecord]) -> Self {
        let mut summary = Self {
            by_category: EmailCategory::ALL.into_iter().map(|category| (category, 0)).collect(),
            ..Default::default()
        };

        for record in records {
            summary.total += 1;

            if !record.read {
                summary.unread += 1;
            }

            if record.replied {
                summary.replied += 1;
            } else {
                summary.awaiting_reply += 1;
            }

            match record.category {
                Some(category) if record.categorized => *summary.by_category.entry(category).or_default() += 1,
                _ => summary.uncategorized += 1,
            }
        }

        summary
    }
}

/// Dashboard card counts over every stored record.
#[instrument(skip(db))]
pub async fn summary(db: &DbClient) -> Res<InboxSummary> {
    let records = db.list_emails().await?;

    Ok(InboxSummary::from_records(&records))
}
