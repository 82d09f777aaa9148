//! IMAP + SMTP implementation of the mail client.
//!
//! The `imap` crate is blocking, so every mailbox session runs on the blocking pool.

use std::{net::TcpStream, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use imap::types::Flag;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{self, authentication::Credentials},
};
use native_tls::{TlsConnector, TlsStream};
use tracing::{debug, info, instrument, warn};

use crate::base::{
    config::Config,
    types::{Res, Void},
};

use super::{GenericMailClient, InboxMessage, MailClient, MailError, OutgoingMail, parse::parse_message};

type ImapSession = imap::Session<TlsStream<TcpStream>>;

// Extra methods on `MailClient` applied by the imap implementation.

impl MailClient {
    pub fn imap(config: &Config) -> Res<Self> {
        let client = ImapSmtpMailClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Specific implementations.

/// Mail client that reads over IMAPS and sends over SMTPS.
#[derive(Clone)]
pub struct ImapSmtpMailClient {
    imap_server: String,
    imap_port: u16,
    username: String,
    password: String,
    from: String,
    smtp: AsyncSmtpTransport<Tokio1Executor>,
}

impl ImapSmtpMailClient {
    #[instrument(name = "ImapSmtpMailClient::new", skip_all, fields(imap = %config.imap_server, smtp = %config.smtp_server))]
    pub fn new(config: &Config) -> Res<Self> {
        let smtp = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_server)
            .with_context(|| format!("Invalid SMTP relay `{}`", config.smtp_server))?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.mail_username.clone(), config.mail_password.clone()))
            .build();

        Ok(Self {
            imap_server: config.imap_server.clone(),
            imap_port: config.imap_port,
            username: config.mail_username.clone(),
            password: config.mail_password.clone(),
            from: config.sender_address().to_string(),
            smtp,
        })
    }

    /// Open an authenticated session with `INBOX` selected.
    fn open_session(server: &str, port: u16, username: &str, password: &str) -> Res<ImapSession> {
        let tls = TlsConnector::builder().build()?;
        let client = imap::connect((server, port), server, &tls).with_context(|| format!("Failed to connect to `{server}:{port}`"))?;

        let mut session = client.login(username, password).map_err(|(err, _)| anyhow::anyhow!("IMAP login failed: {err}"))?;
        session.select("INBOX")?;

        Ok(session)
    }

    /// Run `f` against a fresh session on the blocking pool, logging out afterwards.
    async fn with_session<T, F>(&self, f: F) -> Res<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ImapSession) -> Res<T> + Send + 'static,
    {
        let server = self.imap_server.clone();
        let port = self.imap_port;
        let username = self.username.clone();
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || {
            let mut session = Self::open_session(&server, port, &username, &password)?;
            let result = f(&mut session);

            if let Err(err) = session.logout() {
                debug!("IMAP logout failed: {err}");
            }

            result
        })
        .await?
    }
}

/// The `limit` highest UIDs, highest first.
fn newest_uids(uids: impl IntoIterator<Item = u32>, limit: usize) -> Vec<u32> {
    let mut uids: Vec<u32> = uids.into_iter().collect();
    uids.sort_unstable_by(|a, b| b.cmp(a));
    uids.dedup();
    uids.truncate(limit);
    uids
}

fn fetch_messages(session: &mut ImapSession, limit: usize) -> Res<Vec<InboxMessage>> {
    let uids = newest_uids(session.uid_search("ALL")?, limit);

    if uids.is_empty() {
        return Ok(Vec::new());
    }

    let set = uids.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
    let fetches = session.uid_fetch(&set, "(UID FLAGS BODY.PEEK[])")?;

    let mut messages = Vec::with_capacity(fetches.len());

    for fetch in fetches.iter() {
        let Some(uid) = fetch.uid else {
            continue;
        };

        let Some(raw) = fetch.body() else {
            warn!("Message {uid} has no body; skipping.");
            continue;
        };

        let seen = fetch.flags().iter().any(|flag| matches!(flag, Flag::Seen));

        match parse_message(uid, seen, raw) {
            Ok(message) => messages.push(message),
            Err(err) => warn!("Failed to parse message {uid}: {err}"),
        }
    }

    // Servers may answer in any order.
    messages.sort_unstable_by(|a, b| b.uid.cmp(&a.uid));

    Ok(messages)
}

/// Authentication replies are the 53x family (530, 534, 535).
fn is_auth_failure(err: &smtp::Error) -> bool {
    err.status().is_some_and(|code| code.to_string().starts_with("53"))
}

#[async_trait]
impl GenericMailClient for ImapSmtpMailClient {
    #[instrument(name = "ImapSmtpMailClient::fetch_recent", skip(self))]
    async fn fetch_recent(&self, limit: usize) -> Res<Vec<InboxMessage>> {
        let messages = self.with_session(move |session| fetch_messages(session, limit)).await?;

        info!("Fetched {} messages.", messages.len());

        Ok(messages)
    }

    #[instrument(name = "ImapSmtpMailClient::mark_seen", skip(self))]
    async fn mark_seen(&self, uid: u32) -> Void {
        self.with_session(move |session| {
            session.uid_store(uid.to_string(), "+FLAGS (\\Seen)")?;
            Ok(())
        })
        .await
    }

    #[instrument(name = "ImapSmtpMailClient::send", skip_all, fields(to = %mail.to))]
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let from: Mailbox = self.from.parse().map_err(|_| MailError::InvalidAddress(self.from.clone()))?;
        let to: Mailbox = mail.to.parse().map_err(|_| MailError::InvalidAddress(mail.to.clone()))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|err| MailError::Other(err.into()))?;

        match self.smtp.send(message).await {
            Ok(_) => {
                info!("Reply sent.");
                Ok(())
            }
            Err(err) if is_auth_failure(&err) => {
                warn!("SMTP authentication failed: {err}");
                Err(MailError::Authentication)
            }
            Err(err) => Err(MailError::Transport(err.to_string())),
        }
    }
}
