//! Runtime services and shared state for the dispatch desk.

use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::inbox,
    server,
    service::{db::DbClient, geocode::GeocodeClient, llm::LlmClient, mail::MailClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the service clients and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The database client instance.
    pub db: DbClient,
    /// The LLM client instance.
    pub llm: LlmClient,
    /// The mailbox client instance.
    pub mail: MailClient,
    /// The location search client instance.
    pub geocode: GeocodeClient,
}

impl Runtime {
    /// Create a new runtime instance with the default service implementations.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the database.
        let db = DbClient::surreal(&config).await?;

        // Initialize the LLM client.
        let llm = LlmClient::openai(&config);

        // Initialize the mail client.
        let mail = MailClient::imap(&config)?;

        // Initialize the geocoding client.
        let geocode = GeocodeClient::nominatim(&config)?;

        Ok(Self { config, db, llm, mail, geocode })
    }

    /// Start the background inbox poller (when enabled) and serve the API until shutdown.
    pub async fn start(&self) -> Void {
        let poller = self.config.inbox_poll_enabled.then(|| {
            info!("Polling the inbox every {}s.", self.config.inbox_poll_interval_secs);

            inbox::spawn_inbox_poller(
                self.db.clone(),
                self.llm.clone(),
                self.mail.clone(),
                std::time::Duration::from_secs(self.config.inbox_poll_interval_secs),
                self.config.inbox_batch_size,
            )
        });

        let result = server::serve(self.clone()).await;

        if let Some(poller) = poller {
            poller.abort();
        }

        result
    }
}
