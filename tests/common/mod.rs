#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use dispatch_desk::{
    base::config::ConfigInner,
    prelude::*,
    service::{
        geocode::{GenericGeocodeClient, GeocodeHit},
        llm::GenericLlmClient,
        mail::{GenericMailClient, InboxMessage, MailError, OutgoingMail},
    },
};
use mockall::mock;

// Mocks.

// Mock LLM client for testing.

mock! {
    pub Llm {}

    #[async_trait]
    impl GenericLlmClient for Llm {
        async fn generate_reply(&self, email_body: &str) -> Res<String>;
        async fn classify_email(&self, content: &str) -> Res<String>;
        async fn summarize_email(&self, title: &str, from: &str, body: &str) -> Res<String>;
        async fn sales_assistant_reply(&self, history: &[ChatMessage]) -> Res<String>;
    }
}

// Mock mail client for testing.

mock! {
    pub Mail {}

    #[async_trait]
    impl GenericMailClient for Mail {
        async fn fetch_recent(&self, limit: usize) -> Res<Vec<InboxMessage>>;
        async fn mark_seen(&self, uid: u32) -> Void;
        async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
    }
}

// Mock geocoding client for testing.

mock! {
    pub Geocode {}

    #[async_trait]
    impl GenericGeocodeClient for Geocode {
        async fn search(&self, query: &str, limit: usize) -> Res<Vec<GeocodeHit>>;
    }
}

/// Configuration with the poller off and no real credentials.
pub fn test_config() -> Config {
    Config::from(ConfigInner {
        openai_api_key: "test".to_string(),
        mail_username: "desk@example.com".to_string(),
        mail_password: "secret".to_string(),
        inbox_poll_enabled: false,
        ..Default::default()
    })
}

/// Helper function to setup the test environment around the given mocks.
pub async fn setup_runtime(llm: MockLlm, mail: MockMail, geocode: MockGeocode) -> Runtime {
    // Initialize the database (using in-memory for tests).
    let db = DbClient::surreal_memory().await.expect("Failed to create DB client");

    Runtime {
        config: test_config(),
        db,
        llm: LlmClient::new(Arc::new(llm)),
        mail: MailClient::new(Arc::new(mail)),
        geocode: GeocodeClient::new(Arc::new(geocode)),
    }
}

pub fn inbox_message(uid: u32, subject: &str, body: &str, seen: bool) -> InboxMessage {
    InboxMessage {
        uid,
        sender: format!("customer{uid}@example.com"),
        subject: subject.to_string(),
        date: "Mon, 1 Sep 2025 10:00:00 +0000".to_string(),
        seen,
        body: body.to_string(),
    }
}
