pub mod openai;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{ChatMessage, Res};

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// This trait defines the core functionality for interacting with large language models.
/// Implementing this trait allows different LLM providers to be used with the dispatch desk.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Draft a professional reply to an email body.
    async fn generate_reply(&self, email_body: &str) -> Res<String>;

    /// Classify an email.
    ///
    /// Returns the raw model answer; callers normalize it into a category.
    async fn classify_email(&self, content: &str) -> Res<String>;

    /// Summarize an email for the inbox drawer.
    async fn summarize_email(&self, title: &str, from: &str, body: &str) -> Res<String>;

    /// Continue a sales assistant conversation.
    ///
    /// The history ends with the user message that should be answered.
    async fn sales_assistant_reply(&self, history: &[ChatMessage]) -> Res<String>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }
}
