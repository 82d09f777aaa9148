//! Integration with Large Language Model services.
//!
//! This module provides a thin wrapper around the OpenAI chat completions API for
//! drafting replies, classifying and summarizing inbox messages, and powering the
//! sales assistant.

use std::{sync::Arc, time::Duration};

use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::base::{
    config::Config,
    prompts::{classifier_content, reply_prompt, summary_prompt},
    types::{ChatMessage, ChatSender, Res},
};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// Sampling parameters for one kind of request.
struct Sampling<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
}

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        Self {
            client: Client::with_config(cfg),
            config: config.clone(),
        }
    }

    fn reply_sampling(&self) -> Sampling<'_> {
        Sampling {
            model: &self.config.openai_reply_model,
            temperature: self.config.openai_reply_temperature,
            max_tokens: self.config.openai_reply_max_tokens,
        }
    }

    fn classifier_sampling(&self) -> Sampling<'_> {
        Sampling {
            model: &self.config.openai_classifier_model,
            temperature: self.config.openai_classifier_temperature,
            max_tokens: self.config.openai_classifier_max_tokens,
        }
    }

    fn assistant_sampling(&self) -> Sampling<'_> {
        Sampling {
            model: &self.config.openai_assistant_model,
            temperature: self.config.openai_assistant_temperature,
            max_tokens: self.config.openai_assistant_max_tokens,
        }
    }

    /// Build a system + user message pair.
    fn build_single_turn(&self, system: &str, user: String) -> Res<Vec<ChatCompletionRequestMessage>> {
        Ok(vec![
            ChatCompletionRequestSystemMessageArgs::default().content(system.to_string()).build()?.into(),
            ChatCompletionRequestUserMessageArgs::default().content(user).build()?.into(),
        ])
    }

    /// Build the sales assistant conversation, replaying the transcript in order.
    fn build_conversation(&self, history: &[ChatMessage]) -> Res<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 1);

        messages.push(ChatCompletionRequestSystemMessageArgs::default().content(self.config.sales_assistant_system_directive.clone()).build()?.into());

        for message in history {
            let message: ChatCompletionRequestMessage = match message.sender {
                ChatSender::User => ChatCompletionRequestUserMessageArgs::default().content(message.text.clone()).build()?.into(),
                ChatSender::Bot => ChatCompletionRequestAssistantMessageArgs::default().content(message.text.clone()).build()?.into(),
            };

            messages.push(message);
        }

        Ok(messages)
    }

    /// Run a completion and return the trimmed text of the first choice.
    async fn complete(&self, sampling: Sampling<'_>, messages: Vec<ChatCompletionRequestMessage>) -> Res<String> {
        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(sampling.model).messages(messages).temperature(sampling.temperature).max_completion_tokens(sampling.max_tokens);

        let response = self.call_openai_api(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("OpenAI returned no message content."))?;

        Ok(content.trim().to_string())
    }

    /// Helper function to make OpenAI API calls with retry logic and timeout handling.
    async fn call_openai_api(&self, request_builder: CreateChatCompletionRequestArgs) -> Res<CreateChatCompletionResponse> {
        const MAX_RETRIES: u32 = 3;
        const TIMEOUT: u64 = 60;
        const RETRY_DELAY_MS: u64 = 1000;

        let mut retries = 0;

        loop {
            let request = request_builder.build()?;
            let result = timeout(Duration::from_secs(TIMEOUT), self.client.chat().create(request)).await;

            match result {
                Ok(Ok(response)) => {
                    info!("OpenAI API call succeeded after {} attempts", retries + 1);
                    return Ok(response);
                }
                Ok(Err(err)) if !is_retryable(&err) => {
                    return Err(anyhow::anyhow!("OpenAI API call rejected: {err}"));
                }
                Ok(Err(err)) => {
                    if retries >= MAX_RETRIES {
                        return Err(anyhow::anyhow!("OpenAI API call failed after {MAX_RETRIES} retries: {err}"));
                    }
                    retries += 1;
                    warn!("OpenAI API call failed, retrying {retries}/{MAX_RETRIES}: {err}");

                    let delay = Duration::from_millis(RETRY_DELAY_MS * 2_u64.pow(retries - 1));
                    tokio::time::sleep(delay).await;
                }
                Err(_) => {
                    if retries >= MAX_RETRIES {
                        return Err(anyhow::anyhow!("OpenAI API call timed out after {MAX_RETRIES} attempts"));
                    }
                    retries += 1;
                    warn!("OpenAI API call timed out, retrying {retries}/{MAX_RETRIES}");

                    let delay = Duration::from_millis(RETRY_DELAY_MS * 2_u64.pow(retries - 1));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Error types the API uses for requests that will fail the same way again.
const NON_RETRYABLE_ERROR_TYPES: [&str; 5] = ["invalid_request_error", "authentication_error", "permission_error", "not_found_error", "insufficient_quota"];

/// Rejected requests and bad credentials fail the same way on every attempt.
fn is_retryable(err: &OpenAIError) -> bool {
    match err {
        OpenAIError::ApiError(api) => !api.r#type.as_deref().is_some_and(|kind| NON_RETRYABLE_ERROR_TYPES.contains(&kind)),
        OpenAIError::InvalidArgument(_) => false,
        _ => true,
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::generate_reply", skip_all)]
    async fn generate_reply(&self, email_body: &str) -> Res<String> {
        let messages = self.build_single_turn(&self.config.reply_system_directive, reply_prompt(email_body))?;

        self.complete(self.reply_sampling(), messages).await
    }

    #[instrument(name = "OpenAiLlmClient::classify_email", skip_all)]
    async fn classify_email(&self, content: &str) -> Res<String> {
        let messages = self.build_single_turn(&self.config.classifier_system_directive, classifier_content(content).to_string())?;

        let answer = self.complete(self.classifier_sampling(), messages).await?;
        debug!("Classifier answered `{answer}`");

        Ok(answer)
    }

    #[instrument(name = "OpenAiLlmClient::summarize_email", skip_all)]
    async fn summarize_email(&self, title: &str, from: &str, body: &str) -> Res<String> {
        let messages = self.build_single_turn(&self.config.summary_system_directive, summary_prompt(title, from, body))?;

        self.complete(self.assistant_sampling(), messages).await
    }

    #[instrument(name = "OpenAiLlmClient::sales_assistant_reply", skip_all, fields(turns = history.len()))]
    async fn sales_assistant_reply(&self, history: &[ChatMessage]) -> Res<String> {
        let messages = self.build_conversation(history)?;

        self.complete(self.assistant_sampling(), messages).await
    }
}
