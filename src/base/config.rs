//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use crate::{base::prompts, pricing::FeeSettings};

use super::types::{Res, Void};

/// Default model used to draft email replies.
fn default_openai_reply_model() -> String {
    "gpt-4".to_string()
}

/// Default model used to classify inbox messages.
fn default_openai_classifier_model() -> String {
    "gpt-3.5-turbo".to_string()
}

/// Default model used by the sales assistant and for summaries.
fn default_openai_assistant_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_reply_temperature() -> f32 {
    0.5
}

fn default_openai_classifier_temperature() -> f32 {
    0.3
}

fn default_openai_assistant_temperature() -> f32 {
    0.7
}

fn default_openai_reply_max_tokens() -> u32 {
    300
}

fn default_openai_classifier_max_tokens() -> u32 {
    10
}

fn default_openai_assistant_max_tokens() -> u32 {
    500
}

fn default_reply_system_directive() -> String {
    prompts::REPLY_SYSTEM_DIRECTIVE.to_string()
}

fn default_classifier_system_directive() -> String {
    prompts::CLASSIFIER_SYSTEM_DIRECTIVE.to_string()
}

fn default_summary_system_directive() -> String {
    prompts::SUMMARY_SYSTEM_DIRECTIVE.to_string()
}

fn default_sales_assistant_system_directive() -> String {
    prompts::SALES_ASSISTANT_SYSTEM_DIRECTIVE.to_string()
}

fn default_imap_server() -> String {
    "imap.gmail.com".to_string()
}

fn default_imap_port() -> u16 {
    993
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_db_endpoint() -> String {
    "memory".to_string()
}

fn default_db_credential() -> String {
    "root".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_inbox_batch_size() -> usize {
    10
}

fn default_inbox_poll_interval_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_nominatim_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_driver_rate() -> f64 {
    FeeSettings::default().driver_rate
}

fn default_gas_price() -> f64 {
    FeeSettings::default().gas_price
}

fn default_mpg() -> f64 {
    FeeSettings::default().mpg
}

fn default_avg_speed() -> f64 {
    FeeSettings::default().avg_speed
}

fn default_margin() -> f64 {
    FeeSettings::default().margin
}

/// Configuration for the dispatch desk.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// OpenAI API key (`DISPATCH_DESK_OPENAI_API_KEY`).
    #[serde(default)]
    pub openai_api_key: String,
    /// Model used to draft replies (`DISPATCH_DESK_OPENAI_REPLY_MODEL`).
    #[serde(default = "default_openai_reply_model")]
    pub openai_reply_model: String,
    /// Model used to classify inbox messages (`DISPATCH_DESK_OPENAI_CLASSIFIER_MODEL`).
    #[serde(default = "default_openai_classifier_model")]
    pub openai_classifier_model: String,
    /// Model used for summaries and the sales assistant (`DISPATCH_DESK_OPENAI_ASSISTANT_MODEL`).
    #[serde(default = "default_openai_assistant_model")]
    pub openai_assistant_model: String,
    /// Sampling temperature for replies (`DISPATCH_DESK_OPENAI_REPLY_TEMPERATURE`).
    /// Value between 0 and 2; lower values are more deterministic.
    #[serde(default = "default_openai_reply_temperature")]
    pub openai_reply_temperature: f32,
    /// Sampling temperature for classification (`DISPATCH_DESK_OPENAI_CLASSIFIER_TEMPERATURE`).
    #[serde(default = "default_openai_classifier_temperature")]
    pub openai_classifier_temperature: f32,
    /// Sampling temperature for the assistant (`DISPATCH_DESK_OPENAI_ASSISTANT_TEMPERATURE`).
    #[serde(default = "default_openai_assistant_temperature")]
    pub openai_assistant_temperature: f32,
    /// Max output tokens for replies (`DISPATCH_DESK_OPENAI_REPLY_MAX_TOKENS`).
    #[serde(default = "default_openai_reply_max_tokens")]
    pub openai_reply_max_tokens: u32,
    /// Max output tokens for classification (`DISPATCH_DESK_OPENAI_CLASSIFIER_MAX_TOKENS`).
    #[serde(default = "default_openai_classifier_max_tokens")]
    pub openai_classifier_max_tokens: u32,
    /// Max output tokens for summaries and the assistant (`DISPATCH_DESK_OPENAI_ASSISTANT_MAX_TOKENS`).
    #[serde(default = "default_openai_assistant_max_tokens")]
    pub openai_assistant_max_tokens: u32,
    /// Optional override of the reply directive (`DISPATCH_DESK_REPLY_SYSTEM_DIRECTIVE`).
    #[serde(default = "default_reply_system_directive")]
    pub reply_system_directive: String,
    /// Optional override of the classifier directive (`DISPATCH_DESK_CLASSIFIER_SYSTEM_DIRECTIVE`).
    #[serde(default = "default_classifier_system_directive")]
    pub classifier_system_directive: String,
    /// Optional override of the summary directive (`DISPATCH_DESK_SUMMARY_SYSTEM_DIRECTIVE`).
    #[serde(default = "default_summary_system_directive")]
    pub summary_system_directive: String,
    /// Optional override of the sales assistant directive (`DISPATCH_DESK_SALES_ASSISTANT_SYSTEM_DIRECTIVE`).
    #[serde(default = "default_sales_assistant_system_directive")]
    pub sales_assistant_system_directive: String,
    /// IMAP host (`DISPATCH_DESK_IMAP_SERVER`).
    #[serde(default = "default_imap_server")]
    pub imap_server: String,
    /// IMAP port, implicit TLS (`DISPATCH_DESK_IMAP_PORT`).
    #[serde(default = "default_imap_port")]
    pub imap_port: u16,
    /// SMTP host (`DISPATCH_DESK_SMTP_SERVER`).
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    /// SMTP port, implicit TLS (`DISPATCH_DESK_SMTP_PORT`).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Mailbox login (`DISPATCH_DESK_MAIL_USERNAME`).
    #[serde(default)]
    pub mail_username: String,
    /// Mailbox app password (`DISPATCH_DESK_MAIL_PASSWORD`).
    #[serde(default)]
    pub mail_password: String,
    /// Address used in the `From` header; defaults to the login (`DISPATCH_DESK_MAIL_FROM`).
    #[serde(default)]
    pub mail_from: Option<String>,
    /// Database endpoint: `memory`, `mem://`, `ws://host:port` or `wss://...` (`DISPATCH_DESK_DB_ENDPOINT`).
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database username (`DISPATCH_DESK_DB_USERNAME`).
    #[serde(default = "default_db_credential")]
    pub db_username: String,
    /// Database password (`DISPATCH_DESK_DB_PASSWORD`).
    #[serde(default = "default_db_credential")]
    pub db_password: String,
    /// Address the HTTP API binds to (`DISPATCH_DESK_BIND_ADDRESS`).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Number of most recent messages fetched per inbox sync (`DISPATCH_DESK_INBOX_BATCH_SIZE`).
    #[serde(default = "default_inbox_batch_size")]
    pub inbox_batch_size: usize,
    /// Seconds between background inbox syncs (`DISPATCH_DESK_INBOX_POLL_INTERVAL_SECS`).
    #[serde(default = "default_inbox_poll_interval_secs")]
    pub inbox_poll_interval_secs: u64,
    /// Whether the background inbox poller runs (`DISPATCH_DESK_INBOX_POLL_ENABLED`).
    #[serde(default = "default_true")]
    pub inbox_poll_enabled: bool,
    /// Nominatim base URL for location search (`DISPATCH_DESK_NOMINATIM_BASE_URL`).
    #[serde(default = "default_nominatim_base_url")]
    pub nominatim_base_url: String,
    /// Driver pay in dollars per hour (`DISPATCH_DESK_DRIVER_RATE`).
    #[serde(default = "default_driver_rate")]
    pub driver_rate: f64,
    /// Fuel price in dollars per gallon (`DISPATCH_DESK_GAS_PRICE`).
    #[serde(default = "default_gas_price")]
    pub gas_price: f64,
    /// Van fuel economy in miles per gallon (`DISPATCH_DESK_MPG`).
    #[serde(default = "default_mpg")]
    pub mpg: f64,
    /// Average driving speed in miles per hour (`DISPATCH_DESK_AVG_SPEED`).
    #[serde(default = "default_avg_speed")]
    pub avg_speed: f64,
    /// Profit margin as a fraction, e.g. `0.15` (`DISPATCH_DESK_MARGIN`).
    #[serde(default = "default_margin")]
    pub margin: f64,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_reply_model: default_openai_reply_model(),
            openai_classifier_model: default_openai_classifier_model(),
            openai_assistant_model: default_openai_assistant_model(),
            openai_reply_temperature: default_openai_reply_temperature(),
            openai_classifier_temperature: default_openai_classifier_temperature(),
            openai_assistant_temperature: default_openai_assistant_temperature(),
            openai_reply_max_tokens: default_openai_reply_max_tokens(),
            openai_classifier_max_tokens: default_openai_classifier_max_tokens(),
            openai_assistant_max_tokens: default_openai_assistant_max_tokens(),
            reply_system_directive: default_reply_system_directive(),
            classifier_system_directive: default_classifier_system_directive(),
            summary_system_directive: default_summary_system_directive(),
            sales_assistant_system_directive: default_sales_assistant_system_directive(),
            imap_server: default_imap_server(),
            imap_port: default_imap_port(),
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            mail_username: String::new(),
            mail_password: String::new(),
            mail_from: None,
            db_endpoint: default_db_endpoint(),
            db_username: default_db_credential(),
            db_password: default_db_credential(),
            bind_address: default_bind_address(),
            inbox_batch_size: default_inbox_batch_size(),
            inbox_poll_interval_secs: default_inbox_poll_interval_secs(),
            inbox_poll_enabled: true,
            nominatim_base_url: default_nominatim_base_url(),
            driver_rate: default_driver_rate(),
            gas_price: default_gas_price(),
            mpg: default_mpg(),
            avg_speed: default_avg_speed(),
            margin: default_margin(),
        }
    }
}

impl ConfigInner {
    /// Baseline fee settings for the estimator.
    pub fn fee_settings(&self) -> FeeSettings {
        FeeSettings {
            driver_rate: self.driver_rate,
            gas_price: self.gas_price,
            mpg: self.mpg,
            avg_speed: self.avg_speed,
            margin: self.margin,
        }
    }

    /// Address placed in the `From` header of outgoing mail.
    pub fn sender_address(&self) -> &str {
        self.mail_from.as_deref().unwrap_or(&self.mail_username)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Void {
        for (name, temperature) in [
            ("reply", self.openai_reply_temperature),
            ("classifier", self.openai_classifier_temperature),
            ("assistant", self.openai_assistant_temperature),
        ] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(anyhow::anyhow!("OpenAI {name} temperature must be between 0 and 2."));
            }
        }

        for (name, max_tokens) in [
            ("reply", self.openai_reply_max_tokens),
            ("classifier", self.openai_classifier_max_tokens),
            ("assistant", self.openai_assistant_max_tokens),
        ] {
            if !(1..=128000).contains(&max_tokens) {
                return Err(anyhow::anyhow!("OpenAI {name} max tokens must be between 1 and 128000."));
            }
        }

        if self.inbox_batch_size < 1 {
            return Err(anyhow::anyhow!("Inbox batch size must be at least 1."));
        }

        if self.inbox_poll_interval_secs < 1 {
            return Err(anyhow::anyhow!("Inbox poll interval must be at least one second."));
        }

        self.fee_settings().validate()?;

        Ok(())
    }
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("DISPATCH_DESK").try_parsing(true));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Return a copy of this configuration bound to a different address.
    pub fn with_bind_address(&self, bind_address: impl Into<String>) -> Self {
        let mut inner = (*self.inner).clone();
        inner.bind_address = bind_address.into();

        Self::from(inner)
    }
}
