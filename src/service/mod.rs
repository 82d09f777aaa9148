//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the dispatch desk:
//! - Database services (e.g., SurrealDB)
//! - LLM services (e.g., OpenAI)
//! - Mailbox access (e.g., IMAP and SMTP)
//! - Location search (e.g., Nominatim)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod db;
pub mod geocode;
pub mod llm;
pub mod mail;
