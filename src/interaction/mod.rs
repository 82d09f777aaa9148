//! Workflows behind the dashboard.
//!
//! This module coordinates the services (LLM, database, mail) for each user-facing flow:
//! - Syncing, classifying and answering inbox messages
//! - Keeping the inbox fresh in the background
//! - Chatting with the sales assistant

pub mod inbox;
pub mod sales_chat;
