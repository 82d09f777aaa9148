use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

// Inbox.

/// Category tag attached to an email by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailCategory {
    Urgent,
    Support,
    Sales,
    Complaint,
    Newsletter,
    Other,
}

impl EmailCategory {
    /// Every category, in the order the classifier prompt lists them.
    pub const ALL: [EmailCategory; 6] = [Self::Urgent, Self::Support, Self::Sales, Self::Complaint, Self::Newsletter, Self::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Support => "support",
            Self::Sales => "sales",
            Self::Complaint => "complaint",
            Self::Newsletter => "newsletter",
            Self::Other => "other",
        }
    }

    /// Normalize a free-form classifier answer.
    ///
    /// The answer is trimmed and lower-cased; anything that is not exactly one of the
    /// specific categories collapses to [`EmailCategory::Other`].
    pub fn from_answer(answer: &str) -> Self {
        answer.trim().to_lowercase().parse().unwrap_or(Self::Other)
    }
}

impl fmt::Display for EmailCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailCategory {
    type Err = Err;

    fn from_str(s: &str) -> Res<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown email category `{s}`."))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadState {
    Read,
    Unread,
}

impl From<bool> for ReadState {
    fn from(seen: bool) -> Self {
        if seen { Self::Read } else { Self::Unread }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyState {
    #[serde(rename = "replied")]
    Replied,
    #[serde(rename = "not replied")]
    NotReplied,
}

impl From<bool> for ReplyState {
    fn from(replied: bool) -> Self {
        if replied { Self::Replied } else { Self::NotReplied }
    }
}

/// An inbox row as the dashboard table consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: u32,
    pub from: String,
    pub title: String,
    pub date: String,
    pub read: ReadState,
    pub replied: ReplyState,
    pub classification: EmailCategory,
    pub body: String,
    pub email: String,
}

// Sales assistant.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Bot,
}

/// A single line in the sales assistant transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub text: String,
    pub sender: ChatSender,
}
