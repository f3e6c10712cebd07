//! Chat platform collaborator
//!
//! Everything the bot needs from the messaging platform goes through the
//! [`Platform`] trait. Inbound traffic arrives through [`EventSource`].
//! Every call returns a [`PlatformResult`] so callers decide to log and skip.

pub mod bridge;
#[cfg(test)]
pub mod fake;

use std::path::Path;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bridge::BridgeClient;

pub type GroupId = String;
pub type MemberId = String;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("platform returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no profile returned for user {0}")]
    MissingProfile(String),
}

pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThreadKind {
    // an event without a kind never passes group-only checks
    #[default]
    User,
    Group,
}

impl ThreadKind {
    pub fn name(self) -> &'static str {
        match self {
            ThreadKind::User => "USER",
            ThreadKind::Group => "GROUP",
        }
    }
}

/// A conversation: either one-to-one or a group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: String,
    pub kind: ThreadKind,
}

impl Thread {
    pub fn group(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ThreadKind::Group,
        }
    }
}

/// Raw group info as reported by the platform. Member ids are composite
/// (`<member>_<version>`) and still need [`crate::common::member_key`].
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GroupInfo {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<String>,
    pub total_members: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserProfile {
    pub id: MemberId,
    pub display_name: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RichContent {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub message_id: String,
    pub author_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Option<RichContent>,
    #[serde(default)]
    pub client_message_id: String,
    pub thread_id: String,
    #[serde(default)]
    pub thread_kind: ThreadKind,
}

impl InboundMessage {
    pub fn thread(&self) -> Thread {
        Thread {
            id: self.thread_id.clone(),
            kind: self.thread_kind,
        }
    }

    pub fn delete_target(&self) -> DeleteTarget {
        DeleteTarget {
            message_id: self.message_id.clone(),
            author_id: self.author_id.clone(),
            client_message_id: self.client_message_id.clone(),
            thread_id: self.thread_id.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub message_id: String,
    pub author_id: String,
    pub client_message_id: String,
    pub thread_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait Platform: Send + Sync {
    async fn fetch_all_groups(&self) -> PlatformResult<Vec<GroupId>>;

    /// `Ok(None)` when the platform does not know the group.
    async fn fetch_group(&self, id: &str) -> PlatformResult<Option<GroupInfo>>;

    async fn fetch_user(&self, id: &str) -> PlatformResult<UserProfile>;

    async fn send_text(&self, thread: &Thread, text: &str) -> PlatformResult<()>;

    async fn send_image(
        &self,
        thread: &Thread,
        image: &Path,
        caption: &str,
        size: ImageSize,
    ) -> PlatformResult<()>;

    async fn delete_message(&self, target: &DeleteTarget) -> PlatformResult<()>;
}

pub trait EventSource {
    fn events(&self) -> BoxStream<'static, InboundMessage>;
}
