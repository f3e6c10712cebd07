//! Greeting and farewell delivery for membership changes.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use super::{farewell_caption, farewell_text, welcome_caption, welcome_text};
use crate::platform::{GroupId, ImageSize, MemberId, Platform, PlatformError, Thread};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberEventKind {
    Joined,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEvent {
    pub group_id: GroupId,
    pub member_id: MemberId,
    pub kind: MemberEventKind,
    pub group_name: String,
    pub total_members: u64,
}

#[derive(Debug, Error)]
enum AvatarError {
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("download returned {0}")]
    Status(StatusCode),
    #[error("temp file: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload failed: {0}")]
    Upload(#[from] PlatformError),
}

#[derive(Clone)]
pub struct Notifier {
    platform: Arc<dyn Platform>,
    http: reqwest::Client,
    avatar_size: ImageSize,
}

impl Notifier {
    pub fn new(platform: Arc<dyn Platform>, avatar_size: ImageSize) -> Self {
        Self {
            platform,
            http: reqwest::Client::new(),
            avatar_size,
        }
    }

    pub async fn notify(&self, event: &MemberEvent) {
        let profile = match self.platform.fetch_user(&event.member_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("skipping {:?} for {}: {e}", event.kind, event.member_id);
                return;
            }
        };

        let thread = Thread::group(&event.group_id);
        let name = &profile.display_name;
        let (caption, text) = match event.kind {
            MemberEventKind::Joined => (
                welcome_caption(name, &event.group_name),
                welcome_text(name, &event.group_name, event.total_members),
            ),
            MemberEventKind::Left => (farewell_caption(name), farewell_text(name)),
        };

        if let Err(e) = self.send_avatar(&thread, &profile.avatar, &caption).await {
            debug!("avatar for {} not sent ({e}), replying with text", event.member_id);
            if let Err(e) = self.platform.send_text(&thread, &caption).await {
                warn!("could not send caption to {}: {e}", thread.id);
            }
        }

        if let Err(e) = self.platform.send_text(&thread, &text).await {
            warn!("could not send message to {}: {e}", thread.id);
        }
    }

    async fn send_avatar(&self, thread: &Thread, url: &str, caption: &str) -> Result<(), AvatarError> {
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(AvatarError::Status(response.status()));
        }
        let bytes = response.bytes().await?;

        let mut file = tempfile::Builder::new()
            .prefix("avatar-")
            .suffix(&image_suffix(url))
            .tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;

        let sent = self
            .platform
            .send_image(thread, file.path(), caption, self.avatar_size)
            .await;

        if let Err(e) = file.close() {
            warn!("could not remove temporary avatar: {e}");
        }
        Ok(sent?)
    }
}

// keeps the avatar's extension so the platform can sniff the format
fn image_suffix(url: &str) -> String {
    let name = url
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    match Path::new(name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!(".{ext}")
        }
        _ => String::new(),
    }
}
