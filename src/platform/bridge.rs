//! HTTP JSON adapter for a platform gateway.
//!
//! The gateway owns login and session handling; this client only speaks
//! its small REST surface with a bearer token.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{
    DeleteTarget, EventSource, GroupId, GroupInfo, ImageSize, InboundMessage, Platform,
    PlatformError, PlatformResult, Thread, UserProfile,
};
use crate::config::PlatformConf;

#[derive(Debug, Clone)]
pub struct BridgeClient {
    http: Client,
    base_url: String,
    token: String,
    event_wait: Duration,
}

#[derive(Deserialize)]
struct GroupList {
    groups: Vec<GroupId>,
}

#[derive(Deserialize, Default)]
struct EventBatch {
    cursor: u64,
    #[serde(default)]
    events: Vec<InboundMessage>,
}

#[derive(Serialize)]
struct TextPayload<'a> {
    thread_id: &'a str,
    thread_type: &'a str,
    text: &'a str,
}

impl BridgeClient {
    pub fn new(conf: &PlatformConf) -> PlatformResult<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            base_url: conf.base_url.trim_end_matches('/').to_string(),
            token: conf.token.clone(),
            event_wait: Duration::from_secs(conf.event_wait_secs),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    async fn checked(response: Response) -> PlatformResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn next_batch(&self, cursor: u64) -> PlatformResult<EventBatch> {
        let request = self
            .http
            .get(self.url("/events"))
            .query(&[
                ("cursor", cursor.to_string()),
                ("wait", self.event_wait.as_secs().to_string()),
            ])
            // give the gateway its full long-poll window before timing out
            .timeout(self.event_wait + Duration::from_secs(10));
        let response = Self::checked(self.authed(request).send().await?).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Platform for BridgeClient {
    async fn fetch_all_groups(&self) -> PlatformResult<Vec<GroupId>> {
        let request = self.authed(self.http.get(self.url("/groups")));
        let list: GroupList = Self::checked(request.send().await?).await?.json().await?;
        Ok(list.groups)
    }

    async fn fetch_group(&self, id: &str) -> PlatformResult<Option<GroupInfo>> {
        let path = format!("/groups/{}", urlencoding::encode(id));
        let response = self.authed(self.http.get(self.url(&path))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::checked(response).await?.json().await?))
    }

    async fn fetch_user(&self, id: &str) -> PlatformResult<UserProfile> {
        let path = format!("/users/{}", urlencoding::encode(id));
        let response = self.authed(self.http.get(self.url(&path))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PlatformError::MissingProfile(id.to_string()));
        }
        Ok(Self::checked(response).await?.json().await?)
    }

    async fn send_text(&self, thread: &Thread, text: &str) -> PlatformResult<()> {
        let payload = TextPayload {
            thread_id: &thread.id,
            thread_type: thread.kind.name(),
            text,
        };
        let request = self.authed(self.http.post(self.url("/messages")).json(&payload));
        Self::checked(request.send().await?).await.map(|_| ())
    }

    async fn send_image(
        &self,
        thread: &Thread,
        image: &Path,
        caption: &str,
        size: ImageSize,
    ) -> PlatformResult<()> {
        let bytes = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("avatar"));

        let form = multipart::Form::new()
            .text("thread_id", thread.id.clone())
            .text("thread_type", thread.kind.name())
            .text("caption", caption.to_string())
            .text("width", size.width.to_string())
            .text("height", size.height.to_string())
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let request = self.authed(self.http.post(self.url("/images")).multipart(form));
        Self::checked(request.send().await?).await.map(|_| ())
    }

    async fn delete_message(&self, target: &DeleteTarget) -> PlatformResult<()> {
        let request = self.authed(self.http.post(self.url("/messages/delete")).json(target));
        Self::checked(request.send().await?).await.map(|_| ())
    }
}

impl EventSource for BridgeClient {
    fn events(&self) -> BoxStream<'static, InboundMessage> {
        let client = self.clone();

        stream::unfold((client, 0u64), |(client, cursor)| async move {
            loop {
                match client.next_batch(cursor).await {
                    Ok(batch) => {
                        let events = stream::iter(batch.events);
                        return Some((events, (client, batch.cursor)));
                    }
                    Err(e) => {
                        tracing::warn!("event poll failed: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        })
        .flatten()
        .boxed()
    }
}
