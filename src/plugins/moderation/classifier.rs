//! Hosted language-model classifier for selling/advertising messages.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ClassifierConf;

const SYSTEM_PROMPT: &str = "You are a moderation AI. Answer 'yes' if the content is related to buying or selling, otherwise answer 'no'.";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier returned no choices")]
    EmptyReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_prohibited: bool,
}

#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI-compatible chat-completions endpoint.
pub struct ChatClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatClassifier {
    pub fn new(conf: &ClassifierConf) -> Result<Self, ClassifierError> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(conf.timeout_secs))
                .build()?,
            endpoint: conf.endpoint.clone(),
            api_key: conf.api_key.clone(),
            model: conf.model.clone(),
        })
    }
}

#[async_trait]
impl TextClassifier for ChatClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: format!("Message: \"{text}\""),
                },
            ],
            temperature: 0.0,
            max_tokens: 5,
        };

        let response: ChatResponse = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .ok_or(ClassifierError::EmptyReply)?
            .message
            .content;

        Ok(Classification {
            is_prohibited: answer.trim().to_lowercase().contains("yes"),
        })
    }
}
