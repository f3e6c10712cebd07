//! Message moderation
//!
//! Runs before any command parsing. A hit deletes the message and stops
//! all further processing of it, even for owners.

pub mod classifier;
pub mod links;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ModerationConf;
use crate::platform::{InboundMessage, Platform};
pub use classifier::{ChatClassifier, Classification, ClassifierError, TextClassifier};
pub use links::contains_link;

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "bán", "shop", "giá", "đặt hàng", "giao hàng", "order", "sale", "ship", "khuyến mãi", "mua",
    "sỉ lẻ", "bao giá", "chốt đơn", "thanh toán", "săn sale", "combo", "freeship", "deal",
    "đơn hàng", "tuyển sỉ", "tuyển ctv",
];

/// What a classifier failure counts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierErrorPolicy {
    Allow,
    Block,
}

pub const ON_CLASSIFIER_ERROR: ClassifierErrorPolicy = ClassifierErrorPolicy::Allow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    LinkInTitle,
    LinkInText,
    Prohibited,
}

pub struct Moderator {
    links: bool,
    keywords: Vec<String>,
    classifier: Option<Arc<dyn TextClassifier>>,
    on_classifier_error: ClassifierErrorPolicy,
}

impl Moderator {
    /// The keyword classifier only runs when both the option and a classifier are present.
    pub fn new(conf: &ModerationConf, classifier: Option<Arc<dyn TextClassifier>>) -> Self {
        Self {
            links: conf.links,
            keywords: conf.keywords.iter().map(|kw| kw.to_lowercase()).collect(),
            classifier: classifier.filter(|_| conf.keyword_classifier),
            on_classifier_error: ON_CLASSIFIER_ERROR,
        }
    }

    pub fn with_classifier_error_policy(mut self, policy: ClassifierErrorPolicy) -> Self {
        self.on_classifier_error = policy;
        self
    }

    pub async fn check(&self, message: &InboundMessage) -> Option<Violation> {
        if self.links {
            let title = message.content.as_ref().and_then(|c| c.title.as_deref());
            if title.is_some_and(contains_link) {
                return Some(Violation::LinkInTitle);
            }
            if message.text.as_deref().is_some_and(contains_link) {
                return Some(Violation::LinkInText);
            }
        }

        let classifier = self.classifier.as_ref()?;
        let text = message.text.as_deref()?;
        let lowered = text.to_lowercase();
        if !self.keywords.iter().any(|kw| lowered.contains(kw.as_str())) {
            return None;
        }

        info!("suspicious keyword from {}, asking classifier", message.author_id);
        let prohibited = match classifier.classify(text).await {
            Ok(Classification { is_prohibited }) => is_prohibited,
            Err(e) => {
                warn!("classifier failed: {e}");
                self.on_classifier_error == ClassifierErrorPolicy::Block
            }
        };

        if prohibited {
            Some(Violation::Prohibited)
        } else {
            info!("classifier kept message from {}", message.author_id);
            None
        }
    }

    /// Deletes the message on a hit. Returns `true` when processing must stop,
    /// which is also the case when the delete itself failed.
    pub async fn enforce(&self, platform: &dyn Platform, message: &InboundMessage) -> bool {
        let Some(violation) = self.check(message).await else {
            return false;
        };

        match platform.delete_message(&message.delete_target()).await {
            Ok(()) => info!(
                "deleted message {} from {} ({violation:?})",
                message.message_id, message.author_id
            ),
            Err(e) => warn!("could not delete message {}: {e}", message.message_id),
        }
        true
    }
}
