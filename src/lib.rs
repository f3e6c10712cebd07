use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::BotConf;
use crate::platform::{ImageSize, InboundMessage, Platform};
use crate::plugins::moderation::{ChatClassifier, ClassifierError, Moderator, TextClassifier};
use crate::plugins::welcome::{self, GroupCache, Notifier, PollLoop, SettingsStore};

pub mod common;
pub mod config;
pub mod platform;
pub mod plugins;

/// State shared by the inbound message handler and the membership poller.
#[derive(Clone)]
pub struct Bot {
    pub platform: Arc<dyn Platform>,
    pub settings: Arc<SettingsStore>,
    pub groups: GroupCache,
    pub moderation: Arc<Moderator>,
    pub owners: Arc<Vec<String>>,
}

impl Bot {
    pub fn new(
        platform: Arc<dyn Platform>,
        settings: SettingsStore,
        moderation: Moderator,
        owners: Vec<String>,
    ) -> Self {
        Self {
            groups: GroupCache::new(platform.clone()),
            platform,
            settings: Arc::new(settings),
            moderation: Arc::new(moderation),
            owners: Arc::new(owners),
        }
    }

    pub fn from_conf(platform: Arc<dyn Platform>, conf: &BotConf) -> Result<Self, ClassifierError> {
        let classifier = match (&conf.classifier, conf.moderation.keyword_classifier) {
            (Some(classifier), true) => {
                Some(Arc::new(ChatClassifier::new(classifier)?) as Arc<dyn TextClassifier>)
            }
            (None, true) => {
                warn!("keyword_classifier is on but no [classifier] is configured");
                None
            }
            _ => None,
        };

        Ok(Self::new(
            platform,
            SettingsStore::new(&conf.settings_path),
            Moderator::new(&conf.moderation, classifier),
            conf.owner_list(),
        ))
    }

    pub fn poller(&self, interval: Duration, avatar_size: ImageSize) -> PollLoop {
        PollLoop::new(
            self.settings.clone(),
            self.groups.clone(),
            Notifier::new(self.platform.clone(), avatar_size),
            interval,
        )
    }

    /// Moderation first, then commands. At most one reply is sent.
    pub async fn on_message(&self, message: &InboundMessage) {
        debug!(
            "🎏 {} {} {} cliMsgId={} text={:?}",
            message.thread_kind.name(),
            message.author_id,
            message.thread_id,
            message.client_message_id,
            message.text
        );

        if self.moderation.enforce(self.platform.as_ref(), message).await {
            return;
        };

        let Some(reply) = welcome::on_command(message, &self.owners, &self.settings).await else {
            return;
        };

        if let Err(e) = self.platform.send_text(&message.thread(), &reply).await {
            warn!("could not reply in {}: {e}", message.thread_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModerationConf;
    use crate::platform::fake::{FakePlatform, Sent};
    use crate::platform::{Thread, ThreadKind};

    fn bot(platform: &Arc<FakePlatform>, dir: &tempfile::TempDir) -> Bot {
        Bot::new(
            platform.clone(),
            SettingsStore::new(dir.path().join("settings.json")),
            Moderator::new(&ModerationConf::default(), None),
            vec!["bot".into(), "owner".into()],
        )
    }

    fn message(author: &str, kind: ThreadKind, text: &str) -> InboundMessage {
        InboundMessage {
            message_id: "m1".into(),
            author_id: author.into(),
            text: Some(text.into()),
            content: None,
            client_message_id: "c1".into(),
            thread_id: "g1".into(),
            thread_kind: kind,
        }
    }

    #[tokio::test]
    async fn command_reply_goes_back_to_the_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let platform = Arc::new(FakePlatform::default());
        let bot = bot(&platform, &dir);

        bot.on_message(&message("owner", ThreadKind::Group, "!wl on")).await;

        assert_eq!(
            platform.sent(),
            vec![Sent::Text {
                thread: Thread::group("g1"),
                text: welcome::ENABLED.to_string(),
            }]
        );
        assert!(bot.settings.is_enabled("g1").await);
    }

    #[tokio::test]
    async fn links_are_deleted_before_commands() {
        let dir = tempfile::tempdir().unwrap();
        let platform = Arc::new(FakePlatform::default());
        let bot = bot(&platform, &dir);

        bot.on_message(&message("owner", ThreadKind::Group, "!wl on http://example.com"))
            .await;
        bot.on_message(&message("u2", ThreadKind::Group, "check http://example.com now"))
            .await;

        assert_eq!(platform.deleted().len(), 2);
        assert!(platform.sent().is_empty());
        assert!(!bot.settings.is_enabled("g1").await);
    }

    #[tokio::test]
    async fn ordinary_chat_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let platform = Arc::new(FakePlatform::default());
        let bot = bot(&platform, &dir);

        bot.on_message(&message("u2", ThreadKind::Group, "good morning")).await;

        assert!(platform.sent().is_empty());
        assert!(platform.deleted().is_empty());
    }

    #[tokio::test]
    async fn enabling_a_group_makes_the_poller_watch_it() {
        let dir = tempfile::tempdir().unwrap();
        let platform = Arc::new(FakePlatform::default());
        platform.set_group("g1", "Crabs", &["a_0"]);
        let bot = bot(&platform, &dir);
        let poller = bot.poller(
            Duration::from_millis(10),
            ImageSize {
                width: 240,
                height: 240,
            },
        );
        poller.seed().await;

        bot.on_message(&message("owner", ThreadKind::Group, "!wl on")).await;
        platform.set_group("g1", "Crabs", &["a_0", "b_0"]);
        platform.set_user("b", "Bea", "");

        let events = poller.run_cycle().await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].member_id, "b");
        assert_eq!(bot.groups.get("g1").await.unwrap().members.len(), 2);
    }
}
