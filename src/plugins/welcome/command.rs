use tracing::error;

use super::{
    unsupported, SettingsStore, DISABLED, ENABLED, GROUP_ONLY, NOT_CONFIGURED, OWNER_ONLY, PREFIX,
    SAVE_FAILED, USAGE,
};
use crate::common::command_args;
use crate::platform::{InboundMessage, ThreadKind};

/// Handles `!wl on|off`. Returns the single reply for the conversation,
/// or `None` when the message is not a `!wl` command.
pub async fn on_command(
    message: &InboundMessage,
    owners: &[String],
    settings: &SettingsStore,
) -> Option<String> {
    let args = command_args(message.text.as_deref(), PREFIX)?;

    let Some(arg) = args.first() else {
        return Some(USAGE.to_string());
    };

    if !owners.contains(&message.author_id) {
        return Some(OWNER_ONLY.to_string());
    };

    if message.thread_kind != ThreadKind::Group {
        return Some(GROUP_ONLY.to_string());
    };

    let group = &message.thread_id;
    let reply = match arg.to_lowercase().as_str() {
        "on" => match settings.set_enabled(group, true).await {
            Ok(()) => ENABLED,
            Err(e) => {
                error!("could not enable welcome for {group}: {e}");
                SAVE_FAILED
            }
        },
        "off" => match settings.disable_if_configured(group).await {
            Ok(true) => DISABLED,
            Ok(false) => NOT_CONFIGURED,
            Err(e) => {
                error!("could not disable welcome for {group}: {e}");
                SAVE_FAILED
            }
        },
        _ => return Some(unsupported(arg)),
    };

    Some(reply.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "owner";

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

    async fn run(settings: &SettingsStore, author: &str, kind: ThreadKind, text: &str) -> Option<String> {
        on_command(&message(author, kind, text), &[OWNER.to_string()], settings).await
    }

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn owner_enables_group() {
        let (_dir, settings) = store();

        let reply = run(&settings, OWNER, ThreadKind::Group, "!wl on").await;

        assert_eq!(reply.as_deref(), Some(ENABLED));
        assert!(settings.is_enabled("g1").await);
    }

    #[tokio::test]
    async fn owner_disables_group() {
        let (_dir, settings) = store();
        settings.set_enabled("g1", true).await.unwrap();

        let reply = run(&settings, OWNER, ThreadKind::Group, "!wl OFF").await;

        assert_eq!(reply.as_deref(), Some(DISABLED));
        assert!(!settings.is_enabled("g1").await);
    }

    #[tokio::test]
    async fn off_without_configuration() {
        let (_dir, settings) = store();

        let reply = run(&settings, OWNER, ThreadKind::Group, "!wl off").await;

        assert_eq!(reply.as_deref(), Some(NOT_CONFIGURED));
        assert!(settings.load().await.unwrap().welcome.is_empty());
    }

    #[tokio::test]
    async fn non_owner_is_denied_and_nothing_changes() {
        let (_dir, settings) = store();

        let reply = run(&settings, "stranger", ThreadKind::Group, "!wl on").await;

        assert_eq!(reply.as_deref(), Some(OWNER_ONLY));
        assert!(!settings.is_enabled("g1").await);
    }

    #[tokio::test]
    async fn direct_conversations_are_rejected_for_everyone() {
        let (_dir, settings) = store();

        for author in [OWNER, "stranger"] {
            let reply = run(&settings, author, ThreadKind::User, "!wl on").await;
            let expected = if author == OWNER { GROUP_ONLY } else { OWNER_ONLY };
            assert_eq!(reply.as_deref(), Some(expected));
        }
        assert!(!settings.is_enabled("g1").await);
    }

    #[tokio::test]
    async fn missing_argument_shows_usage_before_permissions() {
        let (_dir, settings) = store();

        let reply = run(&settings, "stranger", ThreadKind::User, "!wl").await;

        assert_eq!(reply.as_deref(), Some(USAGE));
    }

    #[tokio::test]
    async fn unsupported_argument_is_echoed() {
        let (_dir, settings) = store();

        let reply = run(&settings, OWNER, ThreadKind::Group, "!wl Maybe").await;

        assert_eq!(reply, Some(unsupported("Maybe")));
        assert!(reply.unwrap().contains("!wl Maybe"));
    }

    #[tokio::test]
    async fn failed_writes_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsStore::new(dir.path().join("missing/settings.json"));

        let reply = run(&settings, OWNER, ThreadKind::Group, "!wl on").await;

        assert_eq!(reply.as_deref(), Some(SAVE_FAILED));
        assert!(!settings.is_enabled("g1").await);
    }

    #[tokio::test]
    async fn events_without_a_kind_are_not_groups() {
        let (_dir, settings) = store();
        let mut msg = message(OWNER, ThreadKind::Group, "!wl on");
        msg.thread_kind = ThreadKind::default();

        let reply = on_command(&msg, &[OWNER.to_string()], &settings).await;

        assert_eq!(reply.as_deref(), Some(GROUP_ONLY));
        assert!(!settings.is_enabled("g1").await);
    }

    #[tokio::test]
    async fn other_messages_are_ignored() {
        let (_dir, settings) = store();

        assert_eq!(run(&settings, OWNER, ThreadKind::Group, "hello").await, None);
        assert_eq!(run(&settings, OWNER, ThreadKind::Group, "!wlon").await, None);
    }
}
