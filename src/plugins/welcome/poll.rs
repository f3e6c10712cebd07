//! Background membership polling.
//!
//! One cycle visits every known group (cached at startup, or enabled later),
//! refreshes the ones with welcome mode on, diffs the rosters and hands each
//! join/leave to the [`Notifier`]. Groups are processed one after another;
//! a failing group is logged and skipped without aborting the cycle.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{diff, GroupCache, MemberEvent, MemberEventKind, Notifier, Refreshed, SettingsStore};
use crate::platform::GroupId;

pub struct PollLoop {
    settings: Arc<SettingsStore>,
    cache: GroupCache,
    notifier: Notifier,
    interval: Duration,
}

impl PollLoop {
    pub fn new(
        settings: Arc<SettingsStore>,
        cache: GroupCache,
        notifier: Notifier,
        interval: Duration,
    ) -> Self {
        Self {
            settings,
            cache,
            notifier,
            interval,
        }
    }

    /// Caches every group the platform reports so current members count as known.
    pub async fn seed(&self) {
        let groups = match self.cache.list_groups().await {
            Ok(groups) => groups,
            Err(e) => {
                warn!("could not list groups: {e}");
                return;
            }
        };

        for id in groups {
            match self.cache.refresh(&id).await {
                Ok(Some(_)) => debug!("cached group {id}"),
                Ok(None) => info!("skipping group {id}"),
                Err(e) => warn!("could not cache group {id}: {e}"),
            }
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!("membership polling every {:?}", self.interval);
        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.run_cycle().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!("membership polling stopped");
    }

    /// One full pass over the known groups. Returns the events that were delivered.
    pub async fn run_cycle(&self) -> Vec<MemberEvent> {
        let settings = match self.settings.load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("skipping poll cycle, settings unreadable: {e}");
                return Vec::new();
            }
        };

        let mut known: IndexSet<GroupId> = self.cache.ids().await.into_iter().collect();
        known.extend(settings.enabled_groups());

        let mut events = Vec::new();
        for id in known.iter().filter(|id| settings.is_enabled(id)) {
            for event in self.check_group(id).await {
                self.notifier.notify(&event).await;
                events.push(event);
            }
        }
        events
    }

    async fn check_group(&self, id: &str) -> Vec<MemberEvent> {
        let Refreshed { previous, current } = match self.cache.refresh(id).await {
            Ok(Some(refreshed)) => refreshed,
            Ok(None) => {
                debug!("group {id} not reported by platform");
                return Vec::new();
            }
            Err(e) => {
                warn!("could not refresh group {id}: {e}");
                return Vec::new();
            }
        };

        let delta = diff(previous.as_ref().map(|p| &p.members), Some(&current.members));
        if previous.is_none() {
            debug!("seeded group {id}");
        }

        let event = |member: &String, kind| MemberEvent {
            group_id: id.to_string(),
            member_id: member.clone(),
            kind,
            group_name: current.name.clone(),
            total_members: current.total_count,
        };

        let joined = delta.joined.iter().map(|m| event(m, MemberEventKind::Joined));
        let left = delta.left.iter().map(|m| event(m, MemberEventKind::Left));
        joined.chain(left).collect()
    }
}
