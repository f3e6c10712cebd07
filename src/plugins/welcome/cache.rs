use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use tokio::sync::RwLock;

use crate::common::member_key;
use crate::platform::{GroupId, GroupInfo, MemberId, Platform, PlatformResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub id: GroupId,
    pub name: String,
    pub members: IndexSet<MemberId>,
    pub total_count: u64,
}

impl From<GroupInfo> for GroupSnapshot {
    fn from(info: GroupInfo) -> Self {
        Self {
            members: info
                .members
                .iter()
                .map(|raw| member_key(raw).to_string())
                .collect(),
            id: info.id,
            name: info.name,
            total_count: info.total_members,
        }
    }
}

/// Result of a successful refresh: what was cached before, and what is cached now.
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub previous: Option<GroupSnapshot>,
    pub current: GroupSnapshot,
}

#[derive(Clone)]
pub struct GroupCache {
    platform: Arc<dyn Platform>,
    groups: Arc<RwLock<HashMap<GroupId, GroupSnapshot>>>,
}

impl GroupCache {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            groups: Arc::default(),
        }
    }

    pub async fn get(&self, id: &str) -> Option<GroupSnapshot> {
        self.groups.read().await.get(id).cloned()
    }

    pub async fn ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Every group the platform reports, cached or not.
    pub async fn list_groups(&self) -> PlatformResult<Vec<GroupId>> {
        self.platform.fetch_all_groups().await
    }

    /// Fetches the roster and swaps it into the cache.
    /// `Ok(None)` when the platform has no such group; the cached entry is left as is.
    pub async fn refresh(&self, id: &str) -> PlatformResult<Option<Refreshed>> {
        // fetch outside the lock, a slow platform must not block readers
        let Some(info) = self.platform.fetch_group(id).await? else {
            return Ok(None);
        };
        let mut current = GroupSnapshot::from(info);
        current.id = id.to_string();

        let previous = self
            .groups
            .write()
            .await
            .insert(id.to_string(), current.clone());

        Ok(Some(Refreshed { previous, current }))
    }
}
