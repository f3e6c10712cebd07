//! In-memory platform used by unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    DeleteTarget, GroupId, GroupInfo, ImageSize, Platform, PlatformError, PlatformResult, Thread,
    UserProfile,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { thread: Thread, text: String },
    Image { thread: Thread, caption: String, existed: bool },
}

#[derive(Default)]
pub struct FakePlatform {
    pub groups: Mutex<HashMap<GroupId, GroupInfo>>,
    pub users: Mutex<HashMap<String, UserProfile>>,
    pub failing_groups: Mutex<Vec<GroupId>>,
    pub fail_delete: Mutex<bool>,
    pub fail_image: Mutex<bool>,
    pub sent: Mutex<Vec<Sent>>,
    pub deleted: Mutex<Vec<DeleteTarget>>,
    pub image_paths: Mutex<Vec<std::path::PathBuf>>,
}

impl FakePlatform {
    pub fn set_group(&self, id: &str, name: &str, members: &[&str]) {
        let info = GroupInfo {
            id: id.to_string(),
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
            total_members: members.len() as u64,
        };
        self.groups.lock().unwrap().insert(id.to_string(), info);
    }

    pub fn set_user(&self, id: &str, name: &str, avatar: &str) {
        let profile = UserProfile {
            id: id.to_string(),
            display_name: name.to_string(),
            avatar: avatar.to_string(),
        };
        self.users.lock().unwrap().insert(id.to_string(), profile);
    }

    pub fn fail_group(&self, id: &str) {
        self.failing_groups.lock().unwrap().push(id.to_string());
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { text, .. } => Some(text),
                Sent::Image { .. } => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<DeleteTarget> {
        self.deleted.lock().unwrap().clone()
    }
}

fn unavailable() -> PlatformError {
    PlatformError::Status {
        status: 503,
        body: String::from("unavailable"),
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn fetch_all_groups(&self) -> PlatformResult<Vec<GroupId>> {
        let mut ids: Vec<GroupId> = self.groups.lock().unwrap().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn fetch_group(&self, id: &str) -> PlatformResult<Option<GroupInfo>> {
        if self.failing_groups.lock().unwrap().iter().any(|g| g == id) {
            return Err(unavailable());
        }
        Ok(self.groups.lock().unwrap().get(id).cloned())
    }

    async fn fetch_user(&self, id: &str) -> PlatformResult<UserProfile> {
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PlatformError::MissingProfile(id.to_string()))
    }

    async fn send_text(&self, thread: &Thread, text: &str) -> PlatformResult<()> {
        self.sent.lock().unwrap().push(Sent::Text {
            thread: thread.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_image(
        &self,
        thread: &Thread,
        image: &Path,
        caption: &str,
        _size: ImageSize,
    ) -> PlatformResult<()> {
        self.image_paths.lock().unwrap().push(image.to_path_buf());
        self.sent.lock().unwrap().push(Sent::Image {
            thread: thread.clone(),
            caption: caption.to_string(),
            existed: image.exists(),
        });
        if *self.fail_image.lock().unwrap() {
            self.sent.lock().unwrap().pop();
            return Err(unavailable());
        }
        Ok(())
    }

    async fn delete_message(&self, target: &DeleteTarget) -> PlatformResult<()> {
        self.deleted.lock().unwrap().push(target.clone());
        if *self.fail_delete.lock().unwrap() {
            return Err(unavailable());
        }
        Ok(())
    }
}
