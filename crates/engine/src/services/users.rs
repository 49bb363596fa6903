//! User collaborator trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;

use crate::error::EngineError;

/// User data returned by the user service, used for shipping-address
/// enrichment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    pub address: String,
}

/// Trait for the external user/notification service.
#[async_trait]
pub trait Users: Send + Sync {
    /// Looks up a user. Unknown users yield `Ok(None)`.
    async fn get_user(&self, user_id: UserId) -> Result<Option<UserInfo>, EngineError>;

    /// Sends a notification. Returns whether delivery was accepted;
    /// callers log failures and never propagate them.
    async fn notify(&self, user_id: UserId, subject: &str, message: &str) -> bool;
}

#[derive(Debug, Default)]
struct InMemoryUsersState {
    users: HashMap<UserId, UserInfo>,
    notifications: Vec<(UserId, String, String)>,
    fail_on_notify: bool,
}

/// In-memory user service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUsers {
    state: Arc<RwLock<InMemoryUsersState>>,
}

impl InMemoryUsers {
    /// Creates a new in-memory user service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub fn add_user(&self, user_id: UserId, user: UserInfo) {
        self.state.write().unwrap().users.insert(user_id, user);
    }

    /// Configures the service to reject notifications.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Returns the number of delivered notifications.
    pub fn notification_count(&self) -> usize {
        self.state.read().unwrap().notifications.len()
    }

    /// Returns delivered notifications for one user as (subject, message)
    /// pairs.
    pub fn notifications_for(&self, user_id: UserId) -> Vec<(String, String)> {
        self.state
            .read()
            .unwrap()
            .notifications
            .iter()
            .filter(|(id, _, _)| *id == user_id)
            .map(|(_, subject, message)| (subject.clone(), message.clone()))
            .collect()
    }
}

#[async_trait]
impl Users for InMemoryUsers {
    async fn get_user(&self, user_id: UserId) -> Result<Option<UserInfo>, EngineError> {
        Ok(self.state.read().unwrap().users.get(&user_id).cloned())
    }

    async fn notify(&self, user_id: UserId, subject: &str, message: &str) -> bool {
        let mut state = self.state.write().unwrap();
        if state.fail_on_notify {
            return false;
        }
        state
            .notifications
            .push((user_id, subject.to_string(), message.to_string()));
        true
    }
}
