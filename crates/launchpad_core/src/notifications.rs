use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    Loading,
    Info,
    Success,
    Error,
}

/// A user-facing toast. A `Loading` toast is later resolved in place to
/// `Success` or `Error` under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppNotification {
    pub id: String,
    pub notification_type: NotificationType,
    pub message: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

impl AppNotification {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            notification_type,
            message: message.into(),
            read: false,
            timestamp: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.notification_type == NotificationType::Loading
    }
}

/// In-memory notification store, newest first.
pub struct NotificationStore {
    notifications: Vec<AppNotification>,
    max_notifications: usize,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            notifications: Vec::new(),
            max_notifications: 100,
        }
    }

    /// Push a notification and return its id.
    pub fn push(&mut self, notification: AppNotification) -> String {
        let id = notification.id.clone();
        self.notifications.insert(0, notification);
        if self.notifications.len() > self.max_notifications {
            self.notifications.truncate(self.max_notifications);
        }
        id
    }

    /// Start a pending toast.
    pub fn loading(&mut self, message: impl Into<String>) -> String {
        self.push(AppNotification::new(NotificationType::Loading, message))
    }

    /// Resolve the toast `id` in place. If it was evicted, a new one is pushed.
    pub fn resolve(&mut self, id: &str, notification_type: NotificationType, message: impl Into<String>) {
        let message = message.into();
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.notification_type = notification_type;
                n.message = message;
                n.read = false;
                n.timestamp = Utc::now();
            }
            None => {
                self.push(AppNotification::new(notification_type, message));
            }
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.notifications {
            n.read = true;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn get(&self, id: &str) -> Option<&AppNotification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn all(&self) -> &[AppNotification] {
        &self.notifications
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}
