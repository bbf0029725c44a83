//! Transient user-facing notifications

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A toast-style message for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Success, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_level(NotificationLevel::Error, title, description)
    }

    fn with_level(
        level: NotificationLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Fan-out of notifications to any number of listeners.
///
/// Publishing with no listener attached is not an error; slow listeners
/// lose the oldest entries once the buffer is full.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn notify(&self, notification: Notification) {
        debug!(
            "Notification [{:?}] {}: {}",
            notification.level, notification.title, notification.description
        );
        let _ = self.tx.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_without_listeners() {
        let notifier = Notifier::new(4);
        notifier.notify(Notification::success("Hello", "nobody is listening"));
    }

    #[tokio::test]
    async fn test_every_listener_receives() {
        let notifier = Notifier::new(4);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.notify(Notification::error("Error", "Failed to send message."));

        let a = first.recv().await.unwrap();
        let b = second.recv().await.unwrap();
        assert_eq!(a, b);
        assert!(a.is_error());
        assert_eq!(a.title, "Error");
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let value = serde_json::to_value(Notification::success("Done", "ok")).unwrap();
        assert_eq!(value["level"], "success");
    }
}
