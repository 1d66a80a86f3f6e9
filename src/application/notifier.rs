// Notifier - keyed, non-blocking notifications for one session
use crate::domain::notification::{Notification, NotificationLevel};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct Notifier {
    recent: Arc<Mutex<VecDeque<Notification>>>,
    sender: broadcast::Sender<Notification>,
    capacity: usize,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            sender,
            capacity,
        }
    }

    pub fn loading(&self, key: &str, message: impl Into<String>) {
        self.publish(Notification::new(key, NotificationLevel::Loading, message));
    }

    pub fn success(&self, key: &str, message: impl Into<String>) {
        self.publish(Notification::new(key, NotificationLevel::Success, message));
    }

    pub fn error(&self, key: &str, message: impl Into<String>) {
        self.publish(Notification::new(key, NotificationLevel::Error, message));
    }

    /// Replaces any notification with the same key and pushes to subscribers.
    pub fn publish(&self, notification: Notification) {
        {
            let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
            recent.retain(|n| n.key != notification.key);
            if recent.len() == self.capacity {
                recent.pop_front();
            }
            recent.push_back(notification.clone());
        }
        match notification.level {
            NotificationLevel::Error => tracing::warn!("[{}] {}", notification.key, notification.message),
            _ => tracing::debug!("[{}] {}", notification.key, notification.message),
        }
        // No subscribers is fine.
        let _ = self.sender.send(notification);
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<Notification> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn latest(&self, key: &str) -> Option<Notification> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|n| n.key == key)
            .cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_replaces() {
        let notifier = Notifier::new(10);
        notifier.loading("png-c1", "Exporting PNG...");
        notifier.success("pdf-c2", "PDF exported");
        notifier.success("png-c1", "PNG exported");

        let recent = notifier.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].key, "png-c1");
        assert_eq!(recent[1].level, NotificationLevel::Success);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let notifier = Notifier::new(2);
        notifier.error("a", "1");
        notifier.error("b", "2");
        notifier.error("c", "3");
        let keys: Vec<String> = notifier.recent().into_iter().map(|n| n.key).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let notifier = Notifier::new(4);
        let mut rx = notifier.subscribe();
        notifier.error("insight-c1", "Failed to generate insight");
        let received = rx.recv().await.unwrap();
        assert_eq!(received.key, "insight-c1");
        assert_eq!(received.level, NotificationLevel::Error);
    }
}
