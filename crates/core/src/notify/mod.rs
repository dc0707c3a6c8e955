//! Notification bridge.
//!
//! Decides what to show for push payloads and page messages, and where a
//! notification click should lead. The decisions are pure functions in
//! [`events`]; the platform side (showing notifications, focusing windows)
//! sits behind the [`NotificationCenter`] and [`Clients`] traits.

pub mod clients;
pub mod events;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

pub use clients::{Clients, MemoryClients, WindowClient};
pub use events::{ClickAction, MessageOutcome, on_message, on_notification_click, on_periodic_sync, on_push};

use crate::Error;

/// Identifier of the anime a notification is about. Pages send either a
/// numeric MAL id or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{n}"),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

/// Opaque data read back when the notification is clicked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationData {
    pub url: Option<String>,
    #[serde(rename = "animeId")]
    pub anime_id: Option<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// A notification as handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: Option<String>,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    /// Showing another notification with the same tag replaces this one.
    pub tag: String,
    /// Alert again when replacing a notification with the same tag.
    pub renotify: bool,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// Platform notification surface.
#[async_trait::async_trait]
pub trait NotificationCenter: Send + Sync {
    /// Display `notification`, replacing any visible one with the same tag.
    async fn show(&self, notification: Notification) -> Result<(), Error>;

    /// Close the notification with `tag`, returning it if it was visible.
    async fn close(&self, tag: &str) -> Option<Notification>;

    async fn visible(&self) -> Vec<Notification>;
}

/// Keeps visible notifications in memory, oldest first.
#[derive(Clone, Default)]
pub struct MemoryNotifications {
    shown: Arc<RwLock<Vec<Notification>>>,
}

impl MemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl NotificationCenter for MemoryNotifications {
    async fn show(&self, notification: Notification) -> Result<(), Error> {
        let mut shown = self.shown.write().await;
        let replaced = shown.len();
        shown.retain(|n| n.tag != notification.tag);
        if shown.len() != replaced {
            tracing::debug!(tag = %notification.tag, "replacing notification");
        }
        shown.push(notification);
        Ok(())
    }

    async fn close(&self, tag: &str) -> Option<Notification> {
        let mut shown = self.shown.write().await;
        let idx = shown.iter().position(|n| n.tag == tag)?;
        Some(shown.remove(idx))
    }

    async fn visible(&self) -> Vec<Notification> {
        self.shown.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(tag: &str, title: &str) -> Notification {
        Notification {
            title: title.into(),
            body: None,
            icon: "/icon-192.png".into(),
            badge: "/icon-192.png".into(),
            vibrate: Vec::new(),
            tag: tag.into(),
            renotify: false,
            data: NotificationData::default(),
            actions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_same_tag_replaces() {
        let center = MemoryNotifications::new();
        center.show(notification("anime-21", "first")).await.unwrap();
        center.show(notification("anime-5114", "other")).await.unwrap();
        center.show(notification("anime-21", "second")).await.unwrap();

        let visible = center.visible().await;
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].tag, "anime-5114");
        assert_eq!(visible[1].title, "second");
    }

    #[tokio::test]
    async fn test_close_removes() {
        let center = MemoryNotifications::new();
        center.show(notification("otakudb-notification", "x")).await.unwrap();
        assert!(center.close("otakudb-notification").await.is_some());
        assert!(center.close("otakudb-notification").await.is_none());
        assert!(center.visible().await.is_empty());
    }

    #[test]
    fn test_item_id_display() {
        assert_eq!(ItemId::Number(52991).to_string(), "52991");
        assert_eq!(ItemId::Text("abc".into()).to_string(), "abc");
        let parsed: ItemId = serde_json::from_str("21").unwrap();
        assert_eq!(parsed, ItemId::Number(21));
    }
}
