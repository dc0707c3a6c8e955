//! Push, message, click and periodic-sync events.

use tokio::task::JoinHandle;

use super::{Network, ServiceWorker};
use crate::Error;
use crate::cache::CacheStore;
use crate::notify::{
    ClickAction, MessageOutcome, Notification, on_message, on_notification_click, on_periodic_sync, on_push,
};

impl<S: CacheStore, N: Network> ServiceWorker<S, N> {
    /// Show the notification carried by a push payload.
    ///
    /// Payloads that are not JSON are logged and dropped; nothing is shown.
    pub async fn push(&self, payload: Option<&[u8]>) -> Result<Option<Notification>, Error> {
        match on_push(payload, &self.config.notifications) {
            Ok(Some(notification)) => {
                tracing::info!(tag = %notification.tag, "showing push notification");
                self.notifications.show(notification.clone()).await?;
                Ok(Some(notification))
            }
            Ok(None) => {
                tracing::debug!("push without payload");
                Ok(None)
            }
            Err(err) => {
                tracing::warn!(error = %err, "push ignored");
                Ok(None)
            }
        }
    }

    /// Handle a message posted by a page.
    ///
    /// A schedule request starts a timer on the current tokio runtime and
    /// returns its handle. The timer is not persisted: if the runtime shuts
    /// down first, the notification is lost.
    pub fn message(&self, message: &serde_json::Value) -> Option<JoinHandle<()>> {
        let MessageOutcome::Schedule { delay, notification } = on_message(message, &self.config.notifications) else {
            tracing::debug!("ignoring page message");
            return None;
        };

        tracing::info!(tag = %notification.tag, delay_ms = delay.as_millis() as u64, "scheduling notification");
        let center = self.notifications.clone();
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let tag = notification.tag.clone();
            if let Err(err) = center.show(notification).await {
                tracing::warn!(%tag, error = %err, "scheduled notification failed");
            }
        }))
    }

    /// Handle a click on the notification tagged `tag`.
    ///
    /// The notification is closed first. Returns what was done.
    pub async fn notification_click(&self, tag: &str, action: Option<&str>) -> Result<ClickAction, Error> {
        let data = self
            .notifications
            .close(tag)
            .await
            .map(|n| n.data)
            .unwrap_or_default();

        let windows = self.clients.match_windows().await;
        let origin = self.origin.origin().ascii_serialization();
        let decision = on_notification_click(action, &data, &windows, &origin);
        tracing::debug!(tag, ?decision, "notification click");

        match &decision {
            ClickAction::CloseOnly => {}
            ClickAction::Focus { client_id, navigate_to } => {
                self.clients.focus(client_id).await?;
                if let Some(url) = navigate_to {
                    self.clients.navigate(client_id, &self.resolve(url)?).await?;
                }
            }
            ClickAction::OpenWindow { url } => {
                self.clients.open_window(&self.resolve(url)?).await?;
            }
        }

        Ok(decision)
    }

    /// Handle a periodic background sync. Returns whether the tag is known.
    pub async fn periodic_sync(&self, tag: &str) -> bool {
        let known = on_periodic_sync(tag);
        if known {
            // Reminder data lives in the page's storage; nothing to check here yet.
            tracing::info!(tag, "checking for new episodes");
        } else {
            tracing::debug!(tag, "unknown periodic sync tag");
        }
        known
    }

    fn resolve(&self, url: &str) -> Result<String, Error> {
        self.origin
            .join(url)
            .map(String::from)
            .map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::super::testing::{FakeNetwork, worker};
    use super::*;
    use crate::cache::MemoryStore;

    fn sw() -> ServiceWorker<MemoryStore, FakeNetwork> {
        worker(MemoryStore::new(), FakeNetwork::new())
    }

    fn schedule(anime_id: i64, title: &str, delay: u64) -> serde_json::Value {
        json!({
            "type": "SCHEDULE_NOTIFICATION",
            "title": title,
            "body": "Bientôt disponible",
            "delay": delay,
            "animeId": anime_id,
            "url": format!("/anime/{anime_id}"),
        })
    }

    #[tokio::test]
    async fn test_push_shows_notification() {
        let sw = sw();
        let shown = sw.push(Some(br#"{"title":"Dandadan","animeId":57334}"#)).await.unwrap();
        assert!(shown.is_some());
        assert_eq!(sw.notifications().visible().await.len(), 1);
    }

    #[tokio::test]
    async fn test_push_same_tag_replaces() {
        let sw = sw();
        sw.push(Some(br#"{"title":"one"}"#)).await.unwrap();
        sw.push(Some(br#"{"title":"two"}"#)).await.unwrap();

        let visible = sw.notifications().visible().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "two");
    }

    #[tokio::test]
    async fn test_push_loose_payload_still_shows() {
        let sw = sw();
        let shown = sw.push(Some(br#"{"title":"Frieren","animeId":52991.0}"#)).await.unwrap().unwrap();
        assert_eq!(shown.title, "Frieren");
        assert_eq!(sw.notifications().visible().await.len(), 1);
    }

    #[tokio::test]
    async fn test_push_parse_failure_shows_nothing() {
        let sw = sw();
        assert!(sw.push(Some(b"{oops")).await.unwrap().is_none());
        assert!(sw.notifications().visible().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_notification_fires_after_delay() {
        let sw = sw();
        let handle = sw.message(&schedule(21, "One Piece", 60_000)).unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(sw.notifications().visible().await.is_empty());

        handle.await.unwrap();
        let visible = sw.notifications().visible().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].tag, "anime-21");
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_anime_scheduled_twice_collapses() {
        let sw = sw();
        let first = sw.message(&schedule(21, "first", 1_000)).unwrap();
        let second = sw.message(&schedule(21, "second", 2_000)).unwrap();
        first.await.unwrap();
        second.await.unwrap();

        let visible = sw.notifications().visible().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "second");
    }

    #[tokio::test]
    async fn test_unknown_message_schedules_nothing() {
        let sw = sw();
        assert!(sw.message(&json!({"type": "PING"})).is_none());
    }

    #[tokio::test]
    async fn test_click_opens_window_at_target() {
        let sw = sw();
        sw.push(Some(br#"{"url":"/anime/52991"}"#)).await.unwrap();

        let action = sw.notification_click("otakudb-notification", None).await.unwrap();

        assert_eq!(action, ClickAction::OpenWindow { url: "/anime/52991".into() });
        let windows = sw.clients().match_windows().await;
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].url, "http://localhost:8080/anime/52991");
        assert!(sw.notifications().visible().await.is_empty());
    }

    #[tokio::test]
    async fn test_click_focuses_existing_window() {
        let sw = sw();
        let window = sw.clients().open_window("http://localhost:8080/discover").await.unwrap();
        sw.clients().open_window("https://myanimelist.net/").await.unwrap();
        sw.push(Some(br#"{"url":"/anime/21"}"#)).await.unwrap();

        sw.notification_click("otakudb-notification", Some("open")).await.unwrap();

        let windows = sw.clients().match_windows().await;
        let focused = windows.iter().find(|w| w.id == window.id).unwrap();
        assert!(focused.focused);
        assert_eq!(focused.url, "http://localhost:8080/anime/21");
        assert_eq!(windows.len(), 2);
    }

    #[tokio::test]
    async fn test_click_dismiss_only_closes() {
        let sw = sw();
        sw.push(Some(br#"{"url":"/anime/21"}"#)).await.unwrap();

        let action = sw.notification_click("otakudb-notification", Some("dismiss")).await.unwrap();

        assert_eq!(action, ClickAction::CloseOnly);
        assert!(sw.notifications().visible().await.is_empty());
        assert!(sw.clients().match_windows().await.is_empty());
    }

    #[tokio::test]
    async fn test_periodic_sync() {
        let sw = sw();
        assert!(sw.periodic_sync("check-new-episodes").await);
        assert!(!sw.periodic_sync("other").await);
    }
}
