//! Event decisions for the notification bridge.
//!
//! Each function takes an event payload plus configuration and returns what
//! should happen; nothing here touches the platform.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ItemId, Notification, NotificationAction, NotificationData, WindowClient};
use crate::Error;
use crate::config::NotificationDefaults;

/// Vibration pattern used for every notification, in milliseconds.
const VIBRATE: [u32; 3] = [100, 50, 100];

/// Periodic sync tag that triggers the new-episode check.
pub const NEW_EPISODES_SYNC: &str = "check-new-episodes";

/// Page message type that asks for a delayed notification.
pub const SCHEDULE_NOTIFICATION: &str = "SCHEDULE_NOTIFICATION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Show `notification` once `delay` has elapsed. Not persisted.
    Schedule { delay: Duration, notification: Notification },
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickAction {
    /// The dismiss action: close and stop.
    CloseOnly,
    /// Focus an existing window, optionally sending it somewhere.
    Focus { client_id: String, navigate_to: Option<String> },
    OpenWindow { url: String },
}

/// Text field of a payload. Numbers are rendered; empty strings, `null` and
/// other types count as missing.
fn text(payload: &Value, field: &str) -> Option<String> {
    match payload.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Item id of a payload. Whole floats such as `52991.0` read as numbers.
fn item_id(payload: &Value) -> Option<ItemId> {
    match payload.get("animeId")? {
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => ItemId::Number(i),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => ItemId::Number(f as i64),
            _ => ItemId::Text(n.to_string()),
        }),
        Value::String(s) if !s.is_empty() => Some(ItemId::Text(s.clone())),
        _ => None,
    }
}

/// Delay in milliseconds. Numeric strings are accepted; anything else,
/// including negative or non-finite values, is no delay.
fn delay(payload: &Value) -> Duration {
    let millis = match payload.get("delay") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|ms| ms.is_finite() && *ms > 0.0)
    .unwrap_or(0.0);
    Duration::from_millis(millis as u64)
}

/// Decide what a push payload shows.
///
/// An absent payload shows nothing. A payload that is not JSON is an
/// [`Error::InvalidPayload`]. Any JSON value shows a notification: fields
/// that are missing or of the wrong type fall back to the defaults.
pub fn on_push(payload: Option<&[u8]>, defaults: &NotificationDefaults) -> Result<Option<Notification>, Error> {
    let Some(bytes) = payload else {
        return Ok(None);
    };

    let payload: Value =
        serde_json::from_slice(bytes).map_err(|e| Error::InvalidPayload(format!("push is not JSON: {e}")))?;

    Ok(Some(Notification {
        title: text(&payload, "title").unwrap_or_else(|| defaults.default_title.clone()),
        body: Some(text(&payload, "body").unwrap_or_else(|| defaults.default_body.clone())),
        icon: defaults.icon.clone(),
        badge: defaults.badge.clone(),
        vibrate: VIBRATE.to_vec(),
        tag: text(&payload, "tag").unwrap_or_else(|| defaults.default_tag.clone()),
        renotify: true,
        data: NotificationData {
            url: Some(text(&payload, "url").unwrap_or_else(|| "/".into())),
            anime_id: item_id(&payload),
        },
        actions: vec![
            NotificationAction { action: "open".into(), title: "Voir".into() },
            NotificationAction { action: "dismiss".into(), title: "Ignorer".into() },
        ],
    }))
}

/// Decide what a page message asks for.
///
/// Only objects whose `type` is `SCHEDULE_NOTIFICATION` are understood. The
/// notification is tagged `anime-<animeId>` so rescheduling the same anime
/// replaces the earlier one.
pub fn on_message(message: &Value, defaults: &NotificationDefaults) -> MessageOutcome {
    if message.get("type").and_then(Value::as_str) != Some(SCHEDULE_NOTIFICATION) {
        return MessageOutcome::Ignored;
    }

    let anime_id = item_id(message);
    let tag = match &anime_id {
        Some(id) => format!("anime-{id}"),
        None => defaults.default_tag.clone(),
    };

    MessageOutcome::Schedule {
        delay: delay(message),
        notification: Notification {
            title: text(message, "title").unwrap_or_else(|| defaults.default_title.clone()),
            body: text(message, "body"),
            icon: defaults.icon.clone(),
            badge: defaults.badge.clone(),
            vibrate: VIBRATE.to_vec(),
            tag,
            renotify: false,
            data: NotificationData { url: text(message, "url"), anime_id },
            actions: Vec::new(),
        },
    }
}

/// Decide where a notification click leads.
///
/// `origin` is the app origin; the first window whose URL contains it is
/// reused. The root URL focuses without navigating.
pub fn on_notification_click(
    action: Option<&str>, data: &NotificationData, windows: &[WindowClient], origin: &str,
) -> ClickAction {
    if action == Some("dismiss") {
        return ClickAction::CloseOnly;
    }

    let url = data.url.clone().filter(|u| !u.is_empty()).unwrap_or_else(|| "/".into());

    match windows.iter().find(|w| w.url.contains(origin)) {
        Some(window) => ClickAction::Focus {
            client_id: window.id.clone(),
            navigate_to: (url != "/").then_some(url),
        },
        None => ClickAction::OpenWindow { url },
    }
}

/// Whether a periodic sync tag is one the worker handles.
pub fn on_periodic_sync(tag: &str) -> bool {
    tag == NEW_EPISODES_SYNC
}
