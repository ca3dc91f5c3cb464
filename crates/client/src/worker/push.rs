//! Push messages and notification clicks.

use async_trait::async_trait;
use bistro_core::Error;
use serde::{Deserialize, Serialize};

pub const NOTIFICATION_ICON: &str = "/images/icons/icon-192x192.png";
pub const NOTIFICATION_BADGE: &str = "/images/icons/badge-72x72.png";
pub const NOTIFICATION_VIBRATE: [u32; 3] = [200, 100, 200];

pub const ACTION_VIEW: &str = "view";
pub const ACTION_DISMISS: &str = "dismiss";

/// Payload carried by a push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: NotificationData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// A system notification ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// Displays notifications and opens windows on the worker's behalf.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show_notification(&self, notification: &Notification) -> Result<(), Error>;
    async fn close_notification(&self) -> Result<(), Error>;
    async fn open_window(&self, url: &str) -> Result<(), Error>;
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        tracing::info!(title = %notification.title, body = %notification.body, "showing notification");
        Ok(())
    }

    async fn close_notification(&self) -> Result<(), Error> {
        tracing::debug!("notification closed");
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<(), Error> {
        tracing::info!(url, "opening window");
        Ok(())
    }
}

/// Parse a raw push body. Empty or malformed payloads yield `None`.
pub fn parse_push(raw: Option<&[u8]>) -> Option<PushPayload> {
    let raw = raw.filter(|bytes| !bytes.is_empty())?;
    match serde_json::from_slice(raw) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed push payload");
            None
        }
    }
}

pub fn build_notification(payload: PushPayload) -> Notification {
    Notification {
        title: payload.title,
        body: payload.body,
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_BADGE.to_string(),
        vibrate: NOTIFICATION_VIBRATE.to_vec(),
        data: payload.data,
        actions: vec![
            NotificationAction {
                action: ACTION_VIEW.to_string(),
                title: "View Details".to_string(),
                icon: "/images/icons/view-icon.png".to_string(),
            },
            NotificationAction {
                action: ACTION_DISMISS.to_string(),
                title: "Dismiss".to_string(),
                icon: "/images/icons/dismiss-icon.png".to_string(),
            },
        ],
    }
}

/// Show the notification for a push message, if its payload is usable.
pub(crate) async fn handle_push(notifier: &dyn Notifier, raw: Option<&[u8]>) -> Result<Option<Notification>, Error> {
    let Some(payload) = parse_push(raw) else {
        return Ok(None);
    };
    let notification = build_notification(payload);
    notifier.show_notification(&notification).await?;
    Ok(Some(notification))
}

/// Close the notification; `view` also opens `data.url` (or the site root).
///
/// Returns the URL of the opened window.
pub(crate) async fn handle_notification_click(
    notifier: &dyn Notifier, action: Option<&str>, data: &NotificationData,
) -> Result<Option<String>, Error> {
    notifier.close_notification().await?;

    if action != Some(ACTION_VIEW) {
        return Ok(None);
    }

    let url = data.url.as_deref().filter(|u| !u.is_empty()).unwrap_or("/");
    notifier.open_window(url).await?;
    Ok(Some(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        shown: Mutex<Vec<Notification>>,
        closed: Mutex<usize>,
        opened: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
            self.shown.lock().unwrap().push(notification.clone());
            Ok(())
        }

        async fn close_notification(&self) -> Result<(), Error> {
            *self.closed.lock().unwrap() += 1;
            Ok(())
        }

        async fn open_window(&self, url: &str) -> Result<(), Error> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_parse_push() {
        let payload = parse_push(Some(br#"{"title":"Table ready","body":"See you soon","data":{"url":"/reservations.html"}}"#))
            .unwrap();
        assert_eq!(payload.title, "Table ready");
        assert_eq!(payload.data.url.as_deref(), Some("/reservations.html"));

        let no_data = parse_push(Some(br#"{"title":"t","body":"b"}"#)).unwrap();
        assert_eq!(no_data.data, NotificationData::default());
    }

    #[test]
    fn test_parse_push_ignores_bad_payloads() {
        assert!(parse_push(None).is_none());
        assert!(parse_push(Some(b"")).is_none());
        assert!(parse_push(Some(b"not json")).is_none());
        assert!(parse_push(Some(br#"{"body":"missing title"}"#)).is_none());
    }

    #[test]
    fn test_build_notification() {
        let notification = build_notification(PushPayload {
            title: "Special".into(),
            body: "Truffle risotto tonight".into(),
            data: NotificationData::default(),
        });
        assert_eq!(notification.icon, NOTIFICATION_ICON);
        assert_eq!(notification.badge, NOTIFICATION_BADGE);
        assert_eq!(notification.vibrate, vec![200, 100, 200]);
        let actions: Vec<_> = notification.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, vec!["view", "dismiss"]);
        assert_eq!(notification.actions[0].title, "View Details");
    }

    #[tokio::test]
    async fn test_handle_push_shows_notification() {
        let notifier = RecordingNotifier::default();
        let shown = handle_push(&notifier, Some(br#"{"title":"t","body":"b"}"#)).await.unwrap();
        assert!(shown.is_some());
        assert_eq!(notifier.shown.lock().unwrap().len(), 1);

        let ignored = handle_push(&notifier, Some(b"{")).await.unwrap();
        assert!(ignored.is_none());
        assert_eq!(notifier.shown.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_click_view_opens_url() {
        let notifier = RecordingNotifier::default();
        let data = NotificationData { url: Some("/menu.html".into()) };
        let opened = handle_notification_click(&notifier, Some("view"), &data).await.unwrap();
        assert_eq!(opened.as_deref(), Some("/menu.html"));
        assert_eq!(*notifier.closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_click_view_defaults_to_root() {
        let notifier = RecordingNotifier::default();
        let opened = handle_notification_click(&notifier, Some("view"), &NotificationData::default())
            .await
            .unwrap();
        assert_eq!(opened.as_deref(), Some("/"));
        assert_eq!(notifier.opened.lock().unwrap().as_slice(), ["/".to_string()]);
    }

    #[tokio::test]
    async fn test_click_view_empty_url_opens_root() {
        let notifier = RecordingNotifier::default();
        let data = NotificationData { url: Some(String::new()) };
        let opened = handle_notification_click(&notifier, Some("view"), &data).await.unwrap();
        assert_eq!(opened.as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn test_click_other_actions_only_close() {
        let notifier = RecordingNotifier::default();
        let data = NotificationData { url: Some("/menu.html".into()) };
        assert!(handle_notification_click(&notifier, Some("dismiss"), &data).await.unwrap().is_none());
        assert!(handle_notification_click(&notifier, None, &data).await.unwrap().is_none());
        assert_eq!(*notifier.closed.lock().unwrap(), 2);
        assert!(notifier.opened.lock().unwrap().is_empty());
    }
}
