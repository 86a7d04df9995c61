use log::{info, warn};
use reqwest::Client;

use crate::config::NotifySettings;

/// Title header attached to every completion notification.
pub const NOTIFICATION_TITLE: &str = "Repository Engagement Analysis";

/// Result of a best-effort notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered { status: u16 },
    Failed { reason: String },
}

impl NotifyOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Push notifications through an ntfy-compatible service.
pub struct Notifier {
    settings: NotifySettings,
}

impl Notifier {
    pub fn new(settings: NotifySettings) -> Self {
        Self { settings }
    }

    /// POST `message` to the configured topic once.
    ///
    /// Failures are logged and returned as [`NotifyOutcome::Failed`]; this
    /// never returns an error.
    pub async fn send(&self, message: &str) -> NotifyOutcome {
        let endpoint = self.settings.endpoint();

        let outcome = match self.post(&endpoint, message).await {
            Ok(status) if (200..300).contains(&status) => NotifyOutcome::Delivered { status },
            Ok(status) => NotifyOutcome::Failed {
                reason: format!("notification service responded with status {status}"),
            },
            Err(e) => NotifyOutcome::Failed {
                reason: e.to_string(),
            },
        };

        match &outcome {
            NotifyOutcome::Delivered { status } => {
                info!("Notification sent to {endpoint} (status {status})");
            }
            NotifyOutcome::Failed { reason } => {
                warn!("Failed to send notification to {endpoint}: {reason}");
            }
        }

        outcome
    }

    async fn post(&self, endpoint: &str, message: &str) -> reqwest::Result<u16> {
        let client = Client::builder()
            .user_agent(concat!("repolens/", env!("CARGO_PKG_VERSION")))
            .timeout(self.settings.timeout)
            .build()?;

        let response = client
            .post(endpoint)
            .header("Title", NOTIFICATION_TITLE)
            .body(message.as_bytes().to_vec())
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}
