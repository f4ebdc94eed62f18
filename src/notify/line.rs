use crate::config::LineCredentials;
use crate::error::DeliveryError;
use crate::notify::Notifier;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const LINE_PUSH_API: &str = "https://api.line.me/v2/bot/message/push";

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// LINE Messaging API push transport
pub struct LineNotifier {
    client: Client,
    token: String,
    recipient: String,
}

impl LineNotifier {
    /// Build from credentials; `None` (with a warning) if the token or recipient is missing
    pub fn from_credentials(creds: &LineCredentials) -> Option<Self> {
        let Some(token) = creds.access_token.clone() else {
            warn!("Missing LINE_CHANNEL_ACCESS_TOKEN");
            return None;
        };
        let Some(recipient) = creds.recipient().map(str::to_string) else {
            warn!("Missing both LINE_TO_GROUP_ID and LINE_TO_USER_ID");
            return None;
        };

        let client = match Client::builder().timeout(Duration::from_secs(10)).build() {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to create HTTP client: {}", e);
                return None;
            }
        };

        Some(Self {
            client,
            token,
            recipient,
        })
    }

    fn payload<'a>(&'a self, text: &'a str) -> PushRequest<'a> {
        PushRequest {
            to: &self.recipient,
            messages: [TextMessage { kind: "text", text }],
        }
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(LINE_PUSH_API)
            .bearer_auth(&self.token)
            .json(&self.payload(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("LINE accepted message of {} chars", text.chars().count());
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "LINE"
    }
}
