use axum::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use super::flex::FlexContainer;
use crate::config::LineConfig;

const API_BASE: &str = "https://api.line.me";
const DATA_API_BASE: &str = "https://api-data.line.me";

/// Outgoing message payload: plain text, or the rich Flex layout used for
/// appointment reminders.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutgoingMessage {
    Text {
        text: String,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: FlexContainer,
    },
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutgoingMessage::Text { text: text.into() }
    }
}

/// The three chat-platform operations this backend consumes.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// One-shot reply tied to the triggering event.
    async fn reply(&self, reply_token: &str, messages: Vec<OutgoingMessage>) -> anyhow::Result<()>;
    /// Unsolicited push, used by the reminder jobs.
    async fn push(&self, to: &str, messages: Vec<OutgoingMessage>) -> anyhow::Result<()>;
    /// Raw bytes of an audio/image message.
    async fn get_message_content(&self, message_id: &str) -> anyhow::Result<Bytes>;
}

#[derive(Clone)]
pub struct LineClient {
    http: reqwest::Client,
    access_token: String,
}

impl LineClient {
    pub fn new(cfg: &LineConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token: cfg.channel_access_token.clone(),
        }
    }

    async fn post_messages(&self, path: &str, body: serde_json::Value) -> anyhow::Result<()> {
        self.http
            .post(format!("{API_BASE}{path}"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl ChatClient for LineClient {
    async fn reply(&self, reply_token: &str, messages: Vec<OutgoingMessage>) -> anyhow::Result<()> {
        // A failed reply is logged but never escalates: the event is already
        // consumed and the token cannot be reused anyway.
        if let Err(e) = self
            .post_messages(
                "/v2/bot/message/reply",
                json!({ "replyToken": reply_token, "messages": messages }),
            )
            .await
        {
            error!(error = %e, "failed to reply message");
        }
        Ok(())
    }

    async fn push(&self, to: &str, messages: Vec<OutgoingMessage>) -> anyhow::Result<()> {
        self.post_messages("/v2/bot/message/push", json!({ "to": to, "messages": messages }))
            .await
    }

    async fn get_message_content(&self, message_id: &str) -> anyhow::Result<Bytes> {
        let bytes = self
            .http
            .get(format!("{DATA_API_BASE}/v2/bot/message/{message_id}/content"))
            .bearer_auth(&self.access_token)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_serializes_to_line_shape() {
        let v = serde_json::to_value(OutgoingMessage::text("สวัสดีค่ะ")).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "text", "text": "สวัสดีค่ะ" }));
    }

    #[test]
    fn flex_message_carries_alt_text() {
        let msg = OutgoingMessage::Flex {
            alt_text: "แจ้งเตือนนัดหมาย".into(),
            contents: FlexContainer::Bubble {
                size: None,
                header: None,
                body: None,
                footer: None,
            },
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "flex");
        assert_eq!(v["altText"], "แจ้งเตือนนัดหมาย");
        assert_eq!(v["contents"]["type"], "bubble");
    }
}
