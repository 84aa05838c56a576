use serde::Deserialize;

/// Raw webhook body delivered by the platform.
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[allow(dead_code)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub reply_token: Option<String>,
    pub source: Option<EventSource>,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IncomingMessage {
    Text { id: String, text: String },
    Audio { id: String },
    Image { id: String },
    #[serde(other)]
    Unsupported,
}

/// A webhook event that passed the acceptance gate: message type, reply
/// capability, and a source user id.
#[derive(Debug, Clone)]
pub struct AcceptedEvent {
    pub line_user_id: String,
    pub reply_token: String,
    pub message: IncomingMessage,
}

/// Pure acceptance predicate. Everything rejected here is a silent no-op:
/// no user upsert, no classification, no reply.
pub fn accept(event: &WebhookEvent) -> Option<AcceptedEvent> {
    if event.kind != "message" {
        return None;
    }
    let reply_token = event.reply_token.clone()?;
    let line_user_id = event.source.as_ref()?.user_id.clone()?;
    let message = event.message.clone()?;
    Some(AcceptedEvent {
        line_user_id,
        reply_token,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_event(json: &str) -> WebhookEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_text_message_with_reply_and_source() {
        let e = parse_event(
            r#"{"type":"message","replyToken":"tok","source":{"userId":"U1"},
                "message":{"type":"text","id":"m1","text":"hello"}}"#,
        );
        let accepted = accept(&e).unwrap();
        assert_eq!(accepted.line_user_id, "U1");
        assert_eq!(accepted.reply_token, "tok");
        assert!(matches!(accepted.message, IncomingMessage::Text { .. }));
    }

    #[test]
    fn rejects_without_reply_token_or_user_id() {
        let no_token = parse_event(
            r#"{"type":"message","source":{"userId":"U1"},
                "message":{"type":"text","id":"m1","text":"hi"}}"#,
        );
        assert!(accept(&no_token).is_none());

        let no_user = parse_event(
            r#"{"type":"message","replyToken":"tok","source":{},
                "message":{"type":"text","id":"m1","text":"hi"}}"#,
        );
        assert!(accept(&no_user).is_none());
    }

    #[test]
    fn rejects_non_message_events() {
        let follow = parse_event(r#"{"type":"follow","replyToken":"tok","source":{"userId":"U1"}}"#);
        assert!(accept(&follow).is_none());
    }

    #[test]
    fn unknown_message_types_parse_as_unsupported() {
        let e = parse_event(
            r#"{"type":"message","replyToken":"tok","source":{"userId":"U1"},
                "message":{"type":"sticker","id":"m1","stickerId":"5"}}"#,
        );
        let accepted = accept(&e).unwrap();
        assert!(matches!(accepted.message, IncomingMessage::Unsupported));
    }
}
