//! Bedrock converse API schemas
//!
//! Only the subset the relay sends and reads is modelled. Everything in the reply
//! is optional: a reply with no output, no message or an empty content list still
//! decodes, and extraction falls back to a placeholder.

use serde::{Deserialize, Serialize};

/// Request body for `POST /model/{model_id}/converse`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConverseRequest {
    /// The conversation turns, oldest first
    pub messages: Vec<Message>,
}

impl ConverseRequest {
    /// A single user turn holding one text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message {
                role: Role::User,
                content: vec![ContentBlock { text: text.into() }],
            }],
        }
    }
}

/// One turn of the conversation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContentBlock {
    pub text: String,
}

/// Response body of a successful converse call
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    #[serde(default)]
    pub output: Option<ConverseOutput>,

    #[serde(default)]
    pub usage: Option<TokenUsage>,

    /// Why the model stopped generating, e.g. `end_turn` or `max_tokens`
    #[serde(default)]
    pub stop_reason: Option<String>,
}

impl ConverseResponse {
    /// The first content block that carries text, if any.
    ///
    /// Non-text blocks (tool use, images) are skipped.
    pub fn first_text(&self) -> Option<&str> {
        self.output
            .as_ref()?
            .message
            .as_ref()?
            .content
            .iter()
            .find_map(|block| block.text.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConverseOutput {
    #[serde(default)]
    pub message: Option<OutputMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputMessage {
    #[serde(default)]
    pub content: Vec<OutputContentBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputContentBlock {
    #[serde(default)]
    pub text: Option<String>,
}

/// Token accounting reported by the upstream
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_text_serializes_to_converse_shape() {
        let request = ConverseRequest::user_text("Hello there");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"messages": [{"role": "user", "content": [{"text": "Hello there"}]}]})
        );
    }

    #[test]
    fn full_reply_yields_first_text_and_usage() {
        let reply: ConverseResponse = serde_json::from_value(json!({
            "output": {
                "message": {
                    "role": "assistant",
                    "content": [{"text": "first"}, {"text": "second"}]
                }
            },
            "stopReason": "end_turn",
            "usage": {"inputTokens": 12, "outputTokens": 34, "totalTokens": 46}
        }))
        .unwrap();

        assert_eq!(reply.first_text(), Some("first"));
        assert_eq!(reply.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(
            reply.usage,
            Some(TokenUsage {
                input_tokens: 12,
                output_tokens: 34,
                total_tokens: Some(46),
            })
        );
    }

    #[test]
    fn non_text_blocks_are_skipped() {
        let reply: ConverseResponse = serde_json::from_value(json!({
            "output": {"message": {"content": [
                {"toolUse": {"toolUseId": "t1", "name": "lookup", "input": {}}},
                {"text": "after the tool"}
            ]}}
        }))
        .unwrap();

        assert_eq!(reply.first_text(), Some("after the tool"));
    }

    #[test]
    fn missing_pieces_decode_without_text() {
        for body in [
            json!({}),
            json!({"output": null}),
            json!({"output": {}}),
            json!({"output": {"message": {}}}),
            json!({"output": {"message": {"content": []}}}),
        ] {
            let reply: ConverseResponse = serde_json::from_value(body.clone()).unwrap();
            assert_eq!(reply.first_text(), None, "body: {body}");
            assert!(reply.usage.is_none());
        }
    }

    #[test]
    fn wrong_shape_fails_to_decode() {
        assert!(serde_json::from_value::<ConverseResponse>(json!([1, 2, 3])).is_err());
        assert!(
            serde_json::from_value::<ConverseResponse>(json!({"output": {"message": {"content": "text"}}}))
                .is_err()
        );
    }
}
