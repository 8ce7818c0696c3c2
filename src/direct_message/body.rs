//! Request body generation.

use bytes::Bytes;
use serde::Serialize;

use super::types::{MessageTarget, QuickReplyOption, SendDirectMessageOptions};
use crate::error::ApiError;

/// Builds a request body from typed arguments.
#[cfg_attr(test, mockall::automock)]
pub trait BodyGenerator<A: 'static> {
    /// MIME type of the generated body.
    fn content_type(&self) -> &'static str;

    /// Serialize `args`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if `args` cannot form a valid body.
    fn generate_body(&self, args: &A) -> Result<Bytes, ApiError>;
}

/// JSON `message_create` event body for sending a direct message.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectMessageBodyGenerator;

#[derive(Serialize)]
struct Envelope<'a> {
    event: Event<'a>,
}

#[derive(Serialize)]
struct Event<'a> {
    #[serde(rename = "type")]
    event_type: &'static str,
    message_create: MessageCreate<'a>,
}

#[derive(Serialize)]
struct MessageCreate<'a> {
    target: MessageTarget,
    message_data: MessageData<'a>,
}

#[derive(Serialize)]
struct MessageData<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<Attachment<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quick_reply: Option<QuickReply<'a>>,
}

#[derive(Serialize)]
struct Attachment<'a> {
    #[serde(rename = "type")]
    attachment_type: &'a str,
    media: MediaId<'a>,
}

#[derive(Serialize)]
struct MediaId<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct QuickReply<'a> {
    #[serde(rename = "type")]
    reply_type: &'static str,
    options: &'a [QuickReplyOption],
}

impl BodyGenerator<SendDirectMessageOptions> for DirectMessageBodyGenerator {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn generate_body(&self, args: &SendDirectMessageOptions) -> Result<Bytes, ApiError> {
        if args.recipient_id.is_empty() {
            return Err(ApiError::InvalidRequest {
                message: "direct message needs a recipient".into(),
            });
        }

        let envelope = Envelope {
            event: Event {
                event_type: "message_create",
                message_create: MessageCreate {
                    target: MessageTarget {
                        recipient_id: args.recipient_id.clone(),
                    },
                    message_data: MessageData {
                        text: &args.text,
                        attachment: args.media_id.as_deref().map(|id| Attachment {
                            attachment_type: &args.media_type,
                            media: MediaId { id },
                        }),
                        quick_reply: (!args.quick_replies.is_empty()).then(|| QuickReply {
                            reply_type: "options",
                            options: &args.quick_replies,
                        }),
                    },
                },
            },
        };

        let body = serde_json::to_vec(&envelope).map_err(|e| ApiError::InvalidRequest {
            message: format!("direct message body: {e}"),
        })?;
        tracing::debug!(
            recipient_id = %args.recipient_id,
            bytes = body.len(),
            has_attachment = args.media_id.is_some(),
            quick_replies = args.quick_replies.len(),
            "Generated direct message body"
        );
        Ok(Bytes::from(body))
    }
}
