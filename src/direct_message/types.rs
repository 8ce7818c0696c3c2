//! Direct-message request options and response models.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::TextEntities;
use crate::error::ApiError;
use crate::traits::ApiResponse;

/// Attachment type for uploaded media.
pub const MEDIA_ATTACHMENT: &str = "media";

/// One button of a quick-reply prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReplyOption {
    /// Button text.
    pub label: String,
    /// Secondary text under the label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque value echoed back in the reply event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl QuickReplyOption {
    /// Create an option with only a label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            metadata: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

/// Arguments for sending one direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendDirectMessageOptions {
    /// Recipient account id.
    pub recipient_id: String,
    /// Message text.
    pub text: String,
    /// Id of previously uploaded media to attach.
    pub media_id: Option<String>,
    /// Attachment type; [`MEDIA_ATTACHMENT`] unless overridden.
    pub media_type: String,
    /// Quick-reply buttons.
    pub quick_replies: Vec<QuickReplyOption>,
}

impl SendDirectMessageOptions {
    /// Create options for a text-only message.
    #[must_use]
    pub fn new(recipient_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            text: text.into(),
            media_id: None,
            media_type: MEDIA_ATTACHMENT.to_string(),
            quick_replies: Vec::new(),
        }
    }

    /// Attach uploaded media, e.g. the id of a `dm_video` upload session.
    #[must_use]
    pub fn with_media(mut self, media_id: impl Into<String>) -> Self {
        self.media_id = Some(media_id.into());
        self
    }

    /// Override the attachment type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    /// Add a quick-reply button.
    #[must_use]
    pub fn with_quick_reply(mut self, option: QuickReplyOption) -> Self {
        self.quick_replies.push(option);
        self
    }
}

/// Reply to a send request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectMessageResult {
    /// The created event.
    pub event: DirectMessageEvent,
}

impl DirectMessageResult {
    /// Decode a send response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Protocol`] for a non-success status and
    /// [`ApiError::Decode`] for a malformed body.
    pub fn from_response(response: &ApiResponse) -> Result<Self, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Protocol {
                status: response.status,
                message: response.body_text(),
            });
        }
        serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode {
            message: format!("direct message response: {e}"),
        })
    }
}

/// A direct-message event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectMessageEvent {
    /// Event id.
    pub id: String,
    /// Event type, `message_create` for messages.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Creation time in epoch milliseconds, as a string.
    #[serde(default)]
    pub created_timestamp: Option<String>,
    /// Message payload.
    #[serde(default)]
    pub message_create: Option<MessageCreate>,
}

impl DirectMessageEvent {
    /// Parsed creation time.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let millis: i64 = self.created_timestamp.as_deref()?.parse().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

/// `message_create` object of a received event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageCreate {
    /// Recipient.
    pub target: MessageTarget,
    /// Sender account id.
    #[serde(default)]
    pub sender_id: Option<String>,
    /// Id of the app that sent the message.
    #[serde(default)]
    pub source_app_id: Option<String>,
    /// Content.
    pub message_data: MessageData,
}

/// Recipient of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTarget {
    /// Recipient account id.
    pub recipient_id: String,
}

/// Content of a received message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageData {
    /// Message text.
    pub text: String,
    /// Annotations over the text.
    #[serde(default)]
    pub entities: Option<TextEntities>,
    /// Attached media.
    #[serde(default)]
    pub attachment: Option<ReceivedAttachment>,
    /// Set when the message answers a quick-reply prompt.
    #[serde(default)]
    pub quick_reply_response: Option<QuickReplyResponse>,
}

/// Attachment on a received message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReceivedAttachment {
    /// Attachment type.
    #[serde(rename = "type")]
    pub attachment_type: String,
    /// Media object as sent by the service.
    pub media: serde_json::Value,
}

/// Quick-reply answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuickReplyResponse {
    /// Response type, `options`.
    #[serde(rename = "type")]
    pub response_type: String,
    /// Metadata of the chosen option.
    #[serde(default)]
    pub metadata: Option<String>,
}
