//! Direct-message request bodies and replies.
//!
//! [`DirectMessageBodyGenerator`] turns [`SendDirectMessageOptions`] into the
//! JSON `message_create` event the service expects. Media attachments refer
//! to an id returned by a completed upload (typically in the `dm_video`
//! category). [`DirectMessageResult`] decodes the reply.
//!
//! ```
//! use birdwire::direct_message::{
//!     BodyGenerator, DirectMessageBodyGenerator, QuickReplyOption, SendDirectMessageOptions,
//! };
//!
//! let options = SendDirectMessageOptions::new("844385345234", "Which one?")
//!     .with_quick_reply(QuickReplyOption::new("This").with_metadata("a"))
//!     .with_quick_reply(QuickReplyOption::new("That").with_metadata("b"));
//! let body = DirectMessageBodyGenerator.generate_body(&options)?;
//! assert!(body.starts_with(b"{\"event\""));
//! # Ok::<(), birdwire::error::ApiError>(())
//! ```

mod body;
mod types;

pub use body::{BodyGenerator, DirectMessageBodyGenerator};
pub use types::{
    DirectMessageEvent, DirectMessageResult, MessageCreate, MessageData, MessageTarget,
    QuickReplyOption, QuickReplyResponse, ReceivedAttachment, SendDirectMessageOptions,
    MEDIA_ATTACHMENT,
};
