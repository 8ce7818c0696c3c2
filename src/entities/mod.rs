//! Positional text annotations.
//!
//! Messages carry hashtags, mentions, links and media as separate lists of
//! character ranges. [`coalesce`] merges them into one ordered,
//! non-overlapping sequence suitable for rendering.

mod coalesce;
mod types;

pub use coalesce::coalesce;
pub use types::{
    EntityKind, EntityPayload, HashtagEntity, MediaEntity, MediaRef, MentionEntity, TextEntities,
    TextEntity, UrlEntity,
};
