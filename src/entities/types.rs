//! Positional annotation types and their wire form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a positional annotation.
///
/// The declaration order is the tie-break precedence used when two entities
/// start at the same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// `#tag`
    HashTag,
    /// `@screen_name`
    Mention,
    /// A link.
    Url,
    /// An attached photo, GIF or video.
    Media,
}

impl EntityKind {
    /// Lower-case name used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HashTag => "hashtag",
            Self::Mention => "mention",
            Self::Url => "url",
            Self::Media => "media",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attached media item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Media id.
    #[serde(rename = "id_str", default)]
    pub id: String,
    /// `photo`, `animated_gif` or `video`.
    #[serde(rename = "type", default)]
    pub media_type: String,
    /// HTTPS URL of the media file.
    #[serde(default)]
    pub media_url_https: String,
    /// The short link embedded in the text.
    #[serde(default)]
    pub url: String,
    /// Display form of the link.
    #[serde(default)]
    pub display_url: String,
    /// Expanded form of the link.
    #[serde(default)]
    pub expanded_url: String,
}

/// Kind-specific data carried by a [`TextEntity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityPayload {
    /// Hashtag text without the `#`.
    HashTag {
        /// Tag text.
        text: String,
    },
    /// Mentioned account.
    Mention {
        /// Screen name without the `@`.
        screen_name: String,
        /// Display name.
        name: String,
        /// Account id.
        id: String,
    },
    /// Link.
    Url {
        /// The short link in the text.
        url: String,
        /// Resolved target.
        expanded_url: String,
        /// Display form.
        display_url: String,
    },
    /// Media items sharing one text range. Holds several photos when
    /// multi-photo merging folded them together.
    Media {
        /// Attached items, in input order.
        photos: Vec<MediaRef>,
    },
}

impl EntityPayload {
    /// Kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::HashTag { .. } => EntityKind::HashTag,
            Self::Mention { .. } => EntityKind::Mention,
            Self::Url { .. } => EntityKind::Url,
            Self::Media { .. } => EntityKind::Media,
        }
    }
}

/// A typed annotation over the half-open character range
/// `[start_index, end_index)` of a message's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntity {
    /// First character covered.
    pub start_index: usize,
    /// One past the last character covered.
    pub end_index: usize,
    /// Kind-specific data.
    pub payload: EntityPayload,
}

impl TextEntity {
    /// Create an entity.
    #[must_use]
    pub const fn new(start_index: usize, end_index: usize, payload: EntityPayload) -> Self {
        Self {
            start_index,
            end_index,
            payload,
        }
    }

    /// A hashtag entity.
    #[must_use]
    pub fn hashtag(start_index: usize, end_index: usize, text: impl Into<String>) -> Self {
        Self::new(start_index, end_index, EntityPayload::HashTag { text: text.into() })
    }

    /// A mention entity.
    #[must_use]
    pub fn mention(start_index: usize, end_index: usize, screen_name: impl Into<String>) -> Self {
        Self::new(
            start_index,
            end_index,
            EntityPayload::Mention {
                screen_name: screen_name.into(),
                name: String::new(),
                id: String::new(),
            },
        )
    }

    /// A link entity whose expanded and display forms equal `url`.
    #[must_use]
    pub fn url(start_index: usize, end_index: usize, url: impl Into<String>) -> Self {
        let url = url.into();
        Self::new(
            start_index,
            end_index,
            EntityPayload::Url {
                expanded_url: url.clone(),
                display_url: url.clone(),
                url,
            },
        )
    }

    /// A media entity holding one item.
    #[must_use]
    pub fn media(start_index: usize, end_index: usize, media: MediaRef) -> Self {
        Self::new(start_index, end_index, EntityPayload::Media { photos: vec![media] })
    }

    /// Kind of this entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.payload.kind()
    }

    /// Media items, empty for other kinds.
    #[must_use]
    pub fn photos(&self) -> &[MediaRef] {
        match &self.payload {
            EntityPayload::Media { photos } => photos,
            _ => &[],
        }
    }

    /// Returns true if the two ranges share at least one character.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_index < other.end_index && other.start_index < self.end_index
    }
}

/// `hashtags` item of the `entities` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HashtagEntity {
    /// Tag text.
    pub text: String,
    /// `[start, end]`.
    pub indices: [usize; 2],
}

/// `user_mentions` item of the `entities` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MentionEntity {
    /// Screen name.
    pub screen_name: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Account id.
    #[serde(default)]
    pub id_str: String,
    /// `[start, end]`.
    pub indices: [usize; 2],
}

/// `urls` item of the `entities` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlEntity {
    /// Short link.
    pub url: String,
    /// Resolved target.
    #[serde(default)]
    pub expanded_url: String,
    /// Display form.
    #[serde(default)]
    pub display_url: String,
    /// `[start, end]`.
    pub indices: [usize; 2],
}

/// `media` item of the `entities` or `extended_entities` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaEntity {
    /// The media item.
    #[serde(flatten)]
    pub media: MediaRef,
    /// `[start, end]`.
    pub indices: [usize; 2],
}

/// The service's `entities` object: one list per kind.
///
/// ```
/// use birdwire::entities::TextEntities;
///
/// let entities: TextEntities = serde_json::from_str(
///     r#"{"hashtags":[{"text":"rust","indices":[0,5]}],"urls":[]}"#,
/// )?;
/// assert_eq!(entities.to_text_entities().len(), 1);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TextEntities {
    /// Hashtags.
    #[serde(default)]
    pub hashtags: Vec<HashtagEntity>,
    /// Mentions.
    #[serde(default)]
    pub user_mentions: Vec<MentionEntity>,
    /// Links.
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
    /// Media. The legacy object carries at most the first photo.
    #[serde(default)]
    pub media: Vec<MediaEntity>,
}

impl TextEntities {
    /// Replace `media` with the complete `extended_entities.media` list.
    ///
    /// An empty list leaves the legacy media in place.
    #[must_use]
    pub fn with_extended_media(mut self, media: Vec<MediaEntity>) -> Self {
        if !media.is_empty() {
            self.media = media;
        }
        self
    }

    /// Flatten the per-kind lists into entities, kind by kind.
    #[must_use]
    pub fn to_text_entities(&self) -> Vec<TextEntity> {
        let hashtags = self
            .hashtags
            .iter()
            .map(|h| TextEntity::hashtag(h.indices[0], h.indices[1], h.text.clone()));
        let mentions = self.user_mentions.iter().map(|m| {
            TextEntity::new(
                m.indices[0],
                m.indices[1],
                EntityPayload::Mention {
                    screen_name: m.screen_name.clone(),
                    name: m.name.clone(),
                    id: m.id_str.clone(),
                },
            )
        });
        let urls = self.urls.iter().map(|u| {
            TextEntity::new(
                u.indices[0],
                u.indices[1],
                EntityPayload::Url {
                    url: u.url.clone(),
                    expanded_url: u.expanded_url.clone(),
                    display_url: u.display_url.clone(),
                },
            )
        });
        let media = self
            .media
            .iter()
            .map(|m| TextEntity::media(m.indices[0], m.indices[1], m.media.clone()));

        hashtags.chain(mentions).chain(urls).chain(media).collect()
    }

    /// Returns true if every list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hashtags.is_empty()
            && self.user_mentions.is_empty()
            && self.urls.is_empty()
            && self.media.is_empty()
    }
}
