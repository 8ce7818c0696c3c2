//! Filter options for streaming connections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum quality level of delivered messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLevel {
    /// No filtering.
    #[default]
    None,
    /// Low filtering.
    Low,
    /// Medium filtering.
    Medium,
}

impl FilterLevel {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
        }
    }
}

impl fmt::Display for FilterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which accounts a user stream follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamWith {
    /// Only the authenticated user.
    #[default]
    User,
    /// The user and everyone they follow.
    Followings,
}

impl StreamWith {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Followings => "followings",
        }
    }
}

impl fmt::Display for StreamWith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point used as a bounding-box corner in `locations`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoCoordinates {
    /// Create a coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Snapshot of the filters applied when a connection opens.
///
/// Changing filters means opening a new connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStreamOptions {
    /// Request length-prefixed framing.
    pub delimited: bool,
    /// Ask the service to send stall warnings.
    pub stall_warnings: bool,
    /// Minimum message quality.
    pub filter_level: FilterLevel,
    /// Language filter; empty means any.
    pub language: String,
    /// Account ids to follow.
    pub follow: Vec<i64>,
    /// Keywords to track.
    pub track: Vec<String>,
    /// Bounding-box corners.
    pub locations: Vec<GeoCoordinates>,
    /// Which accounts a user stream follows.
    pub with: StreamWith,
    /// Deliver all replies.
    pub replies: bool,
    /// Send friend ids as strings.
    pub stringify_friend_ids: bool,
}

impl FilterStreamOptions {
    /// Create empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track these keywords.
    #[must_use]
    pub fn with_track<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.track = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Follow these account ids.
    #[must_use]
    pub fn with_follow(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.follow = ids.into_iter().collect();
        self
    }

    /// Restrict to these bounding-box corners.
    #[must_use]
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = GeoCoordinates>) -> Self {
        self.locations = locations.into_iter().collect();
        self
    }

    /// Restrict to a language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the filter level.
    #[must_use]
    pub const fn with_filter_level(mut self, level: FilterLevel) -> Self {
        self.filter_level = level;
        self
    }

    /// Request length-prefixed framing.
    #[must_use]
    pub const fn with_delimited(mut self, delimited: bool) -> Self {
        self.delimited = delimited;
        self
    }

    /// Request stall warnings.
    #[must_use]
    pub const fn with_stall_warnings(mut self, stall_warnings: bool) -> Self {
        self.stall_warnings = stall_warnings;
        self
    }

    /// Set which accounts a user stream follows.
    #[must_use]
    pub const fn with_with(mut self, with: StreamWith) -> Self {
        self.with = with;
        self
    }

    /// Deliver all replies.
    #[must_use]
    pub const fn with_replies(mut self, replies: bool) -> Self {
        self.replies = replies;
        self
    }

    /// Send friend ids as strings.
    #[must_use]
    pub const fn with_stringify_friend_ids(mut self, stringify: bool) -> Self {
        self.stringify_friend_ids = stringify;
        self
    }

    /// Request parameters in wire order.
    ///
    /// Optional fields are omitted when empty; booleans and enums are
    /// lower-cased.
    #[must_use]
    pub fn to_parameters(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(10);
        let mut push = |name: &str, value: String| params.push((name.to_string(), value));

        if self.delimited {
            push("delimited", "length".into());
        }
        push("stall_warnings", self.stall_warnings.to_string());
        push("filter_level", self.filter_level.to_string());
        if !self.language.is_empty() {
            push("language", self.language.clone());
        }
        if !self.follow.is_empty() {
            push("follow", join(self.follow.iter()));
        }
        if !self.track.is_empty() {
            push("track", join(self.track.iter()));
        }
        if !self.locations.is_empty() {
            let pairs = self
                .locations
                .iter()
                .map(|c| format!("{},{}", c.longitude, c.latitude));
            push("locations", join(pairs));
        }
        push("with", self.with.to_string());
        push("replies", self.replies.to_string());
        push("stringify_friend_id", self.stringify_friend_ids.to_string());

        params
    }
}

fn join<T: ToString>(values: impl Iterator<Item = T>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}
