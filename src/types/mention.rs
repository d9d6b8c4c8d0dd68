//! Mention record types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of interaction a mention represents.
///
/// Only these four are accepted from the aggregation service; anything
/// else (bookmarks, RSVPs, ...) is discarded while processing a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MentionProperty {
    MentionOf,
    InReplyTo,
    LikeOf,
    RepostOf,
}

impl MentionProperty {
    /// All accepted properties, in wire order.
    pub const ALL: [MentionProperty; 4] = [
        MentionProperty::MentionOf,
        MentionProperty::InReplyTo,
        MentionProperty::LikeOf,
        MentionProperty::RepostOf,
    ];

    /// Wire name as sent in `wm-property`.
    pub fn as_str(self) -> &'static str {
        match self {
            MentionProperty::MentionOf => "mention-of",
            MentionProperty::InReplyTo => "in-reply-to",
            MentionProperty::LikeOf => "like-of",
            MentionProperty::RepostOf => "repost-of",
        }
    }

    /// Parse a `wm-property` value. Returns `None` for disallowed kinds.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }

    /// Whether a record of this kind must carry content to be displayed.
    ///
    /// Likes and reposts are rendered as a face pile, so they only need an
    /// author and a date.
    pub fn requires_content(self) -> bool {
        matches!(self, MentionProperty::MentionOf | MentionProperty::InReplyTo)
    }
}

impl fmt::Display for MentionProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of the mentioning page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Body of a reply or mention.
///
/// `html` and `text` are what the service sent; `value` is the sanitized
/// form meant for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A validated, sanitized mention of a tracked page.
///
/// Built fresh on every successful fetch and treated as immutable once it
/// reaches the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub property: MentionProperty,
    /// Page being mentioned.
    pub target: String,
    /// Page doing the mentioning.
    pub source: String,
    /// Canonical URL of the mention itself, when the service knows one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub author: Author,
    pub published: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

impl Mention {
    /// Sanitized display value of the content, if any.
    pub fn display_content(&self) -> Option<&str> {
        self.content.as_ref()?.value.as_deref()
    }
}
