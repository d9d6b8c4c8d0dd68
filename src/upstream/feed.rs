//! JF2 feed parsing, validation, ordering and sanitization.
//!
//! The service answers with `{ "children": [ ... ] }`. Each raw record goes
//! through the same pipeline:
//!
//! 1. keep only the four accepted `wm-property` kinds
//! 2. drop records missing required fields (author name and a parseable
//!    `published` date; mentions and replies also need `content`)
//! 3. stable sort ascending by `published`
//! 4. fill `content.value` with the sanitized display form
//!
//! A payload whose top level is not that shape is an error, not an empty
//! result.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::sanitize;
use crate::telemetry;
use crate::types::{Author, Content, Mention, MentionProperty};
use crate::{HuginnError, Result};

/// Top-level response body.
#[derive(Debug, Deserialize)]
struct Feed {
    children: Vec<RawMention>,
}

/// A record as the service sends it. Every field is optional here;
/// validation decides what survives.
#[derive(Debug, Deserialize)]
struct RawMention {
    #[serde(rename = "wm-property")]
    property: Option<String>,
    #[serde(rename = "wm-target")]
    target: Option<String>,
    #[serde(rename = "wm-source")]
    source: Option<String>,
    url: Option<String>,
    published: Option<String>,
    author: Option<RawAuthor>,
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    name: Option<String>,
    url: Option<String>,
    photo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    html: Option<String>,
    text: Option<String>,
}

/// Why a raw record was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Property,
    Fields,
}

impl Rejection {
    fn label(self) -> &'static str {
        match self {
            Rejection::Property => "property",
            Rejection::Fields => "fields",
        }
    }
}

/// Parse a response body into ordered, sanitized mentions.
pub fn parse_feed(body: &str) -> Result<Vec<Mention>> {
    let feed: Feed = serde_json::from_str(body)
        .map_err(|e| HuginnError::InvalidPayload(format!("expected {{\"children\": [...]}}: {e}")))?;
    Ok(process(feed.children))
}

fn process(children: Vec<RawMention>) -> Vec<Mention> {
    let received = children.len();
    let mut mentions: Vec<Mention> = children
        .into_iter()
        .filter_map(|raw| match validate(raw) {
            Ok(mention) => Some(mention),
            Err(rejection) => {
                metrics::counter!(telemetry::RECORDS_DROPPED_TOTAL, "reason" => rejection.label())
                    .increment(1);
                None
            }
        })
        .collect();

    mentions.sort_by_key(|m| m.published);

    for mention in &mut mentions {
        if let Some(content) = mention.content.as_mut() {
            sanitize::clean_content(content, &mention.source);
        }
    }

    debug!(received, kept = mentions.len(), "processed mention feed");
    mentions
}

fn validate(raw: RawMention) -> std::result::Result<Mention, Rejection> {
    let property = raw
        .property
        .as_deref()
        .and_then(MentionProperty::parse)
        .ok_or(Rejection::Property)?;

    let author = raw.author.ok_or(Rejection::Fields)?;
    let name = author
        .name
        .filter(|n| !n.is_empty())
        .ok_or(Rejection::Fields)?;
    let published = raw
        .published
        .as_deref()
        .and_then(parse_timestamp)
        .ok_or(Rejection::Fields)?;
    if property.requires_content() && raw.content.is_none() {
        return Err(Rejection::Fields);
    }

    Ok(Mention {
        property,
        target: raw.target.unwrap_or_default(),
        source: raw.source.unwrap_or_default(),
        url: raw.url,
        author: Author {
            name,
            url: author.url,
            photo: author.photo,
        },
        published,
        content: raw.content.map(|c| Content {
            html: c.html,
            text: c.text,
            value: None,
        }),
    })
}

/// RFC 3339, or a zone-less ISO timestamp read as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let parsed = parse_timestamp("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn parses_zoneless_as_utc() {
        let parsed = parse_timestamp("2019-11-05T14:10:11").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2019, 11, 5, 14, 10, 11).unwrap());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn rejection_labels() {
        assert_eq!(Rejection::Property.label(), "property");
        assert_eq!(Rejection::Fields.label(), "fields");
    }
}
