//! Pure helpers for the rendering layer. No I/O.

use crate::types::{Mention, MentionProperty};

/// Mentions whose target is exactly `url`.
///
/// Useful when one feed covers several pages.
pub fn filter_by_url<'a>(records: &'a [Mention], url: &str) -> Vec<&'a Mention> {
    records.iter().filter(|m| m.target == url).collect()
}

/// Count mentions of `url` whose property is one of `types`.
pub fn count_by_type(records: &[Mention], url: &str, types: &[MentionProperty]) -> usize {
    records
        .iter()
        .filter(|m| m.target == url && types.contains(&m.property))
        .count()
}

/// Whether the mention's author URL starts with one of the site's own URLs.
pub fn is_own_mention<S: AsRef<str>>(record: &Mention, own_urls: &[S]) -> bool {
    record
        .author
        .url
        .as_deref()
        .is_some_and(|author| own_urls.iter().any(|own| author.starts_with(own.as_ref())))
}
