//! Splitting and joining of space separated search queries.
//!
//! Every token except the last is committed; the last one is the token the
//! user is currently typing and the one suggestions are matched against.

use url::form_urlencoded;

use crate::catalog::Tag;

/// Split `text` on each whitespace character.
///
/// The empty string yields a single empty token and a trailing separator
/// yields a trailing empty token, so there is always a token being edited.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(char::is_whitespace).map(str::to_owned).collect()
}

/// Tags whose canonical name contains the last token (case-insensitive),
/// minus those already committed earlier in the query. Catalog order is kept.
pub fn filter_options<'a, T: AsRef<Tag>>(tokens: &[String], catalog: &'a [T]) -> Vec<&'a T> {
    let Some((last, committed)) = tokens.split_last() else {
        return catalog.iter().collect();
    };
    let needle = last.to_lowercase();

    catalog
        .iter()
        .filter(|option| {
            let canonical = &option.as_ref().canonical_name;
            canonical.to_lowercase().contains(&needle)
                && !committed.iter().any(|token| token == canonical)
        })
        .collect()
}

/// Replace the token being edited with `tag`'s canonical name and start a new one.
///
/// Empty committed tokens are dropped so the result never holds two
/// consecutive separators; it always ends with exactly one.
pub fn commit_token(tokens: &[String], tag: &Tag) -> String {
    let committed = tokens.split_last().map(|(_, rest)| rest).unwrap_or(&[]);
    let mut out = String::new();
    for token in committed.iter().filter(|token| !token.is_empty()) {
        out.push_str(token);
        out.push(' ');
    }
    out.push_str(&tag.canonical_name);
    out.push(' ');
    out
}

/// Tokens handed over when the whole query is submitted; empty tokens are stripped.
pub fn submitted_tokens(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .filter(|token| !token.is_empty())
        .cloned()
        .collect()
}

/// Encode tokens as the value of the `q` parameter, joined with `+`.
pub fn serialize_query(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|token| form_urlencoded::byte_serialize(token.as_bytes()).collect::<String>())
        .collect::<Vec<_>>()
        .join("+")
}

/// Decode a raw `q` parameter value back into tokens.
pub fn parse_query(raw: &str) -> Vec<String> {
    let decoded = decode_component(raw);
    if decoded.is_empty() {
        return Vec::new();
    }
    decoded.split(' ').map(str::to_owned).collect()
}

/// Value of `key` in a raw query string (without the leading `?`), decoded.
pub fn query_param(query: &str, key: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

fn decode_component(raw: &str) -> String {
    form_urlencoded::parse(format!("v={raw}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
