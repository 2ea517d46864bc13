//! Resolution of user-supplied YouTube references to canonical video ids.
//!
//! Accepted shapes, anywhere inside the input:
//! - `youtube.com/watch?v=ID` (and any `?v=` / `&v=` query position)
//! - `youtube.com/v/ID`, `youtube.com/e/ID`, `youtube.com/embed/ID`
//! - `youtube.com/<segment>/<path>/ID`
//! - `youtu.be/ID`
//!
//! `ID` is the first 11 characters of `[A-Za-z0-9_-]` at that position.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const VIDEO_ID_LEN: usize = 11;

const LONG_HOST: &str = "youtube.com/";
const SHORT_HOST: &str = "youtu.be/";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the video id from `reference`, or `None` if no known shape matches.
///
/// Candidates are tried left to right; the first host marker that yields an
/// id wins.
pub fn resolve(reference: &str) -> Option<VideoId> {
    let mut from = 0;
    while let Some((pos, host)) = next_host(reference, from) {
        let rest = &reference[pos + host.len()..];
        let id = if host == LONG_HOST {
            match_long_form(rest)
        } else {
            take_id(rest)
        };
        if let Some(id) = id {
            return Some(VideoId(id.to_string()));
        }
        from = pos + 1;
    }
    None
}

fn next_host(reference: &str, from: usize) -> Option<(usize, &'static str)> {
    let haystack = &reference[from..];
    let long = haystack.find(LONG_HOST).map(|i| (from + i, LONG_HOST));
    let short = haystack.find(SHORT_HOST).map(|i| (from + i, SHORT_HOST));
    match (long, short) {
        (Some(l), Some(s)) => Some(if l.0 <= s.0 { l } else { s }),
        (l, s) => l.or(s),
    }
}

fn match_long_form(rest: &str) -> Option<&str> {
    nested_path(rest)
        .or_else(|| short_prefix(rest))
        .or_else(|| query_param(rest))
}

/// `<segment>/<path>/ID`: the segment has no slash, the path is any non-blank
/// run of at least one char. The last slash that still leaves room for an id wins.
fn nested_path(rest: &str) -> Option<&str> {
    let segment_len = rest
        .find(|c: char| c == '/' || c.is_whitespace())
        .unwrap_or(rest.len());
    if segment_len == 0 || !rest[segment_len..].starts_with('/') {
        return None;
    }

    let path = &rest[segment_len + 1..];
    let run = &path[..non_blank_len(path)];
    run.match_indices('/')
        .rev()
        .filter(|(i, _)| *i >= 1)
        .find_map(|(i, _)| take_id(&path[i + 1..]))
}

/// `v/ID`, `embed/ID` or `e/ID`.
fn short_prefix(rest: &str) -> Option<&str> {
    ["v/", "embed/", "e/"]
        .iter()
        .filter_map(|prefix| rest.strip_prefix(prefix))
        .find_map(take_id)
}

/// `...?v=ID` or `...&v=ID`, earliest occurrence within the non-blank run.
fn query_param(rest: &str) -> Option<&str> {
    let run = &rest[..non_blank_len(rest)];
    run.match_indices(['?', '&'])
        .filter_map(|(i, _)| rest[i + 1..].strip_prefix("v="))
        .find_map(take_id)
}

fn non_blank_len(s: &str) -> usize {
    s.find(char::is_whitespace).unwrap_or(s.len())
}

fn take_id(s: &str) -> Option<&str> {
    let candidate = s.get(..VIDEO_ID_LEN)?;
    candidate
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        .then_some(candidate)
}
