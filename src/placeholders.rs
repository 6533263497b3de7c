use once_cell::sync::Lazy;
use regex::Regex;

// Placeholder tokens are numbered from 1 in first-seen order within a request.
// The closing bracket makes tokens prefix-free, so [PH1] never matches inside [PH10].
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[PH\d+\]").expect("placeholder regex"));

static EXACT_PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[PH\d+\]$").expect("exact placeholder regex"));

pub fn placeholder_token(n: usize) -> String {
    format!("[PH{n}]")
}

#[inline]
#[must_use]
pub fn is_placeholder_token(s: &str) -> bool {
    EXACT_PLACEHOLDER_RE.is_match(s)
}

/// Splits text into alternating plain/placeholder parts. Concatenating the
/// parts reproduces the input exactly.
pub fn split_by_placeholders(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut parts: Vec<String> = Vec::new();
    let mut pos = 0usize;
    for m in PLACEHOLDER_RE.find_iter(text) {
        parts.push(text[pos..m.start()].to_string());
        parts.push(m.as_str().to_string());
        pos = m.end();
    }
    parts.push(text[pos..].to_string());
    parts
}
