use std::collections::{BTreeMap, HashMap};

use crate::pipeline::affix::AffixSplit;
use crate::pipeline::spans::{CharText, MergedSpan};
use crate::placeholders::placeholder_token;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaceholderText {
    pub text: String,
    /// Placeholder token → canonical core text, one entry per distinct core.
    pub entities: BTreeMap<String, String>,
}

/// Replaces each span with a placeholder token, numbering distinct core
/// texts densely from 1 in first-seen order. Affixes that still bound the
/// span surface are re-anchored around the token.
pub fn map_placeholders(source: &CharText, pairs: &[(MergedSpan, AffixSplit)]) -> PlaceholderText {
    let mut token_by_core: HashMap<String, String> = HashMap::new();
    let mut next_idx = 1usize;
    let mut replacements: Vec<(usize, usize, String)> = Vec::with_capacity(pairs.len());

    for (span, split) in pairs {
        let token = token_by_core
            .entry(split.core.clone())
            .or_insert_with(|| {
                let token = placeholder_token(next_idx);
                next_idx += 1;
                token
            })
            .clone();
        replacements.push((span.start, span.end, span_replacement(&span.text, split, &token)));
    }

    replacements.sort_by_key(|r| r.0);
    let mut out = String::new();
    let mut last = 0usize;
    for (start, end, replacement) in &replacements {
        out.push_str(source.slice(last, *start));
        out.push_str(replacement);
        last = *end;
    }
    out.push_str(source.slice(last, source.char_len()));

    let entities = token_by_core
        .into_iter()
        .map(|(core, token)| (token, core))
        .collect();
    PlaceholderText { text: out, entities }
}

fn span_replacement(span_text: &str, split: &AffixSplit, token: &str) -> String {
    let actual_prefix = if !split.prefix.is_empty() && span_text.starts_with(&split.prefix) {
        split.prefix.as_str()
    } else {
        ""
    };
    let actual_suffix = if !split.suffix.is_empty() && span_text.ends_with(&split.suffix) {
        split.suffix.as_str()
    } else {
        ""
    };

    let affix_len = actual_prefix.len() + actual_suffix.len();
    let core_in_place = affix_len <= span_text.len()
        && &span_text[actual_prefix.len()..span_text.len() - actual_suffix.len()] == split.core;
    if core_in_place {
        return format!("{actual_prefix}{token}{actual_suffix}");
    }

    if format!("{}{}{}", split.prefix, split.core, split.suffix) == span_text {
        return format!("{}{token}{}", split.prefix, split.suffix);
    }
    if split.prefix.is_empty() && format!("{}{}", split.core, split.suffix) == span_text {
        return format!("{token}{}", split.suffix);
    }
    if split.suffix.is_empty() && format!("{}{}", split.prefix, split.core) == span_text {
        return format!("{}{token}", split.prefix);
    }
    // Last resort: affix text that no longer bounds the span is dropped.
    token.to_string()
}
