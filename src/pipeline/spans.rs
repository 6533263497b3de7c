use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::models::RawEntity;
use crate::textutil::{clean_surface, is_wide_digit};

/// Char-indexed view of the source text; byte offsets never leave here.
pub struct CharText<'a> {
    text: &'a str,
    byte_starts: Vec<usize>,
}

impl<'a> CharText<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        let byte_starts = text
            .char_indices()
            .map(|(b, _)| b)
            .chain(std::iter::once(text.len()))
            .collect();
        Self { text, byte_starts }
    }

    #[must_use]
    pub fn char_len(&self) -> usize {
        self.byte_starts.len() - 1
    }

    /// Slices by char range. Callers keep `start <= end <= char_len()`.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.byte_starts[start]..self.byte_starts[end]]
    }

    #[must_use]
    pub fn char_at(&self, idx: usize) -> Option<char> {
        if idx >= self.char_len() {
            return None;
        }
        self.text[self.byte_starts[idx]..].chars().next()
    }

    fn char_index_of_byte(&self, byte: usize) -> usize {
        self.byte_starts
            .binary_search(&byte)
            .unwrap_or_else(|next| next)
    }

    // First occurrence of `needle` whose char start is at or after
    // `min_start`, as a char range.
    fn find_occurrence_at_or_after(&self, needle: &str, min_start: usize) -> Option<(usize, usize)> {
        if needle.is_empty() {
            return None;
        }
        let needle_chars = needle.chars().count();
        let mut byte_pos = 0usize;
        while let Some(rel) = self.text[byte_pos..].find(needle) {
            let abs = byte_pos + rel;
            let start = self.char_index_of_byte(abs);
            if start >= min_start {
                return Some((start, start + needle_chars));
            }
            byte_pos = abs + needle.len();
        }
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Anchors recognizer output onto the source text. Reported offsets are
/// trusted only when their slice matches the cleaned surface; everything else
/// falls back to an occurrence scan with a per-surface cursor. Longest
/// surfaces resolve first and occupied chars never resolve twice.
pub fn resolve_spans(source: &CharText, entities: &[RawEntity]) -> Vec<ResolvedSpan> {
    let mut order: Vec<(String, &RawEntity)> = entities
        .iter()
        .map(|e| (clean_surface(&e.word), e))
        .collect();
    order.sort_by_key(|(cleaned, _)| Reverse(cleaned.chars().count()));

    let mut occupied: HashSet<usize> = HashSet::new();
    let mut next_search: HashMap<String, usize> = HashMap::new();
    let mut spans: Vec<ResolvedSpan> = Vec::new();

    for (cleaned, entity) in order {
        if cleaned.is_empty() {
            continue;
        }

        let direct = match (entity.start, entity.end) {
            (Some(s), Some(t)) if s <= t && t <= source.char_len() => {
                (clean_surface(source.slice(s, t)) == cleaned).then_some((s, t))
            }
            _ => None,
        };
        let resolved = direct.or_else(|| {
            let from = next_search.get(&cleaned).copied().unwrap_or(0);
            let hit = source.find_occurrence_at_or_after(&cleaned, from);
            if let Some((s, _)) = hit {
                // The cursor advances even if the span is discarded below.
                next_search.insert(cleaned.clone(), s + 1);
            }
            hit
        });
        let Some((start, mut end)) = resolved else {
            continue;
        };

        if (start..end).any(|i| occupied.contains(&i)) {
            continue;
        }

        // Absorb a train-number marker: digit just before, 号 just after.
        if source.char_at(end) == Some('号')
            && source.char_at(end - 1).is_some_and(is_wide_digit)
        {
            end += 1;
        }

        spans.push(ResolvedSpan { start, end });
        occupied.extend(start..end);
    }

    spans.sort_by_key(|s| s.start);
    spans
}

/// Folds runs of exactly-adjacent spans into one, recomputing the text.
pub fn merge_adjacent(source: &CharText, spans: &[ResolvedSpan]) -> Vec<MergedSpan> {
    let Some(first) = spans.first() else {
        return Vec::new();
    };
    let mut merged: Vec<MergedSpan> = Vec::new();
    let (mut start, mut end) = (first.start, first.end);
    for span in &spans[1..] {
        if span.start == end {
            end = span.end;
        } else {
            merged.push(MergedSpan {
                start,
                end,
                text: source.slice(start, end).to_string(),
            });
            start = span.start;
            end = span.end;
        }
    }
    merged.push(MergedSpan {
        start,
        end,
        text: source.slice(start, end).to_string(),
    });
    merged
}
