use fancy_regex::Regex as BackrefRegex;
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_MAX_PHRASE_LEN: usize = 5;

static SPACE_BEFORE_COMMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+,").expect("comma spacing regex"));
static SINGLE_WORD_REPEAT_RE: Lazy<BackrefRegex> =
    Lazy::new(|| BackrefRegex::new(r"(?i)\b(\w+)(,? \1\b)").expect("word repeat regex"));
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("multi space regex"));
static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.,;:!?])").expect("punct spacing regex"));

static WS_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));
static ANY_SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([.,!?:;])").expect("loose punct regex"));

/// Collapses immediately repeated phrases, widest window first, then
/// repeated single words, then normalizes spacing. Idempotent.
pub fn dedupe_phrases(text: &str, max_phrase_len: usize) -> String {
    let mut text = SPACE_BEFORE_COMMA_RE.replace_all(text, ",").into_owned();

    for n in (1..=max_phrase_len).rev() {
        let pattern = format!(
            r"(?i)(\b(?:[\w\-'ōū]+(?:\s+|, ?)){{{}}}[\w\-'ōū]+\b)(,? \1\b)",
            n - 1
        );
        let Ok(re) = BackrefRegex::new(&pattern) else {
            continue;
        };
        // Each pass strictly shortens the text, so this terminates.
        while re.is_match(&text).unwrap_or(false) {
            text = re.replace_all(&text, "$1").into_owned();
        }
    }

    let text = SINGLE_WORD_REPEAT_RE.replace_all(&text, "$1");
    let text = MULTI_SPACE_RE.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCT_RE.replace_all(&text, "$1");
    text.trim().to_string()
}

/// Post-substitution cleanup: squeeze whitespace, reattach punctuation,
/// mend split possessives and contractions.
pub fn tidy_sentence(text: &str) -> String {
    let text = WS_RUN_RE.replace_all(text, " ");
    let text = ANY_SPACE_BEFORE_PUNCT_RE.replace_all(text.trim(), "$1");
    text.replace(" 's", "'s").replace(" n't", "n't")
}
