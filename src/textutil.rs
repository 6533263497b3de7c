/// Removes all whitespace. Tokenizers reinsert spaces inside multi-piece
/// words, so surfaces and source slices are compared in this form.
pub fn clean_surface(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[inline]
#[must_use]
pub fn is_wide_digit(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c)
}

/// Char-safe excerpt for log lines.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
