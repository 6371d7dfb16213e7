//! Character-level text helpers.
//!
//! All budgets in the pipeline are counted in Unicode scalar values, so
//! every split and truncation here lands on a `char` boundary.

/// Split `text` into ordered, contiguous slices of at most `size` chars.
///
/// Concatenating the slices reproduces `text` exactly. Empty input, or a
/// zero `size`, yields no slices.
pub fn split_chars(text: &str, size: usize) -> Vec<&str> {
    if text.is_empty() || size == 0 {
        return Vec::new();
    }

    let mut slices = Vec::with_capacity(text.len() / size + 1);
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == size {
            slices.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    slices.push(&text[start..]);
    slices
}

/// Split `text` into at most `parts` slices of roughly equal char length.
pub fn split_even(text: &str, parts: usize) -> Vec<&str> {
    if parts == 0 {
        return Vec::new();
    }
    let total = text.chars().count();
    split_chars(text, total.div_ceil(parts))
}

/// The longest prefix of `text` that is at most `max_chars` chars long.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Join the non-empty pieces with a single space.
pub fn join_non_empty<S: AsRef<str>>(pieces: &[S]) -> String {
    pieces
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
