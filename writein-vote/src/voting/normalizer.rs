//! Candidate name normalization
//!
//! Names are compared and stored in one canonical form: trimmed, internal
//! whitespace collapsed to single spaces, each word title-cased.

/// Normalize a raw candidate name.
///
/// Total and idempotent: `normalize(&normalize(s)) == normalize(s)`.
///
/// ```
/// use writein_vote::voting::normalize;
///
/// assert_eq!(normalize("  DJ   synth "), "Dj Synth");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();

    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut out = String::with_capacity(lower.len());

    // Characters whose upper case expands (e.g. 'ß' -> "SS") stay lower case,
    // otherwise a second pass would re-case the expansion.
    let mut upper = first.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => out.push(single),
        _ => out.push(first),
    }

    out.push_str(chars.as_str());
    out
}
