//! Exercise name normalization and slug derivation.
//!
//! Training logs spell the same movement many ways ("Bench Press",
//! "bench-press", "Bench  press "). Normalization folds those spellings
//! together so that one canonical exercise row exists per slug.

/// Normalize a raw exercise name for comparison.
///
/// Trims, lowercases, maps punctuation variants (curly quotes, en/em dashes,
/// underscores, slashes) to their plain forms and collapses runs of whitespace.
///
/// ```rust,ignore
/// assert_eq!(normalize_exercise_name("  Incline   DB Press "), "incline db press");
/// assert_eq!(normalize_exercise_name("Farmer\u{2019}s Walk"), "farmer's walk");
/// ```
pub fn normalize_exercise_name(name: &str) -> String {
    let folded: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '`' | '\u{00b4}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            '_' | '/' | '\\' => ' ',
            other => other,
        })
        .collect();

    let words: Vec<&str> = folded.split_whitespace().collect();
    words.join(" ")
}

/// Derive the catalogue slug for a raw exercise name.
///
/// Apostrophes are dropped so "farmer's walk" and "farmers walk" share a slug;
/// every other run of non-alphanumeric characters becomes a single hyphen.
/// Returns an empty string when the name has no alphanumeric content.
pub fn exercise_slug(name: &str) -> String {
    let normalized = normalize_exercise_name(name);
    let mut slug = String::with_capacity(normalized.len());
    let mut pending_separator = false;

    for c in normalized.chars() {
        if c == '\'' || c == '"' {
            continue;
        }
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Display form stored on newly created exercises: normalized words, each
/// capitalized.
pub fn display_name(name: &str) -> String {
    normalize_exercise_name(name)
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
