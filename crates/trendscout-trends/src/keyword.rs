//! Search keyword derivation from listing titles.

/// Marketplace filler removed before lookup.
const FILLER: &[&str] = &[
    "pack of", "set of", "bundle", "combo", "(", ")", "[", "]", "-", "|", ",",
];
const MAX_WORDS: usize = 4;
/// Words of this length or shorter carry little search signal.
const MIN_WORD_LEN: usize = 2;
const MIN_KEYWORD_LEN: usize = 3;

/// Turns a listing title into a short search keyword.
///
/// Lowercases, strips [`FILLER`], then keeps the first four words longer
/// than two characters. Returns `None` when the result is too short to be
/// worth a lookup.
#[must_use]
pub fn clean_keyword(name: &str) -> Option<String> {
    let mut cleaned = name.to_lowercase();
    for term in FILLER {
        cleaned = cleaned.replace(term, " ");
    }

    let keyword = cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_WORD_LEN)
        .take(MAX_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    (keyword.chars().count() >= MIN_KEYWORD_LEN).then_some(keyword)
}
