//! Ingredient name canonicalization.
//!
//! Turns free-text ingredient names into comparison keys:
//!
//! ```text
//! "The Ripe Tomatoes"  -> "ripe_tomato"
//! "  EGGS "            -> "egg"
//! "olive_oil"          -> "olive_oil"
//! ```
//!
//! Steps: lower-case, split on whitespace/underscores, trim punctuation at token
//! edges, reduce each token to its singular form, strip leading determiners, join
//! with [`SEPARATOR`]. The function is total and idempotent; tokens it does not
//! recognize pass through unchanged.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Joins the tokens of a multi-word canonical name.
pub const SEPARATOR: char = '_';

static TOKEN_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("token split pattern is valid"));

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "some", "any", "this", "that", "these", "those",
];

/// Plural forms that simple suffix rules get wrong.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("leaves", "leaf"),
    ("loaves", "loaf"),
    ("halves", "half"),
    ("knives", "knife"),
    ("cookies", "cookie"),
    ("pies", "pie"),
    ("brownies", "brownie"),
    ("calories", "calorie"),
    ("anchovies", "anchovy"),
    ("geese", "goose"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
];

/// Words ending in `s` that are already singular.
const INVARIANT: &[&str] = &[
    "asparagus",
    "brussels",
    "citrus",
    "couscous",
    "hummus",
    "molasses",
    "octopus",
    "swiss",
    "series",
    "species",
    "grits",
];

/// Canonicalize a raw ingredient string.
///
/// # Example
///
/// ```
/// use plate_core::normalize::normalize;
///
/// assert_eq!(normalize("The Green Beans"), "green_bean");
/// assert_eq!(normalize("green_bean"), "green_bean");
/// ```
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut tokens: Vec<String> = TOKEN_SPLIT
        .split(lowered.trim())
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(singularize)
        .collect();

    // A lone determiner is kept rather than normalized to nothing.
    while tokens.len() > 1 && DETERMINERS.contains(&tokens[0].as_str()) {
        tokens.remove(0);
    }

    tokens.join(&SEPARATOR.to_string())
}

/// Canonical keys of `items`, de-duplicated, blanks removed.
pub fn canonical_set<I, S>(items: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| normalize(s.as_ref()))
        .filter(|k| !k.is_empty())
        .collect()
}

/// De-duplicate by canonical key, keeping the first surface form and its order.
pub fn dedup_preserving_order(items: &[String]) -> Vec<(String, String)> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        let key = normalize(item);
        if key.is_empty() {
            continue;
        }
        if seen.insert(key.clone()) {
            unique.push((item.clone(), key));
        }
    }
    unique
}

/// Whether canonical key `needle` appears as a whole-token run inside `haystack`.
///
/// `"egg"` is covered by `"large_egg"`; `"corn"` is not covered by `"popcorn"`.
pub fn covers(needle: &str, haystack: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    if needle == haystack {
        return true;
    }
    let needle: Vec<&str> = needle.split(SEPARATOR).collect();
    let haystack: Vec<&str> = haystack.split(SEPARATOR).collect();
    haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// Reduce one lower-case token to its singular form (applied to a fixpoint).
fn singularize(token: &str) -> String {
    let mut current = token.to_string();
    loop {
        let next = singularize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn singularize_once(token: &str) -> String {
    if let Some((_, singular)) = IRREGULAR_PLURALS.iter().find(|(plural, _)| *plural == token) {
        return (*singular).to_string();
    }
    if INVARIANT.contains(&token)
        || token.len() <= 3
        || !token.chars().all(|c| c.is_ascii_alphabetic())
    {
        return token.to_string();
    }

    if let Some(stem) = token.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = token.strip_suffix("oes") {
        return format!("{stem}o");
    }
    for suffix in ["sses", "ches", "shes", "xes"] {
        if token.ends_with(suffix) {
            return token[..token.len() - 2].to_string();
        }
    }
    if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
        return token.to_string();
    }
    match token.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lowercase_and_trim() {
        assert_eq!(normalize("  Butter "), "butter");
        assert_eq!(normalize("FLOUR"), "flour");
    }

    #[test]
    fn test_strips_leading_determiners() {
        assert_eq!(normalize("an onion"), "onion");
        assert_eq!(normalize("The eggs"), "egg");
        assert_eq!(normalize("some of the salt"), "of_the_salt");
        assert_eq!(normalize("the"), "the");
    }

    #[test]
    fn test_singular_forms() {
        assert_eq!(normalize("tomatoes"), "tomato");
        assert_eq!(normalize("berries"), "berry");
        assert_eq!(normalize("peaches"), "peach");
        assert_eq!(normalize("bay leaves"), "bay_leaf");
        assert_eq!(normalize("glasses"), "glass");
        assert_eq!(normalize("hummus"), "hummus");
        assert_eq!(normalize("molasses"), "molasses");
        assert_eq!(normalize("peas"), "pea");
    }

    #[test]
    fn test_multi_token_join() {
        assert_eq!(normalize("Olive Oil"), "olive_oil");
        assert_eq!(normalize("all-purpose flour"), "all-purpose_flour");
        assert_eq!(normalize("brown sugar, packed"), "brown_sugar_packed");
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        assert_eq!(normalize("gochujang"), "gochujang");
        assert_eq!(normalize("jalapeño"), "jalapeño");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_surface_forms_share_key() {
        assert_eq!(normalize("Egg"), normalize("eggs"));
        assert_eq!(normalize("a tomato"), normalize("Tomatoes"));
    }

    #[test]
    fn test_dedup_preserving_order() {
        let items = vec!["egg".to_string(), "Flour".to_string(), "eggs".to_string()];
        let unique = dedup_preserving_order(&items);
        assert_eq!(
            unique,
            vec![
                ("egg".to_string(), "egg".to_string()),
                ("Flour".to_string(), "flour".to_string()),
            ]
        );
    }

    #[test]
    fn test_covers_whole_tokens_only() {
        assert!(covers("egg", "large_egg"));
        assert!(covers("chicken", "chicken_breast"));
        assert!(covers("green_onion", "green_onion"));
        assert!(!covers("corn", "popcorn"));
        assert!(!covers("", "salt"));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "[A-Za-z ,._-]{0,40}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
