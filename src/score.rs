//! Label-text scoring — maps an answer's wording to an ordinal preference.

use once_cell::sync::Lazy;
use regex::Regex;

/// Keyword rules in priority order. The first matching rule wins, so
/// negative phrasings that contain a positive phrase as a substring
/// (较不满意 contains 满意) must come before the positive rule, and the
/// bare 会 rule must come after 不会. Reordering breaks scoring.
static RULES: Lazy<Vec<(Regex, i32)>> = Lazy::new(|| {
    [
        ("非常不满意|非常不符合|非常不同意|很不满意|很不符合|很不同意", -2),
        ("不太满意|不太符合|不太同意|较不满意|较不符合|较不同意", -1),
        ("一般|中等|适中|还行", 0),
        ("非常满意|非常符合|非常同意|非常好|非常推荐|强烈同意|完全同意", 3),
        ("比较满意|比较符合|比较同意|较满意|较符合|较同意|满意|符合|同意", 2),
        ("不会", -1),
        ("会", 1),
        ("无助教", -1),
        ("有助教", 1),
    ]
    .into_iter()
    .map(|(pattern, score)| (Regex::new(pattern).expect("static rule pattern"), score))
    .collect()
});

/// Score a choice's label text. Returns `None` when no rule matches,
/// meaning "no opinion available" — distinct from `Some(0)`, which is an
/// explicit neutral answer.
pub fn score_text(text: &str) -> Option<i32> {
    let normalized: String = text.split_whitespace().collect();
    if normalized.is_empty() {
        return None;
    }
    RULES
        .iter()
        .find(|(re, _)| re.is_match(&normalized))
        .map(|(_, score)| *score)
}
