//! Keyword extraction over generated prose
//!
//! Loose tokenisation that works for both languages of the lexicon: Japanese
//! prose has no spaces, so most tokens are whole clauses between punctuation,
//! and that is fine for a residue.

use std::collections::HashMap;

use crate::lexicon::is_stop_word;

/// Default number of keywords kept in a residue
pub const DEFAULT_MAX_KEYWORDS: usize = 8;

/// Characters replaced by whitespace before splitting
const PUNCTUATION: &[char] = &[
    '、', '。', '.', ',', '!', '?', '！', '？', '-', '(', ')', '[', ']', '"', '\'', '：', ':', '\n',
];

/// Most frequent meaningful tokens, at most `max`
///
/// Ranked by count, ties kept in first-seen order. Tokens of one UTF-16 code
/// unit and stop words are ignored, so a lone BMP character is dropped while a
/// lone astral one (most emoji) is kept.
#[must_use]
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    if text.is_empty() || max == 0 {
        return Vec::new();
    }

    let cleaned: String = text
        .chars()
        .map(|c| if PUNCTUATION.contains(&c) { ' ' } else { c })
        .collect();

    // Insertion-ordered counts so the stable sort breaks ties by encounter
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for token in cleaned.split_whitespace() {
        if token.encode_utf16().count() <= 1 || is_stop_word(token) {
            continue;
        }
        match index.get(token).copied() {
            Some(i) => counts[i].1 += 1,
            None => {
                index.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(max)
        .map(|(word, _)| word.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stop_words_dropped_and_ranked_by_count() {
        let kw = extract_keywords("the cat the dog the cat", DEFAULT_MAX_KEYWORDS);
        assert_eq!(kw, vec!["cat", "dog"]);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let kw = extract_keywords("zeta alpha zeta alpha mid", 8);
        assert_eq!(kw, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_punctuation_splits_tokens() {
        let kw = extract_keywords("ash,ember.ash!(ember)[ash]", 8);
        assert_eq!(kw, vec!["ash", "ember"]);
    }

    #[test]
    fn test_short_tokens_ignored() {
        assert!(extract_keywords("a b c 光 x", 8).is_empty());
    }

    #[test]
    fn test_lone_astral_character_is_kept() {
        let kw = extract_keywords("🔥 a 🔥 𠮷", 8);
        assert_eq!(kw, vec!["🔥", "𠮷"]);
    }

    #[test]
    fn test_japanese_clauses_become_tokens() {
        let text = "【奉納】光\n\n円は満ち、欠け、また満ちる。";
        let kw = extract_keywords(text, 8);
        assert_eq!(kw, vec!["【奉納】光", "円は満ち", "欠け", "また満ちる"]);
    }

    #[test]
    fn test_ideographic_space_is_whitespace() {
        let kw = extract_keywords("星屑\u{3000}星屑\u{3000}種子", 8);
        assert_eq!(kw, vec!["星屑", "種子"]);
    }

    #[test]
    fn test_max_truncates() {
        let kw = extract_keywords("one two three four five", 2);
        assert_eq!(kw, vec!["one", "two"]);
        assert!(extract_keywords("one two", 0).is_empty());
        assert!(extract_keywords("", 8).is_empty());
    }
}
