//! Mythic Lexicon
//!
//! Process-wide immutable vocabulary: the categories the text generator draws
//! from and the stop words the keyword extractor ignores. Order matters: the
//! text generator indexes these slices with stream draws, so reordering an
//! entry changes every generated text.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Topic words used when no prompt is offered
pub const THEMES: &[&str] = &[
    "創造", "破壊", "再生", "循環", "無常", "沈黙", "祈り", "余白", "光", "闇", "記憶", "忘却",
    "風", "水", "炎", "土", "星", "種", "円環", "世界樹",
];

/// First line of the prose
pub const OPENINGS: &[&str] = &[
    "はじめに、静かな呼吸だけがあった。",
    "誰も知らない夜の底で、ひとつの光点が芽吹いた。",
    "砂の上に描かれた輪は、やがて風に融けた。",
    "声なき合唱が、見えない天蓋を震わせる。",
];

/// Middle lines, drawn twice independently
pub const BODIES: &[&str] = &[
    "粒子は寄り集まり、模様は自らの中心を忘れ、また想い出す。",
    "円環はほどけ、ほどけた糸は世界樹の根へ帰る。",
    "名づけられたものは崩れ、名づけられないものが立ち上がる。",
    "あなたが手放した息は、遠い地平の雲をつくる。",
    "火は踊り、水は記憶を冷やし、風は語り、土は沈黙する。",
];

/// The turn before the closing
pub const TURNS: &[&str] = &[
    "やがて儀式の終わりが始まりとなると、誰もが頷いた。",
    "破壊ののちに残った粉は、次の季節の種である。",
    "沈黙にまさる言葉はなく、名付けにまさる無名はない。",
    "円は満ち、欠け、また満ちる。",
];

/// Last line of the prose
pub const CLOSINGS: &[&str] = &[
    "ここに在るものは、もう在らない。けれど、たしかに在った。",
    "あなたの指先に残る微かな光沢が、新しい始まりの兆し。",
    "砂を払えば、地中で芽吹く音が聴こえる。",
    "目を閉じて、もう一度だけ、呼吸を重ねる。",
];

/// Marker prefixed to a prompt echoed as the topic line
pub const OFFERING_MARKER: &str = "【奉納】";

/// Marker prefixed to a drawn theme as the topic line
pub const THEME_MARKER: &str = "【主題】";

/// Function words in both languages of the prose
const STOP_WORD_LIST: &[&str] = &[
    "の", "に", "は", "を", "が", "と", "た", "て", "で", "な", "も", "へ", "から", "まで", "より",
    "そして", "また", "しかし", "the", "a", "an", "to", "and", "or", "of", "in", "on", "for",
    "with", "is", "are",
];

static STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORD_LIST.iter().copied().collect());

/// Whether a token is a stop word (exact, case-sensitive match)
#[must_use]
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_sizes() {
        assert_eq!(THEMES.len(), 20);
        assert_eq!(OPENINGS.len(), 4);
        assert_eq!(BODIES.len(), 5);
        assert_eq!(TURNS.len(), 4);
        assert_eq!(CLOSINGS.len(), 4);
    }

    #[test]
    fn test_stop_words_cover_both_languages() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("そして"));
        assert!(!is_stop_word("The"));
        assert!(!is_stop_word("光"));
    }
}
