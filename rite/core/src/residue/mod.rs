//! Residue Extraction
//!
//! What survives a destroyed composition: the most frequent words of its
//! prose and the dominant colors of its final frame. Keywords seed the next
//! prompt; the palette is reported to surfaces.
//!
//! # Design Philosophy
//!
//! The cycle controller never calls the free functions directly. It goes
//! through [`ResidueExtractor`] so tests and alternative surfaces can swap in
//! their own extraction (or count calls to it).

pub mod keywords;
pub mod palette;

use serde::{Deserialize, Serialize};

pub use keywords::{extract_keywords, DEFAULT_MAX_KEYWORDS};
pub use palette::{
    extract_palette, BufferError, PixelBuffer, DEFAULT_PALETTE_BUCKETS, FALLBACK_PALETTE,
};

/// What a destroyed composition leaves behind
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Residue {
    /// Frequency-ranked keywords of the destroyed text
    pub keywords: Vec<String>,
    /// Dominant colors of the final frame, CSS strings
    pub palette: Vec<String>,
}

impl Residue {
    /// Whether any keyword survived
    #[must_use]
    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty()
    }
}

/// Keyword and palette extraction used by the cycle controller
pub trait ResidueExtractor: Send + Sync {
    /// Ranked keywords of `text`, at most `max`
    fn keywords(&self, text: &str, max: usize) -> Vec<String>;

    /// Dominant colors of `frame`, at most `buckets`, never empty
    fn palette(&self, frame: &PixelBuffer, buckets: usize) -> Vec<String>;
}

/// Extractor backed by [`extract_keywords`] and [`extract_palette`]
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardExtractor;

impl ResidueExtractor for StandardExtractor {
    fn keywords(&self, text: &str, max: usize) -> Vec<String> {
        extract_keywords(text, max)
    }

    fn palette(&self, frame: &PixelBuffer, buckets: usize) -> Vec<String> {
        extract_palette(frame, buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_standard_extractor_delegates() {
        let ex = StandardExtractor;
        assert_eq!(ex.keywords("ash ash ember", 8), vec!["ash", "ember"]);
        let frame = PixelBuffer::filled(4, 4, Color::rgb(255, 255, 255));
        assert_eq!(ex.palette(&frame, 6), vec!["rgb(224, 224, 224)"]);
    }

    #[test]
    fn test_residue_serializes_as_plain_lists() {
        let residue = Residue {
            keywords: vec!["灰".into(), "種子".into()],
            palette: FALLBACK_PALETTE.iter().map(|s| (*s).to_string()).collect(),
        };
        let json = serde_json::to_value(&residue).unwrap();
        assert_eq!(json["keywords"][1], "種子");
        assert_eq!(json["palette"][0], "#8f79f9");
        assert!(residue.has_keywords());
        assert!(!Residue::default().has_keywords());
    }
}
