//! Mythic Text Generation
//!
//! Composes the seven-line prose spoken for a cycle by indexing the fixed
//! [`crate::lexicon`] categories with draws from a private stream.
//!
//! Draw order: theme (always drawn, even when a prompt supplies the topic),
//! opening, body, body, turn, closing.

use serde::{Deserialize, Serialize};

use crate::lexicon::{BODIES, CLOSINGS, OFFERING_MARKER, OPENINGS, THEMES, THEME_MARKER, TURNS};
use crate::rng::Stream;
use crate::seed::{seed_from_text, Seed};

/// Number of lines in every generated text
pub const LINE_COUNT: usize = 7;

/// Generated prose, one entry per line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MythicText {
    lines: Vec<String>,
}

impl MythicText {
    /// Derive the seed from the prompt and generate
    #[must_use]
    pub fn from_prompt(prompt: &str) -> Self {
        generate_text(seed_from_text(prompt), prompt)
    }

    /// Lines in display order
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Topic line (first line)
    #[must_use]
    pub fn topic(&self) -> &str {
        self.lines.first().map_or("", String::as_str)
    }

    /// Character count of the joined text, used for typing effects
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum::<usize>() + self.lines.len() - 1
    }
}

impl std::fmt::Display for MythicText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

fn pick(stream: &mut Stream, category: &'static [&'static str]) -> String {
    stream
        .pick(category)
        .map(|s| (*s).to_string())
        .unwrap_or_default()
}

/// Generate the prose for a cycle
///
/// `seed` roots the stream; callers normally pass `seed_from_text(prompt)`.
/// A non-empty `prompt` is echoed verbatim as the topic line, otherwise the
/// drawn theme is used.
#[must_use]
pub fn generate_text(seed: Seed, prompt: &str) -> MythicText {
    let mut stream = seed.stream();

    let theme = pick(&mut stream, THEMES);
    let topic = if prompt.is_empty() {
        format!("{THEME_MARKER}{theme}")
    } else {
        format!("{OFFERING_MARKER}{prompt}")
    };

    let lines = vec![
        topic,
        String::new(),
        pick(&mut stream, OPENINGS),
        pick(&mut stream, BODIES),
        pick(&mut stream, BODIES),
        pick(&mut stream, TURNS),
        pick(&mut stream, CLOSINGS),
    ];

    MythicText { lines }
}
