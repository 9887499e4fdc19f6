//! Cycle Records
//!
//! A finished cycle serialized as JSON: the prompt, both seeds, everything
//! generated from them and the residue. Because generation is deterministic,
//! a record can be checked by regenerating it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::composition::{generate_composition, CompositionSpec};
use crate::cycle::Artifact;
use crate::residue::Residue;
use crate::seed::{seed_from_text, Seed};
use crate::text::{generate_text, MythicText};

/// Ways a record can fail to replay
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    /// A seed does not match the text it claims to come from
    #[error("{which} seed {found} does not match prompt (expected {expected})")]
    SeedMismatch {
        /// Which seed ("composition" or "text")
        which: &'static str,
        /// Seed derived from the prompt
        expected: Seed,
        /// Seed in the record
        found: Seed,
    },

    /// Regenerating from the seed gives a different composition
    #[error("composition does not regenerate from seed {seed}")]
    CompositionMismatch {
        /// Composition seed
        seed: Seed,
    },

    /// Regenerating from the seed gives different prose
    #[error("text does not regenerate from seed {seed}")]
    TextMismatch {
        /// Text seed
        seed: Seed,
    },
}

/// One finished cycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// Trimmed prompt
    pub prompt: String,
    /// Composition seed
    pub seed: Seed,
    /// Text seed
    pub text_seed: Seed,
    /// Generated geometry and palette
    pub composition: CompositionSpec,
    /// Generated prose
    pub text: MythicText,
    /// What destruction left
    pub residue: Residue,
}

impl CycleRecord {
    /// Record an artifact and its residue
    #[must_use]
    pub fn new(artifact: &Artifact, residue: Residue) -> Self {
        Self {
            prompt: artifact.prompt.clone(),
            seed: artifact.seed,
            text_seed: artifact.text_seed,
            composition: artifact.composition.clone(),
            text: artifact.text.clone(),
            residue,
        }
    }

    /// Pretty JSON
    ///
    /// # Errors
    ///
    /// Returns a serialization error (not expected for well-formed records).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid record.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Regenerate a record and compare
///
/// The text seed must derive from the prompt. The composition seed must too,
/// unless the prompt is empty: then it came from whatever default phrase was
/// configured and is taken as recorded.
///
/// # Errors
///
/// Returns the first [`ReplayError`] found.
pub fn verify_replay(record: &CycleRecord) -> Result<(), ReplayError> {
    let prompt_seed = seed_from_text(&record.prompt);
    if record.text_seed != prompt_seed {
        return Err(ReplayError::SeedMismatch {
            which: "text",
            expected: prompt_seed,
            found: record.text_seed,
        });
    }
    if !record.prompt.is_empty() && record.seed != prompt_seed {
        return Err(ReplayError::SeedMismatch {
            which: "composition",
            expected: prompt_seed,
            found: record.seed,
        });
    }
    if generate_composition(record.seed) != record.composition {
        return Err(ReplayError::CompositionMismatch { seed: record.seed });
    }
    if generate_text(record.text_seed, &record.prompt) != record.text {
        return Err(ReplayError::TextMismatch {
            seed: record.text_seed,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::DEFAULT_PHRASE;
    use pretty_assertions::assert_eq;

    fn record(prompt: &str) -> CycleRecord {
        let artifact = Artifact::generate(prompt, DEFAULT_PHRASE);
        CycleRecord::new(
            &artifact,
            Residue {
                keywords: vec!["光".repeat(2)],
                palette: vec!["rgb(224, 0, 0)".to_string()],
            },
        )
    }

    #[test]
    fn test_json_round_trip_replays() {
        let original = record("光");
        let json = original.to_json().unwrap();
        let parsed = CycleRecord::from_json(&json).unwrap();
        assert_eq!(parsed, original);
        assert_eq!(verify_replay(&parsed), Ok(()));
    }

    #[test]
    fn test_empty_prompt_record_replays() {
        let rec = record("");
        assert_eq!(rec.seed, seed_from_text(DEFAULT_PHRASE));
        assert_eq!(verify_replay(&rec), Ok(()));
    }

    #[test]
    fn test_tampered_seed_detected() {
        let mut rec = record("風");
        rec.seed = Seed(rec.seed.value() ^ 1);
        assert!(matches!(
            verify_replay(&rec),
            Err(ReplayError::SeedMismatch {
                which: "composition",
                ..
            })
        ));
    }

    #[test]
    fn test_tampered_composition_detected() {
        let mut rec = record("風");
        rec.composition = generate_composition(Seed(1));
        assert_eq!(
            verify_replay(&rec),
            Err(ReplayError::CompositionMismatch { seed: rec.seed })
        );
    }

    #[test]
    fn test_tampered_text_detected() {
        let mut rec = record("風");
        rec.text = MythicText::from_prompt("水");
        assert_eq!(
            verify_replay(&rec),
            Err(ReplayError::TextMismatch { seed: rec.text_seed })
        );
    }

    #[test]
    fn test_json_contains_css_palette() {
        let json = record("光").to_json().unwrap();
        assert!(json.contains("\"seed\": 296029464"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["composition"]["symmetry"], 10);
        assert_eq!(value["residue"]["palette"][0], "rgb(224, 0, 0)");
    }
}
