//! Rite Messages
//!
//! Messages sent from the [`crate::rite::Rite`] to surfaces. A surface renders
//! what it is told and nothing else: it never runs generators itself.
//!
//! # Design Philosophy
//!
//! Every message carries complete data (the whole composition, the whole
//! text) rather than ids to look up, so a surface can attach mid-session or
//! replay a log of messages without access to the core.

use serde::{Deserialize, Serialize};

use crate::composition::CompositionSpec;
use crate::cycle::{CycleAction, CycleState};
use crate::record::CycleRecord;
use crate::residue::Residue;
use crate::seed::Seed;
use crate::text::MythicText;

/// Messages from the rite to a surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RiteMessage {
    // ============================================
    // Cycle Messages
    // ============================================
    /// The cycle moved to a new state
    State {
        /// New state
        state: CycleState,
    },

    /// A composition was created and should be drawn
    Created {
        /// Composition seed
        seed: Seed,
        /// Geometry and palette to draw
        composition: Box<CompositionSpec>,
        /// Prose to type out
        text: MythicText,
    },

    /// Destruction finished; this is what remained
    Residue {
        /// Keywords and dominant colors
        residue: Residue,
    },

    /// Suggested prompt for the next cycle
    Hint {
        /// Prompt to pre-fill
        prompt: String,
    },

    /// A finished cycle, for archiving or replay
    Record {
        /// The full record
        record: Box<CycleRecord>,
    },

    /// An action was not allowed in the current state
    Rejected {
        /// What was attempted
        action: CycleAction,
        /// State it was attempted in
        state: CycleState,
    },

    // ============================================
    // Display Directives
    // ============================================
    /// Countdown text changed
    Countdown {
        /// Remaining time as `mm:ss`
        display: String,
    },

    /// The countdown ran out; urge the visitor to destroy
    DestroyPrompted,

    // ============================================
    // Lifecycle
    // ============================================
    /// The rite has shut down
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_json_shape() {
        let msg = RiteMessage::Rejected {
            action: CycleAction::Destroy,
            state: CycleState::Idle,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"Rejected":{"action":"destroy","state":"idle"}}"#);

        let back: RiteMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_countdown_message() {
        let msg = RiteMessage::Countdown {
            display: "01:30".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["Countdown"]["display"], "01:30");
    }
}
