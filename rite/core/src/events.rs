//! Surface Events
//!
//! Events sent from a surface (terminal, window, gallery kiosk, test harness)
//! to the [`crate::rite::Rite`].
//!
//! # Design Philosophy
//!
//! Surfaces only report what the visitor did. Whether an action is allowed,
//! and what it produces, is decided by the rite's cycle controller.

use serde::{Deserialize, Serialize};

/// Events from a surface to the rite
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiteEvent {
    // ============================================
    // Input Events
    // ============================================
    /// The prompt field changed
    PromptChanged {
        /// Full prompt text
        text: String,
    },

    /// The surface's drawing area changed size
    Resized {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },

    // ============================================
    // Ritual Actions
    // ============================================
    /// Create a composition from the current prompt
    Create,

    /// Destroy the composition on display
    Destroy,

    /// Carry the residue into a new prompt
    Regenerate,

    // ============================================
    // Lifecycle Events
    // ============================================
    /// Periodic tick driving the countdown and collecting finished destructions
    Tick,

    /// The surface is closing
    Quit,
}

impl RiteEvent {
    /// Whether this event asks for a cycle transition
    #[must_use]
    pub fn is_action(&self) -> bool {
        matches!(self, Self::Create | Self::Destroy | Self::Regenerate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_externally_tagged() {
        let json = serde_json::to_string(&RiteEvent::PromptChanged {
            text: "光".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"PromptChanged":{"text":"光"}}"#);
        assert_eq!(serde_json::to_string(&RiteEvent::Create).unwrap(), r#""Create""#);
    }

    #[test]
    fn test_action_classification() {
        assert!(RiteEvent::Destroy.is_action());
        assert!(!RiteEvent::Tick.is_action());
        assert!(!RiteEvent::Quit.is_action());
    }
}
