//! Cycle Controller
//!
//! The state machine of one session: Idle → Created → Destroying → After →
//! Idle. All transitions go through [`CycleState::apply`], a single explicit
//! table; an action the table does not list is rejected without touching any
//! state or calling the extractor.
//!
//! # Design Philosophy
//!
//! The controller is synchronous and owns no clock and no runtime. The one
//! asynchronous step, destruction, is split in two: [`CycleController::destroy`]
//! hands out a [`DestroyTicket`] and the caller later redeems it with the final
//! frame through [`CycleController::complete_destroy`]. Tickets carry an epoch;
//! any Create or Regenerate in between bumps the epoch, so a late completion
//! can never publish residue into a cycle it does not belong to.

use serde::{Deserialize, Serialize};

use crate::composition::{generate_composition, CompositionSpec};
use crate::residue::{
    PixelBuffer, Residue, ResidueExtractor, DEFAULT_MAX_KEYWORDS, DEFAULT_PALETTE_BUCKETS,
};
use crate::seed::{seed_from_text, Seed};
use crate::text::{generate_text, MythicText};

/// Phrase seeding the composition when the prompt is empty
pub const DEFAULT_PHRASE: &str = "輪廻 再生 無常 光";

/// Next prompt offered when a cycle left no keywords
pub const FALLBACK_HINT: &str = "光, 風, 輪, 余韻";

/// Keywords carried into the next prompt
pub const HINT_KEYWORDS: usize = 4;

/// Joins hint keywords
pub const HINT_SEPARATOR: &str = "、";

/// Where a session is in its cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    /// Waiting for a prompt
    #[default]
    Idle,
    /// A composition is on display
    Created,
    /// Destruction in flight
    Destroying,
    /// Residue available
    After,
}

impl CycleState {
    /// Every state, in cycle order
    pub const ALL: [CycleState; 4] = [Self::Idle, Self::Created, Self::Destroying, Self::After];

    /// The transition table
    ///
    /// Returns the next state, or `None` if `action` is not allowed here.
    #[must_use]
    pub const fn apply(self, action: CycleAction) -> Option<CycleState> {
        use CycleAction as A;
        use CycleState as S;
        match (self, action) {
            (S::Idle | S::After | S::Destroying, A::Create) => Some(S::Created),
            (S::Created, A::Destroy) => Some(S::Destroying),
            (S::Destroying, A::Complete) => Some(S::After),
            (S::Destroying | S::After, A::Regenerate) => Some(S::Idle),
            _ => None,
        }
    }

    /// Actions the table allows from this state
    #[must_use]
    pub fn allowed(self) -> Vec<CycleAction> {
        CycleAction::ALL
            .into_iter()
            .filter(|a| self.apply(*a).is_some())
            .collect()
    }
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Created => "created",
            Self::Destroying => "destroying",
            Self::After => "after",
        };
        f.write_str(name)
    }
}

/// Inputs to the state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleAction {
    /// Generate a composition from the prompt
    Create,
    /// Begin destroying the composition
    Destroy,
    /// Destruction finished with a final frame
    Complete,
    /// Return to idle with a hint for the next prompt
    Regenerate,
}

impl CycleAction {
    /// Every action
    pub const ALL: [CycleAction; 4] = [Self::Create, Self::Destroy, Self::Complete, Self::Regenerate];
}

impl std::fmt::Display for CycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Destroy => "destroy",
            Self::Complete => "complete",
            Self::Regenerate => "regenerate",
        };
        f.write_str(name)
    }
}

/// Outcome of a controller operation
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub enum Transition<T> {
    /// The action was applied
    Applied(T),
    /// The table does not allow the action in this state; nothing changed
    Rejected {
        /// What was attempted
        action: CycleAction,
        /// State it was attempted in
        state: CycleState,
    },
    /// A destroy ticket from a superseded cycle; dropped
    Stale {
        /// Epoch on the ticket
        ticket_epoch: u64,
        /// Controller epoch now
        current_epoch: u64,
    },
}

impl<T> Transition<T> {
    /// Whether the action took effect
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The applied value, if any
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            _ => None,
        }
    }
}

/// Controller tuning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleSettings {
    /// Phrase seeding the composition when the prompt is empty
    pub default_phrase: String,
    /// Keywords kept in a residue
    pub max_keywords: usize,
    /// Colors kept in a residue
    pub palette_buckets: usize,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            default_phrase: DEFAULT_PHRASE.to_string(),
            max_keywords: DEFAULT_MAX_KEYWORDS,
            palette_buckets: DEFAULT_PALETTE_BUCKETS,
        }
    }
}

/// What Create produced
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Trimmed prompt as offered
    pub prompt: String,
    /// Seed of the composition (from the default phrase if the prompt is empty)
    pub seed: Seed,
    /// Seed of the text (always from the prompt)
    pub text_seed: Seed,
    /// Generated geometry and palette
    pub composition: CompositionSpec,
    /// Generated prose
    pub text: MythicText,
}

impl Artifact {
    /// Generate everything a prompt determines
    #[must_use]
    pub fn generate(prompt: &str, default_phrase: &str) -> Self {
        let prompt = prompt.trim();
        let seed = seed_from_text(if prompt.is_empty() {
            default_phrase
        } else {
            prompt
        });
        let text_seed = seed_from_text(prompt);
        Self {
            prompt: prompt.to_string(),
            seed,
            text_seed,
            composition: generate_composition(seed),
            text: generate_text(text_seed, prompt),
        }
    }
}

/// Claim on an in-flight destruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DestroyTicket {
    epoch: u64,
    seed: Seed,
    keywords: Vec<String>,
}

impl DestroyTicket {
    /// Epoch the destruction belongs to
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Seed of the composition being destroyed
    #[must_use]
    pub fn seed(&self) -> Seed {
        self.seed
    }

    /// Keywords extracted when the destruction began
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Hint for the next prompt from a residue
#[must_use]
pub fn hint_from_residue(residue: Option<&Residue>) -> String {
    match residue {
        Some(r) if r.has_keywords() => r
            .keywords
            .iter()
            .take(HINT_KEYWORDS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(HINT_SEPARATOR),
        _ => FALLBACK_HINT.to_string(),
    }
}

/// The session state machine
pub struct CycleController<E: ResidueExtractor> {
    extractor: E,
    settings: CycleSettings,
    state: CycleState,
    epoch: u64,
    artifact: Option<Artifact>,
    residue: Option<Residue>,
    hint: Option<String>,
}

impl<E: ResidueExtractor> CycleController<E> {
    /// Create an idle controller
    pub fn new(extractor: E, settings: CycleSettings) -> Self {
        Self {
            extractor,
            settings,
            state: CycleState::Idle,
            epoch: 0,
            artifact: None,
            residue: None,
            hint: None,
        }
    }

    /// Current state
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Current epoch; bumped by every create, destroy and regenerate
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Artifact on display (or being destroyed)
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Residue of the last completed destruction
    pub fn residue(&self) -> Option<&Residue> {
        self.residue.as_ref()
    }

    /// Hint produced by the last regenerate
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Settings in use
    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// The extractor in use
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    fn rejected<T>(&self, action: CycleAction) -> Transition<T> {
        tracing::debug!(%action, state = %self.state, "Rejected cycle action");
        Transition::Rejected {
            action,
            state: self.state,
        }
    }

    /// Generate a composition and text from `prompt`
    ///
    /// Allowed from Idle, After (the old residue is discarded) and Destroying
    /// (the in-flight destruction is superseded).
    pub fn create(&mut self, prompt: &str) -> Transition<Artifact> {
        let Some(next) = self.state.apply(CycleAction::Create) else {
            return self.rejected(CycleAction::Create);
        };

        let artifact = Artifact::generate(prompt, &self.settings.default_phrase);
        tracing::info!(
            seed = %artifact.seed,
            symmetry = artifact.composition.symmetry(),
            base_hue = artifact.composition.base_hue(),
            "Created composition"
        );

        self.epoch += 1;
        self.state = next;
        self.residue = None;
        self.hint = None;
        self.artifact = Some(artifact.clone());
        Transition::Applied(artifact)
    }

    /// Begin destruction
    ///
    /// Keywords are extracted now, from the text captured at create. The
    /// returned ticket must be redeemed with the final frame.
    pub fn destroy(&mut self) -> Transition<DestroyTicket> {
        let Some(next) = self.state.apply(CycleAction::Destroy) else {
            return self.rejected(CycleAction::Destroy);
        };
        let Some(artifact) = self.artifact.as_ref() else {
            return self.rejected(CycleAction::Destroy);
        };

        let keywords = self
            .extractor
            .keywords(&artifact.text.to_string(), self.settings.max_keywords);
        let seed = artifact.seed;

        self.epoch += 1;
        self.state = next;
        tracing::info!(%seed, epoch = self.epoch, keywords = keywords.len(), "Destruction started");

        Transition::Applied(DestroyTicket {
            epoch: self.epoch,
            seed,
            keywords,
        })
    }

    /// Finish a destruction with its final frame
    ///
    /// Stale tickets (from a cycle superseded by create or regenerate) are
    /// dropped without extracting anything.
    pub fn complete_destroy(
        &mut self,
        ticket: &DestroyTicket,
        final_frame: &PixelBuffer,
    ) -> Transition<Residue> {
        if ticket.epoch != self.epoch {
            tracing::debug!(
                ticket_epoch = ticket.epoch,
                current_epoch = self.epoch,
                "Dropped stale destruction"
            );
            return Transition::Stale {
                ticket_epoch: ticket.epoch,
                current_epoch: self.epoch,
            };
        }
        let Some(next) = self.state.apply(CycleAction::Complete) else {
            return self.rejected(CycleAction::Complete);
        };

        let residue = Residue {
            keywords: ticket.keywords.clone(),
            palette: self
                .extractor
                .palette(final_frame, self.settings.palette_buckets),
        };
        tracing::info!(
            keywords = ?residue.keywords,
            palette = ?residue.palette,
            "Residue extracted"
        );

        self.state = next;
        self.residue = Some(residue.clone());
        Transition::Applied(residue)
    }

    /// Return to idle with a hint for the next prompt
    ///
    /// From After the hint is built from the residue keywords; from
    /// Destroying the destruction is abandoned and the fallback hint is used.
    pub fn regenerate(&mut self) -> Transition<String> {
        let from = self.state;
        let Some(next) = self.state.apply(CycleAction::Regenerate) else {
            return self.rejected(CycleAction::Regenerate);
        };

        let hint = if from == CycleState::After {
            hint_from_residue(self.residue.as_ref())
        } else {
            FALLBACK_HINT.to_string()
        };
        tracing::info!(%hint, from = %from, "Regenerated");

        self.epoch += 1;
        self.state = next;
        self.artifact = None;
        self.hint = Some(hint.clone());
        Transition::Applied(hint)
    }
}
