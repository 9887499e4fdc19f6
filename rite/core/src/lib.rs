//! Rite Core - Headless Generative Engine for Digital Fragments
//!
//! Digital Fragments is a ritual in three acts: a visitor offers a prompt and
//! a mandala is **created**, the mandala is **destroyed**, and what remains (a
//! few keywords and colors) is offered back as the seed of the next prompt.
//!
//! This crate holds everything except the pixels on a screen. Generation is
//! deterministic: the same prompt always gives the same composition and the
//! same prose, on every platform.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Surfaces                              │
//! │     ┌─────────┐   ┌──────────┐   ┌────────────────────┐      │
//! │     │   CLI   │   │  Kiosk   │   │  Headless / Tests  │      │
//! │     └────┬────┘   └────┬─────┘   └─────────┬──────────┘      │
//! │          └─────────────┴───────────────────┘                 │
//! │                RiteEvent (up) / RiteMessage (down)           │
//! └───────────────────────────┼──────────────────────────────────┘
//!                             │
//! ┌───────────────────────────┼──────────────────────────────────┐
//! │                        RITE CORE                             │
//! │  ┌────────────────────────┴───────────────────────────────┐  │
//! │  │                         Rite                           │  │
//! │  │  ┌────────────┐  ┌───────────┐  ┌───────────────────┐  │  │
//! │  │  │   Cycle    │  │ Countdown │  │ Shatter (spawned) │  │  │
//! │  │  │ Controller │  │           │  │                   │  │  │
//! │  │  └─────┬──────┘  └───────────┘  └───────────────────┘  │  │
//! │  └────────┼───────────────────────────────────────────────┘  │
//! │  ┌────────┴──────────────────────────────────────────────┐   │
//! │  │ seed → rng → composition / text      residue extract  │   │
//! │  └───────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Rite`]: async orchestrator driven by surface events
//! - [`CycleController`]: the Idle → Created → Destroying → After state machine
//! - [`CompositionSpec`]: geometry and palette of one mandala
//! - [`MythicText`]: seven lines of generated prose
//! - [`Residue`]: keywords and colors left by a destruction
//! - [`CycleRecord`]: a finished cycle, replayable from its seeds
//!
//! # Quick Start
//!
//! ```no_run
//! use rite_core::{
//!     ParticleShatter, Rite, RiteConfig, RiteEvent, StandardExtractor,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let mut rite = Rite::new(
//!         ParticleShatter::default(),
//!         StandardExtractor,
//!         RiteConfig::default(),
//!         tx,
//!     );
//!
//!     rite.handle_event(RiteEvent::PromptChanged { text: "光".into() }).await;
//!     rite.handle_event(RiteEvent::Create).await;
//!     rite.handle_event(RiteEvent::Destroy).await;
//!     let residue = rite.await_destruction().await;
//!     println!("{residue:?}");
//!
//!     while let Ok(msg) = rx.try_recv() {
//!         println!("{msg:?}");
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auto;
pub mod canvas;
pub mod color;
pub mod composition;
pub mod config;
pub mod countdown;
pub mod cycle;
pub mod events;
pub mod lexicon;
pub mod messages;
pub mod record;
pub mod residue;
pub mod rite;
pub mod rng;
pub mod seed;
pub mod shatter;
pub mod text;

// Re-export main types for convenience
pub use auto::{AutoPhase, AutoRite, DEFAULT_AUTO_CYCLE};
pub use canvas::{render_afterglow, render_composition};
pub use color::{Color, Hsla};
pub use composition::{generate_composition, CompositionSpec};
pub use config::{load_config, ConfigError, ConfigOverrides, ConfigSource, RiteConfigFile};
pub use countdown::{Countdown, DEFAULT_COUNTDOWN};
pub use cycle::{
    Artifact, CycleAction, CycleController, CycleSettings, CycleState, DestroyTicket, Transition,
};
pub use events::RiteEvent;
pub use messages::RiteMessage;
pub use record::{verify_replay, CycleRecord, ReplayError};
pub use residue::{
    extract_keywords, extract_palette, PixelBuffer, Residue, ResidueExtractor, StandardExtractor,
};
pub use rite::{Rite, RiteConfig};
pub use rng::Stream;
pub use seed::{seed_from_text, Seed};
pub use shatter::{ParticleShatter, Shatter, ShatterConfig};
pub use text::{generate_text, MythicText};
