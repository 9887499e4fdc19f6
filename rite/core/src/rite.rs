//! Rite - The Ritual Orchestrator
//!
//! The Rite owns one [`CycleController`] and is driven by [`RiteEvent`]s from
//! a surface. It answers with [`RiteMessage`]s over an mpsc channel.
//!
//! Destruction is the only slow step. It runs as a spawned tokio task that
//! renders the composition on the blocking pool, shatters it and reports the
//! final frame back over an internal channel. Completions carry the epoch of
//! the destroy that started them, so a task superseded by Create or Regenerate
//! can never produce a residue even if it finishes before it is aborted. A task
//! that ends without reporting (it panicked) abandons the destruction.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::canvas::render_composition;
use crate::config::DEFAULT_CANVAS_SIZE;
use crate::countdown::{format_mm_ss, Countdown, DEFAULT_COUNTDOWN};
use crate::cycle::{CycleController, CycleSettings, CycleState, DestroyTicket, Transition};
use crate::events::RiteEvent;
use crate::messages::RiteMessage;
use crate::record::CycleRecord;
use crate::residue::{PixelBuffer, Residue, ResidueExtractor};
use crate::shatter::Shatter;

/// Tick period used by [`Rite::run`]
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Capacity of the internal completion channel
const COMPLETION_CAPACITY: usize = 8;

/// Rite configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiteConfig {
    /// Time shown on the countdown after Create
    pub countdown: Duration,
    /// Width of the rendered frame handed to the shatter
    pub canvas_width: u32,
    /// Height of the rendered frame handed to the shatter
    pub canvas_height: u32,
    /// Controller tuning
    pub cycle: CycleSettings,
}

impl Default for RiteConfig {
    fn default() -> Self {
        Self {
            countdown: DEFAULT_COUNTDOWN,
            canvas_width: DEFAULT_CANVAS_SIZE,
            canvas_height: DEFAULT_CANVAS_SIZE,
            cycle: CycleSettings::default(),
        }
    }
}

/// Final frame of a finished shatter task
#[derive(Debug)]
struct Completion {
    epoch: u64,
    frame: PixelBuffer,
}

/// The ritual orchestrator
pub struct Rite<S: Shatter + 'static, E: ResidueExtractor> {
    /// Cycle state machine
    controller: CycleController<E>,
    /// Destruction effect, shared with spawned tasks
    shatter: Arc<S>,
    /// Configuration
    config: RiteConfig,
    /// Channel to the surface
    tx: mpsc::Sender<RiteMessage>,
    /// Current prompt text
    prompt: String,
    /// Countdown started by the last Create
    countdown: Option<Countdown>,
    /// Whether DestroyPrompted was sent for the current countdown
    destroy_prompted: bool,
    /// Last countdown text sent
    last_display: Option<String>,
    /// Destruction in flight
    pending: Option<(DestroyTicket, JoinHandle<()>)>,
    /// Completion channel handed to shatter tasks
    done_tx: mpsc::Sender<Completion>,
    done_rx: mpsc::Receiver<Completion>,
    /// Cleared by Quit
    running: bool,
}

impl<S: Shatter + 'static, E: ResidueExtractor> Rite<S, E> {
    /// Create a new Rite
    pub fn new(shatter: S, extractor: E, config: RiteConfig, tx: mpsc::Sender<RiteMessage>) -> Self {
        let controller = CycleController::new(extractor, config.cycle.clone());
        let (done_tx, done_rx) = mpsc::channel(COMPLETION_CAPACITY);

        Self {
            controller,
            shatter: Arc::new(shatter),
            config,
            tx,
            prompt: String::new(),
            countdown: None,
            destroy_prompted: false,
            last_display: None,
            pending: None,
            done_tx,
            done_rx,
            running: true,
        }
    }

    /// Current cycle state
    pub fn state(&self) -> CycleState {
        self.controller.state()
    }

    /// Current prompt text
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Configuration
    pub fn config(&self) -> &RiteConfig {
        &self.config
    }

    /// The cycle controller
    pub fn controller(&self) -> &CycleController<E> {
        &self.controller
    }

    /// Whether a destruction is in flight
    pub fn is_destroying(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the rite is still accepting events
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Handle an event from the surface
    pub async fn handle_event(&mut self, event: RiteEvent) {
        match event {
            RiteEvent::PromptChanged { text } => {
                self.prompt = text;
            }

            RiteEvent::Resized { width, height } => {
                self.config.canvas_width = width.max(1);
                self.config.canvas_height = height.max(1);
                tracing::debug!(width, height, "Canvas resized");
            }

            RiteEvent::Create => self.create().await,
            RiteEvent::Destroy => self.destroy().await,
            RiteEvent::Regenerate => self.regenerate().await,

            RiteEvent::Tick => {
                self.tick_countdown().await;
                self.poll_destruction().await;
            }

            RiteEvent::Quit => {
                self.abort_pending();
                self.running = false;
                self.send(RiteMessage::Quit).await;
            }
        }
    }

    /// Drive the rite from a surface's event channel until Quit or the
    /// channel closes, ticking every [`TICK_PERIOD`]
    pub async fn run(&mut self, mut events: mpsc::Receiver<RiteEvent>) {
        let mut ticker = tokio::time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.running {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
                _ = ticker.tick() => self.handle_event(RiteEvent::Tick).await,
            }
        }
        self.abort_pending();
        tracing::info!("Rite stopped");
    }

    async fn create(&mut self) {
        match self.controller.create(&self.prompt) {
            Transition::Applied(artifact) => {
                self.abort_pending();
                self.countdown = Some(Countdown::start(self.config.countdown, Instant::now()));
                self.destroy_prompted = false;
                let display = format_mm_ss(self.config.countdown);
                self.last_display = Some(display.clone());

                self.send_state().await;
                self.send(RiteMessage::Created {
                    seed: artifact.seed,
                    composition: Box::new(artifact.composition),
                    text: artifact.text,
                })
                .await;
                self.send(RiteMessage::Countdown { display }).await;
            }
            other => self.report(other).await,
        }
    }

    async fn destroy(&mut self) {
        let ticket = match self.controller.destroy() {
            Transition::Applied(ticket) => ticket,
            other => return self.report(other).await,
        };
        let Some(artifact) = self.controller.artifact() else {
            return;
        };

        let composition = artifact.composition.clone();
        let (width, height) = (self.config.canvas_width, self.config.canvas_height);
        let (epoch, seed) = (ticket.epoch(), ticket.seed());
        let shatter = Arc::clone(&self.shatter);
        let done = self.done_tx.clone();

        let handle = tokio::spawn(async move {
            let render = tokio::task::spawn_blocking(move || {
                render_composition(&composition, width, height)
            });
            let frame = match render.await {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(epoch, error = %e, "Rendering for destruction failed");
                    return;
                }
            };
            let frame = shatter.shatter(frame, seed).await;
            if done.send(Completion { epoch, frame }).await.is_err() {
                tracing::debug!(epoch, "Rite dropped before destruction finished");
            }
        });

        self.pending = Some((ticket, handle));
        self.countdown = None;
        self.send_state().await;
    }

    async fn regenerate(&mut self) {
        match self.controller.regenerate() {
            Transition::Applied(hint) => {
                self.abort_pending();
                self.countdown = None;
                self.prompt = hint.clone();
                self.send_state().await;
                self.send(RiteMessage::Hint { prompt: hint }).await;
            }
            other => self.report(other).await,
        }
    }

    async fn tick_countdown(&mut self) {
        let Some(countdown) = self.countdown.as_ref() else {
            return;
        };
        let now = Instant::now();
        let display = countdown.display(now);
        let expired = countdown.expired(now);

        if self.last_display.as_deref() != Some(display.as_str()) {
            self.last_display = Some(display.clone());
            self.send(RiteMessage::Countdown { display }).await;
        }
        if expired && !self.destroy_prompted {
            self.destroy_prompted = true;
            tracing::debug!("Countdown expired");
            self.send(RiteMessage::DestroyPrompted).await;
        }
    }

    /// Apply any finished destruction without waiting
    ///
    /// Returns the residue if one was produced.
    pub async fn poll_destruction(&mut self) -> Option<Residue> {
        let mut finished = Vec::new();
        while let Ok(done) = self.done_rx.try_recv() {
            finished.push(done);
        }

        let mut residue = None;
        for done in finished {
            if let Some(r) = self.apply_completion(done).await {
                residue = Some(r);
            }
        }
        if matches!(&self.pending, Some((_, handle)) if handle.is_finished())
            && self.done_rx.is_empty()
        {
            self.abandon_pending();
        }
        residue
    }

    /// Wait for the destruction in flight, if any, and apply it
    ///
    /// Returns `None` without a residue if the task ended without reporting
    /// back. The cycle then stays in Destroying until Create or Regenerate.
    pub async fn await_destruction(&mut self) -> Option<Residue> {
        while let Some((_, handle)) = self.pending.as_mut() {
            tokio::select! {
                biased;
                done = self.done_rx.recv() => {
                    if let Some(residue) = self.apply_completion(done?).await {
                        return Some(residue);
                    }
                }
                joined = handle => {
                    if let Err(e) = joined {
                        tracing::warn!(error = %e, "Destruction task failed");
                    }
                    // A completion sent just before the task ended still counts
                    let residue = self.poll_destruction().await;
                    if residue.is_some() {
                        return residue;
                    }
                    self.abandon_pending();
                }
            }
        }
        None
    }

    async fn apply_completion(&mut self, done: Completion) -> Option<Residue> {
        let current = matches!(&self.pending, Some((ticket, _)) if ticket.epoch() == done.epoch);
        if !current {
            tracing::debug!(epoch = done.epoch, "Discarded superseded destruction");
            return None;
        }
        let (ticket, _) = self.pending.take()?;

        match self.controller.complete_destroy(&ticket, &done.frame) {
            Transition::Applied(residue) => {
                self.send_state().await;
                self.send(RiteMessage::Residue {
                    residue: residue.clone(),
                })
                .await;
                if let Some(artifact) = self.controller.artifact() {
                    let record = CycleRecord::new(artifact, residue.clone());
                    self.send(RiteMessage::Record {
                        record: Box::new(record),
                    })
                    .await;
                }
                Some(residue)
            }
            other => {
                self.report(other).await;
                None
            }
        }
    }

    fn abandon_pending(&mut self) {
        if let Some((ticket, _)) = self.pending.take() {
            tracing::warn!(epoch = ticket.epoch(), "Destruction abandoned without a frame");
        }
    }

    fn abort_pending(&mut self) {
        if let Some((ticket, handle)) = self.pending.take() {
            handle.abort();
            tracing::debug!(epoch = ticket.epoch(), "Aborted destruction");
        }
    }

    /// Tell the surface about an action that did not apply
    async fn report<T>(&self, transition: Transition<T>) {
        match transition {
            Transition::Rejected { action, state } => {
                self.send(RiteMessage::Rejected { action, state }).await;
            }
            Transition::Stale {
                ticket_epoch,
                current_epoch,
            } => {
                tracing::debug!(ticket_epoch, current_epoch, "Stale transition");
            }
            Transition::Applied(_) => {}
        }
    }

    async fn send_state(&self) {
        self.send(RiteMessage::State {
            state: self.controller.state(),
        })
        .await;
    }

    /// Send a message to the surface
    async fn send(&self, msg: RiteMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
