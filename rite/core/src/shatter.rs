//! Shatter - the destruction effect
//!
//! Breaks a rendered frame into square particles and blows them outward from
//! the center while they fade. Every tick renders a frame, which a surface can
//! watch through [`ParticleShatter::with_progress`]. The last frame is what
//! residue palette extraction samples.
//!
//! # Design Philosophy
//!
//! Destruction is the one async step of a cycle. It sits behind the
//! [`Shatter`] trait so the rite can run it as a background task and tests can
//! substitute something instant. [`ParticleShatter`] paces itself with
//! `tokio::time::interval`, never by sleeping a thread.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::color::Color;
use crate::residue::PixelBuffer;
use crate::rng::Stream;
use crate::seed::Seed;

/// Faint white line composited with the difference blend mode
pub const GLITCH_COLOR: Color = Color::rgba(255, 255, 255, 20);

/// Destruction effect over a rendered frame
#[async_trait]
pub trait Shatter: Send + Sync {
    /// Run the effect and return the final frame
    async fn shatter(&self, frame: PixelBuffer, seed: Seed) -> PixelBuffer;
}

/// Particle effect tuning
#[derive(Clone, Debug, PartialEq)]
pub struct ShatterConfig {
    /// Total effect duration
    pub duration: Duration,
    /// Frames per second
    pub fps: u32,
    /// Sampling stride and particle edge, pixels
    pub particle_step: u32,
    /// Pixels below this alpha do not become particles
    pub alpha_cutoff: u8,
    /// Chance per frame of a glitch line
    pub glitch_chance: f64,
}

impl Default for ShatterConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1800),
            fps: 60,
            particle_step: 4,
            alpha_cutoff: 32,
            glitch_chance: 0.3,
        }
    }
}

impl ShatterConfig {
    /// Time between frames
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    /// Number of frames the effect runs for, at least one
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frame_count(&self) -> u32 {
        let frames = (self.duration.as_secs_f64() * f64::from(self.fps.max(1))).ceil();
        (frames as u32).max(1)
    }
}

/// Exponential ease-out, exactly 1 at `t = 1`
#[must_use]
pub fn ease_out_expo(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2_f64.powf(-10.0 * t.max(0.0))
    }
}

/// A square fragment of the source frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Source column
    pub x: u32,
    /// Source row
    pub y: u32,
    /// Source pixel color
    pub color: Color,
}

/// Sample one particle every `step` pixels on both axes, skipping pixels
/// with alpha below `alpha_cutoff`
#[must_use]
pub fn sample_particles(frame: &PixelBuffer, step: u32, alpha_cutoff: u8) -> Vec<Particle> {
    let step = step.max(1) as usize;
    let mut particles = Vec::new();
    for y in (0..frame.height()).step_by(step) {
        for x in (0..frame.width()).step_by(step) {
            match frame.get(x, y) {
                Some(color) if color.a >= alpha_cutoff => particles.push(Particle { x, y, color }),
                _ => {}
            }
        }
    }
    particles
}

/// Paint the particles at progress `t` into a fresh transparent frame
///
/// Each particle moves `ease_out_expo(t) * (80 + 0.6 * dist)` pixels away from
/// the center and keeps `(1 - t)` of its alpha.
#[must_use]
pub fn render_particles(
    particles: &[Particle],
    width: u32,
    height: u32,
    step: u32,
    t: f64,
) -> PixelBuffer {
    let mut out = PixelBuffer::new(width, height);
    let fade = 1.0 - t.clamp(0.0, 1.0);
    if fade <= 0.0 {
        return out;
    }

    let eased = ease_out_expo(t);
    let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
    let step = step.max(1);

    for p in particles {
        let dx = f64::from(p.x) - cx;
        let dy = f64::from(p.y) - cy;
        let dist = dx.hypot(dy) + 1.0;
        let push = eased * (80.0 + dist * 0.6);
        let nx = f64::from(p.x) + dx / dist * push;
        let ny = f64::from(p.y) + dy / dist * push;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let alpha = (fade * f64::from(p.color.a)).round() as u8;
        if alpha == 0 {
            continue;
        }
        fill_square(&mut out, nx, ny, step, p.color.with_alpha(alpha));
    }
    out
}

#[allow(clippy::cast_possible_truncation)]
fn fill_square(out: &mut PixelBuffer, x: f64, y: f64, size: u32, color: Color) {
    let (x0, y0) = (x.round() as i64, y.round() as i64);
    for py in y0..y0 + i64::from(size) {
        for px in x0..x0 + i64::from(size) {
            let (Ok(px), Ok(py)) = (u32::try_from(px), u32::try_from(py)) else {
                continue;
            };
            if let Some(dst) = out.get(px, py) {
                out.set(px, py, color.blend_over(dst));
            }
        }
    }
}

/// Rows covered by a glitch line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlitchLine {
    /// First row
    pub y: u32,
    /// Row count (1 or 2)
    pub rows: u32,
}

/// Decide this frame's glitch line
///
/// Always consumes one draw; a line consumes two more.
#[allow(clippy::cast_possible_truncation)]
pub fn draw_glitch(stream: &mut Stream, height: u32, chance: f64) -> Option<GlitchLine> {
    if stream.next_f64() >= chance || height == 0 {
        return None;
    }
    let y = stream.below(height as usize) as u32;
    let rows = 1 + stream.below(2) as u32;
    Some(GlitchLine { y, rows })
}

/// Composite a glitch line across the full width
pub fn apply_glitch(frame: &mut PixelBuffer, line: GlitchLine) {
    for y in line.y..line.y.saturating_add(line.rows) {
        for x in 0..frame.width() {
            if let Some(dst) = frame.get(x, y) {
                frame.set(x, y, GLITCH_COLOR.difference_onto(dst));
            }
        }
    }
}

/// Default particle implementation of [`Shatter`]
#[derive(Clone, Debug, Default)]
pub struct ParticleShatter {
    config: ShatterConfig,
    progress: Option<mpsc::Sender<PixelBuffer>>,
}

impl ParticleShatter {
    /// Create with explicit tuning
    #[must_use]
    pub fn new(config: ShatterConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Also send every intermediate frame to `tx`
    ///
    /// Frames are dropped, not queued, when the receiver falls behind.
    #[must_use]
    pub fn with_progress(mut self, tx: mpsc::Sender<PixelBuffer>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Current tuning
    #[must_use]
    pub fn config(&self) -> &ShatterConfig {
        &self.config
    }
}

#[async_trait]
impl Shatter for ParticleShatter {
    async fn shatter(&self, frame: PixelBuffer, seed: Seed) -> PixelBuffer {
        let (width, height) = (frame.width(), frame.height());
        let step = self.config.particle_step.max(1);
        let particles = sample_particles(&frame, step, self.config.alpha_cutoff);
        drop(frame);

        let frames = self.config.frame_count();
        tracing::debug!(%seed, particles = particles.len(), frames, "Shattering frame");

        let mut interval = tokio::time::interval(self.config.frame_period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut glitches = seed.stream();
        let mut last = PixelBuffer::new(width, height);
        for tick in 1..=frames {
            interval.tick().await;
            let t = f64::from(tick) / f64::from(frames);
            last = render_particles(&particles, width, height, step, t);
            if let Some(line) = draw_glitch(&mut glitches, height, self.config.glitch_chance) {
                apply_glitch(&mut last, line);
            }
            if let Some(tx) = &self.progress {
                if tx.try_send(last.clone()).is_err() {
                    tracing::trace!(tick, "Progress frame dropped");
                }
            }
        }

        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::residue::{extract_palette, FALLBACK_PALETTE};

    fn checker(width: u32, height: u32) -> PixelBuffer {
        let mut frame = PixelBuffer::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let a = if (x / 4 + y / 4) % 2 == 0 { 255 } else { 10 };
                frame.set(x, y, Color::rgba(200, 40, 90, a));
            }
        }
        frame
    }

    #[test]
    fn test_ease_out_expo_endpoints_and_shape() {
        assert_eq!(ease_out_expo(0.0), 0.0);
        assert_eq!(ease_out_expo(1.0), 1.0);
        assert!(ease_out_expo(0.5) > 0.95);
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = ease_out_expo(f64::from(i) / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn test_sampling_respects_stride_and_cutoff() {
        let frame = checker(16, 16);
        let particles = sample_particles(&frame, 4, 32);
        // 4x4 grid of samples, half of them on opaque cells
        assert_eq!(particles.len(), 8);
        assert!(particles.iter().all(|p| p.color.a == 255 && p.x % 4 == 0));
    }

    #[test]
    fn test_particles_start_in_place() {
        let particles = [Particle {
            x: 10,
            y: 12,
            color: Color::rgb(1, 2, 3),
        }];
        let frame = render_particles(&particles, 32, 32, 2, 0.0);
        assert_eq!(frame.get(10, 12), Some(Color::rgb(1, 2, 3)));
        assert_eq!(frame.get(11, 13), Some(Color::rgb(1, 2, 3)));
        assert_eq!(frame.get(12, 12), Some(Color::transparent()));
    }

    #[test]
    fn test_particles_move_outward_and_fade() {
        let particles = [Particle {
            x: 140,
            y: 16,
            color: Color::rgb(250, 250, 250),
        }];
        let mid = render_particles(&particles, 256, 32, 1, 0.5);
        assert_eq!(mid.get(140, 16), Some(Color::transparent()));
        let moved = (141..256).find_map(|x| mid.get(x, 16).filter(|c| c.a > 0));
        let moved = moved.expect("particle should land to the right");
        assert!(moved.a < 255);
    }

    #[test]
    fn test_final_frame_is_empty_without_glitch() {
        let frame = checker(32, 32);
        let particles = sample_particles(&frame, 4, 32);
        let last = render_particles(&particles, 32, 32, 4, 1.0);
        assert!(last.as_bytes().iter().all(|b| *b == 0));
        assert_eq!(extract_palette(&last, 6), FALLBACK_PALETTE.to_vec());
    }

    #[test]
    fn test_glitch_draws_are_deterministic() {
        let mut a = Seed(5).stream();
        let mut b = Seed(5).stream();
        for _ in 0..50 {
            assert_eq!(draw_glitch(&mut a, 100, 0.3), draw_glitch(&mut b, 100, 0.3));
        }
        let mut never = Seed(5).stream();
        assert!((0..50).all(|_| draw_glitch(&mut never, 100, 0.0).is_none()));
    }

    #[test]
    fn test_glitch_line_is_visible_residue() {
        let mut frame = PixelBuffer::new(8, 8);
        apply_glitch(&mut frame, GlitchLine { y: 3, rows: 2 });
        assert_eq!(frame.get(0, 3), Some(GLITCH_COLOR));
        assert_eq!(frame.get(0, 5), Some(Color::transparent()));
        assert_eq!(extract_palette(&frame, 6), vec!["rgb(224, 224, 224)"]);
    }

    #[test]
    fn test_frame_count() {
        let config = ShatterConfig::default();
        assert_eq!(config.frame_count(), 108);
        let short = ShatterConfig {
            duration: Duration::ZERO,
            ..ShatterConfig::default()
        };
        assert_eq!(short.frame_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_particle_shatter_runs_for_its_duration() {
        let shatter = ParticleShatter::default();
        let started = tokio::time::Instant::now();
        let last = shatter.shatter(checker(40, 40), Seed(9)).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1700), "{elapsed:?}");
        assert!(elapsed <= Duration::from_millis(1900), "{elapsed:?}");
        assert_eq!((last.width(), last.height()), (40, 40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_particle_shatter_is_deterministic_per_seed() {
        let shatter = ParticleShatter::new(ShatterConfig {
            glitch_chance: 1.0,
            ..ShatterConfig::default()
        });
        let a = shatter.shatter(checker(24, 24), Seed(77)).await;
        let b = shatter.shatter(checker(24, 24), Seed(77)).await;
        assert_eq!(a, b);
        assert!(a.as_bytes().chunks_exact(4).any(|px| px[3] == 20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_frames_carry_the_particles() {
        let (tx, mut rx) = mpsc::channel(16);
        let shatter = ParticleShatter::new(ShatterConfig {
            duration: Duration::from_millis(100),
            glitch_chance: 0.0,
            ..ShatterConfig::default()
        })
        .with_progress(tx);
        let last = shatter.shatter(checker(64, 64), Seed(3)).await;

        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        assert_eq!(frames.len(), shatter.config().frame_count() as usize);
        let first_palette = extract_palette(&frames[0], 6);
        assert_eq!(first_palette, vec!["rgb(192, 32, 64)"]);
        assert_eq!(frames.last(), Some(&last));
        assert!(last.as_bytes().iter().all(|b| *b == 0));
    }
}
