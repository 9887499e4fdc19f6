//! Headless Canvas
//!
//! A small software rasterizer that paints a [`CompositionSpec`] into a
//! [`PixelBuffer`], so a whole cycle (create, shatter, residue) can run with
//! no window and no GPU. Shapes are tested per pixel center; there is no
//! antialiasing. Everything except the background is composited additively.
//!
//! Layout units are the composition's own (the outer ring sits near 350); the
//! canvas scales them so the outermost element fits the shorter side.

use crate::color::{Color, Hsla};
use crate::composition::{CompositionSpec, Petal};
use crate::residue::{PixelBuffer, FALLBACK_PALETTE};

/// Gradient color at the center of the frame
pub const BACKGROUND_INNER: Color = Color::rgb(0x0c, 0x12, 0x20);
/// Gradient color at the rim of the frame
pub const BACKGROUND_OUTER: Color = Color::rgb(0x07, 0x0a, 0x10);
/// Radius, in pixels, where the background gradient starts
const GRADIENT_INNER_RADIUS: f64 = 10.0;

const GLOW_FIRST_RADIUS: u32 = 8;
const GLOW_LAST_RADIUS: u32 = 160;
const GLOW_STEP: usize = 6;
const GLOW_ALPHA: f64 = 0.08;

const RING_ALPHA: f64 = 0.22;
const RING_LINE_WIDTH: f64 = 1.5;
const MARK_ALPHA: f64 = 0.25;

/// Share of the half-extent the composition may fill
const FIT_MARGIN: f64 = 0.96;

const AFTERGLOW_DISCS: u32 = 60;
const AFTERGLOW_ALPHA: f64 = 0.02;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn alpha_byte(alpha: f64) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Palette entry with the canvas' global alpha folded in
fn tint(color: Hsla, global_alpha: f64) -> Color {
    let rgba = color.to_rgba();
    rgba.with_alpha(alpha_byte(f64::from(color.alpha) * global_alpha))
}

struct Canvas {
    buffer: PixelBuffer,
    cx: f64,
    cy: f64,
    scale: f64,
}

impl Canvas {
    fn new(width: u32, height: u32, scale: f64) -> Self {
        Self {
            buffer: PixelBuffer::new(width, height),
            cx: f64::from(width) / 2.0,
            cy: f64::from(height) / 2.0,
            scale,
        }
    }

    fn paint_background(&mut self) {
        let (w, h) = (self.buffer.width(), self.buffer.height());
        let outer = f64::from(w.max(h)).max(GRADIENT_INNER_RADIUS + 1.0);
        for y in 0..h {
            for x in 0..w {
                let dx = f64::from(x) + 0.5 - self.cx;
                let dy = f64::from(y) + 0.5 - self.cy;
                let t = (dx.hypot(dy) - GRADIENT_INNER_RADIUS) / (outer - GRADIENT_INNER_RADIUS);
                #[allow(clippy::cast_possible_truncation)]
                let color = BACKGROUND_INNER.lerp(BACKGROUND_OUTER, t as f32);
                self.buffer.set(x, y, color);
            }
        }
    }

    /// Additively plot `color` on every pixel whose center, in layout units,
    /// satisfies `covers`. Only the box of half-size `reach` around `center`
    /// is visited.
    fn add_where(
        &mut self,
        center: (f64, f64),
        reach: f64,
        color: Color,
        covers: impl Fn(f64, f64) -> bool,
    ) {
        if color.a == 0 {
            return;
        }
        let (xs, xe) = self.pixel_span(center.0, reach, self.cx, self.buffer.width());
        let (ys, ye) = self.pixel_span(center.1, reach, self.cy, self.buffer.height());
        for y in ys..ye {
            let ly = (f64::from(y) + 0.5 - self.cy) / self.scale;
            for x in xs..xe {
                let lx = (f64::from(x) + 0.5 - self.cx) / self.scale;
                if covers(lx, ly) {
                    if let Some(dst) = self.buffer.get(x, y) {
                        self.buffer.set(x, y, color.add_onto(dst));
                    }
                }
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn pixel_span(&self, at: f64, reach: f64, origin: f64, limit: u32) -> (u32, u32) {
        let lo = ((at - reach) * self.scale + origin).floor().max(0.0);
        let hi = ((at + reach) * self.scale + origin).ceil().max(0.0);
        let lo = (lo as u32).min(limit);
        let hi = (hi as u32).min(limit);
        (lo, hi)
    }

    fn stroke_circle(&mut self, radius: f64, line_width: f64, color: Color) {
        // Never thinner than one pixel, or small frames lose their rings
        let half = line_width.max(1.0 / self.scale) / 2.0;
        self.add_where((0.0, 0.0), radius + half, color, |x, y| {
            (x.hypot(y) - radius).abs() <= half
        });
    }

    fn fill_disc(&mut self, center: (f64, f64), radius: f64, color: Color) {
        let radius = radius.max(0.5 / self.scale);
        self.add_where(center, radius, color, |x, y| {
            (x - center.0).hypot(y - center.1) <= radius
        });
    }

    fn fill_petal(&mut self, layer_radius: f64, petal: &Petal, color: Color) {
        let (sin, cos) = petal.angle.sin_cos();
        let base = (layer_radius * sin, -layer_radius * cos);
        let (w, h) = (petal.width, petal.height);
        self.add_where(base, h + w, color, |x, y| {
            let (dx, dy) = (x - base.0, y - base.1);
            let across = dx * cos + dy * sin;
            let outward = dx * sin - dy * cos;
            outward >= 0.0 && outward <= h && across.abs() <= drop_half_width(outward, w, h)
        });
    }

    fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }
}

/// Half-width of the drop shape at distance `outward` from its base
///
/// The outline is two quadratic curves from the base to the tip with control
/// points at `(±w, 0.6h)`. Along the curve `outward = h(1.2t - 0.2t²)`, which
/// is monotone on `[0, 1]`, so `t` is recovered in closed form.
fn drop_half_width(outward: f64, w: f64, h: f64) -> f64 {
    if h <= 0.0 {
        return 0.0;
    }
    let ratio = (outward / h).clamp(0.0, 1.0);
    let t = (1.2 - (1.44 - 0.8 * ratio).sqrt()) / 0.4;
    2.0 * t * (1.0 - t) * w
}

/// Scale that fits the composition's outermost element in the shorter side
#[must_use]
pub fn fit_scale(spec: &CompositionSpec, width: u32, height: u32) -> f64 {
    let half = f64::from(width.min(height)) / 2.0;
    let extent = spec.extent();
    if extent <= 0.0 || half <= 0.0 {
        return 1.0;
    }
    half * FIT_MARGIN / extent
}

/// Paint a composition into a new opaque frame
#[must_use]
pub fn render_composition(spec: &CompositionSpec, width: u32, height: u32) -> PixelBuffer {
    let mut canvas = Canvas::new(width, height, fit_scale(spec, width, height));
    canvas.paint_background();

    for (n, r) in (GLOW_FIRST_RADIUS..GLOW_LAST_RADIUS)
        .step_by(GLOW_STEP)
        .enumerate()
    {
        let radius = f64::from(r);
        let color = tint(spec.color(n + 1), GLOW_ALPHA);
        canvas.stroke_circle(radius, 2.0 + radius * 0.02, color);
    }

    for layer in spec.layers() {
        for petal in &layer.petals {
            let color = tint(spec.color(petal.palette_index), petal.opacity);
            canvas.fill_petal(layer.radius, petal, color);
        }
    }

    for ring in spec.rings() {
        canvas.stroke_circle(
            ring.radius,
            RING_LINE_WIDTH,
            tint(spec.color(ring.palette_index), RING_ALPHA),
        );
        for mark in &ring.marks {
            let (sin, cos) = mark.angle.sin_cos();
            let center = (ring.radius * sin, -ring.radius * cos);
            canvas.fill_disc(center, mark.size, tint(spec.color(mark.palette_index), MARK_ALPHA));
        }
    }

    tracing::trace!(seed = %spec.seed(), width, height, "Rendered composition");
    canvas.into_buffer()
}

/// Paint the faint seed of light shown after a regenerate
///
/// Uses the first residue color (falling back to the first fallback color
/// when the palette is empty or unparseable) stacked in 60 additive discs.
#[must_use]
pub fn render_afterglow(residue_palette: &[String], width: u32, height: u32) -> PixelBuffer {
    let base = residue_palette
        .first()
        .and_then(|css| Color::from_css(css))
        .or_else(|| Color::from_hex(FALLBACK_PALETTE[0]))
        .unwrap_or_else(|| Color::rgb(0x8f, 0x79, 0xf9));
    let color = base.with_alpha(alpha_byte(AFTERGLOW_ALPHA));

    let mut canvas = Canvas::new(width, height, 1.0);
    canvas.paint_background();
    for i in 0..AFTERGLOW_DISCS {
        canvas.fill_disc((0.0, 0.0), 1.0 + f64::from(i) * 1.2, color);
    }
    canvas.into_buffer()
}
