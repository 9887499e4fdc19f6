//! Color Values
//!
//! Two surface-agnostic color types:
//! - [`Color`]: 8-bit RGBA, what pixel buffers store and residue reports
//! - [`Hsla`]: hue/saturation/lightness/alpha, what the composition palette
//!   is specified in
//!
//! Both render to CSS color strings so any surface (canvas, terminal, web)
//! can consume them without knowing about this crate.

use serde::{Deserialize, Serialize};

/// 8-bit RGBA color
///
/// # Examples
///
/// ```
/// use rite_core::color::Color;
///
/// let red = Color::rgb(255, 0, 0);
/// assert_eq!(red.to_hex(), "#ff0000");
/// assert_eq!(red.to_css_rgb(), "rgb(255, 0, 0)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
    /// Alpha component (0=transparent, 255=opaque)
    pub a: u8,
}

impl Color {
    /// Create a fully opaque color from RGB components
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color with explicit alpha channel
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a fully transparent color
    #[must_use]
    pub const fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Check if this color is fully transparent
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Copy of this color with a different alpha
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`
    ///
    /// ```
    /// use rite_core::color::Color;
    ///
    /// assert_eq!(Color::from_hex("#8f79f9"), Some(Color::rgb(0x8f, 0x79, 0xf9)));
    /// assert_eq!(Color::from_hex("8f79f9"), None);
    /// ```
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        let byte = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Parse either `#rrggbb[aa]` or `rgb(r, g, b)`, the two forms a residue
    /// palette contains
    ///
    /// ```
    /// use rite_core::color::Color;
    ///
    /// assert_eq!(Color::from_css("rgb(224, 0, 32)"), Some(Color::rgb(224, 0, 32)));
    /// assert_eq!(Color::from_css("#6bdcff"), Some(Color::rgb(0x6b, 0xdc, 0xff)));
    /// ```
    #[must_use]
    pub fn from_css(css: &str) -> Option<Self> {
        let css = css.trim();
        if css.starts_with('#') {
            return Self::from_hex(css);
        }
        let inner = css.strip_prefix("rgb(")?.strip_suffix(')')?;
        let mut parts = inner.split(',').map(|p| p.trim().parse::<u8>().ok());
        let r = parts.next()??;
        let g = parts.next()??;
        let b = parts.next()??;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::rgb(r, g, b))
    }

    /// Convert to a CSS-style hex string (#RRGGBB or #RRGGBBAA)
    #[must_use]
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// CSS functional notation ignoring alpha: `rgb(r, g, b)`
    #[must_use]
    pub fn to_css_rgb(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// Blend this color over another (simple alpha compositing)
    ///
    /// Uses the "over" operator: result = src + dst * (1 - `src_alpha`)
    #[must_use]
    pub fn blend_over(&self, background: Color) -> Color {
        if self.a == 255 {
            return *self;
        }
        if self.a == 0 {
            return background;
        }

        let src_a = f32::from(self.a) / 255.0;
        let dst_a = f32::from(background.a) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);

        if out_a == 0.0 {
            return Color::transparent();
        }

        let blend = |src: u8, dst: u8| -> u8 {
            let s = f32::from(src) / 255.0;
            let d = f32::from(dst) / 255.0;
            let result = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
            unit_to_u8(result)
        };

        Color {
            r: blend(self.r, background.r),
            g: blend(self.g, background.g),
            b: blend(self.b, background.b),
            a: unit_to_u8(out_a),
        }
    }

    /// Additive ("lighter") compositing, saturating per channel
    #[must_use]
    pub fn add_onto(&self, background: Color) -> Color {
        let src_a = f32::from(self.a) / 255.0;
        let add = |src: u8, dst: u8| -> u8 {
            let lifted = f32::from(dst) + f32::from(src) * src_a;
            unit_to_u8(lifted / 255.0)
        };
        Color {
            r: add(self.r, background.r),
            g: add(self.g, background.g),
            b: add(self.b, background.b),
            a: background.a.saturating_add(self.a),
        }
    }

    /// Channel-wise absolute difference, the "difference" blend mode
    ///
    /// The difference is weighted by the backdrop's alpha
    /// (`Cs' = (1 - ab) * Cs + ab * |Cb - Cs|`) and then composited source-over,
    /// so over a transparent backdrop the source color is kept unchanged.
    #[must_use]
    pub fn difference_onto(&self, background: Color) -> Color {
        let dst_a = f32::from(background.a) / 255.0;
        let mix = |src: u8, dst: u8| -> u8 {
            let s = f32::from(src) / 255.0;
            let d = f32::from(dst) / 255.0;
            unit_to_u8((1.0 - dst_a) * s + dst_a * (d - s).abs())
        };
        Color {
            r: mix(self.r, background.r),
            g: mix(self.g, background.g),
            b: mix(self.b, background.b),
            a: self.a,
        }
        .blend_over(background)
    }

    /// Linearly interpolate between two colors
    #[must_use]
    pub fn lerp(&self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let lerp_u8 = |a: u8, b: u8| -> u8 {
            let a = f32::from(a);
            let b = f32::from(b);
            unit_to_u8((a + (b - a) * t) / 255.0)
        };

        Color {
            r: lerp_u8(self.r, other.r),
            g: lerp_u8(self.g, other.g),
            b: lerp_u8(self.b, other.b),
            a: lerp_u8(self.a, other.a),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::transparent()
    }
}

/// Map a `0.0..=1.0` float onto a channel byte, clamping out-of-range input
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Hue/saturation/lightness color with alpha
///
/// Hue in degrees (0-359), saturation and lightness in percent, alpha in
/// `0.0..=1.0`. Displays as CSS Color 4 space-separated syntax.
///
/// ```
/// use rite_core::color::Hsla;
///
/// let c = Hsla::new(200, 75, 70, 0.8);
/// assert_eq!(c.to_string(), "hsl(200 75% 70% / 0.80)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsla {
    /// Hue in degrees
    pub hue: u16,
    /// Saturation percent
    pub saturation: u8,
    /// Lightness percent
    pub lightness: u8,
    /// Opacity
    pub alpha: f32,
}

impl Hsla {
    /// Create a color; hue wraps at 360, percentages clamp at 100
    #[must_use]
    pub fn new(hue: u16, saturation: u8, lightness: u8, alpha: f32) -> Self {
        Self {
            hue: hue % 360,
            saturation: saturation.min(100),
            lightness: lightness.min(100),
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Convert to 8-bit RGBA
    ///
    /// ```
    /// use rite_core::color::{Color, Hsla};
    ///
    /// assert_eq!(Hsla::new(0, 100, 50, 1.0).to_rgba(), Color::rgb(255, 0, 0));
    /// ```
    #[must_use]
    pub fn to_rgba(&self) -> Color {
        let s = f32::from(self.saturation) / 100.0;
        let l = f32::from(self.lightness) / 100.0;
        let h = f32::from(self.hue);

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let sector = h / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match self.hue / 60 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;

        Color {
            r: unit_to_u8(r1 + m),
            g: unit_to_u8(g1 + m),
            b: unit_to_u8(b1 + m),
            a: unit_to_u8(self.alpha),
        }
    }
}

impl std::fmt::Display for Hsla {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hsl({} {}% {}% / {:.2})",
            self.hue, self.saturation, self.lightness, self.alpha
        )
    }
}
