//! Palette and Geometry Generation
//!
//! Produces the [`CompositionSpec`] for one mandala from a [`Seed`]. It
//! describes WHAT to draw (symmetry, palette, every petal and ring mark), not
//! HOW; [`crate::canvas`] and any external renderer interpret it.
//!
//! # Draw Order
//!
//! Reproduction across implementations depends on consuming the stream in
//! exactly this order:
//!
//! 1. symmetry: `6 + floor(draw * 6)`
//! 2. base hue: `floor(draw * 360)`
//! 3. for each of the [`PETAL_LAYERS`] layers: radius jitter, then for each
//!    petal its width, height and opacity
//! 4. for each of the [`RING_COUNT`] rings, for each mark: its size
//!
//! The stream is private to this generator. Text generation uses its own
//! stream so neither side can shift the other's draws.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::color::Hsla;
use crate::rng::Stream;
use crate::seed::Seed;

/// Lowest symmetry order
pub const MIN_SYMMETRY: u32 = 6;
/// Number of possible symmetry orders (6 through 11)
pub const SYMMETRY_SPAN: usize = 6;
/// Number of palette entries
pub const PALETTE_SIZE: usize = 5;
/// Hue rotation between palette entries, degrees
pub const HUE_STEP: u16 = 36;
/// Palette saturation percent
pub const PALETTE_SATURATION: u8 = 75;
/// Lightness bands, even entries then odd entries
pub const LIGHTNESS_BANDS: [u8; 2] = [70, 60];
/// Alpha of the first palette entry
pub const ALPHA_START: f32 = 0.8;
/// Alpha lost per palette entry
pub const ALPHA_STEP: f32 = 0.12;

/// Concentric petal layers
pub const PETAL_LAYERS: u32 = 6;
/// Radius of the innermost petal layer
pub const BASE_RADIUS: f64 = 80.0;
/// Radius added per layer
pub const RADIUS_STEP: f64 = 48.0;
/// Maximum random radius added to a layer
pub const RADIUS_JITTER: f64 = 24.0;

/// Perimeter rings
pub const RING_COUNT: u32 = 5;
/// Radius of the innermost perimeter ring
pub const RING_BASE_RADIUS: f64 = 240.0;
/// Radius added per perimeter ring
pub const RING_STEP: f64 = 26.0;

/// One petal of a layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Petal {
    /// Angular position, radians clockwise from 12 o'clock
    pub angle: f64,
    /// Half-width of the drop shape
    pub width: f64,
    /// Length of the drop shape, pointing outward
    pub height: f64,
    /// Fill opacity
    pub opacity: f64,
    /// Index into the palette
    pub palette_index: usize,
}

/// A concentric ring of petals
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PetalLayer {
    /// Distance from the center to the base of each petal
    pub radius: f64,
    /// Petals in angular order
    pub petals: Vec<Petal>,
}

/// A dot on a perimeter ring
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingMark {
    /// Angular position, radians
    pub angle: f64,
    /// Dot radius
    pub size: f64,
    /// Index into the palette
    pub palette_index: usize,
}

/// A perimeter ring with its marks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    /// Ring radius
    pub radius: f64,
    /// Stroke palette index
    pub palette_index: usize,
    /// Marks in angular order
    pub marks: Vec<RingMark>,
}

/// Generated geometry and colors for one mandala
///
/// Immutable once generated: fields are read through accessors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositionSpec {
    seed: Seed,
    symmetry: u32,
    base_hue: u16,
    palette: Vec<Hsla>,
    layers: Vec<PetalLayer>,
    rings: Vec<Ring>,
}

impl CompositionSpec {
    /// Seed this composition was generated from
    #[must_use]
    pub fn seed(&self) -> Seed {
        self.seed
    }

    /// Rotational symmetry order (6..=11)
    #[must_use]
    pub fn symmetry(&self) -> u32 {
        self.symmetry
    }

    /// Base hue in degrees (0..=359)
    #[must_use]
    pub fn base_hue(&self) -> u16 {
        self.base_hue
    }

    /// The five palette colors
    #[must_use]
    pub fn palette(&self) -> &[Hsla] {
        &self.palette
    }

    /// Palette as CSS color strings
    #[must_use]
    pub fn palette_strings(&self) -> Vec<String> {
        self.palette.iter().map(ToString::to_string).collect()
    }

    /// Petal layers, innermost first
    #[must_use]
    pub fn layers(&self) -> &[PetalLayer] {
        &self.layers
    }

    /// Perimeter rings, innermost first
    #[must_use]
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Palette entry for an index, wrapping
    #[must_use]
    pub fn color(&self, index: usize) -> Hsla {
        self.palette[index % self.palette.len()]
    }

    /// Outermost radius any element reaches
    #[must_use]
    pub fn extent(&self) -> f64 {
        let petal_reach = self
            .layers
            .iter()
            .flat_map(|l| l.petals.iter().map(move |p| l.radius + p.height))
            .fold(0.0, f64::max);
        let ring_reach = self
            .rings
            .iter()
            .flat_map(|r| r.marks.iter().map(move |m| r.radius + m.size))
            .fold(0.0, f64::max);
        petal_reach.max(ring_reach)
    }
}

/// Build the five-entry palette around a base hue
#[must_use]
pub fn build_palette(base_hue: u16) -> Vec<Hsla> {
    (0..PALETTE_SIZE)
        .map(|i| {
            #[allow(clippy::cast_possible_truncation)]
            let step = i as u16;
            #[allow(clippy::cast_precision_loss)]
            let alpha = ALPHA_START - ALPHA_STEP * i as f32;
            Hsla::new(
                (base_hue + step * HUE_STEP) % 360,
                PALETTE_SATURATION,
                LIGHTNESS_BANDS[i % 2],
                alpha,
            )
        })
        .collect()
}

/// Petal count for a layer: doubled on odd layers
#[must_use]
pub const fn petals_in_layer(symmetry: u32, layer: u32) -> u32 {
    symmetry * (1 + layer % 2)
}

/// Generate a composition from a seed
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn generate_composition(seed: Seed) -> CompositionSpec {
    let mut stream = seed.stream();

    let symmetry = MIN_SYMMETRY + stream.below(SYMMETRY_SPAN) as u32;
    let base_hue = stream.below(360) as u16;
    let palette = build_palette(base_hue);

    let layers = (0..PETAL_LAYERS)
        .map(|layer| generate_layer(&mut stream, symmetry, layer))
        .collect();
    let rings = (0..RING_COUNT)
        .map(|ring| generate_ring(&mut stream, symmetry, ring))
        .collect();

    tracing::trace!(%seed, symmetry, base_hue, "Generated composition");

    CompositionSpec {
        seed,
        symmetry,
        base_hue,
        palette,
        layers,
        rings,
    }
}

fn generate_layer(stream: &mut Stream, symmetry: u32, layer: u32) -> PetalLayer {
    let l = f64::from(layer);
    let radius = BASE_RADIUS + l * RADIUS_STEP + stream.next_f64() * RADIUS_JITTER;
    let count = petals_in_layer(symmetry, layer);

    let petals = (0..count)
        .map(|i| {
            let width = 6.0 + l * 2.0 + stream.next_f64() * 3.0;
            let height = 30.0 + l * 10.0 + stream.next_f64() * 16.0;
            let opacity = 0.18 + stream.next_f64() * 0.25;
            Petal {
                angle: f64::from(i) / f64::from(count) * TAU,
                width,
                height,
                opacity,
                palette_index: (layer + i) as usize % PALETTE_SIZE,
            }
        })
        .collect();

    PetalLayer { radius, petals }
}

fn generate_ring(stream: &mut Stream, symmetry: u32, ring: u32) -> Ring {
    let marks = symmetry * 2;
    Ring {
        radius: RING_BASE_RADIUS + f64::from(ring) * RING_STEP,
        palette_index: (ring + 2) as usize % PALETTE_SIZE,
        marks: (0..marks)
            .map(|i| RingMark {
                angle: f64::from(i) / f64::from(marks) * TAU,
                size: 4.0 + stream.next_f64() * 6.0,
                palette_index: (i + ring) as usize % PALETTE_SIZE,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_from_text;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_symmetry_range_over_many_seeds() {
        let mut seen = [false; SYMMETRY_SPAN];
        for s in 0..10_000_u32 {
            let spec = generate_composition(Seed(s));
            assert!((6..=11).contains(&spec.symmetry()), "seed {s}");
            assert!(spec.base_hue() < 360, "seed {s}");
            seen[(spec.symmetry() - MIN_SYMMETRY) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "every symmetry order should occur");
    }

    #[test]
    fn test_known_seeds() {
        let one = generate_composition(Seed(1));
        assert_eq!(one.symmetry(), 6);
        assert_eq!(one.base_hue(), 5);

        let light = generate_composition(seed_from_text("光"));
        assert_eq!(light.symmetry(), 10);
        assert_eq!(light.base_hue(), 335);
    }

    #[test]
    fn test_regeneration_is_deep_equal() {
        let seed = seed_from_text("輪廻 再生 無常 光");
        assert_eq!(generate_composition(seed), generate_composition(seed));
    }

    #[test]
    fn test_palette_shape() {
        let palette = build_palette(335);
        let strings: Vec<String> = palette.iter().map(ToString::to_string).collect();
        assert_eq!(
            strings,
            vec![
                "hsl(335 75% 70% / 0.80)",
                "hsl(11 75% 60% / 0.68)",
                "hsl(47 75% 70% / 0.56)",
                "hsl(83 75% 60% / 0.44)",
                "hsl(119 75% 70% / 0.32)",
            ]
        );
        for pair in palette.windows(2) {
            assert!(pair[1].alpha < pair[0].alpha);
        }
    }

    #[test]
    fn test_layer_petal_counts_follow_symmetry() {
        let spec = generate_composition(Seed(42));
        let sym = spec.symmetry();
        let counts: Vec<usize> = spec.layers().iter().map(|l| l.petals.len()).collect();
        let expected: Vec<usize> = (0..PETAL_LAYERS)
            .map(|l| petals_in_layer(sym, l) as usize)
            .collect();
        assert_eq!(counts, expected);
        for ring in spec.rings() {
            assert_eq!(ring.marks.len(), (sym * 2) as usize);
        }
    }

    #[test]
    fn test_layer_radii_stay_in_bands() {
        let spec = generate_composition(Seed(7));
        for (l, layer) in spec.layers().iter().enumerate() {
            let base = BASE_RADIUS + l as f64 * RADIUS_STEP;
            assert!(layer.radius >= base && layer.radius < base + RADIUS_JITTER);
            for petal in &layer.petals {
                assert!((0.18..0.43).contains(&petal.opacity));
                assert!(petal.palette_index < PALETTE_SIZE);
            }
        }
    }

    #[test]
    fn test_petals_are_evenly_spaced() {
        let spec = generate_composition(Seed(3));
        let layer = &spec.layers()[1];
        let n = layer.petals.len() as f64;
        for (i, petal) in layer.petals.iter().enumerate() {
            assert!((petal.angle - i as f64 / n * TAU).abs() < 1e-12);
        }
    }

    #[test]
    fn test_total_draw_count_is_fixed_by_symmetry() {
        // 2 header draws + per layer (1 + 3 per petal) + 5 rings * 2*sym marks
        let spec = generate_composition(Seed(11));
        let sym = spec.symmetry();
        let petal_total: u32 = (0..PETAL_LAYERS).map(|l| petals_in_layer(sym, l)).sum();
        let draws = 2 + PETAL_LAYERS + 3 * petal_total + RING_COUNT * sym * 2;

        let last_mark = spec.rings().last().unwrap().marks.last().unwrap();
        let mut replay = Seed(11).stream();
        for _ in 0..draws - 1 {
            replay.next_u32();
        }
        assert!((last_mark.size - (4.0 + replay.next_f64() * 6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_extent_covers_outer_ring() {
        let spec = generate_composition(Seed(9));
        assert!(spec.extent() >= RING_BASE_RADIUS + 4.0 * RING_STEP);
    }
}
