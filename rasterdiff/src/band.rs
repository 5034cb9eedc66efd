//! Severity bands for relative differences and their visualization colors.

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

/// One RGBA8 pixel of the visualization raster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

/// Severity bucket of a pixel, ordered from no difference to undefined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// Values are identical (or both zero).
    None,
    /// `0 < |rel| <= 1e-5`
    Blue,
    /// `1e-5 < |rel| <= 1e-4`
    Azure,
    /// `1e-4 < |rel| <= 1e-3`
    Cyan,
    /// `1e-3 < |rel| <= 1e-2`
    Green,
    /// `1e-2 < |rel| <= 1e-1`
    Yellow,
    /// `|rel| > 1e-1`
    Orange,
    /// Exactly one of the two values is zero.
    Bad,
}

/// Lower (exclusive) bounds of the colored bands, most severe first.
const THRESHOLDS: [(f64, Band); 5] = [
    (1e-1, Band::Orange),
    (1e-2, Band::Yellow),
    (1e-3, Band::Green),
    (1e-4, Band::Cyan),
    (1e-5, Band::Azure),
];

impl Band {
    pub const ALL: [Band; 8] = [
        Band::None,
        Band::Blue,
        Band::Azure,
        Band::Cyan,
        Band::Green,
        Band::Yellow,
        Band::Orange,
        Band::Bad,
    ];

    /// Classifies a pixel from its bad flag and `|rel_diff|`.
    ///
    /// The bad flag wins over any magnitude. Thresholds are strict, so a value
    /// sitting exactly on a boundary lands in the less severe band. NaN matches
    /// no threshold and ends up in [`Band::Blue`].
    pub fn classify(bad: bool, magnitude: f64) -> Band {
        if bad {
            return Band::Bad;
        }
        if magnitude == 0.0 {
            return Band::None;
        }
        THRESHOLDS
            .iter()
            .find(|(threshold, _)| magnitude > *threshold)
            .map_or(Band::Blue, |&(_, band)| band)
    }

    pub fn color(self) -> Rgba {
        match self {
            Band::None => Rgba::TRANSPARENT,
            Band::Blue => Rgba::opaque(0, 0, 255),
            Band::Azure => Rgba::opaque(0, 128, 255),
            Band::Cyan => Rgba::opaque(0, 255, 255),
            Band::Green => Rgba::opaque(0, 255, 0),
            Band::Yellow => Rgba::opaque(255, 255, 0),
            Band::Orange => Rgba::opaque(255, 128, 0),
            Band::Bad => Rgba::opaque(255, 0, 0),
        }
    }
}

/// Color for a pixel; shorthand for `Band::classify(bad, magnitude).color()`.
#[inline]
pub fn classify(bad: bool, magnitude: f64) -> Rgba {
    Band::classify(bad, magnitude).color()
}
