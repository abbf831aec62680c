//! Attribute classifiers: population to marker radius, density to fill colour.

use ratatui::style::Color;
use std::fmt;

/// A 24-bit colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb`. Returns `None` for anything else.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let b = hex.as_bytes();
        if b.len() != 7 || b[0] != b'#' {
            return None;
        }
        let (Some(r), Some(g), Some(bl)) = (hex_byte(b[1], b[2]), hex_byte(b[3], b[4]), hex_byte(b[5], b[6])) else {
            return None;
        };
        Some(Self(r, g, bl))
    }

    /// Composite over `base` with the given opacity (0.0 - 1.0).
    pub fn over(self, base: Rgb, opacity: f64) -> Rgb {
        let a = opacity.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| (fg as f64 * a + bg as f64 * (1.0 - a)).round() as u8;
        Rgb(mix(self.0, base.0), mix(self.1, base.1), mix(self.2, base.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c.0, c.1, c.2)
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn hex_byte(hi: u8, lo: u8) -> Option<u8> {
    match (hex_digit(hi), hex_digit(lo)) {
        (Some(h), Some(l)) => Some(h * 16 + l),
        _ => None,
    }
}

/// Population buckets, ascending. A population below the threshold takes the radius.
pub const RADIUS_BUCKETS: [(u64, u32); 5] = [
    (50_000, 4),
    (100_000, 5),
    (200_000, 7),
    (500_000, 11),
    (1_000_000, 17),
];

/// Radius for populations at or above the last bucket threshold.
pub const MAX_RADIUS: u32 = 25;

/// Marker radius (in screen pixels at full scale) for a city population.
pub fn radius(population: u64) -> u32 {
    RADIUS_BUCKETS
        .iter()
        .find(|&&(limit, _)| population < limit)
        .map_or(MAX_RADIUS, |&(_, r)| r)
}

/// Density buckets, descending. A density strictly above the threshold takes the colour.
/// Order matters: the first match wins.
pub const DENSITY_BUCKETS: [(f64, Rgb); 7] = [
    (1000.0, Rgb(0x66, 0x25, 0x06)),
    (500.0, Rgb(0x99, 0x34, 0x04)),
    (200.0, Rgb(0xd9, 0x5f, 0x0e)),
    (100.0, Rgb(0xfe, 0x99, 0x29)),
    (50.0, Rgb(0xfe, 0xc4, 0x4f)),
    (20.0, Rgb(0xfe, 0xe3, 0x91)),
    (10.0, Rgb(0xff, 0xf7, 0xbc)),
];

/// Colour for densities at or below the last threshold (and NaN).
pub const MIN_DENSITY_COLOR: Rgb = Rgb(0xff, 0xff, 0xe5);

/// Choropleth fill colour for a population density (people per square mile).
pub fn density_color(density: f64) -> Rgb {
    DENSITY_BUCKETS
        .iter()
        .find(|&&(limit, _)| density > limit)
        .map_or(MIN_DENSITY_COLOR, |&(_, c)| c)
}
