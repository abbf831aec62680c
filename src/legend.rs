//! Static colour key for the choropleth.

use crate::style::{density_color, Rgb};

/// Lower bounds of the density legend rows.
pub const DENSITY_GRADES: [u32; 8] = [0, 10, 20, 50, 100, 200, 500, 1000];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Legend {
    pub title: String,
    pub subtitle: String,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    /// One entry per grade, labelled `"<g>–<next>"` or `"<g>+"` for the last.
    /// The swatch is `color(g + 1)` so it lands inside the grade's bucket.
    pub fn build(title: &str, subtitle: &str, grades: &[u32], color: impl Fn(f64) -> Rgb) -> Self {
        let entries = grades
            .iter()
            .enumerate()
            .map(|(i, &grade)| {
                let label = match grades.get(i + 1) {
                    Some(next) => format!("{grade}\u{2013}{next}"),
                    None => format!("{grade}+"),
                };
                LegendEntry {
                    label,
                    color: color(f64::from(grade) + 1.0),
                }
            })
            .collect();

        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            entries,
        }
    }

    /// Legend for the state density map
    pub fn density() -> Self {
        Self::build("Density", "(people/sq mi)", &DENSITY_GRADES, density_color)
    }

    /// Widest text row, in characters, including the two-cell swatch and gap
    pub fn width(&self) -> usize {
        let widest_entry = self.entries.iter().map(|e| e.label.chars().count() + 3).max().unwrap_or(0);
        widest_entry
            .max(self.title.chars().count())
            .max(self.subtitle.chars().count())
    }
}
