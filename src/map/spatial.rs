use std::collections::HashMap;

/// Spatial index for polygon features using conservative approximation.
/// Each feature's bounding box is indexed into every cell it overlaps,
/// guaranteeing no false negatives while allowing false positives
/// (eliminated by an exact containment test downstream).
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Build from feature bounding boxes `(min_lon, min_lat, max_lon, max_lat)`.
    /// Features without a bbox (`None`) keep their index but are never returned.
    pub fn build(bboxes: impl Iterator<Item = Option<(f64, f64, f64, f64)>>, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, bbox) in bboxes.enumerate() {
            let Some((min_lon, min_lat, max_lon, max_lat)) = bbox else {
                continue;
            };
            let min_cell = grid.to_cell(min_lon, min_lat);
            let max_cell = grid.to_cell(max_lon, max_lat);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Candidate feature indices whose bbox cell covers the point
    pub fn query_point(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_point() {
        let grid = FeatureGrid::build(
            [
                Some((-109.0, 37.0, -102.0, 41.0)),
                None,
                Some((-104.0, 41.0, -96.0, 43.0)),
            ]
            .into_iter(),
            1.0,
        );

        assert_eq!(grid.query_point(-105.5, 39.5), &[0]);
        assert_eq!(grid.query_point(-100.0, 42.0), &[2]);
        // Shared cell along the 41st parallel
        let mut both = grid.query_point(-103.5, 41.2).to_vec();
        both.sort_unstable();
        assert_eq!(both, vec![0, 2]);
        assert!(grid.query_point(10.0, 10.0).is_empty());
    }
}
