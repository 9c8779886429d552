use std::fmt;

// Parameter grid — the swept configuration space
//
// The three lists are fixed; every combination is benchmarked. The channel
// list is positional, not a set: 64 appears twice on purpose, so two grid
// columns measure the same configuration.
//
// Iteration order is significant and must match between any two sweeps that
// get compared: batch outermost, spatial middle, channels innermost.

/// Batch sizes swept (one heat-map per entry).
pub const BATCH_SIZES: [usize; 6] = [1, 4, 8, 16, 32, 64];

/// Spatial extents swept (images are square: H = W).
pub const SPATIAL_SIZES: [usize; 4] = [9, 18, 36, 72];

/// Channel counts swept (C_in = C_out at every point).
pub const CHANNEL_COUNTS: [usize; 6] = [16, 32, 64, 64, 128, 256];

/// One swept configuration: (batch size, spatial extent, channel count).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPoint {
    /// Batch size N.
    pub batch: usize,
    /// Spatial extent HW (square images).
    pub spatial: usize,
    /// Channel count C (both input and output).
    pub channels: usize,
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(n={}, hw={}, c={})",
            self.batch, self.spatial, self.channels
        )
    }
}

/// The full cross product in fixed nested order: batch outer, spatial
/// middle, channels inner.
pub fn grid_points() -> Vec<GridPoint> {
    let mut points =
        Vec::with_capacity(BATCH_SIZES.len() * SPATIAL_SIZES.len() * CHANNEL_COUNTS.len());
    for &batch in &BATCH_SIZES {
        for &spatial in &SPATIAL_SIZES {
            for &channels in &CHANNEL_COUNTS {
                points.push(GridPoint {
                    batch,
                    spatial,
                    channels,
                });
            }
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_grid_has_144_points() {
        assert_eq!(grid_points().len(), 6 * 4 * 6);
    }

    #[test]
    fn iteration_order_is_batch_spatial_channels() {
        let points = grid_points();
        // First point: smallest of everything.
        assert_eq!(
            points[0],
            GridPoint {
                batch: 1,
                spatial: 9,
                channels: 16
            }
        );
        // Channels vary fastest.
        assert_eq!(points[1].channels, 32);
        assert_eq!(points[1].spatial, 9);
        // After one channel row (6 entries), spatial advances.
        assert_eq!(points[6].spatial, 18);
        assert_eq!(points[6].batch, 1);
        // After one spatial block (4 * 6 entries), batch advances.
        assert_eq!(points[24].batch, 4);
        assert_eq!(points[24].spatial, 9);
        assert_eq!(points[24].channels, 16);
        // Last point: largest of everything.
        assert_eq!(
            *points.last().unwrap(),
            GridPoint {
                batch: 64,
                spatial: 72,
                channels: 256
            }
        );
    }

    #[test]
    fn grid_is_reproducible() {
        assert_eq!(grid_points(), grid_points());
    }

    #[test]
    fn channel_list_keeps_the_duplicate() {
        // 64 is measured twice; the list is positional.
        assert_eq!(CHANNEL_COUNTS.iter().filter(|&&c| c == 64).count(), 2);
    }
}
