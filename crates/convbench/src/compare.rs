use crate::error::{Error, Result};
use crate::grid::{BATCH_SIZES, CHANNEL_COUNTS, SPATIAL_SIZES};
use crate::sweep::TimingSample;

// Comparison — per-batch ratio matrices from two labeled sweeps
//
// For each batch size the 24 samples covering (spatial x channel) reshape
// into a 4x6 matrix of winograd_ms / direct_ms. Because every sample
// carries its grid label, the two sweeps are validated point-by-point
// before any ratio is taken; a diverging grid is a hard error, never a
// silent misalignment.
//
// A zero direct time produces inf (or NaN for 0/0) in the matrix. That is
// a defect worth seeing in the rendered image, so it is not masked here.

/// Ratio matrix for one batch size: rows = spatial extents, columns =
/// channel counts, values = winograd time over direct time.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioMatrix {
    /// The batch size this matrix covers.
    pub batch: usize,
    /// Row labels (spatial extents, in sweep order).
    pub spatial: Vec<usize>,
    /// Column labels (channel counts, in sweep order).
    pub channels: Vec<usize>,
    values: Vec<f64>,
}

impl RatioMatrix {
    pub fn rows(&self) -> usize {
        self.spatial.len()
    }

    pub fn cols(&self) -> usize {
        self.channels.len()
    }

    /// Value at (spatial index, channel index).
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.cols() + j]
    }

    /// Row-major flat view of the matrix.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Min and max over the finite values, if any exist.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for &v in &self.values {
            if !v.is_finite() {
                continue;
            }
            range = Some(match range {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        range
    }
}

/// Combine two full-grid sweeps into one ratio matrix per batch size.
///
/// Both sweeps must cover the fixed grid in grid order; any length or
/// label divergence is an error.
pub fn ratio_matrices(
    winograd: &[TimingSample],
    direct: &[TimingSample],
) -> Result<Vec<RatioMatrix>> {
    if winograd.len() != direct.len() {
        return Err(Error::SweepMismatch(format!(
            "sweep lengths differ: {} vs {}",
            winograd.len(),
            direct.len()
        )));
    }
    let expected = BATCH_SIZES.len() * SPATIAL_SIZES.len() * CHANNEL_COUNTS.len();
    if winograd.len() != expected {
        return Err(Error::SweepMismatch(format!(
            "expected {expected} samples per sweep, got {}",
            winograd.len()
        )));
    }

    let mut matrices = Vec::with_capacity(BATCH_SIZES.len());
    let mut k = 0;
    for &batch in &BATCH_SIZES {
        let mut values = Vec::with_capacity(SPATIAL_SIZES.len() * CHANNEL_COUNTS.len());
        for &spatial in &SPATIAL_SIZES {
            for &channels in &CHANNEL_COUNTS {
                let (a, b) = (&winograd[k], &direct[k]);
                for sample in [a, b] {
                    if sample.point.batch != batch
                        || sample.point.spatial != spatial
                        || sample.point.channels != channels
                    {
                        return Err(Error::SweepMismatch(format!(
                            "grid diverges at index {k}: expected (n={batch}, hw={spatial}, \
                             c={channels}), got {}",
                            sample.point
                        )));
                    }
                }
                values.push(a.ms / b.ms);
                k += 1;
            }
        }
        matrices.push(RatioMatrix {
            batch,
            spatial: SPATIAL_SIZES.to_vec(),
            channels: CHANNEL_COUNTS.to_vec(),
            values,
        });
    }
    Ok(matrices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::grid_points;

    fn stub_sweep(ms: f64) -> Vec<TimingSample> {
        grid_points()
            .into_iter()
            .map(|point| TimingSample { point, ms })
            .collect()
    }

    #[test]
    fn constant_sweeps_give_constant_matrices() {
        let matrices = ratio_matrices(&stub_sweep(2.0), &stub_sweep(1.0)).unwrap();
        assert_eq!(matrices.len(), 6);
        for (m, &batch) in matrices.iter().zip(BATCH_SIZES.iter()) {
            assert_eq!(m.batch, batch);
            assert_eq!(m.rows(), 4);
            assert_eq!(m.cols(), 6);
            assert!(m.values().iter().all(|&v| v == 2.0));
        }
    }

    #[test]
    fn positions_are_preserved() {
        let mut winograd = stub_sweep(1.0);
        let direct = stub_sweep(1.0);
        // Mark batch 8 (index 2), spatial 36 (index 2), channels 128 (index 4).
        let k = 2 * 24 + 2 * 6 + 4;
        winograd[k].ms = 5.0;

        let matrices = ratio_matrices(&winograd, &direct).unwrap();
        assert_eq!(matrices[2].get(2, 4), 5.0);
        assert_eq!(matrices[2].get(2, 3), 1.0);
        assert_eq!(matrices[1].get(2, 4), 1.0);
    }

    #[test]
    fn zero_denominator_surfaces_as_non_finite() {
        let winograd = stub_sweep(1.0);
        let mut direct = stub_sweep(1.0);
        direct[0].ms = 0.0;

        let matrices = ratio_matrices(&winograd, &direct).unwrap();
        assert!(matrices[0].get(0, 0).is_infinite());
        // The rest of the matrix is untouched.
        assert_eq!(matrices[0].get(0, 1), 1.0);
    }

    #[test]
    fn finite_range_skips_non_finite_values() {
        let winograd = stub_sweep(2.0);
        let mut direct = stub_sweep(1.0);
        direct[3].ms = 0.0;

        let matrices = ratio_matrices(&winograd, &direct).unwrap();
        assert_eq!(matrices[0].finite_range(), Some((2.0, 2.0)));
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let winograd = stub_sweep(1.0);
        let mut direct = stub_sweep(1.0);
        direct.pop();
        let err = ratio_matrices(&winograd, &direct).unwrap_err();
        assert!(matches!(err, Error::SweepMismatch(_)));
    }

    #[test]
    fn label_mismatch_is_an_error() {
        let winograd = stub_sweep(1.0);
        let mut direct = stub_sweep(1.0);
        direct[10].point.channels += 1;
        let err = ratio_matrices(&winograd, &direct).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("grid diverges at index 10"), "{msg}");
    }
}
