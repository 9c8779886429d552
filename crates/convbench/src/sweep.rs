use std::hint::black_box;
use std::time::Instant;

use convbench_core::{conv2d, Strategy, Tensor};
use rand::thread_rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::grid::{grid_points, GridPoint};

// Timed sweep — one duration measurement per grid point
//
// The timed operation at each point is five chained conv2d applications
// (3x3 kernel, stride 1, padding 1) on a random image, with a random
// filter bank of matching channel count. With C_in == C_out and "same"
// padding the image shape is invariant under the chain, so the pipeline
// can be re-run any number of times on the same input.
//
// Timing protocol: WARMUP_RUNS executions are discarded (one-time setup,
// cache effects), then TIMED_RUNS executions are measured as a block and
// the mean per-iteration wall time is reported in milliseconds.

/// Warm-up executions discarded before measuring.
pub const WARMUP_RUNS: usize = 5;

/// Measured executions per grid point.
pub const TIMED_RUNS: usize = 100;

/// Chained conv2d applications forming the timed operation.
pub const CONV_CHAIN_LEN: usize = 5;

const KERNEL: usize = 3;
const STRIDE: [usize; 2] = [1, 1];
const PADDING: [usize; 2] = [1, 1];

/// One timing measurement, labeled with the grid point that produced it.
///
/// Carrying the label (rather than relying on shared iteration order)
/// lets the comparison stage verify that two sweeps covered the same grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    pub point: GridPoint,
    /// Mean wall time per pipeline execution, in milliseconds.
    pub ms: f64,
}

/// Run the full fixed-grid sweep under one strategy.
///
/// Samples come back in grid order. Any conv failure aborts the whole
/// sweep; there are no partial results.
pub fn run_sweep(strategy: Strategy) -> Result<Vec<TimingSample>> {
    run_sweep_with(strategy, &grid_points(), WARMUP_RUNS, TIMED_RUNS)
}

/// Sweep an arbitrary point list with explicit warm-up and run counts.
///
/// `run_sweep` delegates here; tests use it with a reduced grid and counts.
pub fn run_sweep_with(
    strategy: Strategy,
    points: &[GridPoint],
    warmup: usize,
    runs: usize,
) -> Result<Vec<TimingSample>> {
    let mut rng = thread_rng();
    let mut samples = Vec::with_capacity(points.len());

    for &point in points {
        let GridPoint {
            batch,
            spatial,
            channels,
        } = point;
        let image = Tensor::rand_uniform([batch, spatial, spatial, channels], &mut rng);
        let weight = Tensor::rand_uniform([channels, KERNEL, KERNEL, channels], &mut rng);

        let pipeline = |image: &Tensor| -> convbench_core::Result<Tensor> {
            let mut out = conv2d(image, &weight, STRIDE, PADDING, strategy)?;
            for _ in 1..CONV_CHAIN_LEN {
                out = conv2d(&out, &weight, STRIDE, PADDING, strategy)?;
            }
            Ok(out)
        };

        for _ in 0..warmup {
            black_box(pipeline(&image)?);
        }
        let start = Instant::now();
        for _ in 0..runs {
            black_box(pipeline(&image)?);
        }
        let ms = start.elapsed().as_secs_f64() * 1000.0 / runs as f64;

        debug!(%point, strategy = %strategy, ms, "timed grid point");
        samples.push(TimingSample { point, ms });
    }

    Ok(samples)
}

/// Serialize a sweep as the benchmark-mode stdout line: comma-joined
/// decimal ms values in grid order.
pub fn format_line(samples: &[TimingSample]) -> String {
    let fields: Vec<String> = samples.iter().map(|s| s.ms.to_string()).collect();
    fields.join(",")
}

/// Parse a benchmark-mode timing line back into raw ms values.
///
/// Any field that is not a decimal float is an error; there is no partial
/// recovery.
pub fn parse_line(line: &str) -> Result<Vec<f64>> {
    line.trim_end()
        .split(',')
        .enumerate()
        .map(|(index, field)| {
            field.trim().parse::<f64>().map_err(|source| Error::ParseTiming {
                index,
                field: field.to_string(),
                source,
            })
        })
        .collect()
}
