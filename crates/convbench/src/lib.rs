//! # convbench
//!
//! Benchmarks 2D convolution under two execution strategies — Winograd
//! F(2x2, 3x3) and direct im2col+GEMM — across a fixed grid of batch sizes,
//! spatial sizes, and channel counts, then renders one heat-map of the
//! timing ratio per batch size.
//!
//! - [`grid`] — the swept parameter lists and their cross product
//! - [`sweep`] — timed execution of the convolution pipeline per grid point
//! - [`compare`] — per-batch ratio matrices from two labeled sweeps
//! - [`plot`] — heat-map rendering

pub mod compare;
pub mod error;
pub mod grid;
pub mod plot;
pub mod sweep;

pub use error::{Error, Result};
