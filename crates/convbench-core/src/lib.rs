//! # convbench-core
//!
//! Minimal tensor primitives for the convolution benchmark.
//!
//! This crate provides:
//! - [`Tensor`] — contiguous row-major f32 array
//! - [`Shape`] — n-dimensional shape
//! - [`conv::Strategy`] / [`conv::conv2d`] — 2D convolution with a
//!   runtime-selectable execution strategy (Winograd or direct)
//! - [`Error`] / [`Result`] — the crate-wide error type

pub mod conv;
pub mod error;
pub mod shape;
pub mod tensor;

pub use conv::{conv2d, Strategy};
pub use error::{Error, Result};
pub use shape::Shape;
pub use tensor::Tensor;
