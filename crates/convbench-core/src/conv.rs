use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;

use crate::bail;
use crate::error::{Error, Result};
use crate::tensor::Tensor;

// 2D convolution with two selectable execution strategies.
//
// Layouts follow the benchmark's convention:
//
//   input  [N, H, W, C_in]
//   weight [C_out, kH, kW, C_in]
//   output [N, H_out, W_out, C_out]
//
// OUTPUT SIZE FORMULA:
//
//   H_out = floor((H + 2*pH - kH) / sH) + 1
//   W_out = floor((W + 2*pW - kW) / sW) + 1
//
// STRATEGIES:
//
//   Direct   — im2col + GEMM. Patches are unrolled per sample into a
//              [H_out*W_out, kH*kW*C_in] matrix and multiplied against the
//              flattened filter bank.
//   Winograd — F(2x2, 3x3) compute reduction. Filters are pre-transformed
//              to 4x4 tiles, input is processed in overlapping 4x4 tiles,
//              and each output 2x2 tile costs 16 multiplies per channel
//              instead of 36. Only defined for 3x3 kernels at stride 1;
//              any other configuration falls back to the direct path.

/// Execution strategy for [`conv2d`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Winograd F(2x2, 3x3) compute-reduction path.
    Winograd,
    /// Direct im2col + GEMM path.
    Direct,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Winograd => write!(f, "winograd"),
            Strategy::Direct => write!(f, "direct"),
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "winograd" => Ok(Strategy::Winograd),
            "direct" => Ok(Strategy::Direct),
            other => Err(Error::msg(format!(
                "unknown strategy {other:?} (expected \"winograd\" or \"direct\")"
            ))),
        }
    }
}

/// 2D convolution over an NHWC input.
///
/// - `input`:  `[N, H, W, C_in]`
/// - `weight`: `[C_out, kH, kW, C_in]`
/// - `stride`: `[sH, sW]`
/// - `padding`: `[pH, pW]` (zero padding on both sides)
///
/// Returns `[N, H_out, W_out, C_out]`. Samples are processed in parallel
/// across the batch dimension.
pub fn conv2d(
    input: &Tensor,
    weight: &Tensor,
    stride: [usize; 2],
    padding: [usize; 2],
    strategy: Strategy,
) -> Result<Tensor> {
    if input.rank() != 4 {
        return Err(Error::RankMismatch {
            expected: 4,
            got: input.rank(),
        });
    }
    if weight.rank() != 4 {
        return Err(Error::RankMismatch {
            expected: 4,
            got: weight.rank(),
        });
    }

    let in_dims = input.dims();
    let w_dims = weight.dims();
    let (n, h, w, c_in) = (in_dims[0], in_dims[1], in_dims[2], in_dims[3]);
    let (c_out, kh, kw, wc_in) = (w_dims[0], w_dims[1], w_dims[2], w_dims[3]);

    if c_in != wc_in {
        bail!("conv2d: input channels {c_in} != weight channels {wc_in}");
    }

    let [sh, sw] = stride;
    let [ph, pw] = padding;

    if sh == 0 || sw == 0 {
        bail!("conv2d: stride must be non-zero, got [{sh}, {sw}]");
    }
    if h + 2 * ph < kh || w + 2 * pw < kw {
        bail!("conv2d: kernel larger than padded input");
    }

    let h_out = (h + 2 * ph - kh) / sh + 1;
    let w_out = (w + 2 * pw - kw) / sw + 1;

    // Winograd F(2x2, 3x3) is only defined for 3x3 kernels at stride 1.
    let use_winograd = strategy == Strategy::Winograd && kh == 3 && kw == 3 && sh == 1 && sw == 1;

    // Transformed filter bank, shared by every sample: [C_out, C_in, 4, 4].
    let transformed = if use_winograd {
        transform_filters(weight.data(), c_out, c_in)
    } else {
        Vec::new()
    };

    let sample_in = h * w * c_in;
    let sample_out = h_out * w_out * c_out;
    let mut output = vec![0.0f32; n * sample_out];

    output
        .par_chunks_mut(sample_out)
        .zip(input.data().par_chunks(sample_in))
        .for_each(|(out, sample)| {
            if use_winograd {
                winograd_sample(
                    sample,
                    &transformed,
                    out,
                    h,
                    w,
                    c_in,
                    c_out,
                    ph,
                    pw,
                    h_out,
                    w_out,
                );
            } else {
                direct_sample(
                    sample,
                    weight.data(),
                    out,
                    h,
                    w,
                    c_in,
                    c_out,
                    kh,
                    kw,
                    sh,
                    sw,
                    ph,
                    pw,
                    h_out,
                    w_out,
                );
            }
        });

    Tensor::from_vec(output, [n, h_out, w_out, c_out])
}

// Direct path: im2col + GEMM

/// Convolve one sample by unrolling patches and multiplying against the
/// filter bank.
#[allow(clippy::too_many_arguments)]
fn direct_sample(
    input: &[f32],
    weight: &[f32],
    out: &mut [f32],
    h: usize,
    w: usize,
    c_in: usize,
    c_out: usize,
    kh: usize,
    kw: usize,
    sh: usize,
    sw: usize,
    ph: usize,
    pw: usize,
    h_out: usize,
    w_out: usize,
) {
    let patch = kh * kw * c_in;
    let mut columns = vec![0.0f32; h_out * w_out * patch];
    im2col(
        input, h, w, c_in, kh, kw, sh, sw, ph, pw, h_out, w_out, &mut columns,
    );
    // Patch element order is [kH, kW, C_in] — the same row-major order as
    // one filter in the weight bank, so the GEMM is C = columns x weight^T.
    gemm_a_bt(&columns, weight, out, h_out * w_out, c_out, patch);
}

/// im2col: extract sliding-window patches from one NHWC sample.
///
/// Input: `[H, W, C_in]`. Output: columns `[H_out * W_out, kH * kW * C_in]`,
/// one row per output position. Out-of-bounds (padding) elements are zero.
#[inline]
#[allow(clippy::too_many_arguments)]
fn im2col(
    input: &[f32],
    h: usize,
    w: usize,
    c_in: usize,
    kh: usize,
    kw: usize,
    sh: usize,
    sw: usize,
    ph: usize,
    pw: usize,
    h_out: usize,
    w_out: usize,
    columns: &mut [f32],
) {
    let patch = kh * kw * c_in;
    for oh in 0..h_out {
        for ow in 0..w_out {
            let row_offset = (oh * w_out + ow) * patch;
            for ki in 0..kh {
                let ih = (oh * sh + ki) as isize - ph as isize;
                for kj in 0..kw {
                    let iw = (ow * sw + kj) as isize - pw as isize;
                    let dst = row_offset + (ki * kw + kj) * c_in;
                    if ih >= 0 && ih < h as isize && iw >= 0 && iw < w as isize {
                        let src = (ih as usize * w + iw as usize) * c_in;
                        columns[dst..dst + c_in].copy_from_slice(&input[src..src + c_in]);
                    } else {
                        columns[dst..dst + c_in].fill(0.0);
                    }
                }
            }
        }
    }
}

/// GEMM: C += A x B^T
///
/// A: [m, k], B: [n, k], C: [m, n]. All row-major.
#[inline]
fn gemm_a_bt(a: &[f32], b: &[f32], c: &mut [f32], m: usize, n: usize, k: usize) {
    for i in 0..m {
        let a_row = i * k;
        let c_row = i * n;
        for j in 0..n {
            let b_row = j * k;
            let mut val = 0.0f32;
            for p in 0..k {
                val += a[a_row + p] * b[b_row + p];
            }
            c[c_row + j] += val;
        }
    }
}

// Winograd F(2x2, 3x3) path
//
// Standard transform matrices:
//
//   B^T = | 1  0 -1  0 |      G = |  1    0    0  |      A^T = | 1 1  1  0 |
//         | 0  1  1  0 |          | 1/2  1/2  1/2 |            | 0 1 -1 -1 |
//         | 0 -1  1  0 |          | 1/2 -1/2  1/2 |
//         | 0  1  0 -1 |          |  0    0    1  |
//
// Per output 2x2 tile: V = B^T d B (input), M = sum_c U_c (.) V_c,
// Y = A^T M A. U = G g G^T is precomputed once per filter/channel pair.

const BT: [[f32; 4]; 4] = [
    [1.0, 0.0, -1.0, 0.0],
    [0.0, 1.0, 1.0, 0.0],
    [0.0, -1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0, -1.0],
];

const G: [[f32; 3]; 4] = [
    [1.0, 0.0, 0.0],
    [0.5, 0.5, 0.5],
    [0.5, -0.5, 0.5],
    [0.0, 0.0, 1.0],
];

const AT: [[f32; 4]; 2] = [[1.0, 1.0, 1.0, 0.0], [0.0, 1.0, -1.0, -1.0]];

/// Pre-transform the whole filter bank: U = G g G^T per (filter, channel).
///
/// `weight` is `[C_out, 3, 3, C_in]`; the result is laid out as
/// `[C_out, C_in, 4, 4]`, flat.
fn transform_filters(weight: &[f32], c_out: usize, c_in: usize) -> Vec<f32> {
    let mut u = vec![0.0f32; c_out * c_in * 16];
    for k in 0..c_out {
        for c in 0..c_in {
            // g[i][j] = weight[k, i, j, c]
            let mut g = [[0.0f32; 3]; 3];
            for (i, g_row) in g.iter_mut().enumerate() {
                for (j, g_val) in g_row.iter_mut().enumerate() {
                    *g_val = weight[((k * 3 + i) * 3 + j) * c_in + c];
                }
            }
            // tmp = G g (4x3), then u = tmp G^T (4x4)
            let mut tmp = [[0.0f32; 3]; 4];
            for i in 0..4 {
                for j in 0..3 {
                    tmp[i][j] = G[i][0] * g[0][j] + G[i][1] * g[1][j] + G[i][2] * g[2][j];
                }
            }
            let base = (k * c_in + c) * 16;
            for i in 0..4 {
                for j in 0..4 {
                    u[base + i * 4 + j] =
                        tmp[i][0] * G[j][0] + tmp[i][1] * G[j][1] + tmp[i][2] * G[j][2];
                }
            }
        }
    }
    u
}

/// V = B^T d B for one 4x4 input tile.
#[inline]
fn input_transform(d: &[[f32; 4]; 4]) -> [f32; 16] {
    let mut tmp = [[0.0f32; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            tmp[i][j] =
                BT[i][0] * d[0][j] + BT[i][1] * d[1][j] + BT[i][2] * d[2][j] + BT[i][3] * d[3][j];
        }
    }
    let mut v = [0.0f32; 16];
    for i in 0..4 {
        for j in 0..4 {
            // (tmp B)[i][j] with B = BT^T, so B[k][j] = BT[j][k]
            v[i * 4 + j] = tmp[i][0] * BT[j][0]
                + tmp[i][1] * BT[j][1]
                + tmp[i][2] * BT[j][2]
                + tmp[i][3] * BT[j][3];
        }
    }
    v
}

/// Y = A^T m A for one elementwise-accumulated 4x4 tile.
#[inline]
fn output_transform(m: &[f32; 16]) -> [[f32; 2]; 2] {
    let mut tmp = [[0.0f32; 4]; 2];
    for i in 0..2 {
        for j in 0..4 {
            tmp[i][j] = AT[i][0] * m[j]
                + AT[i][1] * m[4 + j]
                + AT[i][2] * m[8 + j]
                + AT[i][3] * m[12 + j];
        }
    }
    let mut y = [[0.0f32; 2]; 2];
    for i in 0..2 {
        for j in 0..2 {
            y[i][j] = tmp[i][0] * AT[j][0]
                + tmp[i][1] * AT[j][1]
                + tmp[i][2] * AT[j][2]
                + tmp[i][3] * AT[j][3];
        }
    }
    y
}

/// Convolve one NHWC sample with pre-transformed filters.
///
/// The spatial plane is walked in 2x2 output tiles; tiles that hang over an
/// odd border are clipped when scattering results back.
#[allow(clippy::too_many_arguments)]
fn winograd_sample(
    input: &[f32],
    transformed: &[f32],
    out: &mut [f32],
    h: usize,
    w: usize,
    c_in: usize,
    c_out: usize,
    ph: usize,
    pw: usize,
    h_out: usize,
    w_out: usize,
) {
    let tiles_h = h_out.div_ceil(2);
    let tiles_w = w_out.div_ceil(2);

    // V tiles for every input channel at the current tile position.
    let mut v = vec![0.0f32; c_in * 16];

    for th in 0..tiles_h {
        let ih0 = (th * 2) as isize - ph as isize;
        for tw in 0..tiles_w {
            let iw0 = (tw * 2) as isize - pw as isize;

            for c in 0..c_in {
                // Gather the 4x4 input tile, zero outside the padded border.
                let mut d = [[0.0f32; 4]; 4];
                for (r, d_row) in d.iter_mut().enumerate() {
                    let ih = ih0 + r as isize;
                    if ih < 0 || ih >= h as isize {
                        continue;
                    }
                    for (s, d_val) in d_row.iter_mut().enumerate() {
                        let iw = iw0 + s as isize;
                        if iw < 0 || iw >= w as isize {
                            continue;
                        }
                        *d_val = input[(ih as usize * w + iw as usize) * c_in + c];
                    }
                }
                v[c * 16..c * 16 + 16].copy_from_slice(&input_transform(&d));
            }

            for k in 0..c_out {
                // M = sum_c U_kc (.) V_c
                let mut m = [0.0f32; 16];
                let u_base = k * c_in * 16;
                for c in 0..c_in {
                    let u = &transformed[u_base + c * 16..u_base + c * 16 + 16];
                    let vc = &v[c * 16..c * 16 + 16];
                    for e in 0..16 {
                        m[e] += u[e] * vc[e];
                    }
                }
                let y = output_transform(&m);
                for (r, y_row) in y.iter().enumerate() {
                    let oh = th * 2 + r;
                    if oh >= h_out {
                        break;
                    }
                    for (s, &y_val) in y_row.iter().enumerate() {
                        let ow = tw * 2 + s;
                        if ow >= w_out {
                            break;
                        }
                        out[(oh * w_out + ow) * c_out + k] = y_val;
                    }
                }
            }
        }
    }
}
