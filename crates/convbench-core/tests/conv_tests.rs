// Integration tests for the convolution strategies.
//
// The Winograd and direct paths must agree with each other (and with a
// naive sliding-window reference) on every configuration the benchmark
// sweeps: 3x3 kernels, stride 1, padding 1, odd and even spatial sizes.

use convbench_core::{conv2d, Strategy, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Naive sliding-window conv2d over NHWC, used as ground truth.
fn reference_conv2d(
    input: &Tensor,
    weight: &Tensor,
    stride: [usize; 2],
    padding: [usize; 2],
) -> Tensor {
    let (n, h, w, c_in) = {
        let d = input.dims();
        (d[0], d[1], d[2], d[3])
    };
    let (c_out, kh, kw, _) = {
        let d = weight.dims();
        (d[0], d[1], d[2], d[3])
    };
    let [sh, sw] = stride;
    let [ph, pw] = padding;
    let h_out = (h + 2 * ph - kh) / sh + 1;
    let w_out = (w + 2 * pw - kw) / sw + 1;

    let x = input.data();
    let f = weight.data();
    let mut out = vec![0.0f32; n * h_out * w_out * c_out];
    for ni in 0..n {
        for oh in 0..h_out {
            for ow in 0..w_out {
                for k in 0..c_out {
                    let mut acc = 0.0f32;
                    for ki in 0..kh {
                        for kj in 0..kw {
                            let ih = (oh * sh + ki) as isize - ph as isize;
                            let iw = (ow * sw + kj) as isize - pw as isize;
                            if ih < 0 || ih >= h as isize || iw < 0 || iw >= w as isize {
                                continue;
                            }
                            for c in 0..c_in {
                                let xi = ((ni * h + ih as usize) * w + iw as usize) * c_in + c;
                                let fi = ((k * kh + ki) * kw + kj) * c_in + c;
                                acc += x[xi] * f[fi];
                            }
                        }
                    }
                    out[((ni * h_out + oh) * w_out + ow) * c_out + k] = acc;
                }
            }
        }
    }
    Tensor::from_vec(out, [n, h_out, w_out, c_out]).unwrap()
}

fn assert_close(got: &Tensor, want: &Tensor, tol: f32, label: &str) {
    assert_eq!(got.dims(), want.dims(), "{label}: shape mismatch");
    for (i, (g, e)) in got.data().iter().zip(want.data().iter()).enumerate() {
        assert!(
            (g - e).abs() < tol,
            "{label}: index {i}: got {g} expected {e} (tol {tol})"
        );
    }
}

fn check_agreement(n: usize, hw: usize, c_in: usize, c_out: usize, padding: [usize; 2]) {
    let mut rng = StdRng::seed_from_u64(42);
    let x = Tensor::rand_uniform([n, hw, hw, c_in], &mut rng);
    let w = Tensor::rand_uniform([c_out, 3, 3, c_in], &mut rng);

    let reference = reference_conv2d(&x, &w, [1, 1], padding);
    let direct = conv2d(&x, &w, [1, 1], padding, Strategy::Direct).unwrap();
    let winograd = conv2d(&x, &w, [1, 1], padding, Strategy::Winograd).unwrap();

    // Tolerance scales with the reduction length (3*3*c_in f32 adds).
    let tol = 1e-3 * c_in as f32;
    let label = format!("n={n} hw={hw} c_in={c_in} c_out={c_out} pad={padding:?}");
    assert_close(&direct, &reference, tol, &format!("direct {label}"));
    assert_close(&winograd, &reference, tol, &format!("winograd {label}"));
}

#[test]
fn strategies_agree_odd_spatial() {
    // 9 is the smallest spatial size the sweep uses; odd sizes exercise the
    // Winograd tile clipping at the bottom/right border.
    check_agreement(2, 9, 3, 4, [1, 1]);
}

#[test]
fn strategies_agree_even_spatial() {
    check_agreement(1, 8, 4, 2, [1, 1]);
}

#[test]
fn strategies_agree_without_padding() {
    check_agreement(1, 7, 2, 3, [0, 0]);
}

#[test]
fn strategies_agree_square_channel_counts() {
    // The sweep always uses C_in == C_out.
    check_agreement(1, 6, 5, 5, [1, 1]);
}

#[test]
fn winograd_falls_back_for_unsupported_configs() {
    // Stride 2 is outside F(2x2, 3x3); the Winograd strategy must produce
    // the direct result rather than fail.
    let mut rng = StdRng::seed_from_u64(7);
    let x = Tensor::rand_uniform([1, 8, 8, 2], &mut rng);
    let w = Tensor::rand_uniform([3, 3, 3, 2], &mut rng);

    let direct = conv2d(&x, &w, [2, 2], [1, 1], Strategy::Direct).unwrap();
    let winograd = conv2d(&x, &w, [2, 2], [1, 1], Strategy::Winograd).unwrap();
    assert_close(&winograd, &direct, 1e-5, "stride-2 fallback");

    // Same for a 5x5 kernel.
    let w5 = Tensor::rand_uniform([2, 5, 5, 2], &mut rng);
    let direct = conv2d(&x, &w5, [1, 1], [2, 2], Strategy::Direct).unwrap();
    let winograd = conv2d(&x, &w5, [1, 1], [2, 2], Strategy::Winograd).unwrap();
    assert_close(&winograd, &direct, 1e-4, "5x5 fallback");
}

#[test]
fn chained_applications_preserve_shape() {
    // The benchmark pipeline applies conv2d five times in a row; with a 3x3
    // kernel, stride 1, padding 1 and C_in == C_out the shape is invariant.
    let mut rng = StdRng::seed_from_u64(3);
    let w = Tensor::rand_uniform([4, 3, 3, 4], &mut rng);
    let mut x = Tensor::rand_uniform([2, 9, 9, 4], &mut rng);
    for _ in 0..5 {
        x = conv2d(&x, &w, [1, 1], [1, 1], Strategy::Winograd).unwrap();
        assert_eq!(x.dims(), &[2, 9, 9, 4]);
    }
}
