use std::path::Path;

use plotters::prelude::*;

use crate::compare::RatioMatrix;
use crate::error::{Error, Result};

// Heat-map rendering
//
// One PNG per batch size. Cells are colored with a diverging red-white-blue
// map (ColorBrewer RdBu) normalized to the matrix's own finite min/max:
// red where Winograd is faster, blue where it is slower. Row 0 (the
// smallest spatial size) is drawn at the top, matching the sweep's row
// order. A vertical colorbar on the right carries min/mid/max labels.
//
// Every figure gets its own drawing area, created and dropped inside the
// call; nothing is shared between successive renders.

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const COLORBAR_WIDTH: u32 = 110;

/// Image filename for one batch size, e.g. `winograd_vs_direct_batch8.png`.
pub fn heatmap_filename(batch: usize) -> String {
    format!("winograd_vs_direct_batch{batch}.png")
}

fn draw_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

/// ColorBrewer RdBu diverging map, t in [0, 1] (0 = red, 1 = blue).
fn rdbu(t: f64) -> RGBColor {
    const STOPS: [(u8, u8, u8); 7] = [
        (178, 24, 43),
        (239, 138, 98),
        (253, 219, 199),
        (247, 247, 247),
        (209, 229, 240),
        (103, 169, 207),
        (33, 102, 172),
    ];
    let t = t.clamp(0.0, 1.0);
    let pos = t * (STOPS.len() - 1) as f64;
    let idx = (pos.floor() as usize).min(STOPS.len() - 2);
    let frac = pos - idx as f64;
    let (r0, g0, b0) = STOPS[idx];
    let (r1, g1, b1) = STOPS[idx + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Color for one cell value. Infinities clamp to the end colors; NaN gets
/// a neutral gray so a 0/0 ratio is visible rather than invisible.
fn cell_color(v: f64, lo: f64, hi: f64) -> RGBColor {
    if v.is_nan() {
        return RGBColor(128, 128, 128);
    }
    let t = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
    rdbu(t.clamp(0.0, 1.0))
}

/// Tick label for an integer cell center; fractional tick positions get no
/// label.
fn index_label(v: f64, labels: &[usize]) -> String {
    let r = v.round();
    if (v - r).abs() > 1e-6 || r < 0.0 {
        return String::new();
    }
    labels
        .get(r as usize)
        .map(|l| l.to_string())
        .unwrap_or_default()
}

/// Render one ratio matrix as a heat-map PNG at `path`, silently
/// overwriting any existing file.
pub fn render_heatmap(matrix: &RatioMatrix, path: &Path) -> Result<()> {
    let rows = matrix.rows();
    let cols = matrix.cols();
    let (lo, hi) = match matrix.finite_range() {
        Some((lo, hi)) if lo < hi => (lo, hi),
        // Flat (or fully non-finite) data still renders; widen the range so
        // the colorbar has something to say.
        Some((lo, hi)) => (lo - 0.5, hi + 0.5),
        None => (0.0, 1.0),
    };

    // Row 0 is drawn at the top: plotted y = rows - 1 - i.
    let flipped_spatial: Vec<usize> = matrix.spatial.iter().rev().copied().collect();

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let (chart_area, bar_area) = root.split_horizontally(WIDTH - COLORBAR_WIDTH);

    let mut chart = ChartBuilder::on(&chart_area)
        .caption(
            "Conv 2D: (Time Winograd / Time Direct)",
            ("sans-serif", 22),
        )
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(
            -0.5f64..cols as f64 - 0.5,
            -0.5f64..rows as f64 - 0.5,
        )
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols)
        .y_labels(rows)
        .x_desc("Channels In/Out")
        .y_desc("Height/Width")
        .x_label_formatter(&|v| index_label(*v, &matrix.channels))
        .y_label_formatter(&|v| index_label(*v, &flipped_spatial))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series((0..rows).flat_map(|i| (0..cols).map(move |j| (i, j))).map(
            |(i, j)| {
                let color = cell_color(matrix.get(i, j), lo, hi);
                let x = j as f64;
                let y = (rows - 1 - i) as f64;
                Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
            },
        ))
        .map_err(draw_err)?;

    draw_colorbar(&bar_area, lo, hi)?;
    root.present().map_err(draw_err)?;
    Ok(())
}

/// Vertical gradient strip with min/mid/max labels, high values at the top.
fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    lo: f64,
    hi: f64,
) -> Result<()> {
    let (_, bh) = area.dim_in_pixel();
    let (x0, x1) = (15i32, 40i32);
    let top = 60i32;
    let bottom = bh as i32 - 50;

    for y in top..bottom {
        let t = 1.0 - (y - top) as f64 / (bottom - top - 1).max(1) as f64;
        area.draw(&Rectangle::new([(x0, y), (x1, y + 1)], rdbu(t).filled()))
            .map_err(draw_err)?;
    }
    area.draw(&Rectangle::new([(x0, top), (x1, bottom)], BLACK.stroke_width(1)))
        .map_err(draw_err)?;

    let font = ("sans-serif", 15).into_font();
    let ticks = [
        (hi, top),
        ((lo + hi) / 2.0, (top + bottom) / 2),
        (lo, bottom),
    ];
    for (value, y) in ticks {
        area.draw(&Text::new(format!("{value:.3}"), (x1 + 6, y - 7), font.clone()))
            .map_err(draw_err)?;
    }
    Ok(())
}
