//! Horizontal annotation bands: age-date callouts and free-form grouping
//! callouts, drawn above or below the strip stack at depth-aligned
//! positions.

use anyhow::{Result, ensure};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// Tick stub dropped from a band label towards the strips, pixels.
const TICK_LEN: i32 = 5;

/// Pair annotation depths with their labels, keeping only those inside the
/// depth axis range.
pub fn paired(
    depths: &[f64],
    labels: &[String],
    depth_min: f64,
    depth_max: f64,
) -> Result<Vec<(f64, String)>> {
    ensure!(
        depths.len() == labels.len(),
        "annotation depths and labels differ in length ({} vs {})",
        depths.len(),
        labels.len()
    );
    Ok(depths
        .iter()
        .zip(labels)
        .filter(|(d, _)| **d >= depth_min && **d <= depth_max)
        .map(|(d, l)| (*d, l.clone()))
        .collect())
}

/// Draw one band of depth-aligned labels. `x_of` maps a depth to a pixel
/// column in the band's coordinate space; `ticks_down` points the tick stubs
/// at the strips below (band above the stack) or above (band below it).
pub fn draw_band<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    items: &[(f64, String)],
    x_of: impl Fn(f64) -> i32,
    font_px: u32,
    color: RGBColor,
    ticks_down: bool,
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let (_, band_h) = area.dim_in_pixel();
    let band_h = band_h as i32;
    let style = (FontFamily::SansSerif, font_px as f64)
        .into_font()
        .color(&color)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for (depth, label) in items {
        let x = x_of(*depth);
        let (tick_y0, tick_y1, text_y) = if ticks_down {
            (band_h - TICK_LEN, band_h, band_h / 2 - TICK_LEN / 2)
        } else {
            (0, TICK_LEN, band_h / 2 + TICK_LEN / 2)
        };
        area.draw(&PathElement::new(
            vec![(x, tick_y0), (x, tick_y1)],
            color.stroke_width(1),
        ))
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        area.draw(&Text::new(label.clone(), (x, text_y), style.clone()))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    Ok(())
}
