//! Zone boundary lines and the zone label column.

use anyhow::Result;
use plotters::chart::ChartContext;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::ZoneSettings;
use crate::models::Zone;
use crate::style::palette_color;

use super::draw_styled_path;
use super::text::truncate_to_width;

/// Midpoint label positions for the intervals the boundaries cut out of the
/// depth range. A boundary's label names the interval that starts at it;
/// whatever lies before the first boundary stays unlabeled.
pub fn interval_labels(zones: &[Zone], depth_min: f64, depth_max: f64) -> Vec<(f64, String)> {
    let mut bounds: Vec<&Zone> = zones
        .iter()
        .filter(|z| z.depth >= depth_min && z.depth <= depth_max)
        .collect();
    bounds.sort_by(|a, b| a.depth.partial_cmp(&b.depth).unwrap());

    let mut labels = Vec::with_capacity(bounds.len());
    for (i, zone) in bounds.iter().enumerate() {
        let end = bounds
            .get(i + 1)
            .map(|z| z.depth)
            .unwrap_or(depth_max);
        labels.push(((zone.depth + end) / 2.0, zone.label.clone()));
    }
    labels
}

/// Draw the boundary lines across one strip.
pub fn draw_zone_lines<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    zones: &[Zone],
    cfg: &ZoneSettings,
    y_min: f64,
    y_max: f64,
) -> Result<()> {
    let color = palette_color(cfg.line_colour);
    for zone in zones {
        draw_styled_path(
            chart,
            vec![(zone.depth, y_min), (zone.depth, y_max)],
            cfg.line_style,
            cfg.line_width,
            color,
        )?;
    }
    Ok(())
}

/// Fill the zone column strip: boundary lines plus one label per interval,
/// truncated to a width that roughly fits between its boundaries.
pub fn draw_zone_strip<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    zones: &[Zone],
    cfg: &ZoneSettings,
    depth_min: f64,
    depth_max: f64,
    plot_width_px: u32,
) -> Result<()> {
    draw_zone_lines(chart, zones, cfg, 0.0, 1.0)?;

    let color = palette_color(cfg.line_colour);
    let style = (FontFamily::SansSerif, cfg.label_size as f64)
        .into_font()
        .color(&color)
        .pos(Pos::new(HPos::Center, VPos::Center));
    let px_per_depth = plot_width_px as f64 / (depth_max - depth_min);

    for (mid, label) in interval_labels(zones, depth_min, depth_max) {
        let interval_px = interval_width(zones, mid, depth_min, depth_max) * px_per_depth;
        let text = truncate_to_width(&label, cfg.label_size, interval_px.max(12.0) as u32);
        chart
            .draw_series(std::iter::once(Text::new(text, (mid, 0.5), style.clone())))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    Ok(())
}

/// Width in depth units of the interval containing `mid`.
fn interval_width(zones: &[Zone], mid: f64, depth_min: f64, depth_max: f64) -> f64 {
    let mut depths: Vec<f64> = zones
        .iter()
        .map(|z| z.depth)
        .filter(|d| *d >= depth_min && *d <= depth_max)
        .collect();
    depths.sort_by(|a, b| a.partial_cmp(b).unwrap());
    depths.push(depth_max);
    let mut start = depth_min;
    for d in depths {
        if mid <= d {
            return d - start;
        }
        start = d;
    }
    depth_max - depth_min
}
