//! Strip layout: turn the ratio list into pixel heights.
//!
//! One loop over the ratios, whatever their count; the bottom strip gets an
//! extra band for the shared depth axis labels.

/// Pixel height of the depth-axis label band attached to the bottom strip.
pub const AXIS_BAND: u32 = 44;

/// Split `total` pixels across strips in proportion to `ratios`, reserving
/// `axis_band` extra for the last strip. Returns the interior breakpoints
/// (cumulative y offsets) suitable for `DrawingArea::split_by_breakpoints`;
/// the result has `ratios.len() - 1` entries.
pub fn strip_breakpoints(ratios: &[f64], total: u32, axis_band: u32) -> Vec<u32> {
    assert!(!ratios.is_empty());
    let sum: f64 = ratios.iter().sum();
    let usable = total.saturating_sub(axis_band) as f64;
    let mut breaks = Vec::with_capacity(ratios.len() - 1);
    let mut acc = 0.0;
    for r in &ratios[..ratios.len() - 1] {
        acc += r / sum * usable;
        breaks.push(acc.round() as u32);
    }
    breaks
}
