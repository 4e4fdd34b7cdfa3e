use serde::{Deserialize, Serialize};

use crate::style::{ExaggerationStyle, Frame, GraphType, LineStyle, MarkerShape};

/// Per-taxon aesthetics, parsed from the metadata rows at the top of the
/// data file. One block per taxon column; rows not present fall back to
/// these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonStyle {
    pub graph_type: GraphType,
    /// 1-based palette code for lines/markers/bar outlines.
    pub main_colour: u8,
    /// 1-based palette code for filled areas and bar interiors.
    pub fill_colour: u8,
    pub line_style: LineStyle,
    pub line_width: u32,
    /// Bar thickness along the depth axis, in depth units.
    pub bar_width: f64,
    pub marker: MarkerShape,
    pub marker_size: u32,
    /// Multiplier for the exaggerated overlay; 0 disables it.
    pub exaggeration: f64,
    pub exaggeration_style: ExaggerationStyle,
    /// Stack scheme 1 group label, 0 = not a member.
    pub stack_group_1: u8,
    /// Stack scheme 2 group label, 0 = not a member.
    pub stack_group_2: u8,
    pub frame: Frame,
    /// Abundance-axis tick interval override; 0 = automatic.
    pub tick_interval: f64,
}

impl Default for TaxonStyle {
    fn default() -> Self {
        Self {
            graph_type: GraphType::Line,
            main_colour: 11, // black
            fill_colour: 3,  // gray
            line_style: LineStyle::Solid,
            line_width: 1,
            bar_width: 0.0,
            marker: MarkerShape::Circle,
            marker_size: 3,
            exaggeration: 0.0,
            exaggeration_style: ExaggerationStyle::Line,
            stack_group_1: 0,
            stack_group_2: 0,
            frame: Frame::Spine,
            tick_interval: 0.0,
        }
    }
}

/// A named abundance series over depth. Identity is the column name;
/// immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxon {
    pub name: String,
    pub values: Vec<f64>,
    pub style: TaxonStyle,
}

/// A depth boundary declared in the trailing `Zones` column. The label names
/// the interval that starts at this boundary (reading down-core).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub depth: f64,
    pub label: String,
}

/// Everything read from the primary (and optional extra) data file.
/// One value per taxon per depth row; strictly read-only after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub depths: Vec<f64>,
    pub taxa: Vec<Taxon>,
    pub zones: Vec<Zone>,
}

impl Dataset {
    pub fn taxon(&self, name: &str) -> Option<&Taxon> {
        self.taxa.iter().find(|t| t.name == name)
    }

    /// Depth range of the loaded rows as (shallowest, deepest).
    pub fn depth_range(&self) -> Option<(f64, f64)> {
        let first = self.depths.first()?;
        let (mut lo, mut hi) = (*first, *first);
        for d in &self.depths {
            lo = lo.min(*d);
            hi = hi.max(*d);
        }
        Some((lo, hi))
    }
}
