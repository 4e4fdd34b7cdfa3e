//! Fixed style lookup tables shared by the data loader and the renderer.
//!
//! Per-taxon aesthetics arrive in the data file as small integer codes
//! (palette slot 1–23, line style 1–4, marker 1–6, graph type 1–7). This
//! module owns the code → value mappings and their validation, so the loader
//! can reject an out-of-range code with a message naming the taxon instead
//! of falling back silently at render time.

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Diagram palette, indexed by 1-based codes in the metadata rows.
/// First ten entries are the Microsoft Office (2013+) chart series palette
/// in its standard order, followed by thirteen common stratigraphic fills.
const PALETTE23: [RGBColor; 23] = [
    RGBColor(68, 114, 196),  // 1  blue       (#4472C4)
    RGBColor(237, 125, 49),  // 2  orange     (#ED7D31)
    RGBColor(165, 165, 165), // 3  gray       (#A5A5A5)
    RGBColor(255, 192, 0),   // 4  gold       (#FFC000)
    RGBColor(91, 155, 213),  // 5  light blue (#5B9BD5)
    RGBColor(112, 173, 71),  // 6  green      (#70AD47)
    RGBColor(38, 68, 120),   // 7  dark blue  (#264478)
    RGBColor(158, 72, 14),   // 8  dark org.  (#9E480E)
    RGBColor(99, 99, 99),    // 9  dark gray  (#636363)
    RGBColor(153, 115, 0),   // 10 brownish   (#997300)
    RGBColor(0, 0, 0),       // 11 black
    RGBColor(255, 255, 255), // 12 white
    RGBColor(192, 0, 0),     // 13 dark red
    RGBColor(255, 0, 0),     // 14 red
    RGBColor(146, 208, 80),  // 15 light green
    RGBColor(0, 176, 80),    // 16 mid green
    RGBColor(0, 176, 240),   // 17 cyan
    RGBColor(0, 32, 96),     // 18 navy
    RGBColor(112, 48, 160),  // 19 purple
    RGBColor(132, 60, 12),   // 20 brown
    RGBColor(191, 143, 0),   // 21 ochre
    RGBColor(217, 217, 217), // 22 light gray
    RGBColor(37, 94, 145),   // 23 steel blue
];

/// Resolve a 1-based palette code. Codes are validated at load time, so the
/// renderer may call this with a known-good code.
#[inline]
pub fn palette_color(code: u8) -> RGBColor {
    PALETTE23[(code as usize - 1) % PALETTE23.len()]
}

/// Validate a 1-based palette code from a metadata row or config entry.
pub fn parse_palette_code(raw: f64) -> Option<u8> {
    let code = raw as i64;
    if (raw - code as f64).abs() > f64::EPSILON {
        return None;
    }
    (1..=23).contains(&code).then_some(code as u8)
}

/// How a taxon's abundance curve is drawn, selected by code 1–7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphType {
    /// 1: bar per depth sample.
    Bar,
    /// 2: bars with a connecting line on top.
    BarLine,
    /// 3: plain line.
    Line,
    /// 4: line with the area to the baseline filled.
    LineFill,
    /// 5: line with a marker at each sample.
    LineMarker,
    /// 6: markers only.
    Marker,
    /// 7: stacked area (used by the stack-group strips).
    StackedArea,
}

impl GraphType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(GraphType::Bar),
            2 => Some(GraphType::BarLine),
            3 => Some(GraphType::Line),
            4 => Some(GraphType::LineFill),
            5 => Some(GraphType::LineMarker),
            6 => Some(GraphType::Marker),
            7 => Some(GraphType::StackedArea),
            _ => None,
        }
    }
}

/// Line dash pattern, selected by code 1–4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dash,
    Dot,
    DashDot,
}

impl LineStyle {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(LineStyle::Solid),
            2 => Some(LineStyle::Dash),
            3 => Some(LineStyle::Dot),
            4 => Some(LineStyle::DashDot),
            _ => None,
        }
    }
}

/// Marker shape for sample points, selected by code 1–6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerShape {
    Circle,
    Square,
    Triangle,
    Diamond,
    Cross,
    X,
}

impl MarkerShape {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MarkerShape::Circle),
            2 => Some(MarkerShape::Square),
            3 => Some(MarkerShape::Triangle),
            4 => Some(MarkerShape::Diamond),
            5 => Some(MarkerShape::Cross),
            6 => Some(MarkerShape::X),
            _ => None,
        }
    }
}

/// How an exaggerated copy of a low-abundance curve is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExaggerationStyle {
    /// 1: outline only.
    Line,
    /// 2: translucent fill.
    Fill,
}

impl ExaggerationStyle {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ExaggerationStyle::Line),
            2 => Some(ExaggerationStyle::Fill),
            _ => None,
        }
    }
}

/// Per-strip frame, selected by code 0–2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    /// 0: no frame at all.
    None,
    /// 1: abundance axis spine only.
    Spine,
    /// 2: full box around the strip.
    Box,
}

impl Frame {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Frame::None),
            1 => Some(Frame::Spine),
            2 => Some(Frame::Box),
            _ => None,
        }
    }
}
