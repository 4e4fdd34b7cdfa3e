//! Figure rendering: one vertically-stacked strip per taxon, sized by the
//! scaling ratios, plus stack strips and the zone column, written to
//! **SVG**, **PNG** or **PDF**.
//!
//! - Strip heights come straight from [`crate::scaling`]; the drawing code
//!   is one loop over the strip list, whatever its length
//! - Graph types 1–7 dispatch through a single `match` per strip
//! - Zone boundaries, age dates and grouping callouts overlay the stack
//! - PDF output renders the SVG in memory and converts it

pub mod annotations;
pub mod layout;
pub mod text;
pub mod types;
pub mod zones;

pub use types::{FigureModel, Strip, StripContent};

use crate::config::{AgeSide, Settings};
use crate::models::TaxonStyle;
use crate::style::{ExaggerationStyle, Frame, GraphType, LineStyle, MarkerShape, palette_color};

use anyhow::{Result, ensure};
use log::info;

use plotters::chart::ChartContext;
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::series::{AreaSeries, DashedLineSeries, LineSeries};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontTransform};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::{Path, PathBuf};
use std::sync::Once;

use layout::{AXIS_BAND, strip_breakpoints};
use text::{estimate_text_width_px, truncate_to_width};

/// One-time registration of the bundled fallback font for the `ab_glyph`
/// text path, which does not discover OS fonts.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let _ = plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
    });
}

/// Nominal screen resolution; `png dpi` scales the bitmap relative to this.
const BASE_DPI: f64 = 96.0;

/// Width reserved for the abundance tick labels left of each strip.
const TICK_AREA: u32 = 48;
/// Right margin past the last depth sample.
const RIGHT_MARGIN: u32 = 16;
/// Height of the age/callout annotation bands.
const BAND_H: u32 = 26;

/// Everything pixel-sized goes through this so PNG output can scale with
/// the configured DPI while SVG/PDF stay at nominal size.
#[derive(Clone, Copy)]
struct Geom {
    scale: f64,
}

impl Geom {
    fn px(&self, v: u32) -> u32 {
        (v as f64 * self.scale).round().max(1.0) as u32
    }
    fn font(&self, v: u32) -> f64 {
        v as f64 * self.scale
    }
}

/// Render the figure into every enabled output format, returning the paths
/// written.
pub fn render_diagram(
    dir: &Path,
    settings: &Settings,
    model: &FigureModel,
) -> Result<Vec<PathBuf>> {
    ensure_fonts_registered();
    let base = &settings.files.output_file;
    let (w, h) = (settings.figure.width, settings.figure.height);
    let mut written = Vec::new();

    if settings.files.svg_output {
        let path = dir.join(format!("{base}.svg"));
        let path_string = path.to_string_lossy().into_owned();
        let root = SVGBackend::new(path_string.as_str(), (w, h)).into_drawing_area();
        draw_figure(root, model, settings, 1.0)?;
        info!("wrote {}", path.display());
        written.push(path);
    }

    if settings.files.png_output {
        let scale = settings.files.png_dpi as f64 / BASE_DPI;
        let dims = (
            (w as f64 * scale).round() as u32,
            (h as f64 * scale).round() as u32,
        );
        let path = dir.join(format!("{base}.png"));
        let path_string = path.to_string_lossy().into_owned();
        let root = BitMapBackend::new(path_string.as_str(), dims).into_drawing_area();
        draw_figure(root, model, settings, scale)?;
        info!("wrote {}", path.display());
        written.push(path);
    }

    if settings.files.pdf_output {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (w, h)).into_drawing_area();
            draw_figure(root, model, settings, 1.0)?;
        }
        let pdf = svg_to_pdf(&svg)?;
        let path = dir.join(format!("{base}.pdf"));
        std::fs::write(&path, pdf)?;
        info!("wrote {}", path.display());
        written.push(path);
    }

    ensure!(
        !written.is_empty(),
        "all output formats are switched off; enable at least one of `png output`, `pdf output`, `svg output`"
    );
    Ok(written)
}

/// Convert an in-memory SVG document to PDF bytes.
fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    use svg2pdf::usvg;
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|e| anyhow::anyhow!("usvg parse failed: {e}"))?;
    let pdf = svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| anyhow::anyhow!("svg2pdf conversion failed: {e}"))?;
    Ok(pdf)
}

type StripChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Draw the whole figure onto one backend.
fn draw_figure<DB>(
    root: DrawingArea<DB, Shift>,
    model: &FigureModel,
    settings: &Settings,
    scale: f64,
) -> Result<()>
where
    DB: DrawingBackend,
{
    let g = Geom { scale };
    let whole = root.clone();
    root.fill(&WHITE).map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let mut work = root;
    let title = settings.figure.title.trim();
    if !title.is_empty() {
        work = work
            .titled(
                title,
                (FontFamily::SansSerif, g.font(settings.figure.title_size)),
            )
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }

    // Title column width: the longest strip title when horizontal, one line
    // height when rotated.
    let rotated = settings.figure.label_rotation != 0;
    let title_font = settings.figure.font_size;
    let title_w = if rotated {
        g.px(title_font + 10)
    } else {
        let widest = model
            .strips
            .iter()
            .map(|s| estimate_text_width_px(&s.title, title_font))
            .max()
            .unwrap_or(60);
        g.px(widest.clamp(60, 220) + 8)
    };

    // Annotation bands split off before the strips.
    let mut callout_band: Option<DrawingArea<DB, Shift>> = None;
    if settings.callouts.enabled {
        let (band, rest) = work.split_vertically(g.px(BAND_H));
        callout_band = Some(band);
        work = rest;
    }
    let mut age_band: Option<DrawingArea<DB, Shift>> = None;
    let mut age_band_on_top = false;
    if settings.ages.enabled {
        match settings.ages.side {
            AgeSide::Top => {
                let (band, rest) = work.split_vertically(g.px(BAND_H));
                age_band = Some(band);
                age_band_on_top = true;
                work = rest;
            }
            AgeSide::Bottom => {
                let (_, stack_h) = work.dim_in_pixel();
                let (rest, band) = work.split_vertically(stack_h.saturating_sub(g.px(BAND_H)));
                age_band = Some(band);
                work = rest;
            }
        }
    }

    // Strip stack.
    let (_, stack_h) = work.dim_in_pixel();
    let ratios: Vec<f64> = model.strips.iter().map(|s| s.ratio).collect();
    let breaks = strip_breakpoints(&ratios, stack_h, g.px(AXIS_BAND));
    let areas = work.split_by_breakpoints(Vec::<u32>::new(), breaks);

    let last = model.strips.len() - 1;
    for (i, strip) in model.strips.iter().enumerate() {
        let area = &areas[i];
        let is_bottom = i == last;
        let (title_area, plot_area) = area.split_horizontally(title_w);
        draw_strip_title(&title_area, &strip.title, g.font(title_font), rotated)?;

        let x_range = if settings.depth.reverse {
            model.depth_max..model.depth_min
        } else {
            model.depth_min..model.depth_max
        };

        let (y_min, y_max) = match &strip.content {
            StripContent::Taxon { y_min, y_max, .. } => (*y_min, *y_max),
            StripContent::Stack { y_max, .. } => (0.0, *y_max),
            StripContent::Zones => (0.0, 1.0),
        };

        let mut builder = ChartBuilder::on(&plot_area);
        builder
            .margin_top(g.px(settings.figure.strip_gap))
            .margin_right(g.px(RIGHT_MARGIN))
            .set_label_area_size(LabelAreaPosition::Left, g.px(TICK_AREA));
        if is_bottom {
            builder.set_label_area_size(LabelAreaPosition::Bottom, g.px(AXIS_BAND));
        }
        let mut chart = builder
            .build_cartesian_2d(x_range, y_min..y_max)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;

        configure_strip_mesh(&mut chart, strip, settings, &g, is_bottom, model)?;

        match &strip.content {
            StripContent::Taxon { values, style, .. } => {
                draw_taxon_strip(
                    &mut chart, model, values, style, settings, &g, y_min, y_max,
                )?;
            }
            StripContent::Stack {
                groups, colours, ..
            } => {
                draw_stack_strip(&mut chart, &model.depths, groups, colours)?;
                if settings.zones.lines {
                    zones::draw_zone_lines(&mut chart, &model.zones, &settings.zones, y_min, y_max)?;
                }
            }
            StripContent::Zones => {
                let (plot_w, _) = plot_area.dim_in_pixel();
                let inner_w = plot_w.saturating_sub(g.px(TICK_AREA) + g.px(RIGHT_MARGIN));
                zones::draw_zone_strip(
                    &mut chart,
                    &model.zones,
                    &settings.zones,
                    model.depth_min,
                    model.depth_max,
                    inner_w,
                )?;
            }
        }
    }

    // Depth → pixel column, for the annotation bands.
    let (figure_w, _) = whole.dim_in_pixel();
    let plot_x0 = (title_w + g.px(TICK_AREA)) as f64;
    let plot_x1 = (figure_w - g.px(RIGHT_MARGIN)) as f64;
    let span = model.depth_max - model.depth_min;
    let reverse = settings.depth.reverse;
    let x_of = move |d: f64| -> i32 {
        let frac = (d - model.depth_min) / span;
        let frac = if reverse { 1.0 - frac } else { frac };
        (plot_x0 + frac * (plot_x1 - plot_x0)).round() as i32
    };

    if let Some(band) = callout_band {
        let items = annotations::paired(
            &settings.callouts.depths,
            &settings.callouts.labels,
            model.depth_min,
            model.depth_max,
        )?;
        annotations::draw_band(
            &band,
            &items,
            &x_of,
            g.px(settings.callouts.size),
            BLACK,
            true,
        )?;
    }
    if let Some(band) = age_band {
        let items = annotations::paired(
            &settings.ages.depths,
            &settings.ages.labels,
            model.depth_min,
            model.depth_max,
        )?;
        annotations::draw_band(
            &band,
            &items,
            &x_of,
            g.px(settings.ages.label_size),
            palette_color(settings.ages.colour),
            age_band_on_top,
        )?;
    }

    whole.present().map_err(|e| anyhow::anyhow!("{:?}", e))?;
    Ok(())
}

/// Axes, tick labels and the optional box frame for one strip.
fn configure_strip_mesh<DB: DrawingBackend>(
    chart: &mut StripChart<'_, DB>,
    strip: &Strip,
    settings: &Settings,
    g: &Geom,
    is_bottom: bool,
    model: &FigureModel,
) -> Result<()> {
    let frame = match &strip.content {
        StripContent::Taxon { style, .. } => style.frame,
        _ => Frame::Spine,
    };
    if frame == Frame::None && !is_bottom {
        return Ok(());
    }

    let depth_span = model.depth_max - model.depth_min;
    let x_prec = if depth_span < 10.0 { 1 } else { 0 };
    let x_labels = if settings.depth.tick_interval > 0.0 {
        ((depth_span / settings.depth.tick_interval) as usize + 1).clamp(2, 24)
    } else {
        10
    };
    let hide_y = matches!(strip.content, StripContent::Zones) || frame == Frame::None;
    let y_labels = match &strip.content {
        _ if hide_y => 0,
        StripContent::Taxon {
            style,
            y_max,
            y_min,
            ..
        } if style.tick_interval > 0.0 => {
            (((y_max - y_min) / style.tick_interval) as usize + 1).clamp(2, 8)
        }
        _ => 3,
    };

    let y_fmt = move |v: &f64| if hide_y { String::new() } else { format_tick(*v) };
    let x_fmt = move |v: &f64| format!("{:.*}", x_prec, v);

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .disable_y_mesh()
        .y_labels(y_labels)
        .y_label_formatter(&y_fmt)
        .label_style((FontFamily::SansSerif, g.font(settings.figure.font_size) - 2.0));
    if is_bottom {
        mesh.x_labels(x_labels)
            .x_desc(settings.depth.label.as_str())
            .x_label_formatter(&x_fmt)
            .axis_desc_style((FontFamily::SansSerif, g.font(settings.figure.font_size)));
    } else {
        mesh.x_labels(0);
    }
    mesh.draw().map_err(|e| anyhow::anyhow!("{:?}", e))?;

    if frame == Frame::Box {
        let (y_min, y_max) = match &strip.content {
            StripContent::Taxon { y_min, y_max, .. } => (*y_min, *y_max),
            StripContent::Stack { y_max, .. } => (0.0, *y_max),
            StripContent::Zones => (0.0, 1.0),
        };
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(model.depth_min, y_min), (model.depth_max, y_max)],
                BLACK.stroke_width(1),
            )))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    Ok(())
}

/// Abundance tick labels: whole numbers above ten, one decimal below.
fn format_tick(v: f64) -> String {
    if v.abs() >= 10.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

/// One taxon strip: optional exaggerated overlay, the main series per graph
/// type, then zone lines on top.
#[allow(clippy::too_many_arguments)]
fn draw_taxon_strip<DB: DrawingBackend>(
    chart: &mut StripChart<'_, DB>,
    model: &FigureModel,
    values: &[f64],
    style: &TaxonStyle,
    settings: &Settings,
    g: &Geom,
    y_min: f64,
    y_max: f64,
) -> Result<()> {
    let depths = model.depths.as_slice();
    let main = palette_color(style.main_colour);
    let fill = palette_color(style.fill_colour);
    let baseline = 0.0_f64.clamp(y_min, y_max);
    let points: Vec<(f64, f64)> = depths.iter().copied().zip(values.iter().copied()).collect();

    if style.exaggeration > 0.0 {
        let exagg_color = palette_color(settings.exaggeration.colour);
        let exagg: Vec<(f64, f64)> = points
            .iter()
            .map(|(d, v)| (*d, (v * style.exaggeration).min(y_max)))
            .collect();
        match style.exaggeration_style {
            ExaggerationStyle::Line => {
                draw_styled_path(
                    chart,
                    exagg,
                    settings.exaggeration.line_style,
                    g.px(1),
                    exagg_color,
                )?;
            }
            ExaggerationStyle::Fill => {
                chart
                    .draw_series(
                        AreaSeries::new(exagg, baseline, exagg_color.mix(0.25).filled())
                            .border_style(exagg_color.stroke_width(1)),
                    )
                    .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            }
        }
    }

    let line_width = g.px(style.line_width);
    match style.graph_type {
        GraphType::Bar | GraphType::BarLine => {
            let bar_w = if style.bar_width > 0.0 {
                style.bar_width
            } else {
                auto_bar_width(depths)
            };
            chart
                .draw_series(points.iter().map(|(d, v)| {
                    Rectangle::new([(d - bar_w / 2.0, baseline), (d + bar_w / 2.0, *v)], fill.filled())
                }))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            chart
                .draw_series(points.iter().map(|(d, v)| {
                    Rectangle::new(
                        [(d - bar_w / 2.0, baseline), (d + bar_w / 2.0, *v)],
                        main.stroke_width(1),
                    )
                }))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            if style.graph_type == GraphType::BarLine {
                draw_styled_path(chart, points.clone(), style.line_style, line_width, main)?;
            }
        }
        GraphType::Line => {
            draw_styled_path(chart, points.clone(), style.line_style, line_width, main)?;
        }
        GraphType::LineFill | GraphType::StackedArea => {
            // A single-series stacked area degenerates to a filled curve.
            chart
                .draw_series(
                    AreaSeries::new(points.clone(), baseline, fill.mix(0.4).filled())
                        .border_style(main.stroke_width(line_width)),
                )
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        GraphType::LineMarker => {
            draw_styled_path(chart, points.clone(), style.line_style, line_width, main)?;
            draw_markers(chart, &points, style.marker, g.px(style.marker_size), main)?;
        }
        GraphType::Marker => {
            draw_markers(chart, &points, style.marker, g.px(style.marker_size), main)?;
        }
    }

    if settings.zones.lines {
        zones::draw_zone_lines(chart, &model.zones, &settings.zones, y_min, y_max)?;
    }
    Ok(())
}

/// Stacked area strip: cumulative polygons bottom-up in group label order.
fn draw_stack_strip<DB: DrawingBackend>(
    chart: &mut StripChart<'_, DB>,
    depths: &[f64],
    groups: &[(u8, Vec<f64>)],
    colours: &[u8],
) -> Result<()> {
    let rows = depths.len();
    let mut cum = vec![0.0_f64; rows];
    for (label, values) in groups {
        let color = palette_color(colours[(*label as usize - 1).min(colours.len() - 1)]);
        let mut lower: Vec<(f64, f64)> = Vec::with_capacity(rows);
        let mut upper: Vec<(f64, f64)> = Vec::with_capacity(rows);
        for (i, v) in values.iter().enumerate() {
            lower.push((depths[i], cum[i]));
            cum[i] += v.max(0.0);
            upper.push((depths[i], cum[i]));
        }
        let mut poly: Vec<(f64, f64)> = Vec::with_capacity(rows * 2);
        poly.extend(lower.iter().copied());
        poly.extend(upper.iter().rev().copied());
        chart
            .draw_series(std::iter::once(Polygon::new(poly, color.filled())))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                upper,
                color.stroke_width(1),
            )))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    Ok(())
}

/// Draw a polyline in one of the four dash patterns. Dash-dot is rendered
/// as a medium dash; Plotters has no compound pattern.
pub(crate) fn draw_styled_path<DB: DrawingBackend>(
    chart: &mut StripChart<'_, DB>,
    points: Vec<(f64, f64)>,
    line_style: LineStyle,
    width: u32,
    color: RGBColor,
) -> Result<()> {
    let style = color.stroke_width(width);
    match line_style {
        LineStyle::Solid => {
            chart
                .draw_series(LineSeries::new(points, style))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        LineStyle::Dash => {
            chart
                .draw_series(DashedLineSeries::new(points.into_iter(), 8, 4, style))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        LineStyle::Dot => {
            chart
                .draw_series(DashedLineSeries::new(points.into_iter(), 2, 4, style))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        LineStyle::DashDot => {
            chart
                .draw_series(DashedLineSeries::new(points.into_iter(), 10, 6, style))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
    }
    Ok(())
}

/// Draw one marker per sample in the taxon's configured shape.
fn draw_markers<DB: DrawingBackend>(
    chart: &mut StripChart<'_, DB>,
    points: &[(f64, f64)],
    shape: MarkerShape,
    size: u32,
    color: RGBColor,
) -> Result<()> {
    let s = size as i32;
    let filled: ShapeStyle = color.filled();
    let stroke: ShapeStyle = color.stroke_width(1);
    match shape {
        MarkerShape::Circle => {
            chart
                .draw_series(points.iter().map(|(x, y)| Circle::new((*x, *y), size, filled)))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        MarkerShape::Square => {
            chart
                .draw_series(points.iter().map(|(x, y)| {
                    EmptyElement::at((*x, *y)) + Rectangle::new([(-s, -s), (s, s)], filled)
                }))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        MarkerShape::Triangle => {
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|(x, y)| TriangleMarker::new((*x, *y), size, filled)),
                )
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        MarkerShape::Diamond => {
            chart
                .draw_series(points.iter().map(|(x, y)| {
                    EmptyElement::at((*x, *y))
                        + Polygon::new(vec![(0, -s), (s, 0), (0, s), (-s, 0)], filled)
                }))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        MarkerShape::Cross => {
            chart
                .draw_series(points.iter().map(|(x, y)| {
                    EmptyElement::at((*x, *y))
                        + PathElement::new(vec![(-s, 0), (s, 0)], stroke)
                        + PathElement::new(vec![(0, -s), (0, s)], stroke)
                }))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        MarkerShape::X => {
            chart
                .draw_series(points.iter().map(|(x, y)| Cross::new((*x, *y), size, stroke)))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
    }
    Ok(())
}

/// Bar thickness when the metadata leaves it automatic: 80% of the median
/// sample spacing.
fn auto_bar_width(depths: &[f64]) -> f64 {
    let mut diffs: Vec<f64> = depths.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    if diffs.is_empty() {
        return 1.0;
    }
    diffs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    0.8 * diffs[diffs.len() / 2]
}

/// Strip title, horizontal or turned a quarter anti-clockwise. Plotters only
/// supports quarter-turn text, so any non-zero rotation renders vertical.
fn draw_strip_title<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    font_px: f64,
    rotated: bool,
) -> Result<()> {
    if title.is_empty() {
        return Ok(());
    }
    let (w, h) = area.dim_in_pixel();
    let fit = if rotated { h } else { w };
    let text = truncate_to_width(title, font_px as u32, fit.saturating_sub(4));
    let font = FontDesc::from((FontFamily::SansSerif, font_px));
    let font = if rotated {
        font.transform(FontTransform::Rotate270)
    } else {
        font
    };
    let style = font
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(text, (w as i32 / 2, h as i32 / 2), style))
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    Ok(())
}
