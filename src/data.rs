//! Data loading: primary (and optional extra) CSV → [`Dataset`].
//!
//! Expected layout: first column is a row label, second column `Depth`,
//! then one column per taxon, last column `Zones`. Leading rows whose label
//! matches a style attribute name carry per-taxon aesthetics; every later
//! row is a depth sample. All values are validated on the way in; the
//! loader is the only place a malformed cell can surface, always with the
//! taxon and row named in the message.

use anyhow::{Context, Result, bail, ensure};
use log::warn;
use std::path::Path;

use crate::config::Settings;
use crate::models::{Dataset, Taxon, TaxonStyle, Zone};
use crate::style::{
    ExaggerationStyle, Frame, GraphType, LineStyle, MarkerShape, parse_palette_code,
};

/// Metadata row labels recognised in the leading rows, normalised form.
const STYLE_ROWS: [&str; 14] = [
    "graph type",
    "main colour",
    "fill colour",
    "line style",
    "line width",
    "bar width",
    "marker",
    "marker size",
    "exaggeration",
    "exaggeration style",
    "stack group 1",
    "stack group 2",
    "frame",
    "tick interval",
];

/// Load the primary file plus, when enabled, the extra file, resolving both
/// against the project directory. Columns that are entirely zero are dropped
/// here so the scaling engine never sees them.
pub fn load_dataset(dir: &Path, settings: &Settings) -> Result<Dataset> {
    let primary_path = dir.join(&settings.files.input_file);
    let mut dataset = parse_file(&primary_path)
        .with_context(|| format!("loading data file {}", primary_path.display()))?;

    if settings.files.extra_data {
        let extra_path = dir.join(&settings.files.extra_file);
        let extra = parse_file(&extra_path)
            .with_context(|| format!("loading extra data file {}", extra_path.display()))?;
        merge_extra(&mut dataset, extra)?;
    }

    drop_empty_columns(&mut dataset);
    ensure!(
        !dataset.taxa.is_empty(),
        "no taxon column with any non-zero value remains after loading"
    );
    check_depth_order(&dataset.depths);
    Ok(dataset)
}

/// Parse one data file into a [`Dataset`].
pub fn parse_file(path: &Path) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = rdr.headers()?.clone();
    ensure!(
        headers.len() >= 4,
        "data file needs at least a label column, `Depth`, one taxon and `Zones` ({} columns found)",
        headers.len()
    );
    ensure!(
        headers
            .get(1)
            .is_some_and(|h| h.eq_ignore_ascii_case("depth")),
        "second data column must be named `Depth`, found `{}`",
        headers.get(1).unwrap_or("")
    );
    ensure!(
        headers
            .get(headers.len() - 1)
            .is_some_and(|h| h.eq_ignore_ascii_case("zones")),
        "last data column must be named `Zones`, found `{}`",
        headers.get(headers.len() - 1).unwrap_or("")
    );

    let taxon_names: Vec<String> = headers
        .iter()
        .skip(2)
        .take(headers.len() - 3)
        .map(|h| h.to_string())
        .collect();
    for (i, name) in taxon_names.iter().enumerate() {
        ensure!(!name.is_empty(), "taxon column {} has an empty name", i + 3);
        ensure!(
            !taxon_names[..i].contains(name),
            "duplicate taxon column `{}`",
            name
        );
    }

    let mut styles: Vec<TaxonStyle> = vec![TaxonStyle::default(); taxon_names.len()];
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); taxon_names.len()];
    let mut depths: Vec<f64> = Vec::new();
    let mut zones: Vec<Zone> = Vec::new();
    let mut in_data = false;

    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = idx + 2; // 1-based, after the header
        let label = record.get(0).unwrap_or("").trim();
        let normalised = label.to_ascii_lowercase();

        if STYLE_ROWS.contains(&normalised.as_str()) {
            ensure!(
                !in_data,
                "style row `{}` at line {} appears after the first depth sample",
                label,
                row
            );
            for (t, name) in taxon_names.iter().enumerate() {
                let cell = record.get(t + 2).unwrap_or("").trim();
                apply_style_row(&mut styles[t], &normalised, cell, name)
                    .with_context(|| format!("style row `{}` at line {}", label, row))?;
            }
            continue;
        }

        in_data = true;
        let depth_cell = record.get(1).unwrap_or("").trim();
        let depth: f64 = depth_cell
            .parse()
            .with_context(|| format!("bad depth `{}` at line {}", depth_cell, row))?;
        depths.push(depth);

        for (t, name) in taxon_names.iter().enumerate() {
            let cell = record.get(t + 2).unwrap_or("").trim();
            let v = if cell.is_empty() {
                0.0
            } else {
                cell.parse::<f64>().with_context(|| {
                    format!("bad abundance `{}` for `{}` at line {}", cell, name, row)
                })?
            };
            values[t].push(v);
        }

        let zone_cell = record.get(record.len() - 1).unwrap_or("").trim();
        if !zone_cell.is_empty() {
            zones.push(Zone {
                depth,
                label: zone_cell.to_string(),
            });
        }
    }

    ensure!(!depths.is_empty(), "data file contains no depth samples");

    let taxa = taxon_names
        .into_iter()
        .zip(styles)
        .zip(values)
        .map(|((name, style), values)| Taxon {
            name,
            values,
            style,
        })
        .collect();

    Ok(Dataset {
        depths,
        taxa,
        zones,
    })
}

/// Apply one metadata cell to a taxon's style block.
fn apply_style_row(style: &mut TaxonStyle, attr: &str, cell: &str, taxon: &str) -> Result<()> {
    // Blank cells keep the default, except stack group labels where a blank
    // is indistinguishable from a forgotten membership and must abort.
    if cell.is_empty() {
        if attr.starts_with("stack group") {
            bail!("`{}` has no {} label; use 0 for non-members", taxon, attr);
        }
        return Ok(());
    }
    let num: f64 = cell
        .parse()
        .with_context(|| format!("bad value `{}` for `{}`", cell, taxon))?;
    let code = num as u8;
    match attr {
        "graph type" => {
            style.graph_type = GraphType::from_code(code)
                .with_context(|| format!("`{}`: graph type must be 1-7, got {}", taxon, cell))?;
        }
        "main colour" => {
            style.main_colour = parse_palette_code(num)
                .with_context(|| format!("`{}`: colour must be 1-23, got {}", taxon, cell))?;
        }
        "fill colour" => {
            style.fill_colour = parse_palette_code(num)
                .with_context(|| format!("`{}`: colour must be 1-23, got {}", taxon, cell))?;
        }
        "line style" => {
            style.line_style = LineStyle::from_code(code)
                .with_context(|| format!("`{}`: line style must be 1-4, got {}", taxon, cell))?;
        }
        "line width" => {
            ensure!(num >= 1.0, "`{}`: line width must be at least 1", taxon);
            style.line_width = num.round() as u32;
        }
        "bar width" => {
            ensure!(num >= 0.0, "`{}`: bar width must not be negative", taxon);
            style.bar_width = num;
        }
        "marker" => {
            style.marker = MarkerShape::from_code(code)
                .with_context(|| format!("`{}`: marker must be 1-6, got {}", taxon, cell))?;
        }
        "marker size" => {
            ensure!(num >= 1.0, "`{}`: marker size must be at least 1", taxon);
            style.marker_size = num.round() as u32;
        }
        "exaggeration" => {
            ensure!(num >= 0.0, "`{}`: exaggeration must not be negative", taxon);
            style.exaggeration = num;
        }
        "exaggeration style" => {
            style.exaggeration_style = ExaggerationStyle::from_code(code).with_context(|| {
                format!("`{}`: exaggeration style must be 1 or 2, got {}", taxon, cell)
            })?;
        }
        "stack group 1" | "stack group 2" => {
            ensure!(
                num.fract() == 0.0 && (0.0..=5.0).contains(&num),
                "`{}`: {} label must be an integer 0-5, got {}",
                taxon,
                attr,
                cell
            );
            if attr == "stack group 1" {
                style.stack_group_1 = code;
            } else {
                style.stack_group_2 = code;
            }
        }
        "frame" => {
            style.frame = Frame::from_code(code)
                .with_context(|| format!("`{}`: frame must be 0-2, got {}", taxon, cell))?;
        }
        "tick interval" => {
            ensure!(num >= 0.0, "`{}`: tick interval must not be negative", taxon);
            style.tick_interval = num;
        }
        _ => unreachable!("unrecognised style row `{attr}`"),
    }
    Ok(())
}

/// Append the extra file's taxa to the primary dataset. The extra file must
/// sample exactly the same depths; its zone column is ignored.
fn merge_extra(dataset: &mut Dataset, extra: Dataset) -> Result<()> {
    ensure!(
        dataset.depths.len() == extra.depths.len()
            && dataset
                .depths
                .iter()
                .zip(&extra.depths)
                .all(|(a, b)| (a - b).abs() < 1e-9),
        "extra data file must sample the same depths as the primary file"
    );
    if !extra.zones.is_empty() {
        warn!("extra data file declares zones; only the primary file's zones are used");
    }
    for taxon in extra.taxa {
        ensure!(
            dataset.taxon(&taxon.name).is_none(),
            "taxon `{}` appears in both the primary and the extra file",
            taxon.name
        );
        dataset.taxa.push(taxon);
    }
    Ok(())
}

/// Drop columns that are entirely zero, warning per column.
fn drop_empty_columns(dataset: &mut Dataset) {
    dataset.taxa.retain(|t| {
        let keep = t.values.iter().any(|v| *v != 0.0);
        if !keep {
            warn!("dropping `{}`: every value is zero", t.name);
        }
        keep
    });
}

/// Depth order is the source data's responsibility; flag surprises.
fn check_depth_order(depths: &[f64]) {
    let increasing = depths.windows(2).all(|w| w[0] <= w[1]);
    let decreasing = depths.windows(2).all(|w| w[0] >= w[1]);
    if !increasing && !decreasing {
        warn!("depth column is not monotonic; the diagram may fold back on itself");
    }
}
