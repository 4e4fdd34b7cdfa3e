//! Configuration loading: a flat `PARAMETERS,ENTRY` CSV parsed into typed
//! [`Settings`] with full validation.
//!
//! Every key is required and exact-match; unknown keys are rejected so a
//! typo cannot silently fall back to a default. Values are numbers,
//! `on`/`off` switches, bare strings, or comma-separated lists. Keys that
//! belong to a switched-off feature group still have to be present, but
//! their values are only range-checked when the group is enabled.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

use crate::style::{parse_palette_code, LineStyle};

/// A configuration validation failure. Always fatal; the message carries the
/// offending key so the user can fix the file directly.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file has no `{0}` column in its header")]
    BadHeader(&'static str),
    #[error("missing configuration key `{0}`")]
    MissingKey(&'static str),
    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),
    #[error("duplicate configuration key `{0}`")]
    DuplicateKey(String),
    #[error("configuration key `{key}`: expected {expected}, got `{value}`")]
    BadValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Which side of the strip stack age-date annotations hang on. Depth runs
/// horizontally, so the band sits above or below the strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeSide {
    Top,
    Bottom,
}

/// Input/output file switches and names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSettings {
    pub input_file: String,
    pub extra_data: bool,
    pub extra_file: String,
    /// Base name for all outputs; extensions are appended per format.
    pub output_file: String,
    pub png_output: bool,
    pub png_dpi: u32,
    pub pdf_output: bool,
    pub svg_output: bool,
    /// When on, also write the computed scaling table and stack series.
    pub data_export: bool,
}

/// Overall figure geometry and typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub title_size: u32,
    pub font_size: u32,
    /// Rotation of per-strip taxon titles, degrees counter-clockwise.
    pub label_rotation: u32,
    /// Vertical gap between strips, pixels.
    pub strip_gap: u32,
}

/// Shared depth axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthAxisSettings {
    /// Axis limits; both 0 means derive from the data.
    pub min: f64,
    pub max: f64,
    /// Tick spacing; 0 means automatic.
    pub tick_interval: f64,
    pub label: String,
    /// Draw the deepest sample on the left instead of the right.
    pub reverse: bool,
}

/// Styling of the exaggerated overlay curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExaggerationSettings {
    pub line_style: LineStyle,
    pub colour: u8,
}

/// Taxa exempted from the shared ratio computation, with their own
/// user-specified abundance limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NscSettings {
    pub taxa: Vec<String>,
    pub minima: Vec<f64>,
    pub maxima: Vec<f64>,
}

impl NscSettings {
    /// Limits for a taxon, if it is listed as non-standard scaling.
    pub fn limits_for(&self, name: &str) -> Option<(f64, f64)> {
        let idx = self.taxa.iter().position(|t| t == name)?;
        Some((self.minima[idx], self.maxima[idx]))
    }
}

/// One stack (percentage composition) scheme; up to two may be active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSettings {
    pub enabled: bool,
    pub title: String,
    /// Renormalize each depth row so the five group sums total 100.
    pub calculation: bool,
    /// Five palette codes, one per group label 1–5.
    pub colours: Vec<u8>,
    /// Height multiplier for the stack strip (base ratio is 1).
    pub size: f64,
}

/// Zone boundary lines and the zone label column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSettings {
    pub lines: bool,
    pub line_style: LineStyle,
    pub line_width: u32,
    pub line_colour: u8,
    pub label_size: u32,
    pub column_title: String,
}

/// Radiocarbon/interpolated age annotations along the depth axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeSettings {
    pub enabled: bool,
    pub depths: Vec<f64>,
    pub labels: Vec<String>,
    pub colour: u8,
    pub label_size: u32,
    pub side: AgeSide,
}

/// Free-form grouping callouts above the strip stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalloutSettings {
    pub enabled: bool,
    pub depths: Vec<f64>,
    pub labels: Vec<String>,
    pub size: u32,
}

/// The full validated configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub files: FileSettings,
    pub figure: FigureSettings,
    pub depth: DepthAxisSettings,
    pub exaggeration: ExaggerationSettings,
    pub nsc: NscSettings,
    pub stack1: StackSettings,
    pub stack2: StackSettings,
    pub zones: ZoneSettings,
    pub ages: AgeSettings,
    pub callouts: CalloutSettings,
}

impl Settings {
    /// Read and validate a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = read_raw(path)
            .with_context(|| format!("reading configuration file {}", path.display()))?;
        let settings = parse_settings(raw)
            .with_context(|| format!("validating configuration file {}", path.display()))?;
        debug!("configuration loaded from {}", path.display());
        Ok(settings)
    }
}

/// Read the two-column key/value table, rejecting duplicate keys.
fn read_raw(path: &Path) -> Result<BTreeMap<String, String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = rdr.headers()?.clone();
    let key_col = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("PARAMETERS"))
        .ok_or(ConfigError::BadHeader("PARAMETERS"))?;
    let val_col = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("ENTRY"))
        .ok_or(ConfigError::BadHeader("ENTRY"))?;

    let mut map = BTreeMap::new();
    for record in rdr.records() {
        let record = record?;
        let key = record.get(key_col).unwrap_or("").trim();
        if key.is_empty() {
            continue;
        }
        let value = record.get(val_col).unwrap_or("").trim().to_string();
        if map.insert(key.to_ascii_lowercase(), value).is_some() {
            return Err(ConfigError::DuplicateKey(key.to_string()).into());
        }
    }
    Ok(map)
}

/// Cursor over the raw key/value map that records which keys were consumed,
/// so leftovers can be reported as unknown.
struct Raw {
    map: BTreeMap<String, String>,
    seen: BTreeSet<&'static str>,
}

impl Raw {
    fn get(&mut self, key: &'static str) -> Result<&str, ConfigError> {
        match self.map.get(key) {
            Some(v) => {
                self.seen.insert(key);
                Ok(v.as_str())
            }
            None => Err(ConfigError::MissingKey(key)),
        }
    }

    fn string(&mut self, key: &'static str) -> Result<String, ConfigError> {
        Ok(self.get(key)?.to_string())
    }

    fn num(&mut self, key: &'static str) -> Result<f64, ConfigError> {
        let v = self.get(key)?;
        v.parse::<f64>().map_err(|_| ConfigError::BadValue {
            key,
            value: v.to_string(),
            expected: "a number",
        })
    }

    fn positive(&mut self, key: &'static str) -> Result<f64, ConfigError> {
        let n = self.num(key)?;
        if n > 0.0 {
            Ok(n)
        } else {
            Err(ConfigError::BadValue {
                key,
                value: n.to_string(),
                expected: "a positive number",
            })
        }
    }

    fn size(&mut self, key: &'static str) -> Result<u32, ConfigError> {
        let n = self.positive(key)?;
        Ok(n.round() as u32)
    }

    fn switch(&mut self, key: &'static str) -> Result<bool, ConfigError> {
        let v = self.get(key)?;
        match v.to_ascii_lowercase().as_str() {
            "on" => Ok(true),
            "off" => Ok(false),
            _ => Err(ConfigError::BadValue {
                key,
                value: v.to_string(),
                expected: "`on` or `off`",
            }),
        }
    }

    fn str_list(&mut self, key: &'static str) -> Result<Vec<String>, ConfigError> {
        let v = self.get(key)?;
        if v.is_empty() {
            return Ok(Vec::new());
        }
        Ok(v.split(',').map(|s| s.trim().to_string()).collect())
    }

    fn num_list(&mut self, key: &'static str) -> Result<Vec<f64>, ConfigError> {
        let items = self.str_list(key)?;
        items
            .iter()
            .map(|s| {
                s.parse::<f64>().map_err(|_| ConfigError::BadValue {
                    key,
                    value: s.to_string(),
                    expected: "a comma-separated list of numbers",
                })
            })
            .collect()
    }

    fn palette(&mut self, key: &'static str) -> Result<u8, ConfigError> {
        let n = self.num(key)?;
        parse_palette_code(n).ok_or(ConfigError::BadValue {
            key,
            value: n.to_string(),
            expected: "a palette code 1-23",
        })
    }

    fn palette_list(&mut self, key: &'static str, len: usize) -> Result<Vec<u8>, ConfigError> {
        let nums = self.num_list(key)?;
        if nums.len() != len {
            return Err(ConfigError::BadValue {
                key,
                value: format!("{} entries", nums.len()),
                expected: "exactly 5 palette codes",
            });
        }
        nums.into_iter()
            .map(|n| {
                parse_palette_code(n).ok_or(ConfigError::BadValue {
                    key,
                    value: n.to_string(),
                    expected: "palette codes 1-23",
                })
            })
            .collect()
    }

    fn line_style(&mut self, key: &'static str) -> Result<LineStyle, ConfigError> {
        let n = self.num(key)?;
        LineStyle::from_code(n as u8).ok_or(ConfigError::BadValue {
            key,
            value: n.to_string(),
            expected: "a line style code 1-4",
        })
    }

    /// All keys handed out so far; anything left in the map is unknown.
    fn finish(self) -> Result<(), ConfigError> {
        for key in self.map.keys() {
            if !self.seen.contains(key.as_str()) {
                return Err(ConfigError::UnknownKey(key.clone()));
            }
        }
        Ok(())
    }
}

fn parse_stack(raw: &mut Raw, keys: [&'static str; 5]) -> Result<StackSettings, ConfigError> {
    let [k_enabled, k_title, k_calc, k_colours, k_size] = keys;
    let enabled = raw.switch(k_enabled)?;
    let title = raw.string(k_title)?;
    let calculation = raw.switch(k_calc)?;
    let colours = if enabled {
        raw.palette_list(k_colours, 5)?
    } else {
        raw.str_list(k_colours)?;
        vec![1, 2, 3, 4, 5]
    };
    let size = raw.positive(k_size)?;
    Ok(StackSettings {
        enabled,
        title,
        calculation,
        colours,
        size,
    })
}

/// Turn the raw key/value table into validated [`Settings`].
pub fn parse_settings(map: BTreeMap<String, String>) -> Result<Settings> {
    let mut raw = Raw {
        map,
        seen: BTreeSet::new(),
    };

    let files = FileSettings {
        input_file: raw.string("input file")?,
        extra_data: raw.switch("extra data")?,
        extra_file: raw.string("extra file")?,
        output_file: raw.string("output file")?,
        png_output: raw.switch("png output")?,
        png_dpi: raw.size("png dpi")?,
        pdf_output: raw.switch("pdf output")?,
        svg_output: raw.switch("svg output")?,
        data_export: raw.switch("data export")?,
    };
    if files.input_file.is_empty() {
        return Err(ConfigError::BadValue {
            key: "input file",
            value: String::new(),
            expected: "a file name",
        }
        .into());
    }
    if files.extra_data && files.extra_file.is_empty() {
        return Err(ConfigError::BadValue {
            key: "extra file",
            value: String::new(),
            expected: "a file name when `extra data` is on",
        }
        .into());
    }
    if files.output_file.is_empty() {
        return Err(ConfigError::BadValue {
            key: "output file",
            value: String::new(),
            expected: "a base file name",
        }
        .into());
    }

    let figure = FigureSettings {
        width: raw.size("figure width")?,
        height: raw.size("figure height")?,
        title: raw.string("figure title")?,
        title_size: raw.size("title size")?,
        font_size: raw.size("font size")?,
        label_rotation: raw.num("label rotation")? as u32,
        strip_gap: raw.num("strip gap")? as u32,
    };

    let depth = DepthAxisSettings {
        min: raw.num("depth min")?,
        max: raw.num("depth max")?,
        tick_interval: raw.num("depth tick interval")?,
        label: raw.string("depth label")?,
        reverse: raw.switch("reverse depth")?,
    };
    if depth.min != 0.0 || depth.max != 0.0 {
        if depth.min >= depth.max {
            return Err(ConfigError::BadValue {
                key: "depth min",
                value: format!("{} .. {}", depth.min, depth.max),
                expected: "`depth min` below `depth max` (or both 0 for automatic)",
            }
            .into());
        }
    }

    let exaggeration = ExaggerationSettings {
        line_style: raw.line_style("exaggeration line style")?,
        colour: raw.palette("exaggeration colour")?,
    };

    let nsc = NscSettings {
        taxa: raw.str_list("nsc taxa")?,
        minima: raw.num_list("nsc minima")?,
        maxima: raw.num_list("nsc maxima")?,
    };
    if nsc.taxa.len() != nsc.minima.len() || nsc.taxa.len() != nsc.maxima.len() {
        return Err(ConfigError::BadValue {
            key: "nsc taxa",
            value: format!(
                "{} taxa, {} minima, {} maxima",
                nsc.taxa.len(),
                nsc.minima.len(),
                nsc.maxima.len()
            ),
            expected: "`nsc taxa`, `nsc minima` and `nsc maxima` of equal length",
        }
        .into());
    }
    for (i, (lo, hi)) in nsc.minima.iter().zip(&nsc.maxima).enumerate() {
        if lo >= hi {
            return Err(ConfigError::BadValue {
                key: "nsc maxima",
                value: format!("{} .. {} for `{}`", lo, hi, nsc.taxa[i]),
                expected: "each minimum below its maximum",
            }
            .into());
        }
    }

    let stack1 = parse_stack(
        &mut raw,
        [
            "stack plot 1",
            "stack 1 title",
            "stack 1 calculation",
            "stack 1 colours",
            "stack 1 size",
        ],
    )?;
    let stack2 = parse_stack(
        &mut raw,
        [
            "stack plot 2",
            "stack 2 title",
            "stack 2 calculation",
            "stack 2 colours",
            "stack 2 size",
        ],
    )?;

    let zones = ZoneSettings {
        lines: raw.switch("zone lines")?,
        line_style: raw.line_style("zone line style")?,
        line_width: raw.size("zone line width")?,
        line_colour: raw.palette("zone line colour")?,
        label_size: raw.size("zone label size")?,
        column_title: raw.string("zone column title")?,
    };

    let side = {
        let v = raw.string("age side")?;
        match v.to_ascii_lowercase().as_str() {
            "top" => AgeSide::Top,
            "bottom" => AgeSide::Bottom,
            _ => {
                return Err(ConfigError::BadValue {
                    key: "age side",
                    value: v,
                    expected: "`top` or `bottom`",
                }
                .into());
            }
        }
    };
    let ages = AgeSettings {
        enabled: raw.switch("age dates")?,
        depths: raw.num_list("age depths")?,
        labels: raw.str_list("age labels")?,
        colour: raw.palette("age colour")?,
        label_size: raw.size("age label size")?,
        side,
    };
    if ages.enabled && ages.depths.len() != ages.labels.len() {
        return Err(ConfigError::BadValue {
            key: "age labels",
            value: format!("{} labels, {} depths", ages.labels.len(), ages.depths.len()),
            expected: "`age depths` and `age labels` of equal length",
        }
        .into());
    }

    let callouts = CalloutSettings {
        enabled: raw.switch("group callouts")?,
        depths: raw.num_list("callout depths")?,
        labels: raw.str_list("callout labels")?,
        size: raw.size("callout size")?,
    };
    if callouts.enabled && callouts.depths.len() != callouts.labels.len() {
        return Err(ConfigError::BadValue {
            key: "callout labels",
            value: format!(
                "{} labels, {} depths",
                callouts.labels.len(),
                callouts.depths.len()
            ),
            expected: "`callout depths` and `callout labels` of equal length",
        }
        .into());
    }

    raw.finish()?;

    Ok(Settings {
        files,
        figure,
        depth,
        exaggeration,
        nsc,
        stack1,
        stack2,
        zones,
        ages,
        callouts,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal complete key/value table used across the config tests.
    pub(crate) fn base_map() -> BTreeMap<String, String> {
        let entries = [
            ("input file", "core.csv"),
            ("extra data", "off"),
            ("extra file", ""),
            ("output file", "diagram"),
            ("png output", "on"),
            ("png dpi", "150"),
            ("pdf output", "off"),
            ("svg output", "on"),
            ("data export", "off"),
            ("figure width", "1600"),
            ("figure height", "1000"),
            ("figure title", "Core A"),
            ("title size", "18"),
            ("font size", "12"),
            ("label rotation", "45"),
            ("strip gap", "4"),
            ("depth min", "0"),
            ("depth max", "0"),
            ("depth tick interval", "0"),
            ("depth label", "Depth (cm)"),
            ("reverse depth", "off"),
            ("exaggeration line style", "2"),
            ("exaggeration colour", "3"),
            ("nsc taxa", ""),
            ("nsc minima", ""),
            ("nsc maxima", ""),
            ("stack plot 1", "off"),
            ("stack 1 title", ""),
            ("stack 1 calculation", "off"),
            ("stack 1 colours", ""),
            ("stack 1 size", "1"),
            ("stack plot 2", "off"),
            ("stack 2 title", ""),
            ("stack 2 calculation", "off"),
            ("stack 2 colours", ""),
            ("stack 2 size", "1"),
            ("zone lines", "off"),
            ("zone line style", "1"),
            ("zone line width", "1"),
            ("zone line colour", "11"),
            ("zone label size", "10"),
            ("zone column title", "Zones"),
            ("age dates", "off"),
            ("age depths", ""),
            ("age labels", ""),
            ("age colour", "11"),
            ("age label size", "10"),
            ("age side", "top"),
            ("group callouts", "off"),
            ("callout depths", ""),
            ("callout labels", ""),
            ("callout size", "12"),
        ];
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn full_table_parses() {
        let s = parse_settings(base_map()).unwrap();
        assert_eq!(s.files.input_file, "core.csv");
        assert_eq!(s.figure.width, 1600);
        assert!(!s.stack1.enabled);
        assert_eq!(s.zones.line_colour, 11);
        assert_eq!(s.ages.side, AgeSide::Top);
    }

    #[test]
    fn missing_key_is_named() {
        let mut m = base_map();
        m.remove("png dpi");
        let err = parse_settings(m).unwrap_err();
        assert!(err.to_string().contains("png dpi"), "{err}");
    }

    #[test]
    fn unknown_key_rejected() {
        let mut m = base_map();
        m.insert("png dpis".into(), "150".into());
        let err = parse_settings(m).unwrap_err();
        assert!(err.to_string().contains("png dpis"), "{err}");
    }

    #[test]
    fn switch_values_validated() {
        let mut m = base_map();
        m.insert("png output".into(), "yes".into());
        assert!(parse_settings(m).is_err());
    }

    #[test]
    fn enabled_stack_requires_five_colours() {
        let mut m = base_map();
        m.insert("stack plot 1".into(), "on".into());
        m.insert("stack 1 colours".into(), "1,2,3".into());
        assert!(parse_settings(m).is_err());

        let mut m = base_map();
        m.insert("stack plot 1".into(), "on".into());
        m.insert("stack 1 colours".into(), "1,2,3,4,5".into());
        let s = parse_settings(m).unwrap();
        assert_eq!(s.stack1.colours, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn nsc_lists_must_align() {
        let mut m = base_map();
        m.insert("nsc taxa".into(), "Charcoal".into());
        m.insert("nsc minima".into(), "0".into());
        m.insert("nsc maxima".into(), "".into());
        assert!(parse_settings(m).is_err());

        let mut m = base_map();
        m.insert("nsc taxa".into(), "Charcoal".into());
        m.insert("nsc minima".into(), "0".into());
        m.insert("nsc maxima".into(), "500".into());
        let s = parse_settings(m).unwrap();
        assert_eq!(s.nsc.limits_for("Charcoal"), Some((0.0, 500.0)));
        assert_eq!(s.nsc.limits_for("Betula"), None);
    }

    #[test]
    fn depth_limits_ordered() {
        let mut m = base_map();
        m.insert("depth min".into(), "100".into());
        m.insert("depth max".into(), "50".into());
        assert!(parse_settings(m).is_err());
    }

    #[test]
    fn age_lists_checked_when_enabled() {
        let mut m = base_map();
        m.insert("age dates".into(), "on".into());
        m.insert("age depths".into(), "10,20".into());
        m.insert("age labels".into(), "1200 BP".into());
        assert!(parse_settings(m).is_err());
    }
}
