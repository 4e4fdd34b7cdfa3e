//! Shared fixtures: a complete configuration table and a small data file.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const BASE_CONFIG: &[(&str, &str)] = &[
    ("input file", "core.csv"),
    ("extra data", "off"),
    ("extra file", ""),
    ("output file", "diagram"),
    ("png output", "off"),
    ("png dpi", "120"),
    ("pdf output", "off"),
    ("svg output", "on"),
    ("data export", "off"),
    ("figure width", "1200"),
    ("figure height", "800"),
    ("figure title", "Core A"),
    ("title size", "18"),
    ("font size", "12"),
    ("label rotation", "0"),
    ("strip gap", "4"),
    ("depth min", "0"),
    ("depth max", "0"),
    ("depth tick interval", "0"),
    ("depth label", "Depth (cm)"),
    ("reverse depth", "off"),
    ("exaggeration line style", "2"),
    ("exaggeration colour", "9"),
    ("nsc taxa", ""),
    ("nsc minima", ""),
    ("nsc maxima", ""),
    ("stack plot 1", "off"),
    ("stack 1 title", "Trees"),
    ("stack 1 calculation", "off"),
    ("stack 1 colours", ""),
    ("stack 1 size", "1"),
    ("stack plot 2", "off"),
    ("stack 2 title", ""),
    ("stack 2 calculation", "off"),
    ("stack 2 colours", ""),
    ("stack 2 size", "1"),
    ("zone lines", "off"),
    ("zone line style", "2"),
    ("zone line width", "1"),
    ("zone line colour", "11"),
    ("zone label size", "10"),
    ("zone column title", "Zones"),
    ("age dates", "off"),
    ("age depths", ""),
    ("age labels", ""),
    ("age colour", "13"),
    ("age label size", "10"),
    ("age side", "top"),
    ("group callouts", "off"),
    ("callout depths", ""),
    ("callout labels", ""),
    ("callout size", "12"),
];

/// The base configuration with `overrides` applied, as CSV text.
pub fn config_csv(overrides: &[(&str, &str)]) -> String {
    let mut map: BTreeMap<&str, &str> = BASE_CONFIG.iter().copied().collect();
    for (k, v) in overrides {
        map.insert(k, v);
    }
    let mut out = String::from("PARAMETERS,ENTRY\n");
    for (k, v) in map {
        out.push_str(&format!("{k},\"{v}\"\n"));
    }
    out
}

/// Four taxa over five depth samples with two zone boundaries: a bar, a
/// line with exaggeration, a filled curve and a line-with-markers, the
/// first three carrying stack-1 labels.
pub fn sample_data_csv() -> String {
    "Sample,Depth,Betula,Pinus,Poaceae,Charcoal,Zones\n\
     Graph type,,1,3,4,5,\n\
     Main colour,,7,6,2,11,\n\
     Fill colour,,5,6,4,3,\n\
     Line style,,1,1,1,2,\n\
     Line width,,1,2,1,1,\n\
     Marker,,1,1,1,3,\n\
     Marker size,,3,3,3,4,\n\
     Exaggeration,,0,5,0,0,\n\
     Exaggeration style,,1,2,1,1,\n\
     Stack group 1,,1,1,2,0,\n\
     Stack group 2,,0,0,0,0,\n\
     Frame,,1,1,2,1,\n\
     S1,10,14,3.2,22,120,ZA\n\
     S2,20,18,1.1,30,80,\n\
     S3,30,11,0.4,41,310,ZB\n\
     S4,40,9,2.8,35,95,\n\
     S5,50,16,1.9,28,60,\n"
        .to_string()
}

/// Write a project directory holding a configuration and a data file.
pub fn write_project(dir: &Path, config: &str, data: &str) {
    fs::write(dir.join("config.csv"), config).unwrap();
    fs::write(dir.join("core.csv"), data).unwrap();
}
