mod common;

use common::{config_csv, sample_data_csv, write_project};
use std::fs;
use std::path::Path;
use strata_rs::config::Settings;
use strata_rs::stack::{self, Scheme};
use strata_rs::viz::{self, FigureModel};
use strata_rs::{data, scaling};
use tempfile::tempdir;

/// Run the whole pipeline for a project directory and return the paths of
/// the rendered images.
fn render_project(dir: &Path) -> anyhow::Result<Vec<std::path::PathBuf>> {
    let settings = Settings::from_file(dir.join("config.csv"))?;
    let dataset = data::load_dataset(dir, &settings)?;
    let entries = scaling::compute_scaling(&dataset.taxa, &settings.nsc)?;
    let mut stacks = Vec::new();
    if settings.stack1.enabled {
        stacks.push(stack::aggregate(
            &dataset,
            Scheme::One,
            settings.stack1.calculation,
        )?);
    }
    if settings.stack2.enabled {
        stacks.push(stack::aggregate(
            &dataset,
            Scheme::Two,
            settings.stack2.calculation,
        )?);
    }
    let model = FigureModel::build(&settings, &dataset, &entries, &stacks)?;
    viz::render_diagram(dir, &settings, &model)
}

fn assert_non_empty(path: &Path) {
    let meta = fs::metadata(path).expect("output file created");
    assert!(meta.len() > 0, "{} has content", path.display());
}

#[test]
fn svg_and_png_outputs_render() {
    let dir = tempdir().unwrap();
    write_project(
        dir.path(),
        &config_csv(&[("png output", "on")]),
        &sample_data_csv(),
    );
    let written = render_project(dir.path()).unwrap();
    assert_eq!(written.len(), 2);
    for path in &written {
        assert_non_empty(path);
    }
    assert!(dir.path().join("diagram.svg").exists());
    assert!(dir.path().join("diagram.png").exists());
}

#[test]
fn every_graph_type_renders() {
    for code in 1..=7 {
        let dir = tempdir().unwrap();
        let data = format!(
            "Sample,Depth,Only,Zones\n\
             Graph type,,{code},\n\
             S1,10,4,\n\
             S2,20,9,\n\
             S3,30,2,\n"
        );
        write_project(dir.path(), &config_csv(&[]), &data);
        let written = render_project(dir.path())
            .unwrap_or_else(|e| panic!("graph type {code}: {e:#}"));
        assert_non_empty(&written[0]);
    }
}

#[test]
fn stacks_zones_and_annotations_render() {
    let dir = tempdir().unwrap();
    write_project(
        dir.path(),
        &config_csv(&[
            ("stack plot 1", "on"),
            ("stack 1 calculation", "on"),
            ("stack 1 colours", "6,2,4,5,3"),
            ("zone lines", "on"),
            ("age dates", "on"),
            ("age depths", "15,45"),
            ("age labels", "1210 BP,3450 BP"),
            ("group callouts", "on"),
            ("callout depths", "25"),
            ("callout labels", "wet phase"),
        ]),
        &sample_data_csv(),
    );
    let written = render_project(dir.path()).unwrap();
    assert_non_empty(&written[0]);
}

#[test]
fn reversed_depth_and_overridden_axis_render() {
    let dir = tempdir().unwrap();
    write_project(
        dir.path(),
        &config_csv(&[
            ("reverse depth", "on"),
            ("depth min", "5"),
            ("depth max", "60"),
            ("depth tick interval", "10"),
        ]),
        &sample_data_csv(),
    );
    let written = render_project(dir.path()).unwrap();
    assert_non_empty(&written[0]);
}

#[test]
fn nsc_taxon_renders_with_its_own_limits() {
    let dir = tempdir().unwrap();
    write_project(
        dir.path(),
        &config_csv(&[
            ("nsc taxa", "Charcoal"),
            ("nsc minima", "0"),
            ("nsc maxima", "400"),
        ]),
        &sample_data_csv(),
    );
    let written = render_project(dir.path()).unwrap();
    assert_non_empty(&written[0]);
}

#[test]
fn numeric_series_are_reproducible_across_runs() {
    let dir = tempdir().unwrap();
    write_project(dir.path(), &config_csv(&[]), &sample_data_csv());
    let settings = Settings::from_file(dir.path().join("config.csv")).unwrap();
    let dataset = data::load_dataset(dir.path(), &settings).unwrap();
    let a = scaling::compute_scaling(&dataset.taxa, &settings.nsc).unwrap();
    let b = scaling::compute_scaling(&dataset.taxa, &settings.nsc).unwrap();
    assert_eq!(a, b);
    let s1 = stack::aggregate(&dataset, Scheme::One, true).unwrap();
    let s2 = stack::aggregate(&dataset, Scheme::One, true).unwrap();
    assert_eq!(s1, s2);
}

#[test]
fn disabling_every_format_is_an_error() {
    let dir = tempdir().unwrap();
    write_project(
        dir.path(),
        &config_csv(&[("svg output", "off")]),
        &sample_data_csv(),
    );
    let err = render_project(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("output formats"), "{err:#}");
}
