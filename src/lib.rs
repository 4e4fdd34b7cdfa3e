//! strata-rs
//!
//! A lightweight Rust library for rendering stratigraphic/palaeo-record
//! diagrams (depth vs. abundance) from tabular data. Pairs with the
//! `strata` CLI.
//!
//! ### Features
//! - Flat key/value configuration file parsed into typed, validated settings
//! - Per-taxon strip heights from a shared min/max scaling ratio
//! - Up to two stack (percentage composition) schemes with optional
//!   renormalisation to 100 per depth row
//! - Seven per-taxon graph types, zone boundaries, age-date annotations
//! - SVG/PNG/PDF output
//!
//! ### Example
//! ```no_run
//! use std::path::Path;
//! use strata_rs::{config::Settings, data, scaling, viz};
//!
//! let dir = Path::new("project");
//! let settings = Settings::from_file(dir.join("config.csv"))?;
//! let dataset = data::load_dataset(dir, &settings)?;
//! let entries = scaling::compute_scaling(&dataset.taxa, &settings.nsc)?;
//! let model = viz::FigureModel::build(&settings, &dataset, &entries, &[])?;
//! viz::render_diagram(dir, &settings, &model)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod data;
pub mod models;
pub mod scaling;
pub mod stack;
pub mod storage;
pub mod style;
pub mod viz;

pub use config::Settings;
pub use models::{Dataset, Taxon, TaxonStyle, Zone};
pub use scaling::ScalingEntry;
pub use stack::{Scheme, StackSeries};
