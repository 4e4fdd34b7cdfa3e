//! The renderer's figure model: an ordered list of strips with their
//! relative heights, assembled once from the dataset and the computed
//! series so the drawing code is a single loop.

use anyhow::{Result, ensure};

use crate::config::Settings;
use crate::models::{Dataset, TaxonStyle, Zone};
use crate::scaling::ScalingEntry;
use crate::stack::StackSeries;

/// What a strip draws.
#[derive(Debug, Clone)]
pub enum StripContent {
    /// One taxon's abundance curve.
    Taxon {
        values: Vec<f64>,
        style: TaxonStyle,
        y_min: f64,
        y_max: f64,
    },
    /// One stack scheme's grouped series, bottom-up in label order.
    Stack {
        /// (group label, per-row values).
        groups: Vec<(u8, Vec<f64>)>,
        /// Five palette codes, indexed by label - 1.
        colours: Vec<u8>,
        y_max: f64,
    },
    /// The zone label column.
    Zones,
}

#[derive(Debug, Clone)]
pub struct Strip {
    pub title: String,
    pub ratio: f64,
    pub content: StripContent,
}

/// Everything the drawing loop needs, in final top-to-bottom strip order.
#[derive(Debug, Clone)]
pub struct FigureModel {
    pub depths: Vec<f64>,
    /// Depth axis limits, already honouring the configured override.
    pub depth_min: f64,
    pub depth_max: f64,
    pub zones: Vec<Zone>,
    pub strips: Vec<Strip>,
}

impl FigureModel {
    /// Assemble the strip list: taxa in reversed input column order, then
    /// the stack strips, then the zone column at the bottom.
    pub fn build(
        settings: &Settings,
        dataset: &Dataset,
        scaling: &[ScalingEntry],
        stacks: &[StackSeries],
    ) -> Result<Self> {
        let (data_lo, data_hi) = dataset
            .depth_range()
            .ok_or_else(|| anyhow::anyhow!("dataset has no depth samples"))?;
        let (depth_min, depth_max) =
            if settings.depth.min == 0.0 && settings.depth.max == 0.0 {
                (data_lo, data_hi)
            } else {
                (settings.depth.min, settings.depth.max)
            };
        ensure!(
            depth_min < depth_max,
            "depth axis range is empty ({} .. {})",
            depth_min,
            depth_max
        );

        let mut strips = Vec::new();
        for (taxon, entry) in dataset.taxa.iter().zip(scaling).rev() {
            debug_assert_eq!(taxon.name, entry.taxon);
            let y_min = if entry.nsc { entry.min } else { entry.min.min(0.0) };
            let mut y_max = entry.adjusted_max;
            if y_max <= y_min {
                y_max = y_min + 1.0;
            }
            strips.push(Strip {
                title: taxon.name.clone(),
                ratio: entry.ratio,
                content: StripContent::Taxon {
                    values: taxon.values.clone(),
                    style: taxon.style.clone(),
                    y_min,
                    y_max,
                },
            });
        }

        for series in stacks {
            let cfg = if series.scheme == 1 {
                &settings.stack1
            } else {
                &settings.stack2
            };
            let rows = dataset.depths.len();
            let y_max = if cfg.calculation {
                100.0
            } else {
                (0..rows)
                    .map(|r| series.groups.iter().map(|g| g.values[r]).sum::<f64>())
                    .fold(0.0_f64, f64::max)
                    .max(1.0)
            };
            strips.push(Strip {
                title: cfg.title.clone(),
                ratio: cfg.size,
                content: StripContent::Stack {
                    groups: series
                        .groups
                        .iter()
                        .map(|g| (g.label, g.values.clone()))
                        .collect(),
                    colours: cfg.colours.clone(),
                    y_max,
                },
            });
        }

        if !dataset.zones.is_empty() {
            strips.push(Strip {
                title: settings.zones.column_title.clone(),
                ratio: 1.0,
                content: StripContent::Zones,
            });
        }

        ensure!(!strips.is_empty(), "nothing to draw: no strips assembled");

        Ok(Self {
            depths: dataset.depths.clone(),
            depth_min,
            depth_max,
            zones: dataset.zones.clone(),
            strips,
        })
    }
}
