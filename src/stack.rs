//! The stack aggregator: sums taxa by group label per depth row for one of
//! the two percentage-composition schemes, optionally renormalising each row
//! to 100.

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use crate::models::Dataset;

/// Which of the two independent grouping schemes to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    One,
    Two,
}

impl Scheme {
    fn label_of(self, dataset: &Dataset, taxon: usize) -> u8 {
        let style = &dataset.taxa[taxon].style;
        match self {
            Scheme::One => style.stack_group_1,
            Scheme::Two => style.stack_group_2,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Scheme::One => 1,
            Scheme::Two => 2,
        }
    }
}

/// One aggregated group: the member taxa and their depth-wise sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSeries {
    /// Group label 1–5.
    pub label: u8,
    pub members: Vec<String>,
    /// One value per depth row, in dataset row order.
    pub values: Vec<f64>,
}

/// All non-empty groups of one scheme, ordered by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSeries {
    pub scheme: u8,
    pub groups: Vec<GroupSeries>,
}

/// Aggregate one scheme. Group labels 0–5 were validated at load time;
/// label 0 means the taxon takes no part. With `calculation` on, each depth
/// row is rescaled so the group sums total 100 (rows summing to zero are
/// left at zero rather than divided).
pub fn aggregate(dataset: &Dataset, scheme: Scheme, calculation: bool) -> Result<StackSeries> {
    let rows = dataset.depths.len();
    let mut groups: Vec<GroupSeries> = Vec::new();

    for label in 1..=5u8 {
        let members: Vec<usize> = (0..dataset.taxa.len())
            .filter(|&t| scheme.label_of(dataset, t) == label)
            .collect();
        if members.is_empty() {
            continue;
        }
        let mut values = vec![0.0; rows];
        for &t in &members {
            for (row, v) in dataset.taxa[t].values.iter().enumerate() {
                values[row] += v;
            }
        }
        groups.push(GroupSeries {
            label,
            members: members
                .iter()
                .map(|&t| dataset.taxa[t].name.clone())
                .collect(),
            values,
        });
    }

    ensure!(
        !groups.is_empty(),
        "stack plot {} is enabled but no taxon carries a group label 1-5",
        scheme.number()
    );

    if calculation {
        for row in 0..rows {
            let total: f64 = groups.iter().map(|g| g.values[row]).sum();
            if total != 0.0 {
                for g in groups.iter_mut() {
                    g.values[row] = g.values[row] / total * 100.0;
                }
            }
        }
    }

    Ok(StackSeries {
        scheme: scheme.number(),
        groups,
    })
}
