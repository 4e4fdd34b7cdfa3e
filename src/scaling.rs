//! The scaling engine: per-taxon min/max/ratio used to size each strip.
//!
//! Every standard-scaling taxon gets `ratio = diff / max_diff`, where
//! `diff` is its (exaggeration-adjusted) max minus its min, so the strip
//! heights make abundance axes visually comparable across taxa. Taxa listed
//! as non-standard scaling (NSC) are excluded from the shared computation
//! and sized like a full strip with their user-specified limits.

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

use crate::config::NscSettings;
use crate::models::Taxon;

/// Exaggerated curves with a small maximum get this flat boost so they stay
/// visible at the shared horizontal scale.
const SMALL_MAX_LIMIT: f64 = 10.0;
const SMALL_MAX_BOOST: f64 = 20.0;

/// A zero-variance column would get ratio 0 and collapse its strip to
/// nothing; clamp to this floor so the taxon stays on the page. The raw
/// ratio is kept alongside for the export table.
const RATIO_FLOOR: f64 = 0.05;

/// Derived axis scaling for one taxon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingEntry {
    pub taxon: String,
    pub min: f64,
    pub max: f64,
    /// `max` plus the small-value boost when the taxon is exaggerated.
    pub adjusted_max: f64,
    /// Strip height relative to the tallest strip, floor-clamped.
    pub ratio: f64,
    /// The unclamped ratio, `diff / max_diff`.
    pub raw_ratio: f64,
    /// True when the entry uses user-specified limits instead of data.
    pub nsc: bool,
}

/// Compute scaling entries for all taxa, in input order.
///
/// All-zero columns must already have been dropped by the loader; what can
/// still legitimately arrive here is a constant non-zero column, which the
/// ratio floor keeps visible.
pub fn compute_scaling(taxa: &[Taxon], nsc: &NscSettings) -> Result<Vec<ScalingEntry>> {
    ensure!(!taxa.is_empty(), "no taxa to scale");
    for name in &nsc.taxa {
        ensure!(
            taxa.iter().any(|t| &t.name == name),
            "`nsc taxa` lists `{}` but no such column was loaded",
            name
        );
    }

    // First pass: data extents and exaggeration-adjusted maxima.
    let mut entries: Vec<ScalingEntry> = taxa
        .iter()
        .map(|t| {
            if let Some((lo, hi)) = nsc.limits_for(&t.name) {
                return ScalingEntry {
                    taxon: t.name.clone(),
                    min: lo,
                    max: hi,
                    adjusted_max: hi,
                    ratio: 1.0,
                    raw_ratio: 1.0,
                    nsc: true,
                };
            }
            let min = t.values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = t.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let adjusted_max = if t.style.exaggeration > 0.0 && max < SMALL_MAX_LIMIT {
                max + SMALL_MAX_BOOST
            } else {
                max
            };
            ScalingEntry {
                taxon: t.name.clone(),
                min,
                max,
                adjusted_max,
                ratio: 0.0,
                raw_ratio: 0.0,
                nsc: false,
            }
        })
        .collect();

    if entries.iter().all(|e| e.nsc) {
        return Ok(entries);
    }
    let max_diff = entries
        .iter()
        .filter(|e| !e.nsc)
        .map(|e| e.adjusted_max - e.min)
        .fold(0.0_f64, f64::max);
    ensure!(
        max_diff > 0.0,
        "every standard-scaling taxon has zero range; nothing to size strips by"
    );

    for e in entries.iter_mut().filter(|e| !e.nsc) {
        e.raw_ratio = (e.adjusted_max - e.min) / max_diff;
        e.ratio = e.raw_ratio.max(RATIO_FLOOR);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaxonStyle;

    fn taxon(name: &str, values: &[f64], exaggeration: f64) -> Taxon {
        Taxon {
            name: name.into(),
            values: values.to_vec(),
            style: TaxonStyle {
                exaggeration,
                ..TaxonStyle::default()
            },
        }
    }

    fn no_nsc() -> NscSettings {
        NscSettings {
            taxa: vec![],
            minima: vec![],
            maxima: vec![],
        }
    }

    #[test]
    fn worked_example_ratios() {
        let taxa = vec![
            taxon("A", &[0.0, 5.0, 10.0], 0.0),
            taxon("B", &[0.0, 20.0, 40.0], 0.0),
        ];
        let entries = compute_scaling(&taxa, &no_nsc()).unwrap();
        assert_eq!(entries[0].ratio, 0.25);
        assert_eq!(entries[1].ratio, 1.0);
    }

    #[test]
    fn ratios_bounded_and_largest_is_one() {
        let taxa = vec![
            taxon("A", &[1.0, 3.0], 0.0),
            taxon("B", &[0.0, 55.0], 0.0),
            taxon("C", &[2.0, 11.0], 0.0),
        ];
        let entries = compute_scaling(&taxa, &no_nsc()).unwrap();
        for e in &entries {
            assert!(e.ratio > 0.0 && e.ratio <= 1.0, "{}: {}", e.taxon, e.ratio);
        }
        assert_eq!(entries[1].ratio, 1.0);
    }

    #[test]
    fn small_max_boost_applies_to_exaggerated_taxa_only() {
        let taxa = vec![
            taxon("small-exagg", &[0.0, 4.0], 5.0),
            taxon("small-plain", &[0.0, 4.0], 0.0),
            taxon("large-exagg", &[0.0, 50.0], 5.0),
        ];
        let entries = compute_scaling(&taxa, &no_nsc()).unwrap();
        assert_eq!(entries[0].adjusted_max, 24.0);
        assert_eq!(entries[1].adjusted_max, 4.0);
        assert_eq!(entries[2].adjusted_max, 50.0);
    }

    #[test]
    fn boost_threshold_is_exclusive_at_ten() {
        let taxa = vec![
            taxon("at-ten", &[0.0, 10.0], 3.0),
            taxon("below-ten", &[0.0, 9.9], 3.0),
        ];
        let entries = compute_scaling(&taxa, &no_nsc()).unwrap();
        assert_eq!(entries[0].adjusted_max, 10.0);
        assert_eq!(entries[1].adjusted_max, 29.9);
    }

    #[test]
    fn zero_variance_gets_floor_not_zero() {
        let taxa = vec![
            taxon("flat", &[7.0, 7.0, 7.0], 0.0),
            taxon("normal", &[0.0, 40.0], 0.0),
        ];
        let entries = compute_scaling(&taxa, &no_nsc()).unwrap();
        assert_eq!(entries[0].raw_ratio, 0.0);
        assert_eq!(entries[0].ratio, RATIO_FLOOR);
    }

    #[test]
    fn nsc_taxa_use_user_limits() {
        let nsc = NscSettings {
            taxa: vec!["Charcoal".into()],
            minima: vec![0.0],
            maxima: vec![500.0],
        };
        let taxa = vec![
            taxon("Charcoal", &[0.0, 320.0], 0.0),
            taxon("Betula", &[0.0, 40.0], 0.0),
        ];
        let entries = compute_scaling(&taxa, &nsc).unwrap();
        assert!(entries[0].nsc);
        assert_eq!(entries[0].min, 0.0);
        assert_eq!(entries[0].max, 500.0);
        assert_eq!(entries[0].ratio, 1.0);
        // The NSC taxon does not take part in max_diff.
        assert_eq!(entries[1].ratio, 1.0);
    }

    #[test]
    fn unknown_nsc_taxon_rejected() {
        let nsc = NscSettings {
            taxa: vec!["Missing".into()],
            minima: vec![0.0],
            maxima: vec![1.0],
        };
        let taxa = vec![taxon("Betula", &[0.0, 40.0], 0.0)];
        assert!(compute_scaling(&taxa, &nsc).is_err());
    }

    #[test]
    fn all_flat_is_an_error() {
        let taxa = vec![taxon("flat", &[3.0, 3.0], 0.0)];
        assert!(compute_scaling(&taxa, &no_nsc()).is_err());
    }
}
