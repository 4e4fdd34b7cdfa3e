use crate::scaling::ScalingEntry;
use crate::stack::StackSeries;
use anyhow::Result;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Save the computed scaling table as CSV with header.
pub fn save_scaling_csv<P: AsRef<Path>>(entries: &[ScalingEntry], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize(("taxon", "min", "max", "adjusted_max", "ratio", "raw_ratio", "nsc"))?;
    for e in entries {
        wtr.serialize((
            &e.taxon,
            e.min,
            e.max,
            e.adjusted_max,
            e.ratio,
            e.raw_ratio,
            e.nsc,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the aggregated stack series as pretty JSON.
pub fn save_stacks_json<P: AsRef<Path>>(stacks: &[StackSeries], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(stacks)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
