use anyhow::{Context, Result, ensure};
use clap::Parser;
use std::path::PathBuf;
use strata_rs::config::Settings;
use strata_rs::stack::{self, Scheme};
use strata_rs::viz::FigureModel;
use strata_rs::{data, scaling, storage, viz};

#[derive(Parser, Debug)]
#[command(
    name = "strata",
    version,
    about = "Render stratigraphic diagrams (depth vs. abundance) from tabular data"
)]
struct Cli {
    /// Project directory: input files are read from it, outputs land in it.
    dir: PathBuf,
    /// Name of the configuration file inside the project directory.
    config: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    ensure!(
        cli.dir.is_dir(),
        "`{}` is not a directory",
        cli.dir.display()
    );
    let settings = Settings::from_file(cli.dir.join(&cli.config))?;
    let dataset = data::load_dataset(&cli.dir, &settings)?;
    eprintln!(
        "Loaded {} taxa over {} depth samples",
        dataset.taxa.len(),
        dataset.depths.len()
    );

    let entries = scaling::compute_scaling(&dataset.taxa, &settings.nsc)
        .context("computing strip scaling")?;

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

    if settings.files.data_export {
        let base = &settings.files.output_file;
        let scaling_path = cli.dir.join(format!("{base}_scaling.csv"));
        storage::save_scaling_csv(&entries, &scaling_path)?;
        eprintln!("Saved scaling table to {}", scaling_path.display());
        if !stacks.is_empty() {
            let stacks_path = cli.dir.join(format!("{base}_stacks.json"));
            storage::save_stacks_json(&stacks, &stacks_path)?;
            eprintln!("Saved stack series to {}", stacks_path.display());
        }
    }

    let model = FigureModel::build(&settings, &dataset, &entries, &stacks)?;
    let written = viz::render_diagram(&cli.dir, &settings, &model)?;
    for path in &written {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
