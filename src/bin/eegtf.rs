use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use eegtf::{run_pipeline, io::Recording, PipelineConfig};

#[derive(Parser)]
#[command(name = "eegtf", about = "Event-locked epoching and Morlet time-frequency analysis")]
struct Args {
    /// recording.safetensors (data, sfreq, events, optional ICA model)
    #[arg(long)]
    input: PathBuf,

    /// results.safetensors output path
    #[arg(long)]
    output: PathBuf,

    /// JSON pipeline configuration; missing fields use the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Event label to epoch around (overrides the config)
    #[arg(long)]
    label: Option<String>,

    /// TFR decimation factor (overrides the config)
    #[arg(long)]
    decim: Option<usize>,

    /// Skip cropping
    #[arg(long)]
    no_crop: bool,

    /// Components to remove when the recording carries an ICA model (comma-separated)
    #[arg(long)]
    ica_exclude: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(label) = args.label {
        cfg.target_label = label;
    }
    if let Some(decim) = args.decim {
        cfg.tfr.decim = decim;
    }
    if args.no_crop {
        cfg.crop = None;
    }
    if let Some(list) = &args.ica_exclude {
        cfg.ica_exclude = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().parse())
            .collect::<Result<_, _>>()?;
    }

    let rec = Recording::load(&args.input)?;
    let out = run_pipeline(&rec.signal, &rec.events, rec.ica.as_ref(), None, &cfg)?;
    log::info!(
        "{} epochs kept, {} dropped at the edges, TFR {} freqs × {} times",
        out.epochs.n_epochs(),
        out.dropped.len(),
        out.tfr.freqs().len(),
        out.tfr.times().len()
    );

    out.write(&args.output)?;
    log::info!("written → {}", args.output.display());
    Ok(())
}
