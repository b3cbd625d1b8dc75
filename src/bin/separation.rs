use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use engram_core::{
    export_layout, export_trials, group_streams, hippocampal_streams, layout_sources, resolve,
    sources_per_stream, spike_train, Container, Duration, LayoutMode, LayoutParams, SessionMeta,
};

#[derive(Parser)]
#[command(name = "separation", about = "Synthetic pattern-separation session demo")]
struct Args {
    /// Number of spike sources
    #[arg(long, default_value_t = 96)]
    sources: usize,

    /// Number of recording streams (ideally divisible by 8)
    #[arg(long, default_value_t = 24)]
    streams: usize,

    /// Recording length in seconds
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Sampling rate in Hz
    #[arg(long, default_value_t = 2000.0)]
    fs: f64,

    /// Hierarchy levels to distinguish (comma-separated, e.g. "0,1")
    #[arg(long, default_value = "0,1")]
    method: String,

    /// Fan sources out per stream instead of one grid per group
    #[arg(long, default_value_t = false)]
    by_stream: bool,

    /// Layout coordinates output (safetensors)
    #[arg(long, default_value = "layout.safetensors")]
    layout_out: PathBuf,

    /// Trial slices output (safetensors)
    #[arg(long, default_value = "trials.safetensors")]
    trials_out: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let method: Vec<usize> = if args.method.is_empty() {
        vec![]
    } else {
        args.method
            .split(',')
            .map(|s| s.trim().parse())
            .collect::<Result<_, _>>()?
    };

    // Synthetic session: sources round-robin over streams.
    let meta = SessionMeta::new("synthetic", args.fs);
    let labels: Vec<u32> = (0..args.sources).map(|k| (k % args.streams) as u32).collect();
    let raster = spike_train(args.sources, args.seconds, args.fs);
    println!(
        "Built {} × {} spike raster @ {} Hz",
        raster.nrows(),
        raster.ncols(),
        args.fs
    );

    let mut duration = Duration::new(std::sync::Arc::clone(&meta));
    duration.add_bin(Container::binary(raster, labels.clone(), meta)?);
    let event_times: Vec<f64> = (1..args.seconds as usize).map(|s| s as f64).collect();
    duration.add_event("SAMPLE_ON", event_times);

    let trials = duration.extract_trials("SAMPLE_ON", (-0.5, 0.5))?;
    println!("Extracted {} trials", trials.len());
    export_trials(&duration, &args.trials_out)?;
    println!("Trials → {}", args.trials_out.display());

    // Spatial layout.
    let streams = hippocampal_streams(args.streams);
    let index = resolve(&streams, &sources_per_stream(&labels, args.streams))?;
    let groups = group_streams(&index, &method)?;
    let mode = if args.by_stream { LayoutMode::StreamSeparated } else { LayoutMode::Flat };
    let xyz = layout_sources(&groups, index.n_levels(), &method, mode, &LayoutParams::default())?;
    println!("Laid out {} sources in {} groups", xyz.nrows(), groups.len());

    export_layout(&xyz, &args.layout_out)?;
    println!("Layout → {}", args.layout_out.display());

    Ok(())
}
