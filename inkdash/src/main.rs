use anyhow::{Context, Result};
use clap::Parser;
use inkdash::{
    config::Args,
    panel::Panel,
    runtime::{run, Pipeline},
    sampler::ProcSampler,
    sim::RandomTaps,
    transport::MemoryPanel,
};
use log::info;

/// Chance that a touch scan carries a simulated tap.
const TAP_CHANCE: f64 = 0.01;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let policy = args.policy();
    let panel = Panel::from(args.panel);

    let mut transport = MemoryPanel::new(panel);
    if let Some(path) = &args.save_image {
        info!("saving panel image to {}", path.display());
        transport = transport.saving_to(path);
    }
    let sampler = ProcSampler::new(&args.proc_root);
    let touches = (!args.no_touch).then(|| RandomTaps::new(panel, TAP_CHANCE));

    let mut pipeline = Pipeline::new(panel, &policy, sampler, transport);
    pipeline.start().context("panel initialisation failed")?;

    let pipeline = run(pipeline, touches, policy, args.ticks).await?;
    let (full, partial) = pipeline.transport().writes();
    info!("done after {full} full and {partial} partial refreshes");
    Ok(())
}
