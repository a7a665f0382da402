use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use shared::protocol::HandData;
use table_core::{
    attach_renderer, load_settings, load_settings_from, Message, Model, TableRuntime,
};
use tokio::{runtime::Handle, sync::watch};

mod render;
mod sinks;

use render::TerminalRenderer;
use sinks::{LoggedAnimations, LoggedSound};

const IDLE_LIMIT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
struct Args {
    /// Hand snapshot with an optional replay script, as JSON.
    #[arg(long)]
    hand: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop after this many replay steps.
    #[arg(long)]
    steps: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = match &args.config {
        Some(path) => load_settings_from(path)?,
        None => load_settings(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let raw = fs::read_to_string(&args.hand)
        .with_context(|| format!("failed to read hand file '{}'", args.hand.display()))?;
    let hand = HandData::from_json(&raw)
        .with_context(|| format!("failed to parse hand file '{}'", args.hand.display()))?;
    hand.validate().context("hand file is malformed")?;
    let limit = args
        .steps
        .map_or(hand.replay.len(), |steps| steps.min(hand.replay.len()));

    let runtime = TableRuntime::start(
        &settings,
        Handle::current(),
        Arc::new(LoggedSound),
        Arc::new(LoggedAnimations),
    )
    .context("failed to start table owner thread")?;

    let (models_tx, mut models) = watch::channel(runtime.store().current_model());
    let _feed = runtime.store().subscribe(move |model| {
        let _ = models_tx.send(Arc::clone(model));
    });
    let _view = attach_renderer(runtime.store(), TerminalRenderer::default());

    let dispatcher = runtime.dispatcher();
    dispatcher.send(Message::LoadHand(hand))?;
    tracing::info!(steps = limit, "replaying hand");

    let mut requested = None;
    loop {
        let model = Arc::clone(&models.borrow_and_update());
        if model.generation > 0 {
            if finished(&model, limit) {
                break;
            }
            if ready_for_step(&model, limit) && requested != Some(model.replay.cursor) {
                dispatcher.send(Message::ReplayAdvance)?;
                requested = Some(model.replay.cursor);
            }
        }

        match tokio::time::timeout(IDLE_LIMIT, models.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => bail!("table store went away"),
            Err(_) => bail!("table made no progress for {}s", IDLE_LIMIT.as_secs()),
        }
    }

    tracing::info!("replay finished");
    runtime.shutdown();
    Ok(())
}

fn ready_for_step(model: &Model, limit: usize) -> bool {
    model.replay.pending.is_none() && model.replay.cursor < limit
}

fn finished(model: &Model, limit: usize) -> bool {
    model.replay.pending.is_none()
        && model.replay.cursor >= limit
        && model.pending_timers.is_empty()
}
