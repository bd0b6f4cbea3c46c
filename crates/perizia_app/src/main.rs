mod cli;
mod config;
mod files;
mod render;
mod runner;

use anyhow::{bail, Result};
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use log::LevelFilter;
use perizia_core::{AppState, JobPhase, Msg};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::runner::{EffectRunner, Session};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    engine_logging::initialize(cli.log, level);

    if let Err(err) = run(cli) {
        engine_error!("{:#}", err);
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    engine_info!(
        "Starting perizia base_url={} poll_interval_secs={} files={}",
        config.base_url,
        config.poll_interval_secs,
        cli.files.len()
    );

    let files = files::load_files(&cli.files)?;
    let state = AppState::new()
        .with_lot_filter(config.lot_filter.clone())
        .with_currency(config.currency.clone());
    let mut session = Session::new(state, EffectRunner::new(&config)?);

    session.dispatch(Msg::FilesSelected(files));
    if !session.view().can_submit {
        bail!("none of the given files is a PDF");
    }
    session.dispatch(Msg::SubmitClicked);
    session.wait_for_outcome()?;

    if let Some(lot_id) = &cli.lot {
        if session.state().phase() == JobPhase::Succeeded {
            session.select_lot(lot_id);
        }
    }

    for line in render::report(&session.view()) {
        println!("{line}");
    }

    if let Some(failure) = session.state().failure() {
        bail!("{}", failure.message);
    }

    if let Some(dir) = &cli.output {
        let path = session.export(dir)?;
        println!("Result written to {}", path.display());
    }
    Ok(())
}
