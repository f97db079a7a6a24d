#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! CLI entrypoint for the filling control subsystem.
//!
//! Responsibilities:
//! - Parse flags and load the configuration store (C2)
//! - Spawn the hardware engine (C3) and the sequencer (C4)
//! - Initialize tracing and own log setup
//! - Run until an operator shutdown signal, then join both threads
//! - Map fatal startup errors to stable exit codes

mod cli;
mod error_fmt;
mod tracing_setup;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use fill_config::Configuration;
use fill_core::SequencerEngine;
use fill_hardware::{HardwareEngine, SimShadow, SimulationMode};
use fill_traits::{Clock, MonotonicClock};

use cli::Cli;
use error_fmt::{exit_code_for_error, humanize};

fn main() -> eyre::Result<()> {
    let _ = color_eyre::install();

    if let Err(e) = real_main() {
        eprintln!("{}", humanize(&e));
        std::process::exit(exit_code_for_error(&e));
    }
    Ok(())
}

fn real_main() -> eyre::Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(cli.json, &cli.log_level);

    if cli.windowed {
        tracing::info!("windowed mode requested; this build hosts no display surface");
    }

    let config = Configuration::load(&cli.config, &cli.product)?;
    let config = Arc::new(Mutex::new(config));

    let mode = if cli.simulate {
        SimulationMode::Simulated(SimShadow::new())
    } else {
        SimulationMode::Real
    };
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());

    let hw_engine = HardwareEngine::spawn(mode, clock.clone())?;
    let hw = hw_engine.handle();
    let seq_engine = SequencerEngine::spawn(config, hw.clone(), clock)?;
    let ui = fill_ui::UiAdapter::new(hw, seq_engine.handle());
    let _ = &ui; // wired for a future display surface; unused by this headless build

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_writer = shutdown.clone();
    ctrlc::set_handler(move || {
        eprintln!("received shutdown signal, stopping gracefully...");
        shutdown_writer.store(true, Ordering::SeqCst);
    })?;

    while !shutdown.load(Ordering::Acquire) {
        std::thread::sleep(Duration::from_millis(100));
    }

    tracing::info!("shutting down");
    drop(seq_engine);
    drop(hw_engine);
    Ok(())
}
