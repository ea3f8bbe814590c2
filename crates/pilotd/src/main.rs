use std::process::ExitCode;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use serde_json::json;
use tracing::info;

use pilot_config::{Config, ConfigError};
use pilot_engine::ScriptedEngine;
use pilotd::{BootstrapError, Bridge, ConfigLoader, SystemConfigLoader, initialise_telemetry};

fn main() -> ExitCode {
    let config = match SystemConfigLoader.load() {
        Ok(config) => config,
        Err(ConfigError::Arguments(error)) => {
            // Help and version requests land here too; clap renders them.
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("pilotd: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<(), BootstrapError> {
    initialise_telemetry(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let engine = demo_engine(&config);
    let mut bridge = Bridge::new(config, Box::new(engine))?;
    bridge.start()?;
    if let Some(addr) = bridge.local_addr() {
        info!(%addr, "bridge ready");
    }
    wait_for_shutdown_signal();
    bridge.shutdown();
    Ok(())
}

/// Seeds the in-memory engine the daemon hosts when no real engine is
/// embedded.
fn demo_engine(config: &Config) -> ScriptedEngine {
    let mut engine = ScriptedEngine::new(config.game_title.clone());
    engine
        .define_label("start")
        .define_label("ending")
        .show_line(None::<String>, "The forge is cold. Someone must light it.")
        .seed_variable("chapter", json!(1));
    engine
}

fn wait_for_shutdown_signal() {
    match Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            if signals.forever().next().is_some() {
                info!("shutdown signal received");
            }
        }
        Err(error) => {
            eprintln!("pilotd: failed to install signal handlers: {error}");
        }
    }
}
