// src/main.rs
// Program entrypoint: parses CLI flags, initializes structured logging,
// runs the demo scenario, and halts with a diagnostic on a fatal invariant.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bourse_sim::config::SimConfig;
use bourse_sim::scenarios;

fn main() {
    let config = SimConfig::parse();

    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env().add_directive("bourse_sim=info".parse().unwrap())).init();

    if let Err(err) = scenarios::simple_demo::run(&config) {
        tracing::error!(%err, "simulation halted on fatal error");
        std::process::exit(1);
    }
}
