// src/config.rs
// CLI-driven configuration. No external config-file format is needed: every
// knob the spec calls out is a `clap` flag with a sensible default.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "bourse-sim", about = "Deterministic single-symbol limit-order-book exchange simulator")]
pub struct SimConfig {
    /// Virtual nanoseconds advanced per tick.
    #[arg(long, default_value_t = 200_000_000)]
    pub tick_ns: u64,

    /// Number of ticks to run before stopping.
    #[arg(long, default_value_t = 200)]
    pub steps: usize,

    /// Uplink (agent -> exchange) delay, in milliseconds.
    #[arg(long, default_value_t = 200)]
    pub rpc_up_ms: u64,

    /// Downlink (exchange -> agent) delay, in milliseconds.
    #[arg(long, default_value_t = 200)]
    pub rpc_down_ms: u64,

    /// Exchange-side compute delay, in milliseconds.
    #[arg(long, default_value_t = 300)]
    pub compute_ms: u64,

    /// Symmetric uniform jitter applied to the downlink, in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub down_jitter_ms: u64,

    /// Price levels published per side in every MARKET_DATA broadcast.
    #[arg(long, default_value_t = 10)]
    pub md_depth: usize,

    /// Seed shared by the latency model and every demonstration agent's PRNG.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Disable latency modeling entirely (zero delay on every message).
    #[arg(long, default_value_t = false)]
    pub no_latency: bool,

    /// Directory CSV logs are written to. Omit to disable logging.
    #[arg(long)]
    pub logs_dir: Option<std::path::PathBuf>,
}

impl SimConfig {
    pub fn rpc_up_ns(&self) -> u64 {
        self.rpc_up_ms * 1_000_000
    }

    pub fn rpc_down_ns(&self) -> u64 {
        self.rpc_down_ms * 1_000_000
    }

    pub fn compute_ns(&self) -> u64 {
        self.compute_ms * 1_000_000
    }

    pub fn down_jitter_ns(&self) -> u64 {
        self.down_jitter_ms * 1_000_000
    }
}
