// src/agents/oracle_agent.rs
// Periodic fundamental-value signal, bus-only: it never sends a routed
// message, it emits an ORACLE_TICK event that demonstration strategies and
// loggers can subscribe to.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::agents::Agent;
use crate::error::SimulatorError;
use crate::events::SimEvent;
use crate::messages::{AgentId, SimulatorApi};

pub struct OracleAgent {
    id: AgentId,
    name: String,
    symbol: String,
    period_ns: u64,
    fundamental: i64,
    step_bound: i64,
    rng: ChaCha8Rng,
}

impl OracleAgent {
    pub fn new(id: AgentId, name: impl Into<String>, symbol: impl Into<String>, period_ns: u64, base_value: u64, seed: u64) -> Self {
        Self {
            id,
            name: name.into(),
            symbol: symbol.into(),
            period_ns,
            fundamental: base_value as i64,
            step_bound: 10,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Agent for OracleAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn on_start(&mut self, sim: &mut dyn SimulatorApi) -> Result<(), SimulatorError> {
        let now = sim.now_ns();
        sim.wakeup(self.id, now);
        Ok(())
    }

    fn on_wakeup(&mut self, sim: &mut dyn SimulatorApi, now_ns: u64) -> Result<(), SimulatorError> {
        let step = self.rng.gen_range(-self.step_bound..=self.step_bound);
        self.fundamental = (self.fundamental + step).max(1);

        trace!(agent_id = self.id, fundamental = self.fundamental, "oracle tick");
        sim.emit_event(SimEvent::OracleTick { ts: now_ns, symbol: self.symbol.clone(), fundamental: self.fundamental as u64 });

        sim.wakeup(self.id, now_ns.saturating_add(self.period_ns));
        Ok(())
    }
}
