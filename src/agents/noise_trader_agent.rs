// src/agents/noise_trader_agent.rs
// Illustrative demonstration agent: submits and cancels limit orders around
// a random walk, driven entirely by its own seeded PRNG. Exercises the
// exchange's full LIMIT_ORDER / CANCEL_ORDER / response protocol for the
// demo scenario and for kernel/book integration tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::agents::Agent;
use crate::error::SimulatorError;
use crate::messages::{
    AgentId, CancelOrderPayload, LimitOrderPayload, Message, MessagePayload, MessageType, OrderId,
    Side, SimulatorApi,
};

pub struct NoiseTraderAgent {
    id: AgentId,
    name: String,
    exchange_id: AgentId,
    symbol: String,
    wakeup_period_ns: u64,
    mid: i64,
    next_order_seq: u64,
    open_orders: Vec<OrderId>,
    rng: ChaCha8Rng,
}

impl NoiseTraderAgent {
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        exchange_id: AgentId,
        symbol: impl Into<String>,
        wakeup_period_ns: u64,
        starting_mid: u64,
        seed: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            exchange_id,
            symbol: symbol.into(),
            wakeup_period_ns,
            mid: starting_mid as i64,
            next_order_seq: 0,
            open_orders: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn next_order_id(&mut self) -> OrderId {
        let id = format!("{}-{}", self.name, self.next_order_seq);
        self.next_order_seq += 1;
        id
    }
}

impl Agent for NoiseTraderAgent {
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
        sim.wakeup(self.id, sim.now_ns());
        Ok(())
    }

    fn on_wakeup(&mut self, sim: &mut dyn SimulatorApi, now_ns: u64) -> Result<(), SimulatorError> {
        self.mid = (self.mid + self.rng.gen_range(-5..=5)).max(1);

        // Occasionally cancel a resting order instead of placing a new one.
        if !self.open_orders.is_empty() && self.rng.gen_bool(0.3) {
            let idx = self.rng.gen_range(0..self.open_orders.len());
            let order_id = self.open_orders.remove(idx);
            sim.send(
                self.id,
                self.exchange_id,
                MessageType::CancelOrder,
                MessagePayload::CancelOrder(CancelOrderPayload { id: order_id }),
            );
        } else {
            let side = if self.rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
            let offset = self.rng.gen_range(1..=20);
            let price = match side {
                Side::Buy => (self.mid - offset).max(1) as u64,
                Side::Sell => (self.mid + offset) as u64,
            };
            let qty = self.rng.gen_range(1..=10);
            let order_id = self.next_order_id();
            self.open_orders.push(order_id.clone());

            trace!(agent_id = self.id, order_id = %order_id, ?side, price, qty, "noise trader placing order");
            sim.send(
                self.id,
                self.exchange_id,
                MessageType::LimitOrder,
                MessagePayload::LimitOrder(LimitOrderPayload { id: order_id, symbol: self.symbol.clone(), side, price, qty }),
            );
        }

        sim.wakeup(self.id, now_ns.saturating_add(self.wakeup_period_ns));
        Ok(())
    }

    fn on_message(&mut self, _sim: &mut dyn SimulatorApi, msg: &Message) -> Result<(), SimulatorError> {
        if let MessagePayload::OrderCancelled(p) = &msg.payload {
            self.open_orders.retain(|id| id != &p.order_id);
        }
        Ok(())
    }
}
