// src/kernel.rs
// Core simulation kernel: virtual time, the time-priority queue, the agent
// arena, and message delivery.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::agents::Agent;
use crate::book::L2Snapshot;
use crate::error::SimulatorError;
use crate::events::{EventBus, EventListener, SimEvent};
use crate::latency::LatencyModel;
use crate::messages::{AgentId, Message, MessagePayload, MessageType, SimulatorApi};
use crate::queue::TimeQueue;

/// Messages that mutate book state and are therefore mirrored onto the bus
/// as an `OrderLog` event at `send` time, before delivery.
fn is_order_mutation(kind: MessageType) -> bool {
    matches!(kind, MessageType::LimitOrder | MessageType::MarketOrder | MessageType::CancelOrder | MessageType::ModifyOrder)
}

/// Discrete-event kernel: owns virtual time, the message queue, the agent
/// arena, and the event bus. Agents are looked up by id in a flat `Vec`
/// (arena + integer-id pattern) rather than through a keyed map, so message
/// delivery can temporarily move an agent out of the vector and call back
/// into it without aliasing `&mut self`.
pub struct Kernel {
    time_ns: u64,
    latency: Option<Box<dyn LatencyModel>>,
    queue: TimeQueue,
    agents: Vec<Box<dyn Agent>>,
    exchange_id: AgentId,
    event_bus: EventBus,
}

impl Kernel {
    /// `exchange_id` is the id that will be advertised by `exchange_id()`
    /// once an agent with that id is attached; it is not validated against
    /// attached agents until `run_*` is first called.
    pub fn new(latency: Option<Box<dyn LatencyModel>>, exchange_id: AgentId) -> Self {
        Self { time_ns: 0, latency, queue: TimeQueue::new(), agents: Vec::new(), exchange_id, event_bus: EventBus::new() }
    }

    pub fn event_bus_mut(&mut self) -> &mut EventBus {
        &mut self.event_bus
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.event_bus.subscribe(listener);
    }

    /// Attach an agent, calling `on_attach` then `on_start` immediately.
    pub fn add_agent(&mut self, mut agent: Box<dyn Agent>) -> Result<(), SimulatorError> {
        info!(agent_id = agent.id(), agent_name = agent.name(), "attaching agent");
        {
            let sim: &mut dyn SimulatorApi = self;
            agent.on_attach(sim)?;
        }
        self.agents.push(agent);
        let idx = self.agents.len() - 1;
        let mut agent = self.agents.remove(idx);
        {
            let sim: &mut dyn SimulatorApi = self;
            agent.on_start(sim)?;
        }
        self.agents.insert(idx, agent);
        Ok(())
    }

    /// Read-only L2 snapshot of the exchange's book, for external
    /// collaborators (renderers, gateways). Always returns owned data —
    /// callers never see a live reference into kernel state.
    pub fn book_snapshot(&self, depth: usize) -> Option<L2Snapshot> {
        let agent = self.agents.iter().find(|a| a.id() == self.exchange_id)?;
        let exchange = agent.as_any().downcast_ref::<crate::agents::exchange_agent::ExchangeAgent>()?;
        Some(exchange.book().snapshot(depth))
    }

    /// Delivers every message due by `horizon`, advancing the clock to each
    /// message's own `at` as it is delivered (not just to `horizon`) so a
    /// handler's `now_ns()` reflects exactly when its message was scheduled.
    fn deliver_due(&mut self, horizon: u64) -> Result<(), SimulatorError> {
        while let Some(next_at) = self.queue.peek_at() {
            if next_at > horizon {
                break;
            }
            let msg = self.queue.pop().expect("queue non-empty: just peeked");
            self.time_ns = msg.at;
            self.deliver(msg)?;
        }
        Ok(())
    }

    fn deliver(&mut self, msg: Message) -> Result<(), SimulatorError> {
        let target = msg.to;
        let Some(idx) = self.agents.iter().position(|a| a.id() == target) else {
            warn!(to = target, msg_type = ?msg.msg_type, "message addressed to unknown agent, dropped");
            return Ok(());
        };

        let mut agent = self.agents.remove(idx);
        let result = {
            let sim: &mut dyn SimulatorApi = self;
            match msg.msg_type {
                MessageType::Wakeup => agent.on_wakeup(sim, msg.at),
                _ => agent.on_message(sim, &msg),
            }
        };
        self.agents.insert(idx, agent);
        result
    }

    /// Advance one tick: compute the new horizon (`now + tick_ns`), deliver
    /// every message due by that horizon — each handler sees `now_ns()`
    /// equal to its own message's scheduled `at`, not the horizon — then
    /// land the clock on the horizon itself so idle ticks still advance
    /// virtual time by exactly `tick_ns`.
    pub fn tick(&mut self, tick_ns: u64) -> Result<(), SimulatorError> {
        let horizon = self.time_ns.saturating_add(tick_ns);
        self.deliver_due(horizon)?;
        self.time_ns = horizon;
        Ok(())
    }

    /// Run `n_ticks` of `tick_ns` each, sleeping `tick_ns` of wall-clock time
    /// between ticks (for interactive/GUI-paced scenarios). Stops early if
    /// the queue empties.
    pub fn run_wall_paced(&mut self, tick_ns: u64, n_ticks: usize) -> Result<(), SimulatorError> {
        for step in 0..n_ticks {
            self.tick(tick_ns)?;
            debug!(step, time_ns = self.time_ns, "tick complete");
            if self.queue.is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_nanos(tick_ns.min(50_000_000)));
        }
        self.stop_all()
    }

    /// Run `n_ticks` of `tick_ns` each with no wall-clock pacing. Produces
    /// results bit-identical to `run_wall_paced` for the same scenario,
    /// since virtual time and delivery order never depend on wall-clock
    /// timing, only on `tick_ns` and message `at` values.
    pub fn run_as_fast_as_possible(&mut self, tick_ns: u64, n_ticks: usize) -> Result<(), SimulatorError> {
        for _ in 0..n_ticks {
            self.tick(tick_ns)?;
            if self.queue.is_empty() {
                break;
            }
        }
        self.stop_all()
    }

    fn stop_all(&mut self) -> Result<(), SimulatorError> {
        let ids: Vec<AgentId> = self.agents.iter().map(|a| a.id()).collect();
        for id in ids {
            let Some(idx) = self.agents.iter().position(|a| a.id() == id) else { continue };
            let mut agent = self.agents.remove(idx);
            let result = {
                let sim: &mut dyn SimulatorApi = self;
                agent.on_stop(sim)
            };
            self.agents.insert(idx, agent);
            result?;
        }
        info!(time_ns = self.time_ns, "simulation finished");
        Ok(())
    }
}

impl SimulatorApi for Kernel {
    fn now_ns(&self) -> u64 {
        self.time_ns
    }

    fn exchange_id(&self) -> AgentId {
        self.exchange_id
    }

    fn send(&mut self, from: AgentId, to: AgentId, kind: MessageType, payload: MessagePayload) {
        let network = self.latency.as_ref().map(|l| l.delay_ns(from, to)).unwrap_or(0);
        let compute = self.latency.as_ref().map(|l| l.compute_ns(to)).unwrap_or(0);
        let at = self.time_ns.saturating_add(network).saturating_add(compute);

        if is_order_mutation(kind) {
            let (symbol, side, price, qty) = match &payload {
                MessagePayload::LimitOrder(p) => (Some(p.symbol.clone()), Some(p.side), Some(p.price), Some(p.qty)),
                MessagePayload::MarketOrder(p) => (Some(p.symbol.clone()), Some(p.side), None, Some(p.qty)),
                _ => (None, None, None, None),
            };
            self.event_bus.emit(SimEvent::OrderLog { ts: self.time_ns, from, to, msg_type: kind, symbol, side, price, qty });
        }

        let msg = Message::new(from, to, kind, payload, at);
        self.queue.push(msg);
    }

    fn wakeup(&mut self, agent_id: AgentId, at_ns: u64) {
        self.queue.push(Message::wakeup(agent_id, at_ns));
    }

    fn broadcast(&mut self, from: AgentId, kind: MessageType, payload: MessagePayload) {
        let targets: Vec<AgentId> = self.agents.iter().map(|a| a.id()).filter(|&id| id != from).collect();
        for to in targets {
            let network = self.latency.as_ref().map(|l| l.delay_ns(from, to)).unwrap_or(0);
            let compute = self.latency.as_ref().map(|l| l.compute_ns(to)).unwrap_or(0);
            let at = self.time_ns.saturating_add(network).saturating_add(compute);
            self.queue.push(Message::new(from, to, kind, payload.clone(), at));
        }
    }

    fn emit_event(&mut self, event: SimEvent) {
        self.event_bus.emit(event);
    }
}
