// src/agents/human_agent.rs
// A human-controlled participant. Order-entry calls arrive from another
// thread (a GUI or gateway process) over a channel and are drained once per
// wakeup on the tick thread, so they observe the same single-threaded
// ordering guarantees as every other agent's handler. Reads (`list_open`,
// `get_balances`) go through a shared, mutex-guarded state snapshot instead,
// since there is no request/reply round trip a gateway thread could block on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

use crate::agents::Agent;
use crate::error::SimulatorError;
use crate::messages::{
    AgentId, CancelOrderPayload, LimitOrderPayload, MarketOrderPayload, Message, MessagePayload,
    MessageType, ModifyOrderPayload, OrderId, Price, Qty, Side, SimulatorApi,
};

/// A command issued by the human, marshaled onto the tick thread.
#[derive(Debug, Clone)]
pub enum HumanCommand {
    PlaceLimit { id: OrderId, side: Side, price: Price, qty: Qty },
    PlaceMarket { side: Side, qty: Qty },
    Cancel { id: OrderId },
    Modify { id: OrderId, price: Option<Price>, qty: Option<Qty> },
}

/// A response surfaced back to whoever is watching this agent's state: the
/// exchange agent's reply, stored for polling by a gateway thread.
#[derive(Debug, Clone)]
pub enum HumanNotice {
    Accepted { order_id: OrderId },
    Executed { order_id: Option<OrderId>, price: Price, qty: Qty },
    Cancelled { order_id: OrderId },
    Rejected { reason: String, order_id: Option<OrderId> },
}

/// Cash and net position accumulated from this human's own fills. Not a
/// margin account — there is no mark-to-market or liquidation here, just a
/// running ledger of what its own executions have cost and earned it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HumanBalances {
    /// Cents spent (negative) or received (positive) across all fills.
    pub cash: i64,
    /// Net lots held: positive long, negative short.
    pub position: i64,
}

/// State shared between the agent (tick thread) and its handle (gateway
/// thread). The agent is the only writer; the handle only reads.
#[derive(Default)]
struct SharedState {
    open_orders: HashMap<OrderId, (Side, Price, Qty)>,
    balances: HumanBalances,
}

/// Cheap handle a gateway thread uses to submit commands and poll for
/// replies, open orders, and balances. Cloning shares the same channel and
/// state.
#[derive(Clone)]
pub struct HumanHandle {
    commands: Sender<HumanCommand>,
    state: Arc<Mutex<SharedState>>,
}

impl HumanHandle {
    pub fn place_limit(&self, id: impl Into<OrderId>, side: Side, price: Price, qty: Qty) {
        let _ = self.commands.send(HumanCommand::PlaceLimit { id: id.into(), side, price, qty });
    }

    pub fn place_market(&self, side: Side, qty: Qty) {
        let _ = self.commands.send(HumanCommand::PlaceMarket { side, qty });
    }

    pub fn cancel(&self, id: impl Into<OrderId>) {
        let _ = self.commands.send(HumanCommand::Cancel { id: id.into() });
    }

    pub fn modify(&self, id: impl Into<OrderId>, price: Option<Price>, qty: Option<Qty>) {
        let _ = self.commands.send(HumanCommand::Modify { id: id.into(), price, qty });
    }

    /// Orders currently believed resident, as of the last processed reply.
    pub fn list_open(&self) -> Vec<(OrderId, Side, Price, Qty)> {
        let state = self.state.lock().expect("human state poisoned");
        state.open_orders.iter().map(|(id, (s, p, q))| (id.clone(), *s, *p, *q)).collect()
    }

    /// Cash and net position accumulated from this human's own fills.
    pub fn get_balances(&self) -> HumanBalances {
        self.state.lock().expect("human state poisoned").balances
    }
}

pub struct HumanAgent {
    id: AgentId,
    name: String,
    exchange_id: AgentId,
    symbol: String,
    commands: Receiver<HumanCommand>,
    poll_period_ns: u64,
    state: Arc<Mutex<SharedState>>,
    notices: Vec<HumanNotice>,
}

impl HumanAgent {
    /// Returns the agent plus the handle a gateway thread should hold onto.
    /// `poll_period_ns` is how often the agent wakes up to drain `commands`.
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        exchange_id: AgentId,
        symbol: impl Into<String>,
        poll_period_ns: u64,
    ) -> (Self, HumanHandle) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let state = Arc::new(Mutex::new(SharedState::default()));
        let agent = Self {
            id,
            name: name.into(),
            exchange_id,
            symbol: symbol.into(),
            commands: rx,
            poll_period_ns,
            state: state.clone(),
            notices: Vec::new(),
        };
        (agent, HumanHandle { commands: tx, state })
    }

    pub fn list_open(&self) -> Vec<(OrderId, Side, Price, Qty)> {
        let state = self.state.lock().expect("human state poisoned");
        state.open_orders.iter().map(|(id, (s, p, q))| (id.clone(), *s, *p, *q)).collect()
    }

    pub fn get_balances(&self) -> HumanBalances {
        self.state.lock().expect("human state poisoned").balances
    }

    /// Drains and returns every notice accumulated since the last call.
    pub fn drain_notices(&mut self) -> Vec<HumanNotice> {
        std::mem::take(&mut self.notices)
    }

    fn drain_commands(&mut self, sim: &mut dyn SimulatorApi) {
        while let Ok(cmd) = self.commands.try_recv() {
            debug!(agent_id = self.id, ?cmd, "human command");
            match cmd {
                HumanCommand::PlaceLimit { id, side, price, qty } => {
                    sim.send(
                        self.id,
                        self.exchange_id,
                        MessageType::LimitOrder,
                        MessagePayload::LimitOrder(LimitOrderPayload { id, symbol: self.symbol.clone(), side, price, qty }),
                    );
                }
                HumanCommand::PlaceMarket { side, qty } => {
                    sim.send(
                        self.id,
                        self.exchange_id,
                        MessageType::MarketOrder,
                        MessagePayload::MarketOrder(MarketOrderPayload { symbol: self.symbol.clone(), side, qty }),
                    );
                }
                HumanCommand::Cancel { id } => {
                    sim.send(self.id, self.exchange_id, MessageType::CancelOrder, MessagePayload::CancelOrder(CancelOrderPayload { id }));
                }
                HumanCommand::Modify { id, price, qty } => {
                    sim.send(
                        self.id,
                        self.exchange_id,
                        MessageType::ModifyOrder,
                        MessagePayload::ModifyOrder(ModifyOrderPayload { id, price, qty }),
                    );
                }
            }
        }
    }
}

impl Agent for HumanAgent {
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
        self.drain_commands(sim);
        // Poll again next period regardless of whether anything arrived;
        // this is the "drained once per wakeup" scheduling model.
        sim.wakeup(self.id, now_ns.saturating_add(self.poll_period_ns));
        Ok(())
    }

    fn on_message(&mut self, _sim: &mut dyn SimulatorApi, msg: &Message) -> Result<(), SimulatorError> {
        let mut state = self.state.lock().expect("human state poisoned");
        match &msg.payload {
            MessagePayload::OrderAccepted(p) => {
                if let (Some(side), Some(price), Some(qty)) = (p.side, p.price, p.qty) {
                    state.open_orders.insert(p.order_id.clone(), (side, price, qty));
                }
                self.notices.push(HumanNotice::Accepted { order_id: p.order_id.clone() });
            }
            MessagePayload::OrderExecuted(p) => {
                let notional = (p.price * p.qty) as i64;
                match p.side_for_recipient {
                    Side::Buy => {
                        state.balances.cash -= notional;
                        state.balances.position += p.qty as i64;
                    }
                    Side::Sell => {
                        state.balances.cash += notional;
                        state.balances.position -= p.qty as i64;
                    }
                }
                self.notices.push(HumanNotice::Executed { order_id: p.order_id.clone(), price: p.price, qty: p.qty });
            }
            MessagePayload::OrderCancelled(p) => {
                state.open_orders.remove(&p.order_id);
                self.notices.push(HumanNotice::Cancelled { order_id: p.order_id.clone() });
            }
            MessagePayload::OrderRejected(p) => {
                self.notices.push(HumanNotice::Rejected { reason: p.reason.clone(), order_id: p.ref_id.clone() });
            }
            _ => {}
        }
        Ok(())
    }
}
