// src/agents/exchange_agent.rs
// The exchange agent: owns the order book for one symbol, validates inbound
// order messages, and implements the full response protocol.

use tracing::{debug, warn};

use crate::agents::Agent;
use crate::book::{Execution, ModifyOutcome, OrderBook};
use crate::error::{SimulatorError, ValidationError};
use crate::events::SimEvent;
use crate::messages::{
    AgentId, CancelOrderPayload, LimitOrderPayload, MarketDataPayload, MarketOrderPayload, Message,
    MessagePayload, MessageType, ModifyOrderPayload, OrderAcceptedPayload, OrderCancelledPayload,
    OrderExecutedPayload, OrderRejectedPayload, QuerySpreadPayload, RejectRefType, Role,
    SimulatorApi,
};

/// Tunables that would otherwise be hidden constants.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeConfig {
    /// Depth published in every `MARKET_DATA` broadcast.
    pub md_depth: usize,
    /// Extra delay, in nanoseconds, charged on top of the latency model's
    /// own `compute_ns` before a response is sent. Zero unless a scenario
    /// wants to model an unusually slow matching pipeline.
    pub pipeline_delay_ns: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self { md_depth: 10, pipeline_delay_ns: 0 }
    }
}

pub struct ExchangeAgent {
    id: AgentId,
    name: String,
    symbol: String,
    book: OrderBook,
    config: ExchangeConfig,
}

impl ExchangeAgent {
    pub fn new(id: AgentId, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::with_config(id, name, symbol, ExchangeConfig::default())
    }

    pub fn with_config(id: AgentId, name: impl Into<String>, symbol: impl Into<String>, config: ExchangeConfig) -> Self {
        let symbol = symbol.into();
        Self { id, name: name.into(), book: OrderBook::new(symbol.clone()), symbol, config }
    }

    pub fn with_pipeline_delay_ns(mut self, ns: u64) -> Self {
        self.config.pipeline_delay_ns = ns;
        self
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    fn reject(
        &self,
        sim: &mut dyn SimulatorApi,
        to: AgentId,
        reason: ValidationError,
        ref_id: Option<String>,
    ) {
        let msg = reason.to_string();
        warn!(agent_id = to, reason = %msg, "order rejected");

        sim.send(
            self.id,
            to,
            MessageType::OrderRejected,
            MessagePayload::OrderRejected(OrderRejectedPayload {
                reason: msg.clone(),
                ref_type: if ref_id.is_some() { RejectRefType::Order } else { RejectRefType::None },
                ref_id: ref_id.clone(),
            }),
        );
        sim.emit_event(SimEvent::OrderRejected { ts: sim.now_ns(), agent: to, reason: msg, order_id: ref_id });
    }

    fn publish_market_data(&self, sim: &mut dyn SimulatorApi) {
        let snap = self.book.snapshot(self.config.md_depth);
        let payload = MarketDataPayload { symbol: self.symbol.clone(), bids: snap.bids, asks: snap.asks, last: snap.last };
        sim.broadcast(self.id, MessageType::MarketData, MessagePayload::MarketData(payload.clone()));
        sim.emit_event(SimEvent::MarketData { ts: sim.now_ns(), symbol: self.symbol.clone(), last: payload.last });
    }

    fn emit_executions(&self, sim: &mut dyn SimulatorApi, taker: AgentId, executions: &[Execution]) {
        for exec in executions {
            sim.emit_event(SimEvent::Trade {
                ts: sim.now_ns(),
                symbol: self.symbol.clone(),
                price: exec.price,
                qty: exec.qty,
                maker_agent: exec.maker_agent,
                taker_agent: exec.taker_agent,
                maker_side: exec.maker_side,
            });

            sim.send(
                self.id,
                exec.maker_agent,
                MessageType::OrderExecuted,
                MessagePayload::OrderExecuted(OrderExecutedPayload {
                    symbol: self.symbol.clone(),
                    price: exec.price,
                    qty: exec.qty,
                    role: Role::Maker,
                    side_for_recipient: exec.maker_side,
                    order_id: Some(exec.maker_order_id.clone()),
                }),
            );

            sim.send(
                self.id,
                taker,
                MessageType::OrderExecuted,
                MessagePayload::OrderExecuted(OrderExecutedPayload {
                    symbol: self.symbol.clone(),
                    price: exec.price,
                    qty: exec.qty,
                    role: Role::Taker,
                    side_for_recipient: exec.maker_side.opposite(),
                    order_id: exec.taker_order_id.clone(),
                }),
            );
        }
    }

    fn handle_limit_order(&mut self, sim: &mut dyn SimulatorApi, from: AgentId, p: &LimitOrderPayload) -> Result<(), SimulatorError> {
        if p.symbol != self.symbol {
            self.reject(sim, from, ValidationError::SymbolMismatch(p.symbol.clone()), Some(p.id.clone()));
            return Ok(());
        }
        if p.price == 0 {
            self.reject(sim, from, ValidationError::NonPositivePrice, Some(p.id.clone()));
            return Ok(());
        }
        if p.qty == 0 {
            self.reject(sim, from, ValidationError::NonPositiveQty, Some(p.id.clone()));
            return Ok(());
        }

        let ts = sim.now_ns();
        let executions = self
            .book
            .place_limit(p.id.clone(), from, p.side, p.price, p.qty, ts)
            .map_err(SimulatorError::from)?;

        debug!(agent_id = from, order_id = %p.id, "limit order accepted");
        sim.send(
            self.id,
            from,
            MessageType::OrderAccepted,
            MessagePayload::OrderAccepted(OrderAcceptedPayload {
                order_id: p.id.clone(),
                symbol: Some(p.symbol.clone()),
                side: Some(p.side),
                price: Some(p.price),
                qty: Some(p.qty),
                replaced: false,
            }),
        );

        self.emit_executions(sim, from, &executions);
        self.publish_market_data(sim);
        Ok(())
    }

    fn handle_market_order(&mut self, sim: &mut dyn SimulatorApi, from: AgentId, p: &MarketOrderPayload) -> Result<(), SimulatorError> {
        if p.symbol != self.symbol {
            self.reject(sim, from, ValidationError::SymbolMismatch(p.symbol.clone()), None);
            return Ok(());
        }
        if p.qty == 0 {
            self.reject(sim, from, ValidationError::NonPositiveQty, None);
            return Ok(());
        }

        let ts = sim.now_ns();
        let fill = self.book.place_market(from, p.side, p.qty, ts).map_err(SimulatorError::from)?;

        if fill.filled == 0 {
            self.reject(sim, from, ValidationError::NoLiquidity, None);
            return Ok(());
        }

        sim.send(
            self.id,
            from,
            MessageType::OrderAccepted,
            MessagePayload::OrderAccepted(OrderAcceptedPayload {
                order_id: String::new(),
                symbol: Some(p.symbol.clone()),
                side: Some(p.side),
                price: None,
                qty: Some(fill.filled),
                replaced: false,
            }),
        );

        self.emit_executions(sim, from, &fill.executions);
        self.publish_market_data(sim);
        Ok(())
    }

    fn handle_cancel(&mut self, sim: &mut dyn SimulatorApi, from: AgentId, p: &CancelOrderPayload) -> Result<(), SimulatorError> {
        match self.book.cancel(&p.id) {
            Ok(cancelled) => {
                sim.send(
                    self.id,
                    from,
                    MessageType::OrderCancelled,
                    MessagePayload::OrderCancelled(OrderCancelledPayload {
                        order_id: p.id.clone(),
                        side: cancelled.side,
                        price: cancelled.price,
                        qty: cancelled.qty,
                    }),
                );
                self.publish_market_data(sim);
                Ok(())
            }
            Err(_) => {
                self.reject(sim, from, ValidationError::UnknownOrderId(p.id.clone()), Some(p.id.clone()));
                Ok(())
            }
        }
    }

    fn handle_modify(&mut self, sim: &mut dyn SimulatorApi, from: AgentId, p: &ModifyOrderPayload) -> Result<(), SimulatorError> {
        if matches!(p.price, Some(0)) {
            self.reject(sim, from, ValidationError::NonPositivePrice, Some(p.id.clone()));
            return Ok(());
        }

        let now = sim.now_ns();
        match self.book.modify(&p.id, p.price, p.qty, now) {
            Ok(ModifyOutcome::Updated(order)) => {
                sim.send(
                    self.id,
                    from,
                    MessageType::OrderAccepted,
                    MessagePayload::OrderAccepted(OrderAcceptedPayload {
                        order_id: p.id.clone(),
                        symbol: Some(self.symbol.clone()),
                        side: Some(order.side),
                        price: Some(order.price),
                        qty: Some(order.qty),
                        replaced: true,
                    }),
                );
                self.publish_market_data(sim);
                Ok(())
            }
            Ok(ModifyOutcome::Cancelled(cancelled)) => {
                sim.send(
                    self.id,
                    from,
                    MessageType::OrderCancelled,
                    MessagePayload::OrderCancelled(OrderCancelledPayload {
                        order_id: p.id.clone(),
                        side: cancelled.side,
                        price: cancelled.price,
                        qty: cancelled.qty,
                    }),
                );
                self.publish_market_data(sim);
                Ok(())
            }
            Err(_) => {
                self.reject(sim, from, ValidationError::UnknownOrderId(p.id.clone()), Some(p.id.clone()));
                Ok(())
            }
        }
    }

    fn handle_query_spread(&self, sim: &mut dyn SimulatorApi, from: AgentId, p: &QuerySpreadPayload) {
        let snap = self.book.snapshot(p.depth.max(1));
        sim.send(
            self.id,
            from,
            MessageType::QuerySpread,
            MessagePayload::MarketData(MarketDataPayload {
                symbol: p.symbol.clone(),
                bids: snap.bids,
                asks: snap.asks,
                last: snap.last,
            }),
        );
    }

    fn handle_query_last(&self, sim: &mut dyn SimulatorApi, from: AgentId) {
        sim.send(self.id, from, MessageType::QueryLast, MessagePayload::QueryLast(self.book.last()));
    }
}

impl Agent for ExchangeAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn on_message(&mut self, sim: &mut dyn SimulatorApi, msg: &Message) -> Result<(), SimulatorError> {
        match (&msg.msg_type, &msg.payload) {
            (MessageType::LimitOrder, MessagePayload::LimitOrder(p)) => self.handle_limit_order(sim, msg.from, p),
            (MessageType::MarketOrder, MessagePayload::MarketOrder(p)) => self.handle_market_order(sim, msg.from, p),
            (MessageType::CancelOrder, MessagePayload::CancelOrder(p)) => self.handle_cancel(sim, msg.from, p),
            (MessageType::ModifyOrder, MessagePayload::ModifyOrder(p)) => self.handle_modify(sim, msg.from, p),
            (MessageType::QuerySpread, MessagePayload::QuerySpread(p)) => {
                self.handle_query_spread(sim, msg.from, p);
                Ok(())
            }
            (MessageType::QueryLast, _) => {
                self.handle_query_last(sim, msg.from);
                Ok(())
            }
            _ => {
                warn!(agent_id = self.id, msg_type = ?msg.msg_type, "exchange received unroutable message");
                Ok(())
            }
        }
    }
}
