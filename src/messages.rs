// src/messages.rs
// Core message types and the simulator-facing API every agent is handed.

use serde::{Deserialize, Serialize};

use crate::events::SimEvent;

/// Numeric identifier of an agent in the simulation. Id `0` is reserved for
/// the out-of-band sender used on WAKEUP events.
pub type AgentId = u32;

/// Identifier assigned to a resident order by whoever submits it.
pub type OrderId = String;

/// Price in integer cents. Always `> 0` for a resident order.
pub type Price = u64;

/// Quantity in integer lots. Always `> 0` for a resident order.
pub type Qty = u64;

/// High level message type routed by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Kernel-internal: delivered to an agent's `on_wakeup`, never latency-shaped.
    Wakeup,

    // Agent -> exchange.
    LimitOrder,
    MarketOrder,
    CancelOrder,
    ModifyOrder,
    QuerySpread,
    QueryLast,

    // Exchange -> agent.
    OrderAccepted,
    OrderExecuted,
    OrderCancelled,
    OrderRejected,
    MarketData,

    // Bus-only categories, never routed point-to-point by `send`.
    Trade,
    OrderLog,
    OracleTick,
}

/// Basic side enum for orders and trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// The role a recipient played in a given execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Maker,
    Taker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitOrderPayload {
    pub id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOrderPayload {
    pub symbol: String,
    pub side: Side,
    pub qty: Qty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderPayload {
    pub id: OrderId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyOrderPayload {
    pub id: OrderId,
    pub price: Option<Price>,
    pub qty: Option<Qty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAcceptedPayload {
    pub order_id: OrderId,
    pub symbol: Option<String>,
    pub side: Option<Side>,
    pub price: Option<Price>,
    pub qty: Option<Qty>,
    pub replaced: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderExecutedPayload {
    pub symbol: String,
    pub price: Price,
    pub qty: Qty,
    pub role: Role,
    pub side_for_recipient: Side,
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledPayload {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectRefType {
    Order,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRejectedPayload {
    pub reason: String,
    pub ref_type: RejectRefType,
    pub ref_id: Option<OrderId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub qty: Qty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataPayload {
    pub symbol: String,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub last: Option<Price>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySpreadPayload {
    pub symbol: String,
    pub depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleTickPayload {
    pub ts: u64,
    pub symbol: String,
    pub fundamental: Price,
}

/// Payload carried by a routed `Message`. `Empty` covers WAKEUP and the
/// `QUERY_LAST` request (which carries no body beyond the message itself).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessagePayload {
    Empty,
    LimitOrder(LimitOrderPayload),
    MarketOrder(MarketOrderPayload),
    CancelOrder(CancelOrderPayload),
    ModifyOrder(ModifyOrderPayload),
    QuerySpread(QuerySpreadPayload),
    OrderAccepted(OrderAcceptedPayload),
    OrderExecuted(OrderExecutedPayload),
    OrderCancelled(OrderCancelledPayload),
    OrderRejected(OrderRejectedPayload),
    MarketData(MarketDataPayload),
    QueryLast(Option<Price>),
    OracleTick(OracleTickPayload),
}

/// Core message type that flows through the kernel. Once enqueued, `at` is
/// immutable; the kernel owns a `Message` from construction to delivery.
#[derive(Debug, Clone)]
pub struct Message {
    pub from: AgentId,
    pub to: AgentId,
    pub msg_type: MessageType,
    pub payload: MessagePayload,
    pub at: u64,
}

impl Message {
    pub fn new(from: AgentId, to: AgentId, msg_type: MessageType, payload: MessagePayload, at: u64) -> Self {
        Self { from, to, msg_type, payload, at }
    }

    pub fn wakeup(agent_id: AgentId, at: u64) -> Self {
        Self {
            from: 0,
            to: agent_id,
            msg_type: MessageType::Wakeup,
            payload: MessagePayload::Empty,
            at,
        }
    }
}

/// Minimal interface the kernel exposes to agents. Agents never see the
/// `Kernel` type directly, only this trait object, so they cannot reach
/// into the time queue or into each other's state.
pub trait SimulatorApi {
    /// Current virtual time in nanoseconds.
    fn now_ns(&self) -> u64;

    /// Id of the single exchange agent in this run.
    fn exchange_id(&self) -> AgentId;

    /// Enqueue a point-to-point message, latency- and compute-delay shaped.
    fn send(&mut self, from: AgentId, to: AgentId, kind: MessageType, payload: MessagePayload);

    /// Schedule a WAKEUP for `agent_id` at `at_ns`. Never passes through the
    /// latency model.
    fn wakeup(&mut self, agent_id: AgentId, at_ns: u64);

    /// Enqueue one latency-shaped message per agent other than `from`.
    fn broadcast(&mut self, from: AgentId, kind: MessageType, payload: MessagePayload);

    /// Publish an event directly onto the bus, bypassing message delivery.
    /// Used for events that are not themselves routed messages: `Trade`,
    /// `OrderRejected`, `MarketData`, `OracleTick`. `OrderLog` is emitted by
    /// the kernel itself at `send` time, not through this method.
    fn emit_event(&mut self, event: SimEvent);
}
