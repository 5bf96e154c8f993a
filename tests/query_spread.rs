// tests/query_spread.rs
// QUERY_SPREAD must reply with its own wire category, distinct from the
// unsolicited MARKET_DATA broadcast, so a caller can tell its query reply
// apart from other agents' traffic.

use std::cell::RefCell;
use std::rc::Rc;

use bourse_sim::agents::exchange_agent::ExchangeAgent;
use bourse_sim::agents::Agent;
use bourse_sim::error::SimulatorError;
use bourse_sim::kernel::Kernel;
use bourse_sim::messages::{
    AgentId, LimitOrderPayload, Message, MessagePayload, MessageType, QuerySpreadPayload, Side,
    SimulatorApi,
};

/// Places one resting order, sends QUERY_SPREAD, and records every reply's
/// message type and payload it receives back.
struct SpreadQuerier {
    id: AgentId,
    exchange_id: AgentId,
    symbol: String,
    replies: Rc<RefCell<Vec<MessageType>>>,
    market_data_seen: Rc<RefCell<Option<MessagePayload>>>,
}

impl Agent for SpreadQuerier {
    fn id(&self) -> AgentId {
        self.id
    }
    fn name(&self) -> &str {
        "spread-querier"
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn on_start(&mut self, sim: &mut dyn SimulatorApi) -> Result<(), SimulatorError> {
        sim.send(
            self.id,
            self.exchange_id,
            MessageType::LimitOrder,
            MessagePayload::LimitOrder(LimitOrderPayload {
                id: "probe".into(),
                symbol: self.symbol.clone(),
                side: Side::Buy,
                price: 100,
                qty: 5,
            }),
        );
        sim.send(
            self.id,
            self.exchange_id,
            MessageType::QuerySpread,
            MessagePayload::QuerySpread(QuerySpreadPayload { symbol: self.symbol.clone(), depth: 5 }),
        );
        Ok(())
    }
    fn on_message(&mut self, _sim: &mut dyn SimulatorApi, msg: &Message) -> Result<(), SimulatorError> {
        self.replies.borrow_mut().push(msg.msg_type);
        if matches!(msg.msg_type, MessageType::QuerySpread) {
            *self.market_data_seen.borrow_mut() = Some(msg.payload.clone());
        }
        Ok(())
    }
}

#[test]
fn query_spread_reply_uses_its_own_message_type() {
    let exchange_id = 1;
    let querier_id = 2;
    let replies = Rc::new(RefCell::new(Vec::new()));
    let reply_payload = Rc::new(RefCell::new(None));

    let mut kernel = Kernel::new(None, exchange_id);
    kernel.add_agent(Box::new(ExchangeAgent::new(exchange_id, "exchange", "X"))).unwrap();
    kernel
        .add_agent(Box::new(SpreadQuerier {
            id: querier_id,
            exchange_id,
            symbol: "X".into(),
            replies: replies.clone(),
            market_data_seen: reply_payload.clone(),
        }))
        .unwrap();

    kernel.run_as_fast_as_possible(1, 10).unwrap();

    // The LIMIT_ORDER produces an ORDER_ACCEPTED and an unsolicited
    // MARKET_DATA broadcast; the QUERY_SPREAD must come back tagged as
    // QUERY_SPREAD, never reused as MARKET_DATA.
    assert!(replies.borrow().contains(&MessageType::QuerySpread));
    assert!(replies.borrow().contains(&MessageType::MarketData));

    let reply_payload_ref = reply_payload.borrow();
    match &*reply_payload_ref {
        Some(MessagePayload::MarketData(p)) => {
            assert_eq!(p.bids, vec![bourse_sim::messages::PriceLevel { price: 100, qty: 5 }]);
        }
        other => panic!("expected a MarketData-shaped body on the QuerySpread reply, got {other:?}"),
    }
}
