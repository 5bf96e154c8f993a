// tests/market_order_no_liquidity.rs
// A market order against a side with no resting liquidity must be rejected,
// never silently "accepted" with zero fill.

use std::cell::RefCell;
use std::rc::Rc;

use bourse_sim::agents::exchange_agent::ExchangeAgent;
use bourse_sim::agents::Agent;
use bourse_sim::error::SimulatorError;
use bourse_sim::kernel::Kernel;
use bourse_sim::messages::{
    AgentId, MarketOrderPayload, Message, MessagePayload, MessageType, Side, SimulatorApi,
};

struct Recorder {
    id: AgentId,
    exchange_id: AgentId,
    symbol: String,
    replies: Rc<RefCell<Vec<Message>>>,
}

impl Agent for Recorder {
    fn id(&self) -> AgentId {
        self.id
    }
    fn name(&self) -> &str {
        "recorder"
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn on_start(&mut self, sim: &mut dyn SimulatorApi) -> Result<(), SimulatorError> {
        sim.send(
            self.id,
            self.exchange_id,
            MessageType::MarketOrder,
            MessagePayload::MarketOrder(MarketOrderPayload { symbol: self.symbol.clone(), side: Side::Buy, qty: 5 }),
        );
        Ok(())
    }
    fn on_message(&mut self, _sim: &mut dyn SimulatorApi, msg: &Message) -> Result<(), SimulatorError> {
        self.replies.borrow_mut().push(msg.clone());
        Ok(())
    }
}

#[test]
fn market_order_against_empty_book_is_rejected() {
    let exchange_id = 1;
    let trader_id = 2;
    let replies = Rc::new(RefCell::new(Vec::new()));

    let mut kernel = Kernel::new(None, exchange_id);
    kernel.add_agent(Box::new(ExchangeAgent::new(exchange_id, "exchange", "X"))).unwrap();
    kernel
        .add_agent(Box::new(Recorder { id: trader_id, exchange_id, symbol: "X".into(), replies: replies.clone() }))
        .unwrap();

    kernel.run_as_fast_as_possible(1, 10).unwrap();

    let replies = replies.borrow();
    assert_eq!(replies.len(), 1, "expected exactly one reply, got {replies:?}");
    match &replies[0].payload {
        MessagePayload::OrderRejected(p) => assert_eq!(p.reason, "No liquidity"),
        other => panic!("expected OrderRejected, got {other:?}"),
    }
    assert!(!replies.iter().any(|m| matches!(m.msg_type, MessageType::OrderAccepted | MessageType::OrderExecuted)));
}
