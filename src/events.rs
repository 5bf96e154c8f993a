// src/events.rs
// Publish-subscribe event bus for external collaborators (C7) that are not
// agents: CSV sinks, renderers, gateways. Subscribers observe; they must
// never enqueue messages or block the tick.

use crate::messages::{AgentId, MessageType, OrderId, Price, Qty, Side};

/// High-level events observable on the kernel's bus.
#[derive(Debug, Clone)]
pub enum SimEvent {
    /// Emitted synchronously at `send` time for every order-mutating
    /// message (LIMIT/MARKET/CANCEL/MODIFY), before the message is
    /// delivered.
    OrderLog {
        ts: u64,
        from: AgentId,
        to: AgentId,
        msg_type: MessageType,
        symbol: Option<String>,
        side: Option<Side>,
        price: Option<Price>,
        qty: Option<Qty>,
    },

    /// Exactly one per match, emitted from the exchange's handler, strictly
    /// between the EXECUTED sends to maker and taker.
    Trade {
        ts: u64,
        symbol: String,
        price: Price,
        qty: Qty,
        maker_agent: AgentId,
        taker_agent: AgentId,
        maker_side: Side,
    },

    /// Emitted whenever the exchange rejects an inbound order message.
    OrderRejected {
        ts: u64,
        agent: AgentId,
        reason: String,
        order_id: Option<OrderId>,
    },

    /// Mirrors every MARKET_DATA broadcast the exchange makes.
    MarketData {
        ts: u64,
        symbol: String,
        last: Option<Price>,
    },

    /// Oracle fundamental-value update.
    OracleTick { ts: u64, symbol: String, fundamental: Price },
}

/// Event listener interface. Implementors must return promptly — the tick
/// loop runs emission synchronously and single-threaded.
pub trait EventListener {
    fn on_event(&mut self, event: &SimEvent);
}

/// Simple event bus: stores a list of subscribers and fans out each event.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn EventListener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { listeners: Vec::new() }
    }

    pub fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: SimEvent) {
        for listener in self.listeners.iter_mut() {
            listener.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counter(Rc<RefCell<usize>>);

    impl EventListener for Counter {
        fn on_event(&mut self, _event: &SimEvent) {
            *self.0.borrow_mut() += 1;
        }
    }

    #[test]
    fn emit_fans_out_to_all_subscribers() {
        let mut bus = EventBus::new();
        let a = Rc::new(RefCell::new(0));
        let b = Rc::new(RefCell::new(0));
        bus.subscribe(Box::new(Counter(a.clone())));
        bus.subscribe(Box::new(Counter(b.clone())));

        bus.emit(SimEvent::OracleTick { ts: 1, symbol: "X".into(), fundamental: 100 });

        assert_eq!(*a.borrow(), 1);
        assert_eq!(*b.borrow(), 1);
    }
}
