// src/book.rs
// Canonical price-time-priority matching engine for a single symbol.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::cmp::Reverse;

use crate::messages::{AgentId, OrderId, Price, PriceLevel, Qty, Side};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookError {
    #[error("unknown order id {0:?}")]
    UnknownOrder(OrderId),
    #[error("book invariant violated: {0}")]
    Invariant(String),
}

/// An order resident in the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub id: OrderId,
    pub agent: AgentId,
    pub symbol: String,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
    /// Priority timestamp: assigned on insertion, reset iff price changes.
    pub ts: u64,
}

/// One match produced by `place_limit`/`place_market`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub price: Price,
    pub qty: Qty,
    pub maker_agent: AgentId,
    pub maker_order_id: OrderId,
    pub taker_agent: AgentId,
    pub taker_order_id: Option<OrderId>,
    pub maker_side: Side,
}

/// Result of a market order sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketFill {
    pub filled: Qty,
    pub executions: Vec<Execution>,
}

/// Former resident state returned by a successful cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancelled {
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
}

/// Result of a successful `modify`: either the order survives with new
/// price/qty, or a `qty == 0` request removed it (cancel-equivalent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifyOutcome {
    Updated(RestingOrder),
    Cancelled(Cancelled),
}

/// Aggregated L2 snapshot, truncated to `depth` levels per side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct L2Snapshot {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub last: Option<Price>,
}

struct OrderIndex {
    side: Side,
    price: Price,
}

/// Price-time-priority order book for one symbol.
pub struct OrderBook {
    symbol: String,
    bids: BTreeMap<Reverse<Price>, VecDeque<RestingOrder>>,
    asks: BTreeMap<Price, VecDeque<RestingOrder>>,
    index: HashMap<OrderId, OrderIndex>,
    last: Option<Price>,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
            last: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn last(&self) -> Option<Price> {
        self.last
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next().map(|p| p.0)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => Some(a as i64 - b as i64),
            _ => None,
        }
    }

    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => Some((b + a) as f64 / 2.0),
            _ => None,
        }
    }

    /// Insert a new limit order, then run the matching loop. Returns every
    /// execution produced while the book was crossed.
    pub fn place_limit(
        &mut self,
        id: OrderId,
        agent: AgentId,
        side: Side,
        price: Price,
        qty: Qty,
        ts: u64,
    ) -> Result<Vec<Execution>, BookError> {
        debug_assert!(price > 0 && qty > 0);

        let order = RestingOrder { id: id.clone(), agent, symbol: self.symbol.clone(), side, price, qty, ts };
        self.insert_resting(order);

        let executions = self.match_book(Some((side, id.clone())))?;

        // The taker side of each execution carries this order's id, if the
        // order itself was the aggressor (it always is here, since it was
        // just inserted and only it can cross).
        Ok(executions)
    }

    /// Sweep the opposite side of `side` at its best prices until `qty` is
    /// exhausted or that side empties. Never rests on the book.
    pub fn place_market(
        &mut self,
        agent: AgentId,
        side: Side,
        mut qty: Qty,
        _ts: u64,
    ) -> Result<MarketFill, BookError> {
        let mut executions = Vec::new();
        let mut filled = 0;

        while qty > 0 {
            let Some(mut maker) = self.pop_best(side.opposite()) else { break };

            let trade_qty = qty.min(maker.qty);
            let trade_price = maker.price;

            maker.qty -= trade_qty;
            qty -= trade_qty;
            filled += trade_qty;
            self.last = Some(trade_price);

            executions.push(Execution {
                price: trade_price,
                qty: trade_qty,
                maker_agent: maker.agent,
                maker_order_id: maker.id.clone(),
                taker_agent: agent,
                taker_order_id: None,
                maker_side: maker.side,
            });

            if maker.qty > 0 {
                self.push_front_resting(maker);
            } else {
                self.index.remove(&executions.last().unwrap().maker_order_id);
            }
        }

        self.check_not_crossed()?;
        Ok(MarketFill { filled, executions })
    }

    pub fn cancel(&mut self, order_id: &str) -> Result<Cancelled, BookError> {
        let idx = self.index.remove(order_id).ok_or_else(|| BookError::UnknownOrder(order_id.to_string()))?;
        let removed = self.remove_from_side(idx.side, idx.price, order_id);
        match removed {
            Some(order) => Ok(Cancelled { side: order.side, price: order.price, qty: order.qty }),
            None => Err(BookError::UnknownOrder(order_id.to_string())),
        }
    }

    /// `price`/`qty` are independently optional. `qty == Some(0)` removes the
    /// order (cancel-equivalent). A changed `price` resets `ts` to `now_ts`;
    /// an unchanged (or absent) `price` preserves `ts`.
    pub fn modify(
        &mut self,
        order_id: &str,
        new_price: Option<Price>,
        new_qty: Option<Qty>,
        now_ts: u64,
    ) -> Result<ModifyOutcome, BookError> {
        let idx = self.index.get(order_id).ok_or_else(|| BookError::UnknownOrder(order_id.to_string()))?;
        let (side, old_price) = (idx.side, idx.price);

        if new_qty == Some(0) {
            let cancelled = self.cancel(order_id)?;
            return Ok(ModifyOutcome::Cancelled(cancelled));
        }

        let mut order =
            self.remove_from_side(side, old_price, order_id).ok_or_else(|| BookError::UnknownOrder(order_id.to_string()))?;

        if let Some(qty) = new_qty {
            order.qty = qty;
        }
        let price_changed = matches!(new_price, Some(p) if p != order.price);
        if let Some(p) = new_price {
            order.price = p;
        }
        if price_changed {
            order.ts = now_ts;
        }

        self.insert_resting(order.clone());
        Ok(ModifyOutcome::Updated(order))
    }

    pub fn snapshot(&self, depth: usize) -> L2Snapshot {
        let bids = self
            .bids
            .iter()
            .take(depth)
            .map(|(p, orders)| PriceLevel { price: p.0, qty: orders.iter().map(|o| o.qty).sum() })
            .collect();
        let asks = self
            .asks
            .iter()
            .take(depth)
            .map(|(p, orders)| PriceLevel { price: *p, qty: orders.iter().map(|o| o.qty).sum() })
            .collect();
        L2Snapshot { bids, asks, last: self.last }
    }

    pub fn list_open_orders(&self, agent_filter: Option<AgentId>) -> Vec<RestingOrder> {
        self.bids
            .values()
            .chain(self.asks.values())
            .flatten()
            .filter(|o| agent_filter.map(|a| a == o.agent).unwrap_or(true))
            .cloned()
            .collect()
    }

    // -- internals --

    fn insert_resting(&mut self, order: RestingOrder) {
        self.index.insert(order.id.clone(), OrderIndex { side: order.side, price: order.price });
        match order.side {
            Side::Buy => self.bids.entry(Reverse(order.price)).or_default().push_back(order),
            Side::Sell => self.asks.entry(order.price).or_default().push_back(order),
        }
    }

    fn push_front_resting(&mut self, order: RestingOrder) {
        self.index.insert(order.id.clone(), OrderIndex { side: order.side, price: order.price });
        match order.side {
            Side::Buy => self.bids.entry(Reverse(order.price)).or_default().push_front(order),
            Side::Sell => self.asks.entry(order.price).or_default().push_front(order),
        }
    }

    fn remove_from_side(&mut self, side: Side, price: Price, order_id: &str) -> Option<RestingOrder> {
        let (order, now_empty) = match side {
            Side::Buy => {
                let level = self.bids.get_mut(&Reverse(price))?;
                let pos = level.iter().position(|o| o.id == order_id)?;
                let order = level.remove(pos)?;
                (order, level.is_empty())
            }
            Side::Sell => {
                let level = self.asks.get_mut(&price)?;
                let pos = level.iter().position(|o| o.id == order_id)?;
                let order = level.remove(pos)?;
                (order, level.is_empty())
            }
        };
        if now_empty {
            match side {
                Side::Buy => {
                    self.bids.remove(&Reverse(price));
                }
                Side::Sell => {
                    self.asks.remove(&price);
                }
            }
        }
        self.index.remove(order_id);
        Some(order)
    }

    fn peek_best(&self, side: Side) -> Option<&RestingOrder> {
        match side {
            Side::Buy => self.bids.values().next().and_then(|q| q.front()),
            Side::Sell => self.asks.values().next().and_then(|q| q.front()),
        }
    }

    fn pop_best(&mut self, side: Side) -> Option<RestingOrder> {
        let (price, order, now_empty) = match side {
            Side::Buy => {
                let (&price, level) = self.bids.iter_mut().next()?;
                let order = level.pop_front()?;
                (price.0, order, level.is_empty())
            }
            Side::Sell => {
                let (&price, level) = self.asks.iter_mut().next()?;
                let order = level.pop_front()?;
                (price, order, level.is_empty())
            }
        };
        if now_empty {
            match side {
                Side::Buy => {
                    self.bids.remove(&Reverse(price));
                }
                Side::Sell => {
                    self.asks.remove(&price);
                }
            }
        }
        self.index.remove(&order.id);
        Some(order)
    }

    /// Repeatedly cross the book while `best_bid.price >= best_ask.price`.
    /// `taker` identifies which resident order (if any) is the newly
    /// inserted aggressor, so its id can be reported as the taker side of
    /// each execution; when `None` (market sweeps call a different path),
    /// every maker consumed is treated symmetrically.
    fn match_book(&mut self, taker: Option<(Side, OrderId)>) -> Result<Vec<Execution>, BookError> {
        let mut executions = Vec::new();

        loop {
            let (Some(bid), Some(ask)) = (self.peek_best(Side::Buy), self.peek_best(Side::Sell)) else { break };
            if bid.price < ask.price {
                break;
            }

            let match_price = if bid.ts <= ask.ts { bid.price } else { ask.price };
            let match_qty = bid.qty.min(ask.qty);

            let mut bid_order = self.pop_best(Side::Buy).expect("bid peeked above");
            let mut ask_order = self.pop_best(Side::Sell).expect("ask peeked above");

            bid_order.qty -= match_qty;
            ask_order.qty -= match_qty;
            self.last = Some(match_price);

            let (maker_order, taker_order, maker_side) = match &taker {
                Some((Side::Buy, id)) if *id == bid_order.id => (&ask_order, &bid_order, Side::Sell),
                Some((Side::Sell, id)) if *id == ask_order.id => (&bid_order, &ask_order, Side::Buy),
                // Neither resting order is the newly-inserted one: both were
                // already resident (can only happen via `modify` re-crossing
                // the book), so fall back to earlier-`ts` is maker.
                _ => {
                    if bid_order.ts <= ask_order.ts {
                        (&ask_order, &bid_order, Side::Sell)
                    } else {
                        (&bid_order, &ask_order, Side::Buy)
                    }
                }
            };

            executions.push(Execution {
                price: match_price,
                qty: match_qty,
                maker_agent: maker_order.agent,
                maker_order_id: maker_order.id.clone(),
                taker_agent: taker_order.agent,
                taker_order_id: Some(taker_order.id.clone()),
                maker_side,
            });

            if bid_order.qty > 0 {
                self.push_front_resting(bid_order);
            }
            if ask_order.qty > 0 {
                self.push_front_resting(ask_order);
            }
        }

        self.check_not_crossed()?;
        Ok(executions)
    }

    fn check_not_crossed(&self) -> Result<(), BookError> {
        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                return Err(BookError::Invariant(format!("crossed book: bid {bid} >= ask {ask}")));
            }
        }
        Ok(())
    }
}
