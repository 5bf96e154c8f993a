// tests/proptest_invariants.rs
// Property-based invariants for the order book, run across randomly
// generated order sequences.

use bourse_sim::book::{ModifyOutcome, OrderBook};
use bourse_sim::messages::Side;
use proptest::prelude::*;

fn price_strategy() -> impl Strategy<Value = u64> {
    1u64..=100_000
}

fn qty_strategy() -> impl Strategy<Value = u64> {
    1u64..=10_000
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn order_strategy() -> impl Strategy<Value = (Side, u64, u64)> {
    (side_strategy(), price_strategy(), qty_strategy())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// No sequence of limit orders ever leaves the book crossed: best bid is
    /// always strictly below best ask once both sides are non-empty.
    #[test]
    fn no_crossed_book(orders in prop::collection::vec(order_strategy(), 1..100)) {
        let mut book = OrderBook::new("X");
        for (i, (side, price, qty)) in orders.into_iter().enumerate() {
            let _ = book.place_limit(format!("o{i}"), 1, side, price, qty, i as u64);
        }

        if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
            prop_assert!(bid < ask, "crossed book: bid {} >= ask {}", bid, ask);
        }
    }

    /// Every resting order in the book carries a strictly positive price and
    /// quantity; matching never leaves a zero-qty remnant resident.
    #[test]
    fn resident_orders_are_well_formed(orders in prop::collection::vec(order_strategy(), 1..100)) {
        let mut book = OrderBook::new("X");
        for (i, (side, price, qty)) in orders.into_iter().enumerate() {
            let _ = book.place_limit(format!("o{i}"), 1, side, price, qty, i as u64);
        }

        for order in book.list_open_orders(None) {
            prop_assert!(order.price > 0, "resident order with non-positive price");
            prop_assert!(order.qty > 0, "resident order with non-positive qty");
        }
    }

    /// Placing then cancelling an order on an otherwise-empty book restores
    /// it to empty (nothing to cross against, so the round trip is exact).
    #[test]
    fn place_then_cancel_round_trips(side in side_strategy(), price in price_strategy(), qty in qty_strategy()) {
        let mut book = OrderBook::new("X");
        book.place_limit("probe".into(), 1, side, price, qty, 1).unwrap();
        book.cancel("probe").unwrap();

        let after = book.snapshot(50);
        prop_assert!(after.bids.is_empty());
        prop_assert!(after.asks.is_empty());
    }

    /// Modifying an order to the same price and an unchanged timestamp input
    /// never changes its priority timestamp; only a genuine price change
    /// does.
    #[test]
    fn modify_same_price_preserves_ts(price in price_strategy(), qty in qty_strategy(), new_qty in qty_strategy()) {
        let mut book = OrderBook::new("X");
        book.place_limit("b1".into(), 1, Side::Buy, price, qty, 7).unwrap();

        let ModifyOutcome::Updated(order) = book.modify("b1", Some(price), Some(new_qty), 999).unwrap() else {
            panic!("qty != 0 modify must update, not cancel")
        };
        prop_assert_eq!(order.ts, 7);
        prop_assert_eq!(order.qty, new_qty);
    }

    /// A `modify` that sets quantity to zero is always cancel-equivalent:
    /// the order id is no longer cancellable afterward.
    #[test]
    fn modify_to_zero_qty_removes_order(price in price_strategy(), qty in qty_strategy()) {
        let mut book = OrderBook::new("X");
        book.place_limit("b1".into(), 1, Side::Buy, price, qty, 1).unwrap();
        let outcome = book.modify("b1", None, Some(0), 2).unwrap();
        prop_assert!(matches!(outcome, ModifyOutcome::Cancelled(_)));
        prop_assert!(book.cancel("b1").is_err());
    }

    /// Every execution reports a strictly positive price and quantity, and
    /// the traded price always lies at or within the two resting limits that
    /// crossed.
    #[test]
    fn executions_are_well_formed(orders in prop::collection::vec(order_strategy(), 1..100)) {
        let mut book = OrderBook::new("X");
        for (i, (side, price, qty)) in orders.into_iter().enumerate() {
            let execs = book.place_limit(format!("o{i}"), 1, side, price, qty, i as u64).unwrap();
            for e in execs {
                prop_assert!(e.price > 0);
                prop_assert!(e.qty > 0);
            }
        }
    }

    /// A market order never rests: it either fills against available
    /// liquidity or simply stops when the opposite side is exhausted, but it
    /// never appears in `list_open_orders`.
    #[test]
    fn market_orders_never_rest(resting_qty in qty_strategy(), incoming_qty in qty_strategy(), price in price_strategy()) {
        let mut book = OrderBook::new("X");
        book.place_limit("a1".into(), 1, Side::Sell, price, resting_qty, 1).unwrap();
        book.place_market(2, Side::Buy, incoming_qty, 2).unwrap();

        prop_assert!(book.list_open_orders(Some(2)).is_empty());
    }

    /// Repeating the same order sequence against two fresh books produces
    /// identical executions and identical final snapshots.
    #[test]
    fn deterministic_replay(orders in prop::collection::vec(order_strategy(), 1..50)) {
        let run = |orders: &[(Side, u64, u64)]| {
            let mut book = OrderBook::new("X");
            let mut exec_counts = Vec::new();
            for (i, (side, price, qty)) in orders.iter().enumerate() {
                let execs = book.place_limit(format!("o{i}"), 1, *side, *price, *qty, i as u64).unwrap();
                exec_counts.push(execs.len());
            }
            (exec_counts, book.snapshot(50))
        };

        let (counts_a, snap_a) = run(&orders);
        let (counts_b, snap_b) = run(&orders);
        prop_assert_eq!(counts_a, counts_b);
        prop_assert_eq!(snap_a.bids, snap_b.bids);
        prop_assert_eq!(snap_a.asks, snap_b.asks);
        prop_assert_eq!(snap_a.last, snap_b.last);
    }
}
