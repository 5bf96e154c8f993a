// tests/book_scenarios.rs
// The literal scenarios from the order-book component's testable
// properties, run against the public library surface.

use bourse_sim::book::{ModifyOutcome, OrderBook};
use bourse_sim::messages::{PriceLevel, Side};

#[test]
fn scenario_1_uncrossed_resting_book() {
    let mut book = OrderBook::new("X");
    book.place_limit("b1".into(), 1, Side::Buy, 9900, 10, 1).unwrap();
    let execs = book.place_limit("a1".into(), 2, Side::Sell, 10100, 5, 2).unwrap();

    assert!(execs.is_empty());
    let snap = book.snapshot(1);
    assert_eq!(snap.bids, vec![PriceLevel { price: 9900, qty: 10 }]);
    assert_eq!(snap.asks, vec![PriceLevel { price: 10100, qty: 5 }]);
    assert_eq!(snap.last, None);
}

#[test]
fn scenario_2_cross_at_insertion_partial_fill() {
    let mut book = OrderBook::new("X");
    book.place_limit("b1".into(), 1, Side::Buy, 9900, 10, 1).unwrap();
    book.place_limit("a1".into(), 2, Side::Sell, 10100, 5, 2).unwrap();

    let execs = book.place_limit("b2".into(), 3, Side::Buy, 10200, 3, 3).unwrap();
    assert_eq!(execs.len(), 1);
    assert_eq!(execs[0].price, 10100);
    assert_eq!(execs[0].qty, 3);
    assert_eq!(execs[0].maker_agent, 2);
    assert_eq!(execs[0].taker_agent, 3);

    assert_eq!(book.last(), Some(10100));
    assert_eq!(book.snapshot(10).asks, vec![PriceLevel { price: 10100, qty: 2 }]);
    assert!(book.list_open_orders(Some(3)).is_empty());
}

#[test]
fn scenario_3_market_sweep_across_levels() {
    let mut book = OrderBook::new("X");
    book.place_limit("a1".into(), 1, Side::Sell, 100, 2, 1).unwrap();
    book.place_limit("a2".into(), 2, Side::Sell, 101, 3, 2).unwrap();

    let fill = book.place_market(3, Side::Buy, 4, 10).unwrap();
    assert_eq!(fill.filled, 4);
    assert_eq!(fill.executions[0].price, 100);
    assert_eq!(fill.executions[0].qty, 2);
    assert_eq!(fill.executions[0].maker_agent, 1);
    assert_eq!(fill.executions[1].price, 101);
    assert_eq!(fill.executions[1].qty, 2);
    assert_eq!(fill.executions[1].maker_agent, 2);
    assert_eq!(book.last(), Some(101));
    assert_eq!(book.snapshot(10).asks, vec![PriceLevel { price: 101, qty: 1 }]);
}

#[test]
fn scenario_4_modify_preserves_ts_on_equal_price() {
    let mut book = OrderBook::new("X");
    book.place_limit("b1".into(), 1, Side::Buy, 500, 10, 1).unwrap();

    let ModifyOutcome::Updated(order) = book.modify("b1", Some(500), Some(7), 9).unwrap() else {
        panic!("expected Updated")
    };
    assert_eq!(order.ts, 1);
    assert_eq!(order.qty, 7);

    let ModifyOutcome::Updated(order) = book.modify("b1", Some(501), None, 9).unwrap() else {
        panic!("expected Updated")
    };
    assert_eq!(order.ts, 9);
    assert_eq!(order.price, 501);
}

#[test]
fn place_then_cancel_restores_book() {
    let mut book = OrderBook::new("X");
    book.place_limit("a1".into(), 1, Side::Sell, 100, 5, 1).unwrap();
    let before = book.snapshot(10);

    book.place_limit("b1".into(), 2, Side::Buy, 50, 3, 2).unwrap();
    book.cancel("b1").unwrap();

    let after = book.snapshot(10);
    assert_eq!(before.asks, after.asks);
    assert!(after.bids.is_empty());
}

#[test]
fn modify_qty_zero_is_cancel_equivalent() {
    let mut book = OrderBook::new("X");
    book.place_limit("b1".into(), 1, Side::Buy, 500, 10, 1).unwrap();
    let outcome = book.modify("b1", None, Some(0), 5).unwrap();
    assert!(matches!(outcome, ModifyOutcome::Cancelled(_)));
    assert!(book.cancel("b1").is_err());
}
