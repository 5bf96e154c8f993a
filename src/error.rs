// src/error.rs
// Top-level error types. `ValidationError` and `BookError` are recoverable —
// they turn into an `ORDER_REJECTED` response. `SimulatorError` is fatal: the
// kernel stops the run and the caller reports it.

use thiserror::Error;

use crate::book::BookError;
use crate::messages::OrderId;

/// Rejection reasons the exchange agent can report back to a sender.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown symbol {0:?}")]
    SymbolMismatch(String),
    #[error("price must be positive")]
    NonPositivePrice,
    #[error("quantity must be positive")]
    NonPositiveQty,
    #[error("order id already resident: {0:?}")]
    DuplicateOrderId(OrderId),
    #[error("unknown order id {0:?}")]
    UnknownOrderId(OrderId),
    #[error("No liquidity")]
    NoLiquidity,
}

/// Fatal conditions that halt the run.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("simulation invariant violated: {0}")]
    Invariant(String),
}

impl From<BookError> for SimulatorError {
    fn from(e: BookError) -> Self {
        match e {
            BookError::Invariant(msg) => SimulatorError::Invariant(msg),
            BookError::UnknownOrder(id) => {
                SimulatorError::Invariant(format!("unexpected unknown order id {id:?} during match"))
            }
        }
    }
}
