//! Domain layer: the order aggregate, the co-responsible fold, and the
//! transaction handle through which every mutation passes.

pub mod aggregate;
pub mod coresponsibles;
pub mod transaction;

pub use aggregate::{Cancellation, OrderAggregate};
pub use coresponsibles::aggregate_decision;
pub use transaction::OrderTx;
