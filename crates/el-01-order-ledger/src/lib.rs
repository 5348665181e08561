//! # el-01-order-ledger
//!
//! Transactional store for loan orders and every record attached to them.
//!
//! ## Overview
//!
//! - **Per-order exclusive lock**: writers on one order are serialized,
//!   writers on different orders run in parallel. There is no global lock.
//! - **Bounded acquisition**: contention is retried with exponential backoff
//!   and surfaces as `Busy` once the budget is spent.
//! - **Copy-on-write commit**: a transaction mutates a draft; an error drops
//!   the draft, success swaps it in with one pointer write.
//! - **Projection check**: the cached order state must equal the state the
//!   records imply, or the transaction is refused with `ProjectionDrift`.
//! - **Outbox**: events queued during a transaction are published only
//!   after it commits and the lock is released.
//!
//! ## Example
//!
//! ```rust,ignore
//! let ledger = OrderLedger::new(LedgerConfig::default(), bus);
//!
//! let committed = ledger
//!     .transact(order_id, |tx| {
//!         tx.record_delivery(keeper.clone());
//!         tx.transition(OrderState::Delivered, "deliver")
//!     })
//!     .await?;
//! ```

pub mod domain;
pub mod ledger;

pub use domain::{aggregate_decision, Cancellation, OrderAggregate, OrderTx};
pub use ledger::{Committed, LedgerConfig, OrderLedger};
