//! # el-03-fulfillment
//!
//! Records the hand-over and the hand-back of an order's equipment.
//!
//! ```text
//! [APPROVED] ──deliver──→ [DELIVERED] ──return_equipment──→ [RETURNED]
//! ```
//!
//! | Command            | Precondition | Failure               | Capability     |
//! |--------------------|--------------|-----------------------|----------------|
//! | `deliver`          | `APPROVED`   | `NotReadyForDelivery` | RecordDelivery |
//! | `return_equipment` | `DELIVERED`  | `NotYetDelivered`     | RecordReturn   |
//!
//! Each record is a singleton per order. Repeating either command returns
//! the existing record as `AlreadyRecorded`.

pub mod ports;
pub mod service;

pub use ports::FulfillmentApi;
pub use service::FulfillmentService;
