//! # el-04-reporting
//!
//! Misconduct reports against fulfilled orders and the borrower suspension
//! they imply.
//!
//! ```text
//! [ACTIVE] ──deactivate──→ [INACTIVE]        (no re-activation)
//! ```
//!
//! - Reports are filed only on `DELIVERED` or `RETURNED` orders.
//! - One active report per (issuer, order); a repeat returns it.
//! - A borrower is suspended while any report on one of their orders is
//!   active. Suspension is recomputed from committed snapshots on every
//!   call and never stored.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{active_reports_of, is_suspended, reportable};
pub use ports::ReportingApi;
pub use service::ReportingService;
