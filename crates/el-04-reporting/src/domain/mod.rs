//! Domain layer for Reporting

pub mod suspension;

pub use suspension::{active_reports_of, is_suspended, reportable};
