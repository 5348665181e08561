//! Ports for Reporting

pub mod inbound;

pub use inbound::ReportingApi;
