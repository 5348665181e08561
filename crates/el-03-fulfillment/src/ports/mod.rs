//! Ports for Fulfillment

pub mod inbound;

pub use inbound::FulfillmentApi;
