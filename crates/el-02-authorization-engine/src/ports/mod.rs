//! Ports for the Authorization Engine.
//!
//! Outbound dependencies are the shared `IdentityDirectory` and
//! `InventoryDirectory` traits.

pub mod inbound;

pub use inbound::AuthorizationApi;
