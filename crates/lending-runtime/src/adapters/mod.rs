//! # Adapters
//!
//! In-process implementations of the directory ports, backed by the roster
//! and by the order ledger itself.

pub mod identity;
pub mod inventory;
pub mod roster;

pub use identity::RosterDirectory;
pub use inventory::InMemoryInventory;
pub use roster::{Roster, RosterError, RosterPrincipal, RosterSubject};
