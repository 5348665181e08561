//! # Shared Types Crate
//!
//! This crate contains the loan domain entities, the principal/role model,
//! the workflow error, and the ports through which the core reaches its
//! external collaborators.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Cached Projection**: `Order::state` is a cache of what the attached
//!   records imply. Only the order ledger writes it.
//! - **Capabilities, not subtypes**: A `Principal` is an id plus a `Role`;
//!   what a role may do is looked up in the startup `PermissionTable`.

pub mod directory;
pub mod entities;
pub mod errors;
pub mod identity;

pub use directory::{IdentityDirectory, InventoryDirectory, SystemTimeSource, TimeSource};
pub use entities::*;
pub use errors::*;
pub use identity::*;
