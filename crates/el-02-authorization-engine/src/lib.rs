//! # el-02-authorization-engine
//!
//! Opens loan orders and drives them through co-responsible sign-off and
//! the single authorizer decision.
//!
//! ## State Machine
//!
//! ```text
//!                       ┌── all accept ──→ [AWAITING_AUTHORIZATION] ──accept──→ [APPROVED]
//! [AWAITING_CO_RESPONSIBLES]                          │
//!                       └── any reject ──→ [REJECTED_BY_CO_RESPONSIBLE]
//!                                                     └──reject──→ [REJECTED_BY_AUTHORIZER]
//!
//! (no co-responsibles) create ──→ [AWAITING_AUTHORIZATION]
//! any non-terminal ──cancel──→ [CANCELLED]
//! ```
//!
//! ## Authorizer Routing
//!
//! | Kind          | Authorizer                         |
//! |---------------|------------------------------------|
//! | Ordinary      | first instructor of the subject    |
//! | Extraordinary | the coordinator                    |
//!
//! ## Outbound Dependencies
//!
//! | Trait                | Purpose                                  |
//! |----------------------|------------------------------------------|
//! | `IdentityDirectory`  | roles, suspension, authorizer lookup     |
//! | `InventoryDirectory` | unit availability and reservations       |
//!
//! Directory calls are made before the order lock is taken; the ledger
//! transaction itself never awaits.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{authorize_capability, route_authorizer, OrderRequest};
pub use ports::AuthorizationApi;
pub use service::AuthorizationService;
