//! # Shared Bus - Event Bus for Loan Workflow Events
//!
//! Subsystems never call the notification side directly. Once a transition
//! commits, the order ledger publishes the resulting `LoanEvent`s here and
//! subscribers react on their own schedule.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Order Ledger │                    │  Dispatcher  │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - Every event travels in an `EventEnvelope` with a unique id.
//! - Delivery is at-least-once; consumers drop repeats with a
//!   `DeliveredEventCache`.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod dedup_cache;
pub mod events;
pub mod publisher;
pub mod subscriber;

pub use dedup_cache::{DedupError, DeliveredEventCache};
pub use events::{EventEnvelope, EventFilter, EventTopic, LoanEvent, RejectionReason};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are overwritten.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
