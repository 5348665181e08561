//! # Lending Services
//!
//! Builds every subsystem over one ledger and one event bus.
//!
//! ```text
//! shared infrastructure: InMemoryEventBus, OrderLedger, PermissionTable
//!           │
//!           ├── directories: RosterDirectory (identity), InMemoryInventory
//!           │
//!           ├── AuthorizationService ─┐
//!           ├── FulfillmentService   ─┼── commit ──→ ledger outbox ──→ bus
//!           ├── ReportingService     ─┘                                 │
//!           │                                                           ↓
//!           └── NotificationDispatcher ←──────────────────── Subscription
//! ```

use crate::adapters::{InMemoryInventory, Roster, RosterDirectory};
use crate::container::config::RuntimeConfig;
use el_01_order_ledger::OrderLedger;
use el_02_authorization_engine::AuthorizationService;
use el_03_fulfillment::FulfillmentService;
use el_04_reporting::ReportingService;
use el_05_notification_dispatcher::{NotificationDispatcher, NotificationSink};
use shared_bus::InMemoryEventBus;
use shared_types::identity::PermissionTable;
use std::sync::Arc;
use tracing::{info, instrument};

pub type Authorization = AuthorizationService<RosterDirectory, InMemoryInventory>;
pub type Fulfillment = FulfillmentService<RosterDirectory, InMemoryInventory>;
pub type Reporting = ReportingService<RosterDirectory>;
pub type Dispatcher<S> = NotificationDispatcher<S>;

pub struct LendingServices<S: NotificationSink> {
    pub event_bus: Arc<InMemoryEventBus>,
    pub ledger: Arc<OrderLedger>,
    pub identity: Arc<RosterDirectory>,
    pub inventory: Arc<InMemoryInventory>,
    pub permissions: Arc<PermissionTable>,

    pub authorization: Arc<Authorization>,
    pub fulfillment: Arc<Fulfillment>,
    pub reporting: Arc<Reporting>,
    pub dispatcher: Arc<Dispatcher<S>>,

    /// Immutable after construction.
    pub config: RuntimeConfig,
}

impl<S: NotificationSink> LendingServices<S> {
    #[instrument(name = "services_init", skip_all)]
    pub fn new(config: RuntimeConfig, roster: &Roster, sink: Arc<S>) -> Self {
        let event_bus = Arc::new(InMemoryEventBus::with_capacity(config.bus.capacity));
        let ledger = Arc::new(OrderLedger::new(config.ledger.clone(), event_bus.clone()));
        let permissions = Arc::new(PermissionTable::standard());

        let identity = Arc::new(RosterDirectory::new(roster, ledger.clone()));
        let inventory = Arc::new(InMemoryInventory::new(roster.units.iter().cloned()));
        info!(
            principals = identity.len(),
            units = roster.units.len(),
            "directories loaded"
        );

        let authorization = Arc::new(AuthorizationService::new(
            ledger.clone(),
            identity.clone(),
            inventory.clone(),
            permissions.clone(),
        ));
        let fulfillment = Arc::new(FulfillmentService::new(
            ledger.clone(),
            identity.clone(),
            inventory.clone(),
            permissions.clone(),
        ));
        let reporting = Arc::new(ReportingService::new(
            ledger.clone(),
            identity.clone(),
            permissions.clone(),
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(sink, config.dispatcher.clone()));

        Self {
            event_bus,
            ledger,
            identity,
            inventory,
            permissions,
            authorization,
            fulfillment,
            reporting,
            dispatcher,
            config,
        }
    }
}
