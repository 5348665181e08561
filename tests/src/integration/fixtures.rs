//! Shared setup: a started runtime over a fixed roster, with every
//! notification captured by a `RecordingSink`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use el_02_authorization_engine::OrderRequest;
use el_05_notification_dispatcher::{Notification, RecordingSink};
use lending_runtime::adapters::{Roster, RosterPrincipal, RosterSubject};
use lending_runtime::container::{
    Authorization, Fulfillment, LendingServices, Reporting, RuntimeConfig,
};
use lending_runtime::LendingRuntime;
use shared_types::entities::{Location, OrderKind, PrincipalId, SubjectId, UnitId};
use shared_types::identity::Role;

pub const BORROWER: &str = "A01";
pub const OTHER_BORROWER: &str = "A02";
pub const INSTRUCTOR: &str = "T01";
pub const COORDINATOR: &str = "C01";
pub const WAREHOUSE: &str = "W01";
pub const SUBJECT: &str = "CINE-2";
pub const UNIT: &str = "CAM-01";

const CORESPONSIBLES: [&str; 16] = [
    "R01", "R02", "R03", "R04", "R05", "R06", "R07", "R08", "R09", "R10", "R11", "R12",
    "R13", "R14", "R15", "R16",
];

/// Co-responsible `n`, counting from 1.
pub fn coresponsible(n: usize) -> &'static str {
    CORESPONSIBLES[n - 1]
}

pub fn p(id: &str) -> PrincipalId {
    PrincipalId::from(id)
}

pub fn roster() -> Roster {
    let mut principals: Vec<RosterPrincipal> = [
        (BORROWER, Role::Borrower),
        (OTHER_BORROWER, Role::Borrower),
        (INSTRUCTOR, Role::Instructor),
        (COORDINATOR, Role::Coordinator),
        (WAREHOUSE, Role::WarehouseKeeper),
    ]
    .into_iter()
    .map(|(id, role)| RosterPrincipal { id: p(id), role })
    .collect();
    principals.extend(CORESPONSIBLES.iter().map(|id| RosterPrincipal {
        id: p(id),
        role: Role::CoResponsible,
    }));

    Roster {
        principals,
        subjects: vec![RosterSubject {
            id: SubjectId::from(SUBJECT),
            instructors: vec![p(INSTRUCTOR)],
        }],
        coordinator: Some(p(COORDINATOR)),
        units: vec![UnitId::from(UNIT), UnitId::from("TRI-02")],
    }
}

/// Lock budget generous enough that contention tests never see `Busy`.
pub fn test_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.ledger.max_lock_attempts = 200;
    config.ledger.initial_backoff_ms = 1;
    config.ledger.max_backoff_ms = 10;
    config.dispatcher.retry_delay_ms = 1;
    config
}

static NEXT_DAY: AtomicI64 = AtomicI64::new(1);

/// A request over a window no other fixture request overlaps, so units
/// never collide across tests.
pub fn request(borrower: &str, coresponsibles: &[&str], kind: OrderKind) -> OrderRequest {
    let day = NEXT_DAY.fetch_add(1, Ordering::Relaxed);
    let start = Utc::now() + chrono::Duration::days(day);
    OrderRequest {
        borrower: p(borrower),
        subject: SubjectId::from(SUBJECT),
        start,
        end: start + chrono::Duration::hours(4),
        justification: "documentary shoot".into(),
        kind,
        location: match kind {
            OrderKind::Ordinary => Location::on_campus(),
            OrderKind::Extraordinary => Location::off_campus("harbour district"),
        },
        units: vec![UnitId::from(UNIT)],
        coresponsibles: coresponsibles.iter().map(|c| p(c)).collect(),
    }
}

pub struct World {
    pub runtime: LendingRuntime<RecordingSink>,
    pub services: Arc<LendingServices<RecordingSink>>,
    pub sink: Arc<RecordingSink>,
}

impl World {
    /// Build and start. Must run inside a tokio runtime.
    pub fn start() -> Self {
        Self::start_with(test_config())
    }

    pub fn start_with(config: RuntimeConfig) -> Self {
        let sink = Arc::new(RecordingSink::new());
        let runtime = LendingRuntime::new(config, &roster(), sink.clone());
        runtime.start().expect("fresh runtime starts");
        let services = runtime.services();
        Self {
            runtime,
            services,
            sink,
        }
    }

    pub fn authorization(&self) -> &Authorization {
        &self.services.authorization
    }

    pub fn fulfillment(&self) -> &Fulfillment {
        &self.services.fulfillment
    }

    pub fn reporting(&self) -> &Reporting {
        &self.services.reporting
    }

    /// Poll the sink until at least `count` notifications arrived.
    pub async fn notifications(&self, count: usize) -> Vec<Notification> {
        for _ in 0..200 {
            let sent = self.sink.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.sink.sent()
    }

    /// Let in-flight envelopes drain, then stop the dispatcher.
    pub async fn settle(&self) {
        let before = self.services.dispatcher.stats().envelopes;
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.services.dispatcher.stats().envelopes != before {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.runtime.shutdown().await;
    }
}
