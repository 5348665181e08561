//! Order Ledger - transactional store for order aggregates
//!
//! ```text
//! transact(order, op)
//!   │
//!   ├── try_lock(order) ──busy──→ sleep(backoff) ──→ retry … ──exhausted──→ Busy
//!   │
//!   ├── draft = committed.clone()
//!   ├── op(&mut OrderTx(draft))      ──error──→ drop draft, nothing written
//!   ├── draft.state == draft.derived_state()   ──no──→ ProjectionDrift
//!   ├── committed = draft            (single pointer swap)
//!   │
//!   └── unlock, then publish outbox
//! ```

use crate::domain::{OrderAggregate, OrderTx};
use parking_lot::{Mutex, RwLock};
use shared_bus::{EventPublisher, LoanEvent};
use shared_types::directory::{SystemTimeSource, TimeSource};
use shared_types::entities::{Order, OrderId, OrderState, PrincipalId, Report, ReportId};
use shared_types::errors::{WorkflowError, WorkflowResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lock acquisition budget.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Attempts before giving up with `Busy`.
    pub max_lock_attempts: u32,
    /// First sleep between attempts; doubles each retry.
    pub initial_backoff_ms: u64,
    /// Upper bound on a single sleep.
    pub max_backoff_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_lock_attempts: 5,
            initial_backoff_ms: 5,
            max_backoff_ms: 100,
        }
    }
}

/// One order's lock and its latest committed snapshot.
struct OrderCell {
    write: Mutex<()>,
    committed: RwLock<Arc<OrderAggregate>>,
    removed: AtomicBool,
}

impl OrderCell {
    fn new(snapshot: Arc<OrderAggregate>) -> Self {
        Self {
            write: Mutex::new(()),
            committed: RwLock::new(snapshot),
            removed: AtomicBool::new(false),
        }
    }

    fn snapshot(&self) -> Arc<OrderAggregate> {
        self.committed.read().clone()
    }
}

/// Result of a committed transaction.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    /// State before the transaction.
    pub previous: OrderState,
    /// Whether the order held its units before the transaction.
    pub held_units: bool,
    /// Snapshot that was committed.
    pub snapshot: Arc<OrderAggregate>,
    /// Events published after commit.
    pub events: Vec<LoanEvent>,
}

impl<T> Committed<T> {
    /// The commit let go of the order's units: it ended a loan whose
    /// equipment is back in the warehouse (or never left).
    #[must_use]
    pub fn released_units(&self) -> bool {
        self.held_units && !self.snapshot.holds_units()
    }
}

#[derive(Default)]
struct Indexes {
    by_borrower: HashMap<PrincipalId, Vec<OrderId>>,
    by_report: HashMap<ReportId, OrderId>,
    /// Active reports only; a borrower with an entry here is suspended.
    active_reports: HashMap<PrincipalId, HashSet<ReportId>>,
}

impl Indexes {
    /// Bring the report indexes in line with one committed snapshot.
    fn index_reports(&mut self, snapshot: &OrderAggregate) {
        for report in snapshot.reports() {
            self.by_report.entry(report.id).or_insert(snapshot.id());
            if report.is_active() {
                self.active_reports
                    .entry(snapshot.borrower().clone())
                    .or_default()
                    .insert(report.id);
            } else {
                self.forget_active(snapshot.borrower(), report.id);
            }
        }
    }

    fn forget_active(&mut self, borrower: &PrincipalId, report: ReportId) {
        if let Some(active) = self.active_reports.get_mut(borrower) {
            active.remove(&report);
            if active.is_empty() {
                self.active_reports.remove(borrower);
            }
        }
    }
}

/// The transactional order store.
///
/// Writers on the same order are serialized by that order's lock; writers on
/// different orders never contend. Readers never take an order lock.
pub struct OrderLedger {
    config: LedgerConfig,
    cells: RwLock<HashMap<OrderId, Arc<OrderCell>>>,
    indexes: RwLock<Indexes>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn TimeSource>,
}

impl OrderLedger {
    pub fn new(config: LedgerConfig, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_clock(config, publisher, Arc::new(SystemTimeSource))
    }

    pub fn with_clock(
        config: LedgerConfig,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            cells: RwLock::new(HashMap::new()),
            indexes: RwLock::new(Indexes::default()),
            publisher,
            clock,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn TimeSource> {
        &self.clock
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Insert a new order (in `DRAFT`) and run `op` on it as its first
    /// transaction. The order becomes visible only if `op` commits.
    pub async fn create<T, F>(&self, order: Order, op: F) -> WorkflowResult<Committed<T>>
    where
        F: FnOnce(&mut OrderTx<'_>) -> WorkflowResult<T>,
    {
        let id = order.id;
        let borrower = order.borrower.clone();
        let previous = order.state;
        let held_units = !previous.releases_units();

        let mut draft = OrderAggregate::draft(order);
        let (value, events) = self.apply(&mut draft, op)?;
        let snapshot = Arc::new(draft);

        {
            let mut cells = self.cells.write();
            if cells.contains_key(&id) {
                return Err(WorkflowError::InvalidOrder(format!("duplicate order id {id}")));
            }
            cells.insert(id, Arc::new(OrderCell::new(snapshot.clone())));
        }
        {
            let mut indexes = self.indexes.write();
            indexes.by_borrower.entry(borrower).or_default().push(id);
            indexes.index_reports(&snapshot);
        }

        info!(order = %id, state = %snapshot.state(), "order created");
        self.publish(&events).await;

        Ok(Committed {
            value,
            previous,
            held_units,
            snapshot,
            events,
        })
    }

    /// Run `op` against a draft of the order under its exclusive lock and
    /// commit the draft if `op` succeeds.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order does not exist (or was deleted while
    ///   waiting for the lock)
    /// - `Busy` when the lock budget is exhausted
    /// - `ProjectionDrift` if the draft's cached state disagrees with its
    ///   records
    /// - anything `op` returns
    pub async fn transact<T, F>(&self, id: OrderId, op: F) -> WorkflowResult<Committed<T>>
    where
        F: FnOnce(&mut OrderTx<'_>) -> WorkflowResult<T>,
    {
        let cell = self.cell(id)?;
        let committed = self
            .with_lock(id, &cell, |cell| self.commit(id, cell, op))
            .await??;

        if committed.previous != committed.snapshot.state() {
            info!(
                order = %id,
                from = %committed.previous,
                to = %committed.snapshot.state(),
                "order transition committed"
            );
        }
        self.publish(&committed.events).await;

        Ok(committed)
    }

    /// Delete an order and every record attached to it, under its lock.
    /// `guard` sees the latest committed snapshot and may veto.
    pub async fn remove<F>(&self, id: OrderId, guard: F) -> WorkflowResult<Arc<OrderAggregate>>
    where
        F: FnOnce(&OrderAggregate) -> WorkflowResult<()>,
    {
        let cell = self.cell(id)?;
        let removed = self
            .with_lock(id, &cell, |cell| -> WorkflowResult<Arc<OrderAggregate>> {
                if cell.removed.load(Ordering::Acquire) {
                    return Err(WorkflowError::OrderNotFound(id));
                }
                let snapshot = cell.snapshot();
                guard(&snapshot)?;
                cell.removed.store(true, Ordering::Release);
                self.cells.write().remove(&id);
                Ok(snapshot)
            })
            .await??;

        {
            let mut indexes = self.indexes.write();
            if let Some(ids) = indexes.by_borrower.get_mut(removed.borrower()) {
                ids.retain(|o| *o != id);
                if ids.is_empty() {
                    indexes.by_borrower.remove(removed.borrower());
                }
            }
            for report in removed.reports() {
                indexes.by_report.remove(&report.id);
                indexes.forget_active(removed.borrower(), report.id);
            }
        }

        info!(
            order = %id,
            coresponsibles = removed.coresponsibles().len(),
            reports = removed.reports().len(),
            "order deleted with its records"
        );
        Ok(removed)
    }

    // =========================================================================
    // READS (lock-free with respect to order locks)
    // =========================================================================

    /// Latest committed snapshot.
    pub fn snapshot(&self, id: OrderId) -> WorkflowResult<Arc<OrderAggregate>> {
        Ok(self.cell(id)?.snapshot())
    }

    #[must_use]
    pub fn contains(&self, id: OrderId) -> bool {
        self.cells.read().contains_key(&id)
    }

    /// Snapshots of every order the borrower has placed, oldest first.
    #[must_use]
    pub fn orders_of(&self, borrower: &PrincipalId) -> Vec<Arc<OrderAggregate>> {
        let ids = self
            .indexes
            .read()
            .by_borrower
            .get(borrower)
            .cloned()
            .unwrap_or_default();
        ids.into_iter()
            .filter_map(|id| self.snapshot(id).ok())
            .collect()
    }

    #[must_use]
    pub fn order_for_report(&self, report: ReportId) -> Option<OrderId> {
        self.indexes.read().by_report.get(&report).copied()
    }

    /// Whether any order of the borrower carries an active report.
    #[must_use]
    pub fn has_active_report(&self, borrower: &PrincipalId) -> bool {
        self.indexes.read().active_reports.contains_key(borrower)
    }

    /// The borrower's active reports, read through the report index.
    #[must_use]
    pub fn active_reports_of(&self, borrower: &PrincipalId) -> Vec<Report> {
        let located: Vec<(ReportId, OrderId)> = {
            let indexes = self.indexes.read();
            indexes
                .active_reports
                .get(borrower)
                .into_iter()
                .flatten()
                .filter_map(|report| indexes.by_report.get(report).map(|order| (*report, *order)))
                .collect()
        };
        located
            .into_iter()
            .filter_map(|(report, order)| {
                let snapshot = self.snapshot(order).ok()?;
                snapshot.report(report).filter(|r| r.is_active()).cloned()
            })
            .collect()
    }

    /// Snapshots of all orders, in no particular order.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<OrderAggregate>> {
        self.cells
            .read()
            .values()
            .map(|cell| cell.snapshot())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn cell(&self, id: OrderId) -> WorkflowResult<Arc<OrderCell>> {
        self.cells
            .read()
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::OrderNotFound(id))
    }

    /// Acquire the order lock with bounded exponential backoff and run `f`
    /// while holding it. The lock is never held across an await.
    async fn with_lock<R, F>(&self, id: OrderId, cell: &OrderCell, f: F) -> WorkflowResult<R>
    where
        F: FnOnce(&OrderCell) -> R,
    {
        let attempts = self.config.max_lock_attempts.max(1);
        let mut backoff = self.config.initial_backoff_ms;
        let mut f = f;

        for attempt in 1..=attempts {
            match try_locked(cell, f) {
                Ok(result) => return Ok(result),
                Err(returned) => f = returned,
            }
            if attempt < attempts {
                debug!(order = %id, attempt, backoff_ms = backoff, "order lock contended, retrying");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
                backoff = backoff.saturating_mul(2).min(self.config.max_backoff_ms);
            }
        }

        warn!(order = %id, attempts, "order lock not acquired");
        Err(WorkflowError::Busy { order: id, attempts })
    }

    /// Body of `transact`, run with the lock held.
    fn commit<T, F>(&self, id: OrderId, cell: &OrderCell, op: F) -> WorkflowResult<Committed<T>>
    where
        F: FnOnce(&mut OrderTx<'_>) -> WorkflowResult<T>,
    {
        if cell.removed.load(Ordering::Acquire) {
            return Err(WorkflowError::OrderNotFound(id));
        }

        let current = cell.snapshot();
        let previous = current.state();
        let held_units = current.holds_units();
        let mut draft = (*current).clone();
        let (value, events) = self.apply(&mut draft, op)?;

        let snapshot = Arc::new(draft);
        *cell.committed.write() = snapshot.clone();

        if !snapshot.reports().is_empty() {
            self.indexes.write().index_reports(&snapshot);
        }

        Ok(Committed {
            value,
            previous,
            held_units,
            snapshot,
            events,
        })
    }

    /// Run `op` on a draft and check the projection before anything is
    /// written back.
    fn apply<T, F>(&self, draft: &mut OrderAggregate, op: F) -> WorkflowResult<(T, Vec<LoanEvent>)>
    where
        F: FnOnce(&mut OrderTx<'_>) -> WorkflowResult<T>,
    {
        let mut tx = OrderTx::new(draft, self.clock.now());
        let value = op(&mut tx)?;
        let events = tx.into_outbox();

        if !draft.is_consistent() {
            let err = WorkflowError::ProjectionDrift {
                order: draft.id(),
                cached: draft.state(),
                derived: draft.derived_state(),
            };
            warn!(error = %err, "transaction dropped");
            return Err(err);
        }
        Ok((value, events))
    }

    async fn publish(&self, events: &[LoanEvent]) {
        for event in events {
            let receivers = self.publisher.publish(event.clone()).await;
            debug!(event = event.name(), order = %event.order(), receivers, "outbox event published");
        }
    }
}

/// Run `f` if the lock is free; hand `f` back otherwise.
fn try_locked<R, F>(cell: &OrderCell, f: F) -> Result<R, F>
where
    F: FnOnce(&OrderCell) -> R,
{
    match cell.write.try_lock() {
        Some(_guard) => Ok(f(cell)),
        None => Err(f),
    }
}
