//! In-memory inventory: a fixed set of units and the windows they are
//! reserved for.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::directory::InventoryDirectory;
use shared_types::entities::{OrderId, TimeWindow, UnitId};
use shared_types::errors::{WorkflowError, WorkflowResult};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone)]
struct Reservation {
    window: TimeWindow,
    units: Vec<UnitId>,
}

#[derive(Debug, Default)]
pub struct InMemoryInventory {
    units: HashSet<UnitId>,
    reservations: RwLock<HashMap<OrderId, Reservation>>,
}

impl InMemoryInventory {
    pub fn new(units: impl IntoIterator<Item = UnitId>) -> Self {
        Self {
            units: units.into_iter().collect(),
            reservations: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn reserved_by(&self, order: OrderId) -> Vec<UnitId> {
        self.reservations
            .read()
            .get(&order)
            .map(|r| r.units.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn reservation_count(&self) -> usize {
        self.reservations.read().len()
    }

    fn conflicts(
        reservations: &HashMap<OrderId, Reservation>,
        unit: &UnitId,
        window: &TimeWindow,
        except: Option<OrderId>,
    ) -> bool {
        reservations.iter().any(|(order, r)| {
            Some(*order) != except && r.window.overlaps(window) && r.units.contains(unit)
        })
    }
}

#[async_trait]
impl InventoryDirectory for InMemoryInventory {
    async fn is_unit_available(&self, unit: &UnitId, window: &TimeWindow) -> WorkflowResult<bool> {
        if !self.units.contains(unit) {
            debug!(%unit, "unknown unit");
            return Ok(false);
        }
        Ok(!Self::conflicts(&self.reservations.read(), unit, window, None))
    }

    async fn reserve_units(&self, order: OrderId, units: &[UnitId], window: &TimeWindow) -> WorkflowResult<()> {
        let mut reservations = self.reservations.write();
        if reservations.contains_key(&order) {
            return Ok(());
        }

        let taken: Vec<UnitId> = units
            .iter()
            .filter(|u| {
                !self.units.contains(*u) || Self::conflicts(&reservations, u, window, Some(order))
            })
            .cloned()
            .collect();
        if !taken.is_empty() {
            return Err(WorkflowError::UnitsUnavailable { units: taken });
        }

        reservations.insert(
            order,
            Reservation {
                window: *window,
                units: units.to_vec(),
            },
        );
        Ok(())
    }

    async fn release_units(&self, order: OrderId) -> WorkflowResult<()> {
        self.reservations.write().remove(&order);
        Ok(())
    }
}
