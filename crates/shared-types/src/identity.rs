//! # Principals, Roles and Capabilities
//!
//! A principal is an id tagged with a role. Roles differ only in which
//! workflow operations they may invoke, so permission checks go through a
//! `PermissionTable` built once at startup.

use crate::entities::PrincipalId;
use crate::errors::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Borrower,
    CoResponsible,
    Instructor,
    Coordinator,
    WarehouseKeeper,
}

/// A workflow operation a role may be permitted to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    RequestOrder,
    CoSign,
    AuthorizeOrdinary,
    AuthorizeExtraordinary,
    RecordDelivery,
    RecordReturn,
    FileReport,
    ResolveReport,
    CancelAnyOrder,
    DeleteOrder,
}

/// A resolved user of the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<PrincipalId>, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}

/// Role → capability grants. Process-wide configuration, not business logic.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    grants: HashMap<Role, HashSet<Capability>>,
}

impl PermissionTable {
    /// Empty table: every check fails.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard grants for the five roles.
    #[must_use]
    pub fn standard() -> Self {
        use Capability::*;

        Self::empty()
            .grant(Role::Borrower, &[RequestOrder, CoSign])
            .grant(Role::CoResponsible, &[CoSign])
            .grant(Role::Instructor, &[AuthorizeOrdinary])
            .grant(
                Role::Coordinator,
                &[AuthorizeExtraordinary, CancelAnyOrder, DeleteOrder, ResolveReport],
            )
            .grant(
                Role::WarehouseKeeper,
                &[
                    RecordDelivery,
                    RecordReturn,
                    FileReport,
                    ResolveReport,
                    CancelAnyOrder,
                    DeleteOrder,
                ],
            )
    }

    #[must_use]
    pub fn grant(mut self, role: Role, capabilities: &[Capability]) -> Self {
        self.grants
            .entry(role)
            .or_default()
            .extend(capabilities.iter().copied());
        self
    }

    #[must_use]
    pub fn allows(&self, role: Role, capability: Capability) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|caps| caps.contains(&capability))
    }

    /// Guard: `Forbidden` unless the principal's role carries `capability`.
    pub fn require(&self, principal: &Principal, capability: Capability) -> WorkflowResult<()> {
        if self.allows(principal.role, capability) {
            Ok(())
        } else {
            tracing::debug!(
                principal = %principal.id,
                role = ?principal.role,
                ?capability,
                "capability check failed"
            );
            Err(WorkflowError::Forbidden {
                principal: principal.id.clone(),
                capability,
            })
        }
    }
}
