//! Identity directory over the roster.
//!
//! Roles, instructors and the coordinator come from the roster. Suspension
//! is read from the reporting ledger on every call.

use super::roster::Roster;
use async_trait::async_trait;
use el_01_order_ledger::OrderLedger;
use shared_types::directory::IdentityDirectory;
use shared_types::entities::{PrincipalId, SubjectId};
use shared_types::errors::{WorkflowError, WorkflowResult};
use shared_types::identity::Role;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RosterDirectory {
    roles: HashMap<PrincipalId, Role>,
    instructors: HashMap<SubjectId, Vec<PrincipalId>>,
    coordinator: Option<PrincipalId>,
    ledger: Arc<OrderLedger>,
}

impl RosterDirectory {
    #[must_use]
    pub fn new(roster: &Roster, ledger: Arc<OrderLedger>) -> Self {
        Self {
            roles: roster
                .principals
                .iter()
                .map(|p| (p.id.clone(), p.role))
                .collect(),
            instructors: roster
                .subjects
                .iter()
                .map(|s| (s.id.clone(), s.instructors.clone()))
                .collect(),
            coordinator: roster.coordinator.clone(),
            ledger,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[async_trait]
impl IdentityDirectory for RosterDirectory {
    async fn role_of(&self, principal: &PrincipalId) -> WorkflowResult<Role> {
        self.roles
            .get(principal)
            .copied()
            .ok_or_else(|| WorkflowError::Directory(format!("unknown principal {principal}")))
    }

    async fn is_suspended(&self, principal: &PrincipalId) -> WorkflowResult<bool> {
        Ok(el_04_reporting::is_suspended(&self.ledger, principal))
    }

    async fn instructors_of(&self, subject: &SubjectId) -> WorkflowResult<Vec<PrincipalId>> {
        Ok(self.instructors.get(subject).cloned().unwrap_or_default())
    }

    async fn coordinator(&self) -> WorkflowResult<Option<PrincipalId>> {
        Ok(self.coordinator.clone())
    }
}
