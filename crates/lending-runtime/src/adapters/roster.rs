//! JSON roster: the people, subjects and units the directories serve.
//!
//! ```json
//! {
//!   "principals": [{ "id": "A01", "role": "Borrower" }],
//!   "subjects": [{ "id": "CINE-2", "instructors": ["T01"] }],
//!   "coordinator": "C01",
//!   "units": ["CAM-01", "TRI-03"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use shared_types::entities::{PrincipalId, SubjectId, UnitId};
use shared_types::identity::Role;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterPrincipal {
    pub id: PrincipalId,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterSubject {
    pub id: SubjectId,
    /// Primary instructor first.
    #[serde(default)]
    pub instructors: Vec<PrincipalId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub principals: Vec<RosterPrincipal>,
    #[serde(default)]
    pub subjects: Vec<RosterSubject>,
    #[serde(default)]
    pub coordinator: Option<PrincipalId>,
    #[serde(default)]
    pub units: Vec<UnitId>,
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("cannot read roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed roster: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("principal {0} listed more than once")]
    DuplicatePrincipal(PrincipalId),

    #[error("subject {subject} names {instructor}, who is not an instructor")]
    NotAnInstructor {
        subject: SubjectId,
        instructor: PrincipalId,
    },

    #[error("coordinator {0} is not listed with the coordinator role")]
    NotACoordinator(PrincipalId),
}

impl Roster {
    /// # Errors
    ///
    /// I/O, JSON, or consistency failures.
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// # Errors
    ///
    /// JSON or consistency failures.
    pub fn from_json(raw: &str) -> Result<Self, RosterError> {
        let roster: Self = serde_json::from_str(raw)?;
        roster.validate()?;
        Ok(roster)
    }

    /// Every principal appears once, instructors hold the instructor role,
    /// the coordinator holds the coordinator role.
    pub fn validate(&self) -> Result<(), RosterError> {
        let mut seen = HashSet::new();
        for principal in &self.principals {
            if !seen.insert(&principal.id) {
                return Err(RosterError::DuplicatePrincipal(principal.id.clone()));
            }
        }

        for subject in &self.subjects {
            for instructor in &subject.instructors {
                if self.role_of(instructor) != Some(Role::Instructor) {
                    return Err(RosterError::NotAnInstructor {
                        subject: subject.id.clone(),
                        instructor: instructor.clone(),
                    });
                }
            }
        }

        if let Some(coordinator) = &self.coordinator {
            if self.role_of(coordinator) != Some(Role::Coordinator) {
                return Err(RosterError::NotACoordinator(coordinator.clone()));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn role_of(&self, id: &PrincipalId) -> Option<Role> {
        self.principals.iter().find(|p| &p.id == id).map(|p| p.role)
    }

    /// A small roster for running the binary without a file.
    #[must_use]
    pub fn demo() -> Self {
        let principal = |id: &str, role| RosterPrincipal {
            id: PrincipalId::from(id),
            role,
        };
        Self {
            principals: vec![
                principal("A01", Role::Borrower),
                principal("A02", Role::Borrower),
                principal("R01", Role::CoResponsible),
                principal("T01", Role::Instructor),
                principal("C01", Role::Coordinator),
                principal("W01", Role::WarehouseKeeper),
            ],
            subjects: vec![RosterSubject {
                id: SubjectId::from("CINE-2"),
                instructors: vec![PrincipalId::from("T01")],
            }],
            coordinator: Some(PrincipalId::from("C01")),
            units: ["CAM-01", "CAM-02", "TRI-03", "MIC-04"]
                .into_iter()
                .map(UnitId::from)
                .collect(),
        }
    }
}
