//! Permission edge definitions.

use crate::{action::ActionPath, subject::SubjectRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An explicit access decision attached to a `(subject, action)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Access is granted.
    Allow,
    /// Access is refused.
    Deny,
    /// No decision at this node; defer to the next node on the resolution
    /// path.
    Inherit,
}

impl Decision {
    /// Whether this decision terminates resolution (Allow or Deny).
    pub fn is_explicit(&self) -> bool {
        !matches!(self, Decision::Inherit)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::Inherit => "inherit",
        };
        write!(f, "{s}")
    }
}

/// A single edge of the access-control graph.
///
/// At most one edge exists per `(subject, action)` pair; writes upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEdge {
    subject: SubjectRef,
    action: ActionPath,
    decision: Decision,
    updated_at: DateTime<Utc>,
}

impl PermissionEdge {
    /// Create a new edge stamped with the current time.
    pub fn new(subject: SubjectRef, action: ActionPath, decision: Decision) -> Self {
        Self {
            subject,
            action,
            decision,
            updated_at: Utc::now(),
        }
    }

    /// The subject this edge applies to.
    pub fn subject(&self) -> &SubjectRef {
        &self.subject
    }

    /// The action node this edge applies to.
    pub fn action(&self) -> &ActionPath {
        &self.action
    }

    /// The decision carried by this edge.
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// When the edge was last written.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The upsert key for this edge.
    pub fn key(&self) -> (SubjectRef, ActionPath) {
        (self.subject.clone(), self.action.clone())
    }
}
