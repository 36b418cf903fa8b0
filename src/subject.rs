//! Subject references (users, roles, or other entities in the access graph).

use serde::{Deserialize, Serialize};

/// A reference to a node in the access graph, identified by a model name and
/// a numeric foreign key (e.g. `Role/1`, `User/3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectRef {
    /// The model the subject belongs to (e.g. "Role", "User").
    model: String,
    /// Identifier of the row within the model.
    foreign_key: i64,
}

impl SubjectRef {
    /// Create a subject reference for an arbitrary model.
    pub fn new(model: impl Into<String>, foreign_key: i64) -> Self {
        Self {
            model: model.into(),
            foreign_key,
        }
    }

    /// Create a reference to a role subject.
    pub fn role(foreign_key: i64) -> Self {
        Self::new("Role", foreign_key)
    }

    /// Create a reference to a user subject.
    pub fn user(foreign_key: i64) -> Self {
        Self::new("User", foreign_key)
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the foreign key.
    pub fn foreign_key(&self) -> i64 {
        self.foreign_key
    }

    /// Check whether this reference points at a user subject.
    pub fn is_user(&self) -> bool {
        self.model == "User"
    }

    /// Check whether this reference points at a role subject.
    pub fn is_role(&self) -> bool {
        self.model == "Role"
    }
}

impl std::fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.model, self.foreign_key)
    }
}
