//! The subject/action access graph (ARO/ACO).
//!
//! Subjects form a multi-parent DAG: a user node typically has one or more
//! role parents, and roles may themselves inherit from other roles. Actions
//! form a tree derived from their slash-separated paths. The graph only
//! records structure; decisions live in storage as `PermissionEdge` rows.

use crate::{
    action::ActionPath,
    error::{Error, Result},
    subject::SubjectRef,
};
use dashmap::{DashMap, DashSet};
use std::collections::{HashSet, VecDeque};

/// Registered subjects, their parent links, and registered action nodes.
#[derive(Debug)]
pub struct AccessGraph {
    // child -> parents
    subject_parents: DashMap<SubjectRef, HashSet<SubjectRef>>,
    subjects: DashSet<SubjectRef>,
    actions: DashSet<ActionPath>,
    max_depth: usize,
}

impl AccessGraph {
    /// Create an empty graph with the given maximum inheritance depth.
    pub fn new(max_depth: usize) -> Self {
        Self {
            subject_parents: DashMap::new(),
            subjects: DashSet::new(),
            actions: DashSet::new(),
            max_depth,
        }
    }

    /// Register a subject node.
    pub fn register_subject(&self, subject: SubjectRef) {
        self.subjects.insert(subject);
    }

    /// Check whether a subject is registered.
    pub fn has_subject(&self, subject: &SubjectRef) -> bool {
        self.subjects.contains(subject)
    }

    /// Add a parent link (child inherits permissions from parent).
    ///
    /// Both nodes must already be registered. Rejects links that would
    /// create a cycle or exceed the maximum depth.
    pub fn add_parent(&self, child: &SubjectRef, parent: &SubjectRef) -> Result<()> {
        if !self.has_subject(child) {
            return Err(Error::UnresolvedSubject(child.to_string()));
        }
        if !self.has_subject(parent) {
            return Err(Error::UnresolvedSubject(parent.to_string()));
        }
        if self.would_create_cycle(child, parent)? {
            return Err(Error::CircularDependency(child.to_string()));
        }

        self.subject_parents
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());

        Ok(())
    }

    /// Remove a parent link.
    pub fn remove_parent(&self, child: &SubjectRef, parent: &SubjectRef) {
        if let Some(mut parents) = self.subject_parents.get_mut(child) {
            parents.remove(parent);
            if parents.is_empty() {
                drop(parents);
                self.subject_parents.remove(child);
            }
        }
    }

    /// Direct parents of a subject.
    pub fn parents(&self, subject: &SubjectRef) -> Vec<SubjectRef> {
        self.subject_parents
            .get(subject)
            .map(|parents| parents.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The subject itself followed by its ancestors in breadth-first order.
    ///
    /// This is the nearest-first order used for decision resolution: the
    /// node's own edges take precedence over its parents', which take
    /// precedence over grandparents'.
    pub fn inheritance_chain(&self, subject: &SubjectRef) -> Result<Vec<SubjectRef>> {
        if !self.has_subject(subject) {
            return Err(Error::UnresolvedSubject(subject.to_string()));
        }

        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back((subject.clone(), 0usize));
        visited.insert(subject.clone());

        while let Some((node, depth)) = queue.pop_front() {
            if depth > self.max_depth {
                return Err(Error::MaxDepthExceeded(self.max_depth));
            }
            chain.push(node.clone());
            // Sort parents for a deterministic chain among equal distances.
            let mut parents = self.parents(&node);
            parents.sort();
            for parent in parents {
                if visited.insert(parent.clone()) {
                    queue.push_back((parent, depth + 1));
                }
            }
        }

        Ok(chain)
    }

    /// Register an action node; ancestor nodes are registered implicitly.
    pub fn register_action(&self, action: &ActionPath) {
        for node in action.self_and_ancestors() {
            self.actions.insert(node);
        }
    }

    /// Check whether an action node is registered.
    pub fn has_action(&self, action: &ActionPath) -> bool {
        self.actions.contains(action)
    }

    /// All registered action nodes, sorted.
    pub fn actions(&self) -> Vec<ActionPath> {
        let mut actions: Vec<ActionPath> = self.actions.iter().map(|a| a.key().clone()).collect();
        actions.sort();
        actions
    }

    /// Number of registered subjects.
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    fn would_create_cycle(&self, child: &SubjectRef, parent: &SubjectRef) -> Result<bool> {
        let mut visited = HashSet::new();
        self.has_path(parent, child, &mut visited, 0)
    }

    fn has_path(
        &self,
        from: &SubjectRef,
        to: &SubjectRef,
        visited: &mut HashSet<SubjectRef>,
        depth: usize,
    ) -> Result<bool> {
        if depth > self.max_depth {
            return Err(Error::MaxDepthExceeded(self.max_depth));
        }

        if from == to {
            return Ok(true);
        }

        if !visited.insert(from.clone()) {
            return Ok(false);
        }

        for parent in self.parents(from) {
            if self.has_path(&parent, to, visited, depth + 1)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
