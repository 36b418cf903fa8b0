//! Core permission store implementation.
//!
//! This module contains the central `PermissionStore` struct, which owns the
//! mapping from `(subject, action)` pairs to allow/deny decisions. Edges are
//! persisted through an [`EdgeStorage`](crate::storage::EdgeStorage) backend
//! and lookups are fronted by a namespaced cache.
//!
//! # Cache invalidation
//!
//! Every permission write clears the entire `"permissions"` cache namespace.
//! The set of cached keys affected by a single edge write is not computed;
//! a stale-free cache is maintained by clearing the whole partition and
//! letting subsequent lookups repopulate it. Cache failures never block the
//! authoritative write path.
//!
//! # Decision resolution
//!
//! A lookup walks the subject inheritance chain outward from the user node
//! (breadth-first, nearest first) and, within each subject, the action path
//! from the requested node up to its root. The first explicit allow or deny
//! found wins; absent any explicit decision the action is not permitted.

#[cfg(feature = "audit")]
use log::info;
use log::warn;

use crate::{
    action::ActionPath,
    cache::{CacheService, MemoryCache, PERMISSIONS_NAMESPACE},
    error::{Error, Result},
    graph::AccessGraph,
    metrics::AclMetrics,
    permission::{Decision, PermissionEdge},
    storage::{EdgeStorage, MemoryStorage},
    subject::SubjectRef,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Configuration for the permission store.
#[derive(Debug, Clone)]
pub struct AclConfig {
    /// Maximum depth for subject graph traversal.
    pub max_graph_depth: usize,
    /// Whether to enable permission caching.
    pub enable_caching: bool,
    /// Cache TTL in seconds.
    pub cache_ttl_seconds: u64,
    /// Whether to emit audit log events.
    pub enable_audit: bool,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            max_graph_depth: 10,
            enable_caching: true,
            cache_ttl_seconds: 300, // 5 minutes
            enable_audit: true,
        }
    }
}

/// The permission store: authoritative edges plus an invalidate-on-write
/// cache.
pub struct PermissionStore<S = MemoryStorage, C = MemoryCache>
where
    S: EdgeStorage,
    C: CacheService,
{
    storage: S,
    cache: C,
    graph: AccessGraph,
    config: AclConfig,
    metrics: Arc<AclMetrics>,
}

impl PermissionStore<MemoryStorage, MemoryCache> {
    /// Create a store with default configuration, memory storage, and an
    /// in-process cache.
    pub fn new() -> Self {
        Self::with_config(AclConfig::default())
    }

    /// Create a store with custom configuration and in-memory backends.
    pub fn with_config(config: AclConfig) -> Self {
        let cache = MemoryCache::new(config.cache_ttl_seconds);
        Self::with_backends(MemoryStorage::new(), cache, config)
    }
}

impl Default for PermissionStore<MemoryStorage, MemoryCache> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C> PermissionStore<S, C>
where
    S: EdgeStorage,
    C: CacheService,
{
    /// Create a store with custom storage and cache backends.
    pub fn with_backends(storage: S, cache: C, config: AclConfig) -> Self {
        let graph = AccessGraph::new(config.max_graph_depth);
        Self {
            storage,
            cache,
            graph,
            config,
            metrics: Arc::new(AclMetrics::new()),
        }
    }

    /// Register a subject node in the access graph.
    pub fn register_subject(&self, subject: SubjectRef) {
        self.graph.register_subject(subject);
    }

    /// Add a parent link: `child` inherits permissions from `parent`.
    pub fn add_subject_parent(&self, child: &SubjectRef, parent: &SubjectRef) -> Result<()> {
        self.graph.add_parent(child, parent)?;

        #[cfg(feature = "audit")]
        if self.config.enable_audit {
            info!("Subject '{child}' now inherits from '{parent}'");
        }

        Ok(())
    }

    /// Register a user node and link it to its role parents.
    pub fn register_user(&self, user_id: i64, role_ids: &[i64]) -> Result<()> {
        let user = SubjectRef::user(user_id);
        self.graph.register_subject(user.clone());
        for role_id in role_ids {
            self.add_subject_parent(&user, &SubjectRef::role(*role_id))?;
        }
        Ok(())
    }

    /// Grant `subject` the given action.
    ///
    /// Upserts an allow edge for `(subject, action)` and clears every entry
    /// in the `"permissions"` cache namespace. Fails only when the subject
    /// is unresolved, the action path is invalid, or persistence fails;
    /// cache failures are logged and swallowed.
    pub fn allow(&mut self, subject: &SubjectRef, action: &str) -> Result<()> {
        self.set_permission(subject, action, Decision::Allow)
    }

    /// Refuse `subject` the given action. Same contract as [`allow`].
    ///
    /// [`allow`]: PermissionStore::allow
    pub fn deny(&mut self, subject: &SubjectRef, action: &str) -> Result<()> {
        self.set_permission(subject, action, Decision::Deny)
    }

    /// Reset `(subject, action)` to carry no explicit decision, deferring
    /// to the next node on the resolution path. Same contract as [`allow`].
    ///
    /// [`allow`]: PermissionStore::allow
    pub fn inherit(&mut self, subject: &SubjectRef, action: &str) -> Result<()> {
        self.set_permission(subject, action, Decision::Inherit)
    }

    /// Compute the set of actions a user may invoke.
    ///
    /// The result is deduplicated: an action granted through several roles
    /// appears once. Served from cache when possible; a recomputed result is
    /// written back under a key derived from `user_id`.
    pub fn get_allowed_actions_by_user_id(&self, user_id: i64) -> Result<BTreeSet<ActionPath>> {
        self.metrics.record_lookup();

        let user = SubjectRef::user(user_id);
        if !self.graph.has_subject(&user) {
            return Err(Error::UnresolvedSubject(user.to_string()));
        }

        let cache_key = format!("allowed_actions_{user_id}");

        if self.config.enable_caching {
            match self.cache.read(&cache_key, PERMISSIONS_NAMESPACE) {
                Ok(Some(value)) => match serde_json::from_value::<BTreeSet<ActionPath>>(value) {
                    Ok(actions) => {
                        self.metrics.record_cache_hit();
                        return Ok(actions);
                    }
                    Err(e) => {
                        warn!("Discarding undecodable permissions cache entry for user {user_id}: {e}");
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    warn!("Permissions cache read failed for user {user_id}: {e}");
                }
            }
            self.metrics.record_cache_miss();
        }

        let chain = self.graph.inheritance_chain(&user)?;
        let mut memo = HashMap::new();
        let mut allowed = BTreeSet::new();

        for action in self.graph.actions() {
            if self.resolve_decision(&chain, &action, &mut memo)? == Some(Decision::Allow) {
                allowed.insert(action);
            }
        }

        if self.config.enable_caching {
            match serde_json::to_value(&allowed) {
                Ok(value) => {
                    if let Err(e) = self.cache.write(&cache_key, value, PERMISSIONS_NAMESPACE) {
                        warn!("Permissions cache write failed for user {user_id}: {e}");
                    }
                }
                Err(e) => {
                    warn!("Failed to serialize permissions for user {user_id}: {e}");
                }
            }
        }

        Ok(allowed)
    }

    /// Resolve a single action for a user. Uncached.
    pub fn is_allowed(&self, user_id: i64, action: &str) -> Result<bool> {
        let action = ActionPath::parse(action)?;
        let chain = self.graph.inheritance_chain(&SubjectRef::user(user_id))?;
        let mut memo = HashMap::new();
        Ok(self.resolve_decision(&chain, &action, &mut memo)? == Some(Decision::Allow))
    }

    /// The store's metrics.
    pub fn metrics(&self) -> &AclMetrics {
        &self.metrics
    }

    /// The cache backend.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// The storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The subject/action graph.
    pub fn graph(&self) -> &AccessGraph {
        &self.graph
    }

    // Internal implementation

    fn set_permission(
        &mut self,
        subject: &SubjectRef,
        action: &str,
        decision: Decision,
    ) -> Result<()> {
        let action = ActionPath::parse(action)?;

        if !self.graph.has_subject(subject) {
            return Err(Error::UnresolvedSubject(subject.to_string()));
        }

        self.graph.register_action(&action);
        self.storage
            .upsert_edge(PermissionEdge::new(subject.clone(), action.clone(), decision))?;
        self.metrics.record_permission_write();

        self.clear_permission_cache();

        #[cfg(feature = "audit")]
        if self.config.enable_audit {
            info!("Permission '{decision}' set for subject '{subject}' on '{action}'");
        }

        Ok(())
    }

    // Clears the whole namespace; the set of keys a single edge write can
    // affect under inheritance is never computed.
    fn clear_permission_cache(&self) {
        if !self.config.enable_caching {
            return;
        }

        match self.cache.clear_namespace(PERMISSIONS_NAMESPACE) {
            Ok(_) => self.metrics.record_cache_clear(),
            Err(e) => warn!("Failed to clear permissions cache namespace: {e}"),
        }
    }

    /// Nearest explicit decision for `action` along the inheritance chain.
    ///
    /// Edge lookups are memoized per `(subject, action node)` so sibling
    /// actions sharing ancestors do not repeat storage queries.
    fn resolve_decision(
        &self,
        chain: &[SubjectRef],
        action: &ActionPath,
        memo: &mut HashMap<(SubjectRef, ActionPath), Option<Decision>>,
    ) -> Result<Option<Decision>> {
        for subject in chain {
            for node in action.self_and_ancestors() {
                let key = (subject.clone(), node.clone());
                let decision = match memo.get(&key) {
                    Some(cached) => *cached,
                    None => {
                        let found = self
                            .storage
                            .get_edge(subject, &node)?
                            .map(|edge| edge.decision())
                            .filter(Decision::is_explicit);
                        memo.insert(key, found);
                        found
                    }
                };

                if decision.is_some() {
                    return Ok(decision);
                }
            }
        }

        Ok(None)
    }
}
