//! Storage abstractions for persisting permission edges.

use crate::{
    action::ActionPath,
    error::Result,
    permission::PermissionEdge,
    subject::SubjectRef,
};
use dashmap::DashMap;
use std::sync::Arc;

/// Trait for storing and retrieving permission edges.
///
/// Edges are keyed by `(subject, action)`; writing an edge for an existing
/// key replaces it, preserving the one-edge-per-pair invariant.
pub trait EdgeStorage: Send + Sync {
    /// Insert or replace an edge.
    fn upsert_edge(&mut self, edge: PermissionEdge) -> Result<()>;

    /// Get the edge for a `(subject, action)` pair.
    fn get_edge(&self, subject: &SubjectRef, action: &ActionPath) -> Result<Option<PermissionEdge>>;

    /// All edges attached to a subject.
    fn edges_for_subject(&self, subject: &SubjectRef) -> Result<Vec<PermissionEdge>>;

    /// All stored edges.
    fn list_edges(&self) -> Result<Vec<PermissionEdge>>;

    /// Delete an edge, returning whether one existed.
    fn delete_edge(&mut self, subject: &SubjectRef, action: &ActionPath) -> Result<bool>;
}

/// In-memory storage implementation using DashMap for thread safety.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    edges: Arc<DashMap<(SubjectRef, ActionPath), PermissionEdge>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance.
    pub fn new() -> Self {
        Self {
            edges: Arc::new(DashMap::new()),
        }
    }

    /// Get the number of stored edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Clear all stored data.
    pub fn clear(&mut self) {
        self.edges.clear();
    }
}

impl EdgeStorage for MemoryStorage {
    fn upsert_edge(&mut self, edge: PermissionEdge) -> Result<()> {
        self.edges.insert(edge.key(), edge);
        Ok(())
    }

    fn get_edge(&self, subject: &SubjectRef, action: &ActionPath) -> Result<Option<PermissionEdge>> {
        Ok(self
            .edges
            .get(&(subject.clone(), action.clone()))
            .map(|e| e.clone()))
    }

    fn edges_for_subject(&self, subject: &SubjectRef) -> Result<Vec<PermissionEdge>> {
        Ok(self
            .edges
            .iter()
            .filter(|entry| entry.key().0 == *subject)
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn list_edges(&self) -> Result<Vec<PermissionEdge>> {
        Ok(self.edges.iter().map(|entry| entry.value().clone()).collect())
    }

    fn delete_edge(&mut self, subject: &SubjectRef, action: &ActionPath) -> Result<bool> {
        Ok(self
            .edges
            .remove(&(subject.clone(), action.clone()))
            .is_some())
    }
}

/// File-based storage implementation (requires persistence feature).
#[cfg(feature = "persistence")]
pub mod file_storage {
    use super::*;
    use crate::error::Error;
    use std::{
        collections::HashMap,
        fs::{File, OpenOptions},
        io::{BufReader, BufWriter},
        path::{Path, PathBuf},
        sync::RwLock,
    };

    /// File-based storage that persists edges to a JSON file.
    #[derive(Debug)]
    pub struct FileStorage {
        storage_path: PathBuf,
        edges: Arc<RwLock<HashMap<(SubjectRef, ActionPath), PermissionEdge>>>,
    }

    impl FileStorage {
        /// Create a new file storage instance.
        pub fn new(storage_path: impl AsRef<Path>) -> Result<Self> {
            let storage_path = storage_path.as_ref().to_path_buf();

            if let Some(parent) = storage_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Storage(format!("Failed to create storage directory: {e}"))
                })?;
            }

            let mut storage = Self {
                storage_path,
                edges: Arc::new(RwLock::new(HashMap::new())),
            };

            storage.load_from_disk()?;

            Ok(storage)
        }

        fn load_from_disk(&mut self) -> Result<()> {
            if !self.storage_path.exists() {
                return Ok(());
            }

            let file = File::open(&self.storage_path)
                .map_err(|e| Error::Storage(format!("Failed to open storage file: {e}")))?;

            let reader = BufReader::new(file);
            // Tuple keys do not map onto JSON objects, so the file holds a
            // flat edge list.
            let edges: Vec<PermissionEdge> = serde_json::from_reader(reader)?;

            let mut map = self
                .edges
                .write()
                .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?;
            *map = edges.into_iter().map(|e| (e.key(), e)).collect();
            Ok(())
        }

        fn save_to_disk(&self) -> Result<()> {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.storage_path)
                .map_err(|e| Error::Storage(format!("Failed to create storage file: {e}")))?;

            let writer = BufWriter::new(file);
            let edges = self
                .edges
                .read()
                .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?;
            let mut list: Vec<&PermissionEdge> = edges.values().collect();
            list.sort_by_key(|e| e.key());
            serde_json::to_writer_pretty(writer, &list)?;
            Ok(())
        }

        /// Get the storage file path.
        pub fn storage_path(&self) -> &Path {
            &self.storage_path
        }

        /// Get the number of stored edges.
        pub fn edge_count(&self) -> usize {
            self.edges.read().map(|m| m.len()).unwrap_or(0)
        }
    }

    impl EdgeStorage for FileStorage {
        fn upsert_edge(&mut self, edge: PermissionEdge) -> Result<()> {
            {
                let mut map = self
                    .edges
                    .write()
                    .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?;
                map.insert(edge.key(), edge);
            }
            self.save_to_disk()
        }

        fn get_edge(
            &self,
            subject: &SubjectRef,
            action: &ActionPath,
        ) -> Result<Option<PermissionEdge>> {
            let map = self
                .edges
                .read()
                .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?;
            Ok(map.get(&(subject.clone(), action.clone())).cloned())
        }

        fn edges_for_subject(&self, subject: &SubjectRef) -> Result<Vec<PermissionEdge>> {
            let map = self
                .edges
                .read()
                .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?;
            Ok(map
                .values()
                .filter(|e| e.subject() == subject)
                .cloned()
                .collect())
        }

        fn list_edges(&self) -> Result<Vec<PermissionEdge>> {
            let map = self
                .edges
                .read()
                .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?;
            Ok(map.values().cloned().collect())
        }

        fn delete_edge(&mut self, subject: &SubjectRef, action: &ActionPath) -> Result<bool> {
            let removed = {
                let mut map = self
                    .edges
                    .write()
                    .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?;
                map.remove(&(subject.clone(), action.clone())).is_some()
            };
            if removed {
                self.save_to_disk()?;
            }
            Ok(removed)
        }
    }
}

#[cfg(feature = "persistence")]
pub use file_storage::FileStorage;
