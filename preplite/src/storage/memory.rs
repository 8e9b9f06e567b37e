// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory entity store for testing

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use super::{apply_query, Document, EntityStore, ListQuery, Patch, WriteOp};
use crate::error::{CatalogError, CatalogResult};

/// In-memory entity store
///
/// Collections are BTreeMaps keyed by document id, so unordered listings
/// still come back in a deterministic order.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn document_id(collection: &str, document: &mut Document) -> String {
    match document.get("id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            document.insert("id".to_string(), Value::String(id.clone()));
            log::debug!("generated id {} for insert into {}", id, collection);
            id
        }
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> CatalogResult<Option<Document>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn list(&self, collection: &str, query: &ListQuery) -> CatalogResult<Vec<Document>> {
        query.validate()?;

        let collections = self.collections.read();
        let documents = collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();

        Ok(apply_query(documents, query))
    }

    fn insert(&self, collection: &str, mut document: Document) -> CatalogResult<String> {
        let id = document_id(collection, &mut document);

        let mut collections = self.collections.write();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), document);

        Ok(id)
    }

    fn update(&self, collection: &str, id: &str, patch: &Patch) -> CatalogResult<()> {
        let mut collections = self.collections.write();
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| CatalogError::NotFound(format!("{}/{}", collection, id)))?;

        patch.apply_to(document);
        Ok(())
    }

    fn remove(&self, collection: &str, id: &str) -> CatalogResult<()> {
        let mut collections = self.collections.write();
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    fn batch_write(&self, ops: Vec<WriteOp>) -> CatalogResult<()> {
        let mut collections = self.collections.write();

        // Check phase: every update target must exist before anything is
        // applied, so a failing batch leaves the store untouched.
        for op in &ops {
            if let WriteOp::Update { collection, id, .. } = op {
                let exists = collections
                    .get(collection)
                    .map(|docs| docs.contains_key(id))
                    .unwrap_or(false);
                if !exists {
                    return Err(CatalogError::NotFound(format!("{}/{}", collection, id)));
                }
            }
        }

        for op in ops {
            match op {
                WriteOp::Insert {
                    collection,
                    id,
                    mut document,
                } => {
                    document.insert("id".to_string(), Value::String(id.clone()));
                    collections
                        .entry(collection)
                        .or_default()
                        .insert(id, document);
                }
                WriteOp::Update {
                    collection,
                    id,
                    patch,
                } => {
                    if let Some(document) = collections
                        .get_mut(&collection)
                        .and_then(|docs| docs.get_mut(&id))
                    {
                        patch.apply_to(document);
                    }
                }
            }
        }

        Ok(())
    }
}
