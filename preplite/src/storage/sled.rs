// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled entity store implementation
//!
//! One sled tree per collection, documents stored as JSON bytes keyed by
//! document id. Batched writes are grouped into one `sled::Batch` per
//! collection and applied atomically per tree.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::{apply_query, Document, EntityStore, ListQuery, Patch, WriteOp};
use crate::error::{CatalogError, CatalogResult};

/// Sled-backed entity store for embedded deployments
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open or create a store at the given path
    ///
    /// An unopenable database is a configuration failure: the store fails
    /// closed instead of degrading to empty results.
    pub fn open<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let db = sled::open(&path).map_err(|e| {
            CatalogError::Configuration(format!(
                "cannot open catalog database at {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(Self { db })
    }

    fn tree(&self, collection: &str) -> CatalogResult<sled::Tree> {
        Ok(self.db.open_tree(collection.as_bytes())?)
    }
}

fn decode(collection: &str, id: &[u8], bytes: &[u8]) -> CatalogResult<Document> {
    serde_json::from_slice(bytes).map_err(|e| {
        CatalogError::Serialization(format!(
            "corrupt document {}/{}: {}",
            collection,
            String::from_utf8_lossy(id),
            e
        ))
    })
}

impl EntityStore for SledStore {
    fn get(&self, collection: &str, id: &str) -> CatalogResult<Option<Document>> {
        let tree = self.tree(collection)?;
        match tree.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(collection, id.as_bytes(), &bytes)?)),
            None => Ok(None),
        }
    }

    fn list(&self, collection: &str, query: &ListQuery) -> CatalogResult<Vec<Document>> {
        query.validate()?;

        let tree = self.tree(collection)?;
        let mut documents = Vec::new();
        for entry in tree.iter() {
            let (key, bytes) = entry?;
            documents.push(decode(collection, &key, &bytes)?);
        }

        Ok(apply_query(documents, query))
    }

    fn insert(&self, collection: &str, mut document: Document) -> CatalogResult<String> {
        let id = match document.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                document.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };

        let tree = self.tree(collection)?;
        let bytes = serde_json::to_vec(&Value::Object(document))?;
        tree.insert(id.as_bytes(), bytes)?;

        Ok(id)
    }

    fn update(&self, collection: &str, id: &str, patch: &Patch) -> CatalogResult<()> {
        let tree = self.tree(collection)?;
        let bytes = tree
            .get(id.as_bytes())?
            .ok_or_else(|| CatalogError::NotFound(format!("{}/{}", collection, id)))?;

        let mut document = decode(collection, id.as_bytes(), &bytes)?;
        patch.apply_to(&mut document);

        tree.insert(id.as_bytes(), serde_json::to_vec(&Value::Object(document))?)?;
        Ok(())
    }

    fn remove(&self, collection: &str, id: &str) -> CatalogResult<()> {
        let tree = self.tree(collection)?;
        tree.remove(id.as_bytes())?;
        Ok(())
    }

    fn batch_write(&self, ops: Vec<WriteOp>) -> CatalogResult<()> {
        // Stage one batch per collection; updates read-modify-write the
        // current document so the batch carries complete replacements.
        let mut batches: HashMap<String, sled::Batch> = HashMap::new();

        for op in ops {
            match op {
                WriteOp::Insert {
                    collection,
                    id,
                    mut document,
                } => {
                    document.insert("id".to_string(), Value::String(id.clone()));
                    let bytes = serde_json::to_vec(&Value::Object(document))?;
                    batches
                        .entry(collection)
                        .or_insert_with(sled::Batch::default)
                        .insert(id.as_bytes(), bytes);
                }
                WriteOp::Update {
                    collection,
                    id,
                    patch,
                } => {
                    let tree = self.tree(&collection)?;
                    let bytes = tree.get(id.as_bytes())?.ok_or_else(|| {
                        CatalogError::NotFound(format!("{}/{}", collection, id))
                    })?;

                    let mut document = decode(&collection, id.as_bytes(), &bytes)?;
                    patch.apply_to(&mut document);

                    let bytes = serde_json::to_vec(&Value::Object(document))?;
                    batches
                        .entry(collection)
                        .or_insert_with(sled::Batch::default)
                        .insert(id.as_bytes(), bytes);
                }
            }
        }

        for (collection, batch) in batches {
            let tree = self.tree(&collection)?;
            tree.apply_batch(batch)?;
        }
        self.db.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn open_temp() -> (SledStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = SledStore::open(dir.path().join("db")).expect("Failed to open sled store");
        (store, dir)
    }

    #[test]
    fn test_insert_get_roundtrip() {
        let (store, _dir) = open_temp();
        let id = store
            .insert("companies", doc(&[("name", json!("Acme"))]))
            .unwrap();
        let fetched = store.get("companies", &id).unwrap().unwrap();
        assert_eq!(fetched["name"], json!("Acme"));
    }

    #[test]
    fn test_update_patches_document() {
        let (store, _dir) = open_temp();
        let id = store
            .insert(
                "companies",
                doc(&[("name", json!("Acme")), ("logo_url", json!("x"))]),
            )
            .unwrap();

        let mut patch = Patch::new();
        patch.set("name", json!("Acme Labs"));
        patch.delete("logo_url");
        store.update("companies", &id, &patch).unwrap();

        let fetched = store.get("companies", &id).unwrap().unwrap();
        assert_eq!(fetched["name"], json!("Acme Labs"));
        assert!(fetched.get("logo_url").is_none());
    }

    #[test]
    fn test_batch_write_applies_per_collection() {
        let (store, _dir) = open_temp();
        let ops = vec![
            WriteOp::Insert {
                collection: "companies".to_string(),
                id: "c1".to_string(),
                document: doc(&[("name", json!("Acme"))]),
            },
            WriteOp::Insert {
                collection: "problems".to_string(),
                id: "p1".to_string(),
                document: doc(&[("title", json!("Two Sum"))]),
            },
        ];
        store.batch_write(ops).unwrap();

        assert!(store.get("companies", "c1").unwrap().is_some());
        assert!(store.get("problems", "p1").unwrap().is_some());
    }
}
