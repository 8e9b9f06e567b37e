// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Entity store adapter
//!
//! This module provides:
//! - The `EntityStore` contract for reading/writing schemaless documents
//! - Filter/order query descriptors with adapter-boundary validation
//! - Partial-update patches with explicit field deletion
//! - An in-memory driver (tests) and a sled-backed driver (embedded use)

mod memory;
#[cfg(feature = "sled-backend")]
mod sled;

pub use memory::MemoryStore;
#[cfg(feature = "sled-backend")]
pub use self::sled::SledStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::{CatalogError, CatalogResult};

/// The two entity collections
pub const COMPANIES: &str = "companies";
pub const PROBLEMS: &str = "problems";

/// Collection name for one kind of sub-record in a user's namespace
pub fn user_collection(user_id: &str, kind: &str) -> String {
    format!("user:{}:{}", user_id, kind)
}

/// A stored record: a JSON object keyed by field name
pub type Document = serde_json::Map<String, Value>;

/// Comparison operator for a list condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOp {
    Eq,
    Gt,
    Gte,
    Lt,
}

/// One field condition in a list query
#[derive(Debug, Clone)]
pub struct Condition {
    pub field: String,
    pub op: ConditionOp,
    pub value: Value,
}

/// Ascending ordering on one field
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
}

/// Filter/order/limit descriptor for [`EntityStore::list`]
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub conditions: Vec<Condition>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, op: ConditionOp, value: Value) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            op,
            value,
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Adapter-boundary validation shared by all drivers
    ///
    /// A range condition on one field cannot be combined with an ordering on
    /// a different field; such a query has no well-defined index scan.
    pub fn validate(&self) -> CatalogResult<()> {
        if let Some(order) = &self.order_by {
            for condition in &self.conditions {
                if condition.op != ConditionOp::Eq && condition.field != order.field {
                    return Err(CatalogError::Validation(format!(
                        "range filter on '{}' cannot be combined with ordering on '{}'",
                        condition.field, order.field
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One operation in an atomic batch write
#[derive(Debug, Clone)]
pub enum WriteOp {
    Insert {
        collection: String,
        id: String,
        document: Document,
    },
    Update {
        collection: String,
        id: String,
        patch: Patch,
    },
}

/// Partial update: per-field set or explicit delete
///
/// Deleting a field is distinct from setting it to null; cleared optional
/// fields must not linger as stale values.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    ops: std::collections::BTreeMap<String, PatchOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    Set(Value),
    Delete,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.ops.insert(field.into(), PatchOp::Set(value));
    }

    pub fn delete(&mut self, field: impl Into<String>) {
        self.ops.insert(field.into(), PatchOp::Delete);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn apply_to(&self, document: &mut Document) {
        for (field, op) in &self.ops {
            match op {
                PatchOp::Set(value) => {
                    document.insert(field.clone(), value.clone());
                }
                PatchOp::Delete => {
                    document.remove(field);
                }
            }
        }
    }
}

/// Contract for the document store backing the catalog
///
/// Collections are opaque names; drivers create them lazily on first write.
/// `batch_write` is atomic per collection where the backend supports it.
pub trait EntityStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> CatalogResult<Option<Document>>;

    fn list(&self, collection: &str, query: &ListQuery) -> CatalogResult<Vec<Document>>;

    /// Insert a document, generating an id unless the document carries one
    fn insert(&self, collection: &str, document: Document) -> CatalogResult<String>;

    fn update(&self, collection: &str, id: &str, patch: &Patch) -> CatalogResult<()>;

    fn remove(&self, collection: &str, id: &str) -> CatalogResult<()>;

    fn batch_write(&self, ops: Vec<WriteOp>) -> CatalogResult<()>;
}

/// Serialize a typed record into a stored document
pub fn to_document<T: Serialize>(record: &T) -> CatalogResult<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(CatalogError::Serialization(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Deserialize a stored document into a typed record
pub fn from_document<T: DeserializeOwned>(document: Document) -> CatalogResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Total order over JSON values used for conditions and sorting
///
/// Null < booleans < numbers < strings < everything else; within a type the
/// natural order applies. Only strings and numbers occur on indexed fields.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn matches(document: &Document, condition: &Condition) -> bool {
    let field_value = match document.get(&condition.field) {
        Some(value) => value,
        // A missing field satisfies no condition
        None => return false,
    };

    let ordering = compare_values(field_value, &condition.value);
    match condition.op {
        ConditionOp::Eq => ordering == Ordering::Equal,
        ConditionOp::Gt => ordering == Ordering::Greater,
        ConditionOp::Gte => ordering != Ordering::Less,
        ConditionOp::Lt => ordering == Ordering::Less,
    }
}

/// Filter, sort and truncate a materialized document set per a query
///
/// Shared by drivers that scan whole collections rather than index ranges.
/// The sort is stable, so equal keys keep their collection iteration order.
pub(crate) fn apply_query(mut documents: Vec<Document>, query: &ListQuery) -> Vec<Document> {
    documents.retain(|doc| query.conditions.iter().all(|cond| matches(doc, cond)));

    if let Some(order) = &query.order_by {
        documents.sort_by(|a, b| {
            let av = a.get(&order.field).unwrap_or(&Value::Null);
            let bv = b.get(&order.field).unwrap_or(&Value::Null);
            compare_values(av, bv)
        });
    }

    if let Some(limit) = query.limit {
        documents.truncate(limit);
    }

    documents
}
