// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the catalog core

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Store(err.to_string())
    }
}

#[cfg(feature = "sled-backend")]
impl From<sled::Error> for CatalogError {
    fn from(err: sled::Error) -> Self {
        CatalogError::Store(err.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
