// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy.
//!
//! Logical conflicts (`AlreadyExists`, `NotFound`, `VersionConflict`) are
//! first-class outcomes the caller is expected to match on, not exceptions.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ticket already exists")]
    AlreadyExists,

    #[error("not found")]
    NotFound,

    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: i64, actual: i64 },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::StorageUnavailable(_))
    }
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    #[error("publish failed: {0}")]
    PublishFailed(String),
}
