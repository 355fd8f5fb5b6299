// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;
use ticketflow_core::StoreError;

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The approval row was no longer `pending` at decision time (already
    /// decided by a concurrent request).
    #[error("approval already decided")]
    AlreadyDecided,
}
