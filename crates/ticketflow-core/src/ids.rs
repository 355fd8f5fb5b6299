// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed identifier wrappers.
//!
//! Unlike a random-suffix id scheme, ticket identity must be a deterministic
//! 128-bit value derived from request content, so these wrappers are thin
//! newtypes over [`uuid::Uuid`] rather than random strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Define a newtype ID wrapper around [`Uuid`].
macro_rules! define_uuid_id {
    ($(#[$meta:meta])* pub struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_uuid_id! {
    /// Identity of a ticket. Derived deterministically from request content
    /// (see `ticketflow_ingest::identity`), never randomly generated for a
    /// ticket created through the normal ingest path.
    pub struct TicketId;
}

define_uuid_id! {
    /// Identity of an append-only ticket event row.
    pub struct EventId;
}

define_uuid_id! {
    /// Identity of an approval request row.
    pub struct ApprovalId;
}

/// Identity of a worker process/consumer-slot. Operator-assigned (the
/// `worker_id` config key), not generated, so it is a plain string newtype
/// rather than a UUID wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WorkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
