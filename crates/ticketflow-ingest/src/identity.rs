// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic ticket identity.
//!
//! Both namespace UUIDs are fixed constants, not configuration: changing
//! either would silently change the identity of every future ticket on that
//! channel and break idempotency against anything already ingested.

use sha2::{Digest, Sha256};
use ticketflow_core::TicketId;
use uuid::Uuid;

/// Namespace for HTTP-originated tickets.
const TICKET_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0xa7, 0xb8, 0x10, 0x9d, 0xad, 0x11, 0xd1, 0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4, 0x30, 0xc8,
]);

/// Namespace for email-originated tickets.
const EMAIL_TICKET_NAMESPACE: Uuid = Uuid::from_bytes([
    0x7b, 0xa8, 0xc9, 0x20, 0x0e, 0xad, 0x22, 0xe2, 0x91, 0xc5, 0x10, 0xd0, 0x5f, 0xe5, 0x41, 0xd9,
]);

fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)
}



/// `uuid5(TICKET_NAMESPACE, sha256("{customer_id}:{subject}:{body}"))`.
pub fn ticket_id(customer_id: &str, subject: &str, body: &str) -> TicketId {
    let content = format!("{customer_id}:{subject}:{body}");
    let hash = content_hash(&content);
    TicketId::from_uuid(Uuid::new_v5(&TICKET_NAMESPACE, hash.as_bytes()))
}

/// `uuid5(EMAIL_TICKET_NAMESPACE, sha256("{message_id}:{from_email}:{subject}"))`.
pub fn email_ticket_id(message_id: &str, from_email: &str, subject: &str) -> TicketId {
    let content = format!("{message_id}:{from_email}:{subject}");
    let hash = content_hash(&content);
    TicketId::from_uuid(Uuid::new_v5(&EMAIL_TICKET_NAMESPACE, hash.as_bytes()))
}
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_id_is_deterministic() {
        let a = ticket_id("cust_1", "subject", "body");
        let b = ticket_id("cust_1", "subject", "body");
        assert_eq!(a, b);
    }

    #[test]
    fn ticket_id_differs_on_content() {
        let a = ticket_id("cust_1", "subject", "body");
        let b = ticket_id("cust_1", "subject", "different body");
        assert_ne!(a, b);
    }

    #[test]
    fn email_ticket_id_is_deterministic() {
        let a = email_ticket_id("<abc@mail>", "cust@example.com", "subject");
        let b = email_ticket_id("<abc@mail>", "cust@example.com", "subject");
        assert_eq!(a, b);
    }

    #[test]
    fn http_and_email_namespaces_differ() {
        let http = ticket_id("x", "y", "z");
        let email = email_ticket_id("x", "y", "z");
        assert_ne!(http, email);
    }
}
