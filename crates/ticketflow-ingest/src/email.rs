// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider-agnostic parsed email shape. Provider-specific webhook parsing
//! (SendGrid/Mailgun/Postmark/generic payload formats) lives in
//! `ticketflow-api`, which owns the HTTP framing; this crate only accepts the
//! already-normalized result.

#[derive(Debug, Clone, Default)]
pub struct ParsedEmail {
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
    pub from_email: String,
    pub from_name: Option<String>,
    pub to_email: Option<String>,
    pub subject: String,
    pub body: Option<String>,
    pub html: Option<String>,
    pub attachments: Vec<EmailAttachment>,
}

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
}

/// The sender's address, lowercased, stands in for a CRM lookup.
pub fn extract_customer_id(from_email: &str) -> String {
    from_email.to_lowercase().trim().to_string()
}
