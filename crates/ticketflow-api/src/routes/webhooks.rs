// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider-specific inbound email webhook framing. Each provider posts a
//! differently-shaped JSON payload; this module normalizes all of them into
//! a single `ParsedEmail` before handing off to `ticketflow-ingest`, which
//! stays provider-agnostic.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde_json::Value;
use ticketflow_ingest::{ingest_email, EmailAttachment, ParsedEmail};

use crate::dto::TicketCreatedResponse;
use crate::error::ApiError;
use crate::state::AppState;

fn str_field<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| payload.get(k)).and_then(Value::as_str)
}

fn parse_address(raw: &str) -> (String, Option<String>) {
    if let Some(start) = raw.rfind('<') {
        if let Some(end) = raw.rfind('>') {
            if end > start {
                let email = raw[start + 1..end].trim().to_string();
                let name = raw[..start].trim().trim_matches('"').to_string();
                return (email, if name.is_empty() { None } else { Some(name) });
            }
        }
    }
    (raw.trim().to_string(), None)
}

/// Normalize a provider's webhook body into the shape `ticketflow-ingest`
/// expects. `provider` is the path segment (`sendgrid`, `mailgun`,
/// `postmark`, or anything else treated as a generic JSON shape).
fn normalize(provider: &str, payload: &Value) -> ParsedEmail {
    let from_raw = match provider {
        "mailgun" | "postmark" => str_field(payload, &["From", "from"]),
        _ => str_field(payload, &["from", "From"]),
    }
    .unwrap_or("");
    let (from_email, from_name) = parse_address(from_raw);

    let to_raw = str_field(payload, &["to", "To"]).map(|s| s.to_string());
    let subject = str_field(payload, &["subject", "Subject"]).unwrap_or("").to_string();
    let body = str_field(payload, &["text", "body-plain", "TextBody", "body"]).map(str::to_string);
    let html = str_field(payload, &["html", "body-html", "HtmlBody"]).map(str::to_string);
    let message_id = str_field(payload, &["message_id", "Message-Id", "MessageID", "message-id"])
        .map(str::to_string);
    let in_reply_to = str_field(payload, &["in_reply_to", "In-Reply-To", "InReplyTo", "in-reply-to"])
        .map(str::to_string);

    let attachments = payload
        .get("attachments")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|a| {
                    Some(EmailAttachment {
                        filename: a.get("filename")?.as_str()?.to_string(),
                        content_type: a
                            .get("content_type")
                            .or_else(|| a.get("ContentType"))
                            .and_then(Value::as_str)
                            .unwrap_or("application/octet-stream")
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    ParsedEmail {
        message_id,
        in_reply_to,
        from_email,
        from_name,
        to_email: to_raw,
        subject,
        body,
        html,
        attachments,
    }
}

pub async fn email_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<TicketCreatedResponse>), ApiError> {
    let parsed = normalize(&provider, &payload);
    if parsed.from_email.is_empty() {
        return Err(ApiError::BadRequest("missing sender address".into()));
    }
    let outcome = ingest_email(state.store.as_ref(), state.broker.as_ref(), parsed, Utc::now()).await?;
    let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(TicketCreatedResponse {
            ticket_id: outcome.ticket_id,
            status: outcome.status,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_payload_extracts_core_fields() {
        let payload = serde_json::json!({
            "from": "Jane Doe <jane@example.com>",
            "subject": "Help",
            "text": "my order never arrived",
            "message_id": "<abc@mail>",
        });
        let parsed = normalize("generic", &payload);
        assert_eq!(parsed.from_email, "jane@example.com");
        assert_eq!(parsed.from_name.as_deref(), Some("Jane Doe"));
        assert_eq!(parsed.subject, "Help");
        assert_eq!(parsed.message_id.as_deref(), Some("<abc@mail>"));
    }

    #[test]
    fn postmark_payload_uses_capitalized_keys() {
        let payload = serde_json::json!({
            "From": "jane@example.com",
            "Subject": "Help",
            "TextBody": "body text",
            "MessageID": "<xyz@mail>",
        });
        let parsed = normalize("postmark", &payload);
        assert_eq!(parsed.from_email, "jane@example.com");
        assert_eq!(parsed.body.as_deref(), Some("body text"));
        assert_eq!(parsed.message_id.as_deref(), Some("<xyz@mail>"));
    }
}
