// crates/inksync-notify/src/email.rs
// ============================================================================
// Module: Email Notifier
// Description: HTTP email provider client for terminal-transition notices.
// Purpose: Render and deliver signed/cancelled emails with bounded requests.
// Dependencies: inksync-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! The email notifier posts a single JSON message per terminal transition to
//! a provider endpoint, authenticated with a bearer key. Requests carry a
//! hard timeout and never follow redirects. Rendering is deterministic: the
//! same event always produces the same subject and bodies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use inksync_core::CanonicalStatus;
use inksync_core::NotificationEvent;
use inksync_core::Notifier;
use inksync_core::NotifyError;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Serialize;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the email notifier.
///
/// # Invariants
/// - `timeout_ms` applies to the full request lifecycle.
/// - `api_key` is held in memory only and never logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailNotifierConfig {
    /// Email provider endpoint URL.
    pub api_url: String,
    /// Bearer API key for the email provider.
    pub api_key: String,
    /// Sender address placed on outbound messages.
    pub from_address: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Message payload posted to the email provider.
#[derive(Debug, Serialize)]
struct EmailMessage {
    /// Sender address.
    from: String,
    /// Recipient address.
    to: String,
    /// Message subject line.
    subject: String,
    /// HTML body.
    html: String,
    /// Plain-text body.
    text: String,
}

// ============================================================================
// SECTION: Notifier Implementation
// ============================================================================

/// Notifier backed by an HTTP email provider.
///
/// # Invariants
/// - Redirects are not followed.
/// - A non-2xx provider response is a delivery failure.
pub struct EmailNotifier {
    /// Notifier configuration, including endpoint and credentials.
    config: EmailNotifierConfig,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl EmailNotifier {
    /// Creates a new email notifier with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the HTTP client cannot be created.
    pub fn new(config: EmailNotifierConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent("inksync/0.1")
            .redirect(Policy::none())
            .build()
            .map_err(|_| NotifyError::Invalid("email client build failed".to_string()))?;
        Ok(Self {
            config,
            client,
        })
    }
}

impl Notifier for EmailNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let message = render_message(&self.config.from_address, event)?;
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .map_err(|err| NotifyError::Delivery(format!("email request failed: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Delivery(format!(
                "email provider returned status {}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the provider message for a terminal transition.
///
/// # Errors
///
/// Returns [`NotifyError`] when the event carries a non-terminal transition.
fn render_message(
    from_address: &str,
    event: &NotificationEvent,
) -> Result<EmailMessage, NotifyError> {
    let (subject, text) = match event.transition {
        CanonicalStatus::Signed => (signed_subject(event), signed_text(event)),
        CanonicalStatus::Cancelled => (cancelled_subject(event), cancelled_text(event)),
        CanonicalStatus::Sent => {
            return Err(NotifyError::Invalid(
                "no notification is defined for the sent transition".to_string(),
            ));
        }
    };
    Ok(EmailMessage {
        from: from_address.to_string(),
        to: event.client_email.clone(),
        subject,
        html: render_html(&text),
        text,
    })
}

/// Subject line for a signed contract.
fn signed_subject(event: &NotificationEvent) -> String {
    format!("Contract {} has been signed", event.contract_number)
}

/// Plain-text body for a signed contract.
fn signed_text(event: &NotificationEvent) -> String {
    let mut body = format!("Hello {},\n\n", event.client_name);
    match &event.signer_name {
        Some(signer) => {
            body.push_str(&format!(
                "{} has signed rental contract {}.\n",
                signer, event.contract_number
            ));
        }
        None => {
            body.push_str(&format!(
                "Rental contract {} has been signed.\n",
                event.contract_number
            ));
        }
    }
    if let Some(url) = &event.document_url {
        body.push_str(&format!("\nThe signed document is available at: {url}\n"));
    }
    body.push_str("\nYour rental is confirmed. Ride safe!\n");
    body
}

/// Subject line for a cancelled contract.
fn cancelled_subject(event: &NotificationEvent) -> String {
    format!("Contract {} was cancelled", event.contract_number)
}

/// Plain-text body for a cancelled contract.
fn cancelled_text(event: &NotificationEvent) -> String {
    format!(
        "Hello {},\n\nRental contract {} was cancelled before signing was \
         completed. If this is unexpected, please contact your rental agent.\n",
        event.client_name, event.contract_number
    )
}

/// Wraps a plain-text body in a minimal HTML shell.
fn render_html(text: &str) -> String {
    let mut html = String::from("<html><body>");
    for line in text.lines() {
        if line.is_empty() {
            html.push_str("<br>");
        } else {
            html.push_str("<p>");
            html.push_str(&escape_html(line));
            html.push_str("</p>");
        }
    }
    html.push_str("</body></html>");
    html
}

/// Escapes HTML metacharacters in user-derived text.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

// ============================================================================
// SECTION: Tests
// ============================================================================
