// crates/inksync-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Assembly Tests
// Description: Unit tests for store, notifier, and audit sink assembly.
// Purpose: Validate configuration wiring without starting a server.
// Dependencies: inksync-config, tempfile
// ============================================================================

//! ## Overview
//! Exercises the assembly helpers that turn validated configuration into
//! running components: store backend selection, notifier selection, and
//! audit sink selection, including the required-field failures.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use inksync_config::AuditConfig;
use inksync_config::AuditSinkKind;
use inksync_config::EmailConfig;
use inksync_config::StoreBackend;
use inksync_config::StoreConfig;
use tempfile::TempDir;

use super::build_audit_sink;
use super::build_notifier;
use super::build_store;

#[test]
fn memory_store_assembles_without_a_path() {
    let config = StoreConfig::default();
    assert!(build_store(&config).is_ok());
}

#[test]
fn sqlite_store_requires_a_path() {
    let config = StoreConfig {
        backend: StoreBackend::Sqlite,
        ..StoreConfig::default()
    };
    let err = build_store(&config).err().expect("missing path rejected");
    assert!(err.to_string().contains("INKSYNC_STORE_PATH"));
}

#[test]
fn sqlite_store_assembles_with_a_path() {
    let dir = TempDir::new().expect("tempdir");
    let config = StoreConfig {
        backend: StoreBackend::Sqlite,
        path: Some(dir.path().join("inksync.db")),
        ..StoreConfig::default()
    };
    assert!(build_store(&config).is_ok());
}

#[test]
fn disabled_email_uses_the_noop_notifier() {
    let config = EmailConfig::default();
    assert!(!config.enabled);
    assert!(build_notifier(&config).is_ok());
}

#[test]
fn enabled_email_requires_provider_settings() {
    let config = EmailConfig {
        enabled: true,
        ..EmailConfig::default()
    };
    let err = build_notifier(&config).err().expect("missing url rejected");
    assert!(err.to_string().contains("INKSYNC_EMAIL_API_URL"));
}

#[test]
fn file_audit_sink_requires_a_path() {
    let config = AuditConfig {
        sink: AuditSinkKind::File,
        path: None,
    };
    let err = build_audit_sink(&config).err().expect("missing path rejected");
    assert!(err.to_string().contains("INKSYNC_AUDIT_PATH"));
}

#[test]
fn file_audit_sink_assembles_with_a_path() {
    let dir = TempDir::new().expect("tempdir");
    let config = AuditConfig {
        sink: AuditSinkKind::File,
        path: Some(dir.path().join("audit.log")),
    };
    assert!(build_audit_sink(&config).is_ok());
}
