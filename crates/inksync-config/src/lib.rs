// crates/inksync-config/src/lib.rs
// ============================================================================
// Module: InkSync Config Library
// Description: Canonical configuration model and validation.
// Purpose: Single source of truth for InkSync environment configuration.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! `inksync-config` defines the canonical configuration model for the
//! InkSync webhook service. Configuration is read from environment variables
//! exactly once at process start into an explicit struct that hosts pass
//! into the transport and notifier; there is no ambient global state and no
//! config file format. Missing or invalid configuration fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
