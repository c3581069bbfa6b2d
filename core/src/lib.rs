//! Pidmint Core - Persistent-identifier registration client and status state machine.
//!
//! Reserves, publishes, and retires globally unique identifiers (DOIs) for
//! datasets against an EZID-style naming-authority registry, keeping the local
//! "registered" flag in sync with the remote registry's `_status`.
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`identifier`] | Global identifier formatting and parsing |
//! | [`anvl`] | ANVL wire codec used by the registry metadata API |
//! | [`record`] | The identifiable record model (`PidRecord`) |
//! | [`config`] | Registry endpoint, credential, and site configuration |
//! | [`client`] | Registry protocol client (login, get, create, update, delete) |
//! | [`provider`] | PID providers and the protocol-keyed provider registry |
//! | [`orchestrator`] | Registration workflow driven during record creation |
//! | [`sequence`] | Collaborator contract for local-identifier generation |
//! | [`testing`] | In-memory mocks for unit and integration tests |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pidmint_core::config::RegistryConfig;
//! use pidmint_core::provider::{EzidDoiProvider, PidProvider};
//! use pidmint_core::record::PidRecord;
//!
//! let config = RegistryConfig::from_env();
//! let provider = EzidDoiProvider::from_config(&config)?;
//!
//! let mut record = PidRecord::new("doi", "10.5072/FK2", "/")
//!     .with_field("title", "Test Dataset");
//! record.assign_identifier("ABCD12");
//!
//! let receipt = provider.create_identifier(&mut record)?;
//! # Ok::<(), pidmint_core::client::RegistryError>(())
//! ```

// ============================================================================
// Identifier & Wire Format
// ============================================================================

/// Global identifier formatting and parsing
pub mod identifier;

/// ANVL codec for the registry metadata API
pub mod anvl;

// ============================================================================
// Data Model & Configuration
// ============================================================================

/// Identifiable record model
pub mod record;

/// Registry endpoint and site configuration
pub mod config;

// ============================================================================
// Registry Protocol
// ============================================================================

/// Registry protocol client and error types
pub mod client;

// ============================================================================
// Registration Logic
// ============================================================================

/// PID providers and protocol-keyed dispatch
pub mod provider;

/// Registration workflow for record creation and import
pub mod orchestrator;

/// Local-identifier generation contract
pub mod sequence;

// ============================================================================
// Test Support
// ============================================================================

/// In-memory mocks for tests
pub mod testing;
