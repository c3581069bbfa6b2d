//! Testing utilities for pidmint-core.
//!
//! Provides in-memory mocks so the state machine and orchestrator can be
//! exercised without a reachable naming authority.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pidmint_core::testing::MockTransport;
//!
//! let transport = MockTransport::new();
//! let client = RegistryClient::new(transport, &config);
//! // ... drive the provider, then inspect transport state:
//! assert_eq!(client.transport().call_count("create"), 1);
//! ```

pub mod mocks;

pub use mocks::*;
