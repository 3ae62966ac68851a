//! # knet Testkit
//!
//! Testing utilities for knet.
//!
//! ## Overview
//!
//! - **Golden vectors**: frozen canonical payloads for every entity kind
//! - **Generators**: proptest strategies for addresses, keys and JSON
//! - **Fixtures**: deterministic agents that sign entities for seeding
//!   a gateway
//!
//! ## Golden Vectors
//!
//! ```rust
//! use knet_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! for vector in all_vectors() {
//!     println!("{}: {}", vector.name, vector.actual);
//! }
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use knet_testkit::generators::address;
//!
//! proptest! {
//!     #[test]
//!     fn address_roundtrip(addr in address()) {
//!         prop_assert_eq!(addr.to_string().parse::<knet_core::Address>().unwrap(), addr);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use knet_testkit::fixtures::TestAgent;
//!
//! let agent = TestAgent::with_seed([1; 32]);
//! let transform = agent.transform("extract");
//! let fragment = agent.fragment("Ice floats on water", transform.id, 0.8);
//! assert!(knet_core::verify_fragment(&fragment, &agent.keypair.public_key()));
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{fixed_time, multi_agent_fixtures, TestAgent};
pub use generators::{address, json_value, keypair};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
