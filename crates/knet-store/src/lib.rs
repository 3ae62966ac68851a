//! # knet Store
//!
//! Local state for the knet tool adapter: the address resolution cache and
//! the session state record.
//!
//! ## Key Types
//!
//! - [`AddressCache`] - Bounded LRU map from entity UUID to [`knet_core::Address`]
//! - [`SessionState`] - Recent entities and the expiring tag-name cache
//! - [`StateStore`] - Load/save interface for session state
//! - [`JsonFileStore`] / [`MemoryStateStore`] - Implementations
//!
//! ## Design Notes
//!
//! - **Cache wins**: a cached address reflects what the gateway reported and
//!   beats any address synthesized from configuration.
//! - **No network**: cache misses synthesize a best-effort address; nothing
//!   in this crate performs I/O other than reading and writing state files.

pub mod cache;
pub mod error;
pub mod session;
pub mod traits;

pub use cache::{AddressCache, DEFAULT_CAPACITY};
pub use error::{Result, StoreError};
pub use session::{preview, RecentEntity, SessionState, TagNameEntry, DEFAULT_TAG_TTL_SECS};
pub use traits::{JsonFileStore, MemoryStateStore, StateStore};
