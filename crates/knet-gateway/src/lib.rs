//! # knet Gateway
//!
//! Client side of the knowledge network gateway.
//!
//! ## Overview
//!
//! The gateway stores signed entities and answers queries. This crate
//! defines the [`Gateway`] trait the tool layer talks to, plus two
//! implementations:
//!
//! - [`HttpGateway`] - JSON over HTTP with bearer auth and a request timeout
//! - [`MemoryGateway`] - In-process hub for tests and offline use
//!
//! ## Key Properties
//!
//! - **Signed in, derived out**: entities are submitted signed; responses
//!   carry gateway-derived fields (`address`, `trust_summary`, `state`)
//! - **No retries**: failures surface once, with the gateway's message
//! - **Pressure passthrough**: the last `X-Resource-Pressure` signal is
//!   available through [`Gateway::pressure`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use knet_gateway::{Gateway, HttpConfig, HttpGateway, SearchQuery};
//!
//! async fn example() -> knet_gateway::Result<()> {
//!     let gateway = HttpGateway::new(HttpConfig::new("https://hub.example:8443"))?;
//!     let page = gateway.search_fragments(&SearchQuery::text("entropy", 10)).await?;
//!     println!("{} fragments", page.items.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod types;

pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use http::{HttpConfig, HttpGateway, DEFAULT_TIMEOUT};
pub use memory::MemoryGateway;
pub use types::{
    collect_pages, Direction, Health, Page, PageRequest, PressureLevel, RelationQuery,
    ResourcePressure, SearchQuery, TagQuery, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
};
