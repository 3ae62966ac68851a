//! # knet
//!
//! Tool adapter for the knowledge network. Exposes fragments, tags,
//! relations, transforms, trust votes, projects and agents as callable
//! tools for an LLM host, signing everything it creates and running the
//! validity engine locally over data pulled from the gateway.
//!
//! ## Overview
//!
//! - **Config**: layered TOML (global, `KNET_*` environment, project)
//! - **Context**: identity, current project, address cache and session
//!   state shared by every call
//! - **Builders**: validated, unsigned entities from typed requests
//! - **Tools**: `list_tools` / `handle_tool_call` over JSON arguments
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use knet::gateway::{HttpGateway, MemoryGateway};
//! use knet::{ConfigLoader, ToolContext, ToolRouter};
//! use serde_json::json;
//!
//! async fn example() -> knet::Result<()> {
//!     let loaded = ConfigLoader::from_environment().load()?;
//!     let gateway = Arc::new(HttpGateway::new(loaded.config.gateway.http())?);
//!     let router = ToolRouter::new(Arc::new(ToolContext::from_config(loaded, gateway)?));
//!
//!     router.handle_tool_call("register_agent", json!({})).await?;
//!     let hits = router
//!         .handle_tool_call("search_fragments", json!({ "query": "boiling point" }))
//!         .await?;
//!     println!("{hits}");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `knet::core` - Addresses, entities, canonical payloads, signatures
//! - `knet::store` - Address cache and session state
//! - `knet::gateway` - Gateway trait with HTTP and in-memory implementations
//! - `knet::validity` - Evidence, derivation chains, context, presets

pub mod builders;
pub mod config;
pub mod context;
pub mod error;
pub mod requests;
pub mod tools;

pub use knet_core as core;
pub use knet_gateway as gateway;
pub use knet_store as store;
pub use knet_validity as validity;

pub use config::{Config, ConfigLoader, GatewayConfig, IdentityConfig, LoadedConfig, SessionConfig};
pub use context::ToolContext;
pub use error::{KnetError, Result};
pub use tools::{tool_definitions, ToolDefinition, ToolRouter};
