//! The tool surface.
//!
//! [`ToolRouter::list_tools`] describes every tool with a JSON input schema;
//! [`ToolRouter::handle_tool_call`] decodes the arguments into the tool's
//! typed request, runs it against the shared [`ToolContext`] and returns a
//! JSON object. When the gateway has reported resource pressure the object
//! carries it under `resource_pressure`.

mod analysis;
mod definitions;
mod identity;
mod knowledge;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use knet_gateway::Gateway;

use crate::context::ToolContext;
use crate::error::{KnetError, Result};

pub use definitions::tool_definitions;

/// Name, description and input schema of one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Dispatches tool calls to their handlers.
pub struct ToolRouter<G: Gateway> {
    ctx: Arc<ToolContext<G>>,
}

impl<G: Gateway> Clone for ToolRouter<G> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<G: Gateway> ToolRouter<G> {
    pub fn new(ctx: Arc<ToolContext<G>>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ToolContext<G> {
        &self.ctx
    }

    /// Every tool this router answers.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Run one tool call.
    pub async fn handle_tool_call(&self, name: &str, arguments: Value) -> Result<Value> {
        tracing::debug!(tool = name, "tool call");
        let result = self.dispatch(name, arguments).await;
        match &result {
            Ok(_) => tracing::debug!(tool = name, "tool call completed"),
            Err(e) => tracing::warn!(tool = name, code = e.code(), error = %e, "tool call failed"),
        }
        result.map(|value| self.with_pressure(value))
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<Value> {
        match name {
            // Identity and projects
            "health" => self.health(decode(args)?).await,
            "register_agent" => self.register_agent(decode(args)?).await,
            "get_agent" => self.get_agent(decode(args)?).await,
            "set_agent_trust" => self.set_agent_trust(decode(args)?).await,
            "estimate_trust" => self.estimate_trust(decode(args)?).await,
            "create_project" => self.create_project(decode(args)?).await,
            "list_projects" => self.list_projects(decode(args)?).await,
            "switch_project" => self.switch_project(decode(args)?).await,

            // Knowledge entities
            "create_tag" => self.create_tag(decode(args)?).await,
            "list_tags" => self.list_tags(decode(args)?).await,
            "create_transform" => self.create_transform(decode(args)?).await,
            "list_transforms" => self.list_transforms(decode(args)?).await,
            "store_fragment" => self.store_fragment(decode(args)?).await,
            "store_fragments" => self.store_fragments(decode(args)?).await,
            "get_fragment" => self.get_fragment(decode(args)?).await,
            "search_fragments" => self.search_fragments(decode(args)?).await,
            "create_relation" => self.create_relation(decode(args)?).await,
            "get_relations" => self.get_relations(decode(args)?).await,
            "cast_vote" => self.cast_vote(decode(args)?).await,

            // Analysis
            "evidence_balance" => self.evidence_balance(decode(args)?).await,
            "find_contradictions" => self.find_contradictions(decode(args)?).await,
            "check_derivation_chain" => self.check_derivation_chain(decode(args)?).await,
            "load_context" => self.load_context(decode(args)?).await,
            "select_transform_preset" => self.select_transform_preset(decode(args)?),
            "verify_signature" => self.verify_signature(decode(args)?).await,
            "recent_entities" => self.recent_entities(decode(args)?),

            _ => Err(KnetError::UnknownTool(name.to_string())),
        }
    }

    fn with_pressure(&self, value: Value) -> Value {
        let Some(pressure) = self.ctx.gateway().pressure() else {
            return value;
        };
        if pressure.is_elevated() {
            tracing::info!(level = %pressure.level, hint = ?pressure.hint, "gateway under resource pressure");
        }
        let pressure = serde_json::to_value(&pressure).unwrap_or(Value::Null);
        match value {
            Value::Object(mut map) => {
                map.insert("resource_pressure".to_string(), pressure);
                Value::Object(map)
            }
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map.insert("resource_pressure".to_string(), pressure);
                Value::Object(map)
            }
        }
    }
}

/// Decode tool arguments; a missing argument object counts as `{}`.
fn decode<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| KnetError::InvalidArguments(e.to_string()))
}

/// `{items, next_cursor, total}` under a caller-chosen key.
fn page_json<T: Serialize>(key: &str, page: knet_gateway::Page<T>) -> Result<Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), serde_json::to_value(&page.items)?);
    map.insert("count".to_string(), Value::from(page.items.len()));
    map.insert("next_cursor".to_string(), serde_json::to_value(&page.next_cursor)?);
    map.insert("total".to_string(), serde_json::to_value(page.total)?);
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use knet_core::Uuid;
    use knet_gateway::{MemoryGateway, ResourcePressure};
    use knet_store::MemoryStateStore;
    use serde_json::json;

    fn router() -> ToolRouter<MemoryGateway> {
        let ctx = ToolContext::new(
            Config::default(),
            None,
            Arc::new(MemoryGateway::default()),
            Box::new(MemoryStateStore::new()),
        )
        .unwrap();
        ToolRouter::new(Arc::new(ctx))
    }

    #[test]
    fn test_tool_names_unique() {
        let names: Vec<String> = router().list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 26);
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[tokio::test]
    async fn test_definitions_match_router() {
        let router = router();
        for tool in router.list_tools() {
            let err = router
                .handle_tool_call(&tool.name, json!({"__not_a_field": true}))
                .await
                .unwrap_err();
            assert!(
                !matches!(err, KnetError::UnknownTool(_)),
                "{} is listed but not routed",
                tool.name
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = router().handle_tool_call("delete_everything", json!({})).await.unwrap_err();
        assert!(matches!(err, KnetError::UnknownTool(_)));
        assert_eq!(err.code(), -32601);
    }

    #[tokio::test]
    async fn test_unknown_argument_rejected() {
        let err = router()
            .handle_tool_call("get_fragment", json!({"fragment": Uuid::nil()}))
            .await
            .unwrap_err();
        assert!(matches!(err, KnetError::InvalidArguments(_)));
        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn test_pressure_attached_to_results() {
        let router = router();
        let result = router.handle_tool_call("recent_entities", Value::Null).await.unwrap();
        assert!(result.get("resource_pressure").is_none());

        router.context().gateway().set_pressure(Some(ResourcePressure {
            level: "critical".into(),
            hint: Some("slow down".into()),
        }));
        let result = router.handle_tool_call("recent_entities", json!({})).await.unwrap();
        assert_eq!(result["resource_pressure"]["level"], "critical");
        assert_eq!(result["resource_pressure"]["hint"], "slow down");
    }
}
