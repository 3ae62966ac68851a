//! Tool descriptions and input schemas.

use serde_json::{json, Value};

use knet_core::{EntityKind, EvidenceType, FragmentState, RelationType, TagCategory, Visibility, VoteType};
use knet_validity::FragmentType;

use super::ToolDefinition;

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn names<T: Copy>(all: &[T], as_str: fn(T) -> &'static str) -> Vec<&'static str> {
    all.iter().copied().map(as_str).collect()
}

fn uuid(description: &str) -> Value {
    json!({ "type": "string", "format": "uuid", "description": description })
}

fn page_properties() -> Value {
    json!({
        "limit": { "type": "integer", "minimum": 1, "description": "Page size" },
        "cursor": { "type": "string", "description": "Cursor from a previous page" }
    })
}

/// Object schema from `properties`, with page arguments merged in when
/// `paged` is set.
fn object(mut properties: Value, required: &[&str], paged: bool) -> Value {
    if paged {
        if let (Some(target), Value::Object(extra)) = (properties.as_object_mut(), page_properties()) {
            target.extend(extra);
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn no_arguments() -> Value {
    object(json!({}), &[], false)
}

fn fragment_id() -> Value {
    object(json!({ "fragment_id": uuid("Fragment id") }), &["fragment_id"], false)
}

fn store_fragment_schema() -> Value {
    object(
        json!({
            "content": { "type": "string", "description": "The knowledge to store" },
            "source_transform": {
                "type": "string",
                "description": "Transform that produced the content: id, address or name"
            },
            "tags": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Tag ids, addresses or names"
            },
            "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
            "evidence_type": { "type": "string", "enum": names(EvidenceType::ALL, EvidenceType::as_str) },
            "project": uuid("Project id; defaults to the current project")
        }),
        &["content", "source_transform"],
        false,
    )
}

/// Every tool the router answers.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        // Identity and projects
        tool(
            "health",
            "Check whether the gateway is reachable and show the local identity and project.",
            no_arguments(),
        ),
        tool(
            "register_agent",
            "Register this adapter as an agent. Generates a signing key unless one is configured or supplied, and saves the identity to the config file.",
            object(
                json!({
                    "description": { "type": "string" },
                    "private_key": { "type": "string", "description": "Base64 Ed25519 seed to register instead" }
                }),
                &[],
                false,
            ),
        ),
        tool(
            "get_agent",
            "Fetch an agent. Defaults to the registered agent.",
            object(json!({ "agent_id": uuid("Agent id") }), &[], false),
        ),
        tool(
            "set_agent_trust",
            "Set how much the registered agent trusts another agent, then re-sign and publish the next agent version.",
            object(
                json!({
                    "agent_id": uuid("Peer agent id"),
                    "trust_level": { "type": "number", "minimum": -1, "maximum": 1 },
                    "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
                }),
                &["agent_id", "trust_level"],
                false,
            ),
        ),
        tool(
            "estimate_trust",
            "Estimate trust from one agent toward another. Uses the observer's own trust entry when present; otherwise a placeholder derived from reputation.",
            object(
                json!({
                    "target": uuid("Agent being trusted"),
                    "observer": uuid("Trusting agent; defaults to the registered agent")
                }),
                &["target"],
                false,
            ),
        ),
        tool(
            "create_project",
            "Create a project. It becomes the current project unless switch is false.",
            object(
                json!({
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "default_tags": { "type": "array", "items": { "type": "string" } },
                    "visibility": { "type": "string", "enum": names(Visibility::ALL, Visibility::as_str) },
                    "switch": { "type": "boolean", "default": true }
                }),
                &["name"],
                false,
            ),
        ),
        tool("list_projects", "List projects.", object(json!({}), &[], true)),
        tool(
            "switch_project",
            "Make an existing project current. New fragments are stored in the current project.",
            object(json!({ "project_id": uuid("Project id") }), &["project_id"], false),
        ),
        // Knowledge entities
        tool(
            "create_tag",
            "Create a tag.",
            object(
                json!({
                    "name": { "type": "string" },
                    "category": {
                        "type": "string",
                        "enum": names(TagCategory::ALL, TagCategory::as_str),
                        "default": "general"
                    },
                    "content": { "type": "string" }
                }),
                &["name"],
                false,
            ),
        ),
        tool(
            "list_tags",
            "Find tags by name and/or category.",
            object(
                json!({
                    "name": { "type": "string" },
                    "category": { "type": "string", "enum": names(TagCategory::ALL, TagCategory::as_str) }
                }),
                &[],
                true,
            ),
        ),
        tool(
            "create_transform",
            "Register a transform: the process that turns a source into fragments.",
            object(
                json!({
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "source_format": { "type": "string" },
                    "target_format": { "type": "string" },
                    "additional_data": { "type": "object" },
                    "tags": { "type": "array", "items": { "type": "string" } }
                }),
                &["name", "description", "source_format", "target_format"],
                false,
            ),
        ),
        tool("list_transforms", "List transforms.", object(json!({}), &[], true)),
        tool(
            "store_fragment",
            "Sign and store one knowledge fragment. Every fragment must cite the transform that produced it.",
            store_fragment_schema(),
        ),
        tool(
            "store_fragments",
            "Store several fragments in order. Not atomic: on failure the error lists the fragments already stored.",
            object(
                json!({
                    "fragments": { "type": "array", "items": store_fragment_schema(), "minItems": 1 }
                }),
                &["fragments"],
                false,
            ),
        ),
        tool("get_fragment", "Fetch a fragment with its trust summary.", fragment_id()),
        tool(
            "search_fragments",
            "Search fragments by text, tags, author, project and state.",
            object(
                json!({
                    "query": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" } },
                    "author": uuid("Creator agent id"),
                    "project": uuid("Project id"),
                    "state": { "type": "string", "enum": names(FragmentState::ALL, FragmentState::as_str) }
                }),
                &[],
                true,
            ),
        ),
        tool(
            "create_relation",
            "Assert a typed relation between two fragments.",
            object(
                json!({
                    "from": { "type": "string", "description": "Fragment id or address" },
                    "to": { "type": "string", "description": "Fragment id or address" },
                    "relation_type": { "type": "string", "enum": names(RelationType::ALL, RelationType::as_str) },
                    "content": { "type": "string" },
                    "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
                }),
                &["from", "to", "relation_type"],
                false,
            ),
        ),
        tool(
            "get_relations",
            "List relations around an entity.",
            object(
                json!({
                    "entity_id": uuid("Entity id"),
                    "direction": { "type": "string", "enum": ["source", "target", "both"], "default": "both" },
                    "relation_type": { "type": "string", "enum": names(RelationType::ALL, RelationType::as_str) }
                }),
                &["entity_id"],
                true,
            ),
        ),
        tool(
            "cast_vote",
            "Cast a signed trust vote on a fragment.",
            object(
                json!({
                    "target": uuid("Fragment id"),
                    "vote_type": { "type": "string", "enum": names(VoteType::ALL, VoteType::as_str) },
                    "comment": { "type": "string" }
                }),
                &["target", "vote_type"],
                false,
            ),
        ),
        // Analysis
        tool(
            "evidence_balance",
            "Sum the confidence of SUPPORTS and CONTRADICTS relations pointing at a fragment and give a verdict.",
            fragment_id(),
        ),
        tool(
            "find_contradictions",
            "List fragments that contradict a fragment. Sources that no longer exist are reported as not found.",
            fragment_id(),
        ),
        tool(
            "check_derivation_chain",
            "Walk DERIVED_FROM relations from a fragment, reporting cycles and missing sources.",
            object(
                json!({
                    "fragment_id": uuid("Root fragment id"),
                    "max_depth": { "type": "integer", "minimum": 0, "default": 10 }
                }),
                &["fragment_id"],
                false,
            ),
        ),
        tool(
            "load_context",
            "Select the most relevant fragments for a task within a token budget.",
            object(
                json!({
                    "task": { "type": "string" },
                    "token_budget": { "type": "integer", "minimum": 0, "default": 4000 },
                    "min_confidence": { "type": "number", "minimum": 0, "maximum": 1, "default": 0.3 },
                    "project": uuid("Project id; defaults to the current project")
                }),
                &["task"],
                false,
            ),
        ),
        tool(
            "select_transform_preset",
            "Choose a compression preset for a fragment type under resource pressure, optionally with instructions for compressing or expanding text.",
            object(
                json!({
                    "fragment_type": { "type": "string", "enum": names(&FragmentType::ALL, FragmentType::as_str) },
                    "pressure": { "type": "number", "minimum": 0, "maximum": 1 },
                    "content": { "type": "string" },
                    "compressed": { "type": "string" }
                }),
                &["fragment_type", "pressure"],
                false,
            ),
        ),
        tool(
            "verify_signature",
            "Check an entity's signature against its author's registered key.",
            object(
                json!({
                    "entity_type": {
                        "type": "string",
                        "enum": ["fragment", "tag", "transform", "agent", "project"]
                    },
                    "entity_id": uuid("Entity id")
                }),
                &["entity_type", "entity_id"],
                false,
            ),
        ),
        tool(
            "recent_entities",
            "Entities created in this session, newest first.",
            object(
                json!({
                    "kind": { "type": "string", "enum": names(EntityKind::ALL, EntityKind::as_str) },
                    "limit": { "type": "integer", "minimum": 1 }
                }),
                &[],
                false,
            ),
        ),
    ]
}
