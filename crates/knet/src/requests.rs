//! Typed arguments for each tool.
//!
//! Every request rejects unknown fields so a misspelled argument fails
//! loudly instead of silently falling back to a default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use knet_core::{
    EntityKind, EvidenceType, FragmentState, RelationType, TagCategory, Uuid, Visibility, VoteType,
};
use knet_gateway::{Direction, PageRequest};

/// Token budget for `load_context` when none is given.
pub const DEFAULT_TOKEN_BUDGET: usize = 4000;

/// Confidence floor for `load_context` when none is given.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// Trust confidence for `set_agent_trust` when none is given.
pub const DEFAULT_TRUST_CONFIDENCE: f64 = 0.5;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmptyRequest {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageArgs {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl PageArgs {
    pub fn page(&self) -> PageRequest {
        PageRequest {
            limit: self.limit,
            cursor: self.cursor.clone(),
        }
    }
}

// ─── Agents ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterAgentRequest {
    #[serde(default)]
    pub description: Option<String>,
    /// Base64 seed to register instead of the configured or a fresh key.
    #[serde(default)]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetAgentRequest {
    /// Defaults to the registered agent.
    #[serde(default)]
    pub agent_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetAgentTrustRequest {
    pub agent_id: Uuid,
    pub trust_level: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimateTrustRequest {
    pub target: Uuid,
    /// Defaults to the registered agent.
    #[serde(default)]
    pub observer: Option<Uuid>,
}

// ─── Projects ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Tag ids or names.
    #[serde(default)]
    pub default_tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Make the new project current.
    #[serde(default = "default_true")]
    pub switch: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchProjectRequest {
    pub project_id: Uuid,
}

// ─── Tags and transforms ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTagRequest {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: TagCategory,
    #[serde(default)]
    pub content: Option<String>,
}

fn default_category() -> TagCategory {
    TagCategory::General
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListTagsRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<TagCategory>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTransformRequest {
    pub name: String,
    pub description: String,
    pub source_format: String,
    pub target_format: String,
    #[serde(default)]
    pub additional_data: Map<String, Value>,
    /// Tag ids or names.
    #[serde(default)]
    pub tags: Vec<String>,
}

// ─── Fragments ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreFragmentRequest {
    pub content: String,
    /// Transform id, address or name. Required.
    #[serde(default)]
    pub source_transform: Option<String>,
    /// Tag ids, addresses or names.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub evidence_type: Option<EvidenceType>,
    /// Defaults to the current project.
    #[serde(default)]
    pub project: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreFragmentsRequest {
    pub fragments: Vec<StoreFragmentRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FragmentIdRequest {
    pub fragment_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchFragmentsRequest {
    #[serde(default)]
    pub query: String,
    /// Tag ids or names; all must match.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<Uuid>,
    #[serde(default)]
    pub project: Option<Uuid>,
    #[serde(default)]
    pub state: Option<FragmentState>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

// ─── Relations and votes ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRelationRequest {
    /// Fragment id or full address.
    pub from: String,
    /// Fragment id or full address.
    pub to: String,
    pub relation_type: RelationType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetRelationsRequest {
    pub entity_id: Uuid,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub relation_type: Option<RelationType>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastVoteRequest {
    pub target: Uuid,
    pub vote_type: VoteType,
    #[serde(default)]
    pub comment: Option<String>,
}

// ─── Analysis ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivationChainRequest {
    pub fragment_id: Uuid,
    #[serde(default)]
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadContextRequest {
    pub task: String,
    #[serde(default)]
    pub token_budget: Option<usize>,
    #[serde(default)]
    pub min_confidence: Option<f64>,
    /// Defaults to the current project, if any.
    #[serde(default)]
    pub project: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectPresetRequest {
    /// `FACT`, `HYPOTHESIS`, ... (case-insensitive).
    pub fragment_type: String,
    pub pressure: f64,
    /// Text to build compression instructions for.
    #[serde(default)]
    pub content: Option<String>,
    /// Compressed text to build expansion instructions for.
    #[serde(default)]
    pub compressed: Option<String>,
}

/// Entity kinds whose signatures can be checked by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifiableKind {
    Fragment,
    Tag,
    Transform,
    Agent,
    Project,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifySignatureRequest {
    pub entity_type: VerifiableKind,
    pub entity_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecentEntitiesRequest {
    #[serde(default)]
    pub kind: Option<EntityKind>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_rejected() {
        let err = serde_json::from_value::<StoreFragmentRequest>(json!({
            "content": "x",
            "source_transfrom": "typo"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("source_transfrom"));
    }

    #[test]
    fn test_defaults() {
        let project: CreateProjectRequest = serde_json::from_value(json!({"name": "p"})).unwrap();
        assert!(project.switch);
        assert_eq!(project.visibility, Visibility::Private);

        let tag: CreateTagRequest = serde_json::from_value(json!({"name": "t"})).unwrap();
        assert_eq!(tag.category, TagCategory::General);

        let relations: GetRelationsRequest =
            serde_json::from_value(json!({"entity_id": Uuid::nil()})).unwrap();
        assert_eq!(relations.direction, Direction::Both);
    }

    #[test]
    fn test_wire_enums() {
        let relation: CreateRelationRequest = serde_json::from_value(json!({
            "from": "a", "to": "b", "relation_type": "DERIVED_FROM"
        }))
        .unwrap();
        assert_eq!(relation.relation_type, RelationType::DerivedFrom);

        let verify: VerifySignatureRequest = serde_json::from_value(json!({
            "entity_type": "transform", "entity_id": Uuid::nil()
        }))
        .unwrap();
        assert_eq!(verify.entity_type, VerifiableKind::Transform);
    }
}
