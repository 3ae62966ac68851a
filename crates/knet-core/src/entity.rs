//! Entities of the knowledge network.
//!
//! Every entity has a UUID identity, a monotonic `version`, and a detached
//! base64 Ed25519 `signature` over its canonical payload (see
//! [`crate::signing`]). Fields the gateway derives (`address`,
//! `trust_summary`, `state`, `reputation`, `profile`) are never signed.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::address::{Address, Domain};
use crate::error::CoreError;

/// Default confidence for fragments and relations that do not state one.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Current time, truncated to the microsecond precision used in payloads.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Defines a closed string enum with serde names, `as_str`, `Display` and
/// `FromStr` (case-insensitive).
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal, $case:literal) {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = $case)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| CoreError::UnknownVariant {
                        kind: $label,
                        value: s.to_string(),
                    })
            }
        }
    };
}

string_enum! {
    /// Typed edge between two entities.
    RelationType ("relation type", "SCREAMING_SNAKE_CASE") {
        Supports => "SUPPORTS",
        Contradicts => "CONTRADICTS",
        DerivedFrom => "DERIVED_FROM",
        RelatedTo => "RELATED_TO",
        ExampleOf => "EXAMPLE_OF",
        Specializes => "SPECIALIZES",
        Generalizes => "GENERALIZES",
        PartOf => "PART_OF",
        Causes => "CAUSES",
        Refines => "REFINES",
        Answers => "ANSWERS",
    }
}

string_enum! {
    /// Closed set of tag categories.
    TagCategory ("tag category", "lowercase") {
        Domain => "domain",
        Topic => "topic",
        Method => "method",
        Source => "source",
        Status => "status",
        Priority => "priority",
        Audience => "audience",
        Format => "format",
        Project => "project",
        Person => "person",
        General => "general",
    }
}

string_enum! {
    /// How a fragment's claim is backed.
    EvidenceType ("evidence type", "lowercase") {
        Empirical => "empirical",
        Logical => "logical",
        Consensus => "consensus",
        Speculation => "speculation",
        Unknown => "unknown",
    }
}

string_enum! {
    /// Lifecycle state of a fragment, derived by the gateway from votes.
    FragmentState ("fragment state", "lowercase") {
        Proposed => "proposed",
        Verified => "verified",
        Contested => "contested",
    }
}

string_enum! {
    /// Kind of trust vote.
    VoteType ("vote type", "lowercase") {
        Verify => "verify",
        Contest => "contest",
        Retract => "retract",
    }
}

string_enum! {
    /// Who can see a project.
    Visibility ("visibility", "lowercase") {
        Private => "private",
        Team => "team",
        Public => "public",
    }
}

string_enum! {
    /// Entity kinds that carry signatures.
    EntityKind ("entity kind", "snake_case") {
        Fragment => "fragment",
        Relation => "relation",
        Tag => "tag",
        Transform => "transform",
        Agent => "agent",
        TrustVote => "trust_vote",
        Project => "project",
    }
}

impl EntityKind {
    /// Address domain of this kind, if it is addressable.
    pub const fn domain(self) -> Option<Domain> {
        match self {
            EntityKind::Fragment => Some(Domain::Fragment),
            EntityKind::Relation => Some(Domain::Relation),
            EntityKind::Tag => Some(Domain::Tag),
            EntityKind::Transform => Some(Domain::Transformation),
            EntityKind::Agent => Some(Domain::Agent),
            EntityKind::TrustVote | EntityKind::Project => None,
        }
    }
}

impl Default for EvidenceType {
    fn default() -> Self {
        EvidenceType::Unknown
    }
}

impl Default for FragmentState {
    fn default() -> Self {
        FragmentState::Proposed
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Private
    }
}

/// Derived trust information the gateway attaches to fragments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustSummary {
    /// Aggregate trust in [-1, 1].
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub verify_count: u32,
    #[serde(default)]
    pub contest_count: u32,
    #[serde(default)]
    pub retract_count: u32,
}

/// A knowledge fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: Uuid,
    pub content: String,
    pub creator: Address,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<Address>,
    #[serde(default)]
    pub transform: Option<Address>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub evidence_type: Option<EvidenceType>,
    #[serde(default)]
    pub project: Option<Uuid>,
    #[serde(default)]
    pub trust_summary: Option<TrustSummary>,
    #[serde(default)]
    pub state: FragmentState,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl Fragment {
    /// Stated confidence, or the default.
    pub fn confidence(&self) -> f64 {
        self.confidence.unwrap_or(DEFAULT_CONFIDENCE)
    }

    /// Trust score from the derived summary, 0 when absent.
    pub fn trust_score(&self) -> f64 {
        self.trust_summary.as_ref().map_or(0.0, |t| t.score)
    }
}

/// A typed, directed edge between two addressed entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: Uuid,
    pub from: Address,
    pub to: Address,
    pub by: Address,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl Relation {
    /// Stated confidence, or the default.
    pub fn confidence(&self) -> f64 {
        self.confidence.unwrap_or(DEFAULT_CONFIDENCE)
    }
}

/// A named, categorized label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub category: TagCategory,
    #[serde(default)]
    pub content: Option<String>,
    pub creator: Address,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// A transformation that produces fragments from some source format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub source_format: String,
    pub target_format: String,
    #[serde(default)]
    pub additional_data: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<Address>,
    pub agent: Address,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// One agent's declared trust in a peer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustEntry {
    /// Trust in [-1, 1].
    pub trust: f64,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

/// Derived description of an agent's track record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub biases: Vec<String>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

/// Reputation of an agent the gateway has not scored yet.
pub const DEFAULT_REPUTATION: f64 = 0.5;

fn default_reputation() -> f64 {
    DEFAULT_REPUTATION
}

/// A participant identified by its public key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub public_key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub trust: BTreeMap<Uuid, TrustEntry>,
    #[serde(default = "default_reputation")]
    pub reputation: f64,
    #[serde(default)]
    pub profile: Option<AgentProfile>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// A verify/contest/retract vote on an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustVote {
    pub id: Uuid,
    pub voter: Address,
    pub target: Uuid,
    pub vote_type: VoteType,
    #[serde(default)]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub signature: Option<String>,
}

/// A workspace grouping fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner: Address,
    #[serde(default)]
    pub default_tags: Vec<Address>,
    #[serde(default)]
    pub visibility: Visibility,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Check a confidence value.
pub fn check_confidence(value: f64) -> Result<f64, crate::error::ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(crate::error::ValidationError::ConfidenceOutOfRange(value))
    }
}

/// Check a trust level.
pub fn check_trust(value: f64) -> Result<f64, crate::error::ValidationError> {
    if (-1.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(crate::error::ValidationError::TrustOutOfRange(value))
    }
}

/// Case-folded key for a tag or transform name.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether two names refer to the same tag or transform.
pub fn names_match(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_fold_unicode_case() {
        assert!(names_match("Thermodynamik", " thermodynamik "));
        assert!(names_match("ÉNERGIE", "énergie"));
        assert!(names_match("CI/CD", "ci/cd"));
        assert!(!names_match("energie", "énergie"));
        assert_eq!(name_key("  Straße "), "straße");
    }

    #[test]
    fn test_relation_type_wire_names() {
        assert_eq!(RelationType::ALL.len(), 11);
        assert_eq!(
            serde_json::to_value(RelationType::DerivedFrom).unwrap(),
            "DERIVED_FROM"
        );
        assert_eq!(
            "derived_from".parse::<RelationType>().unwrap(),
            RelationType::DerivedFrom
        );
    }

    #[test]
    fn test_tag_categories_closed() {
        assert_eq!(TagCategory::ALL.len(), 11);
        assert!("weather".parse::<TagCategory>().is_err());
    }

    #[test]
    fn test_fragment_defaults_from_wire() {
        let json = serde_json::json!({
            "id": Uuid::nil(),
            "content": "water boils at 100C",
            "creator": {"host_port": "", "domain": "AGENT", "entity": Uuid::nil()},
            "timestamp": "2026-01-14T12:00:00Z"
        });
        let fragment: Fragment = serde_json::from_value(json).unwrap();
        assert_eq!(fragment.confidence(), DEFAULT_CONFIDENCE);
        assert_eq!(fragment.state, FragmentState::Proposed);
        assert_eq!(fragment.trust_score(), 0.0);
        assert!(fragment.tags.is_empty());
    }

    #[test]
    fn test_relation_type_field_renamed() {
        let rel = Relation {
            id: Uuid::nil(),
            from: Address::local(Domain::Fragment, Uuid::nil()),
            to: Address::local(Domain::Fragment, Uuid::nil()),
            by: Address::local(Domain::Agent, Uuid::nil()),
            relation_type: RelationType::Supports,
            content: None,
            confidence: Some(0.9),
            timestamp: now(),
            version: 0,
            address: None,
            signature: None,
        };
        let value = serde_json::to_value(&rel).unwrap();
        assert_eq!(value["type"], "SUPPORTS");
    }

    #[test]
    fn test_range_checks() {
        assert!(check_confidence(0.0).is_ok());
        assert!(check_confidence(1.0).is_ok());
        assert!(check_confidence(1.01).is_err());
        assert!(check_trust(-1.0).is_ok());
        assert!(check_trust(-1.5).is_err());
        assert!(check_confidence(f64::NAN).is_err());
    }

    #[test]
    fn test_entity_kind_domains() {
        assert_eq!(EntityKind::Transform.domain(), Some(Domain::Transformation));
        assert_eq!(EntityKind::Project.domain(), None);
    }
}
