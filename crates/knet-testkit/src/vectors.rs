//! Golden canonical payloads.
//!
//! Each vector pins the exact signable string for one entity built from
//! fixed inputs. Any change to canonicalization, to the payload field
//! lists, or to the timestamp format shows up here as a mismatch, before
//! it can invalidate signatures already on the network.

use std::collections::BTreeMap;

use serde_json::json;

use knet_core::{
    signable_payload, Address, Agent, Domain, EvidenceType, Fragment, FragmentState, Project,
    Relation, RelationType, Tag, TagCategory, Transform, TrustEntry, TrustVote, Uuid, Visibility,
    VoteType,
};

use crate::fixtures::{fixed_time, fixed_time_micros};

/// A golden canonical payload.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Payload produced by the current code.
    pub actual: String,
    /// Frozen expected payload.
    pub expected: &'static str,
}

impl GoldenVector {
    pub fn matches(&self) -> bool {
        self.actual == self.expected
    }
}

fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

fn author() -> Address {
    Address::local(Domain::Agent, id(1))
}

fn hub_tag() -> Address {
    Address::new("hub:9000", Domain::Tag, id(4))
}

fn fragment(content: &str) -> Fragment {
    Fragment {
        id: id(5),
        content: content.to_string(),
        creator: author(),
        timestamp: fixed_time(),
        tags: vec![],
        transform: None,
        confidence: None,
        evidence_type: None,
        project: None,
        trust_summary: None,
        state: FragmentState::Proposed,
        version: 1,
        address: None,
        signature: None,
    }
}

fn fragment_vector() -> GoldenVector {
    let mut fragment = fragment("Ice is less dense than water");
    fragment.tags = vec![hub_tag()];
    fragment.transform = Some(Address::local(Domain::Transformation, id(3)));
    fragment.confidence = Some(0.8);
    fragment.evidence_type = Some(EvidenceType::Empirical);

    GoldenVector {
        name: "fragment with hub tag and transform",
        actual: signable_payload(&fragment),
        expected: concat!(
            r#"{"confidence":0.8,"content":"Ice is less dense than water","#,
            r#""creator":{"domain":"AGENT","entity":"00000000-0000-0000-0000-000000000001","host_port":""},"#,
            r#""evidence_type":"empirical","kind":"fragment","schema_version":2,"#,
            r#""tags":[{"domain":"TAG","entity":"00000000-0000-0000-0000-000000000004","host_port":"hub:9000"}],"#,
            r#""timestamp":"2026-01-14T12:00:00.000000Z","#,
            r#""transform":{"domain":"TRANSFORMATION","entity":"00000000-0000-0000-0000-000000000003","host_port":""}}"#,
        ),
    }
}

fn unicode_fragment_vector() -> GoldenVector {
    let fragment = fragment("Café ☕ \"quoted\"\n");

    GoldenVector {
        name: "fragment with defaults and non-ASCII content",
        actual: signable_payload(&fragment),
        expected: concat!(
            r#"{"confidence":0.5,"content":"Café ☕ \"quoted\"\n","#,
            r#""creator":{"domain":"AGENT","entity":"00000000-0000-0000-0000-000000000001","host_port":""},"#,
            r#""evidence_type":"unknown","kind":"fragment","schema_version":2,"tags":[],"#,
            r#""timestamp":"2026-01-14T12:00:00.000000Z","transform":null}"#,
        ),
    }
}

fn relation_vector() -> GoldenVector {
    let relation = Relation {
        id: id(9),
        from: Address::local(Domain::Fragment, id(5)),
        to: Address::local(Domain::Fragment, id(6)),
        by: author(),
        relation_type: RelationType::Supports,
        content: None,
        confidence: Some(0.9),
        timestamp: fixed_time(),
        version: 1,
        address: None,
        signature: None,
    };

    GoldenVector {
        name: "supports relation",
        actual: signable_payload(&relation),
        expected: concat!(
            r#"{"by":{"domain":"AGENT","entity":"00000000-0000-0000-0000-000000000001","host_port":""},"#,
            r#""confidence":0.9,"content":"","#,
            r#""from":{"domain":"FRAGMENT","entity":"00000000-0000-0000-0000-000000000005","host_port":""},"#,
            r#""kind":"relation","schema_version":2,"timestamp":"2026-01-14T12:00:00.000000Z","#,
            r#""to":{"domain":"FRAGMENT","entity":"00000000-0000-0000-0000-000000000006","host_port":""},"#,
            r#""type":"SUPPORTS"}"#,
        ),
    }
}

fn tag_vector() -> GoldenVector {
    let tag = Tag {
        id: id(4),
        name: "thermodynamics".to_string(),
        category: TagCategory::Topic,
        content: Some("Heat and work".to_string()),
        creator: author(),
        timestamp: fixed_time_micros(123_456),
        version: 1,
        address: None,
        signature: None,
    };

    GoldenVector {
        name: "tag with sub-second timestamp",
        actual: signable_payload(&tag),
        expected: concat!(
            r#"{"category":"topic","content":"Heat and work","#,
            r#""creator":{"domain":"AGENT","entity":"00000000-0000-0000-0000-000000000001","host_port":""},"#,
            r#""kind":"tag","name":"thermodynamics","schema_version":2,"#,
            r#""timestamp":"2026-01-14T12:00:00.123456Z"}"#,
        ),
    }
}

fn transform_vector() -> GoldenVector {
    let additional_data = json!({ "model": "none", "params": { "b": 2, "a": 1 } });
    let transform = Transform {
        id: id(3),
        name: "extract".to_string(),
        description: "Manual extraction".to_string(),
        source_format: "text".to_string(),
        target_format: "fragment".to_string(),
        additional_data: additional_data.as_object().cloned().unwrap_or_default(),
        tags: vec![],
        agent: author(),
        timestamp: fixed_time(),
        version: 1,
        address: None,
        signature: None,
    };

    GoldenVector {
        name: "transform with nested additional data",
        actual: signable_payload(&transform),
        expected: concat!(
            r#"{"additional_data":{"model":"none","params":{"a":1,"b":2}},"#,
            r#""agent":{"domain":"AGENT","entity":"00000000-0000-0000-0000-000000000001","host_port":""},"#,
            r#""description":"Manual extraction","kind":"transform","name":"extract","#,
            r#""schema_version":2,"source_format":"text","tags":[],"target_format":"fragment","#,
            r#""timestamp":"2026-01-14T12:00:00.000000Z"}"#,
        ),
    }
}

fn agent_vector() -> GoldenVector {
    let mut trust = BTreeMap::new();
    trust.insert(
        id(7),
        TrustEntry {
            trust: -0.25,
            confidence: 0.5,
        },
    );
    let agent = Agent {
        id: id(1),
        public_key: "dGVzdC1rZXk=".to_string(),
        description: None,
        trust,
        reputation: 0.5,
        profile: None,
        timestamp: fixed_time(),
        version: 3,
        address: None,
        signature: None,
    };

    GoldenVector {
        name: "agent with negative trust entry",
        actual: signable_payload(&agent),
        expected: concat!(
            r#"{"description":"","kind":"agent","public_key":"dGVzdC1rZXk=","schema_version":2,"#,
            r#""timestamp":"2026-01-14T12:00:00.000000Z","#,
            r#""trust":{"00000000-0000-0000-0000-000000000007":{"confidence":0.5,"trust":-0.25}}}"#,
        ),
    }
}

fn vote_vector() -> GoldenVector {
    let vote = TrustVote {
        id: id(8),
        voter: author(),
        target: id(5),
        vote_type: VoteType::Contest,
        comment: Some("measurement error".to_string()),
        timestamp: fixed_time(),
        version: 1,
        signature: None,
    };

    GoldenVector {
        name: "contest vote",
        actual: signable_payload(&vote),
        expected: concat!(
            r#"{"comment":"measurement error","kind":"trust_vote","schema_version":2,"#,
            r#""target":"00000000-0000-0000-0000-000000000005","#,
            r#""timestamp":"2026-01-14T12:00:00.000000Z","vote_type":"contest","#,
            r#""voter":{"domain":"AGENT","entity":"00000000-0000-0000-0000-000000000001","host_port":""}}"#,
        ),
    }
}

fn project_vector() -> GoldenVector {
    let project = Project {
        id: id(2),
        name: "physics".to_string(),
        description: None,
        owner: author(),
        default_tags: vec![hub_tag()],
        visibility: Visibility::Team,
        timestamp: fixed_time(),
        version: 1,
        signature: None,
    };

    GoldenVector {
        name: "team project with default tag",
        actual: signable_payload(&project),
        expected: concat!(
            r#"{"default_tags":[{"domain":"TAG","entity":"00000000-0000-0000-0000-000000000004","host_port":"hub:9000"}],"#,
            r#""description":"","kind":"project","name":"physics","#,
            r#""owner":{"domain":"AGENT","entity":"00000000-0000-0000-0000-000000000001","host_port":""},"#,
            r#""schema_version":2,"timestamp":"2026-01-14T12:00:00.000000Z","visibility":"team"}"#,
        ),
    }
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        fragment_vector(),
        unicode_fragment_vector(),
        relation_vector(),
        tag_vector(),
        transform_vector(),
        agent_vector(),
        vote_vector(),
        project_vector(),
    ]
}

/// Names of vectors whose payload no longer matches.
pub fn verify_all_vectors() -> Vec<&'static str> {
    all_vectors()
        .into_iter()
        .filter(|v| !v.matches())
        .map(|v| v.name)
        .collect()
}
