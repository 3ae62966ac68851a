//! Test fixtures and helpers.
//!
//! A [`TestAgent`] owns a deterministic keypair and hands out signed
//! entities authored by it, so integration tests can seed a gateway
//! without going through the tool layer.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Map;

use knet_core::{
    sign_agent, sign_fragment, sign_project, sign_relation, sign_tag, sign_transform,
    sign_trust_vote, Address, Agent, Domain, Fragment, FragmentState, Keypair, Project, Relation,
    RelationType, Tag, TagCategory, Transform, TrustVote, Uuid, Visibility, VoteType,
    DEFAULT_REPUTATION,
};
use knet_gateway::{Gateway, GatewayError};

/// 2026-01-14T12:00:00Z, the timestamp every fixture entity carries.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// [`fixed_time`] plus some microseconds.
pub fn fixed_time_micros(micros: i64) -> DateTime<Utc> {
    fixed_time() + Duration::microseconds(micros)
}

/// An agent with a deterministic key and its signed registration.
pub struct TestAgent {
    pub keypair: Keypair,
    pub agent: Agent,
}

impl TestAgent {
    /// Agent whose key and id both derive from `seed`.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let keypair = Keypair::from_seed(&seed);
        let mut agent = Agent {
            id: Uuid::from_bytes(seed[..16].try_into().unwrap_or([0; 16])),
            public_key: keypair.public_key().to_base64(),
            description: Some(format!("test agent {:02x}", seed[0])),
            trust: Default::default(),
            reputation: DEFAULT_REPUTATION,
            profile: None,
            timestamp: fixed_time(),
            version: 1,
            address: None,
            signature: None,
        };
        sign_agent(&mut agent, &keypair);
        Self { keypair, agent }
    }

    pub fn id(&self) -> Uuid {
        self.agent.id
    }

    /// Local address of this agent.
    pub fn address(&self) -> Address {
        Address::local(Domain::Agent, self.agent.id)
    }

    /// Register with a gateway.
    pub async fn register<G: Gateway + ?Sized>(&self, gateway: &G) -> Result<Agent, GatewayError> {
        gateway.create_agent(&self.agent).await
    }

    /// Signed fragment citing `transform`.
    pub fn fragment(&self, content: &str, transform: Uuid, confidence: f64) -> Fragment {
        let mut fragment = Fragment {
            id: Uuid::new_v4(),
            content: content.to_string(),
            creator: self.address(),
            timestamp: fixed_time(),
            tags: vec![],
            transform: Some(Address::local(Domain::Transformation, transform)),
            confidence: Some(confidence),
            evidence_type: None,
            project: None,
            trust_summary: None,
            state: FragmentState::Proposed,
            version: 1,
            address: None,
            signature: None,
        };
        sign_fragment(&mut fragment, &self.keypair);
        fragment
    }

    /// Signed relation `from -> to`.
    pub fn relation(&self, from: Uuid, to: Uuid, relation_type: RelationType, confidence: f64) -> Relation {
        let mut relation = Relation {
            id: Uuid::new_v4(),
            from: Address::local(Domain::Fragment, from),
            to: Address::local(Domain::Fragment, to),
            by: self.address(),
            relation_type,
            content: None,
            confidence: Some(confidence),
            timestamp: fixed_time(),
            version: 1,
            address: None,
            signature: None,
        };
        sign_relation(&mut relation, &self.keypair);
        relation
    }

    pub fn tag(&self, name: &str, category: TagCategory) -> Tag {
        let mut tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category,
            content: None,
            creator: self.address(),
            timestamp: fixed_time(),
            version: 1,
            address: None,
            signature: None,
        };
        sign_tag(&mut tag, &self.keypair);
        tag
    }

    pub fn transform(&self, name: &str) -> Transform {
        let mut transform = Transform {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: format!("{name} transform"),
            source_format: "text".to_string(),
            target_format: "fragment".to_string(),
            additional_data: Map::new(),
            tags: vec![],
            agent: self.address(),
            timestamp: fixed_time(),
            version: 1,
            address: None,
            signature: None,
        };
        sign_transform(&mut transform, &self.keypair);
        transform
    }

    pub fn vote(&self, target: Uuid, vote_type: VoteType) -> TrustVote {
        let mut vote = TrustVote {
            id: Uuid::new_v4(),
            voter: self.address(),
            target,
            vote_type,
            comment: None,
            timestamp: fixed_time(),
            version: 1,
            signature: None,
        };
        sign_trust_vote(&mut vote, &self.keypair);
        vote
    }

    pub fn project(&self, name: &str) -> Project {
        let mut project = Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            owner: self.address(),
            default_tags: vec![],
            visibility: Visibility::Private,
            timestamp: fixed_time(),
            version: 1,
            signature: None,
        };
        sign_project(&mut project, &self.keypair);
        project
    }
}

/// Agents with distinct deterministic keys.
pub fn multi_agent_fixtures(count: usize) -> Vec<TestAgent> {
    (0..count)
        .map(|i| {
            let mut seed = [0x5a; 32];
            seed[0] = i as u8;
            TestAgent::with_seed(seed)
        })
        .collect()
}
