//! In-process gateway for tests and offline use.
//!
//! Behaves like a small hub: entities are checked against their author's
//! registered key, addresses are assigned on create, and fragment trust is
//! derived from votes:
//!
//! ```text
//! score = (verify - contest) / (verify + contest + retract)   (0 with no votes)
//! state = verified  if verify > contest
//!         contested if contest > 0 and contest >= verify
//!         proposed  otherwise
//! ```
//!
//! Search matches any whitespace-separated query term against fragment
//! content (case-insensitive), ranks by number of matched terms and keeps
//! insertion order among equals. Cursors are decimal offsets.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;

use knet_core::{
    verify_agent, verify_fragment, verify_project, verify_relation, verify_tag, verify_transform,
    verify_trust_vote, names_match, Address, Agent, Domain, Fragment, FragmentState, Project,
    PublicKey, Relation, Tag, Transform, TrustSummary, TrustVote, Uuid, VoteType,
};

use crate::error::{GatewayError, Result};
use crate::gateway::Gateway;
use crate::types::{
    Direction, Health, Page, PageRequest, RelationQuery, ResourcePressure, SearchQuery, TagQuery,
    DEFAULT_PAGE_SIZE,
};

#[derive(Default)]
struct Inner {
    agents: Vec<Agent>,
    fragments: Vec<Fragment>,
    relations: Vec<Relation>,
    tags: Vec<Tag>,
    transforms: Vec<Transform>,
    projects: Vec<Project>,
    votes: Vec<TrustVote>,
}

impl Inner {
    fn agent(&self, id: Uuid) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Registered key of the agent behind `author`.
    fn author_key(&self, author: &Address) -> Result<PublicKey> {
        let agent = self
            .agent(author.entity)
            .ok_or_else(|| GatewayError::rejected(400, format!("unknown agent {}", author.entity)))?;
        PublicKey::from_base64(&agent.public_key)
            .map_err(|e| GatewayError::rejected(400, format!("agent key unusable: {e}")))
    }

    fn exists(&self, id: Uuid) -> bool {
        self.fragments.iter().any(|f| f.id == id)
            || self.relations.iter().any(|r| r.id == id)
            || self.tags.iter().any(|t| t.id == id)
            || self.transforms.iter().any(|t| t.id == id)
            || self.agents.iter().any(|a| a.id == id)
            || self.projects.iter().any(|p| p.id == id)
    }

    fn check_new(&self, id: Uuid) -> Result<()> {
        if self.exists(id) {
            Err(GatewayError::rejected(409, format!("entity {id} already exists")))
        } else {
            Ok(())
        }
    }

    /// Fill in the vote-derived fields.
    fn decorate(&self, mut fragment: Fragment) -> Fragment {
        let (mut verify, mut contest, mut retract) = (0u32, 0u32, 0u32);
        for vote in self.votes.iter().filter(|v| v.target == fragment.id) {
            match vote.vote_type {
                VoteType::Verify => verify += 1,
                VoteType::Contest => contest += 1,
                VoteType::Retract => retract += 1,
            }
        }
        let total = verify + contest + retract;
        let score = if total == 0 {
            0.0
        } else {
            (f64::from(verify) - f64::from(contest)) / f64::from(total)
        };
        fragment.state = if verify > contest {
            FragmentState::Verified
        } else if contest > 0 {
            FragmentState::Contested
        } else {
            FragmentState::Proposed
        };
        fragment.trust_summary = Some(TrustSummary {
            score,
            verify_count: verify,
            contest_count: contest,
            retract_count: retract,
        });
        fragment
    }
}

/// Gateway held entirely in memory.
pub struct MemoryGateway {
    host_port: String,
    inner: RwLock<Inner>,
    pressure: Mutex<Option<ResourcePressure>>,
}

impl MemoryGateway {
    /// Gateway that assigns addresses under `host_port`.
    pub fn new(host_port: impl Into<String>) -> Self {
        Self {
            host_port: host_port.into(),
            inner: RwLock::new(Inner::default()),
            pressure: Mutex::new(None),
        }
    }

    /// Host used in assigned addresses.
    pub fn host_port(&self) -> &str {
        &self.host_port
    }

    /// Simulate a resource pressure signal on subsequent responses.
    pub fn set_pressure(&self, pressure: Option<ResourcePressure>) {
        *self.pressure.lock().unwrap_or_else(|e| e.into_inner()) = pressure;
    }

    /// Override an agent's reputation (the hub derives it; tests set it).
    pub async fn set_reputation(&self, agent: Uuid, reputation: f64) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .agents
            .iter_mut()
            .find(|a| a.id == agent)
            .ok_or_else(|| GatewayError::NotFound(format!("agent {agent}")))?;
        record.reputation = reputation;
        Ok(())
    }

    fn address(&self, domain: Domain, id: Uuid) -> Option<Address> {
        Some(Address::new(self.host_port.clone(), domain, id))
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new("localhost:8080")
    }
}

fn not_found(kind: &str, id: Uuid) -> GatewayError {
    GatewayError::NotFound(format!("{kind} {id}"))
}

fn bad_signature(kind: &str) -> GatewayError {
    GatewayError::rejected(401, format!("invalid {kind} signature"))
}

/// Slice `items` by a decimal offset cursor.
fn paginate<T: Clone>(items: Vec<T>, limit: Option<u32>, cursor: Option<&str>) -> Result<Page<T>> {
    let offset = match cursor {
        None | Some("") => 0,
        Some(c) => c
            .parse::<usize>()
            .map_err(|_| GatewayError::rejected(400, format!("invalid cursor {c:?}")))?,
    };
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1) as usize;
    let total = items.len();
    let end = offset.saturating_add(limit).min(total);
    let page: Vec<T> = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
    Ok(Page {
        items: page,
        next_cursor: (end < total).then(|| end.to_string()),
        total: Some(total as u64),
    })
}

fn search_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn health(&self) -> Result<Health> {
        Ok(Health {
            status: "ok".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        })
    }

    async fn create_fragment(&self, fragment: &Fragment) -> Result<Fragment> {
        let mut inner = self.inner.write().await;
        inner.check_new(fragment.id)?;
        let key = inner.author_key(&fragment.creator)?;
        if !verify_fragment(fragment, &key) {
            return Err(bad_signature("fragment"));
        }
        let mut stored = fragment.clone();
        stored.address = self.address(Domain::Fragment, stored.id);
        stored.state = FragmentState::Proposed;
        stored.trust_summary = None;
        inner.fragments.push(stored.clone());
        tracing::debug!(id = %stored.id, "memory gateway stored fragment");
        Ok(inner.decorate(stored))
    }

    async fn get_fragment(&self, id: Uuid) -> Result<Fragment> {
        let inner = self.inner.read().await;
        let fragment = inner
            .fragments
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| not_found("fragment", id))?;
        Ok(inner.decorate(fragment))
    }

    async fn search_fragments(&self, query: &SearchQuery) -> Result<Page<Fragment>> {
        let inner = self.inner.read().await;
        let terms = search_terms(&query.query);

        let mut scored: Vec<(usize, Fragment)> = inner
            .fragments
            .iter()
            .filter(|f| query.author.map_or(true, |a| f.creator.entity == a))
            .filter(|f| query.project.map_or(true, |p| f.project == Some(p)))
            .filter(|f| query.tags.iter().all(|t| f.tags.iter().any(|a| a.entity == *t)))
            .map(|f| inner.decorate(f.clone()))
            .filter(|f| query.state.map_or(true, |s| f.state == s))
            .filter_map(|f| {
                if terms.is_empty() {
                    return Some((0, f));
                }
                let content = f.content.to_lowercase();
                let hits = terms.iter().filter(|t| content.contains(t.as_str())).count();
                (hits > 0).then_some((hits, f))
            })
            .collect();
        // Stable: equal hit counts keep insertion order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let items = scored.into_iter().map(|(_, f)| f).collect();
        paginate(items, query.limit, query.cursor.as_deref())
    }

    async fn create_relation(&self, relation: &Relation) -> Result<Relation> {
        let mut inner = self.inner.write().await;
        inner.check_new(relation.id)?;
        let key = inner.author_key(&relation.by)?;
        if !verify_relation(relation, &key) {
            return Err(bad_signature("relation"));
        }
        let mut stored = relation.clone();
        stored.address = self.address(Domain::Relation, stored.id);
        inner.relations.push(stored.clone());
        Ok(stored)
    }

    async fn query_relations(&self, query: &RelationQuery) -> Result<Page<Relation>> {
        let inner = self.inner.read().await;
        let items: Vec<Relation> = inner
            .relations
            .iter()
            .filter(|r| match query.direction {
                Direction::Source => r.from.entity == query.entity,
                Direction::Target => r.to.entity == query.entity,
                Direction::Both => r.from.entity == query.entity || r.to.entity == query.entity,
            })
            .filter(|r| query.relation_type.map_or(true, |t| r.relation_type == t))
            .cloned()
            .collect();
        paginate(items, query.page.limit, query.page.cursor.as_deref())
    }

    async fn create_tag(&self, tag: &Tag) -> Result<Tag> {
        let mut inner = self.inner.write().await;
        inner.check_new(tag.id)?;
        if inner.tags.iter().any(|t| names_match(&t.name, &tag.name)) {
            return Err(GatewayError::rejected(409, format!("tag {:?} already exists", tag.name)));
        }
        let key = inner.author_key(&tag.creator)?;
        if !verify_tag(tag, &key) {
            return Err(bad_signature("tag"));
        }
        let mut stored = tag.clone();
        stored.address = self.address(Domain::Tag, stored.id);
        inner.tags.push(stored.clone());
        Ok(stored)
    }

    async fn get_tag(&self, id: Uuid) -> Result<Tag> {
        let inner = self.inner.read().await;
        inner
            .tags
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| not_found("tag", id))
    }

    async fn find_tags(&self, query: &TagQuery) -> Result<Page<Tag>> {
        let inner = self.inner.read().await;
        let name = query.name.as_deref().map(str::trim);
        let items: Vec<Tag> = inner
            .tags
            .iter()
            .filter(|t| name.map_or(true, |n| names_match(&t.name, n)))
            .filter(|t| query.category.map_or(true, |c| t.category == c))
            .cloned()
            .collect();
        paginate(items, query.page.limit, query.page.cursor.as_deref())
    }

    async fn create_transform(&self, transform: &Transform) -> Result<Transform> {
        let mut inner = self.inner.write().await;
        inner.check_new(transform.id)?;
        let key = inner.author_key(&transform.agent)?;
        if !verify_transform(transform, &key) {
            return Err(bad_signature("transform"));
        }
        let mut stored = transform.clone();
        stored.address = self.address(Domain::Transformation, stored.id);
        inner.transforms.push(stored.clone());
        Ok(stored)
    }

    async fn get_transform(&self, id: Uuid) -> Result<Transform> {
        let inner = self.inner.read().await;
        inner
            .transforms
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| not_found("transform", id))
    }

    async fn list_transforms(&self, page: &PageRequest) -> Result<Page<Transform>> {
        let inner = self.inner.read().await;
        paginate(inner.transforms.clone(), page.limit, page.cursor.as_deref())
    }

    async fn create_agent(&self, agent: &Agent) -> Result<Agent> {
        let mut inner = self.inner.write().await;
        inner.check_new(agent.id)?;
        let key = PublicKey::from_base64(&agent.public_key)
            .map_err(|e| GatewayError::rejected(400, format!("agent key unusable: {e}")))?;
        if !verify_agent(agent, &key) {
            return Err(bad_signature("agent"));
        }
        let mut stored = agent.clone();
        stored.address = self.address(Domain::Agent, stored.id);
        inner.agents.push(stored.clone());
        tracing::debug!(id = %stored.id, fingerprint = %key.fingerprint(), "memory gateway registered agent");
        Ok(stored)
    }

    async fn get_agent(&self, id: Uuid) -> Result<Agent> {
        let inner = self.inner.read().await;
        inner.agent(id).cloned().ok_or_else(|| not_found("agent", id))
    }

    async fn update_agent(&self, agent: &Agent) -> Result<Agent> {
        let mut inner = self.inner.write().await;
        let current = inner.agent(agent.id).ok_or_else(|| not_found("agent", agent.id))?;
        if agent.public_key != current.public_key {
            return Err(GatewayError::rejected(400, "agent key cannot change"));
        }
        if agent.version <= current.version {
            return Err(GatewayError::rejected(
                409,
                format!("stale agent version {} (have {})", agent.version, current.version),
            ));
        }
        let key = PublicKey::from_base64(&current.public_key)
            .map_err(|e| GatewayError::rejected(400, format!("agent key unusable: {e}")))?;
        if !verify_agent(agent, &key) {
            return Err(bad_signature("agent"));
        }

        let mut stored = agent.clone();
        stored.address = self.address(Domain::Agent, stored.id);
        if let Some(slot) = inner.agents.iter_mut().find(|a| a.id == agent.id) {
            stored.reputation = slot.reputation;
            stored.profile = slot.profile.clone();
            *slot = stored.clone();
        }
        Ok(stored)
    }

    async fn cast_vote(&self, vote: &TrustVote) -> Result<TrustVote> {
        let mut inner = self.inner.write().await;
        if !inner.fragments.iter().any(|f| f.id == vote.target) {
            return Err(not_found("fragment", vote.target));
        }
        let key = inner.author_key(&vote.voter)?;
        if !verify_trust_vote(vote, &key) {
            return Err(bad_signature("vote"));
        }
        // One standing vote per voter and target.
        inner
            .votes
            .retain(|v| !(v.target == vote.target && v.voter.entity == vote.voter.entity));
        inner.votes.push(vote.clone());
        Ok(vote.clone())
    }

    async fn create_project(&self, project: &Project) -> Result<Project> {
        let mut inner = self.inner.write().await;
        inner.check_new(project.id)?;
        let key = inner.author_key(&project.owner)?;
        if !verify_project(project, &key) {
            return Err(bad_signature("project"));
        }
        inner.projects.push(project.clone());
        Ok(project.clone())
    }

    async fn get_project(&self, id: Uuid) -> Result<Project> {
        let inner = self.inner.read().await;
        inner
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| not_found("project", id))
    }

    async fn list_projects(&self, page: &PageRequest) -> Result<Page<Project>> {
        let inner = self.inner.read().await;
        paginate(inner.projects.clone(), page.limit, page.cursor.as_deref())
    }

    fn pressure(&self) -> Option<ResourcePressure> {
        self.pressure.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knet_core::entity::now;
    use knet_core::{sign_agent, sign_fragment, sign_trust_vote, Keypair, RelationType};

    fn agent_address(id: Uuid) -> Address {
        Address::local(Domain::Agent, id)
    }

    fn agent(keypair: &Keypair) -> Agent {
        let mut agent = Agent {
            id: Uuid::new_v4(),
            public_key: keypair.public_key().to_base64(),
            description: None,
            trust: Default::default(),
            reputation: 0.5,
            profile: None,
            timestamp: now(),
            version: 1,
            address: None,
            signature: None,
        };
        sign_agent(&mut agent, keypair);
        agent
    }

    fn fragment(keypair: &Keypair, creator: Uuid, content: &str) -> Fragment {
        let mut fragment = Fragment {
            id: Uuid::new_v4(),
            content: content.to_string(),
            creator: agent_address(creator),
            timestamp: now(),
            tags: vec![],
            transform: Some(Address::local(Domain::Transformation, Uuid::new_v4())),
            confidence: Some(0.8),
            evidence_type: None,
            project: None,
            trust_summary: None,
            state: FragmentState::Proposed,
            version: 1,
            address: None,
            signature: None,
        };
        sign_fragment(&mut fragment, keypair);
        fragment
    }

    fn vote(keypair: &Keypair, voter: Uuid, target: Uuid, vote_type: VoteType) -> TrustVote {
        let mut vote = TrustVote {
            id: Uuid::new_v4(),
            voter: agent_address(voter),
            target,
            vote_type,
            comment: None,
            timestamp: now(),
            version: 1,
            signature: None,
        };
        sign_trust_vote(&mut vote, keypair);
        vote
    }

    async fn setup() -> (MemoryGateway, Keypair, Uuid) {
        let gateway = MemoryGateway::new("hub:7000");
        let keypair = Keypair::from_seed(&[7u8; 32]);
        let agent = gateway.create_agent(&agent(&keypair)).await.unwrap();
        (gateway, keypair, agent.id)
    }

    #[tokio::test]
    async fn test_create_assigns_address() {
        let (gateway, keypair, me) = setup().await;
        let stored = gateway
            .create_fragment(&fragment(&keypair, me, "water boils at 100C"))
            .await
            .unwrap();
        assert_eq!(
            stored.address,
            Some(Address::new("hub:7000", Domain::Fragment, stored.id))
        );
        assert_eq!(gateway.get_fragment(stored.id).await.unwrap().content, stored.content);
    }

    #[tokio::test]
    async fn test_rejects_tampered_fragment() {
        let (gateway, keypair, me) = setup().await;
        let mut forged = fragment(&keypair, me, "original");
        forged.content = "altered".into();
        let err = gateway.create_fragment(&forged).await.unwrap_err();
        assert!(matches!(err, GatewayError::Remote { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_rejects_unknown_author() {
        let gateway = MemoryGateway::default();
        let keypair = Keypair::from_seed(&[1u8; 32]);
        let err = gateway
            .create_fragment(&fragment(&keypair, Uuid::new_v4(), "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Remote { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let gateway = MemoryGateway::default();
        assert!(gateway.get_fragment(Uuid::new_v4()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_votes_derive_trust_and_state() {
        let (gateway, keypair, me) = setup().await;
        let other_keys = Keypair::from_seed(&[9u8; 32]);
        let other = gateway.create_agent(&agent(&other_keys)).await.unwrap().id;

        let f = gateway.create_fragment(&fragment(&keypair, me, "claim")).await.unwrap();
        gateway.cast_vote(&vote(&keypair, me, f.id, VoteType::Verify)).await.unwrap();
        let verified = gateway.get_fragment(f.id).await.unwrap();
        assert_eq!(verified.state, FragmentState::Verified);
        assert_eq!(verified.trust_score(), 1.0);

        gateway.cast_vote(&vote(&other_keys, other, f.id, VoteType::Contest)).await.unwrap();
        let contested = gateway.get_fragment(f.id).await.unwrap();
        assert_eq!(contested.state, FragmentState::Contested);
        assert_eq!(contested.trust_score(), 0.0);

        // A second vote from the same voter replaces the first.
        gateway.cast_vote(&vote(&keypair, me, f.id, VoteType::Contest)).await.unwrap();
        let summary = gateway.get_fragment(f.id).await.unwrap().trust_summary.unwrap();
        assert_eq!(summary.verify_count, 0);
        assert_eq!(summary.contest_count, 2);
        assert_eq!(summary.score, -1.0);
    }

    #[tokio::test]
    async fn test_search_ranks_and_paginates() {
        let (gateway, keypair, me) = setup().await;
        for content in ["solar energy", "photosynthesis stores solar energy", "unrelated", "energy"] {
            gateway.create_fragment(&fragment(&keypair, me, content)).await.unwrap();
        }

        let page = gateway
            .search_fragments(&SearchQuery::text("solar energy", 2))
            .await
            .unwrap();
        assert_eq!(page.total, Some(3));
        assert_eq!(page.items[0].content, "solar energy");
        assert_eq!(page.items[1].content, "photosynthesis stores solar energy");
        assert_eq!(page.next_cursor.as_deref(), Some("2"));

        let mut next = SearchQuery::text("solar energy", 2);
        next.cursor = page.next_cursor;
        let rest = gateway.search_fragments(&next).await.unwrap();
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.items[0].content, "energy");
        assert!(rest.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_bad_cursor_rejected() {
        let gateway = MemoryGateway::default();
        let page = PageRequest {
            limit: None,
            cursor: Some("abc".into()),
        };
        assert!(matches!(
            gateway.list_projects(&page).await,
            Err(GatewayError::Remote { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_relation_direction_filter() {
        let (gateway, keypair, me) = setup().await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut relation = Relation {
            id: Uuid::new_v4(),
            from: Address::local(Domain::Fragment, a),
            to: Address::local(Domain::Fragment, b),
            by: agent_address(me),
            relation_type: RelationType::Supports,
            content: None,
            confidence: Some(0.9),
            timestamp: now(),
            version: 1,
            address: None,
            signature: None,
        };
        knet_core::sign_relation(&mut relation, &keypair);
        gateway.create_relation(&relation).await.unwrap();

        let incoming = gateway.query_relations(&RelationQuery::incoming(b, None)).await.unwrap();
        assert_eq!(incoming.items.len(), 1);
        let outgoing = gateway.query_relations(&RelationQuery::outgoing(b, None)).await.unwrap();
        assert!(outgoing.items.is_empty());
        let typed = gateway
            .query_relations(&RelationQuery::incoming(b, Some(RelationType::Contradicts)))
            .await
            .unwrap();
        assert!(typed.items.is_empty());
    }

    #[tokio::test]
    async fn test_pressure_passthrough() {
        let gateway = MemoryGateway::default();
        assert!(gateway.pressure().is_none());
        gateway.set_pressure(Some(ResourcePressure {
            level: "warning".into(),
            hint: Some("slow down".into()),
        }));
        assert_eq!(gateway.pressure().unwrap().level, "warning");
    }
}
