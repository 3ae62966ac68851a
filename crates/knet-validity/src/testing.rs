//! In-memory fragment graph for unit tests.

use std::collections::HashSet;

use async_trait::async_trait;

use knet_core::entity::now;
use knet_core::{
    Address, Domain, Fragment, FragmentState, Relation, RelationType, TrustSummary, Uuid,
};
use knet_gateway::{Direction, GatewayError, RelationQuery, SearchQuery};

use crate::graph::{FragmentGraph, GraphResult};

pub fn fragment(content: &str) -> Fragment {
    Fragment {
        id: Uuid::new_v4(),
        content: content.to_string(),
        creator: Address::local(Domain::Agent, Uuid::nil()),
        timestamp: now(),
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

pub fn relation(from: Uuid, to: Uuid, relation_type: RelationType, confidence: Option<f64>) -> Relation {
    Relation {
        id: Uuid::new_v4(),
        from: Address::local(Domain::Fragment, from),
        to: Address::local(Domain::Fragment, to),
        by: Address::local(Domain::Agent, Uuid::nil()),
        relation_type,
        content: None,
        confidence,
        timestamp: now(),
        version: 1,
        address: None,
        signature: None,
    }
}

#[derive(Default)]
pub struct MapGraph {
    pub fragments: Vec<Fragment>,
    pub relations: Vec<Relation>,
    failing: HashSet<Uuid>,
}

impl MapGraph {
    pub fn add(&mut self, content: &str) -> Uuid {
        self.insert(fragment(content))
    }

    pub fn insert(&mut self, fragment: Fragment) -> Uuid {
        let id = fragment.id;
        self.fragments.push(fragment);
        id
    }

    pub fn scored(&mut self, content: &str, confidence: f64, trust: f64) -> Uuid {
        let mut f = fragment(content);
        f.confidence = Some(confidence);
        f.trust_summary = Some(TrustSummary {
            score: trust,
            ..TrustSummary::default()
        });
        self.insert(f)
    }

    pub fn set_state(&mut self, id: Uuid, state: FragmentState) {
        if let Some(f) = self.fragments.iter_mut().find(|f| f.id == id) {
            f.state = state;
        }
    }

    pub fn link(&mut self, from: Uuid, to: Uuid, relation_type: RelationType, confidence: f64) {
        self.relations.push(relation(from, to, relation_type, Some(confidence)));
    }

    /// Make fetches of `id` fail with a server error.
    pub fn fail_on(&mut self, id: Uuid) {
        self.failing.insert(id);
    }
}

#[async_trait]
impl FragmentGraph for MapGraph {
    async fn fragment(&self, id: Uuid) -> GraphResult<Fragment> {
        if self.failing.contains(&id) {
            return Err(GatewayError::Remote {
                status: 500,
                message: "boom".into(),
            });
        }
        self.fragments
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("fragment {id}")))
    }

    async fn relations(&self, query: RelationQuery) -> GraphResult<Vec<Relation>> {
        Ok(self
            .relations
            .iter()
            .filter(|r| match query.direction {
                Direction::Source => r.from.entity == query.entity,
                Direction::Target => r.to.entity == query.entity,
                Direction::Both => r.from.entity == query.entity || r.to.entity == query.entity,
            })
            .filter(|r| query.relation_type.map_or(true, |t| r.relation_type == t))
            .cloned()
            .collect())
    }

    async fn search(&self, query: &SearchQuery) -> GraphResult<Vec<Fragment>> {
        let limit = query.limit.unwrap_or(20) as usize;
        Ok(self
            .fragments
            .iter()
            .filter(|f| query.project.map_or(true, |p| f.project == Some(p)))
            .take(limit)
            .cloned()
            .collect())
    }
}
