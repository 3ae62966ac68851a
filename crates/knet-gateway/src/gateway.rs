//! Gateway abstraction.
//!
//! The gateway is the remote service that stores signed entities and
//! answers queries. Implementations may speak HTTP or live in-process.
//! Entities are submitted already signed; the gateway returns them with
//! derived fields (`address`, `trust_summary`, `state`) filled in.

use async_trait::async_trait;

use knet_core::{Agent, Fragment, Project, Relation, Tag, Transform, TrustVote, Uuid};

use crate::error::Result;
use crate::types::{Health, Page, PageRequest, RelationQuery, ResourcePressure, SearchQuery, TagQuery};

/// Access to the knowledge network gateway.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Reachability probe.
    async fn health(&self) -> Result<Health>;

    // ─── Fragments ───────────────────────────────────────────────────

    async fn create_fragment(&self, fragment: &Fragment) -> Result<Fragment>;

    async fn get_fragment(&self, id: Uuid) -> Result<Fragment>;

    async fn search_fragments(&self, query: &SearchQuery) -> Result<Page<Fragment>>;

    // ─── Relations ───────────────────────────────────────────────────

    async fn create_relation(&self, relation: &Relation) -> Result<Relation>;

    async fn query_relations(&self, query: &RelationQuery) -> Result<Page<Relation>>;

    // ─── Tags ────────────────────────────────────────────────────────

    async fn create_tag(&self, tag: &Tag) -> Result<Tag>;

    async fn get_tag(&self, id: Uuid) -> Result<Tag>;

    async fn find_tags(&self, query: &TagQuery) -> Result<Page<Tag>>;

    // ─── Transforms ──────────────────────────────────────────────────

    async fn create_transform(&self, transform: &Transform) -> Result<Transform>;

    async fn get_transform(&self, id: Uuid) -> Result<Transform>;

    async fn list_transforms(&self, page: &PageRequest) -> Result<Page<Transform>>;

    // ─── Agents ──────────────────────────────────────────────────────

    async fn create_agent(&self, agent: &Agent) -> Result<Agent>;

    async fn get_agent(&self, id: Uuid) -> Result<Agent>;

    /// Replace an agent record with a newer signed version.
    async fn update_agent(&self, agent: &Agent) -> Result<Agent>;

    // ─── Votes & projects ────────────────────────────────────────────

    async fn cast_vote(&self, vote: &TrustVote) -> Result<TrustVote>;

    async fn create_project(&self, project: &Project) -> Result<Project>;

    async fn get_project(&self, id: Uuid) -> Result<Project>;

    async fn list_projects(&self, page: &PageRequest) -> Result<Page<Project>>;

    /// The most recent resource pressure signal, if any was reported.
    fn pressure(&self) -> Option<ResourcePressure>;
}
