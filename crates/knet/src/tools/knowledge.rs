//! Tag, transform, fragment, relation and vote tools.

use serde_json::{json, Value};

use knet_core::{
    sign_fragment, sign_relation, sign_tag, sign_transform, sign_trust_vote, EntityKind, Fragment,
    ValidationError,
};
use knet_gateway::{Gateway, PageRequest, RelationQuery, SearchQuery, TagQuery};
use knet_store::preview;

use crate::builders::{
    build_fragment, build_relation, build_tag, build_transform, build_vote, resolve_tags,
};
use crate::error::{KnetError, Result};
use crate::requests::{
    CastVoteRequest, CreateRelationRequest, CreateTagRequest, CreateTransformRequest,
    FragmentIdRequest, GetRelationsRequest, ListTagsRequest, PageArgs, SearchFragmentsRequest,
    StoreFragmentRequest, StoreFragmentsRequest,
};

use super::{page_json, ToolRouter};

/// Characters of fragment content kept in session labels.
const LABEL_CHARS: usize = 60;

impl<G: Gateway> ToolRouter<G> {
    // ─────────────────────────────────────────────────────────────────────
    // Tags and transforms
    // ─────────────────────────────────────────────────────────────────────

    pub(super) async fn create_tag(&self, request: CreateTagRequest) -> Result<Value> {
        let ctx = self.context();
        let keypair = ctx.keypair()?;
        let mut tag = build_tag(ctx, &request)?;
        sign_tag(&mut tag, &keypair);
        let created = ctx.gateway().create_tag(&tag).await?;
        ctx.remember_opt(created.address.as_ref());
        ctx.cache_tag(&created.name, created.id)?;
        ctx.record_recent(created.id, EntityKind::Tag, &created.name)?;
        Ok(json!({ "tag": created }))
    }

    pub(super) async fn list_tags(&self, request: ListTagsRequest) -> Result<Value> {
        let ctx = self.context();
        let query = TagQuery {
            name: request.name,
            category: request.category,
            page: PageRequest {
                limit: request.limit,
                cursor: request.cursor,
            },
        };
        let page = ctx.gateway().find_tags(&query).await?;
        for tag in &page.items {
            ctx.remember_opt(tag.address.as_ref());
            ctx.cache_tag(&tag.name, tag.id)?;
        }
        page_json("tags", page)
    }

    pub(super) async fn create_transform(&self, request: CreateTransformRequest) -> Result<Value> {
        let ctx = self.context();
        let keypair = ctx.keypair()?;
        let mut transform = build_transform(ctx, &request).await?;
        sign_transform(&mut transform, &keypair);
        let created = ctx.gateway().create_transform(&transform).await?;
        ctx.remember_opt(created.address.as_ref());
        ctx.record_recent(created.id, EntityKind::Transform, &created.name)?;
        Ok(json!({ "transform": created }))
    }

    pub(super) async fn list_transforms(&self, request: PageArgs) -> Result<Value> {
        let ctx = self.context();
        let page = ctx.gateway().list_transforms(&request.page()).await?;
        for transform in &page.items {
            ctx.remember_opt(transform.address.as_ref());
        }
        page_json("transforms", page)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Fragments
    // ─────────────────────────────────────────────────────────────────────

    async fn store_one(&self, request: &StoreFragmentRequest) -> Result<Fragment> {
        let ctx = self.context();
        let keypair = ctx.keypair()?;
        let mut fragment = build_fragment(ctx, request).await?;
        sign_fragment(&mut fragment, &keypair);
        let created = ctx.gateway().create_fragment(&fragment).await?;
        ctx.remember_opt(created.address.as_ref());
        ctx.record_recent(created.id, EntityKind::Fragment, &preview(&created.content, LABEL_CHARS))?;
        Ok(created)
    }

    pub(super) async fn store_fragment(&self, request: StoreFragmentRequest) -> Result<Value> {
        let created = self.store_one(&request).await?;
        Ok(json!({ "fragment": created }))
    }

    /// Store fragments in order. Not atomic: a failure leaves earlier
    /// fragments in place and reports their ids.
    pub(super) async fn store_fragments(&self, request: StoreFragmentsRequest) -> Result<Value> {
        if request.fragments.is_empty() {
            return Err(ValidationError::EmptyField("fragments").into());
        }

        let mut created: Vec<Fragment> = Vec::with_capacity(request.fragments.len());
        for (index, item) in request.fragments.iter().enumerate() {
            match self.store_one(item).await {
                Ok(fragment) => created.push(fragment),
                Err(e) if created.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(index, created = created.len(), error = %e, "batch store stopped");
                    return Err(KnetError::PartialBatch {
                        created: created.iter().map(|f| f.id).collect(),
                        failed_index: index,
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(json!({ "count": created.len(), "fragments": created }))
    }

    pub(super) async fn get_fragment(&self, request: FragmentIdRequest) -> Result<Value> {
        let ctx = self.context();
        let fragment = ctx.gateway().get_fragment(request.fragment_id).await?;
        ctx.remember_opt(fragment.address.as_ref());
        Ok(json!({ "fragment": fragment }))
    }

    pub(super) async fn search_fragments(&self, request: SearchFragmentsRequest) -> Result<Value> {
        let ctx = self.context();
        let tags = resolve_tags(ctx, &request.tags).await?;
        let query = SearchQuery {
            query: request.query,
            tags: tags.iter().map(|t| t.entity).collect(),
            author: request.author,
            project: request.project,
            state: request.state,
            limit: request.limit,
            cursor: request.cursor,
        };
        let page = ctx.gateway().search_fragments(&query).await?;
        for fragment in &page.items {
            ctx.remember_opt(fragment.address.as_ref());
        }
        page_json("fragments", page)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Relations and votes
    // ─────────────────────────────────────────────────────────────────────

    pub(super) async fn create_relation(&self, request: CreateRelationRequest) -> Result<Value> {
        let ctx = self.context();
        let keypair = ctx.keypair()?;
        let mut relation = build_relation(ctx, &request)?;
        sign_relation(&mut relation, &keypair);
        let created = ctx.gateway().create_relation(&relation).await?;
        ctx.remember_opt(created.address.as_ref());
        let label = format!(
            "{} {} {}",
            created.from.entity,
            created.relation_type,
            created.to.entity
        );
        ctx.record_recent(created.id, EntityKind::Relation, &label)?;
        Ok(json!({ "relation": created }))
    }

    pub(super) async fn get_relations(&self, request: GetRelationsRequest) -> Result<Value> {
        let ctx = self.context();
        let query = RelationQuery {
            entity: request.entity_id,
            direction: request.direction,
            relation_type: request.relation_type,
            page: PageRequest {
                limit: request.limit,
                cursor: request.cursor,
            },
        };
        let page = ctx.gateway().query_relations(&query).await?;
        for relation in &page.items {
            ctx.remember_opt(relation.address.as_ref());
        }
        page_json("relations", page)
    }

    pub(super) async fn cast_vote(&self, request: CastVoteRequest) -> Result<Value> {
        let ctx = self.context();
        let keypair = ctx.keypair()?;
        let mut vote = build_vote(ctx, &request)?;
        sign_trust_vote(&mut vote, &keypair);
        let cast = ctx.gateway().cast_vote(&vote).await?;
        ctx.record_recent(cast.id, EntityKind::TrustVote, cast.vote_type.as_str())?;
        Ok(json!({ "vote": cast }))
    }
}
