//! Entity payload builders.
//!
//! Each builder turns a typed request plus session context into an unsigned
//! entity with a fresh id, version 1 and the current timestamp. Local
//! checks run first, in this order:
//!
//! 1. identity and project preconditions,
//! 2. argument validation (ranges, empty fields, required transform),
//! 3. reference resolution, which may hit the gateway.
//!
//! A reference is taken as a full address when it parses as one, as an id
//! when it parses as a UUID, and as a name otherwise. Names may contain
//! `/`.

use knet_core::entity::now;
use knet_core::{
    check_confidence, check_trust, names_match, Address, Agent, Domain, Fragment, Keypair,
    Project, Relation, Tag, Transform, TrustEntry, TrustVote, Uuid, ValidationError,
    DEFAULT_REPUTATION,
};
use knet_gateway::{collect_pages, Gateway, PageRequest, TagQuery, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};

use crate::context::ToolContext;
use crate::error::Result;
use crate::requests::{
    CastVoteRequest, CreateProjectRequest, CreateRelationRequest, CreateTagRequest,
    CreateTransformRequest, StoreFragmentRequest,
};

fn non_empty(value: &str, field: &'static str) -> std::result::Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn unresolved(kind: &'static str, value: &str) -> ValidationError {
    ValidationError::UnresolvedReference {
        kind,
        value: value.to_string(),
    }
}

/// Resolve an address or id without any name lookup. `Ok(None)` means the
/// reference is a name.
fn direct_reference<G: Gateway>(
    ctx: &ToolContext<G>,
    raw: &str,
    domain: Domain,
    kind: &'static str,
) -> Result<Option<Address>> {
    let raw = raw.trim();
    if let Ok(address) = Address::parse(raw) {
        if address.domain != domain {
            return Err(unresolved(kind, raw).into());
        }
        return Ok(Some(address));
    }
    Ok(Uuid::parse_str(raw).ok().map(|id| ctx.resolve(id, domain)))
}

/// Resolve a tag by address, id or name.
///
/// Names are looked up in the session tag cache, then on the gateway.
pub async fn resolve_tag<G: Gateway>(ctx: &ToolContext<G>, raw: &str) -> Result<Address> {
    if let Some(address) = direct_reference(ctx, raw, Domain::Tag, "tag")? {
        return Ok(address);
    }
    let name = non_empty(raw, "tag name")?;
    if let Some(id) = ctx.lookup_tag(&name) {
        return Ok(ctx.resolve(id, Domain::Tag));
    }

    let page = ctx.gateway().find_tags(&TagQuery::named(name.clone())).await?;
    let tag = page
        .items
        .into_iter()
        .find(|t| names_match(&t.name, &name))
        .ok_or_else(|| unresolved("tag", &name))?;
    tracing::debug!(name = %name, id = %tag.id, "tag name resolved on gateway");
    ctx.cache_tag(&tag.name, tag.id)?;
    ctx.remember_opt(tag.address.as_ref());
    Ok(ctx.resolve(tag.id, Domain::Tag))
}

/// Resolve several tags, preserving order and dropping duplicates.
pub async fn resolve_tags<G: Gateway>(ctx: &ToolContext<G>, raw: &[String]) -> Result<Vec<Address>> {
    let mut tags: Vec<Address> = Vec::with_capacity(raw.len());
    for reference in raw {
        let address = resolve_tag(ctx, reference).await?;
        if !tags.iter().any(|t| t.entity == address.entity) {
            tags.push(address);
        }
    }
    Ok(tags)
}

/// Resolve a transform by address, id or name.
pub async fn resolve_transform<G: Gateway>(ctx: &ToolContext<G>, raw: &str) -> Result<Address> {
    if let Some(address) = direct_reference(ctx, raw, Domain::Transformation, "transform")? {
        return Ok(address);
    }
    let name = non_empty(raw, "transform name")?;
    let gateway = ctx.gateway();
    let transforms = collect_pages(DEFAULT_MAX_PAGES, |cursor| async move {
        gateway
            .list_transforms(&PageRequest {
                limit: Some(DEFAULT_PAGE_SIZE),
                cursor,
            })
            .await
    })
    .await?;
    let transform = transforms
        .into_iter()
        .find(|t| names_match(&t.name, &name))
        .ok_or_else(|| unresolved("transform", &name))?;
    ctx.remember_opt(transform.address.as_ref());
    Ok(ctx.resolve(transform.id, Domain::Transformation))
}

/// Resolve a fragment by address or id. Fragments have no names.
pub fn resolve_fragment<G: Gateway>(ctx: &ToolContext<G>, raw: &str) -> Result<Address> {
    direct_reference(ctx, raw, Domain::Fragment, "fragment")?
        .ok_or_else(|| unresolved("fragment", raw.trim()).into())
}

// ─── Builders ────────────────────────────────────────────────────────

/// Unsigned fragment.
pub async fn build_fragment<G: Gateway>(
    ctx: &ToolContext<G>,
    request: &StoreFragmentRequest,
) -> Result<Fragment> {
    let creator = ctx.agent_address()?;
    let project = ctx.project_or_current(request.project)?;

    // Signed exactly as given.
    non_empty(&request.content, "content")?;
    let content = request.content.clone();
    let transform_ref = match request.source_transform.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(ValidationError::MissingTransform.into()),
    };
    let confidence = request.confidence.map(check_confidence).transpose()?;

    let transform = resolve_transform(ctx, transform_ref).await?;
    let tags = resolve_tags(ctx, &request.tags).await?;

    Ok(Fragment {
        id: Uuid::new_v4(),
        content,
        creator,
        timestamp: now(),
        tags,
        transform: Some(transform),
        confidence,
        evidence_type: request.evidence_type,
        project: Some(project),
        trust_summary: None,
        state: Default::default(),
        version: 1,
        address: None,
        signature: None,
    })
}

/// Unsigned relation between two fragments.
pub fn build_relation<G: Gateway>(
    ctx: &ToolContext<G>,
    request: &CreateRelationRequest,
) -> Result<Relation> {
    let by = ctx.agent_address()?;
    let confidence = request.confidence.map(check_confidence).transpose()?;
    let from = resolve_fragment(ctx, &request.from)?;
    let to = resolve_fragment(ctx, &request.to)?;

    Ok(Relation {
        id: Uuid::new_v4(),
        from,
        to,
        by,
        relation_type: request.relation_type,
        content: request.content.clone(),
        confidence,
        timestamp: now(),
        version: 1,
        address: None,
        signature: None,
    })
}

/// Unsigned tag.
pub fn build_tag<G: Gateway>(ctx: &ToolContext<G>, request: &CreateTagRequest) -> Result<Tag> {
    let creator = ctx.agent_address()?;
    let name = non_empty(&request.name, "name")?;

    Ok(Tag {
        id: Uuid::new_v4(),
        name,
        category: request.category,
        content: request.content.clone(),
        creator,
        timestamp: now(),
        version: 1,
        address: None,
        signature: None,
    })
}

/// Unsigned transform.
pub async fn build_transform<G: Gateway>(
    ctx: &ToolContext<G>,
    request: &CreateTransformRequest,
) -> Result<Transform> {
    let agent = ctx.agent_address()?;
    let name = non_empty(&request.name, "name")?;
    let source_format = non_empty(&request.source_format, "source_format")?;
    let target_format = non_empty(&request.target_format, "target_format")?;
    let tags = resolve_tags(ctx, &request.tags).await?;

    Ok(Transform {
        id: Uuid::new_v4(),
        name,
        description: request.description.clone(),
        source_format,
        target_format,
        additional_data: request.additional_data.clone(),
        tags,
        agent,
        timestamp: now(),
        version: 1,
        address: None,
        signature: None,
    })
}

/// Unsigned agent for `keypair`.
pub fn build_agent(keypair: &Keypair, description: Option<String>) -> Agent {
    Agent {
        id: Uuid::new_v4(),
        public_key: keypair.public_key().to_base64(),
        description,
        trust: Default::default(),
        reputation: DEFAULT_REPUTATION,
        profile: None,
        timestamp: now(),
        version: 1,
        address: None,
        signature: None,
    }
}

/// Next unsigned version of `agent` with one trust entry set.
pub fn build_trust_update(
    mut agent: Agent,
    peer: Uuid,
    trust: f64,
    confidence: f64,
) -> Result<Agent> {
    let entry = TrustEntry {
        trust: check_trust(trust)?,
        confidence: check_confidence(confidence)?,
    };
    agent.trust.insert(peer, entry);
    agent.version += 1;
    agent.timestamp = now();
    agent.address = None;
    agent.signature = None;
    Ok(agent)
}

/// Unsigned trust vote.
pub fn build_vote<G: Gateway>(ctx: &ToolContext<G>, request: &CastVoteRequest) -> Result<TrustVote> {
    let voter = ctx.agent_address()?;
    Ok(TrustVote {
        id: Uuid::new_v4(),
        voter,
        target: request.target,
        vote_type: request.vote_type,
        comment: request.comment.clone(),
        timestamp: now(),
        version: 1,
        signature: None,
    })
}

/// Unsigned project.
pub async fn build_project<G: Gateway>(
    ctx: &ToolContext<G>,
    request: &CreateProjectRequest,
) -> Result<Project> {
    let owner = ctx.agent_address()?;
    let name = non_empty(&request.name, "name")?;
    let default_tags = resolve_tags(ctx, &request.default_tags).await?;

    Ok(Project {
        id: Uuid::new_v4(),
        name,
        description: request.description.clone(),
        owner,
        default_tags,
        visibility: request.visibility,
        timestamp: now(),
        version: 1,
        signature: None,
    })
}
