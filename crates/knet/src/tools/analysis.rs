//! Validity-engine, preset, verification and session tools.

use std::str::FromStr;

use serde_json::{json, Value};

use knet_core::{
    verify_agent, verify_fragment, verify_project, verify_tag, verify_transform, Address, PublicKey,
};
use knet_gateway::Gateway;
use knet_validity::{
    check_derivation_chain, decode_instructions, encode_instructions, evidence_balance,
    find_contradictions, load_context, select_preset, ContextRequest, FragmentType,
    DEFAULT_MAX_DEPTH,
};

use crate::error::{KnetError, Result};
use crate::requests::{
    DerivationChainRequest, FragmentIdRequest, LoadContextRequest, RecentEntitiesRequest,
    SelectPresetRequest, VerifiableKind, VerifySignatureRequest, DEFAULT_MIN_CONFIDENCE,
    DEFAULT_TOKEN_BUDGET,
};

use super::ToolRouter;

impl<G: Gateway> ToolRouter<G> {
    // ─────────────────────────────────────────────────────────────────────
    // Evidence and validity
    // ─────────────────────────────────────────────────────────────────────

    pub(super) async fn evidence_balance(&self, request: FragmentIdRequest) -> Result<Value> {
        let balance = evidence_balance(self.context().gateway(), request.fragment_id).await?;
        Ok(json!({ "balance": balance }))
    }

    pub(super) async fn find_contradictions(&self, request: FragmentIdRequest) -> Result<Value> {
        let contradictions = find_contradictions(self.context().gateway(), request.fragment_id).await?;
        let unresolved = contradictions.iter().filter(|c| !c.is_resolved()).count();
        Ok(json!({
            "fragment_id": request.fragment_id,
            "count": contradictions.len(),
            "unresolved": unresolved,
            "contradictions": contradictions,
        }))
    }

    pub(super) async fn check_derivation_chain(
        &self,
        request: DerivationChainRequest,
    ) -> Result<Value> {
        let max_depth = request.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        let report =
            check_derivation_chain(self.context().gateway(), request.fragment_id, max_depth).await?;
        Ok(json!({ "report": report }))
    }

    /// Relevance-ranked fragments for a task, scoped to the current project
    /// when none is given.
    pub(super) async fn load_context(&self, request: LoadContextRequest) -> Result<Value> {
        let ctx = self.context();
        let request = ContextRequest {
            task: request.task,
            token_budget: request.token_budget.unwrap_or(DEFAULT_TOKEN_BUDGET),
            min_confidence: request.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
            project: request.project.or_else(|| ctx.current_project()),
        };
        let selection = load_context(ctx.gateway(), &request).await?;
        for scored in &selection.fragments {
            ctx.remember_opt(scored.fragment.address.as_ref());
        }
        Ok(json!({
            "estimated_tokens": selection.estimated_tokens(),
            "context": selection,
        }))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Presets
    // ─────────────────────────────────────────────────────────────────────

    pub(super) fn select_transform_preset(&self, request: SelectPresetRequest) -> Result<Value> {
        let fragment_type =
            FragmentType::from_str(&request.fragment_type).map_err(KnetError::InvalidArguments)?;
        let selection = select_preset(fragment_type, request.pressure)?;
        let preset = selection.preset;

        let mut result = json!({
            "selection": selection,
            "preset": preset.preset(),
        });
        if let Some(content) = &request.content {
            result["encode_instructions"] = json!(encode_instructions(preset, content));
        }
        if let Some(compressed) = &request.compressed {
            result["decode_instructions"] = json!(decode_instructions(preset, compressed));
        }
        Ok(result)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Signatures
    // ─────────────────────────────────────────────────────────────────────

    /// Re-derive an entity's canonical payload and check it against the
    /// author's registered key.
    pub(super) async fn verify_signature(&self, request: VerifySignatureRequest) -> Result<Value> {
        let gateway = self.context().gateway();
        let id = request.entity_id;

        let (signer, signed, valid) = match request.entity_type {
            VerifiableKind::Fragment => {
                let entity = gateway.get_fragment(id).await?;
                let key = self.author_key(&entity.creator).await?;
                (entity.creator.entity, entity.signature.is_some(), verify_fragment(&entity, &key))
            }
            VerifiableKind::Tag => {
                let entity = gateway.get_tag(id).await?;
                let key = self.author_key(&entity.creator).await?;
                (entity.creator.entity, entity.signature.is_some(), verify_tag(&entity, &key))
            }
            VerifiableKind::Transform => {
                let entity = gateway.get_transform(id).await?;
                let key = self.author_key(&entity.agent).await?;
                (entity.agent.entity, entity.signature.is_some(), verify_transform(&entity, &key))
            }
            VerifiableKind::Project => {
                let entity = gateway.get_project(id).await?;
                let key = self.author_key(&entity.owner).await?;
                (entity.owner.entity, entity.signature.is_some(), verify_project(&entity, &key))
            }
            VerifiableKind::Agent => {
                let entity = gateway.get_agent(id).await?;
                let key = PublicKey::from_base64(&entity.public_key)?;
                (entity.id, entity.signature.is_some(), verify_agent(&entity, &key))
            }
        };

        if !valid {
            tracing::warn!(entity = %id, signer = %signer, signed, "signature did not verify");
        }
        Ok(json!({
            "entity_type": request.entity_type,
            "entity_id": id,
            "signer": signer,
            "signed": signed,
            "valid": valid,
        }))
    }

    async fn author_key(&self, author: &Address) -> Result<PublicKey> {
        let agent = self.context().gateway().get_agent(author.entity).await?;
        Ok(PublicKey::from_base64(&agent.public_key)?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────

    pub(super) fn recent_entities(&self, request: RecentEntitiesRequest) -> Result<Value> {
        let mut entities = self.context().recent(request.kind);
        if let Some(limit) = request.limit {
            entities.truncate(limit);
        }
        Ok(json!({ "count": entities.len(), "entities": entities }))
    }
}
