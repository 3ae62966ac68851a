//! Health, agent and project tools.

use serde_json::{json, Value};

use knet_core::{
    check_confidence, check_trust, sign_agent, sign_project, EntityKind, Keypair,
};
use knet_gateway::Gateway;
use knet_validity::estimate_trust;

use crate::builders::{build_agent, build_project, build_trust_update};
use crate::error::Result;
use crate::requests::{
    CreateProjectRequest, EmptyRequest, EstimateTrustRequest, GetAgentRequest, PageArgs,
    RegisterAgentRequest, SetAgentTrustRequest, SwitchProjectRequest, DEFAULT_TRUST_CONFIDENCE,
};

use super::{page_json, ToolRouter};

impl<G: Gateway> ToolRouter<G> {
    // ─────────────────────────────────────────────────────────────────────
    // Health
    // ─────────────────────────────────────────────────────────────────────

    /// Probe the gateway. An unreachable gateway is reported, not raised.
    pub(super) async fn health(&self, _request: EmptyRequest) -> Result<Value> {
        let ctx = self.context();
        let gateway = match ctx.gateway().health().await {
            Ok(health) => json!({
                "reachable": true,
                "status": health.status,
                "version": health.version,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "gateway health probe failed");
                json!({ "reachable": false, "error": e.to_string() })
            }
        };
        Ok(json!({
            "gateway": gateway,
            "agent_id": ctx.agent_id().ok(),
            "current_project": ctx.current_project(),
            "cached_addresses": ctx.cached_addresses(),
        }))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Agents
    // ─────────────────────────────────────────────────────────────────────

    /// Register this adapter's agent and persist the identity.
    ///
    /// An existing registration is returned as is unless a different key is
    /// supplied.
    pub(super) async fn register_agent(&self, request: RegisterAgentRequest) -> Result<Value> {
        let ctx = self.context();

        if request.private_key.is_none() {
            if let Ok(agent_id) = ctx.agent_id() {
                match ctx.gateway().get_agent(agent_id).await {
                    Ok(agent) => {
                        ctx.remember_opt(agent.address.as_ref());
                        return Ok(json!({ "agent": agent, "already_registered": true }));
                    }
                    Err(e) if e.is_not_found() => {
                        tracing::info!(%agent_id, "configured agent unknown to gateway, registering again");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let keypair = match &request.private_key {
            Some(seed) => Keypair::from_base64(seed)?,
            None => match ctx.existing_keypair() {
                Some(keypair) => keypair,
                None => Keypair::generate()?,
            },
        };

        let mut agent = build_agent(&keypair, request.description.clone());
        sign_agent(&mut agent, &keypair);
        let created = ctx.gateway().create_agent(&agent).await?;
        ctx.remember_opt(created.address.as_ref());

        let public_key = keypair.public_key();
        ctx.set_identity(created.id, keypair)?;
        ctx.record_recent(
            created.id,
            EntityKind::Agent,
            created.description.as_deref().unwrap_or("agent"),
        )?;
        tracing::info!(agent_id = %created.id, fingerprint = %public_key.fingerprint(), "agent registered");

        Ok(json!({
            "agent": created,
            "fingerprint": public_key.fingerprint(),
            "config_path": ctx.config_path(),
            "already_registered": false,
        }))
    }

    pub(super) async fn get_agent(&self, request: GetAgentRequest) -> Result<Value> {
        let ctx = self.context();
        let agent_id = match request.agent_id {
            Some(id) => id,
            None => ctx.agent_id()?,
        };
        let agent = ctx.gateway().get_agent(agent_id).await?;
        ctx.remember_opt(agent.address.as_ref());
        Ok(json!({ "agent": agent }))
    }

    /// Set one entry of our trust map, re-sign and publish the next version.
    pub(super) async fn set_agent_trust(&self, request: SetAgentTrustRequest) -> Result<Value> {
        let ctx = self.context();
        let keypair = ctx.keypair()?;
        let own_id = ctx.agent_id()?;
        let trust = check_trust(request.trust_level)?;
        let confidence = check_confidence(request.confidence.unwrap_or(DEFAULT_TRUST_CONFIDENCE))?;

        let current = ctx.gateway().get_agent(own_id).await?;
        let mut updated = build_trust_update(current, request.agent_id, trust, confidence)?;
        sign_agent(&mut updated, &keypair);
        let stored = ctx.gateway().update_agent(&updated).await?;
        ctx.remember_opt(stored.address.as_ref());
        tracing::debug!(peer = %request.agent_id, trust, version = stored.version, "trust map updated");

        Ok(json!({
            "agent": stored,
            "peer": request.agent_id,
            "trust": trust,
            "confidence": confidence,
        }))
    }

    pub(super) async fn estimate_trust(&self, request: EstimateTrustRequest) -> Result<Value> {
        let ctx = self.context();
        let observer_id = match request.observer {
            Some(id) => id,
            None => ctx.agent_id()?,
        };
        let observer = ctx.gateway().get_agent(observer_id).await?;
        let target = ctx.gateway().get_agent(request.target).await?;
        Ok(json!({ "estimate": estimate_trust(&observer, &target) }))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Projects
    // ─────────────────────────────────────────────────────────────────────

    pub(super) async fn create_project(&self, request: CreateProjectRequest) -> Result<Value> {
        let ctx = self.context();
        let keypair = ctx.keypair()?;
        let mut project = build_project(ctx, &request).await?;
        sign_project(&mut project, &keypair);
        let created = ctx.gateway().create_project(&project).await?;
        ctx.record_recent(created.id, EntityKind::Project, &created.name)?;
        if request.switch {
            ctx.set_project(created.id)?;
        }
        Ok(json!({ "project": created, "current": request.switch }))
    }

    pub(super) async fn list_projects(&self, request: PageArgs) -> Result<Value> {
        let ctx = self.context();
        let page = ctx.gateway().list_projects(&request.page()).await?;
        let mut result = page_json("projects", page)?;
        result["current_project"] = json!(ctx.current_project());
        Ok(result)
    }

    /// Make an existing project current.
    pub(super) async fn switch_project(&self, request: SwitchProjectRequest) -> Result<Value> {
        let ctx = self.context();
        let project = ctx.gateway().get_project(request.project_id).await?;
        ctx.set_project(project.id)?;
        Ok(json!({ "project": project }))
    }
}
