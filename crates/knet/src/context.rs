//! Shared state handed to every tool call.
//!
//! The context owns the configuration, signing key, address cache and
//! session state. All of it sits behind `std::sync` locks that are only
//! held for short, synchronous sections and never across an `.await`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use knet_core::{Address, Domain, EntityKind, Keypair, PublicKey, Uuid};
use knet_gateway::Gateway;
use knet_store::{
    AddressCache, JsonFileStore, MemoryStateStore, RecentEntity, SessionState, StateStore,
};

use crate::config::{Config, LoadedConfig};
use crate::error::{KnetError, Result};

/// Context shared by all tool calls.
pub struct ToolContext<G: Gateway> {
    gateway: Arc<G>,
    config: RwLock<Config>,
    config_path: Option<PathBuf>,
    keypair: RwLock<Option<Keypair>>,
    cache: Mutex<AddressCache>,
    session: Mutex<SessionState>,
    state_store: Box<dyn StateStore>,
}

impl<G: Gateway> ToolContext<G> {
    /// Build a context from loaded configuration. Session state comes from
    /// the configured state file, or memory when none is set.
    pub fn from_config(loaded: LoadedConfig, gateway: Arc<G>) -> Result<Self> {
        let store: Box<dyn StateStore> = match &loaded.config.session.state_file {
            Some(path) => Box::new(JsonFileStore::new(path.clone())),
            None => Box::new(MemoryStateStore::new()),
        };
        Self::new(loaded.config, loaded.write_path, gateway, store)
    }

    /// Build a context with an explicit state store.
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        gateway: Arc<G>,
        state_store: Box<dyn StateStore>,
    ) -> Result<Self> {
        let keypair = match &config.identity.private_key {
            Some(seed) => {
                let keypair = Keypair::from_base64(seed)?;
                if let Some(expected) = &config.identity.public_key {
                    let expected = PublicKey::from_base64(expected)?;
                    if expected != keypair.public_key() {
                        return Err(KnetError::Config(
                            "configured public key does not match the private key".to_string(),
                        ));
                    }
                }
                Some(keypair)
            }
            None => None,
        };

        let mut session = state_store.load()?;
        session.purge_expired(Utc::now());

        Ok(Self {
            gateway,
            cache: Mutex::new(AddressCache::new(config.session.cache_capacity)),
            config: RwLock::new(config),
            config_path,
            keypair: RwLock::new(keypair),
            session: Mutex::new(session),
            state_store,
        })
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Config {
        read(&self.config).clone()
    }

    /// Where configuration updates are written, if anywhere.
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    // ─── Identity ────────────────────────────────────────────────────

    /// The registered agent.
    pub fn agent_id(&self) -> Result<Uuid> {
        read(&self.config)
            .identity
            .agent_id
            .ok_or_else(|| KnetError::precondition("no agent is registered", "register_agent"))
    }

    /// The signing key.
    pub fn keypair(&self) -> Result<Keypair> {
        read(&self.keypair)
            .clone()
            .ok_or_else(|| KnetError::precondition("no signing key is configured", "register_agent"))
    }

    /// The signing key if one is configured.
    pub fn existing_keypair(&self) -> Option<Keypair> {
        read(&self.keypair).clone()
    }

    /// Address of the registered agent.
    pub fn agent_address(&self) -> Result<Address> {
        let id = self.agent_id()?;
        Ok(self.resolve(id, Domain::Agent))
    }

    /// Agent id and key together; both are needed to sign.
    pub fn signer(&self) -> Result<(Address, Keypair)> {
        let keypair = self.keypair()?;
        let address = self.agent_address()?;
        Ok((address, keypair))
    }

    /// Adopt a registered identity and persist it.
    pub fn set_identity(&self, agent_id: Uuid, keypair: Keypair) -> Result<()> {
        {
            let mut config = write(&self.config);
            config.identity.agent_id = Some(agent_id);
            config.identity.private_key = Some(keypair.seed_base64());
            config.identity.public_key = Some(keypair.public_key().to_base64());
        }
        *write(&self.keypair) = Some(keypair);
        tracing::info!(%agent_id, "agent identity set");
        self.save_config()
    }

    // ─── Project ─────────────────────────────────────────────────────

    pub fn current_project(&self) -> Option<Uuid> {
        read(&self.config).session.project
    }

    /// The explicit project, else the current one.
    pub fn project_or_current(&self, explicit: Option<Uuid>) -> Result<Uuid> {
        explicit
            .or_else(|| self.current_project())
            .ok_or_else(|| KnetError::precondition("no project is selected", "switch_project"))
    }

    /// Switch the current project and persist it.
    pub fn set_project(&self, project: Uuid) -> Result<()> {
        write(&self.config).session.project = Some(project);
        tracing::info!(%project, "switched project");
        self.save_config()
    }

    fn save_config(&self) -> Result<()> {
        match &self.config_path {
            Some(path) => read(&self.config).save(path),
            None => Ok(()),
        }
    }

    // ─── Addresses ───────────────────────────────────────────────────

    pub fn hub_host(&self) -> Option<String> {
        read(&self.config).gateway.hub_host.clone()
    }

    /// Resolve an entity id through the cache.
    pub fn resolve(&self, id: Uuid, domain: Domain) -> Address {
        let hub = self.hub_host();
        lock(&self.cache).resolve(id, domain, hub.as_deref())
    }

    /// Cache a gateway-reported address.
    pub fn remember(&self, address: &Address) {
        lock(&self.cache).put(address.entity, address.clone());
    }

    /// Cache the address if the gateway reported one.
    pub fn remember_opt(&self, address: Option<&Address>) {
        if let Some(address) = address {
            self.remember(address);
        }
    }

    pub fn cached_addresses(&self) -> usize {
        lock(&self.cache).len()
    }

    // ─── Session ─────────────────────────────────────────────────────

    /// Record a created entity in the session and persist it.
    pub fn record_recent(&self, id: Uuid, kind: EntityKind, label: &str) -> Result<()> {
        let mut session = lock(&self.session);
        session.record(id, kind, label, Utc::now());
        self.state_store.save(&session)?;
        Ok(())
    }

    pub fn recent(&self, kind: Option<EntityKind>) -> Vec<RecentEntity> {
        lock(&self.session).recent_of(kind).into_iter().cloned().collect()
    }

    /// Cached tag id for a name, if still fresh.
    pub fn lookup_tag(&self, name: &str) -> Option<Uuid> {
        lock(&self.session).lookup_tag(name, Utc::now())
    }

    /// Cache a tag name for the configured TTL.
    pub fn cache_tag(&self, name: &str, id: Uuid) -> Result<()> {
        let ttl = read(&self.config).session.tag_ttl_secs;
        let mut session = lock(&self.session);
        session.cache_tag(name, id, Utc::now(), ttl);
        self.state_store.save(&session)?;
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use knet_gateway::MemoryGateway;

    fn context(config: Config, path: Option<PathBuf>) -> ToolContext<MemoryGateway> {
        ToolContext::new(
            config,
            path,
            Arc::new(MemoryGateway::default()),
            Box::new(MemoryStateStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_preconditions_name_remedy() {
        let ctx = context(Config::default(), None);
        match ctx.agent_id().unwrap_err() {
            KnetError::Precondition { remedy, .. } => assert_eq!(remedy, "register_agent"),
            other => panic!("unexpected: {other:?}"),
        }
        match ctx.project_or_current(None).unwrap_err() {
            KnetError::Precondition { remedy, .. } => assert_eq!(remedy, "switch_project"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(ctx.keypair().is_err());
    }

    #[test]
    fn test_mismatched_public_key_rejected() {
        let mut config = Config::default();
        config.identity.private_key = Some(Keypair::from_seed(&[1; 32]).seed_base64());
        config.identity.public_key = Some(Keypair::from_seed(&[2; 32]).public_key().to_base64());
        let result = ToolContext::new(
            config,
            None,
            Arc::new(MemoryGateway::default()),
            Box::new(MemoryStateStore::new()),
        );
        assert!(matches!(result, Err(KnetError::Config(_))));
    }

    #[test]
    fn test_identity_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".knet/config.toml");
        let ctx = context(Config::default(), Some(path.clone()));
        let keypair = Keypair::from_seed(&[3; 32]);
        let agent = Uuid::new_v4();

        ctx.set_identity(agent, keypair.clone()).unwrap();
        ctx.set_project(Uuid::nil()).unwrap();

        let saved = Config::from_file(&path).unwrap();
        assert_eq!(saved.identity.agent_id, Some(agent));
        assert_eq!(saved.identity.private_key, Some(keypair.seed_base64()));
        assert_eq!(saved.session.project, Some(Uuid::nil()));
        assert_eq!(ctx.keypair().unwrap().public_key(), keypair.public_key());
    }

    #[test]
    fn test_resolve_uses_hub_until_confirmed() {
        let mut config = Config::default();
        config.gateway.hub_host = Some("configured:1".into());
        let ctx = context(config, None);
        let id = Uuid::new_v4();

        assert_eq!(ctx.resolve(id, Domain::Tag).host_port, "configured:1");
        ctx.remember(&Address::new("actual:2", Domain::Tag, id));
        assert_eq!(ctx.resolve(id, Domain::Tag).host_port, "actual:2");
    }

    #[test]
    fn test_tag_cache_roundtrip() {
        let ctx = context(Config::default(), None);
        let id = Uuid::new_v4();
        assert_eq!(ctx.lookup_tag("biology"), None);
        ctx.cache_tag("Biology", id).unwrap();
        assert_eq!(ctx.lookup_tag("biology"), Some(id));
    }
}
