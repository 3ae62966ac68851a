//! # knet Core
//!
//! Pure primitives for the knowledge network adapter: federated addresses,
//! entities, canonical payloads and Ed25519 signatures.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Address`] - Federated `(host_port, domain, entity)` identifier
//! - [`Fragment`], [`Relation`], [`Tag`], [`Transform`], [`Agent`],
//!   [`TrustVote`], [`Project`] - Signed entities
//! - [`Keypair`] / [`PublicKey`] - Ed25519 key material (base64 on the wire)
//! - [`Signable`] - Allow-listed canonical payload per entity kind
//!
//! ## Canonicalization
//!
//! Everything that gets signed goes through [`canonicalize`]. See the
//! [`canonical`] module for the frozen rules.

pub mod address;
pub mod canonical;
pub mod crypto;
pub mod entity;
pub mod error;
pub mod signing;

pub use address::{Address, Domain};
pub use canonical::{canonicalize, canonicalize_serialize, SCHEMA_VERSION};
pub use crypto::{generate_keypair, sign, verify, Keypair, PublicKey};
pub use entity::{
    check_confidence, check_trust, name_key, names_match, Agent, AgentProfile, EntityKind,
    EvidenceType, Fragment, FragmentState, Project, Relation, RelationType, Tag, TagCategory,
    Transform, TrustEntry, TrustSummary, TrustVote, VoteType, Visibility, DEFAULT_CONFIDENCE,
    DEFAULT_REPUTATION,
};
pub use error::{CoreError, Result, ValidationError};
pub use signing::{
    agent_signable_payload, fragment_signable_payload, payload_timestamp,
    project_signable_payload, relation_signable_payload, sign_agent, sign_entity, sign_fragment,
    sign_project, sign_relation, sign_tag, sign_transform, sign_trust_vote, signable_payload,
    tag_signable_payload, transform_signable_payload, trust_vote_signable_payload, verify_agent,
    verify_entity, verify_fragment, verify_project, verify_relation, verify_tag,
    verify_transform, verify_trust_vote, Signable,
};

pub use uuid::Uuid;
