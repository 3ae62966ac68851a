//! Signable payloads and entity signatures.
//!
//! Each entity kind has an explicit allow-list of signed fields with fixed
//! defaults for optional ones. The payload also carries the entity `kind`
//! and the [`SCHEMA_VERSION`], then goes through [`canonicalize`].
//!
//! Verification always rebuilds the payload from the entity's own fields.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::canonical::{canonicalize, KIND_KEY, SCHEMA_VERSION, SCHEMA_VERSION_KEY};
use crate::crypto::{Keypair, PublicKey};
use crate::entity::{
    Agent, EntityKind, EvidenceType, Fragment, Project, Relation, Tag, Transform, TrustVote,
    DEFAULT_CONFIDENCE,
};

/// An entity that can be signed over a canonical payload.
pub trait Signable {
    /// The kind recorded in the payload.
    const KIND: EntityKind;

    /// The signed fields, with defaults applied. Must not include the
    /// signature itself.
    fn signable_fields(&self) -> Map<String, Value>;

    /// The current detached signature, if any.
    fn signature(&self) -> Option<&str>;

    /// Replace the detached signature.
    fn set_signature(&mut self, signature: String);
}

/// Render a timestamp the way payloads carry it.
pub fn payload_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Build the canonical signable payload for an entity.
pub fn signable_payload<E: Signable>(entity: &E) -> String {
    let mut fields = entity.signable_fields();
    fields.insert(KIND_KEY.to_string(), json!(E::KIND.as_str()));
    fields.insert(SCHEMA_VERSION_KEY.to_string(), json!(SCHEMA_VERSION));
    canonicalize(&Value::Object(fields))
}

/// Sign an entity in place and return the signature.
pub fn sign_entity<E: Signable>(entity: &mut E, keypair: &Keypair) -> String {
    let signature = keypair.sign(signable_payload(entity).as_bytes());
    entity.set_signature(signature.clone());
    signature
}

/// Verify an entity's signature against a public key.
///
/// False when the entity is unsigned, the signature is malformed, or any
/// signed field changed after signing.
pub fn verify_entity<E: Signable>(entity: &E, public_key: &PublicKey) -> bool {
    match entity.signature() {
        Some(signature) => public_key
            .verify(signable_payload(entity).as_bytes(), signature)
            .is_ok(),
        None => false,
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    // Addresses, enums and maps of plain data always serialize.
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn object(pairs: Vec<(&str, Value)>) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

impl Signable for Fragment {
    const KIND: EntityKind = EntityKind::Fragment;

    fn signable_fields(&self) -> Map<String, Value> {
        object(vec![
            ("content", json!(self.content)),
            ("creator", to_value(&self.creator)),
            ("timestamp", json!(payload_timestamp(&self.timestamp))),
            ("tags", to_value(&self.tags)),
            ("transform", to_value(&self.transform)),
            ("confidence", json!(self.confidence.unwrap_or(DEFAULT_CONFIDENCE))),
            (
                "evidence_type",
                json!(self.evidence_type.unwrap_or(EvidenceType::Unknown).as_str()),
            ),
        ])
    }

    fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: String) {
        self.signature = Some(signature);
    }
}

impl Signable for Relation {
    const KIND: EntityKind = EntityKind::Relation;

    fn signable_fields(&self) -> Map<String, Value> {
        object(vec![
            ("from", to_value(&self.from)),
            ("to", to_value(&self.to)),
            ("by", to_value(&self.by)),
            ("type", json!(self.relation_type.as_str())),
            ("content", json!(self.content.as_deref().unwrap_or(""))),
            ("confidence", json!(self.confidence.unwrap_or(DEFAULT_CONFIDENCE))),
            ("timestamp", json!(payload_timestamp(&self.timestamp))),
        ])
    }

    fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: String) {
        self.signature = Some(signature);
    }
}

impl Signable for Tag {
    const KIND: EntityKind = EntityKind::Tag;

    fn signable_fields(&self) -> Map<String, Value> {
        object(vec![
            ("name", json!(self.name)),
            ("category", json!(self.category.as_str())),
            ("content", json!(self.content.as_deref().unwrap_or(""))),
            ("creator", to_value(&self.creator)),
            ("timestamp", json!(payload_timestamp(&self.timestamp))),
        ])
    }

    fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: String) {
        self.signature = Some(signature);
    }
}

impl Signable for Transform {
    const KIND: EntityKind = EntityKind::Transform;

    fn signable_fields(&self) -> Map<String, Value> {
        object(vec![
            ("name", json!(self.name)),
            ("description", json!(self.description)),
            ("source_format", json!(self.source_format)),
            ("target_format", json!(self.target_format)),
            ("additional_data", Value::Object(self.additional_data.clone())),
            ("tags", to_value(&self.tags)),
            ("agent", to_value(&self.agent)),
            ("timestamp", json!(payload_timestamp(&self.timestamp))),
        ])
    }

    fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: String) {
        self.signature = Some(signature);
    }
}

impl Signable for Agent {
    const KIND: EntityKind = EntityKind::Agent;

    fn signable_fields(&self) -> Map<String, Value> {
        object(vec![
            ("public_key", json!(self.public_key)),
            ("description", json!(self.description.as_deref().unwrap_or(""))),
            ("trust", to_value(&self.trust)),
            ("timestamp", json!(payload_timestamp(&self.timestamp))),
        ])
    }

    fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: String) {
        self.signature = Some(signature);
    }
}

impl Signable for TrustVote {
    const KIND: EntityKind = EntityKind::TrustVote;

    fn signable_fields(&self) -> Map<String, Value> {
        object(vec![
            ("voter", to_value(&self.voter)),
            ("target", json!(self.target.to_string())),
            ("vote_type", json!(self.vote_type.as_str())),
            ("comment", json!(self.comment.as_deref().unwrap_or(""))),
            ("timestamp", json!(payload_timestamp(&self.timestamp))),
        ])
    }

    fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: String) {
        self.signature = Some(signature);
    }
}

impl Signable for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn signable_fields(&self) -> Map<String, Value> {
        object(vec![
            ("name", json!(self.name)),
            ("description", json!(self.description.as_deref().unwrap_or(""))),
            ("owner", to_value(&self.owner)),
            ("default_tags", to_value(&self.default_tags)),
            ("visibility", json!(self.visibility.as_str())),
            ("timestamp", json!(payload_timestamp(&self.timestamp))),
        ])
    }

    fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: String) {
        self.signature = Some(signature);
    }
}

/// Per-kind `<kind>_signable_payload`, `sign_<kind>` and `verify_<kind>`.
macro_rules! kind_wrappers {
    ($($ty:ty => $payload:ident, $sign:ident, $verify:ident;)+) => {
        $(
            #[doc = concat!("Canonical signable payload of a `", stringify!($ty), "`.")]
            pub fn $payload(entity: &$ty) -> String {
                signable_payload(entity)
            }

            #[doc = concat!("Sign a `", stringify!($ty), "` in place.")]
            pub fn $sign(entity: &mut $ty, keypair: &Keypair) -> String {
                sign_entity(entity, keypair)
            }

            #[doc = concat!("Verify a `", stringify!($ty), "` signature.")]
            pub fn $verify(entity: &$ty, public_key: &PublicKey) -> bool {
                verify_entity(entity, public_key)
            }
        )+
    };
}

kind_wrappers! {
    Fragment => fragment_signable_payload, sign_fragment, verify_fragment;
    Relation => relation_signable_payload, sign_relation, verify_relation;
    Tag => tag_signable_payload, sign_tag, verify_tag;
    Transform => transform_signable_payload, sign_transform, verify_transform;
    Agent => agent_signable_payload, sign_agent, verify_agent;
    TrustVote => trust_vote_signable_payload, sign_trust_vote, verify_trust_vote;
    Project => project_signable_payload, sign_project, verify_project;
}
