//! Federated addresses.
//!
//! Every entity in the network is named by `(host_port, domain, entity)`.
//! An empty `host_port` is a local reference; anything else names the hub
//! that holds the entity. The string form is `{host_port}/{DOMAIN}/{uuid}`,
//! so local addresses start with `/`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// The kind of entity an address points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
    Agent,
    Tag,
    Fragment,
    Relation,
    Transformation,
    Hub,
}

impl Domain {
    /// All domains, in declaration order.
    pub const ALL: [Domain; 6] = [
        Domain::Agent,
        Domain::Tag,
        Domain::Fragment,
        Domain::Relation,
        Domain::Transformation,
        Domain::Hub,
    ];

    /// Wire name of the domain.
    pub const fn as_str(self) -> &'static str {
        match self {
            Domain::Agent => "AGENT",
            Domain::Tag => "TAG",
            Domain::Fragment => "FRAGMENT",
            Domain::Relation => "RELATION",
            Domain::Transformation => "TRANSFORMATION",
            Domain::Hub => "HUB",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "domain",
                value: s.to_string(),
            })
    }
}

/// A federated entity address.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// `host:port` of the owning hub, empty for local references.
    #[serde(default)]
    pub host_port: String,
    /// What kind of entity this is.
    pub domain: Domain,
    /// The entity's UUID.
    pub entity: Uuid,
}

impl Address {
    /// Create an address.
    pub fn new(host_port: impl Into<String>, domain: Domain, entity: Uuid) -> Self {
        Self {
            host_port: host_port.into(),
            domain,
            entity,
        }
    }

    /// Create a locally-scoped address.
    pub fn local(domain: Domain, entity: Uuid) -> Self {
        Self::new(String::new(), domain, entity)
    }

    /// Whether this is a local (not hub-qualified) reference.
    pub fn is_local(&self) -> bool {
        self.host_port.is_empty()
    }

    /// Parse from the string form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        s.parse()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host_port, self.domain, self.entity)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| CoreError::MalformedAddress {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        // host_port may not contain '/', so the last two separators are ours.
        let mut parts = s.rsplitn(3, '/');
        let entity = parts.next().ok_or_else(|| malformed("missing entity"))?;
        let domain = parts.next().ok_or_else(|| malformed("missing domain"))?;
        let host_port = parts.next().ok_or_else(|| malformed("missing host segment"))?;

        if host_port.contains('/') {
            return Err(malformed("host_port must not contain '/'"));
        }

        let domain: Domain = domain.parse().map_err(|_| malformed("unknown domain"))?;
        let entity = Uuid::parse_str(entity).map_err(|_| malformed("entity is not a UUID"))?;

        Ok(Self::new(host_port, domain, entity))
    }
}
