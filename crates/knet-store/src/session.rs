//! Short-lived session state.
//!
//! Holds the entities touched recently (for "what did I just create?"
//! follow-ups) and a tag-name cache so repeated references to the same tag
//! name do not each cost a gateway lookup. Tag names expire after a TTL.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use knet_core::{name_key, EntityKind, Uuid};

/// Number of recent entities retained.
pub const RECENT_LIMIT: usize = 20;

/// Default lifetime of a cached tag name, in seconds.
pub const DEFAULT_TAG_TTL_SECS: i64 = 300;

/// An entity created or fetched during this session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEntity {
    pub id: Uuid,
    pub kind: EntityKind,
    /// Short human label (name or content preview).
    pub label: String,
    pub at: DateTime<Utc>,
}

/// A cached tag name resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagNameEntry {
    pub id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Session state persisted between tool calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub recent: VecDeque<RecentEntity>,
    #[serde(default)]
    pub tag_names: HashMap<String, TagNameEntry>,
}

impl SessionState {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recently used entity, newest first. A repeated id moves to
    /// the front instead of appearing twice.
    pub fn record(&mut self, id: Uuid, kind: EntityKind, label: impl Into<String>, at: DateTime<Utc>) {
        self.recent.retain(|e| e.id != id);
        self.recent.push_front(RecentEntity {
            id,
            kind,
            label: preview(&label.into(), 80),
            at,
        });
        self.recent.truncate(RECENT_LIMIT);
    }

    /// Recent entities, optionally filtered by kind.
    pub fn recent_of(&self, kind: Option<EntityKind>) -> Vec<&RecentEntity> {
        self.recent
            .iter()
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .collect()
    }

    /// Cache a tag name for `ttl_secs`.
    pub fn cache_tag(&mut self, name: &str, id: Uuid, now: DateTime<Utc>, ttl_secs: i64) {
        self.tag_names.insert(
            name_key(name),
            TagNameEntry {
                id,
                expires_at: now + Duration::seconds(ttl_secs),
            },
        );
    }

    /// Look up a cached tag name. Expired entries are dropped.
    pub fn lookup_tag(&mut self, name: &str, now: DateTime<Utc>) -> Option<Uuid> {
        let key = name_key(name);
        match self.tag_names.get(&key) {
            Some(entry) if entry.expires_at > now => Some(entry.id),
            Some(_) => {
                self.tag_names.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Drop all expired tag names.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.tag_names.retain(|_, entry| entry.expires_at > now);
    }
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max).collect();
        out.push('…');
        out
    }
}
