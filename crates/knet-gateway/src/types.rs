//! Request and response shapes shared by every gateway implementation.

use std::future::Future;

use serde::{Deserialize, Serialize};

use knet_core::{FragmentState, RelationType, TagCategory, Uuid};

use crate::error::Result;

/// Default page size when a query does not set one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on pages drained by [`collect_pages`] unless told otherwise.
pub const DEFAULT_MAX_PAGES: usize = 50;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque cursor for the next page; `None` on the last page.
    #[serde(default)]
    pub next_cursor: Option<String>,
    /// Total matching items, if the gateway reports it.
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// A single, final page.
    pub fn last(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        Self {
            items,
            next_cursor: None,
            total: Some(total),
        }
    }
}

/// Cursor pagination parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl PageRequest {
    /// First page with the given size.
    pub fn first(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            cursor: None,
        }
    }
}

/// Fragment search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free text; empty matches everything.
    #[serde(default)]
    pub query: String,
    /// Every listed tag must be present on a match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<FragmentState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl SearchQuery {
    /// Search for `text` with a page size.
    pub fn text(text: impl Into<String>, limit: u32) -> Self {
        Self {
            query: text.into(),
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// Which end of a relation the queried entity sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Relations whose `from` is the entity.
    Source,
    /// Relations whose `to` is the entity.
    Target,
    #[default]
    Both,
}

impl Direction {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Source => "source",
            Direction::Target => "target",
            Direction::Both => "both",
        }
    }
}

/// Relation lookup around one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationQuery {
    pub entity: Uuid,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<RelationType>,
    #[serde(flatten)]
    pub page: PageRequest,
}

impl RelationQuery {
    /// Relations pointing at `entity`.
    pub fn incoming(entity: Uuid, relation_type: Option<RelationType>) -> Self {
        Self {
            entity,
            direction: Direction::Target,
            relation_type,
            page: PageRequest::default(),
        }
    }

    /// Relations leaving `entity`.
    pub fn outgoing(entity: Uuid, relation_type: Option<RelationType>) -> Self {
        Self {
            entity,
            direction: Direction::Source,
            relation_type,
            page: PageRequest::default(),
        }
    }

    /// Query-string pairs for HTTP transports.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("entity", self.entity.to_string()),
            ("direction", self.direction.as_str().to_string()),
        ];
        if let Some(t) = self.relation_type {
            params.push(("type", t.as_str().to_string()));
        }
        push_page(&mut params, &self.page);
        params
    }
}

/// Tag lookup by name and/or category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TagCategory>,
    #[serde(flatten)]
    pub page: PageRequest,
}

impl TagQuery {
    /// Exact (case-insensitive) name lookup.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Query-string pairs for HTTP transports.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(name) = &self.name {
            params.push(("name", name.clone()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.as_str().to_string()));
        }
        push_page(&mut params, &self.page);
        params
    }
}

/// Query-string pairs for a bare page request.
pub fn page_params(page: &PageRequest) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    push_page(&mut params, page);
    params
}

fn push_page(params: &mut Vec<(&'static str, String)>, page: &PageRequest) {
    if let Some(limit) = page.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(cursor) = &page.cursor {
        params.push(("cursor", cursor.clone()));
    }
}

/// Coarse load level reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureLevel {
    Normal,
    Warning,
    Critical,
}

/// Resource pressure signal as reported in response headers.
///
/// `level` is kept verbatim so unknown levels still reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePressure {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ResourcePressure {
    /// Header carrying the level.
    pub const LEVEL_HEADER: &'static str = "x-resource-pressure";
    /// Header carrying the free-text hint.
    pub const HINT_HEADER: &'static str = "x-resource-pressure-hint";

    /// Parsed level, if recognized.
    pub fn severity(&self) -> Option<PressureLevel> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(PressureLevel::Normal),
            "warning" => Some(PressureLevel::Warning),
            "critical" => Some(PressureLevel::Critical),
            _ => None,
        }
    }

    /// Anything other than a recognized `normal`.
    pub fn is_elevated(&self) -> bool {
        self.severity() != Some(PressureLevel::Normal)
    }
}

/// Gateway health probe result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Drain cursor pagination into one vector.
///
/// `fetch` receives the cursor for the next page (`None` first). Stops on
/// the last page or after `max_pages` pages, whichever comes first.
pub async fn collect_pages<T, F, Fut>(max_pages: usize, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor = None;
    for _ in 0..max_pages {
        let page = fetch(cursor.take()).await?;
        items.extend(page.items);
        match page.next_cursor {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => return Ok(items),
        }
    }
    tracing::debug!(max_pages, collected = items.len(), "page cap reached");
    Ok(items)
}
