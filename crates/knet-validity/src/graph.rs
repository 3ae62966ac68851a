//! Read-only view of the fragment graph used by the analyses.
//!
//! Every [`Gateway`] is a [`FragmentGraph`]; tests can supply a plain map.

use async_trait::async_trait;

use knet_core::{Fragment, Relation, Uuid};
use knet_gateway::{collect_pages, Gateway, RelationQuery, SearchQuery, DEFAULT_MAX_PAGES};

/// Result type for graph reads.
pub type GraphResult<T> = std::result::Result<T, knet_gateway::GatewayError>;

/// Fragment and relation lookups.
#[async_trait]
pub trait FragmentGraph: Send + Sync {
    /// Fetch one fragment. Missing fragments are
    /// [`knet_gateway::GatewayError::NotFound`].
    async fn fragment(&self, id: Uuid) -> GraphResult<Fragment>;

    /// All relations matching `query`, across pages.
    async fn relations(&self, query: RelationQuery) -> GraphResult<Vec<Relation>>;

    /// First page of a fragment search.
    async fn search(&self, query: &SearchQuery) -> GraphResult<Vec<Fragment>>;
}

#[async_trait]
impl<G: Gateway + ?Sized> FragmentGraph for G {
    async fn fragment(&self, id: Uuid) -> GraphResult<Fragment> {
        self.get_fragment(id).await
    }

    async fn relations(&self, query: RelationQuery) -> GraphResult<Vec<Relation>> {
        collect_pages(DEFAULT_MAX_PAGES, |cursor| {
            let mut page_query = query.clone();
            page_query.page.cursor = cursor;
            async move { self.query_relations(&page_query).await }
        })
        .await
    }

    async fn search(&self, query: &SearchQuery) -> GraphResult<Vec<Fragment>> {
        Ok(self.search_fragments(query).await?.items)
    }
}
