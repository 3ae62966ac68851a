//! Relevance-ranked context loading under a token budget.
//!
//! Tokens are estimated at four characters each, and every accepted
//! fragment is charged a fixed overhead for its framing. Selection is
//! greedy in relevance order and stops at the first fragment that does not
//! fit; smaller fragments further down are not tried.

use serde::{Deserialize, Serialize};

use knet_core::{check_confidence, Fragment, Uuid};
use knet_gateway::SearchQuery;

use crate::error::Result;
use crate::graph::FragmentGraph;

/// Fragments requested from search before filtering.
pub const SEARCH_LIMIT: u32 = 50;

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Characters charged per fragment on top of its content.
pub const FRAGMENT_OVERHEAD_CHARS: usize = 100;

/// Parameters for [`load_context`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRequest {
    pub task: String,
    pub token_budget: usize,
    pub min_confidence: f64,
    #[serde(default)]
    pub project: Option<Uuid>,
}

/// A fragment with its relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFragment {
    pub fragment: Fragment,
    pub relevance: f64,
}

/// Outcome of a context selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSelection {
    pub fragments: Vec<ScoredFragment>,
    /// Candidates returned by search.
    pub considered: usize,
    /// Candidates at or above the confidence floor.
    pub eligible: usize,
    pub used_chars: usize,
    pub budget_chars: usize,
    /// Stopped early because the next fragment did not fit.
    pub truncated: bool,
}

impl ContextSelection {
    /// Estimated tokens consumed.
    pub fn estimated_tokens(&self) -> usize {
        self.used_chars.div_ceil(CHARS_PER_TOKEN)
    }
}

/// Trust mapped to [0, 1], scaled by stated confidence.
pub fn relevance(fragment: &Fragment) -> f64 {
    ((fragment.trust_score() + 1.0) / 2.0) * fragment.confidence()
}

/// Rank `candidates` and keep as many as fit in `token_budget`.
pub fn select_within_budget(
    candidates: Vec<Fragment>,
    token_budget: usize,
    min_confidence: f64,
) -> ContextSelection {
    let considered = candidates.len();
    let mut scored: Vec<ScoredFragment> = candidates
        .into_iter()
        .filter(|f| f.confidence() >= min_confidence)
        .map(|fragment| ScoredFragment {
            relevance: relevance(&fragment),
            fragment,
        })
        .collect();
    let eligible = scored.len();
    // Stable: ties keep search order.
    scored.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

    let budget_chars = token_budget.saturating_mul(CHARS_PER_TOKEN);
    let mut used_chars = 0usize;
    let mut truncated = false;
    let mut accepted = Vec::new();
    for candidate in scored {
        let cost = candidate.fragment.content.chars().count() + FRAGMENT_OVERHEAD_CHARS;
        if used_chars + cost > budget_chars {
            truncated = true;
            break;
        }
        used_chars += cost;
        accepted.push(candidate);
    }

    ContextSelection {
        fragments: accepted,
        considered,
        eligible,
        used_chars,
        budget_chars,
        truncated,
    }
}

/// Search for `request.task` and select fragments within the budget.
pub async fn load_context<G: FragmentGraph + ?Sized>(
    graph: &G,
    request: &ContextRequest,
) -> Result<ContextSelection> {
    check_confidence(request.min_confidence)?;

    let mut query = SearchQuery::text(request.task.clone(), SEARCH_LIMIT);
    query.project = request.project;
    let candidates = graph.search(&query).await?;

    let selection = select_within_budget(candidates, request.token_budget, request.min_confidence);
    tracing::debug!(
        considered = selection.considered,
        selected = selection.fragments.len(),
        used_chars = selection.used_chars,
        budget_chars = selection.budget_chars,
        "context loaded"
    );
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidityError;
    use crate::testing::{fragment, MapGraph};
    use knet_core::TrustSummary;

    fn scored(content: &str, confidence: f64, trust: f64) -> Fragment {
        let mut f = fragment(content);
        f.confidence = Some(confidence);
        f.trust_summary = Some(TrustSummary {
            score: trust,
            ..TrustSummary::default()
        });
        f
    }

    #[test]
    fn test_relevance_formula() {
        assert_eq!(relevance(&scored("x", 0.8, 1.0)), 0.8);
        assert_eq!(relevance(&scored("x", 0.8, -1.0)), 0.0);
        assert_eq!(relevance(&scored("x", 0.5, 0.0)), 0.25);
        // No summary counts as neutral trust, no confidence as the default.
        assert_eq!(relevance(&fragment("x")), 0.25);
    }

    #[test]
    fn test_orders_by_relevance_and_filters() {
        let candidates = vec![
            scored("low", 0.6, -0.5),
            scored("too unsure", 0.2, 1.0),
            scored("high", 0.9, 0.8),
            scored("mid", 0.7, 0.0),
        ];
        let selection = select_within_budget(candidates, 10_000, 0.5);
        let order: Vec<&str> = selection
            .fragments
            .iter()
            .map(|s| s.fragment.content.as_str())
            .collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
        assert_eq!(selection.considered, 4);
        assert_eq!(selection.eligible, 3);
        assert!(!selection.truncated);
    }

    #[test]
    fn test_ties_keep_search_order() {
        let candidates = vec![scored("first", 0.5, 0.0), scored("second", 0.5, 0.0)];
        let selection = select_within_budget(candidates, 1_000, 0.0);
        assert_eq!(selection.fragments[0].fragment.content, "first");
        assert_eq!(selection.fragments[1].fragment.content, "second");
    }

    #[test]
    fn test_budget_stops_at_first_misfit() {
        // Budget 100 tokens = 400 chars.
        let big = "b".repeat(250); // 350 with overhead
        let huge = "h".repeat(300); // 400 with overhead
        let tiny = "t".repeat(10); // 110 with overhead
        let candidates = vec![
            scored(&big, 1.0, 1.0),
            scored(&huge, 0.9, 1.0),
            scored(&tiny, 0.1, 1.0),
        ];
        let selection = select_within_budget(candidates, 100, 0.0);
        assert_eq!(selection.fragments.len(), 1);
        assert_eq!(selection.used_chars, 350);
        assert_eq!(selection.budget_chars, 400);
        assert!(selection.truncated);
        // tiny would fit but comes after the misfit.
        assert!(selection.fragments.iter().all(|s| s.fragment.content != tiny));
    }

    #[test]
    fn test_exact_fit_is_accepted() {
        let content = "x".repeat(300); // 400 with overhead
        let selection = select_within_budget(vec![scored(&content, 1.0, 0.0)], 100, 0.0);
        assert_eq!(selection.fragments.len(), 1);
        assert_eq!(selection.used_chars, 400);
        assert_eq!(selection.estimated_tokens(), 100);
    }

    #[test]
    fn test_zero_budget_selects_nothing() {
        let selection = select_within_budget(vec![scored("x", 1.0, 1.0)], 0, 0.0);
        assert!(selection.fragments.is_empty());
        assert!(selection.truncated);
    }

    #[test]
    fn test_multibyte_content_counts_characters() {
        let content = "é".repeat(300);
        let selection = select_within_budget(vec![scored(&content, 1.0, 0.0)], 100, 0.0);
        assert_eq!(selection.used_chars, 400);
    }

    #[tokio::test]
    async fn test_load_context_rejects_bad_floor() {
        let graph = MapGraph::default();
        let request = ContextRequest {
            task: "anything".into(),
            token_budget: 100,
            min_confidence: 1.5,
            project: None,
        };
        assert!(matches!(
            load_context(&graph, &request).await,
            Err(ValidityError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_load_context_uses_search() {
        let mut graph = MapGraph::default();
        graph.scored("kept", 0.9, 0.5);
        graph.scored("dropped", 0.1, 0.5);
        let request = ContextRequest {
            task: "k".into(),
            token_budget: 1_000,
            min_confidence: 0.3,
            project: None,
        };
        let selection = load_context(&graph, &request).await.unwrap();
        assert_eq!(selection.fragments.len(), 1);
        assert_eq!(selection.fragments[0].fragment.content, "kept");
    }

    proptest::proptest! {
        #[test]
        fn prop_selection_fits_budget_and_is_sorted(
            items in proptest::collection::vec((0usize..600, 0.0f64..=1.0, -1.0f64..=1.0), 0..30),
            budget in 0usize..2_000,
        ) {
            let candidates = items
                .iter()
                .map(|(len, conf, trust)| scored(&"a".repeat(*len), *conf, *trust))
                .collect();
            let selection = select_within_budget(candidates, budget, 0.2);
            proptest::prop_assert!(selection.used_chars <= selection.budget_chars);
            proptest::prop_assert!(selection
                .fragments
                .windows(2)
                .all(|w| w[0].relevance >= w[1].relevance));
            proptest::prop_assert!(selection.fragments.iter().all(|s| s.fragment.confidence() >= 0.2));
        }
    }
}
