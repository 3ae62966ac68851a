//! Evidence balance and contradiction discovery.
//!
//! The balance is a plain sum of stated confidences over the relations
//! pointing at a thesis. There is no propagation through the graph and no
//! weighting by the asserting agent's trust.

use serde::{Deserialize, Serialize};

use knet_core::{Fragment, Relation, RelationType, Uuid};
use knet_gateway::RelationQuery;

use crate::error::{Result, ValidityError};
use crate::graph::FragmentGraph;

/// A net score strictly above this is well supported; strictly below its
/// negation is contested.
pub const VERDICT_THRESHOLD: f64 = 0.5;

/// Content shown for a contradicting fragment that no longer resolves.
pub const MISSING_FRAGMENT_CONTENT: &str = "[Fragment not found]";

/// Overall reading of an evidence balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    WellSupported,
    Contested,
    Neutral,
}

impl Verdict {
    /// Verdict for a net score.
    pub fn from_net(net: f64) -> Self {
        if net > VERDICT_THRESHOLD {
            Verdict::WellSupported
        } else if net < -VERDICT_THRESHOLD {
            Verdict::Contested
        } else {
            Verdict::Neutral
        }
    }
}

/// Support versus contradiction for one thesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBalance {
    pub thesis: Uuid,
    pub support_score: f64,
    pub contradict_score: f64,
    pub net_score: f64,
    pub supporting: usize,
    pub contradicting: usize,
    pub verdict: Verdict,
}

/// Sum SUPPORTS and CONTRADICTS confidences over edges whose `to` is
/// `thesis`. Other relation types and edges elsewhere are ignored.
pub fn compute_evidence_balance(thesis: Uuid, relations: &[Relation]) -> EvidenceBalance {
    let mut support_score = 0.0;
    let mut contradict_score = 0.0;
    let mut supporting = 0;
    let mut contradicting = 0;

    for relation in relations.iter().filter(|r| r.to.entity == thesis) {
        match relation.relation_type {
            RelationType::Supports => {
                support_score += relation.confidence();
                supporting += 1;
            }
            RelationType::Contradicts => {
                contradict_score += relation.confidence();
                contradicting += 1;
            }
            _ => {}
        }
    }

    let net_score = support_score - contradict_score;
    EvidenceBalance {
        thesis,
        support_score,
        contradict_score,
        net_score,
        supporting,
        contradicting,
        verdict: Verdict::from_net(net_score),
    }
}

/// Fetch the incoming relations of `thesis` and compute its balance.
pub async fn evidence_balance<G: FragmentGraph + ?Sized>(
    graph: &G,
    thesis: Uuid,
) -> Result<EvidenceBalance> {
    let relations = graph.relations(RelationQuery::incoming(thesis, None)).await?;
    Ok(compute_evidence_balance(thesis, &relations))
}

/// How the source of a contradiction resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContradictionSource {
    Resolved { fragment: Box<Fragment> },
    /// The gateway answered not-found; shown with placeholder content.
    NotFound { id: Uuid },
}

/// A CONTRADICTS edge into the queried fragment, with its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    pub relation: Relation,
    pub source: ContradictionSource,
}

impl Contradiction {
    /// Source content, or the placeholder when it did not resolve.
    pub fn content(&self) -> &str {
        match &self.source {
            ContradictionSource::Resolved { fragment } => &fragment.content,
            ContradictionSource::NotFound { .. } => MISSING_FRAGMENT_CONTENT,
        }
    }

    /// Whether the source fragment was found.
    pub fn is_resolved(&self) -> bool {
        matches!(self.source, ContradictionSource::Resolved { .. })
    }
}

/// Every fragment that contradicts `fragment`.
///
/// A source that is not found degrades to a placeholder; any other error
/// aborts.
pub async fn find_contradictions<G: FragmentGraph + ?Sized>(
    graph: &G,
    fragment: Uuid,
) -> Result<Vec<Contradiction>> {
    let relations = graph
        .relations(RelationQuery::incoming(fragment, Some(RelationType::Contradicts)))
        .await?;

    let mut found = Vec::with_capacity(relations.len());
    for relation in relations {
        let source_id = relation.from.entity;
        let source = match graph.fragment(source_id).await {
            Ok(source) => ContradictionSource::Resolved {
                fragment: Box::new(source),
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    %fragment,
                    source = %source_id,
                    "contradicting fragment not found, using placeholder"
                );
                ContradictionSource::NotFound { id: source_id }
            }
            Err(e) => return Err(ValidityError::Gateway(e)),
        };
        found.push(Contradiction { relation, source });
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{relation, MapGraph};

    #[test]
    fn test_balance_sums_confidences() {
        let thesis = Uuid::new_v4();
        let relations = vec![
            relation(Uuid::new_v4(), thesis, RelationType::Supports, Some(0.9)),
            relation(Uuid::new_v4(), thesis, RelationType::Supports, Some(0.4)),
            relation(Uuid::new_v4(), thesis, RelationType::Contradicts, Some(0.3)),
            relation(Uuid::new_v4(), thesis, RelationType::RelatedTo, Some(1.0)),
            // Points elsewhere.
            relation(thesis, Uuid::new_v4(), RelationType::Supports, Some(1.0)),
        ];
        let balance = compute_evidence_balance(thesis, &relations);
        assert!((balance.support_score - 1.3).abs() < 1e-9);
        assert!((balance.contradict_score - 0.3).abs() < 1e-9);
        assert!((balance.net_score - 1.0).abs() < 1e-9);
        assert_eq!(balance.supporting, 2);
        assert_eq!(balance.contradicting, 1);
        assert_eq!(balance.verdict, Verdict::WellSupported);
    }

    #[test]
    fn test_missing_confidence_counts_as_default() {
        let thesis = Uuid::new_v4();
        let relations = vec![relation(Uuid::new_v4(), thesis, RelationType::Contradicts, None)];
        let balance = compute_evidence_balance(thesis, &relations);
        assert_eq!(balance.contradict_score, 0.5);
        assert_eq!(balance.net_score, -0.5);
        // Exactly -0.5 is not below the threshold.
        assert_eq!(balance.verdict, Verdict::Neutral);
    }

    #[test]
    fn test_verdict_boundaries() {
        assert_eq!(Verdict::from_net(0.5), Verdict::Neutral);
        assert_eq!(Verdict::from_net(0.500001), Verdict::WellSupported);
        assert_eq!(Verdict::from_net(-0.5), Verdict::Neutral);
        assert_eq!(Verdict::from_net(-0.500001), Verdict::Contested);
        assert_eq!(Verdict::from_net(0.0), Verdict::Neutral);
    }

    #[test]
    fn test_exact_half_support_is_neutral() {
        let thesis = Uuid::new_v4();
        let relations = vec![
            relation(Uuid::new_v4(), thesis, RelationType::Supports, Some(0.75)),
            relation(Uuid::new_v4(), thesis, RelationType::Contradicts, Some(0.25)),
        ];
        let balance = compute_evidence_balance(thesis, &relations);
        assert_eq!(balance.net_score, 0.5);
        assert_eq!(balance.verdict, Verdict::Neutral);
    }

    #[test]
    fn test_empty_is_neutral() {
        let balance = compute_evidence_balance(Uuid::new_v4(), &[]);
        assert_eq!(balance.net_score, 0.0);
        assert_eq!(balance.verdict, Verdict::Neutral);
    }

    #[tokio::test]
    async fn test_contradictions_degrade_missing_source() {
        let mut graph = MapGraph::default();
        let thesis = graph.add("the earth is flat");
        let rebuttal = graph.add("satellite imagery shows curvature");
        let ghost = Uuid::new_v4();
        graph.link(rebuttal, thesis, RelationType::Contradicts, 0.9);
        graph.link(ghost, thesis, RelationType::Contradicts, 0.4);
        graph.link(Uuid::new_v4(), thesis, RelationType::Supports, 0.2);

        let found = find_contradictions(&graph, thesis).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].is_resolved());
        assert_eq!(found[0].content(), "satellite imagery shows curvature");
        assert_eq!(found[1].source, ContradictionSource::NotFound { id: ghost });
        assert_eq!(found[1].content(), MISSING_FRAGMENT_CONTENT);
    }

    #[tokio::test]
    async fn test_contradictions_propagate_other_errors() {
        let mut graph = MapGraph::default();
        let thesis = graph.add("claim");
        let broken = graph.add("unreachable source");
        graph.link(broken, thesis, RelationType::Contradicts, 0.5);
        graph.fail_on(broken);

        let err = find_contradictions(&graph, thesis).await.unwrap_err();
        assert!(matches!(err, ValidityError::Gateway(_)));
    }
}
