//! Derivation chain integrity.
//!
//! A DERIVED_FROM relation points from the derived fragment (`from`) to its
//! source (`to`). Starting at a fragment, the chain is walked depth-first
//! with an explicit stack:
//!
//! - a source reached again while still on the current path is a
//!   `circular_dependency`; that branch stops there
//! - a source that is not found is a `missing_reference`; siblings continue
//! - a source already fully explored through another path is not walked twice
//! - fragments at `max_depth` are kept but their sources are not fetched
//!
//! Findings are data. Only a missing starting fragment or a gateway failure
//! is an error.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use knet_core::{FragmentState, RelationType, Uuid};
use knet_gateway::RelationQuery;

use crate::error::{Result, ValidityError};
use crate::graph::FragmentGraph;

/// Depth used when the caller does not choose one.
pub const DEFAULT_MAX_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainIssueKind {
    CircularDependency,
    MissingReference,
}

/// An integrity problem on the edge `fragment -> reference`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainIssue {
    pub kind: ChainIssueKind,
    pub fragment: Uuid,
    pub reference: Uuid,
    pub depth: usize,
}

/// A fragment reached during the walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainNode {
    pub id: Uuid,
    pub depth: usize,
    pub parent: Option<Uuid>,
    pub state: FragmentState,
    pub confidence: f64,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainValidity {
    Valid,
    /// Structurally sound, but some fragment in the chain is contested.
    Contested,
    Broken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainReport {
    pub root: Uuid,
    pub max_depth: usize,
    pub nodes: Vec<ChainNode>,
    pub issues: Vec<ChainIssue>,
    /// Some fragment sat at `max_depth`, so the walk may be incomplete.
    pub depth_limited: bool,
    pub validity: ChainValidity,
}

impl ChainReport {
    fn classify(&self) -> ChainValidity {
        if !self.issues.is_empty() {
            ChainValidity::Broken
        } else if self.nodes.iter().any(|n| n.state == FragmentState::Contested) {
            ChainValidity::Contested
        } else {
            ChainValidity::Valid
        }
    }
}

struct Frame {
    id: Uuid,
    depth: usize,
    sources: Vec<Uuid>,
    next: usize,
}

enum Step {
    Visit { parent: Uuid, child: Uuid, depth: usize },
    Finish,
}

/// Walk the derivation chain below `root`.
pub async fn check_derivation_chain<G: FragmentGraph + ?Sized>(
    graph: &G,
    root: Uuid,
    max_depth: usize,
) -> Result<ChainReport> {
    let root_fragment = match graph.fragment(root).await {
        Ok(f) => f,
        Err(e) if e.is_not_found() => return Err(ValidityError::RootNotFound(root)),
        Err(e) => return Err(e.into()),
    };

    let mut report = ChainReport {
        root,
        max_depth,
        nodes: Vec::new(),
        issues: Vec::new(),
        depth_limited: false,
        validity: ChainValidity::Valid,
    };
    let mut on_path = HashSet::new();
    let mut done = HashSet::new();
    let mut stack = Vec::new();

    report.nodes.push(ChainNode {
        id: root,
        depth: 0,
        parent: None,
        state: root_fragment.state,
        confidence: root_fragment.confidence(),
        content: root_fragment.content,
    });
    on_path.insert(root);
    stack.push(Frame {
        id: root,
        depth: 0,
        sources: sources_of(graph, root, 0, max_depth, &mut report).await?,
        next: 0,
    });

    loop {
        let step = match stack.last_mut() {
            None => break,
            Some(frame) if frame.next < frame.sources.len() => {
                let child = frame.sources[frame.next];
                frame.next += 1;
                Step::Visit {
                    parent: frame.id,
                    child,
                    depth: frame.depth + 1,
                }
            }
            Some(_) => Step::Finish,
        };

        match step {
            Step::Finish => {
                if let Some(frame) = stack.pop() {
                    on_path.remove(&frame.id);
                    done.insert(frame.id);
                }
            }
            Step::Visit { parent, child, depth } => {
                if on_path.contains(&child) {
                    tracing::debug!(%parent, %child, "derivation cycle");
                    report.issues.push(ChainIssue {
                        kind: ChainIssueKind::CircularDependency,
                        fragment: parent,
                        reference: child,
                        depth,
                    });
                    continue;
                }
                if done.contains(&child) {
                    continue;
                }

                let fragment = match graph.fragment(child).await {
                    Ok(f) => f,
                    Err(e) if e.is_not_found() => {
                        tracing::warn!(%parent, missing = %child, "derivation source not found");
                        report.issues.push(ChainIssue {
                            kind: ChainIssueKind::MissingReference,
                            fragment: parent,
                            reference: child,
                            depth,
                        });
                        done.insert(child);
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                report.nodes.push(ChainNode {
                    id: child,
                    depth,
                    parent: Some(parent),
                    state: fragment.state,
                    confidence: fragment.confidence(),
                    content: fragment.content,
                });
                on_path.insert(child);
                let sources = sources_of(graph, child, depth, max_depth, &mut report).await?;
                stack.push(Frame {
                    id: child,
                    depth,
                    sources,
                    next: 0,
                });
            }
        }
    }

    report.validity = report.classify();
    Ok(report)
}

/// Distinct DERIVED_FROM sources of `id`, in relation order. Empty at the
/// depth limit.
async fn sources_of<G: FragmentGraph + ?Sized>(
    graph: &G,
    id: Uuid,
    depth: usize,
    max_depth: usize,
    report: &mut ChainReport,
) -> Result<Vec<Uuid>> {
    if depth >= max_depth {
        report.depth_limited = true;
        return Ok(Vec::new());
    }
    let relations = graph
        .relations(RelationQuery::outgoing(id, Some(RelationType::DerivedFrom)))
        .await?;
    let mut seen = HashSet::new();
    Ok(relations
        .into_iter()
        .map(|r| r.to.entity)
        .filter(|source| seen.insert(*source))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MapGraph;

    fn derive(graph: &mut MapGraph, derived: Uuid, source: Uuid) {
        graph.link(derived, source, RelationType::DerivedFrom, 1.0);
    }

    #[tokio::test]
    async fn test_linear_chain_is_valid() {
        let mut graph = MapGraph::default();
        let a = graph.add("conclusion");
        let b = graph.add("lemma");
        let c = graph.add("axiom");
        derive(&mut graph, a, b);
        derive(&mut graph, b, c);

        let report = check_derivation_chain(&graph, a, DEFAULT_MAX_DEPTH).await.unwrap();
        assert_eq!(report.validity, ChainValidity::Valid);
        assert_eq!(report.nodes.len(), 3);
        assert_eq!(report.nodes[2].id, c);
        assert_eq!(report.nodes[2].depth, 2);
        assert_eq!(report.nodes[2].parent, Some(b));
        assert!(report.issues.is_empty());
        assert!(!report.depth_limited);
    }

    #[tokio::test]
    async fn test_cycle_is_reported_once_and_terminates() {
        let mut graph = MapGraph::default();
        let a = graph.add("A");
        let b = graph.add("B");
        derive(&mut graph, a, b);
        derive(&mut graph, b, a);

        let report = check_derivation_chain(&graph, a, DEFAULT_MAX_DEPTH).await.unwrap();
        assert_eq!(report.validity, ChainValidity::Broken);
        assert_eq!(
            report.issues,
            vec![ChainIssue {
                kind: ChainIssueKind::CircularDependency,
                fragment: b,
                reference: a,
                depth: 2,
            }]
        );
        assert_eq!(report.nodes.len(), 2);
    }

    #[tokio::test]
    async fn test_three_node_cycle_recorded_on_closing_edge() {
        let mut graph = MapGraph::default();
        let a = graph.add("A");
        let b = graph.add("B");
        let c = graph.add("C");
        derive(&mut graph, a, b);
        derive(&mut graph, b, c);
        derive(&mut graph, c, a);

        let report = check_derivation_chain(&graph, a, DEFAULT_MAX_DEPTH).await.unwrap();
        assert_eq!(report.validity, ChainValidity::Broken);
        assert_eq!(
            report.issues,
            vec![ChainIssue {
                kind: ChainIssueKind::CircularDependency,
                fragment: c,
                reference: a,
                depth: 3,
            }]
        );
        let visited: Vec<Uuid> = report.nodes.iter().map(|n| n.id).collect();
        assert_eq!(visited, vec![a, b, c]);
    }

    #[tokio::test]
    async fn test_self_derivation_is_a_cycle() {
        let mut graph = MapGraph::default();
        let a = graph.add("self-justifying");
        derive(&mut graph, a, a);

        let report = check_derivation_chain(&graph, a, 5).await.unwrap();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, ChainIssueKind::CircularDependency);
    }

    #[tokio::test]
    async fn test_diamond_is_not_a_cycle() {
        let mut graph = MapGraph::default();
        let top = graph.add("top");
        let left = graph.add("left");
        let right = graph.add("right");
        let base = graph.add("base");
        derive(&mut graph, top, left);
        derive(&mut graph, top, right);
        derive(&mut graph, left, base);
        derive(&mut graph, right, base);

        let report = check_derivation_chain(&graph, top, DEFAULT_MAX_DEPTH).await.unwrap();
        assert_eq!(report.validity, ChainValidity::Valid);
        // base is visited through left only.
        assert_eq!(report.nodes.iter().filter(|n| n.id == base).count(), 1);
    }

    #[tokio::test]
    async fn test_missing_reference_keeps_siblings() {
        let mut graph = MapGraph::default();
        let a = graph.add("claim");
        let ghost = Uuid::new_v4();
        let real = graph.add("real source");
        derive(&mut graph, a, ghost);
        derive(&mut graph, a, real);

        let report = check_derivation_chain(&graph, a, DEFAULT_MAX_DEPTH).await.unwrap();
        assert_eq!(report.validity, ChainValidity::Broken);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, ChainIssueKind::MissingReference);
        assert_eq!(report.issues[0].reference, ghost);
        assert!(report.nodes.iter().any(|n| n.id == real));
    }

    #[tokio::test]
    async fn test_depth_limit_is_not_an_error() {
        let mut graph = MapGraph::default();
        let ids: Vec<Uuid> = (0..5).map(|i| graph.add(&format!("step {i}"))).collect();
        for pair in ids.windows(2) {
            derive(&mut graph, pair[0], pair[1]);
        }

        let report = check_derivation_chain(&graph, ids[0], 2).await.unwrap();
        assert_eq!(report.validity, ChainValidity::Valid);
        assert_eq!(report.nodes.len(), 3);
        assert!(report.depth_limited);
        assert!(report.nodes.iter().all(|n| n.depth <= 2));
    }

    #[tokio::test]
    async fn test_contested_member_marks_chain_contested() {
        let mut graph = MapGraph::default();
        let a = graph.add("derived");
        let b = graph.add("disputed source");
        derive(&mut graph, a, b);
        graph.set_state(b, FragmentState::Contested);

        let report = check_derivation_chain(&graph, a, DEFAULT_MAX_DEPTH).await.unwrap();
        assert_eq!(report.validity, ChainValidity::Contested);
    }

    #[tokio::test]
    async fn test_missing_root_is_error() {
        let graph = MapGraph::default();
        let root = Uuid::new_v4();
        let err = check_derivation_chain(&graph, root, 3).await.unwrap_err();
        assert!(matches!(err, ValidityError::RootNotFound(id) if id == root));
    }

    #[tokio::test]
    async fn test_deep_chain_does_not_recurse() {
        let mut graph = MapGraph::default();
        let ids: Vec<Uuid> = (0..2000).map(|i| graph.add(&format!("n{i}"))).collect();
        for pair in ids.windows(2) {
            derive(&mut graph, pair[0], pair[1]);
        }
        let report = check_derivation_chain(&graph, ids[0], 5000).await.unwrap();
        assert_eq!(report.nodes.len(), 2000);
        assert_eq!(report.validity, ChainValidity::Valid);
    }
}
