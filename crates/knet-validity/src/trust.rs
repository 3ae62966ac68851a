//! Trust estimate between two agents.
//!
//! This is a placeholder, not a propagation algorithm. An observer's own
//! trust-map entry is used when present; otherwise the target's reputation
//! in [0, 1] is rescaled linearly to [-1, 1] with zero confidence.

use serde::{Deserialize, Serialize};

use knet_core::{Agent, Uuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustMethod {
    /// The observer's own trust-map entry.
    Direct,
    /// `2 * reputation - 1`.
    ReputationRescale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustEstimate {
    pub observer: Uuid,
    pub target: Uuid,
    pub trust: f64,
    pub confidence: f64,
    pub method: TrustMethod,
    /// Always true for the rescale method: no trust path was computed.
    pub placeholder: bool,
}

/// Estimate how much `observer` trusts `target`.
pub fn estimate_trust(observer: &Agent, target: &Agent) -> TrustEstimate {
    if let Some(entry) = observer.trust.get(&target.id) {
        return TrustEstimate {
            observer: observer.id,
            target: target.id,
            trust: entry.trust,
            confidence: entry.confidence,
            method: TrustMethod::Direct,
            placeholder: false,
        };
    }

    let reputation = target.reputation.clamp(0.0, 1.0);
    tracing::debug!(
        observer = %observer.id,
        target = %target.id,
        reputation,
        "no direct trust entry, rescaling reputation"
    );
    TrustEstimate {
        observer: observer.id,
        target: target.id,
        trust: 2.0 * reputation - 1.0,
        confidence: 0.0,
        method: TrustMethod::ReputationRescale,
        placeholder: true,
    }
}
