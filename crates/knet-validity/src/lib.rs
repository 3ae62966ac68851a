//! # knet Validity
//!
//! Local analyses over the knowledge graph: evidence balance,
//! contradiction discovery, derivation-chain integrity, budgeted context
//! loading, the trust estimate placeholder and transform preset selection.
//!
//! ## Key Types
//!
//! - [`FragmentGraph`] - Read access the analyses need; every
//!   [`knet_gateway::Gateway`] provides it
//! - [`EvidenceBalance`] / [`Verdict`] - Support versus contradiction
//! - [`ChainReport`] - Derivation walk with integrity findings
//! - [`ContextSelection`] - Fragments chosen for a token budget
//! - [`PresetSelection`] - Compression preset for a fragment type
//!
//! ## Findings vs Errors
//!
//! Cycles, missing sources and contested fragments are findings inside the
//! returned reports. Errors are reserved for a missing starting fragment,
//! out-of-range arguments and gateway failures.

pub mod chain;
pub mod context;
pub mod error;
pub mod evidence;
pub mod graph;
pub mod preset;
pub mod trust;

#[cfg(test)]
mod testing;

pub use chain::{
    check_derivation_chain, ChainIssue, ChainIssueKind, ChainNode, ChainReport, ChainValidity,
    DEFAULT_MAX_DEPTH,
};
pub use context::{
    load_context, relevance, select_within_budget, ContextRequest, ContextSelection,
    ScoredFragment, CHARS_PER_TOKEN, FRAGMENT_OVERHEAD_CHARS, SEARCH_LIMIT,
};
pub use error::{Result, ValidityError};
pub use evidence::{
    compute_evidence_balance, evidence_balance, find_contradictions, Contradiction,
    ContradictionSource, EvidenceBalance, Verdict, MISSING_FRAGMENT_CONTENT, VERDICT_THRESHOLD,
};
pub use graph::{FragmentGraph, GraphResult};
pub use preset::{
    decode_instructions, encode_instructions, select_preset, FragmentType, Preset, PresetKey,
    PresetSelection, PressureBand, FALLBACK_PRESET, HIGH_PRESSURE, LOW_PRESSURE,
};
pub use trust::{estimate_trust, TrustEstimate, TrustMethod};
