//! fedgrid placement: which nodes may host a workload, and how good
//! each one is.
//!
//! Both halves are pure functions of (nodes, workload). Committing a
//! placement is the scheduler's job (`fedgrid-scheduler`).
//!
//! # Components
//!
//! - **`filter`**: Hard constraints (status, capacity, provider, region, residency, labels)
//! - **`scorer`**: Weighted scoring (resources, load, region, provider, edge latency)

pub mod filter;
pub mod scorer;

pub use filter::{Rejection, evaluate, filter_candidates};
pub use scorer::{NodeScore, ScoreBreakdown, ScoredNode, ScoringWeights, rank_candidates, score_node};
