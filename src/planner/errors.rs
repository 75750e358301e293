use thiserror::Error;

use crate::graph_store::GraphStoreError;

#[derive(Debug, Error)]
pub enum PlanError {
    /// The only input condition that aborts planning outright.
    #[error("Cannot plan a join over an empty table set")]
    EmptyTableSet,

    /// The graph backend failed or timed out while fetching pairwise paths.
    /// Distinct from a genuinely disconnected schema, which yields a degraded
    /// plan instead of an error; backend failures are worth retrying.
    #[error("Graph backend failure while planning: {0}")]
    Backend(#[from] GraphStoreError),
}
