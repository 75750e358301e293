use thiserror::Error;

/// Graph backend failures.
///
/// Both variants are typed distinctly from "no path exists" (which is simply
/// an absent entry in a path-query result): a caller may want to retry a
/// backend failure, but retrying a genuinely disconnected schema is useless.
#[derive(Debug, Error)]
pub enum GraphStoreError {
    #[error("Graph backend error: {0}")]
    Backend(String),

    #[error("Graph query timed out after {0} ms")]
    Timeout(u64),
}
