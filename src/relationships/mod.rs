pub mod inferrer;
pub mod oracle;
pub mod relationship;

// Re-export commonly used types
pub use inferrer::RelationshipInferrer;
pub use oracle::{LlmSemanticOracle, OracleError, SemanticJudgment, SemanticOracle};
pub use relationship::{Relationship, RelationshipKind};
