pub mod backend;
pub mod cypher;
pub mod embedded;
pub mod errors;
pub mod store;

// Re-export commonly used types
pub use backend::{GraphBackend, GraphStats, PathEdge, PathMap, TablePath};
pub use cypher::CypherBackend;
pub use embedded::EmbeddedGraph;
pub use errors::GraphStoreError;
pub use store::RelationshipGraphStore;
