//! Graph backend abstraction.
//!
//! A backend is any engine that can hold the schema property graph (`Table`
//! and `Column` nodes, `HAS_COLUMN` edges, `REFERENCES` and
//! `SEMANTIC_RELATION` relationship edges) and answer shortest-path and
//! bounded-hop-neighborhood queries over it. The in-process
//! [`super::EmbeddedGraph`] is the default; [`super::CypherBackend`] adapts a
//! remote Neo4j instance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::relationships::{Relationship, RelationshipKind};
use crate::schema_catalog::SchemaSnapshot;

use super::errors::GraphStoreError;

/// One relationship edge as traversed on a path. `from_table`/`to_table`
/// keep the stored direction of the underlying edge, which may differ from
/// the traversal direction; join predicates are symmetric equalities, so
/// consumers only need the column pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEdge {
    pub from_table: String,
    pub from_column: Option<String>,
    pub to_table: String,
    pub to_column: Option<String>,
    pub kind: RelationshipKind,
    pub confidence: f64,
}

impl From<&Relationship> for PathEdge {
    fn from(rel: &Relationship) -> Self {
        Self {
            from_table: rel.from_table.clone(),
            from_column: rel.from_column.clone(),
            to_table: rel.to_table.clone(),
            to_column: rel.to_column.clone(),
            kind: rel.kind,
            confidence: rel.confidence,
        }
    }
}

/// A minimum-hop path between two tables: the hop count plus the ordered
/// relationship edges actually traversed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePath {
    pub distance: u32,
    pub edges: Vec<PathEdge>,
}

/// Node/edge counts after a rebuild, for logging and REPL output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub tables: usize,
    pub columns: usize,
    pub relationship_edges: usize,
}

/// All-pairs shortest-path result keyed by unordered table pair, with the
/// pair stored as (smaller name, larger name). Pairs with no path within the
/// hop bound are absent.
pub type PathMap = BTreeMap<(String, String), TablePath>;

#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Full wipe-and-recreate of the schema graph. Not incremental; runs
    /// once per schema-analysis cycle.
    async fn rebuild(
        &self,
        snapshot: &SchemaSnapshot,
        relationships: &[Relationship],
    ) -> Result<GraphStats, GraphStoreError>;

    /// Minimum-hop paths between every unordered pair of the given tables,
    /// over the undirected view of all relationship edges, bounded by
    /// `max_hops`. Tie-break between equal-length paths: lexicographically
    /// smallest sequence of table names, so results are deterministic.
    async fn shortest_paths(
        &self,
        tables: &[String],
        max_hops: u32,
    ) -> Result<PathMap, GraphStoreError>;

    /// Tables reachable from the seed set within `structural_hops` over
    /// foreign-key/naming edges, or within `semantic_hops` over semantic
    /// edges, excluding the seed set itself. The limits are independent so
    /// weak semantic evidence can be capped tighter.
    async fn neighbors_within(
        &self,
        tables: &[String],
        structural_hops: u32,
        semantic_hops: u32,
    ) -> Result<BTreeSet<String>, GraphStoreError>;
}
