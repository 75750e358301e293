//! The relationship graph store: a thin adapter that owns a backend and
//! enforces the query-timeout policy.
//!
//! `rebuild` is exclusive relative to queries. The REPL owns the store
//! outright; deployments that share one store across tasks must wrap it in
//! `tokio::sync::RwLock` (write for rebuild, read for queries) so a planner
//! never observes a partially-wiped graph.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::relationships::Relationship;
use crate::schema_catalog::SchemaSnapshot;

use super::backend::{GraphBackend, GraphStats, PathMap};
use super::errors::GraphStoreError;

pub struct RelationshipGraphStore {
    backend: Arc<dyn GraphBackend>,
    max_hops: u32,
    query_timeout: Duration,
}

impl RelationshipGraphStore {
    pub fn new(backend: Arc<dyn GraphBackend>, max_hops: u32, query_timeout: Duration) -> Self {
        Self {
            backend,
            max_hops,
            query_timeout,
        }
    }

    pub fn max_hops(&self) -> u32 {
        self.max_hops
    }

    /// Wipe and recreate the graph from a fresh snapshot. Runs once per
    /// schema-analysis cycle, unbounded by the query timeout.
    pub async fn rebuild(
        &self,
        snapshot: &SchemaSnapshot,
        relationships: &[Relationship],
    ) -> Result<GraphStats, GraphStoreError> {
        let stats = self.backend.rebuild(snapshot, relationships).await?;
        log::info!(
            "Graph rebuilt: {} tables, {} columns, {} relationship edges",
            stats.tables,
            stats.columns,
            stats.relationship_edges
        );
        Ok(stats)
    }

    /// All-pairs shortest paths over the given tables, bounded by the
    /// configured hop count and timeout. A timeout is a backend failure, not
    /// "no path": callers may retry it.
    pub async fn shortest_paths(&self, tables: &[String]) -> Result<PathMap, GraphStoreError> {
        self.bounded(self.backend.shortest_paths(tables, self.max_hops))
            .await
    }

    /// Tables reachable from the seed set, with independent structural and
    /// semantic hop caps.
    pub async fn neighbors_within(
        &self,
        tables: &[String],
        structural_hops: u32,
        semantic_hops: u32,
    ) -> Result<BTreeSet<String>, GraphStoreError> {
        self.bounded(
            self.backend
                .neighbors_within(tables, structural_hops, semantic_hops),
        )
        .await
    }

    async fn bounded<T>(
        &self,
        query: impl std::future::Future<Output = Result<T, GraphStoreError>>,
    ) -> Result<T, GraphStoreError> {
        tokio::time::timeout(self.query_timeout, query)
            .await
            .map_err(|_| GraphStoreError::Timeout(self.query_timeout.as_millis() as u64))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_store::EmbeddedGraph;
    use crate::relationships::Relationship;
    use crate::schema_catalog::TableSchema;

    fn snapshot(names: &[&str]) -> SchemaSnapshot {
        SchemaSnapshot::new(
            names
                .iter()
                .map(|n| TableSchema {
                    name: n.to_string(),
                    comment: String::new(),
                    primary_keys: vec![],
                    columns: vec![],
                    foreign_keys: vec![],
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_store_respects_max_hops() {
        let store = RelationshipGraphStore::new(
            Arc::new(EmbeddedGraph::new()),
            2,
            Duration::from_secs(5),
        );
        let snap = snapshot(&["a", "b", "c", "d"]);
        let rels = vec![
            Relationship::foreign_key("b", "a_id", "a", "a_id"),
            Relationship::foreign_key("c", "b_id", "b", "b_id"),
            Relationship::foreign_key("d", "c_id", "c", "c_id"),
        ];
        store.rebuild(&snap, &rels).await.unwrap();

        let paths = store
            .shortest_paths(&["a".to_string(), "c".to_string(), "d".to_string()])
            .await
            .unwrap();
        // a-c is 2 hops (within bound), a-d is 3 (beyond it).
        assert!(paths.contains_key(&("a".to_string(), "c".to_string())));
        assert!(!paths.contains_key(&("a".to_string(), "d".to_string())));
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_typed_error() {
        struct SlowBackend;

        #[async_trait::async_trait]
        impl GraphBackend for SlowBackend {
            async fn rebuild(
                &self,
                _snapshot: &SchemaSnapshot,
                _relationships: &[Relationship],
            ) -> Result<GraphStats, GraphStoreError> {
                Ok(GraphStats::default())
            }

            async fn shortest_paths(
                &self,
                _tables: &[String],
                _max_hops: u32,
            ) -> Result<PathMap, GraphStoreError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(PathMap::new())
            }

            async fn neighbors_within(
                &self,
                _tables: &[String],
                _structural_hops: u32,
                _semantic_hops: u32,
            ) -> Result<BTreeSet<String>, GraphStoreError> {
                Ok(BTreeSet::new())
            }
        }

        let store =
            RelationshipGraphStore::new(Arc::new(SlowBackend), 3, Duration::from_millis(10));
        let err = store
            .shortest_paths(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, GraphStoreError::Timeout(_)));
    }
}
