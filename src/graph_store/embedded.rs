//! Embedded in-process graph backend.
//!
//! Holds the schema graph in adjacency maps and answers path queries with a
//! bounded exhaustive search. Schemas in this domain are tens of tables, so
//! exact search with the documented lexicographic tie-break is cheap and
//! keeps results reproducible across runs. This backend is the default when
//! no remote graph engine is configured, and the fixture backend for tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::RwLock;

use crate::relationships::{Relationship, RelationshipKind};
use crate::schema_catalog::SchemaSnapshot;

use super::backend::{GraphBackend, GraphStats, PathEdge, PathMap, TablePath};
use super::errors::GraphStoreError;

#[derive(Debug, Default)]
struct GraphData {
    tables: BTreeSet<String>,
    /// table -> column names (HAS_COLUMN edges)
    columns: BTreeMap<String, Vec<String>>,
    /// Undirected adjacency: node -> (neighbor, stored edge), sorted by
    /// neighbor name
    adjacency: BTreeMap<String, Vec<(String, PathEdge)>>,
    relationship_edges: usize,
}

#[derive(Debug, Default)]
pub struct EmbeddedGraph {
    inner: RwLock<GraphData>,
}

impl EmbeddedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, GraphData>, GraphStoreError> {
        self.inner
            .read()
            .map_err(|_| GraphStoreError::Backend("graph lock poisoned".to_string()))
    }
}

/// Best path found so far: (hop count, table-name sequence, edges).
type Candidate = (u32, Vec<String>, Vec<PathEdge>);

/// Exhaustive bounded search for the minimum-hop path from `start` to
/// `goal`, breaking length ties by the lexicographically smallest table-name
/// sequence.
fn lexicographic_shortest_path(
    data: &GraphData,
    start: &str,
    goal: &str,
    max_hops: u32,
) -> Option<TablePath> {
    if !data.tables.contains(start) || !data.tables.contains(goal) {
        return None;
    }

    let mut best: Option<Candidate> = None;
    let mut tables = vec![start.to_string()];
    let mut edges = Vec::new();
    let mut on_path: BTreeSet<String> = BTreeSet::new();
    on_path.insert(start.to_string());

    walk(
        data, start, goal, max_hops, &mut tables, &mut edges, &mut on_path, &mut best,
    );

    best.map(|(distance, _, edges)| TablePath { distance, edges })
}

#[allow(clippy::too_many_arguments)]
fn walk(
    data: &GraphData,
    current: &str,
    goal: &str,
    max_hops: u32,
    tables: &mut Vec<String>,
    edges: &mut Vec<PathEdge>,
    on_path: &mut BTreeSet<String>,
    best: &mut Option<Candidate>,
) {
    let depth = edges.len() as u32;
    if current == goal {
        let candidate = (depth, tables.clone(), edges.clone());
        let better = match best {
            None => true,
            Some((best_depth, best_tables, _)) => {
                depth < *best_depth || (depth == *best_depth && tables < best_tables)
            }
        };
        if better {
            *best = Some(candidate);
        }
        return;
    }
    if depth >= max_hops {
        return;
    }
    // Any extension of a path already as long as the best is strictly worse.
    if let Some((best_depth, _, _)) = best {
        if depth + 1 > *best_depth {
            return;
        }
    }

    let Some(neighbors) = data.adjacency.get(current) else {
        return;
    };
    for (neighbor, edge) in neighbors {
        if on_path.contains(neighbor) {
            continue;
        }
        tables.push(neighbor.clone());
        edges.push(edge.clone());
        on_path.insert(neighbor.clone());

        walk(data, neighbor, goal, max_hops, tables, edges, on_path, best);

        on_path.remove(neighbor);
        edges.pop();
        tables.pop();
    }
}

/// BFS expansion from the seed set over edges of the given kinds, up to
/// `hops` hops.
fn expand(
    data: &GraphData,
    seeds: &BTreeSet<String>,
    hops: u32,
    kinds: &[RelationshipKind],
) -> BTreeSet<String> {
    let mut reached: BTreeSet<String> = BTreeSet::new();
    let mut visited: BTreeSet<String> = seeds.clone();
    let mut frontier: VecDeque<(String, u32)> =
        seeds.iter().map(|t| (t.clone(), 0)).collect();

    while let Some((table, depth)) = frontier.pop_front() {
        if depth >= hops {
            continue;
        }
        let Some(neighbors) = data.adjacency.get(&table) else {
            continue;
        };
        for (neighbor, edge) in neighbors {
            if !kinds.contains(&edge.kind) || visited.contains(neighbor) {
                continue;
            }
            visited.insert(neighbor.clone());
            reached.insert(neighbor.clone());
            frontier.push_back((neighbor.clone(), depth + 1));
        }
    }

    reached
}

#[async_trait]
impl GraphBackend for EmbeddedGraph {
    async fn rebuild(
        &self,
        snapshot: &SchemaSnapshot,
        relationships: &[Relationship],
    ) -> Result<GraphStats, GraphStoreError> {
        let mut data = GraphData::default();

        for table in snapshot.tables() {
            data.tables.insert(table.name.clone());
            data.columns.insert(
                table.name.clone(),
                table.columns.iter().map(|c| c.name.clone()).collect(),
            );
        }

        for rel in relationships {
            if !data.tables.contains(&rel.from_table) || !data.tables.contains(&rel.to_table) {
                log::warn!("Skipping relationship with unknown endpoint: {}", rel);
                continue;
            }
            let edge = PathEdge::from(rel);
            data.adjacency
                .entry(rel.from_table.clone())
                .or_default()
                .push((rel.to_table.clone(), edge.clone()));
            // Stored directionally, traversable both ways.
            data.adjacency
                .entry(rel.to_table.clone())
                .or_default()
                .push((rel.from_table.clone(), edge));
            data.relationship_edges += 1;
        }

        for neighbors in data.adjacency.values_mut() {
            neighbors.sort_by(|(a, _), (b, _)| a.cmp(b));
        }

        let stats = GraphStats {
            tables: data.tables.len(),
            columns: data.columns.values().map(Vec::len).sum(),
            relationship_edges: data.relationship_edges,
        };

        let mut inner = self
            .inner
            .write()
            .map_err(|_| GraphStoreError::Backend("graph lock poisoned".to_string()))?;
        *inner = data;
        Ok(stats)
    }

    async fn shortest_paths(
        &self,
        tables: &[String],
        max_hops: u32,
    ) -> Result<PathMap, GraphStoreError> {
        let data = self.read()?;
        let mut paths = PathMap::new();

        let mut sorted: Vec<&String> = tables.iter().collect();
        sorted.sort();
        sorted.dedup();

        for (i, a) in sorted.iter().enumerate() {
            for b in sorted.iter().skip(i + 1) {
                if let Some(path) = lexicographic_shortest_path(&data, a, b, max_hops) {
                    paths.insert(((*a).clone(), (*b).clone()), path);
                }
            }
        }

        Ok(paths)
    }

    async fn neighbors_within(
        &self,
        tables: &[String],
        structural_hops: u32,
        semantic_hops: u32,
    ) -> Result<BTreeSet<String>, GraphStoreError> {
        let data = self.read()?;
        let seeds: BTreeSet<String> = tables.iter().cloned().collect();

        let mut reached = expand(
            &data,
            &seeds,
            structural_hops,
            &[RelationshipKind::ForeignKey, RelationshipKind::NamingPattern],
        );
        reached.extend(expand(
            &data,
            &seeds,
            semantic_hops,
            &[RelationshipKind::Semantic],
        ));

        Ok(reached.difference(&seeds).cloned().collect())
    }
}
