//! Join-path planning over the relationship graph.
//!
//! Given a required table set, the planner fetches all-pairs shortest paths
//! from the graph store, picks the best-connected table as the anchor, and
//! greedily pulls in the nearest unplaced table until the set is exhausted.
//! The greedy expansion is a Prim-style spanning construction over pairwise
//! path distances: it is an approximation of optimal join ordering (which is
//! NP-hard in general), acceptable at the single-digit to low-tens table
//! counts this domain sees.

use std::collections::BTreeSet;

use crate::graph_store::{PathMap, RelationshipGraphStore};

pub mod errors;
pub mod join_plan;

pub use errors::PlanError;
pub use join_plan::{JoinPlan, JoinPredicate, JoinStep};

pub struct JoinPathPlanner<'a> {
    store: &'a RelationshipGraphStore,
}

impl<'a> JoinPathPlanner<'a> {
    pub fn new(store: &'a RelationshipGraphStore) -> Self {
        Self { store }
    }

    /// Plan a join order connecting the required tables.
    ///
    /// Fails only for an empty input set. Disconnected tables never fail:
    /// they are appended as empty-predicate steps that the caller must treat
    /// as "join manually". Backend failures while fetching the distance map
    /// surface as [`PlanError::Backend`].
    pub async fn plan(&self, required: &BTreeSet<String>) -> Result<JoinPlan, PlanError> {
        if required.is_empty() {
            return Err(PlanError::EmptyTableSet);
        }
        if required.len() == 1 {
            // A lone table needs no join, and no graph round trip either.
            let table = required.iter().next().cloned().unwrap_or_default();
            return Ok(JoinPlan {
                steps: vec![JoinStep::anchor(table)],
            });
        }

        let tables: Vec<String> = required.iter().cloned().collect();
        let paths = self.store.shortest_paths(&tables).await?;
        Ok(assemble_plan(required, &paths))
    }
}

/// Assemble the join sequence from the pairwise path map. Pure, so the
/// greedy construction is testable without a backend.
pub fn assemble_plan(required: &BTreeSet<String>, paths: &PathMap) -> JoinPlan {
    let anchor = choose_anchor(required, paths);
    log::debug!("Join anchor: {}", anchor);

    let mut steps = vec![JoinStep::anchor(anchor.clone())];
    let mut placed: BTreeSet<String> = BTreeSet::from([anchor]);
    let mut remaining: BTreeSet<String> = required.iter().cloned().collect();
    remaining.remove(steps[0].table.as_str());

    while !remaining.is_empty() {
        // Nearest remaining table to *any* placed table. Iteration order is
        // ascending table name on both sides, and only strictly shorter
        // distances replace the current best, so ties resolve by name.
        let mut best: Option<(u32, String, Vec<JoinPredicate>)> = None;
        for candidate in &remaining {
            for placed_table in &placed {
                let key = pair_key(candidate, placed_table);
                let Some(path) = paths.get(&key) else {
                    continue;
                };
                if best.as_ref().is_none_or(|(d, _, _)| path.distance < *d) {
                    best = Some((
                        path.distance,
                        candidate.clone(),
                        oriented_predicates(&key, placed_table, paths),
                    ));
                }
            }
        }

        match best {
            Some((_, table, predicates)) => {
                remaining.remove(&table);
                placed.insert(table.clone());
                steps.push(JoinStep { table, predicates });
            }
            None => {
                // Disconnected remainder: still return a plan, flagged by
                // the empty predicate lists.
                log::warn!(
                    "No path within hop bound for {} table(s); appending unjoined",
                    remaining.len()
                );
                for table in std::mem::take(&mut remaining) {
                    steps.push(JoinStep::anchor(table));
                }
            }
        }
    }

    JoinPlan { steps }
}

/// The table participating in the most connected pairs, ties broken by name
/// ascending. With no connections at all, that degenerates to the smallest
/// table name, which then anchors an all-disconnected plan.
fn choose_anchor(required: &BTreeSet<String>, paths: &PathMap) -> String {
    let mut best_table = String::new();
    let mut best_count = 0usize;
    for table in required {
        let count = paths
            .keys()
            .filter(|(a, b)| a == table || b == table)
            .count();
        if best_table.is_empty() || count > best_count {
            best_table = table.clone();
            best_count = count;
        }
    }
    best_table
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Predicates for the path behind `key`, ordered from the placed side toward
/// the newly added table. Stored paths run from the smaller-named table, so
/// the edge order is reversed when the placed table sits at the far end.
fn oriented_predicates(
    key: &(String, String),
    placed_table: &str,
    paths: &PathMap,
) -> Vec<JoinPredicate> {
    let Some(path) = paths.get(key) else {
        return Vec::new();
    };
    let mut predicates: Vec<JoinPredicate> = path.edges.iter().map(JoinPredicate::from).collect();
    if key.1 == placed_table {
        predicates.reverse();
    }
    predicates
}
