//! Join plan types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph_store::PathEdge;

/// One column-equality predicate connecting a step's table (via the path it
/// was reached on) to tables already placed in the plan. Semantic edges have
/// no column pair; consumers must treat such predicates as "join manually".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinPredicate {
    pub from_table: String,
    pub from_column: Option<String>,
    pub to_table: String,
    pub to_column: Option<String>,
    pub confidence: f64,
}

impl From<&PathEdge> for JoinPredicate {
    fn from(edge: &PathEdge) -> Self {
        Self {
            from_table: edge.from_table.clone(),
            from_column: edge.from_column.clone(),
            to_table: edge.to_table.clone(),
            to_column: edge.to_column.clone(),
            confidence: edge.confidence,
        }
    }
}

impl fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.from_column, &self.to_column) {
            (Some(from), Some(to)) => write!(
                f,
                "{}.{} = {}.{} (confidence {:.2})",
                self.from_table, from, self.to_table, to, self.confidence
            ),
            _ => write!(
                f,
                "{} ~ {} (semantic, confidence {:.2})",
                self.from_table, self.to_table, self.confidence
            ),
        }
    }
}

/// One table added to the plan, with the predicates connecting it to the
/// tables placed before it. The anchor (first step) has no predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinStep {
    pub table: String,
    pub predicates: Vec<JoinPredicate>,
}

impl JoinStep {
    pub fn anchor(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            predicates: Vec::new(),
        }
    }
}

/// The ordered join sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JoinPlan {
    pub steps: Vec<JoinStep>,
}

impl JoinPlan {
    /// False when any non-anchor step carries no predicates: those tables
    /// could not be connected within the hop bound and joining them risks a
    /// cross join. Degraded, not an error.
    pub fn is_fully_connected(&self) -> bool {
        self.steps.iter().skip(1).all(|s| !s.predicates.is_empty())
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.table.as_str())
    }
}

impl fmt::Display for JoinPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, step.table)?;
            for predicate in &step.predicates {
                writeln!(f, "   - {}", predicate)?;
            }
            if i > 0 && step.predicates.is_empty() {
                writeln!(f, "   - (no known connection; cross join risk)")?;
            }
        }
        Ok(())
    }
}
