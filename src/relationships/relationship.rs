//! The central edge type of the relationship graph.
//!
//! All three evidence sources (declared foreign keys, naming conventions,
//! semantic judgments) produce the same [`Relationship`] shape, tagged by
//! [`RelationshipKind`], so the graph and path algorithms stay
//! source-agnostic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence assigned to naming-convention matches.
pub const NAMING_PATTERN_CONFIDENCE: f64 = 0.7;

/// Ceiling for semantic confidence. The top of the range is reserved for
/// certain evidence (declared foreign keys).
pub const SEMANTIC_CONFIDENCE_CEILING: f64 = 0.9;

/// Floor for semantic confidence.
pub const SEMANTIC_CONFIDENCE_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    ForeignKey,
    NamingPattern,
    Semantic,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::ForeignKey => "foreign_key",
            RelationshipKind::NamingPattern => "naming_pattern",
            RelationshipKind::Semantic => "semantic",
        }
    }

    /// Structural kinds are backed by column-level evidence; semantic ones
    /// are table-level only.
    pub fn is_structural(&self) -> bool {
        !matches!(self, RelationshipKind::Semantic)
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub from_table: String,
    /// Absent for table-level (semantic) evidence
    pub from_column: Option<String>,
    pub to_table: String,
    pub to_column: Option<String>,
    pub kind: RelationshipKind,
    pub confidence: f64,
}

impl Relationship {
    /// Relationship derived from a declared foreign-key constraint.
    /// Always carries both columns and confidence exactly 1.0.
    pub fn foreign_key(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: Some(from_column.into()),
            to_table: to_table.into(),
            to_column: Some(to_column.into()),
            kind: RelationshipKind::ForeignKey,
            confidence: 1.0,
        }
    }

    /// Relationship inferred from column/table naming conventions.
    pub fn naming_pattern(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: Some(from_column.into()),
            to_table: to_table.into(),
            to_column: Some(to_column.into()),
            kind: RelationshipKind::NamingPattern,
            confidence: NAMING_PATTERN_CONFIDENCE,
        }
    }

    /// Symmetric pair of semantic relationships between two tables.
    /// Confidence is clamped into [0.1, 0.9]; no columns are attached.
    pub fn semantic_pair(
        table_a: impl Into<String>,
        table_b: impl Into<String>,
        confidence: f64,
    ) -> (Self, Self) {
        let a = table_a.into();
        let b = table_b.into();
        let confidence = confidence.clamp(SEMANTIC_CONFIDENCE_FLOOR, SEMANTIC_CONFIDENCE_CEILING);
        let forward = Self {
            from_table: a.clone(),
            from_column: None,
            to_table: b.clone(),
            to_column: None,
            kind: RelationshipKind::Semantic,
            confidence,
        };
        let backward = Self {
            from_table: b,
            from_column: None,
            to_table: a,
            to_column: None,
            kind: RelationshipKind::Semantic,
            confidence,
        };
        (forward, backward)
    }

    /// Dedup key: the column-pair tuple plus kind. No duplicate tuple may be
    /// inserted twice for the same kind.
    pub fn key(&self) -> (RelationshipKind, &str, Option<&str>, &str, Option<&str>) {
        (
            self.kind,
            &self.from_table,
            self.from_column.as_deref(),
            &self.to_table,
            self.to_column.as_deref(),
        )
    }

    /// True when this relationship connects the same column pair as `other`,
    /// regardless of kind. Used for cross-kind precedence checks.
    pub fn same_column_pair(&self, other: &Relationship) -> bool {
        self.from_table == other.from_table
            && self.from_column == other.from_column
            && self.to_table == other.to_table
            && self.to_column == other.to_column
    }

    /// True when this relationship connects tables `a` and `b` in either
    /// direction.
    pub fn connects_tables(&self, a: &str, b: &str) -> bool {
        (self.from_table == a && self.to_table == b)
            || (self.from_table == b && self.to_table == a)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{} ({}, {:.2})",
            self.from_table,
            self.from_column.as_deref().unwrap_or("*"),
            self.to_table,
            self.to_column.as_deref().unwrap_or("*"),
            self.kind,
            self.confidence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_confidence_is_exactly_one() {
        let rel = Relationship::foreign_key("orders", "user_id", "users", "user_id");
        assert_eq!(rel.kind, RelationshipKind::ForeignKey);
        assert_eq!(rel.confidence, 1.0);
        assert_eq!(rel.from_column.as_deref(), Some("user_id"));
        assert_eq!(rel.to_column.as_deref(), Some("user_id"));
    }

    #[test]
    fn test_semantic_pair_is_symmetric_and_clamped() {
        let (fwd, bwd) = Relationship::semantic_pair("users", "reviews", 0.95);
        assert_eq!(fwd.confidence, SEMANTIC_CONFIDENCE_CEILING);
        assert_eq!(bwd.confidence, SEMANTIC_CONFIDENCE_CEILING);
        assert_eq!(fwd.from_table, "users");
        assert_eq!(fwd.to_table, "reviews");
        assert_eq!(bwd.from_table, "reviews");
        assert_eq!(bwd.to_table, "users");
        assert!(fwd.from_column.is_none());
        assert!(fwd.to_column.is_none());
    }

    #[test]
    fn test_semantic_floor_clamp() {
        let (fwd, _) = Relationship::semantic_pair("a", "b", 0.01);
        assert_eq!(fwd.confidence, SEMANTIC_CONFIDENCE_FLOOR);
    }

    #[test]
    fn test_connects_tables_either_direction() {
        let rel = Relationship::foreign_key("orders", "user_id", "users", "user_id");
        assert!(rel.connects_tables("users", "orders"));
        assert!(rel.connects_tables("orders", "users"));
        assert!(!rel.connects_tables("orders", "products"));
    }

    #[test]
    fn test_display_table_level() {
        let (fwd, _) = Relationship::semantic_pair("users", "reviews", 0.8);
        assert_eq!(fwd.to_string(), "users.* -> reviews.* (semantic, 0.80)");
    }
}
