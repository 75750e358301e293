//! Three-pass relationship inference.
//!
//! Pass order matters only for precedence: declared foreign keys are
//! collected first, naming-pattern matches never duplicate an FK column pair,
//! and semantic judgments never duplicate an already-related table pair.
//! Every pass is independently skippable and none of them raises on bad
//! input; an empty result simply collapses the planner to "no connections
//! found".

use crate::schema_catalog::SchemaSnapshot;

use super::oracle::SemanticOracle;
use super::relationship::Relationship;

pub struct RelationshipInferrer;

impl RelationshipInferrer {
    /// Run all passes. The semantic pass is skipped when no oracle is
    /// available or when it fails; evidence gaps are never fatal.
    pub async fn infer(
        snapshot: &SchemaSnapshot,
        oracle: Option<&dyn SemanticOracle>,
    ) -> Vec<Relationship> {
        let mut relationships = Self::infer_foreign_keys(snapshot);
        let naming = Self::infer_naming_patterns(snapshot, &relationships);
        relationships.extend(naming);

        if let Some(oracle) = oracle {
            let semantic = Self::infer_semantic(snapshot, &relationships, oracle).await;
            relationships.extend(semantic);
        } else {
            log::debug!("No semantic oracle configured; skipping semantic pass");
        }

        log::info!("Inferred {} relationships", relationships.len());
        relationships
    }

    /// Foreign-key pass: one relationship per declared FK constraint,
    /// confidence exactly 1.0. Never fails.
    pub fn infer_foreign_keys(snapshot: &SchemaSnapshot) -> Vec<Relationship> {
        let mut relationships = Vec::new();
        for table in snapshot.tables() {
            for fk in &table.foreign_keys {
                let rel = Relationship::foreign_key(
                    &table.name,
                    &fk.column,
                    &fk.referenced_table,
                    &fk.referenced_column,
                );
                if !relationships.iter().any(|r: &Relationship| r.key() == rel.key()) {
                    relationships.push(rel);
                }
            }
        }
        relationships
    }

    /// Naming-pattern pass: a column `foo_id` that is not the table's own
    /// primary key suggests a referenced table `foo` or `foos` whose primary
    /// key is named `foo_id`. Foreign-key evidence for the same column pair
    /// takes precedence.
    pub fn infer_naming_patterns(
        snapshot: &SchemaSnapshot,
        existing: &[Relationship],
    ) -> Vec<Relationship> {
        let mut relationships = Vec::new();

        for table in snapshot.tables() {
            for column in &table.columns {
                let Some(stem) = column.name.strip_suffix("_id") else {
                    continue;
                };
                if stem.is_empty() {
                    continue;
                }
                if table.primary_key() == Some(column.name.as_str()) {
                    continue;
                }

                // Naive English pluralization only; matches the source
                // heuristic and nothing more.
                let candidates = [stem.to_string(), format!("{}s", stem)];
                for candidate in candidates {
                    let Some(target) = snapshot.table(&candidate) else {
                        continue;
                    };
                    if target.primary_key() != Some(column.name.as_str()) {
                        continue;
                    }

                    let rel = Relationship::naming_pattern(
                        &table.name,
                        &column.name,
                        &target.name,
                        column.name.clone(),
                    );
                    let duplicate = existing
                        .iter()
                        .chain(relationships.iter())
                        .any(|r| r.same_column_pair(&rel));
                    if !duplicate {
                        log::debug!("Naming pattern: {}", rel);
                        relationships.push(rel);
                    }
                    break;
                }
            }
        }

        relationships
    }

    /// Semantic pass: ask the oracle, then validate every judgment
    /// defensively before accepting it. Each accepted pair is materialized
    /// as two directed edges so traversal is direction-agnostic.
    pub async fn infer_semantic(
        snapshot: &SchemaSnapshot,
        existing: &[Relationship],
        oracle: &dyn SemanticOracle,
    ) -> Vec<Relationship> {
        let descriptions: Vec<(String, String)> = snapshot
            .tables()
            .map(|t| (t.name.clone(), t.comment.clone()))
            .collect();
        if descriptions.is_empty() {
            return Vec::new();
        }

        let judgments = match oracle.judge(descriptions).await {
            Ok(judgments) => judgments,
            Err(e) => {
                log::warn!("Semantic oracle unavailable, skipping pass: {}", e);
                return Vec::new();
            }
        };

        let mut relationships: Vec<Relationship> = Vec::new();
        for judgment in judgments {
            if judgment.table1 == judgment.table2 {
                log::debug!("Rejected self-pair judgment for `{}`", judgment.table1);
                continue;
            }
            if !snapshot.contains(&judgment.table1) || !snapshot.contains(&judgment.table2) {
                log::debug!(
                    "Rejected judgment naming unknown table: {} / {}",
                    judgment.table1,
                    judgment.table2
                );
                continue;
            }
            if !judgment.confidence.is_finite() || judgment.confidence <= 0.0 {
                log::debug!(
                    "Rejected judgment with invalid confidence {}",
                    judgment.confidence
                );
                continue;
            }
            let already_related = existing
                .iter()
                .chain(relationships.iter())
                .any(|r| r.connects_tables(&judgment.table1, &judgment.table2));
            if already_related {
                continue;
            }

            let (forward, backward) =
                Relationship::semantic_pair(&judgment.table1, &judgment.table2, judgment.confidence);
            log::debug!("Semantic: {} ({})", forward, judgment.reason);
            relationships.push(forward);
            relationships.push(backward);
        }

        relationships
    }
}
