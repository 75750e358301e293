//! Neo4j-compatible graph backend over the HTTP transactional Cypher API.
//!
//! The engine is used as a passive index: `rebuild` wipes and recreates the
//! schema graph, and each query method is a single request-response round
//! trip against `/db/<database>/tx/commit`. Equal-length path ties are
//! resolved client-side (lexicographically smallest table-name sequence)
//! because the engine's own tie choice is unspecified.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::relationships::Relationship;
use crate::schema_catalog::SchemaSnapshot;

use super::backend::{GraphBackend, GraphStats, PathEdge, PathMap, TablePath};
use super::errors::GraphStoreError;

/// Statements per transactional commit during rebuild.
const REBUILD_BATCH_SIZE: usize = 100;

pub struct CypherBackend {
    http: reqwest::Client,
    endpoint: String,
    user: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct Statement {
    statement: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    results: Vec<TxResult>,
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[allow(dead_code)]
    columns: Vec<String>,
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl CypherBackend {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        database: &str,
        user: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            http,
            endpoint: format!("{}/db/{}/tx/commit", base_url.trim_end_matches('/'), database),
            user,
            password,
        }
    }

    async fn commit(&self, statements: Vec<Statement>) -> Result<Vec<TxResult>, GraphStoreError> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "statements": statements }));
        if let Some(user) = &self.user {
            request = request.basic_auth(user, self.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| GraphStoreError::Backend(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphStoreError::Backend(format!(
                "graph engine returned {}: {}",
                status, body
            )));
        }

        let tx: TxResponse = response
            .json()
            .await
            .map_err(|e| GraphStoreError::Backend(format!("invalid response: {}", e)))?;

        if let Some(err) = tx.errors.first() {
            return Err(GraphStoreError::Backend(format!(
                "{}: {}",
                err.code, err.message
            )));
        }

        Ok(tx.results)
    }

    fn rebuild_statements(
        snapshot: &SchemaSnapshot,
        relationships: &[Relationship],
    ) -> Vec<Statement> {
        let mut statements = vec![Statement {
            statement: "MATCH (n) WHERE n:Table OR n:Column DETACH DELETE n".to_string(),
            parameters: json!({}),
        }];

        for table in snapshot.tables() {
            statements.push(Statement {
                statement: "CREATE (t:Table {name: $name, comment: $comment, \
                            primary_keys: $primary_keys})"
                    .to_string(),
                parameters: json!({
                    "name": table.name,
                    "comment": table.comment,
                    "primary_keys": table.primary_keys,
                }),
            });
            for column in &table.columns {
                statements.push(Statement {
                    statement: "MATCH (t:Table {name: $table}) \
                                CREATE (c:Column {name: $name, data_type: $data_type, \
                                nullable: $nullable, is_pk: $is_pk, comment: $comment}) \
                                CREATE (t)-[:HAS_COLUMN]->(c)"
                        .to_string(),
                    parameters: json!({
                        "table": table.name,
                        "name": column.name,
                        "data_type": column.data_type,
                        "nullable": column.nullable,
                        "is_pk": column.is_primary_key,
                        "comment": column.comment,
                    }),
                });
            }
        }

        for rel in relationships {
            let edge_label = if rel.kind.is_structural() {
                "REFERENCES"
            } else {
                "SEMANTIC_RELATION"
            };
            statements.push(Statement {
                statement: format!(
                    "MATCH (a:Table {{name: $from}}), (b:Table {{name: $to}}) \
                     CREATE (a)-[:{} {{from_column: $from_column, to_column: $to_column, \
                     kind: $kind, confidence: $confidence}}]->(b)",
                    edge_label
                ),
                parameters: json!({
                    "from": rel.from_table,
                    "to": rel.to_table,
                    "from_column": rel.from_column,
                    "to_column": rel.to_column,
                    "kind": rel.kind.as_str(),
                    "confidence": rel.confidence,
                }),
            });
        }

        statements
    }

    /// Decode one `[tables, edges]` row returned by the path query.
    fn parse_path_row(row: &[Value]) -> Option<(Vec<String>, Vec<PathEdge>)> {
        let tables: Vec<String> = serde_json::from_value(row.first()?.clone()).ok()?;
        let raw_edges: Vec<Vec<Value>> = serde_json::from_value(row.get(1)?.clone()).ok()?;

        let mut edges = Vec::with_capacity(raw_edges.len());
        for raw in raw_edges {
            if raw.len() != 6 {
                return None;
            }
            edges.push(PathEdge {
                from_table: raw[0].as_str()?.to_string(),
                to_table: raw[1].as_str()?.to_string(),
                from_column: raw[2].as_str().map(str::to_string),
                to_column: raw[3].as_str().map(str::to_string),
                kind: serde_json::from_value(raw[4].clone()).ok()?,
                confidence: raw[5].as_f64()?,
            });
        }
        Some((tables, edges))
    }
}

#[async_trait]
impl GraphBackend for CypherBackend {
    async fn rebuild(
        &self,
        snapshot: &SchemaSnapshot,
        relationships: &[Relationship],
    ) -> Result<GraphStats, GraphStoreError> {
        let statements = Self::rebuild_statements(snapshot, relationships);
        // The wipe statement leads the first batch, so a failed later batch
        // leaves a partial graph rather than a stale one; callers treat any
        // rebuild error as "graph unavailable" and re-run the whole cycle.
        let mut iter = statements.into_iter().peekable();
        while iter.peek().is_some() {
            let batch: Vec<Statement> = iter.by_ref().take(REBUILD_BATCH_SIZE).collect();
            self.commit(batch).await?;
        }

        Ok(GraphStats {
            tables: snapshot.len(),
            columns: snapshot.column_count(),
            relationship_edges: relationships.len(),
        })
    }

    async fn shortest_paths(
        &self,
        tables: &[String],
        max_hops: u32,
    ) -> Result<PathMap, GraphStoreError> {
        let mut sorted: Vec<&String> = tables.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut pairs = Vec::new();
        let mut statements = Vec::new();
        for (i, a) in sorted.iter().enumerate() {
            for b in sorted.iter().skip(i + 1) {
                pairs.push(((*a).clone(), (*b).clone()));
                statements.push(Statement {
                    // The hop bound must be a literal in Cypher.
                    statement: format!(
                        "MATCH (a:Table {{name: $a}}), (b:Table {{name: $b}}) \
                         MATCH p = allShortestPaths((a)-[:REFERENCES|SEMANTIC_RELATION*1..{}]-(b)) \
                         RETURN [n IN nodes(p) | n.name] AS tables, \
                         [r IN relationships(p) | [startNode(r).name, endNode(r).name, \
                         r.from_column, r.to_column, r.kind, r.confidence]] AS edges",
                        max_hops
                    ),
                    parameters: json!({ "a": a, "b": b }),
                });
            }
        }

        if statements.is_empty() {
            return Ok(PathMap::new());
        }

        let results = self.commit(statements).await?;
        let mut paths = PathMap::new();
        for (pair, result) in pairs.into_iter().zip(results) {
            let best = result
                .data
                .iter()
                .filter_map(|row| Self::parse_path_row(&row.row))
                .min_by(|(a_tables, _), (b_tables, _)| a_tables.cmp(b_tables));
            if let Some((_, edges)) = best {
                paths.insert(
                    pair,
                    TablePath {
                        distance: edges.len() as u32,
                        edges,
                    },
                );
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
        let mut statements = Vec::new();
        for (label, hops) in [
            ("REFERENCES", structural_hops),
            ("SEMANTIC_RELATION", semantic_hops),
        ] {
            if hops == 0 {
                continue;
            }
            statements.push(Statement {
                statement: format!(
                    "MATCH (t:Table)-[:{}*1..{}]-(x:Table) \
                     WHERE t.name IN $tables AND NOT x.name IN $tables \
                     RETURN DISTINCT x.name AS name",
                    label, hops
                ),
                parameters: json!({ "tables": tables }),
            });
        }

        if statements.is_empty() {
            return Ok(BTreeSet::new());
        }

        let results = self.commit(statements).await?;
        let mut reached = BTreeSet::new();
        for result in results {
            for row in result.data {
                if let Some(name) = row.row.first().and_then(Value::as_str) {
                    reached.insert(name.to_string());
                }
            }
        }
        Ok(reached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships::RelationshipKind;
    use crate::schema_catalog::{ColumnSchema, TableSchema};

    fn snapshot() -> SchemaSnapshot {
        SchemaSnapshot::new(vec![TableSchema {
            name: "users".to_string(),
            comment: "Accounts".to_string(),
            primary_keys: vec!["user_id".to_string()],
            columns: vec![ColumnSchema {
                name: "user_id".to_string(),
                data_type: "int(11)".to_string(),
                nullable: false,
                is_primary_key: true,
                comment: String::new(),
            }],
            foreign_keys: vec![],
        }])
    }

    #[test]
    fn test_rebuild_statements_shape() {
        let rels = vec![Relationship::foreign_key(
            "orders", "user_id", "users", "user_id",
        )];
        let statements = CypherBackend::rebuild_statements(&snapshot(), &rels);

        // wipe + 1 table + 1 column + 1 relationship
        assert_eq!(statements.len(), 4);
        assert!(statements[0].statement.contains("DETACH DELETE"));
        assert!(statements[1].statement.contains("CREATE (t:Table"));
        assert!(statements[2].statement.contains("HAS_COLUMN"));
        assert!(statements[3].statement.contains("[:REFERENCES"));
    }

    #[test]
    fn test_semantic_relationship_uses_semantic_label() {
        let (fwd, _) = Relationship::semantic_pair("users", "faq", 0.5);
        let statements = CypherBackend::rebuild_statements(&SchemaSnapshot::default(), &[fwd]);
        let rel_stmt = statements.last().unwrap();
        assert!(rel_stmt.statement.contains("[:SEMANTIC_RELATION"));
        assert_eq!(rel_stmt.parameters["from_column"], Value::Null);
    }

    #[test]
    fn test_parse_path_row() {
        let row = vec![
            json!(["users", "orders"]),
            json!([["orders", "users", "user_id", "user_id", "foreign_key", 1.0]]),
        ];
        let (tables, edges) = CypherBackend::parse_path_row(&row).unwrap();
        assert_eq!(tables, vec!["users", "orders"]);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, RelationshipKind::ForeignKey);
        assert_eq!(edges[0].from_column.as_deref(), Some("user_id"));
    }

    #[test]
    fn test_parse_path_row_semantic_null_columns() {
        let row = vec![
            json!(["users", "faq"]),
            json!([["users", "faq", null, null, "semantic", 0.5]]),
        ];
        let (_, edges) = CypherBackend::parse_path_row(&row).unwrap();
        assert!(edges[0].from_column.is_none());
        assert!(edges[0].to_column.is_none());
    }

    #[test]
    fn test_parse_path_row_malformed() {
        let row = vec![json!(["users"]), json!([["too", "short"]])];
        assert!(CypherBackend::parse_path_row(&row).is_none());
    }
}
