//! Query materializer boundary.
//!
//! Turns a free-text request, the schema snapshot, and the planner's join
//! sequence into LLM prompts, and validates what comes back. The core makes
//! no assumption about the generated query beyond "each join predicate is an
//! equality of two named columns"; everything MariaDB-specific lives in the
//! prompt text here.

use serde::Deserialize;

use crate::llm;
use crate::planner::JoinPlan;
use crate::schema_catalog::SchemaSnapshot;

/// Parsed table-selection judgment from the LLM.
#[derive(Debug, Deserialize)]
struct TableSelection {
    tables: Vec<String>,
    #[serde(default)]
    reason: String,
}

pub const TABLE_SELECTION_SYSTEM_PROMPT: &str = "You are a database analyst. Given a schema \
summary and a user request, select the tables needed to answer the request, including \
intermediate tables required to connect them.\n\
Respond with ONLY this JSON, no explanation:\n\
{\"tables\": [\"table1\", \"table2\"], \"reason\": \"one sentence\"}";

pub const SQL_GENERATION_SYSTEM_PROMPT: &str = "You are a SQL generator for MariaDB. \
Generate one accurate SELECT query for the user's request.\n\
Rules:\n\
1. Use valid MariaDB syntax\n\
2. Follow the recommended join order and join predicates when provided\n\
3. Use exact table and column names from the schema\n\
4. Add WHERE conditions where the request implies them\n\
5. Return ONLY the SQL query, starting with SELECT, no explanation";

/// One-line-per-table schema summary used for table selection.
pub fn build_schema_summary(snapshot: &SchemaSnapshot) -> String {
    let mut summary = String::from("Database tables:\n");
    for table in snapshot.tables() {
        if table.comment.is_empty() {
            summary.push_str(&format!("- {}\n", table.name));
        } else {
            summary.push_str(&format!("- {}: {}\n", table.name, table.comment));
        }
        let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        summary.push_str(&format!("  columns: {}\n", columns.join(", ")));
    }
    summary
}

/// User prompt for the table-selection call.
pub fn build_table_selection_prompt(snapshot: &SchemaSnapshot, request: &str) -> String {
    format!(
        "{}\nUser request: {}\n\nReturn the JSON of required tables.",
        build_schema_summary(snapshot),
        request
    )
}

/// Parse the table-selection response and keep only tables that exist in the
/// snapshot. Returns None when nothing usable came back.
pub fn parse_table_selection(response: &str, snapshot: &SchemaSnapshot) -> Option<Vec<String>> {
    let body = llm::extract_fenced(response);
    let object = llm::extract_json_object(&body)?;
    let selection: TableSelection = serde_json::from_str(&object).ok()?;

    let valid: Vec<String> = selection
        .tables
        .into_iter()
        .filter(|t| snapshot.contains(t))
        .collect();
    if valid.is_empty() {
        return None;
    }
    if !selection.reason.is_empty() {
        log::debug!("Table selection reason: {}", selection.reason);
    }
    Some(valid)
}

/// Keyword fallback when the LLM is unavailable or returned nothing usable:
/// a table is relevant when its name (or the name minus a plural `s`)
/// appears in the request.
pub fn keyword_table_fallback(snapshot: &SchemaSnapshot, request: &str) -> Vec<String> {
    let request_lower = request.to_lowercase();
    snapshot
        .table_names()
        .filter(|name| {
            let lower = name.to_lowercase();
            let singular = lower.strip_suffix('s').unwrap_or(&lower);
            request_lower.contains(&lower) || request_lower.contains(singular)
        })
        .map(str::to_string)
        .collect()
}

/// Full schema listing with column types, used for SQL generation.
fn build_schema_detail(snapshot: &SchemaSnapshot, tables: &[String]) -> String {
    let mut detail = String::from("Schema:\n");
    for name in tables {
        let Some(table) = snapshot.table(name) else {
            continue;
        };
        detail.push_str(&format!("Table {}", table.name));
        if !table.comment.is_empty() {
            detail.push_str(&format!(" -- {}", table.comment));
        }
        detail.push('\n');
        for column in &table.columns {
            let mut flags = Vec::new();
            if column.is_primary_key {
                flags.push("PK");
            }
            if !column.nullable {
                flags.push("NOT NULL");
            }
            let flag_str = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            detail.push_str(&format!(
                "  - {} {}{}\n",
                column.name, column.data_type, flag_str
            ));
        }
        detail.push('\n');
    }
    detail
}

/// Render the planner's output as join guidance for the model.
fn build_join_guidance(plan: &JoinPlan) -> String {
    let mut guidance = String::from("Recommended join order and predicates:\n");
    for (i, step) in plan.steps.iter().enumerate() {
        guidance.push_str(&format!("{}. {}\n", i + 1, step.table));
        for predicate in &step.predicates {
            guidance.push_str(&format!("   JOIN ON {}\n", predicate));
        }
        if i > 0 && step.predicates.is_empty() {
            guidance.push_str("   (no known join predicate; connect manually or filter)\n");
        }
    }
    guidance
}

/// User prompt for SQL generation. The join plan is optional: without graph
/// connectivity the model still gets the schema, it just plans joins itself.
pub fn build_sql_prompt(
    snapshot: &SchemaSnapshot,
    tables: &[String],
    plan: Option<&JoinPlan>,
    request: &str,
) -> String {
    let mut prompt = build_schema_detail(snapshot, tables);
    if let Some(plan) = plan {
        prompt.push_str(&build_join_guidance(plan));
        prompt.push('\n');
    }
    prompt.push_str(&format!("User request: {}\n\nSQL query:", request));
    prompt
}
