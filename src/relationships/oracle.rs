//! Semantic-evidence oracle boundary.
//!
//! An oracle receives `(table_name, description)` pairs and returns judgments
//! about which tables are related. The oracle is advisory: every field of its
//! output is validated by the inferrer before any edge is created. The
//! shipped implementation asks an LLM; tests mock the trait.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::{self, LlmConfig};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Oracle call failed: {0}")]
    Call(String),
}

/// One raw judgment from the oracle. Untrusted until validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticJudgment {
    pub table1: String,
    pub table2: String,
    #[serde(default)]
    pub reason: String,
    pub confidence: f64,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SemanticOracle: Send + Sync {
    /// Judge which of the described tables are semantically related.
    async fn judge(
        &self,
        tables: Vec<(String, String)>,
    ) -> Result<Vec<SemanticJudgment>, OracleError>;
}

/// Oracle backed by the configured LLM provider.
pub struct LlmSemanticOracle {
    http: reqwest::Client,
    config: LlmConfig,
}

const SYSTEM_PROMPT: &str = "You are a database schema analyst. Given table names with their \
descriptions, identify pairs of tables that are semantically related even though no foreign key \
connects them (same business entity, lifecycle stages of one process, master/detail pairs).\n\
Return ONLY a JSON array, no explanation:\n\
[{\"table1\": \"a\", \"table2\": \"b\", \"reason\": \"one sentence\", \"confidence\": 0.5}]\n\
Confidence must be between 0.1 and 0.9. Do not repeat pairs and do not pair a table with itself.";

impl LlmSemanticOracle {
    pub fn new(http: reqwest::Client, config: LlmConfig) -> Self {
        Self { http, config }
    }

    fn build_user_prompt(tables: &[(String, String)]) -> String {
        let mut prompt = String::from("Database tables:\n");
        for (name, description) in tables {
            if description.is_empty() {
                prompt.push_str(&format!("- {}\n", name));
            } else {
                prompt.push_str(&format!("- {}: {}\n", name, description));
            }
        }
        prompt.push_str("\nReturn the JSON array of related pairs.");
        prompt
    }

    /// Parse a JSON array of judgments out of free-form model output.
    /// Unparseable output yields an empty list, never an error: a missing
    /// semantic edge only degrades reachability.
    fn parse_judgments(text: &str) -> Vec<SemanticJudgment> {
        let body = llm::extract_fenced(text);
        let Some(array) = llm::extract_json_array(&body) else {
            log::debug!("Oracle output contained no JSON array");
            return Vec::new();
        };
        match serde_json::from_str::<Vec<SemanticJudgment>>(&array) {
            Ok(judgments) => judgments,
            Err(e) => {
                log::debug!("Failed to parse oracle judgments: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SemanticOracle for LlmSemanticOracle {
    async fn judge(
        &self,
        tables: Vec<(String, String)>,
    ) -> Result<Vec<SemanticJudgment>, OracleError> {
        let user_prompt = Self::build_user_prompt(&tables);
        let response = llm::call_llm(&self.http, &self.config, SYSTEM_PROMPT, &user_prompt)
            .await
            .map_err(|e| OracleError::Call(e.to_string()))?;
        Ok(Self::parse_judgments(&response))
    }
}
