//! Relgraph - Schema relationship graph and join-path planner
//!
//! This crate analyzes a relational database schema and provides:
//! - Relationship inference from foreign keys, naming conventions, and
//!   LLM-supplied semantic hints
//! - A property-graph view of the schema over a pluggable graph backend
//! - Join-path planning for arbitrary table subsets
//! - LLM-assisted SQL generation steered by the planned join order

pub mod config;
pub mod graph_store;
pub mod llm;
pub mod planner;
pub mod relationships;
pub mod repl;
pub mod schema_catalog;
pub mod sqlgen;
