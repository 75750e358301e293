//! Schema discovery for MariaDB/MySQL databases.
//!
//! Reads table, column, primary-key, and foreign-key definitions out of
//! `information_schema` into an in-memory [`SchemaSnapshot`]. The snapshot is
//! read-only; nothing here holds catalog state beyond one extraction.

use async_trait::async_trait;
use sqlx::mysql::MySqlPool;
use sqlx::FromRow;

use super::errors::SchemaCatalogError;
use super::schema_types::{
    normalize_enum_type, ColumnSchema, ForeignKey, SchemaSnapshot, TableSchema,
};

/// Source of schema snapshots. Implementations supply a point-in-time view of
/// the catalog, not a live connection.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn snapshot(&self) -> Result<SchemaSnapshot, SchemaCatalogError>;
}

/// Schema source backed by a MariaDB/MySQL `information_schema`.
pub struct MySqlSchemaSource {
    pool: MySqlPool,
    database: String,
}

#[derive(Debug, FromRow)]
struct TableRow {
    table_name: String,
    table_comment: String,
}

#[derive(Debug, FromRow)]
struct ColumnRow {
    table_name: String,
    column_name: String,
    column_type: String,
    is_nullable: String,
    column_key: String,
    column_comment: String,
}

#[derive(Debug, FromRow)]
struct ForeignKeyRow {
    table_name: String,
    column_name: String,
    referenced_table_name: String,
    referenced_column_name: String,
}

impl MySqlSchemaSource {
    pub fn new(pool: MySqlPool, database: impl Into<String>) -> Self {
        Self {
            pool,
            database: database.into(),
        }
    }

    async fn list_tables(&self) -> Result<Vec<TableRow>, SchemaCatalogError> {
        let rows: Vec<TableRow> = sqlx::query_as(
            "SELECT TABLE_NAME AS table_name, TABLE_COMMENT AS table_comment \
             FROM INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' \
             ORDER BY TABLE_NAME",
        )
        .bind(&self.database)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_columns(&self) -> Result<Vec<ColumnRow>, SchemaCatalogError> {
        let rows: Vec<ColumnRow> = sqlx::query_as(
            "SELECT TABLE_NAME AS table_name, COLUMN_NAME AS column_name, \
                    COLUMN_TYPE AS column_type, IS_NULLABLE AS is_nullable, \
                    COLUMN_KEY AS column_key, COLUMN_COMMENT AS column_comment \
             FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = ? \
             ORDER BY TABLE_NAME, ORDINAL_POSITION",
        )
        .bind(&self.database)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_foreign_keys(&self) -> Result<Vec<ForeignKeyRow>, SchemaCatalogError> {
        let rows: Vec<ForeignKeyRow> = sqlx::query_as(
            "SELECT TABLE_NAME AS table_name, COLUMN_NAME AS column_name, \
                    REFERENCED_TABLE_NAME AS referenced_table_name, \
                    REFERENCED_COLUMN_NAME AS referenced_column_name \
             FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE \
             WHERE TABLE_SCHEMA = ? AND REFERENCED_TABLE_NAME IS NOT NULL \
             ORDER BY TABLE_NAME, ORDINAL_POSITION",
        )
        .bind(&self.database)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl SchemaSource for MySqlSchemaSource {
    async fn snapshot(&self) -> Result<SchemaSnapshot, SchemaCatalogError> {
        let table_rows = self.list_tables().await?;
        let column_rows = self.list_columns().await?;
        let fk_rows = self.list_foreign_keys().await?;

        let mut tables: Vec<TableSchema> = table_rows
            .into_iter()
            .map(|t| TableSchema {
                name: t.table_name,
                comment: t.table_comment,
                primary_keys: Vec::new(),
                columns: Vec::new(),
                foreign_keys: Vec::new(),
            })
            .collect();

        for col in column_rows {
            let Some(table) = tables.iter_mut().find(|t| t.name == col.table_name) else {
                // Views and system objects can report columns without a
                // matching base table; skip them.
                continue;
            };
            let is_pk = col.column_key == "PRI";
            if is_pk {
                table.primary_keys.push(col.column_name.clone());
            }
            table.columns.push(ColumnSchema {
                name: col.column_name,
                data_type: normalize_enum_type(&col.column_type),
                nullable: col.is_nullable == "YES",
                is_primary_key: is_pk,
                comment: col.column_comment,
            });
        }

        for fk in fk_rows {
            if let Some(table) = tables.iter_mut().find(|t| t.name == fk.table_name) {
                table.foreign_keys.push(ForeignKey {
                    column: fk.column_name,
                    referenced_table: fk.referenced_table_name,
                    referenced_column: fk.referenced_column_name,
                });
            }
        }

        if tables.is_empty() {
            log::warn!("No base tables found in database `{}`", self.database);
        } else {
            log::info!(
                "Extracted {} tables from database `{}`",
                tables.len(),
                self.database
            );
        }

        Ok(SchemaSnapshot::new(tables))
    }
}
