use thiserror::Error;

/// Errors raised while extracting a schema snapshot from the relational catalog.
#[derive(Debug, Error)]
pub enum SchemaCatalogError {
    #[error("Failed to query the database catalog: {0}")]
    Database(#[from] sqlx::Error),
}
