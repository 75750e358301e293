pub mod errors;
pub mod schema_discovery;
pub mod schema_types;

// Re-export commonly used types
pub use errors::SchemaCatalogError;
pub use schema_discovery::{MySqlSchemaSource, SchemaSource};
pub use schema_types::{ColumnSchema, ForeignKey, SchemaSnapshot, TableSchema};
