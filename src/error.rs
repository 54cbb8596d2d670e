use thiserror::Error;

/// Structural problems with a flight dataset that stop it from loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The source lacks one or more required columns.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}
