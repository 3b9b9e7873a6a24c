use thiserror::Error;

/// Library-level error taxonomy.
///
/// `NotFound` is the only variant callers are expected to branch on: list
/// operations never produce it (they return empty sequences instead), only
/// show-by-id and show-by-key lookups do.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} {id} was not found")]
    NotFound { entity: &'static str, id: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
