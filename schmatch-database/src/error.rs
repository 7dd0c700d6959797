use diesel::r2d2::PoolError;
pub use diesel::result::DatabaseErrorKind;
use diesel::result::Error as QueryError;
use thiserror::Error;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to create the database directory {0}")]
    Directory(#[from] std::io::Error),
    #[error("Failed to connect to the database {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("Database pool failed {0}")]
    Pool(#[from] PoolError),
    #[error("Database query failed {0}")]
    Query(#[from] QueryError),
    #[error("resource {resource_id} has more than one match in slot {slot_id}")]
    DoubleBooked { resource_id: i32, slot_id: i32 },
}

impl DatabaseError {
    /// The kind of constraint violation reported by the database, if any.
    #[must_use]
    pub const fn violation(&self) -> Option<&DatabaseErrorKind> {
        match self {
            Self::Query(QueryError::DatabaseError(kind, _)) => Some(kind),
            _ => None,
        }
    }
}
