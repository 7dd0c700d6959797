use schmatch_database::error::DatabaseError;
use schmatch_database::{Pool, SqliteConnection};

use crate::error::AppError;

/// Runs blocking database work on a pooled connection outside of the async
/// executor.
pub async fn with_connection<T, F>(pool: &Pool, work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    let pool = pool.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<T, DatabaseError> {
        let mut connection = pool.get()?;
        work(&mut connection)
    })
    .await?;
    Ok(result?)
}
