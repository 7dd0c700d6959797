pub mod error;
pub mod models;
pub mod queries;
pub mod schema;

use std::path::Path;

use diesel::connection::SimpleConnection as _;
use diesel::r2d2::{ConnectionManager, CustomizeConnection};
pub use diesel::SqliteConnection;
use diesel::Connection as _;
use error::DatabaseError;
use tracing::info;

pub type Pool = diesel::r2d2::Pool<ConnectionManager<SqliteConnection>>;

const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;";

/// SQLite only checks foreign keys when asked to, per connection.
#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute(CONNECTION_PRAGMAS)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

fn database_url(database_path: &Path) -> String {
    database_path.to_string_lossy().into_owned()
}

pub fn get_database_pool(database_path: &Path) -> Result<Pool, DatabaseError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url(database_path));
    Ok(Pool::builder()
        .connection_customizer(Box::new(ConnectionPragmas))
        .build(manager)?)
}

/// Opens a single connection with the same pragmas the pool applies.
pub fn establish_connection(database_url: &str) -> Result<SqliteConnection, DatabaseError> {
    let mut connection = SqliteConnection::establish(database_url)?;
    connection.batch_execute(CONNECTION_PRAGMAS)?;
    Ok(connection)
}

pub fn create_tables(connection: &mut SqliteConnection) -> Result<(), DatabaseError> {
    connection.batch_execute(schema::CREATE_TABLES)?;
    Ok(())
}

pub fn drop_tables(connection: &mut SqliteConnection) -> Result<(), DatabaseError> {
    connection.batch_execute(schema::DROP_TABLES)?;
    Ok(())
}

/// Creates the directory containing the database and all tables in it.
/// Existing tables are kept unless `drop_first` is set.
pub fn initialize_database(database_path: &Path, drop_first: bool) -> Result<(), DatabaseError> {
    if let Some(directory) = database_path.parent() {
        std::fs::create_dir_all(directory)?;
    }
    let mut connection = establish_connection(&database_url(database_path))?;
    if drop_first {
        info!("dropping all tables in {}", database_path.display());
        drop_tables(&mut connection)?;
    }
    create_tables(&mut connection)?;
    info!("database ready at {}", database_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;

    use super::*;
    use crate::models::Slot;
    use crate::queries::{all_slots, insert_slot};
    use crate::schema::slots;

    #[test]
    fn initialize_creates_missing_directory() {
        let directory = tempfile::tempdir().unwrap();
        let database_path = directory.path().join("nested").join("schmatch.db");

        initialize_database(&database_path, false).unwrap();

        assert!(database_path.exists());
        let pool = get_database_pool(&database_path).unwrap();
        let mut connection = pool.get().unwrap();
        insert_slot(&mut connection, "Monday").unwrap();
        assert_eq!(all_slots(&mut connection).unwrap().len(), 1);
    }

    #[test]
    fn initialize_keeps_rows_unless_dropping() {
        let directory = tempfile::tempdir().unwrap();
        let database_path = directory.path().join("schmatch.db");
        initialize_database(&database_path, false).unwrap();
        {
            let mut connection = establish_connection(&database_url(&database_path)).unwrap();
            insert_slot(&mut connection, "Monday").unwrap();
        }

        initialize_database(&database_path, false).unwrap();
        let mut connection = establish_connection(&database_url(&database_path)).unwrap();
        assert_eq!(all_slots(&mut connection).unwrap().len(), 1);
        drop(connection);

        initialize_database(&database_path, true).unwrap();
        let mut connection = establish_connection(&database_url(&database_path)).unwrap();
        let remaining: Vec<Slot> = slots::table
            .select(Slot::as_select())
            .load(&mut connection)
            .unwrap();
        assert!(remaining.is_empty());
    }
}
