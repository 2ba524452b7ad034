// database.rs
//
// Copyright 2026 Fancast contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Database Setup.
//!
//! There is no process wide connection. A [`Database`] is opened once at
//! startup and handed to whoever needs to talk to storage.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, PooledConnection};

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use std::path::Path;

use crate::errors::DataError;

type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

/// A pooled `SqliteConnection`.
pub type Connection = PooledConnection<ConnectionManager<SqliteConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

// Milliseconds sqlite waits on a locked database before giving up.
const BUSY_TIMEOUT: u32 = 5_000;

#[derive(Debug, Clone, Copy)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {BUSY_TIMEOUT};"
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

/// Handle to the storage engine.
///
/// Cloning is cheap, every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Open (creating if needed) the sqlite database at `path` and bring its
    /// schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Database, DataError> {
        let db_path = path.as_ref().to_string_lossy();
        let manager = ConnectionManager::<SqliteConnection>::new(db_path.as_ref());
        let pool = r2d2::Pool::builder()
            .connection_customizer(Box::new(ConnectionOptions))
            .build(manager)?;

        {
            let mut con = pool.get()?;
            run_migration_on(&mut con)?;
        }
        info!("Database pool initialized at {}.", db_path);

        Ok(Database { pool })
    }

    /// Get a connection out of the pool.
    pub fn connection(&self) -> Result<Connection, DataError> {
        self.pool.get().map_err(From::from)
    }
}

fn run_migration_on(conn: &mut SqliteConnection) -> Result<(), DataError> {
    info!("Running DB Migrations...");
    conn.run_pending_migrations(MIGRATIONS)
        .map(|versions| debug!("Applied {} migrations.", versions.len()))
        .map_err(|err| DataError::DieselMigrationError(err.to_string()))
}

/// A fresh database in a temporary file.
///
/// The file lives as long as the returned `NamedTempFile`.
#[cfg(test)]
pub(crate) fn temporary_db() -> Result<(tempfile::NamedTempFile, Database), DataError> {
    let file = tempfile::Builder::new().suffix("-fancast.db").tempfile()?;
    let db = Database::open(file.path())?;
    Ok((file, db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_open_runs_migrations() -> Result<()> {
        let (_file, db) = temporary_db()?;
        let mut con = db.connection()?;

        // Both tables exist and are empty.
        let podcasts: i64 = crate::schema::podcasts::table.count().get_result(&mut con)?;
        let episodes: i64 = crate::schema::episodes::table.count().get_result(&mut con)?;
        assert_eq!(podcasts, 0);
        assert_eq!(episodes, 0);
        Ok(())
    }

    #[test]
    fn test_reopen_is_idempotent() -> Result<()> {
        let (file, db) = temporary_db()?;
        drop(db);
        // Second open must find nothing left to migrate.
        Database::open(file.path())?;
        Ok(())
    }

    #[test]
    fn test_foreign_keys_are_enforced() -> Result<()> {
        use diesel::sql_query;

        let (_file, db) = temporary_db()?;
        let mut con = db.connection()?;

        let res = sql_query(
            "INSERT INTO episodes (id, parent, title, digest, last_fetch) \
             VALUES ('e', 'no-such-podcast', 't', 'd', '2026-01-01 00:00:00')",
        )
        .execute(&mut con);
        assert!(res.is_err());
        Ok(())
    }
}
