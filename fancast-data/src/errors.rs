// errors.rs
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

use diesel::r2d2;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use std::io;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("SQL Query failed: {0}")]
    DieselResultError(#[from] DieselError),
    #[error("Database Migration error: {0}")]
    DieselMigrationError(String),
    #[error("R2D2 error: {0}")]
    R2D2Error(#[from] r2d2::Error),
    #[error("R2D2 Pool error: {0}")]
    R2D2PoolError(#[from] r2d2::PoolError),
    #[error("Reqwest Error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Failed to parse a url: {0}")]
    UrlError(#[from] url::ParseError),
    #[error("IO Error: {0}")]
    IOError(#[from] io::Error),
    #[error("RSS Error: {0}")]
    RssError(#[from] rss::Error),
    #[error("Json Error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Request to {url} returned {status_code}. Context: {context}")]
    HttpStatusGeneral {
        url: String,
        status_code: reqwest::StatusCode,
        context: String,
    },
    #[error("Request to {0} was redirected without a Location header")]
    RedirectWithoutLocation(String),
    #[error("Redirect loop detected at {0}")]
    RedirectLoop(String),
    #[error("Gave up on {0} after too many redirects")]
    TooManyRedirects(String),
    #[error("Could not find a free identifier for table {table} after {attempts} attempts")]
    IdentifierExhausted { table: &'static str, attempts: usize },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("The ingest queue is closed.")]
    QueueClosed,
    #[error("Error: {0}")]
    Bail(String),
}

impl From<String> for DataError {
    fn from(err: String) -> Self {
        DataError::Bail(err)
    }
}

impl DataError {
    /// Whether this is a primary key collision on `table`.
    ///
    /// SQLite reports these as `UNIQUE constraint failed: <table>.id`, which
    /// is what lets us tell an identifier clash apart from a `feed_url` one.
    pub(crate) fn is_id_collision(&self, table: &str) -> bool {
        match self {
            DataError::DieselResultError(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => info.message().contains(&format!("{table}.id")),
            _ => false,
        }
    }
}
