// sources.rs
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

//! Producers of feed urls for the ingest queue.

use chrono::NaiveDateTime;
use url::Url;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::database::Database;
use crate::dbqueries;
use crate::errors::DataError;

// Zero based column of the feed url in a dataset row.
const DATASET_URL_COLUMN: usize = 3;

/// Urls of the known feeds whose poll interval has elapsed at `now`,
/// longest waiting first.
pub fn due_feeds(db: &Database, now: NaiveDateTime) -> Result<Vec<String>, DataError> {
    let mut con = db.connection()?;
    let due = dbqueries::get_feeds_due(&mut con, now)?;
    info!("{} feeds are due for a poll", due.len());
    Ok(due)
}

/// Read the feed urls out of a tab separated podcast dataset.
///
/// The url sits in the fourth column. Rows are split on every tab, so quoted
/// fields that contain tabs are not supported. A field wrapped in double
/// quotes is unwrapped. Rows that are too short or whose url does not parse
/// as `http(s)` are skipped with a warning.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DataError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut urls = Vec::new();

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let Some(field) = line.split('\t').nth(DATASET_URL_COLUMN) else {
            warn!("{}:{}: row has no feed url column", path.display(), n + 1);
            continue;
        };

        match dataset_url(field) {
            Some(url) => urls.push(url),
            None => warn!("{}:{}: skipping invalid url {:?}", path.display(), n + 1, field),
        }
    }

    info!("Read {} feed urls from {}", urls.len(), path.display());
    Ok(urls)
}

fn dataset_url(field: &str) -> Option<String> {
    let field = field.trim();
    let field = field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field);
    let url = Url::parse(field.trim()).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url.into()),
        _ => None,
    }
}
