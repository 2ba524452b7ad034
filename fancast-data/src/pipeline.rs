// pipeline.rs
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

//! The ingestion cycle of a single feed url.
//!
//! url -> conditional GET -> follow/record relocations -> parse `rss` ->
//! reconcile podcast -> reconcile episodes.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use reqwest::Client;
use url::Url;

use std::collections::HashSet;
use std::time::Duration;

use crate::database::Database;
use crate::dbqueries;
use crate::errors::DataError;
use crate::feed::Feed;
use crate::fetcher::{self, FetchOutcome};
use crate::models::ResponseHeaders;
use crate::reconcile::{Reconciled, Reconciler};

/// Redirect hops followed for a single url before giving up.
pub const MAX_REDIRECTS: usize = 5;

/// Result of a single request, after its effect on storage was recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Continue with this url.
    Moved(String),
    /// Nothing new, `last_fetch` was bumped.
    NotModified,
    /// A fresh document and the validators it was served with.
    Fetched {
        body: Vec<u8>,
        validators: ResponseHeaders,
    },
}

/// How the cycle of a url ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The feed at `url` answered `304`.
    NotModified { url: String },
    /// The feed was parsed and written under `url`.
    Reconciled { url: String, result: Reconciled },
}

impl IngestOutcome {
    /// The url the feed was last found at.
    pub fn url(&self) -> &str {
        match self {
            IngestOutcome::NotModified { url } | IngestOutcome::Reconciled { url, .. } => url,
        }
    }
}

/// Fetches feeds and hands them to the [`Reconciler`].
#[derive(Debug, Clone)]
pub struct Ingester {
    client: Client,
    reconciler: Reconciler,
}

impl Ingester {
    pub fn new(db: Database, timeout: Duration) -> Result<Ingester, DataError> {
        let client = fetcher::new_client(timeout)?;
        Ok(Ingester::with_client(db, client))
    }

    pub fn with_client(db: Database, client: Client) -> Ingester {
        Ingester {
            client,
            reconciler: Reconciler::new(db),
        }
    }

    pub fn database(&self) -> &Database {
        self.reconciler.database()
    }

    /// Run a full ingestion cycle for `url`.
    ///
    /// Follows up to [`MAX_REDIRECTS`] redirects, rewriting the stored url
    /// along the way, and honours `<itunes:new-feed-url>` in the document.
    pub async fn ingest(&self, url: &str) -> Result<IngestOutcome, DataError> {
        let mut current = url.to_owned();
        let mut visited = HashSet::new();
        visited.insert(current.clone());

        for _ in 0..=MAX_REDIRECTS {
            match self.resolve_url(&current).await? {
                Resolution::Moved(next) => {
                    if !visited.insert(next.clone()) {
                        return Err(DataError::RedirectLoop(next));
                    }
                    info!("Following redirect to {}", next);
                    current = next;
                }
                Resolution::NotModified => {
                    return Ok(IngestOutcome::NotModified { url: current });
                }
                Resolution::Fetched { body, validators } => {
                    return self.index(&current, &body, &validators);
                }
            }
        }

        Err(DataError::TooManyRedirects(url.to_owned()))
    }

    /// Make a single request for `url` and record what it means for storage.
    pub async fn resolve_url(&self, url: &str) -> Result<Resolution, DataError> {
        let validators = {
            let mut con = self.database().connection()?;
            dbqueries::get_response_headers(&mut con, url)?
        };

        match fetcher::fetch(&self.client, url, &validators).await? {
            FetchOutcome::Redirected(next) => {
                self.relocate(url, &next)?;
                Ok(Resolution::Moved(next))
            }
            FetchOutcome::NotModified => {
                let mut con = self.database().connection()?;
                dbqueries::touch_last_fetch(&mut con, url, now())?;
                Ok(Resolution::NotModified)
            }
            // The validators are written along with the document they came
            // with, once it was reconciled.
            FetchOutcome::Fetched { body, validators } => {
                Ok(Resolution::Fetched { body, validators })
            }
        }
    }

    fn index(
        &self,
        url: &str,
        body: &[u8],
        validators: &ResponseHeaders,
    ) -> Result<IngestOutcome, DataError> {
        let feed = Feed::from_bytes(body)?;

        let mut url = url.to_owned();
        if let Some(new_url) = relocation_target(&feed, &url) {
            info!("{} says it moved to {}", url, new_url);
            self.relocate(&url, &new_url)?;
            url = new_url;
        }

        let result = self.reconciler.reconcile(&feed, &url, validators, now())?;
        Ok(IngestOutcome::Reconciled { url, result })
    }

    /// Point the podcast stored under `old` at `new`.
    ///
    /// Left alone when there is nothing under `old`, or when `new` already
    /// belongs to another podcast.
    fn relocate(&self, old: &str, new: &str) -> Result<(), DataError> {
        let mut pooled = self.database().connection()?;
        let con: &mut SqliteConnection = &mut pooled;

        con.transaction(|con| {
            if !dbqueries::podcast_exists(con, old)? {
                return Ok(());
            }

            if dbqueries::podcast_exists(con, new)? {
                warn!(
                    "{} moved to {}, which is already indexed. Keeping both.",
                    old, new
                );
                return Ok(());
            }

            dbqueries::update_feed_url(con, old, new)?;
            info!("Feed url {} was updated to {}", old, new);
            Ok(())
        })
    }
}

/// The `<itunes:new-feed-url>` of `feed`, if it is a usable url other than
/// `current`.
fn relocation_target(feed: &Feed, current: &str) -> Option<String> {
    let candidate = feed.new_feed_url()?;
    match Url::parse(candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            let url = String::from(url);
            Some(url).filter(|url| url != current)
        }
        _ => {
            warn!("Ignoring invalid new-feed-url {:?} in {}", candidate, current);
            None
        }
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
