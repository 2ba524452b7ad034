// reconcile.rs
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

//! Index Feeds.
//!
//! Decides, for one parsed feed, what has to be created, updated or left
//! alone, and writes it in a single transaction.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use std::collections::HashSet;

use crate::database::Database;
use crate::dbqueries;
use crate::digest::{entry_digest, feed_digest};
use crate::errors::DataError;
use crate::feed::Feed;
use crate::identifier;
use crate::models::{
    EpisodeContent, NewEpisode, NewPodcast, Podcast, PodcastMetadata, ResponseHeaders,
};
use crate::schedule::{last_change_for, next_poll_hours};

/// How many identifiers are drawn for a single row before giving up.
pub const MAX_ID_ATTEMPTS: usize = 5;

/// What a reconciliation did to the podcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// First time this feed url was seen.
    Created {
        podcast_id: String,
        episodes: EpisodeChanges,
    },
    /// The feed metadata changed.
    Updated {
        podcast_id: String,
        episodes: EpisodeChanges,
    },
    /// Same metadata as last time. Only the fetch time was recorded.
    Unchanged { podcast_id: String },
}

impl Reconciled {
    pub fn podcast_id(&self) -> &str {
        match self {
            Reconciled::Created { podcast_id, .. }
            | Reconciled::Updated { podcast_id, .. }
            | Reconciled::Unchanged { podcast_id } => podcast_id,
        }
    }
}

/// Episode writes of a single reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpisodeChanges {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum EpisodeState {
    Index(EpisodeContent),
    Update((EpisodeContent, String)),
    NotChanged,
}

/// Writes parsed feeds into the database.
#[derive(Debug, Clone)]
pub struct Reconciler {
    db: Database,
    mint: fn() -> String,
}

impl Reconciler {
    pub fn new(db: Database) -> Reconciler {
        Reconciler {
            db,
            mint: identifier::new_id,
        }
    }

    /// Use `mint` instead of random identifiers, to provoke collisions.
    #[cfg(test)]
    fn with_mint(db: Database, mint: fn() -> String) -> Reconciler {
        Reconciler { db, mint }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Reconcile `feed`, fetched from `url` at `now`, with what is stored.
    ///
    /// Either every write of the unit lands or none does.
    pub fn reconcile(
        &self,
        feed: &Feed,
        url: &str,
        validators: &ResponseHeaders,
        now: NaiveDateTime,
    ) -> Result<Reconciled, DataError> {
        let digest = feed_digest(feed)?;
        let mut pooled = self.db.connection()?;
        let con: &mut SqliteConnection = &mut pooled;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let res = con.transaction(|con| {
                self.reconcile_unit(con, feed, url, validators, &digest, now)
            });

            match res {
                Err(err) if err.is_id_collision("podcasts") => {
                    warn!(
                        "Podcast id collision for {} (attempt {}), retrying with a new id.",
                        url, attempt
                    );
                }
                res => return res,
            }
        }

        Err(DataError::IdentifierExhausted {
            table: "podcasts",
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    fn reconcile_unit(
        &self,
        con: &mut SqliteConnection,
        feed: &Feed,
        url: &str,
        validators: &ResponseHeaders,
        digest: &str,
        now: NaiveDateTime,
    ) -> Result<Reconciled, DataError> {
        let pd = match dbqueries::find_podcast_from_url(con, url)? {
            None => return self.create_podcast(con, feed, url, validators, digest, now),
            Some(pd) => pd,
        };

        // Validators only land together with the document they came with.
        dbqueries::store_response_headers(con, url, validators)?;

        if pd.digest() != digest {
            return self.update_podcast(con, feed, url, pd, digest, now);
        }

        let hours = next_poll_hours(pd.last_change(), now);
        dbqueries::touch_podcast(con, url, now, hours)?;
        debug!("{} has not changed", url);

        Ok(Reconciled::Unchanged {
            podcast_id: pd.id().to_owned(),
        })
    }

    fn create_podcast(
        &self,
        con: &mut SqliteConnection,
        feed: &Feed,
        url: &str,
        validators: &ResponseHeaders,
        digest: &str,
        now: NaiveDateTime,
    ) -> Result<Reconciled, DataError> {
        let last_change = last_change_for(None, digest, None, now);
        let hours = next_poll_hours(Some(last_change), now);
        let metadata = PodcastMetadata::new(feed, digest.to_owned(), now, last_change, hours)?;

        let pd = NewPodcast::new((self.mint)(), url, validators.to_json()?, metadata);
        pd.insert(con)?;

        let episodes = self.index_episodes(con, pd.id(), feed, HashSet::new(), now)?;
        info!(
            "Created podcast {} from {} with {} episodes",
            pd.id(),
            url,
            episodes.inserted
        );

        Ok(Reconciled::Created {
            podcast_id: pd.id().to_owned(),
            episodes,
        })
    }

    fn update_podcast(
        &self,
        con: &mut SqliteConnection,
        feed: &Feed,
        url: &str,
        old: Podcast,
        digest: &str,
        now: NaiveDateTime,
    ) -> Result<Reconciled, DataError> {
        let last_change = last_change_for(Some(old.digest()), digest, old.last_change(), now);
        let hours = next_poll_hours(Some(last_change), now);
        let metadata = PodcastMetadata::new(feed, digest.to_owned(), now, last_change, hours)?;
        metadata.update(con, url)?;

        let known = dbqueries::get_episode_digests(con, old.id())?;
        let episodes = self.index_episodes(con, old.id(), feed, known, now)?;
        info!(
            "Updated podcast {}: {} new, {} changed, {} unchanged episodes",
            old.id(),
            episodes.inserted,
            episodes.updated,
            episodes.unchanged
        );

        Ok(Reconciled::Updated {
            podcast_id: old.id().to_owned(),
            episodes,
        })
    }

    /// Write every entry whose digest is not in `known`.
    fn index_episodes(
        &self,
        con: &mut SqliteConnection,
        parent_id: &str,
        feed: &Feed,
        mut known: HashSet<String>,
        now: NaiveDateTime,
    ) -> Result<EpisodeChanges, DataError> {
        let mut changes = EpisodeChanges::default();

        for item in feed.entries() {
            let digest = entry_digest(item)?;

            match determine_ep_state(con, parent_id, item, &known, &digest, now)? {
                EpisodeState::NotChanged => changes.unchanged += 1,
                EpisodeState::Update((content, episode_id)) => {
                    content.update(con, &episode_id)?;
                    changes.updated += 1;
                }
                EpisodeState::Index(content) => {
                    self.insert_episode(con, parent_id, content)?;
                    changes.inserted += 1;
                }
            }

            // Entries repeated within the document are only written once.
            known.insert(digest);
        }

        Ok(changes)
    }

    fn insert_episode(
        &self,
        con: &mut SqliteConnection,
        parent_id: &str,
        content: EpisodeContent,
    ) -> Result<(), DataError> {
        let id = identifier::resolve_entry_id(content.guid().unwrap_or_default());
        let mut episode = NewEpisode::new(id, parent_id, content);

        for attempt in 1..=MAX_ID_ATTEMPTS {
            // Nested transactions are savepoints, a collision only rolls back
            // this insert.
            match con.transaction(|con| episode.insert(con)) {
                Err(err) if err.is_id_collision("episodes") => {
                    warn!(
                        "Episode id {} is taken (attempt {}), minting a new one.",
                        episode.id(),
                        attempt
                    );
                    episode.set_id((self.mint)());
                }
                res => return res,
            }
        }

        Err(DataError::IdentifierExhausted {
            table: "episodes",
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}

fn determine_ep_state(
    con: &mut SqliteConnection,
    parent_id: &str,
    item: &rss::Item,
    known: &HashSet<String>,
    digest: &str,
    now: NaiveDateTime,
) -> Result<EpisodeState, DataError> {
    if known.contains(digest) {
        return Ok(EpisodeState::NotChanged);
    }

    let content = EpisodeContent::new(item, digest.to_owned(), now)?;
    let existing = match content.guid() {
        Some(guid) => dbqueries::get_episode_id_from_guid(con, parent_id, guid)?,
        None => None,
    };

    match existing {
        Some(episode_id) => Ok(EpisodeState::Update((content, episode_id))),
        None => Ok(EpisodeState::Index(content)),
    }
}
