// dbqueries.rs
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

//! Random CRUD helper functions.
//!
//! Everything here borrows a connection so callers decide what runs inside
//! which transaction.

use chrono::{Duration, NaiveDateTime};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::select;

use std::collections::HashSet;

use crate::errors::DataError;
use crate::models::{Episode, Podcast, ResponseHeaders};

pub fn get_podcasts(con: &mut SqliteConnection) -> Result<Vec<Podcast>, DataError> {
    use crate::schema::podcasts::dsl::*;

    podcasts
        .order(title.asc())
        .select(Podcast::as_select())
        .load(con)
        .map_err(From::from)
}

pub fn get_podcast_from_url(
    con: &mut SqliteConnection,
    url: &str,
) -> Result<Podcast, DataError> {
    use crate::schema::podcasts::dsl::*;

    podcasts
        .filter(feed_url.eq(url))
        .select(Podcast::as_select())
        .get_result(con)
        .map_err(From::from)
}

/// Like `get_podcast_from_url`, but a missing row is `None` instead of an
/// error.
pub fn find_podcast_from_url(
    con: &mut SqliteConnection,
    url: &str,
) -> Result<Option<Podcast>, DataError> {
    use crate::schema::podcasts::dsl::*;

    podcasts
        .filter(feed_url.eq(url))
        .select(Podcast::as_select())
        .get_result(con)
        .optional()
        .map_err(From::from)
}

pub fn podcast_exists(con: &mut SqliteConnection, url: &str) -> Result<bool, DataError> {
    use crate::schema::podcasts::dsl::*;

    select(exists(podcasts.filter(feed_url.eq(url))))
        .get_result(con)
        .map_err(From::from)
}

pub fn get_episodes(con: &mut SqliteConnection) -> Result<Vec<Episode>, DataError> {
    use crate::schema::episodes::dsl::*;

    episodes
        .order(published_parsed.desc())
        .select(Episode::as_select())
        .load(con)
        .map_err(From::from)
}

/// Episodes of `podcast`, newest first.
pub fn get_podcast_episodes(
    con: &mut SqliteConnection,
    podcast: &Podcast,
) -> Result<Vec<Episode>, DataError> {
    use crate::schema::episodes::dsl::*;

    Episode::belonging_to(podcast)
        .order(published_parsed.desc())
        .select(Episode::as_select())
        .load(con)
        .map_err(From::from)
}

/// The validators stored for `url`. Empty if there is no such podcast.
pub(crate) fn get_response_headers(
    con: &mut SqliteConnection,
    url: &str,
) -> Result<ResponseHeaders, DataError> {
    use crate::schema::podcasts::dsl::*;

    let blob = podcasts
        .filter(feed_url.eq(url))
        .select(response_headers)
        .get_result::<Option<String>>(con)
        .optional()?
        .flatten();

    Ok(ResponseHeaders::from_json(blob.as_deref()))
}

pub(crate) fn store_response_headers(
    con: &mut SqliteConnection,
    url: &str,
    headers: &ResponseHeaders,
) -> Result<usize, DataError> {
    use crate::schema::podcasts::dsl::*;

    let blob = headers.to_json()?;
    diesel::update(podcasts.filter(feed_url.eq(url)))
        .set(response_headers.eq(blob))
        .execute(con)
        .map_err(From::from)
}

/// Point the podcast at `old` to `new`. Its `id`, and so its episodes, stay
/// untouched.
pub(crate) fn update_feed_url(
    con: &mut SqliteConnection,
    old: &str,
    new: &str,
) -> Result<usize, DataError> {
    use crate::schema::podcasts::dsl::*;

    diesel::update(podcasts.filter(feed_url.eq(old)))
        .set(feed_url.eq(new))
        .execute(con)
        .map_err(From::from)
}

pub(crate) fn touch_last_fetch(
    con: &mut SqliteConnection,
    url: &str,
    now: NaiveDateTime,
) -> Result<usize, DataError> {
    use crate::schema::podcasts::dsl::*;

    diesel::update(podcasts.filter(feed_url.eq(url)))
        .set(last_fetch.eq(now))
        .execute(con)
        .map_err(From::from)
}

/// Record a fetch that found nothing new, along with the poll interval
/// that follows from it.
pub(crate) fn touch_podcast(
    con: &mut SqliteConnection,
    url: &str,
    now: NaiveDateTime,
    hours: i32,
) -> Result<usize, DataError> {
    use crate::schema::podcasts::dsl::*;

    diesel::update(podcasts.filter(feed_url.eq(url)))
        .set((last_fetch.eq(now), poll_frequency.eq(hours)))
        .execute(con)
        .map_err(From::from)
}

/// Digests of every episode of `parent_id`, in a single query.
pub(crate) fn get_episode_digests(
    con: &mut SqliteConnection,
    parent_id: &str,
) -> Result<HashSet<String>, DataError> {
    use crate::schema::episodes::dsl::*;

    episodes
        .filter(parent.eq(parent_id))
        .select(digest)
        .load::<String>(con)
        .map(|digests| digests.into_iter().collect())
        .map_err(From::from)
}

/// Look up an episode by guid. Guids are only unique within a podcast.
pub(crate) fn get_episode_id_from_guid(
    con: &mut SqliteConnection,
    parent_id: &str,
    guid_: &str,
) -> Result<Option<String>, DataError> {
    use crate::schema::episodes::dsl::*;

    if guid_.is_empty() {
        return Ok(None);
    }

    episodes
        .filter(parent.eq(parent_id))
        .filter(guid.eq(guid_))
        .select(id)
        .first::<String>(con)
        .optional()
        .map_err(From::from)
}

/// Feed urls whose last fetch is more than `poll_frequency` hours old.
pub fn get_feeds_due(
    con: &mut SqliteConnection,
    now: NaiveDateTime,
) -> Result<Vec<String>, DataError> {
    use crate::schema::podcasts::dsl::*;

    let feeds = podcasts
        .select((feed_url, last_fetch, poll_frequency))
        .order(last_fetch.asc())
        .load::<(String, NaiveDateTime, i32)>(con)?;

    let due = feeds
        .into_iter()
        .filter(|(_, fetched, hours)| now - *fetched > Duration::hours(i64::from(*hours)))
        .map(|(url, _, _)| url)
        .collect();

    Ok(due)
}
