// new_episode.rs
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

use chrono::{DateTime, NaiveDateTime};
use diesel::prelude::*;
use rss::Enclosure;

use crate::errors::DataError;
use crate::models::{json_column, non_empty, sanitize_html};
use crate::schema::episodes;

/// The columns of an episode that come out of its feed entry.
#[derive(Insertable, AsChangeset)]
#[diesel(table_name = episodes)]
#[diesel(treat_none_as_null = true)]
#[derive(Debug, Clone, Default, Builder, PartialEq)]
#[builder(default)]
#[builder(derive(Debug))]
#[builder(setter(into))]
pub(crate) struct EpisodeContent {
    guid: Option<String>,
    title: String,
    description: Option<String>,
    link: Option<String>,
    published: Option<String>,
    published_parsed: Option<NaiveDateTime>,
    author: Option<String>,
    image: Option<String>,
    enclosures: Option<String>,
    itunes_ext: Option<String>,
    digest: String,
    last_fetch: NaiveDateTime,
}

impl EpisodeContent {
    /// Parses an `rss::Item` into an `EpisodeContent`.
    pub(crate) fn new(
        item: &rss::Item,
        digest: String,
        last_fetch: NaiveDateTime,
    ) -> Result<EpisodeContent, DataError> {
        let itunes = item.itunes_ext();

        let author = item.author().or_else(|| itunes.and_then(|ext| ext.author()));
        let image = itunes.and_then(|ext| ext.image());
        let enclosures: Vec<&Enclosure> = item.enclosure().into_iter().collect();
        let enclosures = Some(&enclosures).filter(|encs| !encs.is_empty());

        // Feeds lie about dates all the time, keep the raw value around too.
        let published = non_empty(item.pub_date());
        let published_parsed = published
            .as_deref()
            .and_then(|date| DateTime::parse_from_rfc2822(date).ok())
            .map(|date| date.naive_utc());

        EpisodeContentBuilder::default()
            .guid(non_empty(item.guid().map(|guid| guid.value())))
            .title(item.title().map(str::trim).unwrap_or_default())
            .description(item.description().map(sanitize_html))
            .link(non_empty(item.link()))
            .published(published)
            .published_parsed(published_parsed)
            .author(non_empty(author))
            .image(non_empty(image))
            .enclosures(json_column(enclosures)?)
            .itunes_ext(json_column(itunes)?)
            .digest(digest)
            .last_fetch(last_fetch)
            .build()
            .map_err(|err| DataError::Bail(err.to_string()))
    }

    /// Overwrite the episode `episode_id` in place.
    pub(crate) fn update(
        &self,
        con: &mut SqliteConnection,
        episode_id: &str,
    ) -> Result<(), DataError> {
        use crate::schema::episodes::dsl::*;

        info!("Updating {:?}", self.title);
        diesel::update(episodes.filter(id.eq(episode_id)))
            .set(self)
            .execute(con)
            .map(|_| ())
            .map_err(From::from)
    }

    pub(crate) fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }
}

/// An episode row that is about to be created.
#[derive(Insertable)]
#[diesel(table_name = episodes)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewEpisode {
    id: String,
    parent: String,
    #[diesel(embed)]
    content: EpisodeContent,
}

impl NewEpisode {
    pub(crate) fn new(id: String, parent: &str, content: EpisodeContent) -> NewEpisode {
        NewEpisode {
            id,
            parent: parent.to_owned(),
            content,
        }
    }

    pub(crate) fn insert(&self, con: &mut SqliteConnection) -> Result<(), DataError> {
        use crate::schema::episodes::dsl::*;

        info!("Inserting {:?}", self.content.title());
        diesel::insert_into(episodes)
            .values(self)
            .execute(con)
            .map(|_| ())
            .map_err(From::from)
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    /// Replace the id after it collided with an existing row.
    pub(crate) fn set_id(&mut self, value: String) {
        self.id = value;
    }
}
