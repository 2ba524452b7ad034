// episode.rs
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

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::models::Podcast;
use crate::schema::episodes;

#[derive(Queryable, Selectable, Identifiable, Associations, PartialEq)]
#[diesel(belongs_to(Podcast, foreign_key = parent))]
#[diesel(table_name = episodes)]
#[derive(Debug, Clone)]
/// Diesel Model of the episodes table.
pub struct Episode {
    id: String,
    parent: String,
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

impl Episode {
    /// Get the `id`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `id` of the podcast this episode belongs to.
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// The guid the feed published for this entry, if any.
    ///
    /// Only meaningful within its parent podcast.
    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// Get the value of the `title` field.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Get the sanitized `description`.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// The publication date exactly as the feed wrote it.
    pub fn published(&self) -> Option<&str> {
        self.published.as_deref()
    }

    /// The publication date in UTC, when the feed's one could be parsed.
    pub fn published_parsed(&self) -> Option<NaiveDateTime> {
        self.published_parsed
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// The media attachments, as a JSON array.
    pub fn enclosures(&self) -> Option<&str> {
        self.enclosures.as_deref()
    }

    /// The iTunes extension block, as JSON.
    pub fn itunes_ext(&self) -> Option<&str> {
        self.itunes_ext.as_deref()
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Last time this row was written.
    pub fn last_fetch(&self) -> NaiveDateTime {
        self.last_fetch
    }
}
