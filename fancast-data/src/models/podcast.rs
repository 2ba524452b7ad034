// podcast.rs
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
use serde::{Deserialize, Serialize};

use crate::errors::DataError;
use crate::schema::podcasts;

#[derive(Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = podcasts)]
#[derive(Debug, Clone)]
/// Diesel Model of the podcasts table.
pub struct Podcast {
    id: String,
    feed_url: String,
    title: String,
    description: String,
    link: String,
    updated: Option<String>,
    author: Option<String>,
    language: Option<String>,
    image: Option<String>,
    itunes_ext: Option<String>,
    categories: Option<String>,
    copyright: Option<String>,
    digest: String,
    last_fetch: NaiveDateTime,
    last_change: Option<NaiveDateTime>,
    poll_frequency: i32,
    response_headers: Option<String>,
}

impl Podcast {
    /// Get the `id`. It never changes, even when the feed moves.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The url the feed is currently fetched from.
    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    /// Get the `title`.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Get the sanitized `description`.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the `link`.
    ///
    /// Usually the website/homepage of the content creator.
    pub fn link(&self) -> &str {
        &self.link
    }

    /// When the feed says it was last built or published, as written in the
    /// feed.
    pub fn updated(&self) -> Option<&str> {
        self.updated.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The channel `<image>` block, as JSON.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// The iTunes extension block, as JSON.
    pub fn itunes_ext(&self) -> Option<&str> {
        self.itunes_ext.as_deref()
    }

    /// The channel categories, as a JSON array.
    pub fn categories(&self) -> Option<&str> {
        self.categories.as_deref()
    }

    pub fn copyright(&self) -> Option<&str> {
        self.copyright.as_deref()
    }

    /// Fingerprint of the feed metadata as of the last change.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Last time the feed was successfully fetched, including `304` replies.
    pub fn last_fetch(&self) -> NaiveDateTime {
        self.last_fetch
    }

    /// Fetch time of the last observed change to the feed metadata.
    pub fn last_change(&self) -> Option<NaiveDateTime> {
        self.last_change
    }

    /// Hours between two fetches of this feed.
    pub fn poll_frequency(&self) -> i32 {
        self.poll_frequency
    }

    /// The cache validators of the last successful `200` reply.
    pub fn response_headers(&self) -> ResponseHeaders {
        ResponseHeaders::from_json(self.response_headers.as_deref())
    }
}

/// The HTTP cache validators of a feed, stored as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeaders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(
        rename = "last-modified",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<String>,
    #[serde(
        rename = "cache-control",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cache_control: Option<String>,
}

impl ResponseHeaders {
    /// Parse the stored blob.
    ///
    /// A missing or unreadable blob yields no validators, which just makes
    /// the next request unconditional.
    pub fn from_json(blob: Option<&str>) -> ResponseHeaders {
        match blob.map(serde_json::from_str::<ResponseHeaders>) {
            Some(Ok(headers)) => headers,
            Some(Err(err)) => {
                warn!("Ignoring unreadable response headers: {}", err);
                ResponseHeaders::default()
            }
            None => ResponseHeaders::default(),
        }
    }

    /// Serialize for storage. Nothing is stored when there is nothing to
    /// remember.
    pub fn to_json(&self) -> Result<Option<String>, DataError> {
        if self.is_empty() {
            return Ok(None);
        }

        serde_json::to_string(self).map(Some).map_err(From::from)
    }

    /// Whether there's an `etag` or a `last-modified` to send back.
    pub fn has_validators(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_validators() && self.cache_control.is_none()
    }
}
