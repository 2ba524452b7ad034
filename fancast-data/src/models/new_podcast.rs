// new_podcast.rs
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

use crate::errors::DataError;
use crate::feed::Feed;
use crate::models::{json_column, non_empty, sanitize_html};
use crate::schema::podcasts;

/// Everything about a podcast row that a changed feed rewrites.
#[derive(Insertable, AsChangeset)]
#[diesel(table_name = podcasts)]
#[diesel(treat_none_as_null = true)]
#[derive(Debug, Clone, Default, Builder, PartialEq)]
#[builder(default)]
#[builder(derive(Debug))]
#[builder(setter(into))]
pub(crate) struct PodcastMetadata {
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
}

impl PodcastMetadata {
    /// Extract the podcast columns out of a parsed `Feed`.
    pub(crate) fn new(
        feed: &Feed,
        digest: String,
        last_fetch: NaiveDateTime,
        last_change: NaiveDateTime,
        poll_frequency: i32,
    ) -> Result<PodcastMetadata, DataError> {
        let chan = feed.channel();

        let author = chan
            .itunes_ext()
            .and_then(|ext| ext.author())
            .or_else(|| chan.managing_editor());
        let updated = chan.last_build_date().or_else(|| chan.pub_date());
        let categories = Some(chan.categories()).filter(|cats| !cats.is_empty());

        PodcastMetadataBuilder::default()
            .title(chan.title().trim())
            .description(sanitize_html(chan.description()))
            .link(chan.link().trim())
            .updated(non_empty(updated))
            .author(non_empty(author))
            .language(non_empty(chan.language()))
            .image(json_column(chan.image())?)
            .itunes_ext(json_column(chan.itunes_ext())?)
            .categories(json_column(categories)?)
            .copyright(non_empty(chan.copyright()))
            .digest(digest)
            .last_fetch(last_fetch)
            .last_change(Some(last_change))
            .poll_frequency(poll_frequency)
            .build()
            .map_err(|err| DataError::Bail(err.to_string()))
    }

    /// Overwrite the metadata of the podcast currently living at `url`.
    pub(crate) fn update(&self, con: &mut SqliteConnection, url: &str) -> Result<(), DataError> {
        use crate::schema::podcasts::dsl::*;

        info!("Updating {}", self.title);
        diesel::update(podcasts.filter(feed_url.eq(url)))
            .set(self)
            .execute(con)
            .map(|_| ())
            .map_err(From::from)
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }
}

/// A podcast row that is about to be created.
#[derive(Insertable)]
#[diesel(table_name = podcasts)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewPodcast {
    id: String,
    feed_url: String,
    response_headers: Option<String>,
    #[diesel(embed)]
    metadata: PodcastMetadata,
}

impl NewPodcast {
    pub(crate) fn new(
        id: String,
        feed_url: &str,
        response_headers: Option<String>,
        metadata: PodcastMetadata,
    ) -> NewPodcast {
        NewPodcast {
            id,
            feed_url: feed_url.to_owned(),
            response_headers,
            metadata,
        }
    }

    pub(crate) fn insert(&self, con: &mut SqliteConnection) -> Result<(), DataError> {
        use crate::schema::podcasts::dsl::*;

        info!("Inserting {}", self.metadata.title());
        diesel::insert_into(podcasts)
            .values(self)
            .execute(con)
            .map(|_| ())
            .map_err(From::from)
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_feeds::*;
    use anyhow::Result;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_metadata_from_feed() -> Result<()> {
        let feed = get_feed(FEED_THREE_EPISODES);
        let metadata = PodcastMetadata::new(&feed, "digest".into(), now(), now(), 4)?;

        let expected = PodcastMetadataBuilder::default()
            .title("The Fancast Test Show")
            .description("A show about testing feed ingestion.")
            .link("https://example.com/show")
            .updated(Some("Mon, 05 Oct 2026 09:00:00 +0000".to_string()))
            .author(Some("Example Productions".to_string()))
            .language(Some("en-gb".to_string()))
            .image(json_column(feed.channel().image())?)
            .itunes_ext(json_column(feed.channel().itunes_ext())?)
            .categories(json_column(Some(feed.channel().categories()))?)
            .copyright(Some("2026 Example Productions".to_string()))
            .digest("digest")
            .last_fetch(now())
            .last_change(Some(now()))
            .poll_frequency(4)
            .build()?;

        assert_eq!(metadata, expected);
        Ok(())
    }

    #[test]
    fn test_metadata_json_columns() -> Result<()> {
        let feed = get_feed(FEED_THREE_EPISODES);
        let metadata = PodcastMetadata::new(&feed, "digest".into(), now(), now(), 4)?;

        let image: serde_json::Value = serde_json::from_str(metadata.image.as_deref().unwrap())?;
        assert_eq!(image["url"], "https://example.com/cover.jpg");

        let categories: serde_json::Value =
            serde_json::from_str(metadata.categories.as_deref().unwrap())?;
        assert_eq!(categories[0]["name"], "Technology");
        Ok(())
    }

    #[test]
    fn test_metadata_missing_optionals() -> Result<()> {
        let feed = get_feed(FEED_RELOCATED);
        let metadata = PodcastMetadata::new(&feed, "digest".into(), now(), now(), 4)?;

        assert_eq!(metadata.title(), "The Moving Show");
        assert_eq!(metadata.updated, None);
        assert_eq!(metadata.author, None);
        assert_eq!(metadata.image, None);
        assert_eq!(metadata.categories, None);
        assert_eq!(metadata.copyright, None);
        Ok(())
    }
}
