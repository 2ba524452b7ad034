// test_feeds.rs
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

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::feed::Feed;

pub const FEED_THREE_EPISODES: &str = include_str!("../tests/feeds/three-episodes.xml");
pub const FEED_THREE_EPISODES_UPDATED: &str =
    include_str!("../tests/feeds/three-episodes-updated.xml");
pub const FEED_FOUR_EPISODES: &str = include_str!("../tests/feeds/four-episodes.xml");
pub const FEED_RELOCATED: &str = include_str!("../tests/feeds/relocated.xml");

/// The `itunes:new-feed-url` inside `FEED_RELOCATED`.
pub const RELOCATED_TARGET: &str = "https://new.example.com/feed.xml";

pub const MOCK_FEED_SHOW: &str = "/show.xml";
pub const MOCK_FEED_MOVED: &str = "/moved.xml";
pub const MOCK_FEED_MISSING: &str = "/missing.xml";

pub const MOCK_ETAG: &str = "\"f21888f526ba083147754d5a4ac9a0c5\"";
pub const MOCK_LAST_MODIFIED: &str = "Fri, 16 Oct 2026 11:32:00 GMT";

/// Alternative `Feed` constructor to be used in tests.
pub fn get_feed(xml: &str) -> Feed {
    Feed::from_bytes(xml.as_bytes()).unwrap()
}

pub fn mock_feed_url(server: &MockServer, feed: &str) -> String {
    format!("{}{}", server.uri(), feed)
}

/// A `200` serving `body` with the mock validators attached.
pub fn feed_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "application/rss+xml; charset=utf-8")
        .insert_header("Cache-Control", "max-age=300")
        .insert_header("ETag", MOCK_ETAG)
        .insert_header("Last-Modified", MOCK_LAST_MODIFIED)
        .set_body_string(body)
}

/// Serve `body` at `route` unconditionally.
pub async fn mount_feed(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(feed_response(body))
        .mount(server)
        .await;
}
