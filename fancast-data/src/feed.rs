// feed.rs
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

//! Parsed Feeds.

use rss::Channel;

use crate::errors::DataError;

/// Wrapper around the `rss::Channel` parsed out of a feed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    channel: Channel,
}

impl From<Channel> for Feed {
    fn from(channel: Channel) -> Self {
        Feed { channel }
    }
}

impl Feed {
    /// Parse the raw bytes of a feed document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Feed, DataError> {
        // Channel will do it's own decoding of strings
        // based on what is specified in <?xml encoding="..."?>.
        // So just pass it the raw bytes.
        Channel::read_from(bytes).map(Feed::from).map_err(From::from)
    }

    /// The channel this `Feed` wraps.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// The entries of the feed, in document order.
    pub fn entries(&self) -> &[rss::Item] {
        self.channel.items()
    }

    /// Where the publisher says the feed has moved to, if anywhere.
    ///
    /// See <https://help.apple.com/itc/podcasts_connect/#/itca489031e0>.
    pub fn new_feed_url(&self) -> Option<&str> {
        self.channel
            .itunes_ext()
            .and_then(|ext| ext.new_feed_url())
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_feeds::*;
    use anyhow::Result;

    #[test]
    fn test_from_bytes() -> Result<()> {
        let feed = Feed::from_bytes(FEED_THREE_EPISODES.as_bytes())?;
        assert_eq!(feed.channel().title(), "The Fancast Test Show");
        assert_eq!(feed.entries().len(), 3);
        assert_eq!(feed.new_feed_url(), None);
        Ok(())
    }

    #[test]
    fn test_from_bytes_garbage() {
        assert!(Feed::from_bytes(b"<html><body>Not a feed</body></html>").is_err());
        assert!(Feed::from_bytes(b"").is_err());
    }

    #[test]
    fn test_new_feed_url() -> Result<()> {
        let feed = Feed::from_bytes(FEED_RELOCATED.as_bytes())?;
        assert_eq!(feed.new_feed_url(), Some("https://new.example.com/feed.xml"));
        Ok(())
    }
}
