// digest.rs
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

//! Content fingerprints used to tell whether a feed or an entry changed.
//!
//! A digest is `SCHEME` followed by the hex encoded SHA-256 of the value's
//! serde serialization. The value is first turned into a `serde_json::Value`
//! so object keys always come out sorted, whatever map type the `rss` crate
//! uses internally.
//!
//! Digests only gate writes. They are not meant to be tamper proof.

use rss::extension::dublincore::DublinCoreExtension;
use rss::extension::itunes::ITunesChannelExtension;
use rss::extension::syndication::SyndicationExtension;
use rss::extension::ExtensionMap;
use rss::{Category, Cloud, Image, Item, TextInput};
use serde::Serialize;
use sha2::{Digest, Sha256};

use std::collections::BTreeMap;

use crate::errors::DataError;
use crate::feed::Feed;

/// Tag of the current digest scheme.
///
/// Bump it whenever the hashed representation changes, so stored digests
/// from the old scheme can never compare equal to new ones.
pub const SCHEME: &str = "v1-sha256:";

/// Every field of a channel except its items.
#[derive(Serialize)]
struct ChannelMetadata<'a> {
    title: &'a str,
    link: &'a str,
    description: &'a str,
    language: Option<&'a str>,
    copyright: Option<&'a str>,
    managing_editor: Option<&'a str>,
    webmaster: Option<&'a str>,
    pub_date: Option<&'a str>,
    last_build_date: Option<&'a str>,
    categories: &'a [Category],
    generator: Option<&'a str>,
    docs: Option<&'a str>,
    cloud: Option<&'a Cloud>,
    rating: Option<&'a str>,
    ttl: Option<&'a str>,
    image: Option<&'a Image>,
    text_input: Option<&'a TextInput>,
    skip_hours: &'a [String],
    skip_days: &'a [String],
    extensions: &'a ExtensionMap,
    itunes_ext: Option<&'a ITunesChannelExtension>,
    dublin_core_ext: Option<&'a DublinCoreExtension>,
    syndication_ext: Option<&'a SyndicationExtension>,
    namespaces: &'a BTreeMap<String, String>,
}

impl<'a> From<&'a rss::Channel> for ChannelMetadata<'a> {
    fn from(chan: &'a rss::Channel) -> Self {
        ChannelMetadata {
            title: chan.title(),
            link: chan.link(),
            description: chan.description(),
            language: chan.language(),
            copyright: chan.copyright(),
            managing_editor: chan.managing_editor(),
            webmaster: chan.webmaster(),
            pub_date: chan.pub_date(),
            last_build_date: chan.last_build_date(),
            categories: chan.categories(),
            generator: chan.generator(),
            docs: chan.docs(),
            cloud: chan.cloud(),
            rating: chan.rating(),
            ttl: chan.ttl(),
            image: chan.image(),
            text_input: chan.text_input(),
            skip_hours: chan.skip_hours(),
            skip_days: chan.skip_days(),
            extensions: chan.extensions(),
            itunes_ext: chan.itunes_ext(),
            dublin_core_ext: chan.dublin_core_ext(),
            syndication_ext: chan.syndication_ext(),
            namespaces: chan.namespaces(),
        }
    }
}

fn digest_of<T: Serialize>(value: &T) -> Result<String, DataError> {
    let canonical = serde_json::to_value(value)?;

    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, &canonical)?;

    Ok(format!("{}{}", SCHEME, hex::encode(hasher.finalize())))
}

/// Fingerprint of the feed's own metadata. Entries are not included.
pub fn feed_digest(feed: &Feed) -> Result<String, DataError> {
    digest_of(&ChannelMetadata::from(feed.channel()))
}

/// Fingerprint of a single entry.
pub fn entry_digest(item: &Item) -> Result<String, DataError> {
    digest_of(item)
}
