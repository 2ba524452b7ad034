// mod.rs
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

mod new_episode;
mod new_podcast;

mod episode;
mod podcast;

use serde::Serialize;

use crate::errors::DataError;

pub(crate) use self::new_episode::{EpisodeContent, NewEpisode};
pub(crate) use self::new_podcast::{NewPodcast, PodcastMetadata};

#[cfg(test)]
pub(crate) use self::new_episode::EpisodeContentBuilder;
#[cfg(test)]
pub(crate) use self::new_podcast::PodcastMetadataBuilder;

pub use self::episode::Episode;
pub use self::podcast::{Podcast, ResponseHeaders};

/// Serialize an optional block of the feed into a JSON column.
pub(crate) fn json_column<T: Serialize + ?Sized>(
    value: Option<&T>,
) -> Result<Option<String>, DataError> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(From::from)
}

pub(crate) fn sanitize_html(html: &str) -> String {
    ammonia::Builder::new()
        // Remove `rel` attributes from `<a>` tags
        .link_rel(None)
        .clean(html.trim())
        .to_string()
}

/// Trimmed, with blank strings treated as missing.
pub(crate) fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}
