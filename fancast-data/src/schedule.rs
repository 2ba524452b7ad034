// schedule.rs
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

//! Adaptive re-poll intervals.
//!
//! Feeds that have not changed in a long time get polled less often.

use chrono::{Duration, NaiveDateTime};

/// Poll interval, in hours, of a feed that changed recently.
pub const DEFAULT_POLL_HOURS: i32 = 4;

// (idle for more than, poll every) in hours, longest idle first.
const BACKOFF: [(i64, i32); 4] = [(730, 48), (168, 24), (48, 16), (24, 8)];

/// Hours until the feed should be fetched again.
///
/// Every threshold is strict: a feed idle for exactly 168 hours still polls
/// every 16 hours. A feed with no recorded change uses the default.
pub fn next_poll_hours(last_change: Option<NaiveDateTime>, now: NaiveDateTime) -> i32 {
    let Some(last_change) = last_change else {
        return DEFAULT_POLL_HOURS;
    };

    let idle = now - last_change;
    BACKOFF
        .iter()
        .find(|(hours, _)| idle > Duration::hours(*hours))
        .map(|(_, poll)| *poll)
        .unwrap_or(DEFAULT_POLL_HOURS)
}

/// The `last_change` to store after computing `new_digest` at `now`.
///
/// `previous` is carried forward while the digest stays the same.
pub fn last_change_for(
    stored_digest: Option<&str>,
    new_digest: &str,
    previous: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> NaiveDateTime {
    match stored_digest {
        Some(stored) if stored == new_digest => previous.unwrap_or(now),
        _ => now,
    }
}
