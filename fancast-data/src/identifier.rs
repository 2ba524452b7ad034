// identifier.rs
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

//! Record identifiers.
//!
//! Every `podcasts` and `episodes` row is keyed by a random version 4 UUID in
//! its hyphenated textual form.

use regex::Regex;
use uuid::Uuid;

use std::sync::LazyLock;

static UUID_V4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-4[0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$",
    )
    .expect("UUID_V4 is a valid regex")
});

/// Mint a new random identifier.
pub fn new_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Whether `candidate` is a version 4 UUID in canonical hyphenated form.
pub fn is_valid(candidate: &str) -> bool {
    UUID_V4.is_match(candidate)
}

/// Pick the identifier for a newly seen entry.
///
/// Feeds that already publish UUIDv4 guids keep them. Anything else gets a
/// freshly minted id. Never derive the id from the guid: guids are reused
/// across feeds and a derived id would collide the same way.
pub fn resolve_entry_id(guid: &str) -> String {
    if !guid.is_empty() && is_valid(guid) {
        return guid.to_owned();
    }

    new_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &[&str] = &[
        "7df4070a-9832-41e7-adac-cb37b05d5e24",
        "7C207A24-E33F-41E6-9438-EB45DCF36A1D",
        "00000000-0000-4000-8000-000000000000",
        "ffffffff-ffff-4fff-bfff-ffffffffffff",
    ];

    const INVALID: &[&str] = &[
        // version 1
        "7df4070a-9832-11e7-adac-cb37b05d5e24",
        // variant nibble `c`
        "7df4070a-9832-41e7-cdac-cb37b05d5e24",
        // no hyphens
        "7df4070a983241e7adaccb37b05d5e24",
        // braces
        "{7df4070a-9832-41e7-adac-cb37b05d5e24}",
        // trailing garbage
        "7df4070a-9832-41e7-adac-cb37b05d5e24x",
        "78A682B4-73E8-47B8-88C0-1BE62DD4EF9D-LUP",
        "https://example.com/episodes/214",
        "AU-20230622-0747-4100-A",
        " ",
    ];

    #[test]
    fn test_new_id_is_valid() {
        for _ in 0..64 {
            let id = new_id();
            assert!(is_valid(&id), "{id} is not a v4 uuid");
            assert_eq!(id, id.to_lowercase());
        }
    }

    #[test]
    fn test_new_ids_differ() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_is_valid() {
        for candidate in VALID {
            assert!(is_valid(candidate), "{candidate}");
        }
        for candidate in INVALID {
            assert!(!is_valid(candidate), "{candidate}");
        }
        assert!(!is_valid(""));
    }

    #[test]
    fn test_resolve_entry_id_reuses_valid_guids() {
        for guid in VALID {
            assert_eq!(resolve_entry_id(guid), *guid);
        }
    }

    #[test]
    fn test_resolve_entry_id_replaces_other_guids() {
        for guid in INVALID {
            let id = resolve_entry_id(guid);
            assert_ne!(&id, guid);
            assert!(is_valid(&id));
        }

        let id = resolve_entry_id("");
        assert!(is_valid(&id));
    }

    #[test]
    fn test_resolve_entry_id_is_not_derived_from_guid() {
        let guid = "https://example.com/episodes/214";
        assert_ne!(resolve_entry_id(guid), resolve_entry_id(guid));
    }
}
