// lib.rs
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

#![allow(clippy::type_complexity)]
// Enable lint group collections
#![warn(nonstandard_style, bad_style, unused)]
// standalone lints
#![warn(
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    unconditional_recursion,
    while_true,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    elided_lifetimes_in_paths,
    rust_2018_idioms
)]

//! Podcast feed ingestion.
//!
//! Feed urls go into an [`IngestQueue`]. The worker behind it fetches each
//! one with conditional requests, follows and records relocations, and
//! reconciles the parsed document against the `podcasts` and `episodes`
//! tables of a [`Database`].

#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate log;

pub mod config;
pub mod database;
pub mod dbqueries;
pub mod digest;
pub mod errors;
mod feed;
pub mod fetcher;
pub mod identifier;
pub(crate) mod models;
pub mod pipeline;
pub mod reconcile;
pub(crate) mod schema;
pub mod schedule;
pub mod sources;
pub mod worker;

#[cfg(test)]
mod test_feeds;

pub use crate::config::Config;
pub use crate::database::Database;
pub use crate::errors::DataError;
pub use crate::feed::Feed;
pub use crate::models::{Episode, Podcast, ResponseHeaders};
pub use crate::pipeline::{IngestOutcome, Ingester};
pub use crate::reconcile::{EpisodeChanges, Reconciled, Reconciler};
pub use crate::worker::{IngestQueue, IngestReport, WorkerHandle};

/// The user-agent sent with every feed request.
pub const USER_AGENT: &str = concat!(
    "Fancast/",
    env!("CARGO_PKG_VERSION"),
    " (podcast feed ingester)"
);
