// main.rs
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

#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use fancast_data::{sources, worker};
use fancast_data::{Config, Database, IngestQueue, IngestReport, Ingester, WorkerHandle};

use std::env;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fancast-ingest", about = "Podcast feed ingester", version)]
struct Opt {
    /// Enable logging, use multiple `v`s to increase verbosity.
    /// Ignored when `RUST_LOG` is set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Path of the JSON config file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest the given feed urls once.
    Ingest {
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },
    /// Ingest every feed listed in a tab separated dataset.
    Import {
        #[arg(value_name = "FILE")]
        dataset: PathBuf,
    },
    /// Ingest the known feeds that are due for a poll.
    Update,
    /// Keep sweeping for due feeds until interrupted.
    Cron,
}

fn init_logger(verbosity: u8) {
    let mut builder = pretty_env_logger::formatted_builder();
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    } else {
        builder.filter_level(match verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        });
    }
    builder.init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();
    init_logger(opt.verbose);

    let config = Config::load(opt.config.as_deref()).context("Failed to load the config")?;
    let db_path = config.database_path()?;
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open the database at {}", db_path.display()))?;
    let ingester = Ingester::new(db.clone(), config.request_timeout())
        .context("Failed to build the http client")?;

    let cancel = CancellationToken::new();
    let (queue, handle) = worker::spawn(ingester, config.queue_capacity, cancel.clone());

    match opt.command {
        Command::Ingest { urls } => push_all(&queue, urls).await?,
        Command::Import { dataset } => {
            let urls = sources::read_dataset(&dataset)
                .with_context(|| format!("Failed to read {}", dataset.display()))?;
            push_all(&queue, urls).await?;
        }
        Command::Update => {
            let due = sources::due_feeds(&db, Utc::now().naive_utc())?;
            push_all(&queue, due).await?;
        }
        Command::Cron => {
            tokio::select! {
                res = sweep(&db, &queue, &config) => res?,
                res = signal::ctrl_c() => {
                    res.context("Failed to listen for Ctrl-C")?;
                    info!("Interrupted, finishing the queued feeds. Ctrl-C again to abort.");
                }
            }
        }
    }

    queue.close();
    let report = drain(handle, cancel).await?;
    debug!("{:?}", report);
    Ok(())
}

async fn push_all(queue: &IngestQueue, urls: Vec<String>) -> Result<()> {
    for url in urls {
        queue.push(url).await?;
    }
    Ok(())
}

async fn sweep(db: &Database, queue: &IngestQueue, config: &Config) -> Result<()> {
    let mut ticker = tokio::time::interval(config.sweep_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match sources::due_feeds(db, Utc::now().naive_utc()) {
            Ok(due) => push_all(queue, due).await?,
            // Try again on the next tick.
            Err(err) => error!("Failed to look up the due feeds: {}", err),
        }
    }
}

/// Wait for the worker, cancelling it on a second Ctrl-C.
async fn drain(handle: WorkerHandle, cancel: CancellationToken) -> Result<IngestReport> {
    let finished = handle.finished();
    tokio::pin!(finished);

    tokio::select! {
        report = &mut finished => Ok(report?),
        res = signal::ctrl_c() => {
            res.context("Failed to listen for Ctrl-C")?;
            warn!("Aborting the ingestion");
            cancel.cancel();
            Ok(finished.await?)
        }
    }
}
