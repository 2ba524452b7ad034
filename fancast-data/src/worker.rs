// worker.rs
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

//! Background ingestion of queued feed urls.
//!
//! Producers push urls into a bounded [`IngestQueue`]. A single task drains
//! it in FIFO order, one url at a time, until every queue handle is gone or
//! the cancellation token fires. A failing url is logged and counted, it
//! never stops the loop.
//!
//! Cancellation drops the in-flight request at its next await point. Storage
//! writes run synchronously between await points, so a transaction is never
//! cut in half.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::errors::DataError;
use crate::pipeline::{IngestOutcome, Ingester};

/// Sending half of the ingest queue.
///
/// Cheap to clone. The queue closes once every clone has been dropped or
/// closed.
#[derive(Debug, Clone)]
pub struct IngestQueue {
    tx: mpsc::Sender<String>,
}

impl IngestQueue {
    /// Queue `url`, waiting for room if the queue is full.
    pub async fn push<S: Into<String>>(&self, url: S) -> Result<(), DataError> {
        self.tx
            .send(url.into())
            .await
            .map_err(|_| DataError::QueueClosed)
    }

    /// Give up this handle. Equivalent to dropping it.
    pub fn close(self) {}
}

/// Tally of a worker's run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Feeds that were parsed and reconciled.
    pub ingested: usize,
    /// Feeds that answered `304`.
    pub not_modified: usize,
    pub failed: usize,
    /// Whether the run was cut short by the cancellation token.
    pub cancelled: bool,
}

impl IngestReport {
    fn record(&mut self, url: &str, res: Result<IngestOutcome, DataError>) {
        match res {
            Ok(IngestOutcome::NotModified { .. }) => self.not_modified += 1,
            Ok(IngestOutcome::Reconciled { url: final_url, .. }) => {
                if final_url != url {
                    info!("{} was ingested as {}", url, final_url);
                }
                self.ingested += 1;
            }
            Err(err) => {
                error!("Failed to ingest {}: {}", url, err);
                self.failed += 1;
            }
        }
    }

    /// Number of urls the worker finished, successfully or not.
    pub fn processed(&self) -> usize {
        self.ingested + self.not_modified + self.failed
    }
}

/// Completion handle of the worker task.
#[derive(Debug)]
pub struct WorkerHandle {
    task: JoinHandle<IngestReport>,
}

impl WorkerHandle {
    /// Wait until the queue was drained and closed, or the run cancelled.
    pub async fn finished(self) -> Result<IngestReport, DataError> {
        self.task
            .await
            .map_err(|err| DataError::Bail(format!("Ingest worker died: {err}")))
    }
}

/// Spawn the worker on the current tokio runtime.
///
/// `capacity` bounds how many urls may wait in the queue. It is raised to 1
/// if given as 0.
pub fn spawn(
    ingester: Ingester,
    capacity: usize,
    cancel: CancellationToken,
) -> (IngestQueue, WorkerHandle) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(run(ingester, rx, cancel));

    (IngestQueue { tx }, WorkerHandle { task })
}

async fn run(
    ingester: Ingester,
    mut rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
) -> IngestReport {
    let mut report = IngestReport::default();

    loop {
        let url = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Ingestion cancelled, {} urls left unprocessed", rx.len());
                report.cancelled = true;
                break;
            }
            msg = rx.recv() => match msg {
                Some(url) => url,
                None => {
                    debug!("Ingest queue closed and drained");
                    break;
                }
            },
        };

        debug!("Ingesting {}", url);
        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Ingestion cancelled, abandoning {}", url);
                report.cancelled = true;
                break;
            }
            res = ingester.ingest(&url) => res,
        };
        report.record(&url, res);
    }

    info!(
        "Ingest worker finished: {} ingested, {} not modified, {} failed",
        report.ingested, report.not_modified, report.failed
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::temporary_db;
    use crate::dbqueries;
    use crate::fetcher::DEFAULT_TIMEOUT;
    use crate::test_feeds::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use std::time::Duration;

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() -> Result<()> {
        let (_file, db) = temporary_db()?;
        let ingester = Ingester::new(db.clone(), DEFAULT_TIMEOUT)?;
        let server = MockServer::start().await;
        mount_feed(&server, MOCK_FEED_SHOW, FEED_THREE_EPISODES).await;
        mount_feed(&server, MOCK_FEED_MOVED, FEED_RELOCATED).await;
        Mock::given(method("GET"))
            .and(path(MOCK_FEED_MISSING))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (queue, handle) = spawn(ingester, 5, CancellationToken::new());
        queue.push(mock_feed_url(&server, MOCK_FEED_SHOW)).await?;
        queue.push(mock_feed_url(&server, MOCK_FEED_MISSING)).await?;
        queue.push("not even a url").await?;
        queue.push(mock_feed_url(&server, MOCK_FEED_MOVED)).await?;
        queue.close();

        let report = handle.finished().await?;
        assert_eq!(
            report,
            IngestReport {
                ingested: 2,
                not_modified: 0,
                failed: 2,
                cancelled: false,
            }
        );

        let mut con = db.connection()?;
        assert_eq!(dbqueries::get_podcasts(&mut con)?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_queue_is_fifo_per_producer() -> Result<()> {
        let (_file, db) = temporary_db()?;
        let ingester = Ingester::new(db.clone(), DEFAULT_TIMEOUT)?;
        let server = MockServer::start().await;
        mount_feed(&server, MOCK_FEED_SHOW, FEED_THREE_EPISODES).await;

        let url = mock_feed_url(&server, MOCK_FEED_SHOW);
        let (queue, handle) = spawn(ingester, 1, CancellationToken::new());
        // The same feed twice: created first, then found unchanged.
        queue.push(url.clone()).await?;
        queue.push(url.clone()).await?;
        drop(queue);

        let report = handle.finished().await?;
        assert_eq!(report.ingested, 2);
        assert_eq!(report.processed(), 2);

        let mut con = db.connection()?;
        let pd = dbqueries::get_podcast_from_url(&mut con, &url)?;
        assert!(pd.last_fetch() > pd.last_change().unwrap());
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_before_start() -> Result<()> {
        let (_file, db) = temporary_db()?;
        let ingester = Ingester::new(db, DEFAULT_TIMEOUT)?;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (queue, handle) = spawn(ingester, 5, cancel);
        let report = handle.finished().await?;
        assert!(report.cancelled);
        assert_eq!(report.processed(), 0);

        // Nobody is listening anymore.
        let res = queue.push("https://example.com/feed.xml").await;
        assert!(matches!(res, Err(DataError::QueueClosed)));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_abandons_inflight_fetch() -> Result<()> {
        let (_file, db) = temporary_db()?;
        let ingester = Ingester::new(db.clone(), DEFAULT_TIMEOUT)?;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MOCK_FEED_SHOW))
            .respond_with(feed_response(FEED_THREE_EPISODES).set_delay(Duration::from_secs(30)))
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let (queue, handle) = spawn(ingester, 5, cancel.clone());
        queue.push(mock_feed_url(&server, MOCK_FEED_SHOW)).await?;

        // Let the request get in flight.
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();

        let report = tokio::time::timeout(Duration::from_secs(5), handle.finished()).await??;
        assert!(report.cancelled);
        assert_eq!(report.processed(), 0);

        let mut con = db.connection()?;
        assert!(dbqueries::get_podcasts(&mut con)?.is_empty());
        Ok(())
    }
}
