// fetcher.rs
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

//! Conditional HTTP requests for feed documents.
//!
//! Redirects are never followed here. The caller decides what a moved feed
//! means for storage, so every 3xx is handed back as
//! [`FetchOutcome::Redirected`].

use reqwest::header::{
    HeaderMap, HeaderName, CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
    LOCATION,
};
use reqwest::{redirect, Client, StatusCode};
use url::Url;

use std::time::Duration;

use crate::errors::DataError;
use crate::models::ResponseHeaders;
use crate::USER_AGENT;

/// How long a single feed request may take, connection included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What came back from a single request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The feed lives somewhere else now. Holds the absolute new url.
    Redirected(String),
    /// The stored validators still match.
    NotModified,
    /// A fresh copy of the document along with its validators.
    Fetched {
        body: Vec<u8>,
        validators: ResponseHeaders,
    },
}

/// Build the HTTP client used for every feed request.
pub fn new_client(timeout: Duration) -> Result<Client, DataError> {
    Client::builder()
        .redirect(redirect::Policy::none())
        // Set the UserAgent cause ppl still seem to check it for some reason...
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(From::from)
}

/// Issue a `GET` for `url`, conditional on whatever `validators` hold.
pub async fn fetch(
    client: &Client,
    url: &str,
    validators: &ResponseHeaders,
) -> Result<FetchOutcome, DataError> {
    let base = Url::parse(url)?;
    let mut target = base.clone();
    let credentials = take_credentials(&mut target)?;

    let mut req = client.get(target);
    if let Some((username, password)) = credentials {
        req = req.basic_auth(username, password);
    }
    if let Some(etag) = validators.etag.as_deref() {
        req = req.header(IF_NONE_MATCH, etag);
    }
    if let Some(lmod) = validators.last_modified.as_deref() {
        req = req.header(IF_MODIFIED_SINCE, lmod);
    }

    let res = req.send().await?;
    let status = res.status();
    debug!("{} returned {}", url, status);

    if status == StatusCode::NOT_MODIFIED {
        info!("304: {} is up to date", url);
        return Ok(FetchOutcome::NotModified);
    }

    if status.is_redirection() {
        let location = res
            .headers()
            .get(LOCATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| DataError::RedirectWithoutLocation(url.to_owned()))?;
        // Relative locations are resolved against the url that was asked for.
        let next = base.join(location)?;

        warn!("{}: {} moved to {}", status, url, next);
        return Ok(FetchOutcome::Redirected(next.into()));
    }

    if status.is_success() {
        let validators = validators_from(res.headers());
        let body = res.bytes().await?.to_vec();
        return Ok(FetchOutcome::Fetched { body, validators });
    }

    let context = match status.as_u16() {
        401 => "401: Unauthorized.",
        403 => "403: Forbidden.",
        404 => "404: Not found.",
        408 => "408: Request Timeout.",
        410 => "410: Feed was deleted.",
        _ => "Unexpected status.",
    };
    Err(DataError::HttpStatusGeneral {
        url: url.to_owned(),
        status_code: status,
        context: context.into(),
    })
}

/// Strip the userinfo out of `url` so it can go in an `Authorization`
/// header instead.
fn take_credentials(url: &mut Url) -> Result<Option<(String, Option<String>)>, DataError> {
    if url.username().is_empty() && url.password().is_none() {
        return Ok(None);
    }

    // url.username() converts @ symbols to %40 automatically. The "replace" undoes that.
    let username = url.username().replace("%40", "@");
    let password = url.password().map(|p| p.replace("%40", "@"));

    url.set_username("")
        .and_then(|_| url.set_password(None))
        .map_err(|_| DataError::Bail(format!("Cannot strip credentials from {url}")))?;

    Ok(Some((username, password)))
}

fn validators_from(headers: &HeaderMap) -> ResponseHeaders {
    let get = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(ToOwned::to_owned)
    };

    ResponseHeaders {
        etag: get(ETAG),
        last_modified: get(LAST_MODIFIED),
        cache_control: get(CACHE_CONTROL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_feeds::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mock_validators() -> ResponseHeaders {
        ResponseHeaders {
            etag: Some(MOCK_ETAG.into()),
            last_modified: Some(MOCK_LAST_MODIFIED.into()),
            cache_control: Some("max-age=300".into()),
        }
    }

    #[tokio::test]
    async fn test_fetched() -> Result<()> {
        let server = MockServer::start().await;
        mount_feed(&server, MOCK_FEED_SHOW, FEED_THREE_EPISODES).await;

        let client = new_client(DEFAULT_TIMEOUT)?;
        let url = mock_feed_url(&server, MOCK_FEED_SHOW);
        let outcome = fetch(&client, &url, &ResponseHeaders::default()).await?;

        let expected = FetchOutcome::Fetched {
            body: FEED_THREE_EPISODES.as_bytes().to_vec(),
            validators: mock_validators(),
        };
        assert_eq!(outcome, expected);

        // Nothing stored, so nothing conditional is sent.
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("if-none-match"));
        assert!(!requests[0].headers.contains_key("if-modified-since"));
        assert_eq!(
            requests[0].headers.get("user-agent").unwrap().to_str()?,
            USER_AGENT
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_not_modified() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MOCK_FEED_SHOW))
            .and(header("If-None-Match", MOCK_ETAG))
            .and(header_exists("If-Modified-Since"))
            .respond_with(ResponseTemplate::new(304))
            .expect(1)
            .mount(&server)
            .await;

        let client = new_client(DEFAULT_TIMEOUT)?;
        let url = mock_feed_url(&server, MOCK_FEED_SHOW);
        let outcome = fetch(&client, &url, &mock_validators()).await?;
        assert_eq!(outcome, FetchOutcome::NotModified);

        // The date is sent back verbatim.
        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].headers.get("if-modified-since").unwrap().to_str()?,
            MOCK_LAST_MODIFIED
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_only_present_validators_are_sent() -> Result<()> {
        let server = MockServer::start().await;
        mount_feed(&server, MOCK_FEED_SHOW, FEED_THREE_EPISODES).await;

        let client = new_client(DEFAULT_TIMEOUT)?;
        let url = mock_feed_url(&server, MOCK_FEED_SHOW);
        let validators = ResponseHeaders {
            etag: Some(MOCK_ETAG.into()),
            ..Default::default()
        };
        fetch(&client, &url, &validators).await?;

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].headers.get("if-none-match").unwrap().to_str()?,
            MOCK_ETAG
        );
        assert!(!requests[0].headers.contains_key("if-modified-since"));
        Ok(())
    }

    #[tokio::test]
    async fn test_redirected() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MOCK_FEED_SHOW))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("Location", "https://elsewhere.example.com/feed"),
            )
            .mount(&server)
            .await;
        // Relative locations resolve against the request url.
        Mock::given(method("GET"))
            .and(path(MOCK_FEED_MISSING))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", MOCK_FEED_MOVED))
            .mount(&server)
            .await;

        let client = new_client(DEFAULT_TIMEOUT)?;
        let none = ResponseHeaders::default();

        let url = mock_feed_url(&server, MOCK_FEED_SHOW);
        assert_eq!(
            fetch(&client, &url, &none).await?,
            FetchOutcome::Redirected("https://elsewhere.example.com/feed".into())
        );

        let url = mock_feed_url(&server, MOCK_FEED_MISSING);
        assert_eq!(
            fetch(&client, &url, &none).await?,
            FetchOutcome::Redirected(mock_feed_url(&server, MOCK_FEED_MOVED))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_redirect_without_location() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(308))
            .mount(&server)
            .await;

        let client = new_client(DEFAULT_TIMEOUT)?;
        let url = mock_feed_url(&server, MOCK_FEED_SHOW);
        let err = fetch(&client, &url, &ResponseHeaders::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::RedirectWithoutLocation(u) if u == url));
        Ok(())
    }

    #[tokio::test]
    async fn test_http_errors() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MOCK_FEED_MISSING))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(MOCK_FEED_SHOW))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = new_client(DEFAULT_TIMEOUT)?;
        let none = ResponseHeaders::default();

        let url = mock_feed_url(&server, MOCK_FEED_MISSING);
        match fetch(&client, &url, &none).await {
            Err(DataError::HttpStatusGeneral {
                status_code,
                context,
                ..
            }) => {
                assert_eq!(status_code, StatusCode::NOT_FOUND);
                assert_eq!(context, "404: Not found.");
            }
            other => panic!("unexpected {other:?}"),
        }

        let url = mock_feed_url(&server, MOCK_FEED_SHOW);
        match fetch(&client, &url, &none).await {
            Err(DataError::HttpStatusGeneral { status_code, .. }) => {
                assert_eq!(status_code, StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_basic_auth_from_userinfo() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MOCK_FEED_SHOW))
            // base64("user@example.com:secret")
            .and(header(
                "Authorization",
                "Basic dXNlckBleGFtcGxlLmNvbTpzZWNyZXQ=",
            ))
            .respond_with(feed_response(FEED_THREE_EPISODES))
            .expect(1)
            .mount(&server)
            .await;

        let mut url = Url::parse(&mock_feed_url(&server, MOCK_FEED_SHOW))?;
        url.set_username("user@example.com").unwrap();
        url.set_password(Some("secret")).unwrap();

        let client = new_client(DEFAULT_TIMEOUT)?;
        let outcome = fetch(&client, url.as_str(), &ResponseHeaders::default()).await?;
        assert!(matches!(outcome, FetchOutcome::Fetched { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() -> Result<()> {
        // Grab a free port, then stop listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let url = format!("http://{}{}", listener.local_addr()?, MOCK_FEED_SHOW);
        drop(listener);

        let client = new_client(Duration::from_secs(2))?;
        let res = fetch(&client, &url, &ResponseHeaders::default()).await;
        assert!(matches!(res, Err(DataError::RequestError(_))));
        Ok(())
    }
}
