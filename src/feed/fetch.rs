// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;

use tracing::debug;
use url::Url;

use crate::error::FeedError;
use crate::http::HttpClient;

use super::records::{ParsedFeed, parse_feed_text, parse_xml};
use super::repair::repair_truncated_feed;
use super::source::FeedSource;

const RANGE_HEADER: &str = "Range";

/// Options for fetching a remote feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Extra request headers, by name
    pub request_headers: BTreeMap<String, String>,
    /// Only request the first `request_size` bytes (None or 0 = whole feed).
    /// The cut-off body is repaired before parsing.
    pub request_size: Option<u64>,
}

impl FetchOptions {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_request_size(mut self, bytes: u64) -> Self {
        self.request_size = Some(bytes);
        self
    }

    fn range_end(&self) -> Option<u64> {
        self.request_size.filter(|&bytes| bytes > 0)
    }

    /// Headers to send, with the range header replacing any caller-supplied one
    pub fn headers(&self) -> Vec<(String, String)> {
        let range_end = self.range_end();

        let mut headers: Vec<(String, String)> = self
            .request_headers
            .iter()
            .filter(|(name, _)| range_end.is_none() || !name.eq_ignore_ascii_case(RANGE_HEADER))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if let Some(end) = range_end {
            headers.push((RANGE_HEADER.to_string(), format!("bytes=0-{end}")));
        }
        headers
    }
}

/// Fetch feed text from a URL.
///
/// A single request is made. With a `request_size` the body is treated as a
/// possibly truncated prefix and repaired.
pub async fn fetch_feed_text<C: HttpClient>(
    client: &C,
    url: &Url,
    options: &FetchOptions,
) -> Result<String, FeedError> {
    let ranged = options.range_end().is_some();
    debug!(url = %url, ranged, "Fetching feed");

    let response = client.get_text(url.as_str(), &options.headers()).await?;
    if !response.is_success() {
        debug!(url = %url, status = response.status, "Feed request was not successful");
        return Err(FeedError::FetchFailed);
    }

    if ranged {
        Ok(repair_truncated_feed(&response.body))
    } else {
        Ok(response.body)
    }
}

/// Parse a podcast feed from literal XML or a URL.
///
/// URLs are fetched in full; use [`parse_url_with`] for headers or ranged
/// requests.
pub async fn parse<C: HttpClient>(
    client: &C,
    source: impl Into<FeedSource>,
) -> Result<ParsedFeed, FeedError> {
    match source.into() {
        FeedSource::Xml(xml) => parse_xml(&xml),
        FeedSource::Url(url) => parse_url_with(client, &url, &FetchOptions::default()).await,
    }
}

/// Fetch and parse a podcast feed from a URL with explicit fetch options
pub async fn parse_url_with<C: HttpClient>(
    client: &C,
    url: &Url,
    options: &FetchOptions,
) -> Result<ParsedFeed, FeedError> {
    let xml = fetch_feed_text(client, url, options).await?;
    parse_feed_text(&xml, Some(url))
}
