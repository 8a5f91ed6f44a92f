// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use url::Url;

/// Where a feed comes from.
///
/// Text and URLs are told apart by type: a string is always treated as XML,
/// even when it looks like a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Literal feed XML
    Xml(String),
    /// Remote feed to fetch
    Url(Url),
}

impl From<&str> for FeedSource {
    fn from(xml: &str) -> Self {
        FeedSource::Xml(xml.to_string())
    }
}

impl From<String> for FeedSource {
    fn from(xml: String) -> Self {
        FeedSource::Xml(xml)
    }
}

impl From<Url> for FeedSource {
    fn from(url: Url) -> Self {
        FeedSource::Url(url)
    }
}

impl From<&Url> for FeedSource {
    fn from(url: &Url) -> Self {
        FeedSource::Url(url.clone())
    }
}

/// Determine if a command-line argument is a URL or a file path
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_url_detects_http() {
        assert!(is_url("http://example.com/feed.xml"));
        assert!(is_url("https://example.com/feed.xml"));
    }

    #[test]
    fn is_url_rejects_file_paths() {
        assert!(!is_url("/path/to/feed.xml"));
        assert!(!is_url("./feed.xml"));
        assert!(!is_url("feed.xml"));
    }

    #[test]
    fn strings_are_always_xml() {
        assert_eq!(
            FeedSource::from("https://example.com/feed.xml"),
            FeedSource::Xml("https://example.com/feed.xml".to_string())
        );
    }

    #[test]
    fn urls_are_urls() {
        let url = Url::parse("https://example.com/feed.xml").unwrap();
        assert_eq!(FeedSource::from(&url), FeedSource::Url(url.clone()));
        assert_eq!(FeedSource::from(url.clone()), FeedSource::Url(url));
    }
}
