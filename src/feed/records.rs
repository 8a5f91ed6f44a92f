// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::FeedError;
use crate::xml::{XmlDocument, XmlElement, normalize, parse_lenient};

/// Show-level data of a podcast feed.
///
/// Every field is always present; elements missing from the feed come out as
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Podcast {
    pub copyright: String,
    pub content_encoded: String,
    pub description: String,
    pub feed_url: String,
    pub image: PodcastImage,
    pub itunes_author: String,
    /// Only the outermost `itunes:category`; nested sub-categories are not kept
    pub itunes_category: String,
    pub itunes_explicit: String,
    pub itunes_image: String,
    pub itunes_owner: ItunesOwner,
    pub itunes_subtitle: String,
    pub itunes_summary: String,
    pub itunes_type: String,
    pub language: String,
    pub link: String,
    pub title: String,
}

/// The channel's `<image>` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastImage {
    pub link: String,
    pub title: String,
    pub url: String,
}

/// The channel's `<itunes:owner>` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItunesOwner {
    pub email: String,
    pub name: String,
}

/// One `<item>` of the feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub author: String,
    pub content_encoded: String,
    pub description: String,
    pub enclosure: Enclosure,
    pub guid: String,
    pub itunes_author: String,
    pub itunes_duration: String,
    pub itunes_episode: String,
    pub itunes_episode_type: String,
    pub itunes_explicit: String,
    pub itunes_subtitle: String,
    pub itunes_summary: String,
    pub itunes_title: String,
    pub link: String,
    /// Kept exactly as written in the feed
    pub pub_date: String,
    pub title: String,
}

/// Represents the media file attached to an episode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enclosure {
    pub url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Result of parsing a feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFeed {
    pub podcast: Podcast,
    pub episodes: Vec<Episode>,
}

/// Parse literal feed XML
pub fn parse_xml(xml: &str) -> Result<ParsedFeed, FeedError> {
    if xml.trim().is_empty() {
        return Err(FeedError::EmptyInput);
    }
    parse_feed_text(xml, None)
}

/// Normalize feed text and extract its records.
///
/// `feed_url` is the URL the text was fetched from, if any.
pub(crate) fn parse_feed_text(xml: &str, feed_url: Option<&Url>) -> Result<ParsedFeed, FeedError> {
    let normalized = normalize(xml)?;
    let document = parse_lenient(&normalized)?;
    extract(&document, feed_url)
}

/// Map a parsed document onto podcast and episode records.
///
/// Fails only when the document has no root element.
pub fn extract<D: XmlDocument>(document: &D, feed_url: Option<&Url>) -> Result<ParsedFeed, FeedError> {
    let root = document
        .document_element()
        .ok_or_else(|| FeedError::MalformedXml("document has no root element".to_string()))?;
    let image = document.first_element_by_tag_name("image");
    let owner = document.first_element_by_tag_name("itunes:owner");

    let podcast = Podcast {
        copyright: text_of(Some(root), "copyright"),
        content_encoded: text_of(Some(root), "content:encoded"),
        description: text_of(Some(root), "description"),
        feed_url: match feed_url {
            Some(url) => url.to_string(),
            None => self_link(document),
        },
        image: PodcastImage {
            link: text_of(image, "link"),
            title: text_of(image, "title"),
            url: text_of(image, "url"),
        },
        itunes_author: text_of(Some(root), "itunes:author"),
        itunes_category: attribute_of(document.first_element_by_tag_name("itunes:category"), "text"),
        itunes_explicit: text_of(Some(root), "itunes:explicit"),
        itunes_image: attribute_of(document.first_element_by_tag_name("itunes:image"), "href"),
        itunes_owner: ItunesOwner {
            email: text_of(owner, "itunes:email"),
            name: text_of(owner, "itunes:name"),
        },
        itunes_subtitle: text_of(Some(root), "itunes:subtitle"),
        itunes_summary: text_of(Some(root), "itunes:summary"),
        itunes_type: text_of(Some(root), "itunes:type"),
        language: text_of(Some(root), "language"),
        link: text_of(Some(root), "link"),
        title: text_of(Some(root), "title"),
    };

    let episodes: Vec<Episode> = document
        .elements_by_tag_name("item")
        .into_iter()
        .map(episode_from_item)
        .collect();

    debug!(title = %podcast.title, episodes = episodes.len(), "Extracted feed");

    Ok(ParsedFeed { podcast, episodes })
}

fn episode_from_item<E: XmlElement>(item: &E) -> Episode {
    let enclosure = item.first_element_by_tag_name("enclosure");
    let item = Some(item);

    Episode {
        author: text_of(item, "author"),
        content_encoded: text_of(item, "content:encoded"),
        description: text_of(item, "description"),
        enclosure: Enclosure {
            url: attribute_of(enclosure, "url"),
            mime_type: attribute_of(enclosure, "type"),
        },
        guid: text_of(item, "guid"),
        itunes_author: text_of(item, "itunes:author"),
        itunes_duration: text_of(item, "itunes:duration"),
        itunes_episode: text_of(item, "itunes:episode"),
        itunes_episode_type: text_of(item, "itunes:episodeType"),
        itunes_explicit: text_of(item, "itunes:explicit"),
        itunes_subtitle: text_of(item, "itunes:subtitle"),
        itunes_summary: text_of(item, "itunes:summary"),
        itunes_title: text_of(item, "itunes:title"),
        link: text_of(item, "link"),
        pub_date: text_of(item, "pubDate"),
        title: text_of(item, "title"),
    }
}

/// Text of the first element named `tag` below `parent`, or empty
fn text_of<E: XmlElement>(parent: Option<&E>, tag: &str) -> String {
    parent
        .and_then(|parent| parent.first_element_by_tag_name(tag))
        .map(|element| element.text_content())
        .unwrap_or_default()
}

fn attribute_of<E: XmlElement>(element: Option<&E>, name: &str) -> String {
    element
        .and_then(|element| element.attribute(name))
        .map(str::to_owned)
        .unwrap_or_default()
}

/// `href` of the feed's own `atom:link`, preferring `rel="self"`
fn self_link<D: XmlDocument>(document: &D) -> String {
    let links = document.elements_by_tag_name("atom:link");
    let link = links
        .iter()
        .find(|link| link.attribute("rel") == Some("self"))
        .or_else(|| links.first());
    attribute_of(link.copied(), "href")
}
