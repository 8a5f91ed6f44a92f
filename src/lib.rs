pub mod error;
pub mod feed;
pub mod http;
pub mod xml;

// Re-export main types for convenience
pub use error::FeedError;
pub use feed::{
    Enclosure, Episode, FeedSource, FetchOptions, ItunesOwner, ParsedFeed, Podcast, PodcastImage,
    extract, fetch_feed_text, is_url, parse, parse_url_with, parse_xml, repair_truncated_feed,
};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use xml::{Document, Element, Node, XmlDocument, XmlElement, normalize};
