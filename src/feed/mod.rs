mod fetch;
mod records;
mod repair;
mod source;

pub use fetch::{FetchOptions, fetch_feed_text, parse, parse_url_with};
pub use records::{Enclosure, Episode, ItunesOwner, ParsedFeed, Podcast, PodcastImage, extract, parse_xml};
pub use repair::repair_truncated_feed;
pub use source::{FeedSource, is_url};
