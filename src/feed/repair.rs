// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::debug;

const ITEM_END_TAG: &str = "</item>";

/// Closing tags of the `<rss><channel>` container around the items
const FEED_END_TAGS: &str = "</channel></rss>";

/// Repair a feed that was cut off by a ranged request.
///
/// Everything after the last complete `</item>` is dropped and the channel
/// and rss elements are closed again. Text without a complete item is
/// returned unchanged.
///
/// This is a textual patch for RSS's `rss > channel > item` layout and is only
/// meant for bodies fetched with a `Range` header.
pub fn repair_truncated_feed(xml: &str) -> String {
    let Some(index) = xml.rfind(ITEM_END_TAG) else {
        debug!("No complete item in truncated feed, leaving it unchanged");
        return xml.to_string();
    };

    let end = index + ITEM_END_TAG.len();
    debug!(
        kept_bytes = end,
        dropped_bytes = xml.len() - end,
        "Trimming truncated feed after last complete item"
    );

    let mut repaired = String::with_capacity(end + FEED_END_TAGS.len());
    repaired.push_str(&xml[..end]);
    repaired.push_str(FEED_END_TAGS);
    repaired
}
