// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::borrow::Cow;

use tracing::debug;

use crate::error::FeedError;

use super::Document;

const SYNTHETIC_ROOT: &str = "root";

/// Parse text leniently, wrapping it in a synthetic root element first when it
/// does not start with a tag.
pub fn parse_lenient(xml: &str) -> Result<Document, FeedError> {
    let text = if xml.starts_with('<') {
        Cow::Borrowed(xml)
    } else {
        debug!("Input does not start with a tag, wrapping it in <{SYNTHETIC_ROOT}>");
        Cow::Owned(format!("<{SYNTHETIC_ROOT}>{xml}</{SYNTHETIC_ROOT}>"))
    };
    Document::parse(&text)
}

/// Turn possibly malformed XML into well-formed XML.
///
/// The text goes through a parse and re-serialize round-trip: undefined
/// entities come out escaped, unclosed elements come out closed, and anything
/// the parser could not make sense of is dropped.
pub fn normalize(xml: &str) -> Result<String, FeedError> {
    Ok(parse_lenient(xml)?.to_xml())
}
