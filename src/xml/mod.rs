// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod dom;
mod normalizer;

pub use dom::{Document, Element, Node};
pub use normalizer::{normalize, parse_lenient};

/// Read access to an element of some XML tree.
///
/// Tag names are qualified names as written in the source (`itunes:author`),
/// and lookups search descendants in document order, like the DOM's
/// `getElementsByTagName`.
pub trait XmlElement {
    /// First descendant element with the given tag name
    fn first_element_by_tag_name(&self, name: &str) -> Option<&Self>;

    /// All descendant elements with the given tag name, in document order
    fn elements_by_tag_name(&self, name: &str) -> Vec<&Self>;

    /// Concatenated text of all descendant text and CDATA nodes
    fn text_content(&self) -> String;

    /// Attribute value by qualified name
    fn attribute(&self, name: &str) -> Option<&str>;
}

/// Read access to a whole XML document.
///
/// Document-level lookups include the top-level elements themselves.
pub trait XmlDocument {
    type Element: XmlElement;

    /// The first top-level element, if any
    fn document_element(&self) -> Option<&Self::Element>;

    fn first_element_by_tag_name(&self, name: &str) -> Option<&Self::Element>;

    fn elements_by_tag_name(&self, name: &str) -> Vec<&Self::Element>;
}
