//! Rendered documents, as produced by the harvesting pipeline.

use scraper::Html;

/// A parsed document that can be snapshotted to disk.
pub trait Document {
    /// The location the document was loaded from.
    fn base_uri(&self) -> &str;

    /// Full markup of the document, re-serialized from its tree.
    fn outer_html(&self) -> String;
}

/// An HTML document parsed with [`scraper`], remembering where it came from.
pub struct HtmlDocument {
    base_uri: String,
    html: Html,
}
impl HtmlDocument {
    /// Parse `markup` as a full HTML document. Parsing never fails; broken
    /// markup is repaired the way a browser would.
    pub fn parse(base_uri: impl Into<String>, markup: &str) -> Self {
        Self { base_uri: base_uri.into(), html: Html::parse_document(markup) }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }
}
impl Document for HtmlDocument {
    fn base_uri(&self) -> &str {
        &self.base_uri
    }

    fn outer_html(&self) -> String {
        self.html.html()
    }
}
