//! Document-store wire types.

use serde::{Deserialize, Serialize};

/// The cached-document body schema stored under a content address.
///
/// `content` holds the page bytes decoded as UTF-8 (lossy); `timestamp`
/// is epoch seconds as a float. Repeated puts for the same address
/// overwrite the document; nothing in this crate ever deletes one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedDocument {
    pub url: String,
    pub content: String,
    pub timestamp: f64,
}

/// Envelope returned by a document GET.
#[derive(Debug, Deserialize)]
pub struct GetDocumentResponse {
    #[serde(default)]
    pub found: bool,
    #[serde(default, rename = "_source")]
    pub source: Option<CachedDocument>,
}

impl GetDocumentResponse {
    /// The stored document, when the lookup actually found one.
    pub fn into_document(self) -> Option<CachedDocument> {
        if self.found { self.source } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_JSON: &str = r#"{
        "_index": "evergreen",
        "_id": "abc123",
        "found": true,
        "_source": {
            "url": "http://example.com:80/",
            "content": "<html>hello</html>",
            "timestamp": 1722400000.25
        }
    }"#;

    #[test]
    fn test_deserialize_found_document() {
        let response: GetDocumentResponse = serde_json::from_str(FIXTURE_JSON).unwrap();
        assert!(response.found);

        let doc = response.into_document().unwrap();
        assert_eq!(doc.url, "http://example.com:80/");
        assert_eq!(doc.content, "<html>hello</html>");
        assert_eq!(doc.timestamp, 1722400000.25);
    }

    #[test]
    fn test_not_found_has_no_document() {
        let json = r#"{"found": false}"#;
        let response: GetDocumentResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_document().is_none());
    }

    #[test]
    fn test_found_without_source_is_none() {
        let json = r#"{"found": true}"#;
        let response: GetDocumentResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_document().is_none());
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = CachedDocument {
            url: "http://example.com:80/".into(),
            content: "body".into(),
            timestamp: 1722400000.0,
        };
        let json = serde_json::to_string(&doc).unwrap();
        let back: CachedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.url, doc.url);
        assert_eq!(back.content, doc.content);
    }
}
