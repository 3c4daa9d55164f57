use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Deletion request: a single canonical URL or a batch of them
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum DeleteMediaRequest {
    Batch {
        #[serde(rename = "canonicalURLs")]
        canonical_urls: Vec<String>,
    },
    Single {
        #[serde(rename = "canonicalURL")]
        canonical_url: String,
    },
}

impl DeleteMediaRequest {
    pub fn into_urls(self) -> Vec<String> {
        match self {
            DeleteMediaRequest::Batch { canonical_urls } => canonical_urls,
            DeleteMediaRequest::Single { canonical_url } => vec![canonical_url],
        }
    }
}

/// Batch read request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResolveBatchRequest {
    #[serde(rename = "canonicalURLs")]
    pub canonical_urls: Vec<String>,
}

/// Single read request (query string)
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ResolveQuery {
    /// Previously stored canonical URL
    pub url: String,
}

/// Outcome of resolving one canonical URL for reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedUrl {
    pub original_url: String,
    /// Signed URL, or the original URL when signing was not needed or failed
    pub signed_url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Result of writing bytes through the local ingestion endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocalIngestResponse {
    #[serde(rename = "publicURL")]
    pub public_url: String,
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_request_accepts_both_shapes() {
        let single: DeleteMediaRequest =
            serde_json::from_str(r#"{"canonicalURL":"https://h/designs/a/b/1.jpg"}"#).unwrap();
        assert_eq!(single.into_urls(), vec!["https://h/designs/a/b/1.jpg"]);

        let batch: DeleteMediaRequest = serde_json::from_str(
            r#"{"canonicalURLs":["https://h/designs/a/b/1.jpg","https://h/designs/a/b/2.jpg"]}"#,
        )
        .unwrap();
        assert_eq!(batch.into_urls().len(), 2);
    }

    #[test]
    fn test_resolved_url_omits_empty_error() {
        let ok = ResolvedUrl {
            original_url: "a".to_string(),
            signed_url: "b".to_string(),
            error: None,
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["originalUrl"], "a");
        assert_eq!(json["signedUrl"], "b");
        assert!(json.get("error").is_none());
    }
}
