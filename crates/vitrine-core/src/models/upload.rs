use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::StorageBackend;

/// Request to negotiate an upload target for one design image or video
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct UploadRequest {
    /// Original filename; only its extension is kept in the storage key
    #[serde(rename = "fileName")]
    #[validate(length(
        min = 1,
        max = 255,
        message = "fileName must be between 1 and 255 characters"
    ))]
    pub file_name: String,
    /// Content type (MIME type)
    #[serde(rename = "contentType")]
    #[validate(length(
        min = 1,
        max = 255,
        message = "contentType must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// Owning design identifier
    #[serde(rename = "entityID", default)]
    pub entity_id: String,
    /// Colour/variant identifier
    #[serde(rename = "variantID", default)]
    pub variant_id: String,
}

/// Transient negotiation result; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadTarget {
    /// Where the caller sends the bytes
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
    /// Canonical URL to persist once the upload succeeds
    #[serde(rename = "publicURL")]
    pub public_url: String,
    /// Storage key the object will live under
    pub key: String,
    /// Authorization token the caller echoes on the upload call (managed-cloud only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub token: Option<String>,
}

/// Response body of the upload negotiation route
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub target: UploadTarget,
    #[schema(value_type = String)]
    pub backend: StorageBackend,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_shape() {
        let response = UploadResponse {
            target: UploadTarget {
                upload_url: "https://up.example.com".to_string(),
                public_url: "https://cdn.example.com/b/designs/a/b/1.jpg".to_string(),
                key: "designs/a/b/1.jpg".to_string(),
                token: None,
            },
            backend: StorageBackend::S3Cdn,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["uploadURL"], "https://up.example.com");
        assert_eq!(json["publicURL"], "https://cdn.example.com/b/designs/a/b/1.jpg");
        assert_eq!(json["key"], "designs/a/b/1.jpg");
        assert_eq!(json["backend"], "s3-cdn");
        assert!(json.get("token").is_none());
    }

    #[test]
    fn test_upload_request_defaults_missing_ids() {
        let request: UploadRequest =
            serde_json::from_str(r#"{"fileName":"a.jpg","contentType":"image/jpeg"}"#).unwrap();
        assert_eq!(request.entity_id, "");
        assert_eq!(request.variant_id, "");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_upload_request_rejects_empty_filename() {
        let request: UploadRequest =
            serde_json::from_str(r#"{"fileName":"","contentType":"image/jpeg"}"#).unwrap();
        assert!(request.validate().is_err());
    }
}
