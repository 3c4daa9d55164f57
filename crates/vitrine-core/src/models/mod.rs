pub mod media;
pub mod upload;

pub use media::{
    DeleteMediaRequest, LocalIngestResponse, MessageResponse, ResolveBatchRequest,
    ResolveQuery, ResolvedUrl,
};
pub use upload::{UploadRequest, UploadResponse, UploadTarget};
