pub mod local_ingest;
pub mod media_delete;
pub mod media_resolve;
pub mod uploads;
