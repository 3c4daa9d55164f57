//! API constants

/// Current API version
pub const API_VERSION: &str = "v0";

/// Prefix every versioned route is nested under
pub const API_PREFIX: &str = "/api/v0";

/// Largest number of URLs accepted by a single batch resolve or delete
pub const MAX_BATCH_SIZE: usize = 100;

/// Path the local backend's storage root is served under
pub const LOCAL_MEDIA_PATH: &str = "/media";
