//! Storage key derivation and recovery.
//!
//! Key format: `designs/{entity_id}/{variant_id}/{timestamp_ms}.{ext}`.
//!
//! A persisted URL is mapped back to its key by locating the first path
//! segment equal to `designs` and keeping everything from there on. Public
//! URLs are only ever built through [`canonical_url`], so that segment is
//! always present in URLs this crate hands out.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::traits::{StorageError, StorageResult};

/// First segment of every storage key.
pub const KEY_ROOT: &str = "designs";

const ENTITY_PLACEHOLDER: &str = "unknown";
const VARIANT_PLACEHOLDER: &str = "default";

/// Canonical hierarchical path identifying an object in any backend.
///
/// Immutable once created; only constructed through [`StorageKey::derive`]
/// or a validating parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Build the key for a fresh upload.
    ///
    /// `timestamp_ms` must be sampled when the upload is negotiated. Pure
    /// function: identical inputs always produce the identical key.
    pub fn derive(
        entity_id: &str,
        variant_id: &str,
        timestamp_ms: u64,
        original_filename: &str,
    ) -> Self {
        let entity = sanitize_segment(entity_id, ENTITY_PLACEHOLDER);
        let variant = sanitize_segment(variant_id, VARIANT_PLACEHOLDER);
        let file = match extension(original_filename) {
            Some(ext) => format!("{}.{}", timestamp_ms, ext),
            None => timestamp_ms.to_string(),
        };
        StorageKey(format!("{}/{}/{}/{}", KEY_ROOT, entity, variant, file))
    }

    /// Validate an externally supplied key.
    pub fn parse(raw: &str) -> StorageResult<Self> {
        let Some(rest) = raw.strip_prefix(KEY_ROOT).and_then(|r| r.strip_prefix('/')) else {
            return Err(StorageError::InvalidKey(format!(
                "Storage key must start with '{}/': {}",
                KEY_ROOT, raw
            )));
        };

        if raw.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        if rest
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(StorageError::InvalidKey(format!(
                "Storage key contains an empty or relative segment: {}",
                raw
            )));
        }

        Ok(StorageKey(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Replace every character outside `[A-Za-z0-9-]` with `_`; empty input
/// becomes `placeholder`.
pub fn sanitize_segment(raw: &str, placeholder: &str) -> String {
    if raw.is_empty() {
        return placeholder.to_string();
    }
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Last `.`-delimited segment of the filename, alphanumerics only.
fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext: String = ext.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Join a base URL and a key with exactly one `/`.
pub fn canonical_url(base: &str, key: &StorageKey) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.as_str())
}

/// Recover the storage key from a persisted URL.
///
/// Returns `None` when the URL has no `designs` segment or what follows it is
/// not a valid key; callers treat that as "leave the URL alone". Any query
/// string or fragment is dropped first, so signed URLs map to their key.
pub fn extract_key(url: &str) -> Option<StorageKey> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let parts: Vec<&str> = path.split('/').collect();
    let start = parts.iter().position(|part| *part == KEY_ROOT)?;
    StorageKey::parse(&parts[start..].join("/")).ok()
}

/// Whether a URL prefix already contains a `designs` segment.
///
/// Backends refuse such prefixes at construction time, because key recovery
/// would stop at the wrong segment.
pub(crate) fn contains_key_root(prefix: &str) -> bool {
    prefix.split('/').any(|part| part == KEY_ROOT)
}
