// Storage layer (S3-compatible) for client logos

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::types::AppResult;

pub mod s3_client;

pub use s3_client::*;

/// Upload target for logo images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Public URL an object stored under `key` will be reachable at.
    fn public_url(&self, key: &str) -> String;

    /// Store `data` under `key` and return the object's public URL.
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<String>;
}

/// Longest filename kept in an object key, counted in chars.
pub const MAX_KEY_FILENAME_CHARS: usize = 100;

/// Globally unique object key for an uploaded file: `{uuid}-{filename}`.
pub fn object_key(filename: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_filename(filename))
}

/// `{base}/{key}` with the key percent-encoded as a single path segment.
pub fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), urlencoding::encode(key))
}

/// Reduce a client-supplied filename to the tail of its last path component.
fn sanitize_filename(filename: &str) -> &str {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return "logo";
    }

    // Keep the end so the extension survives
    let chars = base.chars().count();
    match base.char_indices().nth(chars.saturating_sub(MAX_KEY_FILENAME_CHARS)) {
        Some((start, _)) => &base[start..],
        None => base,
    }
}

pub fn guess_content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}
