//! Uploaded image assets: filesystem storage, per-owner locking and the
//! replace protocol used by the avatar and banner endpoints.

pub mod locks;
pub mod multipart;
pub mod replace;
pub mod store;

use axum::body::Bytes;

/// A file received from a client, before it is stored.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name; only its extension is used.
    pub filename: String,
    pub bytes: Bytes,
}
