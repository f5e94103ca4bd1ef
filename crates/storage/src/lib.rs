//! Hash-named cache files for the scent harvester.
//!
//! [`PathResolver`] computes where things go, [`FileStore`] puts them there,
//! and [`archive`] lists what ships inside zip-format packages. All I/O is
//! synchronous and happens immediately; callers are expected to serialize
//! access per path.

pub mod archive;
pub mod document;
pub mod error;
mod models;
mod path;
pub mod resource;
mod store;

pub use crate::document::{Document, HtmlDocument};
pub use crate::models::ArchiveEntry;
pub use crate::path::{MAX_BUCKET_LEN, OTHER_BUCKET, PathResolver, extension_bucket, hash_of};
pub use crate::resource::{FetchedPage, FetchedResource};
pub use crate::store::{EMPTY_PLACEHOLDER, FileStore};
