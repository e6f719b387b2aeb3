//! Output module for the discovered-URL list
//!
//! This module handles:
//! - Streaming URLs to an append-only text file, one per line
//! - Reading a list back (for resuming and for conversion)
//! - Rewriting the final list in one go

mod traits;
mod url_list;

pub use traits::UrlSink;
pub use url_list::{read_url_list, write_url_list, UrlListWriter};
