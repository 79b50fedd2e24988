//! HTTP shapes crossing the adaptation boundary.

mod mime;
mod request;
mod response;

pub use mime::mime_for_path;
pub use request::{parse_query, ChainRequest, Envelope, Method};
pub use response::{ResponseRecord, StatusCode};
