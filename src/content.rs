//! Content: documents on disk and the pages built from them.

mod document;
mod markdown;
pub(crate) mod page;
pub mod paths;
mod store;

pub use document::Format;
pub use markdown::render_markdown;
pub use page::{Page, PageError};
pub use store::{Catalog, DocumentStore, StoreError, mime_from_path};
