//! Document indexing: types, keyword extraction, persistence, and the
//! gateway-driven indexer itself

pub mod indexer;
pub mod keywords;
pub mod store;
pub mod types;

pub use indexer::{DocumentIndexer, IndexerOptions};
pub use store::IndexStore;
pub use types::{DocumentIndex, IndexMetadata, PageRange, Section};
