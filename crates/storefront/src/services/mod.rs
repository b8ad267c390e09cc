//! Business logic services for the storefront.
//!
//! - `catalog` - Cached directory snapshot with seed-data fallback
//! - `client_store` - Per-visitor state (favorites, compare, drafts, cooldowns)
//! - `forms` - Listing submission and contact form pipeline

pub mod catalog;
pub mod client_store;
pub mod forms;

pub use catalog::{CatalogService, DataSource, DirectorySnapshot};
pub use client_store::ClientStore;
pub use forms::{FormOutcome, SubmissionSink};
