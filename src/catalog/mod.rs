//! Catalog module: the durable aggregation of harvested book records
//!
//! `BookRecord` is the fully-parsed representation of one catalog item plus
//! its local asset paths; `CatalogStore` persists an ordered batch of records
//! as a single JSON document.

mod record;
mod store;

pub use record::BookRecord;
pub use store::{CatalogStore, StoreError};
