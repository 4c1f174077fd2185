//! Catalog (inventory) replica
//!
//! Each replica owns a full copy of the book records and:
//! - serves search and item lookups from memory
//! - invalidates the front's cache before every write
//! - persists the whole record set after each write
//! - pushes the change to its paired replica in the background

pub mod http;
pub mod invalidator;
pub mod inventory;
pub mod server;

pub use inventory::{Book, BookChanges, BookInfo, BookSummary, Inventory, InventoryChange};
pub use server::CatalogServer;
