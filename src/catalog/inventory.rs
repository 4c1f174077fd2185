//! Book inventory owned by one catalog replica.
//!
//! Reads are served straight from memory. Every write for an item runs under
//! that item's write lock and follows the same sequence:
//!
//! 1. look the item up (not-found is terminal)
//! 2. check preconditions (decrement on an empty shelf is terminal)
//! 3. invalidate the front's cached read for the item
//! 4. apply the change in memory
//! 5. rewrite the backing file (failure is reported, memory is not reverted)
//! 6. hand the absolute post-write values to the replicator
//!
//! Writes arriving from the paired replica skip steps 3 and 6.

use crate::catalog::invalidator::Invalidator;
use crate::common::utils::recover;
use crate::common::{Error, RecordFile, ReplicationMessage, Replicator, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub topic: String,
    pub quantity: u64,
    pub price: f64,
}

/// Search result entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: u64,
    pub title: String,
}

/// Item lookup result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInfo {
    pub title: String,
    pub topic: String,
    pub quantity: u64,
    pub price: f64,
}

impl From<&Book> for BookInfo {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            topic: book.topic.clone(),
            quantity: book.quantity,
            price: book.price,
        }
    }
}

/// Validated field changes, always absolute values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BookChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.price.is_none()
    }

    /// At least one field set, price finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidInput(
                "update must set quantity or price".into(),
            ));
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "price must be a non-negative number, got {}",
                    price
                )));
            }
        }
        Ok(())
    }

    fn apply_to(&self, book: &mut Book) {
        if let Some(quantity) = self.quantity {
            book.quantity = quantity;
        }
        if let Some(price) = self.price {
            book.price = price;
        }
    }
}

/// Client update payload. Fields may be JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
}

impl UpdateRequest {
    pub fn into_changes(self) -> Result<BookChanges> {
        let changes = BookChanges {
            quantity: self.quantity.as_ref().map(coerce_quantity).transpose()?,
            price: self.price.as_ref().map(coerce_price).transpose()?,
        };
        changes.validate()?;
        Ok(changes)
    }
}

fn coerce_quantity(value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        Error::InvalidInput(format!(
            "quantity must be a non-negative integer, got {}",
            value
        ))
    })
}

fn coerce_price(value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|p| p.is_finite() && *p >= 0.0)
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "price must be a non-negative number, got {}",
                value
            ))
        })
}

/// Replication message for the paired catalog replica.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryChange {
    #[serde(skip)]
    pub id: u64,
    #[serde(flatten)]
    pub changes: BookChanges,
}

impl ReplicationMessage for InventoryChange {
    fn method(&self) -> Method {
        Method::PUT
    }

    fn path(&self) -> String {
        format!("/replicate/{}", self.id)
    }
}

pub struct Inventory {
    books: RwLock<BTreeMap<u64, Book>>,
    /// Per-item write locks. The id set is fixed at load time.
    write_locks: HashMap<u64, Mutex<()>>,
    file: RecordFile,
    invalidator: Arc<dyn Invalidator>,
    replicator: Replicator<InventoryChange>,
}

impl Inventory {
    pub fn new(
        books: Vec<Book>,
        file: RecordFile,
        invalidator: Arc<dyn Invalidator>,
        replicator: Replicator<InventoryChange>,
    ) -> Result<Self> {
        let mut table = BTreeMap::new();
        for book in books {
            if !book.price.is_finite() || book.price < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "book {} has invalid price {}",
                    book.id, book.price
                )));
            }
            let id = book.id;
            if table.insert(id, book).is_some() {
                return Err(Error::InvalidConfig(format!("duplicate book id {}", id)));
            }
        }
        let write_locks = table.keys().map(|id| (*id, Mutex::new(()))).collect();

        Ok(Self {
            books: RwLock::new(table),
            write_locks,
            file,
            invalidator,
            replicator,
        })
    }

    /// Load the record set from `path`. The file must exist.
    pub async fn open(
        path: impl AsRef<Path>,
        invalidator: Arc<dyn Invalidator>,
        replicator: Replicator<InventoryChange>,
    ) -> Result<Self> {
        let file = RecordFile::new(path.as_ref());
        let books: Vec<Book> = file.load().await?.ok_or_else(|| {
            Error::InvalidConfig(format!(
                "catalog file {} not found",
                path.as_ref().display()
            ))
        })?;
        tracing::info!(books = books.len(), path = %path.as_ref().display(), "Catalog loaded");
        Self::new(books, file, invalidator, replicator)
    }

    pub fn len(&self) -> usize {
        recover(self.books.read()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: u64) -> Option<Book> {
        recover(self.books.read()).get(&id).cloned()
    }

    /// Books whose topic matches case-insensitively, ordered by id.
    pub fn search(&self, topic: &str) -> Result<Vec<BookSummary>> {
        let wanted = topic.to_lowercase();
        let found: Vec<BookSummary> = recover(self.books.read())
            .values()
            .filter(|book| book.topic.to_lowercase() == wanted)
            .map(|book| BookSummary {
                id: book.id,
                title: book.title.clone(),
            })
            .collect();

        if found.is_empty() {
            tracing::info!(topic = %topic, "No books found for topic");
            return Err(Error::NotFound("No books found for this topic".into()));
        }
        tracing::info!(topic = %topic, count = found.len(), "Found books for topic");
        Ok(found)
    }

    pub fn info(&self, id: u64) -> Result<BookInfo> {
        self.get(id)
            .map(|book| BookInfo::from(&book))
            .ok_or_else(book_not_found)
    }

    /// Apply a client update.
    pub async fn update(&self, id: u64, changes: BookChanges) -> Result<Book> {
        changes.validate()?;
        let _guard = self.write_lock(id)?.lock().await;
        self.lookup(id)?;
        let book = self.commit(id, changes).await?;
        tracing::info!(item_id = id, quantity = book.quantity, price = book.price, "Item updated");
        Ok(book)
    }

    /// Take one unit out of stock.
    pub async fn decrement(&self, id: u64) -> Result<Book> {
        let _guard = self.write_lock(id)?.lock().await;
        let book = self.lookup(id)?;
        if book.quantity == 0 {
            tracing::info!(item_id = id, "Item out of stock");
            return Err(Error::OutOfStock);
        }

        let changes = BookChanges {
            quantity: Some(book.quantity - 1),
            price: None,
        };
        let book = self.commit(id, changes).await?;
        tracing::info!(item_id = id, quantity = book.quantity, "Decremented stock");
        Ok(book)
    }

    /// Apply a change pushed by the paired replica: no invalidation, no
    /// further replication.
    pub async fn apply_replicated(&self, id: u64, changes: BookChanges) -> Result<Book> {
        changes.validate()?;
        let _guard = self.write_lock(id)?.lock().await;
        let book = self.apply(id, &changes)?;
        self.persist().await?;
        tracing::info!(item_id = id, quantity = book.quantity, price = book.price, "Applied replicated change");
        Ok(book)
    }

    /// Steps 3-6 of the write path. Caller holds the item's write lock.
    async fn commit(&self, id: u64, changes: BookChanges) -> Result<Book> {
        self.invalidator.invalidate(id).await;
        let book = self.apply(id, &changes)?;
        if let Err(e) = self.persist().await {
            tracing::error!(item_id = id, error = %e, "Persist failed, in-memory change kept");
            return Err(e);
        }
        self.replicator.replicate(InventoryChange { id, changes });
        Ok(book)
    }

    fn write_lock(&self, id: u64) -> Result<&Mutex<()>> {
        self.write_locks.get(&id).ok_or_else(book_not_found)
    }

    fn lookup(&self, id: u64) -> Result<Book> {
        self.get(id).ok_or_else(book_not_found)
    }

    fn apply(&self, id: u64, changes: &BookChanges) -> Result<Book> {
        let mut books = recover(self.books.write());
        let book = books.get_mut(&id).ok_or_else(book_not_found)?;
        changes.apply_to(book);
        Ok(book.clone())
    }

    async fn persist(&self) -> Result<()> {
        self.file
            .save_with(|| recover(self.books.read()).values().cloned().collect())
            .await
    }
}

fn book_not_found() -> Error {
    Error::NotFound("Book not found".into())
}
