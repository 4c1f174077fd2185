//! Front tier: request dispatch and response caching
//!
//! The front is the only entry point clients talk to. It:
//! - round-robins requests over the catalog and order replica sets
//! - fails over to the next replica on transport errors and 5xx answers
//! - caches successful read answers for a fixed TTL
//! - drops cached reads when a catalog replica reports an upcoming write

pub mod cache;
pub mod dispatcher;
pub mod http;
pub mod server;

pub use cache::ResponseCache;
pub use dispatcher::{Dispatcher, ReadKind, WriteKind};
pub use server::FrontServer;
