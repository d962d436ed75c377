//! # NoticeBot Store
//!
//! `RecordStore` implementations. `FileStore` keeps the three flat files
//! that carry state from one run to the next; `MemoryStore` holds the same
//! collections in memory for tests and dry runs.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
