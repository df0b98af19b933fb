//! Typed, file-backed record store.
//!
//! A whole collection of records lives in one JSON or CSV file. It is loaded
//! into memory on open, served from memory under a read/write lock, and
//! written back in full after every create, update, delete, or upsert.
//!
//! ```rust,no_run
//! use recfile::{Record, Timestamp, Writer};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Note {
//!     id: u64,
//!     created_at: Option<Timestamp>,
//!     text: String,
//! }
//!
//! impl Record for Note {
//!     type Id = u64;
//!     fn id(&self) -> &u64 { &self.id }
//!     fn set_id(&mut self, id: u64) { self.id = id }
//!     fn created_at(&self) -> Option<Timestamp> { self.created_at }
//!     fn set_created_at(&mut self, at: Timestamp) { self.created_at = Some(at) }
//! }
//!
//! let notes = Writer::<Note>::open("notes.json").unwrap();
//! let note = notes
//!     .create(Note { id: 0, created_at: None, text: "hello".into() })
//!     .unwrap();
//! assert_eq!(notes.read_one(&note.id).unwrap().text, "hello");
//! ```
//!
//! **Meant for small datasets and a single process.** Every mutation rewrites
//! the whole file. Two stores opened on the same file don't see each other
//! and the last writer wins.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
mod collection;
pub mod error;
pub mod fs;
pub mod record;
pub mod store;

pub use codec::{Codec, CsvCodec, Format, JsonCodec};
pub use error::{Error, Result};
pub use fs::{FileAccess, MemFs, OsFs};
pub use record::{IdGenerator, Record, RecordId, Timestamp};
pub use store::{Reader, StoreBuilder, Writer};
