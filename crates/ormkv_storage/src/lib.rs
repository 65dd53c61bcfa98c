//! # ormkv Storage
//!
//! Ordered key-value backends for ormkv.
//!
//! Backends are **opaque ordered byte maps**. They store raw keys and values
//! and hand back ranges of them in key order; they know nothing about tables,
//! indexes or record encodings.
//!
//! ## Design Principles
//!
//! - Two capabilities: [`ReadBackend`] (get, has, iterate) and [`Backend`]
//!   (additionally set, delete and atomic [`WriteOp`] batches)
//! - Keys are compared bytewise
//! - Iterators are RAII cursors released on drop
//! - Must be `Send + Sync`
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - Append-only operation log replayed on open
//!
//! ## Example
//!
//! ```rust
//! use ormkv_storage::{Backend, Direction, InMemoryBackend, KeyRange, ReadBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.set(b"a", b"1").unwrap();
//! backend.set(b"b", b"2").unwrap();
//!
//! let keys: Vec<Vec<u8>> = backend
//!     .iter(&KeyRange::all(), Direction::Forward)
//!     .unwrap()
//!     .map(|entry| entry.unwrap().0)
//!     .collect();
//! assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
mod range;

pub use backend::{Backend, KvIter, KvPair, ReadBackend, WriteOp};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use range::{prefix_successor, Direction, KeyRange};
