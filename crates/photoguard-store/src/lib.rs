//! PhotoGuard Store - Object store backends for uploaded photos
//!
//! Every backend implements [`ObjectStore`]: each `put` writes the bytes under
//! a fresh `photos/<uuid>.<ext>` key and returns an [`ObjectRef`] for the
//! detection stage.
//!
//! ## Backends
//!
//! - **InMemoryStore**: concurrent map, cleared on restart (tests, local runs)
//! - **FileStore**: one file per object plus a JSON metadata sidecar
//!
//! ## Usage
//!
//! ```rust,no_run
//! use photoguard_store::{FileStore, ObjectStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileStore::new("./data", "photo-recognition-bucket").await?;
//! let object = store.put(bytes::Bytes::from_static(b"\xff\xd8\xff"), "image/jpeg").await?;
//! println!("stored at {}", object);
//! # Ok(())
//! # }
//! ```

pub mod backend;

pub use backend::file::FileStore;
pub use backend::memory::InMemoryStore;
pub use backend::{extension_for, object_key, StoredObject};

pub use photoguard_core::{ObjectRef, ObjectStore};
