//! Document storage backends.

pub mod filesystem;

pub use filesystem::{DocumentRef, DocumentStore, FileDocumentStore};
