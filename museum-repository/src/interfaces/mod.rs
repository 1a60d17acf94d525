//! Interface definitions for the object store.
//!
//! This module defines the abstract `ObjectStore` trait that allows for
//! swappable storage backends, and the `ObjectLoader` capability the enricher
//! uses to resolve notification events into decoded objects.

mod object_loader;
mod object_store;

pub use object_loader::ObjectLoader;
pub use object_store::{ObjectStore, PutOutcome};
