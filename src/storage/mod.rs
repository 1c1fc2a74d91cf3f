//! Local fallback persistence for the catalog.

pub mod local;

pub use local::{LocalStore, LocalStoreError};
