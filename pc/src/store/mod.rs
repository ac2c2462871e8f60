//! Content store with actor pattern
//!
//! ContentStore owns the PostState and processes transitions via channels,
//! giving single-writer, many-reader access to the post being drafted.

mod manager;
mod messages;

pub use manager::{ContentStore, StoreEvent};
pub use messages::{Applied, Epoch, Mutation, StoreCommand, StoreError, StoreResponse, Transition};
