//! Domain types for post drafting
//!
//! - `Message`/`Role`: conversation ledger entries
//! - `PlatformId`/`Platform`/`PlatformCatalogue`: target platforms
//! - `PostState`: the aggregate owned by the content store

mod message;
mod platform;
mod post;

pub use message::{Message, Role};
pub use platform::{CatalogueError, Platform, PlatformCatalogue, PlatformId};
pub use post::PostState;
