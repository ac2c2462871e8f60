//! PostCraft - social media post drafting
//!
//! PostCraft turns a short idea into a post, refines it from feedback, and
//! adapts it for platforms with their own formatting and length rules. The
//! writing itself is done by an external generation/formatting service; this
//! crate owns the session state and the workflows around it.
//!
//! # Core Concepts
//!
//! - **Single writer**: all post state lives in one store actor
//! - **Settle once**: each workflow awaits one service call and applies its
//!   outcome in one atomic transition
//! - **Stale results drop**: clearing the session invalidates in-flight calls
//! - **Cache per platform**: a formatted variant is requested once and kept
//!
//! # Modules
//!
//! - [`domain`] - post state, messages and the platform catalogue
//! - [`client`] - generation and formatting service clients
//! - [`store`] - the content store actor
//! - [`flows`] - generate, refine and toggle workflows
//! - [`repl`] - interactive session
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod flows;
pub mod repl;
pub mod store;

// Re-export commonly used types
pub use client::{
    ClientError, FormatterClient, GenerationClient, HttpFormatterClient, HttpGenerationClient, create_clients,
};
pub use config::{Config, ServiceConfig};
pub use domain::{CatalogueError, Message, Platform, PlatformCatalogue, PlatformId, PostState, Role};
pub use flows::{FlowOutcome, Flows};
pub use store::{Applied, ContentStore, Epoch, Mutation, StoreError, StoreEvent, Transition};
