//! # Mobile Check Server
//!
//! HTTP service that stores uploaded checklists and serves them back as a
//! fillable page or as raw JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod handlers;
pub mod page;
pub mod server;

pub use server::{build_router, AppState, Server, ServerConfig};
