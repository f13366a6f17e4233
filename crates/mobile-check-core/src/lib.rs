//! # Mobile Check Core
//!
//! Core types shared by every Mobile Check crate.
//!
//! This crate provides:
//! - The common error type and its HTTP-facing classification
//! - Entry identifiers and stored entry records
//! - The checklist data model and its positional wire format

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod checklist;
pub mod error;
pub mod types;

pub use checklist::{ChecklistItem, ChecklistPayload};
pub use error::{Error, ErrorKind, Result};
pub use types::{EntryId, StoredEntry};
