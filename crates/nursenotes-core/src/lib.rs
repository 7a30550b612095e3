//! # nursenotes-core
//!
//! Core types, traits, and abstractions for the nursenotes service.
//!
//! This crate holds the domain models, the catalog query/filter/pagination
//! logic, the two-phase upload flow, and the trait seams the database and
//! storage implementations plug into.

pub mod catalog;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;
pub mod traits;
pub mod upload;

// Re-export commonly used types at crate root
pub use catalog::{
    filter_notes, total_pages, CatalogPage, CatalogQuery, CatalogState, CategoryFilter, Paginator,
    YearFilter,
};
pub use error::{Error, Result};
pub use models::*;
pub use session::{AuthEvent, SessionStore};
pub use traits::*;
pub use upload::{NoteUpload, NoteUploader, UploadPhase};
