//! legistar-scraper - Harvest municipal legislation from Legistar
//! InSite portals.
//!
//! This crate walks the search tables, detail pages, and nested grids
//! of a Legistar InSite portal and assembles insertion-ordered JSON
//! documents for bills, people, organizations, and events. Portals
//! differ only by declarative configuration: labels, component keys,
//! date formats, and classification overrides.
//!
//! # Example
//!
//! ```
//! use legistar_scraper::jurisdictions;
//!
//! let registry = jurisdictions::default_registry().unwrap();
//! assert!(registry.lookup("chicago").is_ok());
//! assert!(registry.lookup("nyc").is_ok());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Jurisdiction configuration, scopes, and label tables
//! - [`registry`]: Jurisdiction lookup by host, division id, or nickname
//! - [`jurisdictions`]: Built-in presets (Chicago, New York, Philadelphia)
//! - [`error`]: Error types and Result alias
//! - [`http`]: Fetcher trait and retrying HTTP client
//! - [`context`]: Per-walk state and the shared provenance accumulator
//! - [`document`]: Ordered document model and JSON serialization
//! - [`fields`]: Labelled cell access and date parsing
//! - [`aggregate`]: Declarative field schemas and skip signals
//! - [`table`]: Results-table pagination
//! - [`form`]: ASPX search-form submission
//! - [`components`]: Component registry the scope configs resolve against
//! - [`views`]: Search and detail views over a configured site
//! - [`families`]: Bills, people, organizations, and events wiring
//! - [`cli`]: Command-line interface

pub mod aggregate;
pub mod cli;
pub mod components;
pub mod config;
pub mod context;
pub mod document;
mod dom;
pub mod error;
pub mod families;
pub mod fields;
pub mod form;
pub mod http;
pub mod jurisdictions;
mod media;
pub mod registry;
pub mod table;
pub mod views;

// Re-export the types most callers touch.
pub use aggregate::Built;
pub use config::{Config, Family, Scope};
pub use document::{Document, Value};
pub use error::{Result, ScrapeError};
pub use families::create_component_registry;
pub use registry::JurisdictionRegistry;
pub use views::Site;
