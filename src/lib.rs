//! Shared library for the programme explorer.
//!
//! The crate turns four tabular catalog artifacts (programme results,
//! programme metadata, programme/module links, module details) into an
//! in-memory `CatalogIndex`, answers search and paging queries over it, and
//! drives per-session navigation through a small event-driven state machine.
//! Presentation adapters (the `explorer` binary here) render the view models
//! in `view` and feed user actions back as `navigation::Event`s.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod query;
pub mod view;

mod schema_loader;

pub use catalog::{
    CatalogIndex, CatalogLoader, CatalogTables, Fingerprint, IndexCache, JsonDirLoader,
    ModuleCode, ModuleDetail, ModuleLink, ModuleType, ProgrammeCode, StaticLoader,
};
pub use config::ExplorerConfig;
pub use error::CatalogError;
pub use navigation::{Event, NavigationState, Session, synthesize_subtitle, transition};
pub use query::{paginate, plural, search_modules, search_programmes};
pub use view::{ExplorerView, ViewInputs, render};
