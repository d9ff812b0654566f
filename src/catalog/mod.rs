//! Catalog wiring.
//!
//! Loaders supply four record sets (programme results, programme metadata,
//! programme/module links, module details) plus a fingerprint. `CatalogIndex`
//! validates and indexes one snapshot; `IndexCache` memoizes it per
//! fingerprint so repeated render passes never rebuild unchanged data.

pub mod identity;
pub mod index;
pub mod loader;
pub mod model;
pub mod repository;

pub use identity::{Fingerprint, ModuleCode, ModuleType, ProgrammeCode, UNSTAGED};
pub use index::{CatalogIndex, ModuleLabel};
pub use loader::{ARTIFACT_FILES, CatalogLoader, JsonDirLoader, StaticLoader};
pub use model::{
    CatalogTables, Credits, EligibilityKind, ModuleDetail, ModuleLink, ProgrammeMeta,
    ProgrammeResult, ProgrammeSummary, RecordSet, RelatedModules, SimilarityKind,
};
pub use repository::IndexCache;
