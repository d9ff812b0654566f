//! Catalog loaders: where the four record sets and their fingerprint come from.
//!
//! The index cache only talks to the `CatalogLoader` trait. `JsonDirLoader`
//! reads the artifact files of a data directory and fingerprints them by
//! modification time; `StaticLoader` serves tables already in memory.

use crate::catalog::identity::Fingerprint;
use crate::catalog::model::{
    CatalogTables, LINKS_TABLE, MODULE_DETAILS_TABLE, PROGRAMME_META_TABLE, PROGRAMMES_TABLE,
    RecordSet, required_fields,
};
use crate::schema_loader::{CompiledSchema, record_set_schema};
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

/// Artifact file name for each table, in fingerprint order.
pub const ARTIFACT_FILES: [(&str, &str); 4] = [
    (PROGRAMMES_TABLE, "major_results.json"),
    (PROGRAMME_META_TABLE, "major_meta.json"),
    (LINKS_TABLE, "modules_by_major.json"),
    (MODULE_DETAILS_TABLE, "module_details.json"),
];

/// Source of catalog tables.
///
/// `fingerprint` must be cheap and must change whenever any table would load
/// differently; `load` is only called when the fingerprint differs from the
/// cached one (or after a forced invalidation).
pub trait CatalogLoader {
    fn fingerprint(&self) -> Result<Fingerprint>;
    fn load(&self) -> Result<CatalogTables>;
}

/// Loader over a directory of JSON artifacts.
pub struct JsonDirLoader {
    dir: PathBuf,
    schema: CompiledSchema,
}

impl JsonDirLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            dir: dir.into(),
            schema: record_set_schema()?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn artifact_path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn load_record_set(&self, table: &str, file: &str) -> Result<RecordSet> {
        let path = self.artifact_path(file);
        let data =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let value: Value =
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        self.schema.validate(&value, &path.display().to_string())?;
        let mut set = RecordSet::from_value(table, value)?;
        // An empty artifact carries no row keys; it still declares the table's fields.
        if set.rows.is_empty() {
            set.columns
                .extend(required_fields(table).iter().map(|field| field.to_string()));
        }
        Ok(set)
    }
}

impl CatalogLoader for JsonDirLoader {
    /// Modification times (ns since the epoch) of the four artifacts, dash-joined.
    fn fingerprint(&self) -> Result<Fingerprint> {
        let mut stamps = Vec::with_capacity(ARTIFACT_FILES.len());
        for (_, file) in ARTIFACT_FILES {
            let path = self.artifact_path(file);
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .with_context(|| format!("reading modification time of {}", path.display()))?;
            let nanos = modified
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos())
                .unwrap_or_default();
            stamps.push(nanos.to_string());
        }
        Ok(Fingerprint(stamps.join("-")))
    }

    fn load(&self) -> Result<CatalogTables> {
        let [programmes, programme_meta, links, module_details] = ARTIFACT_FILES;
        let tables = CatalogTables {
            programmes: self.load_record_set(programmes.0, programmes.1)?,
            programme_meta: self.load_record_set(programme_meta.0, programme_meta.1)?,
            links: self.load_record_set(links.0, links.1)?,
            module_details: self.load_record_set(module_details.0, module_details.1)?,
        };
        debug!(dir = %self.dir.display(), "loaded catalog artifacts");
        Ok(tables)
    }
}

/// Loader over tables already in memory, with a caller-chosen fingerprint.
#[derive(Clone, Debug)]
pub struct StaticLoader {
    tables: CatalogTables,
    fingerprint: Fingerprint,
}

impl StaticLoader {
    pub fn new(tables: CatalogTables, fingerprint: Fingerprint) -> Self {
        Self {
            tables,
            fingerprint,
        }
    }
}

impl CatalogLoader for StaticLoader {
    fn fingerprint(&self) -> Result<Fingerprint> {
        Ok(self.fingerprint.clone())
    }

    fn load(&self) -> Result<CatalogTables> {
        Ok(self.tables.clone())
    }
}
