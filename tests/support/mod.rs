#![allow(dead_code)]

use anyhow::{Context, Result};
use programme_explorer::catalog::model::{
    LINK_FIELDS, LINKS_TABLE, MODULE_DETAIL_FIELDS, MODULE_DETAILS_TABLE, PROGRAMME_META_FIELDS,
    PROGRAMME_META_TABLE, PROGRAMMES_TABLE,
};
use programme_explorer::catalog::{
    ARTIFACT_FILES, CatalogIndex, CatalogLoader, CatalogTables, Fingerprint, RecordSet,
};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Three programmes sharing module M101, with one unstaged link in SCI1.
pub fn fixture_tables() -> Result<CatalogTables> {
    Ok(CatalogTables {
        programmes: RecordSet::from_value(
            PROGRAMMES_TABLE,
            json!([
                {"major_code": "ENG1", "result_title": "ENG1 - Engineering",
                 "result_subtitle": "Undergraduate - BE", "search_blob": "ENG1 Engineering BE"},
                {"major_code": "ART1", "result_title": "ART1 - Arts",
                 "result_subtitle": "", "search_blob": "ART1 Arts BA"},
                {"major_code": "SCI1", "result_title": "SCI1 - Science",
                 "result_subtitle": "Undergraduate - BSc", "search_blob": "SCI1 Science BSc"}
            ]),
        )?,
        programme_meta: RecordSet::from_value(
            PROGRAMME_META_TABLE,
            json!([
                meta("ENG1", "Engineering", "Undergraduate", "BE", "4 years", "Full time"),
                meta("ART1", "Arts", "Undergraduate", "BA", "3 years", ""),
                meta("SCI1", "Science", "Undergraduate", "BSc", "", "Part time")
            ]),
        )?,
        links: RecordSet::from_value(
            LINKS_TABLE,
            json!([
                link("ENG1", "M101", json!(1), "core", "Intro to Engineering", "intro to engineering"),
                link("ENG1", "M102", json!(1), "option", "Materials", "materials"),
                link("ENG1", "M201", json!(2), "core", "Statics", "statics"),
                link("ART1", "M101", json!(1), "option", "Intro to Engineering", "intro to engineering"),
                link("SCI1", "M101", json!(2), "core", "Intro to Engineering", "intro to engineering"),
                link("SCI1", "M301", json!(""), "core", "Advanced Topics", "advanced topics")
            ]),
        )?,
        module_details: RecordSet::from_value(
            MODULE_DETAILS_TABLE,
            json!([
                detail(
                    "M101",
                    "Intro to Engineering",
                    json!(10),
                    "core",
                    json!({
                        "module_description": "Foundations of engineering practice.",
                        "prerequisite_module_for": ["M201"],
                        "top_n_modules_same_school": [
                            ["M102", 0.9], ["M201", 0.8], ["M301", 0.7], ["X1", 0.6],
                            ["X2", 0.5], ["X3", 0.4], ["X4", 0.3]
                        ]
                    }),
                ),
                detail("M102", "Materials", json!("7.5"), "option", json!({})),
                detail(
                    "M201",
                    "Statics",
                    json!(10),
                    "core",
                    json!({"has_prerequisite_modules": ["M101"]}),
                ),
                detail("M301", "Advanced Topics", json!(20), "core", json!({}))
            ]),
        )?,
    })
}

fn meta(code: &str, title: &str, level: &str, award: &str, duration: &str, attendance: &str) -> Value {
    json!({
        "major_code": code,
        "programme_title": title,
        "programme_level": level,
        "programme_award": award,
        "programme_duration": duration,
        "programme_attendance": attendance,
        "programme_url": format!("https://example.test/{code}")
    })
}

fn link(programme: &str, module: &str, stage: Value, kind: &str, title: &str, blob: &str) -> Value {
    json!({
        "major_code": programme,
        "module_code": module,
        "module_stage": stage.clone(),
        "module_type": kind,
        "module_level": 1,
        "result_title": title,
        "result_subtitle": "",
        "search_blob": format!("{module} {blob}"),
        "sort_stage": stage,
        "sort_type": if kind == "core" { 0 } else { 1 },
        "sort_level": 1
    })
}

/// Detail row with every relation empty unless `extra` overrides it.
fn detail(code: &str, title: &str, credits: Value, kind: &str, extra: Value) -> Value {
    let mut row = json!({
        "module_code": code,
        "module_title": title,
        "module_description": "",
        "module_trimester": "1",
        "module_credits": credits,
        "module_level": 1,
        "module_stage": 1,
        "module_type": kind,
        "module_coordinator_name": "J. Doe",
        "has_prerequisite_modules": [],
        "has_corequisite_modules": [],
        "has_incompatible_modules": [],
        "has_learning_requirement_modules": [],
        "prerequisite_module_for": [],
        "corequisite_module_for": [],
        "learning_requirement_module_for": [],
        "top_n_modules_same_school": [],
        "top_n_modules_different_school": []
    });
    if let (Some(row), Value::Object(extra)) = (row.as_object_mut(), extra) {
        row.extend(extra);
    }
    row
}

pub fn fixture_index() -> Result<CatalogIndex> {
    Ok(CatalogIndex::build(
        &fixture_tables()?,
        Fingerprint::from("fixture"),
    )?)
}

/// `count` programmes named `P00`, `P01`, ... with no modules.
pub fn many_programmes(count: usize) -> Result<CatalogIndex> {
    let codes: Vec<String> = (0..count).map(|n| format!("P{n:02}")).collect();
    let results = codes
        .iter()
        .map(|code| {
            json!({"major_code": code, "result_title": code, "result_subtitle": "",
                   "search_blob": format!("{code} programme")})
        })
        .collect();
    let metas = codes
        .iter()
        .map(|code| meta(code, code, "", "", "", ""))
        .collect();
    let tables = CatalogTables {
        programmes: RecordSet::from_value(PROGRAMMES_TABLE, Value::Array(results))?,
        programme_meta: RecordSet::from_value(PROGRAMME_META_TABLE, Value::Array(metas))?,
        links: RecordSet::new(LINKS_TABLE, LINK_FIELDS.iter().copied(), Vec::new()),
        module_details: RecordSet::new(
            MODULE_DETAILS_TABLE,
            MODULE_DETAIL_FIELDS.iter().copied(),
            Vec::new(),
        ),
    };
    Ok(CatalogIndex::build(&tables, Fingerprint::from("many"))?)
}

/// Fixture tables with a required column dropped from one table.
pub fn without_column(mut tables: CatalogTables, table: &str, column: &str) -> CatalogTables {
    let set = match table {
        PROGRAMMES_TABLE => &mut tables.programmes,
        PROGRAMME_META_TABLE => &mut tables.programme_meta,
        LINKS_TABLE => &mut tables.links,
        _ => &mut tables.module_details,
    };
    set.columns.remove(column);
    for row in &mut set.rows {
        row.remove(column);
    }
    tables
}

/// Write the four tables as JSON artifacts into `dir`.
pub fn write_artifacts(dir: &Path, tables: &CatalogTables) -> Result<()> {
    let sets = [
        &tables.programmes,
        &tables.programme_meta,
        &tables.links,
        &tables.module_details,
    ];
    for ((_, file), set) in ARTIFACT_FILES.iter().zip(sets) {
        let rows: Vec<Value> = set.rows.iter().cloned().map(Value::Object).collect();
        let path = dir.join(file);
        fs::write(&path, serde_json::to_vec_pretty(&rows)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

/// In-memory loader that counts `load` calls and lets tests swap the fingerprint.
#[derive(Clone)]
pub struct CountingLoader {
    tables: CatalogTables,
    fingerprint: Arc<Mutex<String>>,
    loads: Arc<AtomicUsize>,
}

impl CountingLoader {
    pub fn new(tables: CatalogTables) -> Self {
        Self {
            tables,
            fingerprint: Arc::new(Mutex::new("v1".to_string())),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn set_fingerprint(&self, fingerprint: &str) {
        *self.fingerprint.lock().unwrap() = fingerprint.to_string();
    }
}

impl CatalogLoader for CountingLoader {
    fn fingerprint(&self) -> Result<Fingerprint> {
        Ok(Fingerprint(self.fingerprint.lock().unwrap().clone()))
    }

    fn load(&self) -> Result<CatalogTables> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.clone())
    }
}
