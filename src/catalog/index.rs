//! Indexed view of one catalog snapshot.
//!
//! `CatalogIndex::build` is strict about the table shapes (every required
//! field must be present, programme and module keys must be unique) and lenient
//! about content: links, eligibility and similarity lists may name codes that
//! have no record, and lookups simply return `None` for them. Everything here is
//! derived once; the index is never mutated after it is built.

use crate::catalog::identity::{Fingerprint, ModuleCode, ProgrammeCode};
use crate::catalog::model::{
    CatalogTables, ModuleDetail, ModuleLink, ProgrammeMeta, ProgrammeResult, ProgrammeSummary,
    RecordSet,
};
use crate::error::{CatalogError, MissingFields};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
/// Two-line label for a module entry.
pub struct ModuleLabel {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, PartialEq)]
/// Catalog tables plus every lookup the query engine and views need.
pub struct CatalogIndex {
    fingerprint: Fingerprint,
    programmes: Vec<ProgrammeResult>,
    programme_titles: BTreeMap<ProgrammeCode, String>,
    programme_search: BTreeMap<ProgrammeCode, String>,
    programme_meta: BTreeMap<ProgrammeCode, ProgrammeMeta>,
    programme_summaries: BTreeMap<ProgrammeCode, ProgrammeSummary>,
    links: Vec<ModuleLink>,
    links_by_programme: BTreeMap<ProgrammeCode, Vec<ModuleLink>>,
    module_details: BTreeMap<ModuleCode, ModuleDetail>,
    module_labels: BTreeMap<ModuleCode, ModuleLabel>,
    module_programmes: BTreeMap<ModuleCode, BTreeSet<ProgrammeCode>>,
    programme_count: usize,
}

impl CatalogIndex {
    /// Validate the four tables and derive all lookups.
    ///
    /// Fails before decoding anything if a required field is missing, listing
    /// every missing field of every table in one error.
    pub fn build(tables: &CatalogTables, fingerprint: Fingerprint) -> Result<Self, CatalogError> {
        validate_required_fields(tables)?;

        let programmes: Vec<ProgrammeResult> =
            decode_rows(&tables.programmes, ProgrammeResult::from_row, |p| p.code.is_blank());
        let meta: Vec<ProgrammeMeta> =
            decode_rows(&tables.programme_meta, ProgrammeMeta::from_row, |m| m.code.is_blank());
        let links: Vec<ModuleLink> = decode_rows(&tables.links, ModuleLink::from_row, |l| {
            l.programme.is_blank() || l.module.is_blank()
        });
        let details: Vec<ModuleDetail> =
            decode_rows(&tables.module_details, ModuleDetail::from_row, |d| d.code.is_blank());

        let programme_meta = unique_by_key(&tables.programme_meta.name, meta, |m| m.code.clone())?;
        let module_details =
            unique_by_key(&tables.module_details.name, details, |d| d.code.clone())?;

        let programme_titles = programme_meta
            .iter()
            .map(|(code, meta)| (code.clone(), meta.title.clone()))
            .collect();
        let programme_summaries = programme_meta
            .iter()
            .map(|(code, meta)| (code.clone(), ProgrammeSummary::from(meta)))
            .collect();

        let mut programme_search = BTreeMap::new();
        for programme in &programmes {
            programme_search
                .entry(programme.code.clone())
                .or_insert_with(|| programme.search_text.clone());
        }
        let programme_count = programme_search.len();

        let mut links_by_programme: BTreeMap<ProgrammeCode, Vec<ModuleLink>> = BTreeMap::new();
        let mut module_labels = BTreeMap::new();
        let mut module_programmes: BTreeMap<ModuleCode, BTreeSet<ProgrammeCode>> = BTreeMap::new();
        for link in &links {
            links_by_programme
                .entry(link.programme.clone())
                .or_default()
                .push(link.clone());
            module_labels
                .entry(link.module.clone())
                .or_insert_with(|| ModuleLabel {
                    title: link.title.clone(),
                    subtitle: link.subtitle.clone(),
                });
            module_programmes
                .entry(link.module.clone())
                .or_default()
                .insert(link.programme.clone());
        }

        debug!(
            fingerprint = %fingerprint,
            programmes = programme_count,
            modules = module_details.len(),
            links = links.len(),
            "built catalog index"
        );

        Ok(Self {
            fingerprint,
            programmes,
            programme_titles,
            programme_search,
            programme_meta,
            programme_summaries,
            links,
            links_by_programme,
            module_details,
            module_labels,
            module_programmes,
            programme_count,
        })
    }

    /// Fingerprint of the tables this index was built from.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Programme result rows in source order.
    pub fn programmes(&self) -> &[ProgrammeResult] {
        &self.programmes
    }

    pub fn programme_title(&self, code: &ProgrammeCode) -> Option<&str> {
        self.programme_titles.get(code).map(String::as_str)
    }

    /// Programme code -> title, from the programme metadata table.
    pub fn programme_titles(&self) -> &BTreeMap<ProgrammeCode, String> {
        &self.programme_titles
    }

    /// Lowercased search text owned by a programme (first result row wins).
    pub fn programme_search_text(&self, code: &ProgrammeCode) -> Option<&str> {
        self.programme_search.get(code).map(String::as_str)
    }

    pub fn programme_meta(&self, code: &ProgrammeCode) -> Option<&ProgrammeMeta> {
        self.programme_meta.get(code)
    }

    pub fn programme_summary(&self, code: &ProgrammeCode) -> Option<&ProgrammeSummary> {
        self.programme_summaries.get(code)
    }

    /// Every programme/module link in source order.
    pub fn links(&self) -> &[ModuleLink] {
        &self.links
    }

    /// Links for one programme in source order; empty for unknown codes.
    pub fn programme_links(&self, code: &ProgrammeCode) -> &[ModuleLink] {
        self.links_by_programme
            .get(code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn module_detail(&self, code: &ModuleCode) -> Option<&ModuleDetail> {
        self.module_details.get(code)
    }

    /// Label taken from the first link row that mentions the module.
    pub fn module_label(&self, code: &ModuleCode) -> Option<&ModuleLabel> {
        self.module_labels.get(code)
    }

    /// Label for any code; unknown codes render as the bare code with a blank subtitle.
    pub fn label_or_code(&self, code: &ModuleCode) -> ModuleLabel {
        self.module_label(code).cloned().unwrap_or_else(|| ModuleLabel {
            title: code.0.clone(),
            subtitle: String::new(),
        })
    }

    /// Sorted, deduplicated programmes that include a module.
    pub fn programmes_for_module(&self, code: &ModuleCode) -> impl Iterator<Item = &ProgrammeCode> {
        self.module_programmes.get(code).into_iter().flatten()
    }

    pub fn module_in_programme(&self, module: &ModuleCode, programme: &ProgrammeCode) -> bool {
        self.module_programmes
            .get(module)
            .is_some_and(|programmes| programmes.contains(programme))
    }

    /// Distinct programme codes among the result rows.
    pub fn programme_count(&self) -> usize {
        self.programme_count
    }

    /// Distinct module codes among the module details.
    pub fn module_count(&self) -> usize {
        self.module_details.len()
    }
}

fn validate_required_fields(tables: &CatalogTables) -> Result<(), CatalogError> {
    let missing: Vec<MissingFields> = tables
        .with_required_fields()
        .into_iter()
        .filter_map(|(set, required)| {
            let fields = set.missing_fields(required);
            (!fields.is_empty()).then(|| MissingFields {
                table: set.name.clone(),
                fields,
            })
        })
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::MissingFields(missing))
    }
}

fn decode_rows<T>(
    set: &RecordSet,
    decode: impl Fn(&serde_json::Map<String, serde_json::Value>) -> T,
    blank_key: impl Fn(&T) -> bool,
) -> Vec<T> {
    let mut records = Vec::with_capacity(set.rows.len());
    for (idx, row) in set.rows.iter().enumerate() {
        let record = decode(row);
        if blank_key(&record) {
            warn!(table = %set.name, row = idx, "skipping row with blank key");
            continue;
        }
        records.push(record);
    }
    records
}

fn unique_by_key<K: Ord + ToString, T>(
    table: &str,
    records: Vec<T>,
    key: impl Fn(&T) -> K,
) -> Result<BTreeMap<K, T>, CatalogError> {
    let mut map = BTreeMap::new();
    for record in records {
        let k = key(&record);
        if map.contains_key(&k) {
            return Err(CatalogError::DuplicateKey {
                table: table.to_string(),
                key: k.to_string(),
            });
        }
        map.insert(k, record);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{
        LINKS_TABLE, MODULE_DETAIL_FIELDS, MODULE_DETAILS_TABLE, PROGRAMME_META_TABLE,
        PROGRAMMES_TABLE,
    };
    use serde_json::{Value, json};

    fn set(name: &str, rows: Value) -> RecordSet {
        RecordSet::from_value(name, rows).unwrap()
    }

    fn tables() -> CatalogTables {
        CatalogTables {
            programmes: set(
                PROGRAMMES_TABLE,
                json!([
                    {"major_code": "P1", "result_title": "Eng", "result_subtitle": "", "search_blob": "ENGINEERING"},
                    {"major_code": "P1", "result_title": "Eng again", "result_subtitle": "", "search_blob": "other"}
                ]),
            ),
            programme_meta: set(
                PROGRAMME_META_TABLE,
                json!([{"major_code": "P1", "programme_title": "Engineering", "programme_level": "UG",
                        "programme_award": null, "programme_duration": "4 years",
                        "programme_attendance": "Full time", "programme_url": ""}]),
            ),
            links: set(
                LINKS_TABLE,
                json!([
                    {"major_code": "P1", "module_code": "M1", "module_stage": 1, "module_type": "core",
                     "module_level": 1, "result_title": "Intro", "result_subtitle": "first",
                     "search_blob": "intro", "sort_stage": 1, "sort_type": 0, "sort_level": 1},
                    {"major_code": "P2", "module_code": "M1", "module_stage": 1, "module_type": "core",
                     "module_level": 1, "result_title": "Intro (P2)", "result_subtitle": "second",
                     "search_blob": "intro", "sort_stage": 1, "sort_type": 0, "sort_level": 1},
                    {"major_code": "P1", "module_code": "", "module_stage": 1, "module_type": "core",
                     "module_level": 1, "result_title": "", "result_subtitle": "",
                     "search_blob": "", "sort_stage": 1, "sort_type": 0, "sort_level": 1}
                ]),
            ),
            module_details: RecordSet::new(
                MODULE_DETAILS_TABLE,
                MODULE_DETAIL_FIELDS.iter().copied(),
                Vec::new(),
            ),
        }
    }

    #[test]
    fn first_rows_win_for_search_text_and_labels() {
        let index = CatalogIndex::build(&tables(), Fingerprint::from("v1")).unwrap();
        assert_eq!(index.programme_search_text(&"P1".into()), Some("engineering"));
        assert_eq!(index.programme_count(), 1);
        let label = index.module_label(&"M1".into()).unwrap();
        assert_eq!(label.title, "Intro");
        assert_eq!(label.subtitle, "first");
        assert_eq!(index.links().len(), 2);
    }

    #[test]
    fn reverse_map_is_sorted_and_deduplicated() {
        let index = CatalogIndex::build(&tables(), Fingerprint::from("v1")).unwrap();
        let programmes: Vec<&str> = index
            .programmes_for_module(&"M1".into())
            .map(ProgrammeCode::as_str)
            .collect();
        assert_eq!(programmes, vec!["P1", "P2"]);
        assert!(index.module_in_programme(&"M1".into(), &"P2".into()));
        assert!(!index.module_in_programme(&"M9".into(), &"P2".into()));
        assert_eq!(index.programmes_for_module(&"M9".into()).count(), 0);
    }

    #[test]
    fn summary_subtitle_skips_blank_parts() {
        let index = CatalogIndex::build(&tables(), Fingerprint::from("v1")).unwrap();
        let summary = index.programme_summary(&"P1".into()).unwrap();
        assert_eq!(summary.subtitle(), "UG - 4 years - Full time");
    }

    #[test]
    fn duplicate_meta_codes_are_rejected() {
        let mut tables = tables();
        let row = tables.programme_meta.rows[0].clone();
        tables.programme_meta.rows.push(row);
        let err = CatalogIndex::build(&tables, Fingerprint::from("v1")).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { ref key, .. } if key == "P1"));
    }

    #[test]
    fn unknown_codes_fall_back_to_bare_labels() {
        let index = CatalogIndex::build(&tables(), Fingerprint::from("v1")).unwrap();
        let label = index.label_or_code(&"ZZZ".into());
        assert_eq!(label.title, "ZZZ");
        assert_eq!(label.subtitle, "");
        assert!(index.programme_links(&"NOPE".into()).is_empty());
    }
}
