//! Record sets and the typed rows decoded from them.
//!
//! A loader hands over four named tables of JSON rows (`RecordSet`). The index
//! builder checks their required fields, then decodes each row into the typed
//! records below. Decoding never fails on content: nulls become empty text,
//! unparsable stages become `UNSTAGED`, and heterogeneous relation lists are
//! normalized into `RelatedModules`.

use crate::catalog::identity::{ModuleCode, ModuleType, ProgrammeCode, UNSTAGED};
use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;

pub const PROGRAMMES_TABLE: &str = "major_results";
pub const PROGRAMME_META_TABLE: &str = "major_meta";
pub const LINKS_TABLE: &str = "modules_by_major";
pub const MODULE_DETAILS_TABLE: &str = "module_details";

pub const PROGRAMME_FIELDS: &[&str] =
    &["major_code", "result_title", "result_subtitle", "search_blob"];

pub const PROGRAMME_META_FIELDS: &[&str] = &[
    "major_code",
    "programme_title",
    "programme_level",
    "programme_award",
    "programme_duration",
    "programme_attendance",
    "programme_url",
];

pub const LINK_FIELDS: &[&str] = &[
    "major_code",
    "module_code",
    "module_stage",
    "module_type",
    "module_level",
    "result_title",
    "result_subtitle",
    "search_blob",
    "sort_stage",
    "sort_type",
    "sort_level",
];

pub const MODULE_DETAIL_FIELDS: &[&str] = &[
    "module_code",
    "module_title",
    "module_description",
    "module_trimester",
    "module_credits",
    "module_level",
    "module_stage",
    "module_type",
    "module_coordinator_name",
    "has_prerequisite_modules",
    "has_corequisite_modules",
    "has_incompatible_modules",
    "has_learning_requirement_modules",
    "prerequisite_module_for",
    "corequisite_module_for",
    "learning_requirement_module_for",
    "top_n_modules_same_school",
    "top_n_modules_different_school",
];

/// Required fields of a table by name; empty for unknown tables.
pub fn required_fields(table: &str) -> &'static [&'static str] {
    match table {
        PROGRAMMES_TABLE => PROGRAMME_FIELDS,
        PROGRAMME_META_TABLE => PROGRAMME_META_FIELDS,
        LINKS_TABLE => LINK_FIELDS,
        MODULE_DETAILS_TABLE => MODULE_DETAIL_FIELDS,
        _ => &[],
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// One named table of JSON rows plus the columns it declares.
pub struct RecordSet {
    pub name: String,
    pub columns: BTreeSet<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl RecordSet {
    /// Build a record set with an explicit column list (columns may exist with zero rows).
    pub fn new<I, S>(name: &str, columns: I, rows: Vec<Map<String, Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        }
    }

    /// Build a record set whose columns are the union of keys across rows.
    pub fn from_rows(name: &str, rows: Vec<Map<String, Value>>) -> Self {
        let columns = rows.iter().flat_map(|row| row.keys().cloned()).collect();
        Self {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    /// Accept a JSON array of row objects.
    pub fn from_value(name: &str, value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            bail!("{name}: expected a JSON array of row objects");
        };
        let mut rows = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(row) => rows.push(row),
                other => bail!("{name}: row {idx} is not an object (got {other})"),
            }
        }
        Ok(Self::from_rows(name, rows))
    }

    /// Required fields that this table lacks, sorted by name.
    pub fn missing_fields(&self, required: &[&str]) -> Vec<String> {
        let missing: BTreeSet<&str> = required
            .iter()
            .copied()
            .filter(|field| !self.columns.contains(*field))
            .collect();
        missing.into_iter().map(str::to_string).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// The four record sets a loader supplies.
pub struct CatalogTables {
    pub programmes: RecordSet,
    pub programme_meta: RecordSet,
    pub links: RecordSet,
    pub module_details: RecordSet,
}

impl CatalogTables {
    /// Tables paired with the fields the index builder requires of them.
    pub fn with_required_fields(&self) -> [(&RecordSet, &'static [&'static str]); 4] {
        [
            (&self.programmes, PROGRAMME_FIELDS),
            (&self.programme_meta, PROGRAMME_META_FIELDS),
            (&self.links, LINK_FIELDS),
            (&self.module_details, MODULE_DETAIL_FIELDS),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Sidebar row for a programme.
pub struct ProgrammeResult {
    pub code: ProgrammeCode,
    pub title: String,
    pub subtitle: String,
    pub search_text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Descriptive metadata for a programme.
pub struct ProgrammeMeta {
    pub code: ProgrammeCode,
    pub title: String,
    pub level: String,
    pub award: String,
    pub duration: String,
    pub attendance: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Subset of programme metadata used for "other programmes" labels.
pub struct ProgrammeSummary {
    pub code: ProgrammeCode,
    pub title: String,
    pub level: String,
    pub award: String,
    pub duration: String,
    pub attendance: String,
}

impl ProgrammeSummary {
    /// Non-blank level, award, duration and attendance joined with `" - "`.
    pub fn subtitle(&self) -> String {
        [&self.level, &self.award, &self.duration, &self.attendance]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

impl From<&ProgrammeMeta> for ProgrammeSummary {
    fn from(meta: &ProgrammeMeta) -> Self {
        Self {
            code: meta.code.clone(),
            title: meta.title.clone(),
            level: meta.level.clone(),
            award: meta.award.clone(),
            duration: meta.duration.clone(),
            attendance: meta.attendance.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// One programme/module pairing.
pub struct ModuleLink {
    pub programme: ProgrammeCode,
    pub module: ModuleCode,
    /// Raw `module_stage` text.
    pub stage: String,
    /// Numeric value of `module_stage`, when it has one.
    pub stage_number: Option<i64>,
    pub module_type: ModuleType,
    pub level: String,
    pub title: String,
    pub subtitle: String,
    pub search_text: String,
    /// Stage used for grouping; `UNSTAGED` when `sort_stage` is not numeric.
    pub sort_stage: i64,
    pub sort_type: Option<f64>,
    pub sort_level: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Credits {
    Amount(f64),
    Text(String),
}

impl Credits {
    fn from_value(value: Option<&Value>) -> Option<Self> {
        match value? {
            Value::Number(n) => n.as_f64().filter(|c| c.is_finite()).map(Credits::Amount),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<f64>() {
                    Ok(c) if c.is_finite() => Some(Credits::Amount(c)),
                    _ => Some(Credits::Text(trimmed.to_string())),
                }
            }
            Value::Bool(b) => Some(Credits::Amount(if *b { 1.0 } else { 0.0 })),
            _ => None,
        }
    }

    /// `10 Credits`, `7.5 Credits`, or the raw text followed by `Credits`.
    pub fn label(&self) -> String {
        match self {
            Credits::Amount(c) if c.fract() == 0.0 => format!("{} Credits", *c as i64),
            Credits::Amount(c) => format!("{c} Credits"),
            Credits::Text(text) => format!("{text} Credits"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
/// Ordered module codes with an optional parallel score sequence.
///
/// Bare codes, `[code, score]` pairs and `{module_code, score}` objects all
/// collapse into this shape. Scores are kept only when every entry had one.
pub struct RelatedModules {
    pub codes: Vec<ModuleCode>,
    pub scores: Option<Vec<f64>>,
}

impl RelatedModules {
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(Value::Array(items)) = value else {
            return Self::default();
        };
        let mut codes = Vec::with_capacity(items.len());
        let mut scores = Vec::with_capacity(items.len());
        let mut all_scored = true;
        for item in items {
            let (code, score) = match item {
                Value::Array(pair) => (pair.first(), pair.get(1)),
                Value::Object(entry) => (
                    entry.get("module_code").or_else(|| entry.get("code")),
                    entry.get("score"),
                ),
                scalar => (Some(scalar), None),
            };
            let code = canonical_code(code);
            if code.is_empty() {
                continue;
            }
            codes.push(ModuleCode(code));
            match score.and_then(numeric) {
                Some(score) => scores.push(score),
                None => all_scored = false,
            }
        }
        let scores = (all_scored && !codes.is_empty()).then_some(scores);
        Self { codes, scores }
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// The first `n` codes in loader order.
    pub fn top(&self, n: usize) -> &[ModuleCode] {
        &self.codes[..n.min(self.codes.len())]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
/// Full module record for the details pane.
pub struct ModuleDetail {
    pub code: ModuleCode,
    pub title: String,
    pub description: String,
    pub trimester: String,
    pub credits: Option<Credits>,
    pub level: String,
    pub stage: String,
    pub module_type: ModuleType,
    pub coordinator: String,
    pub prerequisites: RelatedModules,
    pub prerequisite_for: RelatedModules,
    pub corequisites: RelatedModules,
    pub corequisite_for: RelatedModules,
    pub incompatible: RelatedModules,
    pub learning_requirements: RelatedModules,
    pub learning_requirement_for: RelatedModules,
    pub similar_same_school: RelatedModules,
    pub similar_other_school: RelatedModules,
}

/// Eligibility relation categories, in display order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum EligibilityKind {
    Prerequisite,
    PrerequisiteFor,
    Corequisite,
    CorequisiteFor,
    Incompatible,
    LearningRequirement,
    LearningRequirementFor,
}

impl EligibilityKind {
    pub const ALL: [EligibilityKind; 7] = [
        EligibilityKind::Prerequisite,
        EligibilityKind::PrerequisiteFor,
        EligibilityKind::Corequisite,
        EligibilityKind::CorequisiteFor,
        EligibilityKind::Incompatible,
        EligibilityKind::LearningRequirement,
        EligibilityKind::LearningRequirementFor,
    ];

    pub fn header(self) -> &'static str {
        match self {
            EligibilityKind::Prerequisite => "Prerequisites:",
            EligibilityKind::PrerequisiteFor => "Prerequisite for:",
            EligibilityKind::Corequisite => "Corequisites:",
            EligibilityKind::CorequisiteFor => "Corequisite for:",
            EligibilityKind::Incompatible => "Incompatible with:",
            EligibilityKind::LearningRequirement => "Learning requirement:",
            EligibilityKind::LearningRequirementFor => "Learning requirement for:",
        }
    }

    pub fn modules(self, detail: &ModuleDetail) -> &RelatedModules {
        match self {
            EligibilityKind::Prerequisite => &detail.prerequisites,
            EligibilityKind::PrerequisiteFor => &detail.prerequisite_for,
            EligibilityKind::Corequisite => &detail.corequisites,
            EligibilityKind::CorequisiteFor => &detail.corequisite_for,
            EligibilityKind::Incompatible => &detail.incompatible,
            EligibilityKind::LearningRequirement => &detail.learning_requirements,
            EligibilityKind::LearningRequirementFor => &detail.learning_requirement_for,
        }
    }
}

/// Similarity ranking categories, in display order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum SimilarityKind {
    SameSchool,
    DifferentSchool,
}

impl SimilarityKind {
    pub const ALL: [SimilarityKind; 2] =
        [SimilarityKind::SameSchool, SimilarityKind::DifferentSchool];

    pub fn header(self) -> &'static str {
        match self {
            SimilarityKind::SameSchool => "Same school:",
            SimilarityKind::DifferentSchool => "Different school:",
        }
    }

    pub fn modules(self, detail: &ModuleDetail) -> &RelatedModules {
        match self {
            SimilarityKind::SameSchool => &detail.similar_same_school,
            SimilarityKind::DifferentSchool => &detail.similar_other_school,
        }
    }
}

impl ProgrammeResult {
    pub(crate) fn from_row(row: &Map<String, Value>) -> Self {
        Self {
            code: ProgrammeCode(canonical_code(row.get("major_code"))),
            title: text(row, "result_title"),
            subtitle: text(row, "result_subtitle"),
            search_text: search_text(row),
        }
    }
}

impl ProgrammeMeta {
    pub(crate) fn from_row(row: &Map<String, Value>) -> Self {
        Self {
            code: ProgrammeCode(canonical_code(row.get("major_code"))),
            title: text(row, "programme_title"),
            level: text(row, "programme_level"),
            award: text(row, "programme_award"),
            duration: text(row, "programme_duration"),
            attendance: text(row, "programme_attendance"),
            url: text(row, "programme_url"),
        }
    }
}

impl ModuleLink {
    pub(crate) fn from_row(row: &Map<String, Value>) -> Self {
        Self {
            programme: ProgrammeCode(canonical_code(row.get("major_code"))),
            module: ModuleCode(canonical_code(row.get("module_code"))),
            stage: text(row, "module_stage"),
            stage_number: row.get("module_stage").and_then(numeric).map(|s| s.trunc() as i64),
            module_type: ModuleType::parse(&text(row, "module_type")),
            level: text(row, "module_level"),
            title: text(row, "result_title"),
            subtitle: text(row, "result_subtitle"),
            search_text: search_text(row),
            sort_stage: row
                .get("sort_stage")
                .and_then(numeric)
                .map(|s| s.trunc() as i64)
                .unwrap_or(UNSTAGED),
            sort_type: row.get("sort_type").and_then(numeric),
            sort_level: row.get("sort_level").and_then(numeric),
        }
    }
}

impl ModuleDetail {
    pub(crate) fn from_row(row: &Map<String, Value>) -> Self {
        let related = |field: &str| RelatedModules::from_value(row.get(field));
        Self {
            code: ModuleCode(canonical_code(row.get("module_code"))),
            title: text(row, "module_title"),
            description: text(row, "module_description"),
            trimester: text(row, "module_trimester"),
            credits: Credits::from_value(row.get("module_credits")),
            level: text(row, "module_level"),
            stage: text(row, "module_stage"),
            module_type: ModuleType::parse(&text(row, "module_type")),
            coordinator: text(row, "module_coordinator_name"),
            prerequisites: related("has_prerequisite_modules"),
            prerequisite_for: related("prerequisite_module_for"),
            corequisites: related("has_corequisite_modules"),
            corequisite_for: related("corequisite_module_for"),
            incompatible: related("has_incompatible_modules"),
            learning_requirements: related("has_learning_requirement_modules"),
            learning_requirement_for: related("learning_requirement_module_for"),
            similar_same_school: related("top_n_modules_same_school"),
            similar_other_school: related("top_n_modules_different_school"),
        }
    }
}

/// Canonical string form of a key field.
///
/// Strings are trimmed; integral numbers drop any fractional part so `101`
/// and `101.0` produce the same key.
pub fn canonical_code(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => canonical_number(n),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn text(row: &Map<String, Value>, field: &str) -> String {
    match row.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => canonical_number(n),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

fn search_text(row: &Map<String, Value>) -> String {
    text(row, "search_blob").trim().to_lowercase()
}

fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}
