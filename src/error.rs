use std::fmt;
use thiserror::Error;

/// Required fields absent from one record set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MissingFields {
    pub table: String,
    pub fields: Vec<String>,
}

impl fmt::Display for MissingFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} missing fields: [{}]", self.table, self.fields.join(", "))
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Every missing field of every table, reported together.
    #[error("catalog schema validation failed: {}", join_missing(.0))]
    MissingFields(Vec<MissingFields>),

    #[error("duplicate key '{key}' in {table}")]
    DuplicateKey { table: String, key: String },

    #[error("catalog load failed: {0:#}")]
    Load(#[from] anyhow::Error),
}

impl CatalogError {
    /// Flat list of missing field names, in table order.
    pub fn missing_field_names(&self) -> Vec<&str> {
        match self {
            CatalogError::MissingFields(tables) => tables
                .iter()
                .flat_map(|missing| missing.fields.iter().map(String::as_str))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn join_missing(tables: &[MissingFields]) -> String {
    tables
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
