use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Stage sort value assigned to rows whose stage could not be parsed.
///
/// Unstaged rows stay searchable but never appear in a stage group.
pub const UNSTAGED: i64 = 99;

/// Canonical programme ("major") code, e.g. `DN200`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgrammeCode(pub String);

/// Canonical module code, e.g. `COMP10010`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleCode(pub String);

/// Opaque token supplied by a loader; changes whenever any source table changes.
///
/// The index cache only ever compares fingerprints for equality.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

macro_rules! code_newtype {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

code_newtype!(ProgrammeCode);
code_newtype!(ModuleCode);

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a module sits within a programme.
///
/// `Other` keeps unrecognised values (and the empty string) intact so labels
/// still render whatever the source tables carry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ModuleType {
    Core,
    Optional,
    Other(String),
}

impl Default for ModuleType {
    fn default() -> Self {
        ModuleType::Other(String::new())
    }
}

impl Serialize for ModuleType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModuleType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

impl ModuleType {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleType::Core => "core",
            ModuleType::Optional => "option",
            ModuleType::Other(value) => value.as_str(),
        }
    }

    /// Case-insensitive parse of the raw `module_type` column.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "core" => ModuleType::Core,
            "option" => ModuleType::Optional,
            _ => ModuleType::Other(trimmed.to_string()),
        }
    }

    /// Display form used in synthesized subtitles (`core` -> `Core`).
    pub fn capitalized(&self) -> String {
        capitalize(self.as_str())
    }
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
