//! JSON Schema compilation for catalog artifacts.
//!
//! Loaders validate each artifact file against the bundled record-set schema
//! before decoding it, so shape problems (a top-level object, nested maps in a
//! scalar column) surface with every violation listed instead of the first one.

use anyhow::{Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;

/// Record-set schema shipped with the crate.
pub(crate) const RECORD_SET_SCHEMA: &str = include_str!("../schema/record_set.schema.json");

/// Compiled schema plus the `schema_version` it declares.
pub(crate) struct CompiledSchema {
    pub schema_version: String,
    compiled: JSONSchema,
}

impl CompiledSchema {
    /// Validate `instance`, collecting every error message.
    pub fn validate(&self, instance: &Value, label: &str) -> Result<()> {
        if let Err(errors) = self.compiled.validate(instance) {
            let details = errors
                .map(|err| {
                    let path = err.instance_path.to_string();
                    if path.is_empty() {
                        err.to_string()
                    } else {
                        format!("{path}: {err}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            bail!(
                "{label} failed schema validation against {}:\n{details}",
                self.schema_version
            );
        }
        Ok(())
    }
}

/// Parse and compile a schema document.
pub(crate) fn compile_schema(raw: &str) -> Result<CompiledSchema> {
    let schema: Value =
        serde_json::from_str(raw).map_err(|err| anyhow!("parsing schema: {err}"))?;
    let schema_version = extract_schema_version(&schema)
        .ok_or_else(|| anyhow!("schema missing a valid schema_version"))?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| anyhow!("compiling schema {schema_version}: {err}"))?;
    Ok(CompiledSchema {
        schema_version,
        compiled,
    })
}

/// Compile the bundled record-set schema.
pub(crate) fn record_set_schema() -> Result<CompiledSchema> {
    compile_schema(RECORD_SET_SCHEMA)
}

fn extract_schema_version(schema: &Value) -> Option<String> {
    let version = schema.get("schema_version").and_then(Value::as_str)?;
    if !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bundled_schema_compiles() {
        let schema = record_set_schema().unwrap();
        assert_eq!(schema.schema_version, "record_set_v1");
    }

    #[test]
    fn accepts_rows_with_relation_lists() {
        let schema = record_set_schema().unwrap();
        let rows = json!([
            {"module_code": "M1", "module_credits": 7.5, "has_prerequisite_modules": ["M0"]},
            {"module_code": 2, "top_n_modules_same_school": [["M1", 0.8], {"module_code": "M3", "score": 0.2}]},
            {"module_code": "M4", "module_description": null}
        ]);
        schema.validate(&rows, "module_details.json").unwrap();
    }

    #[test]
    fn reports_every_violation() {
        let schema = record_set_schema().unwrap();
        let err = schema
            .validate(&json!([{"a": {"nested": true}}, 5]), "bad.json")
            .unwrap_err()
            .to_string();
        assert!(err.contains("bad.json failed schema validation"));
        assert!(err.contains("/0/a"), "{err}");
        assert!(err.contains("/1"), "{err}");
    }

    #[test]
    fn rejects_top_level_objects() {
        let schema = record_set_schema().unwrap();
        assert!(schema.validate(&json!({"rows": []}), "obj.json").is_err());
    }

    #[test]
    fn schema_version_must_be_token_like() {
        assert!(compile_schema(r#"{"schema_version": "has spaces", "type": "array"}"#).is_err());
        assert!(compile_schema(r#"{"type": "array"}"#).is_err());
    }
}
