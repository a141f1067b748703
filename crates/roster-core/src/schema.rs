use anyhow::{Context, Result};
use jsonschema::Validator;
use serde_json::Value;

use crate::errors::{CheckIssue, CheckReport};

const SCHEMA: &str = include_str!("../schema/roster.schema.json");

const KNOWN_FIELDS: [&str; 3] = ["id", "name", "grade"];

/// Compile the embedded student-file schema.
pub fn validator() -> Result<Validator> {
    let schema: Value = serde_json::from_str(SCHEMA).context("embedded schema is invalid JSON")?;
    Validator::new(&schema).map_err(|e| anyhow::anyhow!("schema compilation failed: {e}"))
}

/// Full check producing a structured report (for `roster check --json`).
pub fn check(data: &Value, file: &str, strict: bool) -> CheckReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match validator() {
        Ok(v) => {
            for error in v.iter_errors(data) {
                let path = error.instance_path.to_string();
                errors.push(CheckIssue {
                    code: "E001".to_string(),
                    check: "schema".to_string(),
                    message: error.to_string(),
                    path: Some(if path.is_empty() {
                        "$(root)".to_string()
                    } else {
                        format!("${path}")
                    }),
                });
            }
        }
        Err(e) => errors.push(CheckIssue {
            code: "E000".to_string(),
            check: "schema".to_string(),
            message: e.to_string(),
            path: None,
        }),
    }

    check_ids(data, &mut errors);
    lint_checks(data, &mut warnings);

    let records = data.as_object().map_or(0, |o| o.len());
    let pass = errors.is_empty() && (!strict || warnings.is_empty());
    CheckReport {
        file: file.to_string(),
        records,
        pass,
        errors,
        warnings,
    }
}

fn check_ids(data: &Value, errors: &mut Vec<CheckIssue>) {
    let Some(obj) = data.as_object() else {
        return;
    };
    for (key, record) in obj {
        if let Some(id) = record.get("id").and_then(Value::as_str) {
            if id != key {
                errors.push(CheckIssue {
                    code: "E002".to_string(),
                    check: "ids".to_string(),
                    message: format!("key '{key}' does not match record id '{id}'"),
                    path: Some(format!("$/{key}/id")),
                });
            }
        }
    }
}

fn lint_checks(data: &Value, warnings: &mut Vec<CheckIssue>) {
    let Some(obj) = data.as_object() else {
        return;
    };
    for (key, record) in obj {
        let Some(fields) = record.as_object() else {
            continue;
        };

        // W001: fields roster does not read are dropped on the next save
        for field in fields.keys() {
            if !KNOWN_FIELDS.contains(&field.as_str()) {
                warnings.push(CheckIssue {
                    code: "W001".to_string(),
                    check: "lint".to_string(),
                    message: format!("unknown field '{field}' will be dropped on next save"),
                    path: Some(format!("$/{key}/{field}")),
                });
            }
        }

        // W002: blank name
        if fields
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|n| n.trim().is_empty())
        {
            warnings.push(CheckIssue {
                code: "W002".to_string(),
                check: "lint".to_string(),
                message: "record has an empty name".to_string(),
                path: Some(format!("$/{key}/name")),
            });
        }
    }
}
