use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::errors::SchemaError;

/// One student's persisted data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "finite_grade")]
    pub grade: f64,
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>, grade: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            grade,
        }
    }

    /// Plain mapping form: `{"id", "name", "grade"}`.
    ///
    /// Fails if the grade is NaN or infinite, which JSON cannot represent.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Decode a record from its mapping form. Extra keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let obj = value.as_object().ok_or(SchemaError::NotAnObject)?;

        let id = string_field(obj, "id")?;
        let name = string_field(obj, "name")?;
        let grade = obj
            .get("grade")
            .ok_or(SchemaError::MissingField("grade"))?
            .as_f64()
            .ok_or(SchemaError::InvalidField {
                field: "grade",
                expected: "a number",
            })?;

        Ok(Self { id, name, grade })
    }

    /// Overwrite the fields the patch supplies. Returns whether anything changed.
    pub fn apply(&mut self, patch: RecordPatch) -> bool {
        let mut changed = false;
        if let Some(name) = patch.name {
            changed |= self.name != name;
            self.name = name;
        }
        if let Some(grade) = patch.grade {
            changed |= self.grade != grade;
            self.grade = grade;
        }
        changed
    }
}

/// Reject grades that JSON cannot hold.
pub fn check_grade(grade: f64) -> Result<(), SchemaError> {
    if grade.is_finite() {
        Ok(())
    } else {
        Err(SchemaError::InvalidField {
            field: "grade",
            expected: "a finite number",
        })
    }
}

// serde_json writes non-finite floats as `null`, which `from_value` rejects.
fn finite_grade<S: Serializer>(grade: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !grade.is_finite() {
        return Err(serde::ser::Error::custom(format!(
            "grade {grade} is not a finite number"
        )));
    }
    serializer.serialize_f64(*grade)
}

fn string_field(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, SchemaError> {
    obj.get(field)
        .ok_or(SchemaError::MissingField(field))?
        .as_str()
        .map(str::to_string)
        .ok_or(SchemaError::InvalidField {
            field,
            expected: "a string",
        })
}

/// Fields supplied to an update. `None` keeps the current value;
/// `Some(String::new())` renames to the empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub grade: Option<f64>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn grade(mut self, grade: f64) -> Self {
        self.grade = Some(grade);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.grade.is_none()
    }
}
