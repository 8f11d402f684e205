//! Partial profile updates.
//!
//! A profile form only sends the fields the student touched. Keys that are
//! missing leave the stored value alone, `null` or `""` clear it.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use thiserror::Error;

use super::lenient::{coerce_flag, coerce_number, parse_date};

#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Integer,
    Float,
    Bool,
    Date,
}

/// Typed value for one profile column; `None` clears the column
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Text(Option<String>),
    Integer(Option<i32>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Date(Option<NaiveDate>),
}

/// Request keys accepted for profile updates and the column each writes
const PROFILE_COLUMNS: &[(&str, &str, ColumnKind)] = &[
    ("full_name", "full_name", ColumnKind::Text),
    ("course", "course", ColumnKind::Text),
    ("year_of_study", "year_of_study", ColumnKind::Integer),
    ("income", "income", ColumnKind::Float),
    ("caste", "caste", ColumnKind::Text),
    ("disability", "disability", ColumnKind::Bool),
    ("disability_details", "disability_details", ColumnKind::Text),
    ("tenth_marks", "tenth_marks", ColumnKind::Float),
    ("tenth_percentage", "tenth_percentage", ColumnKind::Float),
    ("twelfth_marks", "twelfth_marks", ColumnKind::Float),
    ("twelfth_percentage", "twelfth_percentage", ColumnKind::Float),
    ("last_semester_marks", "last_semester_marks", ColumnKind::Float),
    ("address_line1", "address_line1", ColumnKind::Text),
    ("address_line2", "address_line2", ColumnKind::Text),
    ("city", "city", ColumnKind::Text),
    ("state", "state", ColumnKind::Text),
    ("postal_code", "postal_code", ColumnKind::Text),
    ("country", "country", ColumnKind::Text),
];

/// Columns to write, in a stable order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub fields: Vec<(&'static str, PatchValue)>,
}

impl ProfilePatch {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, PatchError> {
        let mut fields = Vec::new();

        for (key, column, kind) in PROFILE_COLUMNS {
            if let Some(value) = body.get(*key) {
                fields.push((*column, convert(*key, *kind, value)?));
            }
        }

        // `dob` wins over the long-form key when both are sent
        let dob = body.get("dob").or_else(|| body.get("date_of_birth"));
        if let Some(value) = dob {
            fields.push(("dob", convert("dob", ColumnKind::Date, value)?));
        }

        Ok(Self { fields })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(column, _)| *column)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn convert(field: &'static str, kind: ColumnKind, value: &Value) -> Result<PatchValue, PatchError> {
    let invalid = || PatchError::InvalidValue {
        field,
        value: value.to_string(),
    };

    if is_blank(value) {
        return Ok(match kind {
            ColumnKind::Text => PatchValue::Text(None),
            ColumnKind::Integer => PatchValue::Integer(None),
            ColumnKind::Float => PatchValue::Float(None),
            ColumnKind::Bool => PatchValue::Bool(None),
            ColumnKind::Date => PatchValue::Date(None),
        });
    }

    match kind {
        ColumnKind::Text => match value {
            Value::String(s) => Ok(PatchValue::Text(Some(s.clone()))),
            Value::Number(n) => Ok(PatchValue::Text(Some(n.to_string()))),
            _ => Err(invalid()),
        },
        ColumnKind::Integer => coerce_number(value)
            .filter(|n| n.is_finite() && n.fract() == 0.0)
            .and_then(|n| i32::try_from(n as i64).ok())
            .map(|n| PatchValue::Integer(Some(n)))
            .ok_or_else(invalid),
        ColumnKind::Float => coerce_number(value)
            .filter(|n| n.is_finite())
            .map(|n| PatchValue::Float(Some(n)))
            .ok_or_else(invalid),
        ColumnKind::Bool => coerce_flag(value)
            .map(|b| PatchValue::Bool(Some(b)))
            .ok_or_else(invalid),
        ColumnKind::Date => value
            .as_str()
            .and_then(parse_date)
            .map(|d| PatchValue::Date(Some(d)))
            .ok_or_else(invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_missing_keys_are_untouched() {
        let patch = ProfilePatch::from_json(&body(json!({"course": "B.Sc"}))).unwrap();
        assert_eq!(patch.fields, vec![("course", PatchValue::Text(Some("B.Sc".into())))]);
    }

    #[test]
    fn test_empty_strings_clear_columns() {
        let patch = ProfilePatch::from_json(&body(json!({"income": "", "dob": ""}))).unwrap();
        assert_eq!(
            patch.fields,
            vec![("income", PatchValue::Float(None)), ("dob", PatchValue::Date(None))]
        );
    }

    #[test]
    fn test_form_strings_are_typed() {
        let patch = ProfilePatch::from_json(&body(json!({
            "year_of_study": "2",
            "tenth_percentage": "91.5",
            "disability": "true",
            "date_of_birth": "2005-01-30"
        })))
        .unwrap();

        assert_eq!(
            patch.fields,
            vec![
                ("year_of_study", PatchValue::Integer(Some(2))),
                ("disability", PatchValue::Bool(Some(true))),
                ("tenth_percentage", PatchValue::Float(Some(91.5))),
                ("dob", PatchValue::Date(NaiveDate::from_ymd_opt(2005, 1, 30))),
            ]
        );
    }

    #[test]
    fn test_garbage_numbers_are_rejected() {
        let err = ProfilePatch::from_json(&body(json!({"income": "lots"}))).unwrap_err();
        assert_eq!(
            err,
            PatchError::InvalidValue {
                field: "income",
                value: "\"lots\"".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let patch = ProfilePatch::from_json(&body(json!({"user_id": 99, "role": "admin"}))).unwrap();
        assert!(patch.is_empty());
    }
}
