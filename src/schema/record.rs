//! Typed values for one section row.
//!
//! A [`SectionRecord`] is bound to its [`Section`] and only accepts the keys
//! that section declares. Blank dates and numbers are `Absent`, which is what
//! reaches storage as `null`.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use thiserror::Error;

use super::field::{FieldDef, FieldType, Section};
use super::registry;
use crate::store::Row;

/// Columns managed by storage; never part of a section's field list.
pub const STORAGE_COLUMNS: [&str; 4] = ["id", "user_id", "created_at", "updated_at"];

const DATE_FORMAT: &str = "%Y-%m-%d";

// Browser-grade check used for `email` inputs on top of any declared pattern.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("email regex compiles")
});

// Compiled once from every declared pattern. Patterns are anchored the way
// browsers anchor the `pattern` attribute.
static PATTERNS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    registry::sections()
        .iter()
        .flat_map(|s| s.fields.iter())
        .filter_map(|f| f.pattern)
        .filter_map(|p| anchored(p).map(|re| (p, re)))
        .collect()
});

fn anchored(pattern: &str) -> Option<Regex> {
    let start = if pattern.starts_with('^') { "" } else { "^" };
    let end = if pattern.ends_with('$') { "" } else { "$" };
    Regex::new(&format!("{}{}{}", start, pattern, end)).ok()
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Field key to the first failing rule's message.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Absent,
    Text(String),
    Date(NaiveDate),
    Number(Number),
    Flag(bool),
}

impl FieldValue {
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Absent => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            FieldValue::Number(n) => Value::Number(n.clone()),
            FieldValue::Flag(b) => Value::Bool(*b),
        }
    }

    /// What an input control shows.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Absent => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Flag(b) => b.to_string(),
        }
    }

    fn blank(field: &FieldDef) -> Self {
        match field.field_type {
            FieldType::Date | FieldType::Number => FieldValue::Absent,
            FieldType::Checkbox => FieldValue::Flag(false),
            _ => FieldValue::Text(String::new()),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("{section} expects a JSON object")]
    NotAnObject { section: &'static str },

    #[error("Unknown field '{field}' for section '{section}'")]
    UnknownField { section: &'static str, field: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct SectionRecord {
    section: &'static Section,
    values: HashMap<&'static str, FieldValue>,
    id: Option<Value>,
    updated_at: Option<String>,
}

impl SectionRecord {
    pub fn empty(section: &'static Section) -> Self {
        Self {
            section,
            values: section.fields.iter().map(|f| (f.key, FieldValue::blank(f))).collect(),
            id: None,
            updated_at: None,
        }
    }

    /// Strict parse of client input. Storage-managed keys are ignored.
    pub fn from_input(section: &'static Section, input: &Value) -> Result<Self, RecordError> {
        let object = input
            .as_object()
            .ok_or(RecordError::NotAnObject { section: section.key })?;
        let mut record = Self::empty(section);
        for (key, value) in object {
            if STORAGE_COLUMNS.contains(&key.as_str()) {
                continue;
            }
            let field = section.field(key).ok_or_else(|| RecordError::UnknownField {
                section: section.key,
                field: key.clone(),
            })?;
            record.values.insert(field.key, parse_input(field, value)?);
        }
        Ok(record)
    }

    /// Lenient parse of a stored row. Values that do not fit their declared
    /// type are kept as text instead of being dropped.
    pub fn from_row(section: &'static Section, row: &Row) -> Self {
        let mut record = Self::empty(section);
        for field in section.fields {
            if let Some(value) = row.get(field.key) {
                record.values.insert(field.key, parse_stored(field, value));
            }
        }
        record.id = row.get("id").filter(|v| !v.is_null()).cloned();
        record.updated_at = row.get("updated_at").and_then(Value::as_str).map(str::to_string);
        record
    }

    pub fn section(&self) -> &'static Section {
        self.section
    }

    pub fn storage_id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: FieldValue) -> Result<(), RecordError> {
        let field = self.section.field(key).ok_or_else(|| RecordError::UnknownField {
            section: self.section.key,
            field: key.to_string(),
        })?;
        self.values.insert(field.key, value);
        Ok(())
    }

    /// Form value for `key`; empty for absent or undeclared keys.
    pub fn display(&self, key: &str) -> String {
        self.values.get(key).map(FieldValue::display).unwrap_or_default()
    }

    pub fn is_blank(&self) -> bool {
        self.section
            .fields
            .iter()
            .all(|f| match self.values.get(f.key) {
                Some(FieldValue::Flag(b)) => !b,
                Some(value) => value.is_blank(),
                None => true,
            })
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let errors = self.field_errors("");
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Errors keyed by `{prefix}{field}`.
    pub fn field_errors(&self, prefix: &str) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for field in self.section.fields {
            let value = self.values.get(field.key).unwrap_or(&FieldValue::Absent);
            if let Some(message) = check_field(field, value) {
                errors.insert(format!("{}{}", prefix, field.key), message);
            }
        }
        errors
    }

    /// Storage payload: every declared field, `Absent` as `null`.
    pub fn to_row(&self) -> Row {
        self.section
            .fields
            .iter()
            .map(|f| {
                let value = self.values.get(f.key).map(FieldValue::to_json).unwrap_or(Value::Null);
                (f.key.to_string(), value)
            })
            .collect()
    }
}

impl Serialize for SectionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(id) = &self.id {
            map.serialize_entry("id", id)?;
        }
        for field in self.section.fields {
            let value = self.values.get(field.key).map(FieldValue::to_json).unwrap_or(Value::Null);
            map.serialize_entry(field.key, &value)?;
        }
        if let Some(updated_at) = &self.updated_at {
            map.serialize_entry("updated_at", updated_at)?;
        }
        map.end()
    }
}

fn check_field(field: &FieldDef, value: &FieldValue) -> Option<String> {
    if value.is_blank() {
        return field.required.then(|| "This field is required".to_string());
    }
    let FieldValue::Text(text) = value else {
        return None;
    };
    if field.field_type == FieldType::Email && !is_valid_email(text) {
        return Some("Enter a valid email address".to_string());
    }
    if let Some(pattern) = field.pattern {
        let matched = PATTERNS.get(pattern).map(|re| re.is_match(text)).unwrap_or(false);
        if !matched {
            return Some(field.pattern_msg.unwrap_or("Invalid format").to_string());
        }
    }
    let length = text.chars().count();
    if let Some(min) = field.min_length {
        if length < min {
            return Some(format!("Minimum {} characters required", min));
        }
    }
    if let Some(max) = field.max_length {
        if length > max {
            return Some(format!("Maximum {} characters allowed", max));
        }
    }
    if field.field_type == FieldType::Select && !field.options.is_empty() && !field.options.contains(&text.as_str()) {
        return Some("Select one of the listed options".to_string());
    }
    None
}

fn parse_input(field: &'static FieldDef, value: &Value) -> Result<FieldValue, RecordError> {
    let invalid = |message: &str| RecordError::InvalidValue { field: field.key, message: message.to_string() };
    match (field.field_type, value) {
        (_, Value::Null) => Ok(FieldValue::blank(field)),
        (FieldType::Date, Value::String(s)) if s.trim().is_empty() => Ok(FieldValue::Absent),
        (FieldType::Date, Value::String(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(FieldValue::Date)
            .map_err(|_| invalid("expected a date in YYYY-MM-DD format")),
        (FieldType::Date, _) => Err(invalid("expected a date in YYYY-MM-DD format")),
        (FieldType::Number, Value::Number(n)) => Ok(FieldValue::Number(n.clone())),
        (FieldType::Number, Value::String(s)) if s.trim().is_empty() => Ok(FieldValue::Absent),
        (FieldType::Number, Value::String(s)) => parse_number(s.trim())
            .map(FieldValue::Number)
            .ok_or_else(|| invalid("expected a number")),
        (FieldType::Number, _) => Err(invalid("expected a number")),
        (FieldType::Checkbox, Value::Bool(b)) => Ok(FieldValue::Flag(*b)),
        (FieldType::Checkbox, Value::String(s)) => match s.as_str() {
            "true" => Ok(FieldValue::Flag(true)),
            "false" | "" => Ok(FieldValue::Flag(false)),
            _ => Err(invalid("expected true or false")),
        },
        (FieldType::Checkbox, _) => Err(invalid("expected true or false")),
        (_, Value::String(s)) => Ok(FieldValue::Text(s.clone())),
        (_, Value::Number(n)) => Ok(FieldValue::Text(n.to_string())),
        (_, Value::Bool(b)) => Ok(FieldValue::Text(b.to_string())),
        (_, Value::Array(_) | Value::Object(_)) => Err(invalid("expected a scalar value")),
    }
}

fn parse_stored(field: &FieldDef, value: &Value) -> FieldValue {
    match (field.field_type, value) {
        (_, Value::Null) => FieldValue::blank(field),
        (FieldType::Date, Value::String(s)) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
            .map(FieldValue::Date)
            .unwrap_or_else(|| FieldValue::Text(s.clone())),
        (FieldType::Number, Value::Number(n)) => FieldValue::Number(n.clone()),
        (FieldType::Number, Value::String(s)) => parse_number(s)
            .map(FieldValue::Number)
            .unwrap_or_else(|| FieldValue::Text(s.clone())),
        (FieldType::Checkbox, Value::Bool(b)) => FieldValue::Flag(*b),
        (_, Value::String(s)) => FieldValue::Text(s.clone()),
        (_, other) => FieldValue::Text(other.to_string()),
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Number::from(i));
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64)
}
