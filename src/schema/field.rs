use serde::{Serialize, Serializer};

pub const EMAIL_PATTERN: &str = r"^[^@]+@[^@]+\.[^@]+$";
pub const PHONE_PATTERN: &str = r"^[0-9+\-\s()]{6,20}$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Date,
    Email,
    Tel,
    Number,
    Select,
    Textarea,
    Checkbox,
}

/// One form input. Only `key` reaches storage, as a column name.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldDef {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "no_options")]
    pub options: &'static [&'static str],
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_msg: Option<&'static str>,
}

fn no_options(options: &&'static [&'static str]) -> bool {
    options.is_empty()
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl FieldDef {
    pub const fn new(key: &'static str, label: &'static str, field_type: FieldType) -> Self {
        Self {
            key,
            label,
            field_type,
            options: &[],
            required: false,
            min_length: None,
            max_length: None,
            pattern: None,
            pattern_msg: None,
        }
    }

    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldType::Text)
    }

    pub const fn date(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldType::Date)
    }

    pub const fn number(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldType::Number)
    }

    pub const fn select(key: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self { options, ..Self::new(key, label, FieldType::Select) }
    }

    pub const fn email(key: &'static str, label: &'static str, pattern_msg: &'static str) -> Self {
        Self::new(key, label, FieldType::Email).pattern(EMAIL_PATTERN, pattern_msg)
    }

    pub const fn tel(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldType::Tel).pattern(PHONE_PATTERN, "Enter a valid phone number")
    }

    pub const fn required(self) -> Self {
        Self { required: true, ..self }
    }

    pub const fn pattern(self, pattern: &'static str, pattern_msg: &'static str) -> Self {
        Self { pattern: Some(pattern), pattern_msg: Some(pattern_msg), ..self }
    }

    pub const fn min_length(self, min: usize) -> Self {
        Self { min_length: Some(min), ..self }
    }

    pub const fn max_length(self, max: usize) -> Self {
        Self { max_length: Some(max), ..self }
    }
}

/// Visual card inside a single-row section. Labels may differ from the
/// section's own field list; keys may not.
#[derive(Debug, Serialize)]
pub struct FieldGroup {
    pub title: &'static str,
    pub fields: &'static [FieldDef],
}

#[derive(Debug, Serialize)]
pub struct Section {
    pub key: &'static str,
    pub table: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
    pub repeatable: bool,
    pub fields: &'static [FieldDef],
    #[serde(skip_serializing_if = "no_groups")]
    pub field_groups: &'static [FieldGroup],
}

fn no_groups(groups: &&'static [FieldGroup]) -> bool {
    groups.is_empty()
}

impl Section {
    pub fn field(&self, key: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn field_keys(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|f| f.key)
    }
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

#[derive(Debug, Serialize)]
pub struct Tab {
    pub key: &'static str,
    pub title: &'static str,
    #[serde(serialize_with = "section_keys")]
    pub sections: &'static [&'static Section],
}

fn section_keys<S: Serializer>(sections: &&'static [&'static Section], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(sections.iter().map(|s| s.key))
}
