use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::field::{Section, Tab};
use super::sections::*;

static SECTIONS: [&Section; 17] = [
    &VISA_APPLICATION,
    &STUDENT_DETAILS,
    &FAMILY_MEMBERS,
    &RELATIVES_AUSTRALIA,
    &TRAVEL_HISTORY,
    &RESIDENT_HISTORY,
    &IDENTIFICATION_DOCUMENTS,
    &EDUCATION_QUALIFICATIONS,
    &EMPLOYMENT_HISTORY,
    &SPONSOR_DETAILS,
    &TEST_CERTIFICATIONS,
    &AUSTRALIAN_VISA_HISTORY,
    &OTHER_COUNTRY_VISA_HISTORY,
    &VISA_REFUSAL_HISTORY,
    &HEALTH_INSURANCE,
    &COE_HISTORY,
    &SKILL_ASSESSMENT,
];

static TABS: [Tab; 12] = [
    Tab { key: "basicDetails", title: "Basic Details", sections: &[&VISA_APPLICATION] },
    Tab { key: "studentDetails", title: "Student Details", sections: &[&STUDENT_DETAILS] },
    Tab { key: "familyDetails", title: "Family Details", sections: &[&FAMILY_MEMBERS, &RELATIVES_AUSTRALIA] },
    Tab { key: "travelResident", title: "Travel & Resident History", sections: &[&TRAVEL_HISTORY, &RESIDENT_HISTORY] },
    Tab { key: "docEducation", title: "Document & Education", sections: &[&IDENTIFICATION_DOCUMENTS, &EDUCATION_QUALIFICATIONS] },
    Tab { key: "employment", title: "Employment History", sections: &[&EMPLOYMENT_HISTORY] },
    Tab { key: "sponsor", title: "Sponsor Details", sections: &[&SPONSOR_DETAILS] },
    Tab { key: "testDetails", title: "Test Details", sections: &[&TEST_CERTIFICATIONS] },
    Tab {
        key: "visaHistory",
        title: "Visa History",
        sections: &[&AUSTRALIAN_VISA_HISTORY, &OTHER_COUNTRY_VISA_HISTORY, &VISA_REFUSAL_HISTORY],
    },
    Tab { key: "healthInsurance", title: "Health Insurance", sections: &[&HEALTH_INSURANCE] },
    Tab { key: "coeHistory", title: "CoE History", sections: &[&COE_HISTORY] },
    Tab { key: "skillAssessment", title: "Skill Assessment", sections: &[&SKILL_ASSESSMENT] },
];

static BY_KEY: Lazy<HashMap<&'static str, &'static Section>> =
    Lazy::new(|| SECTIONS.iter().map(|s| (s.key, *s)).collect());

static BY_TABLE: Lazy<HashMap<&'static str, &'static Section>> =
    Lazy::new(|| SECTIONS.iter().map(|s| (s.table, *s)).collect());

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("Tab '{tab}' references section '{section}' missing from the section list")]
    UnlistedSection { tab: &'static str, section: &'static str },

    #[error("Section '{0}' is not reachable from any tab")]
    SectionWithoutTab(&'static str),

    #[error("Duplicate section key or table: {0}")]
    Duplicate(&'static str),

    #[error("Section '{section}' declares field '{field}' more than once")]
    DuplicateField { section: &'static str, field: &'static str },

    #[error("Field group '{group}' in '{section}' names undeclared field '{field}'")]
    UnknownGroupField { section: &'static str, group: &'static str, field: &'static str },

    #[error("Field '{field}' in '{section}' has an invalid pattern: {message}")]
    InvalidPattern { section: &'static str, field: &'static str, message: String },
}

/// All sections in load and save order.
pub fn sections() -> &'static [&'static Section] {
    &SECTIONS
}

pub fn tabs() -> &'static [Tab] {
    &TABS
}

pub fn find_section(key: &str) -> Option<&'static Section> {
    BY_KEY.get(key).copied()
}

pub fn find_section_by_table(table: &str) -> Option<&'static Section> {
    BY_TABLE.get(table).copied()
}

pub fn section_tables() -> Vec<&'static str> {
    SECTIONS.iter().map(|s| s.table).collect()
}

pub fn check_consistency() -> Result<(), SchemaError> {
    let mut keys = HashSet::new();
    let mut tables = HashSet::new();
    for section in SECTIONS.iter() {
        if !keys.insert(section.key) {
            return Err(SchemaError::Duplicate(section.key));
        }
        if !tables.insert(section.table) {
            return Err(SchemaError::Duplicate(section.table));
        }

        let mut fields = HashSet::new();
        for field in section.fields {
            if !fields.insert(field.key) {
                return Err(SchemaError::DuplicateField { section: section.key, field: field.key });
            }
            if let Some(pattern) = field.pattern {
                Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
                    section: section.key,
                    field: field.key,
                    message: e.to_string(),
                })?;
            }
        }
        for group in section.field_groups {
            if let Some(field) = group.fields.iter().find(|f| !fields.contains(f.key)) {
                return Err(SchemaError::UnknownGroupField { section: section.key, group: group.title, field: field.key });
            }
        }
    }

    let mut tabbed = HashSet::new();
    for tab in TABS.iter() {
        for section in tab.sections {
            if !SECTIONS.iter().any(|s| std::ptr::eq(*s, *section)) {
                return Err(SchemaError::UnlistedSection { tab: tab.key, section: section.key });
            }
            tabbed.insert(section.key);
        }
    }
    if let Some(section) = SECTIONS.iter().find(|s| !tabbed.contains(s.key)) {
        return Err(SchemaError::SectionWithoutTab(section.key));
    }
    Ok(())
}
