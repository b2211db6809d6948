//! Declarative description of the application form: sections, their fields,
//! visual field groups and the tabs that arrange them.

pub mod field;
pub mod record;
pub mod registry;
mod sections;

pub use field::{FieldDef, FieldGroup, FieldType, Section, Tab};
pub use record::{FieldErrors, FieldValue, RecordError, SectionRecord};
pub use registry::{check_consistency, find_section, find_section_by_table, section_tables, sections, tabs, SchemaError};
