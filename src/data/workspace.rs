//! The application form without its rendering: load everything, validate
//! and save one section or all of them, and lay the result out for print.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{DataError, DataService, SectionData, UserData};
use crate::schema::{registry, FieldErrors, RecordError, Section, SectionRecord};
use crate::store::Row;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("{title} expects {expected}")]
    ShapeMismatch { title: &'static str, expected: &'static str },

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Please fix the highlighted errors before saving.")]
    Validation(FieldErrors),

    /// A write failed; sections saved before it stay saved.
    #[error("Error saving {title}: {source}")]
    Save {
        section: &'static str,
        title: &'static str,
        #[source]
        source: DataError,
    },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Client payload for one section: an object for single-row sections, a
/// list of objects for repeatable ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SectionInput {
    Rows(Vec<Value>),
    Single(Value),
}

/// Section key to its payload. Sections left out are not written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ApplicationInput(pub BTreeMap<String, SectionInput>);

enum Prepared {
    Single(Row),
    Many(Vec<Row>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub user_id: Uuid,
    pub sections: UserData,
}

impl Application {
    /// The single-row record of `section`; blank when nothing is stored yet.
    pub fn record(&self, section: &'static Section) -> SectionRecord {
        self.sections
            .single(section.table)
            .cloned()
            .unwrap_or_else(|| SectionRecord::empty(section))
    }

    pub fn rows(&self, section: &Section) -> &[SectionRecord] {
        self.sections.rows(section.table)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    pub saved: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintField {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintBlock {
    pub heading: String,
    pub fields: Vec<PrintField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintSection {
    pub title: &'static str,
    pub blocks: Vec<PrintBlock>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintTab {
    pub title: &'static str,
    pub sections: Vec<PrintSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintLayout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<String>,
    pub tabs: Vec<PrintTab>,
}

pub struct Workspace {
    data: Arc<DataService>,
}

impl Workspace {
    pub fn new(data: Arc<DataService>) -> Self {
        Self { data }
    }

    pub async fn load_application(&self, user_id: Uuid) -> Result<Application, DataError> {
        let mut sections = self.data.load_user_data(user_id, registry::sections()).await?;
        for section in registry::sections() {
            if let Some(SectionData::Single(slot)) = sections.tables.get_mut(section.table) {
                slot.get_or_insert_with(|| SectionRecord::empty(section));
            }
        }
        Ok(Application { user_id, sections })
    }

    pub async fn load_section(&self, user_id: Uuid, key: &str) -> Result<SectionData, WorkspaceError> {
        let section = lookup(key)?;
        let data = self.data.load_user_data(user_id, &[section]).await?;
        Ok(data
            .get(section.table)
            .cloned()
            .unwrap_or(SectionData::Single(None)))
    }

    pub async fn save_section(&self, user_id: Uuid, key: &str, input: SectionInput) -> Result<(), WorkspaceError> {
        let section = lookup(key)?;
        let prepared = prepare(section, input, "")?;
        self.write(user_id, section, prepared).await
    }

    /// Validates every provided section first and writes nothing if any is
    /// invalid. Writes then go in registry order and stop at the first
    /// failure. Sections absent from `input` are not touched; an empty list
    /// clears a repeatable section.
    pub async fn save_all(&self, user_id: Uuid, input: ApplicationInput) -> Result<SaveReport, WorkspaceError> {
        let mut inputs = input.0;
        if let Some(unknown) = inputs.keys().find(|key| registry::find_section(key).is_none()) {
            return Err(WorkspaceError::UnknownSection(unknown.clone()));
        }

        let mut plan = Vec::new();
        let mut errors = FieldErrors::new();
        for section in registry::sections() {
            let Some(payload) = inputs.remove(section.key) else { continue };
            match prepare(section, payload, &format!("{}.", section.key)) {
                Ok(prepared) => plan.push((*section, prepared)),
                Err(WorkspaceError::Validation(found)) => errors.extend(found),
                Err(other) => return Err(other),
            }
        }
        if !errors.is_empty() {
            return Err(WorkspaceError::Validation(errors));
        }

        let mut saved = Vec::with_capacity(plan.len());
        for (section, prepared) in plan {
            self.write(user_id, section, prepared).await?;
            saved.push(section.key);
        }
        debug!(%user_id, sections = saved.len(), "saved application");
        Ok(SaveReport { saved })
    }

    async fn write(&self, user_id: Uuid, section: &'static Section, prepared: Prepared) -> Result<(), WorkspaceError> {
        let result = match prepared {
            Prepared::Single(row) => self.data.upsert_single(section.table, user_id, row).await,
            Prepared::Many(rows) => self.data.replace_many(section.table, user_id, rows).await,
        };
        result.map_err(|source| {
            warn!(%user_id, section = section.key, error = %source, "section save failed");
            WorkspaceError::Save { section: section.key, title: section.title, source }
        })
    }
}

fn lookup(key: &str) -> Result<&'static Section, WorkspaceError> {
    registry::find_section(key).ok_or_else(|| WorkspaceError::UnknownSection(key.to_string()))
}

fn prepare(section: &'static Section, input: SectionInput, prefix: &str) -> Result<Prepared, WorkspaceError> {
    match (section.repeatable, input) {
        (false, SectionInput::Single(value)) => {
            let record = SectionRecord::from_input(section, &value)?;
            let errors = record.field_errors(prefix);
            if !errors.is_empty() {
                return Err(WorkspaceError::Validation(errors));
            }
            Ok(Prepared::Single(record.to_row()))
        }
        (true, SectionInput::Rows(values)) => {
            let mut rows = Vec::with_capacity(values.len());
            let mut errors = FieldErrors::new();
            for (index, value) in values.iter().enumerate() {
                let record = SectionRecord::from_input(section, value)?;
                errors.extend(record.field_errors(&format!("{}{}.", prefix, index)));
                rows.push(record.to_row());
            }
            if !errors.is_empty() {
                return Err(WorkspaceError::Validation(errors));
            }
            Ok(Prepared::Many(rows))
        }
        (false, SectionInput::Rows(_)) => Err(WorkspaceError::ShapeMismatch { title: section.title, expected: "a single object" }),
        (true, SectionInput::Single(_)) => Err(WorkspaceError::ShapeMismatch { title: section.title, expected: "a list of entries" }),
    }
}

/// Tabs, then sections, then labelled values. Single-row sections with field
/// groups print one block per group.
pub fn print_layout(application: &Application, applicant: Option<&str>) -> PrintLayout {
    let tabs = registry::tabs()
        .iter()
        .map(|tab| PrintTab {
            title: tab.title,
            sections: tab.sections.iter().map(|section| print_section(application, section)).collect(),
        })
        .collect();
    PrintLayout { applicant: applicant.map(str::to_string), tabs }
}

fn print_section(application: &Application, section: &'static Section) -> PrintSection {
    let fields_of = |record: &SectionRecord, defs: &'static [crate::schema::FieldDef]| {
        defs.iter()
            .map(|f| PrintField { label: f.label, value: record.display(f.key) })
            .collect::<Vec<_>>()
    };

    let blocks = if section.repeatable {
        application
            .rows(section)
            .iter()
            .enumerate()
            .map(|(i, record)| PrintBlock { heading: format!("Entry #{}", i + 1), fields: fields_of(record, section.fields) })
            .collect()
    } else {
        let record = application.record(section);
        if section.field_groups.is_empty() {
            vec![PrintBlock { heading: section.title.to_string(), fields: fields_of(&record, section.fields) }]
        } else {
            section
                .field_groups
                .iter()
                .map(|group| PrintBlock { heading: group.title.to_string(), fields: fields_of(&record, group.fields) })
                .collect()
        }
    };
    PrintSection { title: section.title, blocks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::find_section;
    use crate::store::StoreOp;
    use crate::testing::TestContext;
    use serde_json::json;

    fn input(value: Value) -> ApplicationInput {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn visa_application_round_trip() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        let section = find_section("visaApplications").unwrap();

        let before = ctx.workspace.load_application(user).await.unwrap();
        assert_eq!(before.record(section).display("given_name"), "");

        let mut form = serde_json::Map::new();
        for field in section.fields {
            form.insert(field.key.to_string(), json!(""));
        }
        form.insert("given_name".into(), json!("Ana"));
        ctx.workspace
            .save_section(user, "visaApplications", SectionInput::Single(Value::Object(form)))
            .await
            .unwrap();

        let after = ctx.workspace.load_application(user).await.unwrap();
        let record = after.record(section);
        assert_eq!(record.display("given_name"), "Ana");
        assert_eq!(record.display("date_of_birth"), "");
        assert_eq!(ctx.store.rows("visa_applications")[0]["date_of_birth"], Value::Null);
    }

    #[tokio::test]
    async fn repeatable_rows_are_validated_with_indexed_keys() {
        let ctx = TestContext::new();
        let rows = json!([
            {"country": "NZ", "from_date": "2020-01-01", "to_date": "2020-02-01", "reason_for_visit": "Business"},
            {"country": "", "from_date": "2020-01-01", "to_date": "2020-02-01", "reason_for_visit": "Business"}
        ]);
        let err = ctx
            .workspace
            .save_section(Uuid::new_v4(), "travelHistory", serde_json::from_value(rows).unwrap())
            .await
            .unwrap_err();
        match err {
            WorkspaceError::Validation(errors) => assert_eq!(errors.get("1.country").map(String::as_str), Some("This field is required")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(ctx.store.rows("travel_history").is_empty());
    }

    #[tokio::test]
    async fn shape_must_match_section_kind() {
        let ctx = TestContext::new();
        let err = ctx
            .workspace
            .save_section(Uuid::new_v4(), "studentDetails", SectionInput::Rows(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Student Details expects a single object");
    }

    #[tokio::test]
    async fn save_all_leaves_absent_sections_alone() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        let trip = json!([{"country": "NZ", "from_date": "2020-01-01", "to_date": "2020-02-01", "reason_for_visit": "Business"}]);
        ctx.workspace.save_all(user, input(json!({"travelHistory": trip}))).await.unwrap();

        let report = ctx.workspace.save_all(user, input(json!({"studentDetails": {}}))).await.unwrap();
        assert_eq!(report.saved, vec!["studentDetails"]);
        assert_eq!(ctx.store.rows("travel_history").len(), 1);

        // Clearing takes an explicit empty list.
        ctx.workspace.save_all(user, input(json!({"travelHistory": []}))).await.unwrap();
        assert!(ctx.store.rows("travel_history").is_empty());
    }

    #[tokio::test]
    async fn save_all_stops_at_first_failing_section() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        ctx.store.fail_on(StoreOp::Delete, "family_members", "permission denied for table family_members");

        let err = ctx
            .workspace
            .save_all(
                user,
                input(json!({
                    "visaApplications": {"given_name": "Ana"},
                    "familyMembers": [],
                    "travelHistory": [],
                })),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error saving Family Details: permission denied for table family_members");
        // Earlier sections stay written.
        assert_eq!(ctx.store.rows("visa_applications").len(), 1);
    }

    #[tokio::test]
    async fn save_all_rejects_unknown_sections_and_validates_first() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        let err = ctx.workspace.save_all(user, input(json!({"pets": []}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown section: pets");

        let err = ctx
            .workspace
            .save_all(
                user,
                input(json!({
                    "studentDetails": {"course_name": "BIT"},
                    "healthInsurance": [{"insurance_type": "OSHC"}],
                })),
            )
            .await
            .unwrap_err();
        match err {
            WorkspaceError::Validation(errors) => {
                assert_eq!(errors["healthInsurance.0.insurer_name"], "This field is required");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(ctx.store.rows("student_details").is_empty());
    }

    #[tokio::test]
    async fn print_layout_follows_tabs_and_groups() {
        let ctx = TestContext::new();
        let user = Uuid::new_v4();
        ctx.workspace
            .save_all(
                user,
                input(json!({
                    "visaApplications": {"passport_no": "P123"},
                    "skillAssessment": [{"occupation_name": "Developer", "anzsco_code": "261313", "assessing_authority": "ACS", "assessment_date": "2023-05-01"}],
                })),
            )
            .await
            .unwrap();

        let application = ctx.workspace.load_application(user).await.unwrap();
        let layout = print_layout(&application, Some("Ana"));
        assert_eq!(layout.tabs.len(), 12);

        let basic = &layout.tabs[0].sections[0];
        assert_eq!(basic.blocks.len(), 5);
        let passport = basic.blocks.iter().find(|b| b.heading == "Passport Details").unwrap();
        assert_eq!(passport.fields[0].value, "P123");

        let skills = &layout.tabs[11].sections[0];
        assert_eq!(skills.blocks[0].heading, "Entry #1");
        assert_eq!(skills.blocks[0].fields[4].value, "2023-05-01");
    }
}
